//! The leader's notification drawer.
//!
//! Pending consent forms and approval requests are flattened into
//! [`Notification`]s and grouped into day buckets relative to "now".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  ConsentForm,
  LeaderApproval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub kind:         NotificationKind,
  /// The consent form or approval id.
  pub item_id:      Uuid,
  pub title:        String,
  /// Slug of the profile the item concerns.
  pub profile_slug: String,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
  Today,
  Yesterday,
  ThisWeek,
  Earlier,
}

impl TimeBucket {
  pub const ALL: [TimeBucket; 4] = [Self::Today, Self::Yesterday, Self::ThisWeek, Self::Earlier];

  pub fn label(self) -> &'static str {
    match self {
      Self::Today => "Today",
      Self::Yesterday => "Yesterday",
      Self::ThisWeek => "This week",
      Self::Earlier => "Earlier",
    }
  }

  /// Buckets by UTC calendar day. Future timestamps count as today.
  pub fn for_timestamp(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
    let days = (now.date_naive() - created_at.date_naive()).num_days();
    match days {
      ..=0 => Self::Today,
      1 => Self::Yesterday,
      2..=6 => Self::ThisWeek,
      _ => Self::Earlier,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerSection {
  pub bucket: TimeBucket,
  pub label:  String,
  pub items:  Vec<Notification>,
}

/// Groups `items` (newest first) into sections in fixed bucket order. Empty
/// buckets are omitted and items keep their input order.
pub fn group_notifications(
  items: impl IntoIterator<Item = Notification>,
  now: DateTime<Utc>,
) -> Vec<DrawerSection> {
  let mut buckets: [Vec<Notification>; 4] = Default::default();
  for item in items {
    let bucket = TimeBucket::for_timestamp(item.created_at, now);
    buckets[bucket as usize].push(item);
  }

  TimeBucket::ALL
    .into_iter()
    .zip(buckets)
    .filter(|(_, items)| !items.is_empty())
    .map(|(bucket, items)| DrawerSection { bucket, label: bucket.label().to_owned(), items })
    .collect()
}

/// Total items across sections, for the drawer badge.
pub fn unread_count(sections: &[DrawerSection]) -> usize {
  sections.iter().map(|s| s.items.len()).sum()
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap() }

  fn item(title: &str, created_at: DateTime<Utc>) -> Notification {
    Notification {
      kind: NotificationKind::ConsentForm,
      item_id: Uuid::new_v4(),
      title: title.to_owned(),
      profile_slug: String::new(),
      created_at,
    }
  }

  #[test]
  fn buckets_follow_calendar_days() {
    let now = now();
    let at = |d, h| Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap();
    assert_eq!(TimeBucket::for_timestamp(at(15, 0), now), TimeBucket::Today);
    assert_eq!(TimeBucket::for_timestamp(at(14, 23), now), TimeBucket::Yesterday);
    assert_eq!(TimeBucket::for_timestamp(at(13, 23), now), TimeBucket::ThisWeek);
    assert_eq!(TimeBucket::for_timestamp(at(9, 12), now), TimeBucket::ThisWeek);
    assert_eq!(TimeBucket::for_timestamp(at(8, 23), now), TimeBucket::Earlier);
    assert_eq!(TimeBucket::for_timestamp(now + Duration::days(2), now), TimeBucket::Today);
  }

  #[test]
  fn sections_are_ordered_and_sparse() {
    let now = now();
    let sections = group_notifications(
      [
        item("a", now - Duration::minutes(5)),
        item("b", now - Duration::hours(2)),
        item("c", now - Duration::days(3)),
        item("d", now - Duration::days(30)),
        item("e", now - Duration::days(40)),
      ],
      now,
    );

    let shape: Vec<_> = sections
      .iter()
      .map(|s| (s.label.as_str(), s.items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>()))
      .collect();
    assert_eq!(shape, [
      ("Today", vec!["a", "b"]),
      ("This week", vec!["c"]),
      ("Earlier", vec!["d", "e"]),
    ]);
    assert_eq!(unread_count(&sections), 5);
  }

  #[test]
  fn empty_input_has_no_sections() {
    assert!(group_notifications(Vec::new(), now()).is_empty());
  }
}
