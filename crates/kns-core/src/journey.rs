//! A profile's journey: level placements, classifications and faith
//! milestones.
//!
//! A profile holds at most one active level; placing it on a new level closes
//! the old placement. Classifications accumulate until closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  Result,
  catalog::{CatalogEntry, CatalogKind},
  counter,
};

#[derive(Debug, Error, PartialEq)]
pub enum JourneyError {
  #[error("{0} is not a level or classification")]
  NotPlaceable(CatalogKind),

  #[error("{sub:?} is not listed under {entry:?}")]
  NotLinked { entry: String, sub: String },

  #[error("group milestones cannot be recorded against a profile")]
  GroupMilestone,
}

// ─── Placements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
  pub placement_id:    Uuid,
  pub profile_id:      Uuid,
  /// [`CatalogKind::Level`] or [`CatalogKind::Classification`].
  pub kind:            CatalogKind,
  pub entry_id:        Uuid,
  pub entry_title:     String,
  pub sub_entry_id:    Option<Uuid>,
  pub sub_entry_title: Option<String>,
  pub created_at:      DateTime<Utc>,
  pub removed_at:      Option<DateTime<Utc>>,
}

impl Placement {
  /// Place `profile_id` on `entry`, optionally narrowed to one of its
  /// linked `children`.
  pub fn new(
    profile_id: Uuid,
    entry: &CatalogEntry,
    sub_entry: Option<&CatalogEntry>,
    children: &[CatalogEntry],
    now: DateTime<Utc>,
  ) -> Result<Self, JourneyError> {
    if entry.kind.child().is_none() {
      return Err(JourneyError::NotPlaceable(entry.kind));
    }
    if let Some(sub) = sub_entry {
      if !children.iter().any(|c| c.entry_id == sub.entry_id) {
        return Err(JourneyError::NotLinked {
          entry: entry.title.clone(),
          sub:   sub.title.clone(),
        });
      }
    }
    Ok(Self {
      placement_id: Uuid::new_v4(),
      profile_id,
      kind: entry.kind,
      entry_id: entry.entry_id,
      entry_title: entry.title.clone(),
      sub_entry_id: sub_entry.map(|s| s.entry_id),
      sub_entry_title: sub_entry.map(|s| s.title.clone()),
      created_at: now,
      removed_at: None,
    })
  }

  pub fn is_active(&self) -> bool { self.removed_at.is_none() }
}

/// Body of `POST /profiles/{slug}/level` and `/classifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlacement {
  /// Catalog slug of the level or classification.
  pub entry:     String,
  #[serde(default)]
  pub sub_entry: Option<String>,
}

// ─── Faith milestones ────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MilestoneType {
  Group,
  #[default]
  Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaithMilestone {
  pub faith_milestone_id: Uuid,
  pub slug:               String,
  pub title:              String,
  pub description:        String,
  pub milestone_type:     MilestoneType,
  pub author_id:          Uuid,
  pub created_at:         DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFaithMilestone {
  pub title:          String,
  pub description:    String,
  #[serde(default)]
  pub milestone_type: MilestoneType,
}

impl NewFaithMilestone {
  pub fn validate(&self) -> Result<()> {
    counter::MILESTONE_TITLE.validate("title", &self.title)?;
    counter::DESCRIPTION.validate("description", &self.description)?;
    Ok(())
  }
}

/// A milestone reached by a profile. Each milestone is recorded at most once
/// per profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFaithMilestone {
  pub profile_id:  Uuid,
  pub milestone:   FaithMilestone,
  pub recorded_by: Uuid,
  pub created_at:  DateTime<Utc>,
}

impl ProfileFaithMilestone {
  pub fn record(
    profile_id: Uuid,
    milestone: FaithMilestone,
    recorded_by: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Self, JourneyError> {
    if milestone.milestone_type != MilestoneType::Profile {
      return Err(JourneyError::GroupMilestone);
    }
    Ok(Self { profile_id, milestone, recorded_by, created_at: now })
  }
}

// ─── Journey ─────────────────────────────────────────────────────────────────

/// Everything recorded about a profile's walk, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journey {
  pub levels:           Vec<Placement>,
  pub classifications:  Vec<Placement>,
  pub faith_milestones: Vec<ProfileFaithMilestone>,
}

impl Journey {
  pub fn current_level(&self) -> Option<&Placement> { self.levels.iter().find(|p| p.is_active()) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn entry(kind: CatalogKind, title: &str) -> CatalogEntry {
    CatalogEntry {
      entry_id:   Uuid::new_v4(),
      kind,
      slug:       title.to_lowercase().replace(' ', "-"),
      title:      title.into(),
      content:    String::new(),
      position:   1,
      created_at: Utc::now(),
    }
  }

  fn milestone(milestone_type: MilestoneType) -> FaithMilestone {
    FaithMilestone {
      faith_milestone_id: Uuid::new_v4(),
      slug: "baptised".into(),
      title: "Baptised".into(),
      description: "d".repeat(120),
      milestone_type,
      author_id: Uuid::new_v4(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn sublevel_must_be_linked_to_its_level() {
    let seekers = entry(CatalogKind::Level, "Seekers");
    let peace = entry(CatalogKind::Sublevel, "Person of Peace");
    let stray = entry(CatalogKind::Sublevel, "Unreached person");
    let children = vec![peace.clone()];
    let profile = Uuid::new_v4();

    let p = Placement::new(profile, &seekers, Some(&peace), &children, Utc::now()).unwrap();
    assert_eq!(p.sub_entry_title.as_deref(), Some("Person of Peace"));
    assert!(p.is_active());

    assert_eq!(
      Placement::new(profile, &seekers, Some(&stray), &children, Utc::now()),
      Err(JourneyError::NotLinked { entry: "Seekers".into(), sub: "Unreached person".into() })
    );
    assert_eq!(
      Placement::new(profile, &peace, None, &[], Utc::now()),
      Err(JourneyError::NotPlaceable(CatalogKind::Sublevel))
    );
  }

  #[test]
  fn group_milestones_are_not_recorded_on_profiles() {
    let by = Uuid::new_v4();
    assert!(ProfileFaithMilestone::record(Uuid::new_v4(), milestone(MilestoneType::Profile), by, Utc::now()).is_ok());
    assert_eq!(
      ProfileFaithMilestone::record(Uuid::new_v4(), milestone(MilestoneType::Group), by, Utc::now()),
      Err(JourneyError::GroupMilestone)
    );
  }

  #[test]
  fn new_milestone_validates_lengths() {
    let ok = NewFaithMilestone {
      title:          "Baptised".into(),
      description:    "d".repeat(100),
      milestone_type: MilestoneType::Profile,
    };
    assert!(ok.validate().is_ok());
    let untitled = NewFaithMilestone { title: String::new(), ..ok.clone() };
    assert!(matches!(untitled.validate(), Err(Error::InvalidLength { field: "title", .. })));
    let short = NewFaithMilestone { description: "short".into(), ..ok };
    assert!(matches!(short.validate(), Err(Error::InvalidLength { field: "description", .. })));
  }

  #[test]
  fn current_level_is_the_open_placement() {
    let level = entry(CatalogKind::Level, "Seekers");
    let mut old = Placement::new(Uuid::nil(), &level, None, &[], Utc::now()).unwrap();
    old.removed_at = Some(Utc::now());
    let new = Placement::new(Uuid::nil(), &level, None, &[], Utc::now()).unwrap();
    let journey = Journey { levels: vec![old, new.clone()], ..Journey::default() };
    assert_eq!(journey.current_level(), Some(&new));
    assert_eq!(MilestoneType::default(), MilestoneType::Profile);
  }
}
