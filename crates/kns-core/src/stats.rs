//! Organisation-wide group statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::group::Group;

const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
  pub name:  String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
  pub slug: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
  pub total_groups:          usize,
  /// Members (leaders excluded) per group, one decimal place.
  pub average_members:       f64,
  pub top_countries:         Vec<CountEntry>,
  pub top_cities:            Vec<CountEntry>,
  pub most_recent_group:     Option<GroupSummary>,
  pub most_members_group:    Option<GroupSummary>,
}

impl GroupStatistics {
  /// `member_counts` maps group id to member count; absent groups have none.
  pub fn compute(groups: &[Group], member_counts: &HashMap<Uuid, usize>) -> Self {
    let total_groups = groups.len();
    let members: usize = groups
      .iter()
      .map(|g| member_counts.get(&g.group_id).copied().unwrap_or(0))
      .sum();
    let average_members = if total_groups == 0 {
      0.0
    } else {
      (members as f64 / total_groups as f64 * 10.0).round() / 10.0
    };

    let summary = |g: &Group| GroupSummary { slug: g.slug.clone(), name: g.name.clone() };

    let most_recent_group = groups
      .iter()
      .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| b.name.cmp(&a.name)))
      .map(summary);

    let most_members_group = groups
      .iter()
      .max_by(|a, b| {
        let ca = member_counts.get(&a.group_id).copied().unwrap_or(0);
        let cb = member_counts.get(&b.group_id).copied().unwrap_or(0);
        ca.cmp(&cb).then_with(|| b.name.cmp(&a.name))
      })
      .map(summary);

    Self {
      total_groups,
      average_members,
      top_countries: top(groups.iter().filter_map(|g| g.location.country.as_deref())),
      top_cities: top(groups.iter().filter_map(|g| g.location.city.as_deref())),
      most_recent_group,
      most_members_group,
    }
  }
}

/// Most frequent values; ties break alphabetically.
fn top<'a>(values: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for v in values.filter(|v| !v.is_empty()) {
    *counts.entry(v).or_default() += 1;
  }
  let mut entries: Vec<_> = counts.into_iter().collect();
  entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
  entries
    .into_iter()
    .take(TOP_N)
    .map(|(name, count)| CountEntry { name: name.to_owned(), count })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::{hierarchy::tests::group, location::Location};

  #[test]
  fn empty_set() {
    let stats = GroupStatistics::compute(&[], &HashMap::new());
    assert_eq!(stats.total_groups, 0);
    assert_eq!(stats.average_members, 0.0);
    assert!(stats.most_recent_group.is_none());
  }

  #[test]
  fn averages_and_rankings() {
    let mut a = group("A", None);
    let mut b = group("B", Some(&a));
    let mut c = group("C", Some(&a));
    let mut d = group("D", Some(&a));
    a.location = Location::new("GB", "Leeds");
    b.location = Location::new("GB", "York");
    c.location = Location::new("NL", "Utrecht");
    d.location = Location::new("DE", "Leeds");
    d.created_at = a.created_at + Duration::days(1);

    let counts = HashMap::from([(a.group_id, 3), (b.group_id, 1), (c.group_id, 3)]);
    let stats = GroupStatistics::compute(&[a, b, c, d], &counts);

    assert_eq!(stats.total_groups, 4);
    assert_eq!(stats.average_members, 1.8);
    assert_eq!(stats.top_countries[0], CountEntry { name: "GB".into(), count: 2 });
    let countries: Vec<_> = stats.top_countries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(countries, ["GB", "DE", "NL"]);
    assert_eq!(stats.top_cities[0], CountEntry { name: "Leeds".into(), count: 2 });
    assert_eq!(stats.most_recent_group.unwrap().name, "D");
    assert_eq!(stats.most_members_group.unwrap().name, "A");
  }
}
