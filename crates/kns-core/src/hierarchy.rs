//! The group hierarchy and member reparenting.
//!
//! [`GroupTree`] is an in-memory index over the persisted parent pointers.
//! Children are kept ordered by name. All walks carry a step bound, so a
//! corrupted parent chain cannot loop forever.
//!
//! Moves are planned here and applied by the store: [`plan_move`] validates
//! the target against the legal set for the move kind and returns a
//! [`MovePlan`] describing the mutation.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::group::Group;

// ─── Tree index ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GroupTree {
  groups:   HashMap<Uuid, Group>,
  by_slug:  HashMap<String, Uuid>,
  children: HashMap<Uuid, Vec<Uuid>>,
  roots:    Vec<Uuid>,
}

impl GroupTree {
  pub fn new(groups: impl IntoIterator<Item = Group>) -> Self {
    let groups: HashMap<Uuid, Group> =
      groups.into_iter().map(|g| (g.group_id, g)).collect();

    let by_slug = groups.values().map(|g| (g.slug.clone(), g.group_id)).collect();

    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut roots = Vec::new();
    for g in groups.values() {
      match g.parent_id.filter(|p| groups.contains_key(p)) {
        Some(parent) => children.entry(parent).or_default().push(g.group_id),
        None => roots.push(g.group_id),
      }
    }

    let by_name = |a: &Uuid, b: &Uuid| {
      let (ga, gb) = (&groups[a], &groups[b]);
      ga.name.cmp(&gb.name).then(ga.group_id.cmp(&gb.group_id))
    };
    for ids in children.values_mut() {
      ids.sort_by(by_name);
    }
    roots.sort_by(by_name);

    Self { groups, by_slug, children, roots }
  }

  pub fn len(&self) -> usize { self.groups.len() }

  pub fn is_empty(&self) -> bool { self.groups.is_empty() }

  pub fn get(&self, id: Uuid) -> Option<&Group> { self.groups.get(&id) }

  pub fn by_slug(&self, slug: &str) -> Option<&Group> {
    self.by_slug.get(slug).and_then(|id| self.groups.get(id))
  }

  /// Every group, in no particular order.
  pub fn iter(&self) -> impl Iterator<Item = &Group> { self.groups.values() }

  pub fn roots(&self) -> impl Iterator<Item = &Group> {
    self.roots.iter().filter_map(|id| self.groups.get(id))
  }

  pub(crate) fn child_ids(&self, id: Uuid) -> &[Uuid] {
    self.children.get(&id).map_or(&[], Vec::as_slice)
  }

  /// Direct children, ordered by name.
  pub fn children(&self, id: Uuid) -> Vec<&Group> {
    self.child_ids(id).iter().filter_map(|c| self.groups.get(c)).collect()
  }

  /// The parent of `id`, if it is present in the tree.
  fn parent_of(&self, id: Uuid) -> Option<Uuid> {
    self.get(id)?.parent_id.filter(|p| self.groups.contains_key(p))
  }

  /// Groups sharing `id`'s parent, excluding `id`. The sisters of a root are
  /// the other roots.
  pub fn sisters(&self, id: Uuid) -> Vec<&Group> {
    if !self.groups.contains_key(&id) {
      return Vec::new();
    }
    let siblings = match self.parent_of(id) {
      Some(parent) => self.children(parent),
      None => self.roots().collect(),
    };
    siblings.into_iter().filter(|g| g.group_id != id).collect()
  }

  /// Parent chain from the nearest ancestor up to the root.
  pub fn ancestors(&self, id: Uuid) -> Vec<&Group> {
    let mut out = Vec::new();
    let mut current = self.get(id).and_then(|g| g.parent_id);
    while let Some(pid) = current {
      let Some(parent) = self.get(pid) else { break };
      if out.len() >= self.groups.len() {
        break;
      }
      out.push(parent);
      current = parent.parent_id;
    }
    out
  }

  /// All descendants of `id` in pre-order with their depth below `id`
  /// (children are depth 1). `id` itself is not included.
  pub fn descendants(&self, id: Uuid) -> Vec<(usize, &Group)> {
    let mut out = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut stack: Vec<(usize, Uuid)> =
      self.child_ids(id).iter().rev().map(|c| (1, *c)).collect();

    while let Some((depth, gid)) = stack.pop() {
      if !seen.insert(gid) {
        continue;
      }
      let Some(group) = self.get(gid) else { continue };
      out.push((depth, group));
      stack.extend(self.child_ids(gid).iter().rev().map(|c| (depth + 1, *c)));
    }
    out
  }

  /// `true` if `candidate` lies strictly below `ancestor`.
  pub fn is_descendant(&self, candidate: Uuid, ancestor: Uuid) -> bool {
    candidate != ancestor && self.ancestors(candidate).iter().any(|g| g.group_id == ancestor)
  }

  pub fn is_sister(&self, candidate: Uuid, of: Uuid) -> bool {
    if candidate == of {
      return false;
    }
    if self.get(candidate).is_none() || self.get(of).is_none() {
      return false;
    }
    self.parent_of(candidate) == self.parent_of(of)
  }

  /// `id` together with every group below it.
  pub fn subtree_ids(&self, id: Uuid) -> HashSet<Uuid> {
    let mut ids: HashSet<Uuid> = self.descendants(id).into_iter().map(|(_, g)| g.group_id).collect();
    if self.groups.contains_key(&id) {
      ids.insert(id);
    }
    ids
  }

  fn neighbourhood(&self, id: Uuid) -> Vec<&Group> {
    let Some(group) = self.get(id) else { return Vec::new() };
    let scope = group.parent_id.unwrap_or(id);
    self
      .descendants(scope)
      .into_iter()
      .map(|(_, g)| g)
      .filter(|g| g.group_id != id)
      .collect()
  }

  /// Groups in the same city among the parent's descendants (or the group's
  /// own descendants for a root).
  pub fn close_city_groups(&self, id: Uuid) -> Vec<&Group> {
    let Some(city) = self.get(id).and_then(|g| g.location.city.as_deref()) else {
      return Vec::new();
    };
    self
      .neighbourhood(id)
      .into_iter()
      .filter(|g| g.location.city.as_deref() == Some(city))
      .collect()
  }

  pub fn close_country_groups(&self, id: Uuid) -> Vec<&Group> {
    let Some(country) = self.get(id).and_then(|g| g.location.country.as_deref()) else {
      return Vec::new();
    };
    self
      .neighbourhood(id)
      .into_iter()
      .filter(|g| g.location.country.as_deref() == Some(country))
      .collect()
  }

  /// Whether `profile_id` leads the parent of `id`, or leads `id` itself when
  /// it is a root.
  pub fn is_leader_of_parent_group(&self, profile_id: Uuid, id: Uuid) -> bool {
    let Some(group) = self.get(id) else { return false };
    match group.parent_id.and_then(|p| self.get(p)) {
      Some(parent) => parent.leader_id == profile_id,
      None => group.leader_id == profile_id,
    }
  }

  pub fn led_by(&self, profile_id: Uuid) -> Option<&Group> {
    self.groups.values().find(|g| g.leader_id == profile_id)
  }
}

// ─── Moves ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
  ChildGroup,
  SisterGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
  #[error("group {0} not found")]
  GroupNotFound(String),

  #[error("profile is not a member of {0}")]
  NotAMember(String),

  #[error("{0} is not a child group of {1}")]
  NotAChildGroup(String, String),

  #[error("{0} is not a sister group of {1}")]
  NotASisterGroup(String, String),

  #[error("a profile cannot be moved into the group it leads")]
  TargetLedByProfile,
}

/// Who is moved where, and which group (if any) gets detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
  pub kind:            MoveKind,
  pub profile_id:      Uuid,
  pub from_group_id:   Uuid,
  pub to_group_id:     Uuid,
  /// The group led by the moved profile; its parent pointer is cleared.
  pub detach_group_id: Option<Uuid>,
}

/// The inputs to [`plan_move`].
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'a> {
  pub kind:              MoveKind,
  /// The acting leader's group, which the profile must belong to.
  pub source_group_id:   Uuid,
  pub profile_id:        Uuid,
  pub profile_group_id:  Option<Uuid>,
  pub profile_led_group: Option<Uuid>,
  pub target_slug:       &'a str,
}

pub fn plan_move(tree: &GroupTree, req: MoveRequest<'_>) -> Result<MovePlan, MoveError> {
  let source = tree
    .get(req.source_group_id)
    .ok_or_else(|| MoveError::GroupNotFound(req.source_group_id.to_string()))?;

  if req.profile_group_id != Some(source.group_id) {
    return Err(MoveError::NotAMember(source.slug.clone()));
  }

  let target = tree
    .by_slug(req.target_slug)
    .ok_or_else(|| MoveError::GroupNotFound(req.target_slug.to_owned()))?;

  let legal = match req.kind {
    MoveKind::ChildGroup => tree.is_descendant(target.group_id, source.group_id),
    MoveKind::SisterGroup => tree.is_sister(target.group_id, source.group_id),
  };
  if !legal {
    let (t, s) = (target.slug.clone(), source.slug.clone());
    return Err(match req.kind {
      MoveKind::ChildGroup => MoveError::NotAChildGroup(t, s),
      MoveKind::SisterGroup => MoveError::NotASisterGroup(t, s),
    });
  }

  if req.profile_led_group == Some(target.group_id) {
    return Err(MoveError::TargetLedByProfile);
  }

  Ok(MovePlan {
    kind:            req.kind,
    profile_id:      req.profile_id,
    from_group_id:   source.group_id,
    to_group_id:     target.group_id,
    detach_group_id: req.profile_led_group,
  })
}
