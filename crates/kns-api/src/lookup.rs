//! Store lookups shared by the handlers, mapped to API errors.

use std::collections::HashMap;

use chrono::Utc;
use kns_core::{
  consent::ConsentForm,
  eligibility::RoleContext,
  group::Group,
  hierarchy::GroupTree,
  profile::Profile,
  settings::Settings,
  store::CommunityStore,
  tree::TreeStats,
};
use uuid::Uuid;

use crate::error::ApiError;

pub async fn group_by_slug<S: CommunityStore>(store: &S, slug: &str) -> Result<Group, ApiError> {
  store
    .get_group_by_slug(slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {slug} not found")))
}

pub async fn profile_by_slug<S: CommunityStore>(
  store: &S,
  slug: &str,
) -> Result<Profile, ApiError> {
  store
    .get_profile_by_slug(slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {slug} not found")))
}

pub async fn group_tree<S: CommunityStore>(store: &S) -> Result<GroupTree, ApiError> {
  let groups = store.list_groups().await.map_err(ApiError::store)?;
  Ok(GroupTree::new(groups))
}

/// The group `profile` leads, or 403.
pub async fn led_group<S: CommunityStore>(store: &S, profile: &Profile) -> Result<Group, ApiError> {
  store
    .group_led_by(profile.profile_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Forbidden("acting profile does not lead a group".into()))
}

/// Requires `acting` to lead `group`.
pub fn ensure_leads(acting: &Profile, group: &Group) -> Result<(), ApiError> {
  if group.leader_id == acting.profile_id {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!("only the leader of {} may do this", group.slug)))
  }
}

/// Whether `acting` leads the group `profile` belongs to, or any group above
/// it.
pub async fn leads_profile_group<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  profile: &Profile,
) -> Result<bool, ApiError> {
  let Some(membership) = store
    .membership_of(profile.profile_id)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(false);
  };
  let tree = group_tree(store).await?;
  let Some(group) = tree.get(membership.group_id) else {
    return Ok(false);
  };
  Ok(
    std::iter::once(group)
      .chain(tree.ancestors(group.group_id))
      .any(|g| g.leader_id == acting.profile_id),
  )
}

/// [`leads_profile_group`], or 403.
pub async fn ensure_leads_profile<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  profile: &Profile,
) -> Result<(), ApiError> {
  if leads_profile_group(store, acting, profile).await? {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!("only a leader above {} may do this", profile.slug)))
  }
}

pub async fn tree_stats<S: CommunityStore>(store: &S, tree: &GroupTree) -> Result<TreeStats, ApiError> {
  let member_counts = store.member_counts().await.map_err(ApiError::store)?;
  let profiles = store.list_profiles().await.map_err(ApiError::store)?;

  let names: HashMap<Uuid, String> =
    profiles.iter().map(|p| (p.profile_id, p.full_name())).collect();
  let leader_names = tree
    .iter()
    .filter_map(|g| names.get(&g.leader_id).map(|n| (g.group_id, n.clone())))
    .collect();

  Ok(TreeStats { member_counts, leader_names })
}

/// Everything [`RoleContext`] borrows, loaded for one profile.
pub struct RoleInputs {
  pub leads_group:  bool,
  pub consent_form: Option<ConsentForm>,
  pub settings:     Settings,
}

impl RoleInputs {
  pub async fn load<S: CommunityStore>(store: &S, profile: &Profile) -> Result<Self, ApiError> {
    let leads_group = store
      .group_led_by(profile.profile_id)
      .await
      .map_err(ApiError::store)?
      .is_some();
    let consent_form = store
      .consent_form_for(profile.profile_id)
      .await
      .map_err(ApiError::store)?;
    let settings = store.settings().await.map_err(ApiError::store)?;
    Ok(Self { leads_group, consent_form, settings })
  }

  pub fn context<'a>(&'a self, profile: &'a Profile) -> RoleContext<'a> {
    RoleContext {
      profile,
      leads_group: self.leads_group,
      consent_form: self.consent_form.as_ref(),
      settings: &self.settings,
      today: Utc::now().date_naive(),
    }
  }
}
