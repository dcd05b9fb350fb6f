//! `GET /notifications` — the acting leader's drawer.
//!
//! Pending consent forms of profiles in the leader's group or any group below
//! it, plus pending approval requests addressed to the leader's group. A
//! profile that leads no group gets an empty drawer.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use kns_core::{
  consent::ConsentStatus,
  notification::{DrawerSection, Notification, NotificationKind, group_notifications, unread_count},
  profile::Profile,
  store::CommunityStore,
};
use serde::Serialize;

use crate::{acting::Acting, approvals, error::ApiError, lookup};

#[derive(Debug, Serialize)]
pub struct Drawer {
  pub count:    usize,
  pub sections: Vec<DrawerSection>,
}

fn display_name(profile: Option<&Profile>) -> String {
  profile.map_or_else(|| "Unknown profile".to_owned(), Profile::full_name)
}

/// `GET /notifications`
pub async fn drawer<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
) -> Result<Json<Drawer>, ApiError> {
  let Some(group) = store
    .group_led_by(acting.profile_id)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(Json(Drawer { count: 0, sections: Vec::new() }));
  };

  let tree = lookup::group_tree(&*store).await?;
  let scope = tree.subtree_ids(group.group_id);
  let profiles = store.list_profiles().await.map_err(ApiError::store)?;
  let find = |id: uuid::Uuid| profiles.iter().find(|p| p.profile_id == id);

  let mut items = Vec::new();

  for form in store
    .list_consent_forms(Some(ConsentStatus::Pending))
    .await
    .map_err(ApiError::store)?
  {
    let in_scope = store
      .membership_of(form.profile_id)
      .await
      .map_err(ApiError::store)?
      .is_some_and(|m| scope.contains(&m.group_id));
    if !in_scope {
      continue;
    }
    let profile = find(form.profile_id);
    items.push(Notification {
      kind:         NotificationKind::ConsentForm,
      item_id:      form.consent_form_id,
      title:        format!("Consent form from {}", display_name(profile)),
      profile_slug: profile.map(|p| p.slug.clone()).unwrap_or_default(),
      created_at:   form.created_at,
    });
  }

  for approval in approvals::pending_for_group(&*store, group.group_id).await? {
    let profile = find(approval.new_leader_id);
    items.push(Notification {
      kind:         NotificationKind::LeaderApproval,
      item_id:      approval.approval_id,
      title:        format!("{}: {}", approval.action_type.label(), display_name(profile)),
      profile_slug: profile.map(|p| p.slug.clone()).unwrap_or_default(),
      created_at:   approval.created_at,
    });
  }

  items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  let sections = group_notifications(items, Utc::now());
  Ok(Json(Drawer { count: unread_count(&sections), sections }))
}
