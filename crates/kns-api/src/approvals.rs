//! Handlers for leader approval requests.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/approvals` | Pending requests addressed to the acting leader's group |
//! | `POST` | `/approvals/{id}/approve` | Promotes the new leader |
//! | `POST` | `/approvals/{id}/reject` | |
//!
//! Stale requests are expired (and persisted) whenever they are read.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use kns_core::{
  approval::{ActionApproval, ApprovalStatus},
  store::CommunityStore,
};
use uuid::Uuid;

use crate::{acting::Acting, error::ApiError, lookup};

/// Expire `approval` if its timeout has passed, persisting the change.
pub(crate) async fn refresh<S: CommunityStore>(
  store: &S,
  mut approval: ActionApproval,
) -> Result<ActionApproval, ApiError> {
  if approval.check_timeout(Utc::now()) {
    tracing::debug!(approval = %approval.approval_id, "approval request expired");
    approval = store.save_approval(approval).await.map_err(ApiError::store)?;
  }
  Ok(approval)
}

/// Pending requests for `group_id`, after expiring stale ones.
pub(crate) async fn pending_for_group<S: CommunityStore>(
  store: &S,
  group_id: Uuid,
) -> Result<Vec<ActionApproval>, ApiError> {
  let mut pending = Vec::new();
  for approval in store.list_approvals(group_id).await.map_err(ApiError::store)? {
    let approval = refresh(store, approval).await?;
    if approval.is_pending() {
      pending.push(approval);
    }
  }
  Ok(pending)
}

/// `GET /approvals`
pub async fn list<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
) -> Result<Json<Vec<ActionApproval>>, ApiError> {
  let group = lookup::led_group(&*store, &acting).await?;
  Ok(Json(pending_for_group(&*store, group.group_id).await?))
}

/// `POST /approvals/{id}/approve`
pub async fn approve<S: CommunityStore>(
  State(store): State<Arc<S>>,
  acting: Acting,
  Path(id): Path<Uuid>,
) -> Result<Json<ActionApproval>, ApiError> {
  decide(&*store, acting, id, ApprovalStatus::Approved).await
}

/// `POST /approvals/{id}/reject`
pub async fn reject<S: CommunityStore>(
  State(store): State<Arc<S>>,
  acting: Acting,
  Path(id): Path<Uuid>,
) -> Result<Json<ActionApproval>, ApiError> {
  decide(&*store, acting, id, ApprovalStatus::Rejected).await
}

async fn decide<S: CommunityStore>(
  store: &S,
  Acting(acting): Acting,
  id: Uuid,
  outcome: ApprovalStatus,
) -> Result<Json<ActionApproval>, ApiError> {
  let approval = store
    .get_approval(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("approval request {id} not found")))?;
  let consumer = store
    .get_group(approval.consumer_group_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {} not found", approval.consumer_group_id)))?;

  let mut approval = refresh(store, approval).await?;
  let now = Utc::now();
  match outcome {
    ApprovalStatus::Approved => approval.approve(acting.profile_id, consumer.leader_id, now)?,
    _ => approval.reject(acting.profile_id, consumer.leader_id, now)?,
  }

  let approval = store.save_approval(approval).await.map_err(ApiError::store)?;
  tracing::info!(
    approval = %approval.approval_id,
    status = %approval.status,
    decided_by = %acting.slug,
    "approval request decided"
  );
  Ok(Json(approval))
}
