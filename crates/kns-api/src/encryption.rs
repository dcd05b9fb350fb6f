//! Handlers for hiding and revealing profile names.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/encryption-reasons` | |
//! | `POST` | `/profiles/{slug}/encrypt` | Body: `{"reason":"…"}`; leader above the profile; 409 if already hidden |
//! | `POST` | `/profiles/{slug}/decrypt` | Only the profile that hid the name; 409 if not hidden |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use kns_core::{
  encryption::{EncryptionReason, ProfileEncryption, ReasonEntry},
  profile::Profile,
  store::CommunityStore,
};
use serde::Deserialize;

use crate::{acting::Acting, error::ApiError, lookup};

/// `GET /encryption-reasons`
pub async fn reasons() -> Json<Vec<ReasonEntry>> {
  Json(EncryptionReason::all().map(ReasonEntry::from).collect())
}

#[derive(Debug, Deserialize)]
pub struct EncryptBody {
  pub reason: EncryptionReason,
}

/// `POST /profiles/{slug}/encrypt`
pub async fn encrypt<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<EncryptBody>,
) -> Result<Json<Profile>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  lookup::ensure_leads_profile(&*store, &acting, &profile).await?;
  let encryption = ProfileEncryption::new(&profile, body.reason, acting.profile_id, Utc::now())?;
  let hidden = store.encrypt_profile(encryption).await.map_err(ApiError::store)?;
  Ok(Json(hidden))
}

/// `POST /profiles/{slug}/decrypt`
pub async fn decrypt<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  ProfileEncryption::ensure_can_decrypt(&profile, acting.profile_id)?;
  let revealed = store
    .decrypt_profile(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(revealed))
}
