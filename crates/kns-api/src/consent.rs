//! Handlers for the consent-form workflow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profiles/{slug}/consent-form` | Submit (self or own group leader) |
//! | `GET`  | `/consent-forms/{id}` | |
//! | `POST` | `/consent-forms/{id}/approve` | Leader of the profile's group or an ancestor |
//! | `POST` | `/consent-forms/{id}/reject` | Body: `{"reason":"…"}` (optional) |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use kns_core::{consent::ConsentForm, profile::Profile, store::CommunityStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{acting::Acting, error::ApiError, lookup};

/// `POST /profiles/{slug}/consent-form`
pub async fn submit<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  if profile.profile_id != acting.profile_id
    && !lookup::leads_profile_group(&*store, &acting, &profile).await?
  {
    return Err(ApiError::Forbidden("cannot submit a consent form for this profile".into()));
  }

  let existing = store
    .consent_form_for(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  ConsentForm::ensure_can_submit(existing.as_ref())?;

  let form = ConsentForm::submit(profile.profile_id, acting.profile_id, Utc::now());
  let form = store.submit_consent_form(form).await.map_err(ApiError::store)?;
  tracing::info!(profile = %profile.slug, "consent form submitted");
  Ok((StatusCode::CREATED, Json(form)))
}

async fn form_by_id<S: CommunityStore>(store: &S, id: Uuid) -> Result<ConsentForm, ApiError> {
  store
    .get_consent_form(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("consent form {id} not found")))
}

/// `GET /consent-forms/{id}`
pub async fn get_one<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ConsentForm>, ApiError> {
  Ok(Json(form_by_id(&*store, id).await?))
}

/// Loads the form and checks that `acting` may review it.
async fn reviewable<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  id: Uuid,
) -> Result<ConsentForm, ApiError> {
  let form = form_by_id(store, id).await?;
  let profile = store
    .get_profile(form.profile_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {} not found", form.profile_id)))?;
  if !lookup::leads_profile_group(store, acting, &profile).await? {
    return Err(ApiError::Forbidden("only a leader above this profile may review".into()));
  }
  Ok(form)
}

/// `POST /consent-forms/{id}/approve`
pub async fn approve<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(id): Path<Uuid>,
) -> Result<Json<ConsentForm>, ApiError> {
  let mut form = reviewable(&*store, &acting, id).await?;
  form.approve(acting.profile_id, Utc::now())?;
  let form = store.save_consent_form(form).await.map_err(ApiError::store)?;
  Ok(Json(form))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  #[serde(default)]
  pub reason: Option<String>,
}

/// `POST /consent-forms/{id}/reject`
pub async fn reject<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<ConsentForm>, ApiError> {
  let mut form = reviewable(&*store, &acting, id).await?;
  form.reject(acting.profile_id, body.reason, Utc::now())?;
  let form = store.save_consent_form(form).await.map_err(ApiError::store)?;
  Ok(Json(form))
}
