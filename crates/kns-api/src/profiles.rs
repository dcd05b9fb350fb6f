//! Handlers for `/profiles` endpoints and role changes.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/profiles` | |
//! | `POST`  | `/profiles` | Body: [`NewProfile`]; 409 on a taken email |
//! | `GET`   | `/profiles/{slug}` | 404 if not found |
//! | `PATCH` | `/profiles/{slug}` | Self only; body: [`ProfileUpdate`] |
//! | `POST`  | `/profiles/{slug}/verify-email` | Body: `{"token":"…"}`; 422 on a wrong token |
//! | `GET`   | `/profiles/{slug}/eligibility` | Every role check with reasons |
//! | `POST`  | `/profiles/{slug}/make-leader` | 200 promoted, 202 approval requested |
//! | `POST`  | `/profiles/{slug}/make-member` | |
//! | `POST`  | `/profiles/{slug}/make-external-person` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use kns_core::{
  approval::ActionApproval,
  eligibility::EligibilityReport,
  group::Group,
  profile::{NewProfile, Profile, ProfileUpdate, Role},
  store::CommunityStore,
};

use serde::Deserialize;

use crate::{
  acting::Acting,
  error::ApiError,
  lookup::{self, RoleInputs},
};

/// `GET /profiles`
pub async fn list<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Profile>>, ApiError> {
  Ok(Json(store.list_profiles().await.map_err(ApiError::store)?))
}

/// `POST /profiles`
pub async fn create<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewProfile>,
) -> Result<impl IntoResponse, ApiError> {
  if body.email.trim().is_empty() {
    return Err(ApiError::invalid("email is required"));
  }
  body.validate()?;
  if store
    .get_profile_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!("{} is already registered", body.email)));
  }

  let profile = store.add_profile(body).await.map_err(ApiError::store)?;
  let token = store
    .issue_email_token(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(profile = %profile.slug, "profile created");
  // No mailer yet; the token is only logged.
  tracing::debug!(profile = %profile.slug, email = %profile.email, %token, "email confirmation issued");
  Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailBody {
  pub token: String,
}

/// `POST /profiles/{slug}/verify-email`
pub async fn verify_email<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
  Json(body): Json<VerifyEmailBody>,
) -> Result<Json<Profile>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  let verified = store
    .confirm_email(profile.profile_id, body.token)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(verified))
}

/// `GET /profiles/{slug}`
pub async fn get_one<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  Ok(Json(lookup::profile_by_slug(&*store, &slug).await?))
}

/// `PATCH /profiles/{slug}`
pub async fn update<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
  let mut profile = lookup::profile_by_slug(&*store, &slug).await?;
  if profile.profile_id != acting.profile_id {
    return Err(ApiError::Forbidden("profiles can only be edited by their owner".into()));
  }
  body.apply(&mut profile)?;
  let saved = store.save_profile(profile).await.map_err(ApiError::store)?;
  Ok(Json(saved))
}

/// `GET /profiles/{slug}/eligibility`
pub async fn eligibility<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<EligibilityReport>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  let inputs = RoleInputs::load(&*store, &profile).await?;
  Ok(Json(inputs.context(&profile).report()))
}

// ─── Role changes ────────────────────────────────────────────────────────────

/// Loads the target and the acting leader's group, requiring the target to be
/// a member of it.
async fn target_in_led_group<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  slug: &str,
) -> Result<(Profile, Group), ApiError> {
  let group = lookup::led_group(store, acting).await?;
  let target = lookup::profile_by_slug(store, slug).await?;
  let membership = store
    .membership_of(target.profile_id)
    .await
    .map_err(ApiError::store)?;
  if membership.map(|m| m.group_id) != Some(group.group_id) {
    return Err(ApiError::Forbidden(format!("{} is not a member of {}", target.slug, group.slug)));
  }
  Ok((target, group))
}

/// `POST /profiles/{slug}/make-leader`
///
/// Inside a non-root group, and with approval required in settings, this
/// files a request with the parent group's leader instead (202).
pub async fn make_leader<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
) -> Result<Response, ApiError> {
  let (target, group) = target_in_led_group(&*store, &acting, &slug).await?;
  let inputs = RoleInputs::load(&*store, &target).await?;
  inputs
    .context(&target)
    .can_become_leader()
    .map_err(kns_core::Error::Ineligible)?;

  match group.parent_id {
    Some(parent_id) if inputs.settings.change_role_approval_required => {
      if store
        .pending_approval_for(target.profile_id)
        .await
        .map_err(ApiError::store)?
        .is_some()
      {
        return Err(ApiError::Conflict(format!(
          "a leader request for {} is already pending",
          target.slug
        )));
      }
      let request = ActionApproval::change_role_to_leader(
        target.profile_id,
        acting.profile_id,
        parent_id,
        inputs.settings.approval_timeout(),
        Utc::now(),
      );
      let request = store.add_approval(request).await.map_err(ApiError::store)?;
      tracing::info!(profile = %target.slug, group = %group.slug, "leader approval requested");
      Ok((StatusCode::ACCEPTED, Json(request)).into_response())
    }
    _ => {
      let promoted = store
        .set_role(target.profile_id, Role::Leader)
        .await
        .map_err(ApiError::store)?;
      Ok(Json(promoted).into_response())
    }
  }
}

/// `POST /profiles/{slug}/make-member`
pub async fn make_member<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  change_role(&*store, &acting, &slug, Role::Member).await
}

/// `POST /profiles/{slug}/make-external-person`
pub async fn make_external_person<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  change_role(&*store, &acting, &slug, Role::ExternalPerson).await
}

async fn change_role<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  slug: &str,
  role: Role,
) -> Result<Json<Profile>, ApiError> {
  let (target, _) = target_in_led_group(store, acting, slug).await?;
  let inputs = RoleInputs::load(store, &target).await?;
  inputs
    .context(&target)
    .can_become(role)
    .map_err(kns_core::Error::Ineligible)?;

  let updated = store
    .set_role(target.profile_id, role)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(profile = %updated.slug, %role, "role changed");
  Ok(Json(updated))
}
