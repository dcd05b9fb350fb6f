//! The acting-profile extractor.
//!
//! Requests name the profile they act as in the `x-kns-profile` header
//! (a profile slug). There is no password or session handling; the header is
//! trusted as given.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use kns_core::{profile::Profile, store::CommunityStore};

use crate::error::ApiError;

pub const ACTING_HEADER: &str = "x-kns-profile";

/// The profile a request acts as. Missing or unknown header → 401.
pub struct Acting(pub Profile);

impl<S> FromRequestParts<Arc<S>> for Acting
where
  S: CommunityStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    let slug = parts
      .headers
      .get(ACTING_HEADER)
      .and_then(|v| v.to_str().ok())
      .filter(|s| !s.is_empty())
      .ok_or(ApiError::Unauthorized)?
      .to_owned();

    let profile = store
      .get_profile_by_slug(&slug)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(Acting(profile))
  }
}
