//! Static and organisation-wide reference data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/countries` | Country names and phone prefixes |
//! | `GET`  | `/settings` | |

use std::sync::Arc;

use axum::{Json, extract::State};
use kns_core::{
  location::{COUNTRIES, Country},
  settings::Settings,
  store::CommunityStore,
};

use crate::error::ApiError;

/// `GET /countries`
pub async fn countries() -> Json<&'static [Country]> { Json(COUNTRIES) }

/// `GET /settings`
pub async fn settings<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Settings>, ApiError> {
  Ok(Json(store.settings().await.map_err(ApiError::store)?))
}
