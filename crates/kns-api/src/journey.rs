//! Handlers for the reference catalogs and a profile's journey.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/levels` | Each with its `sublevels` |
//! | `GET`    | `/levels/{slug}` | |
//! | `GET`    | `/levels/{slug}/sublevels` | |
//! | `GET`    | `/sublevels` | |
//! | `GET`    | `/classifications` | Each with its `subclassifications`, in order |
//! | `GET`    | `/classifications/{slug}/subclassifications` | |
//! | `GET`    | `/faith-milestones` | |
//! | `POST`   | `/faith-milestones` | Group leaders only; body: [`NewFaithMilestone`] |
//! | `GET`    | `/profiles/{slug}/journey` | |
//! | `POST`   | `/profiles/{slug}/level` | Body: [`NewPlacement`]; closes the open level |
//! | `POST`   | `/profiles/{slug}/classifications` | Body: [`NewPlacement`] |
//! | `DELETE` | `/profiles/{slug}/placements/{id}` | Close a placement |
//! | `POST`   | `/profiles/{slug}/faith-milestones` | Body: `{"milestone":"…"}` |
//!
//! Every write against a profile requires a leader of its group or a group
//! above it.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use kns_core::{
  catalog::{CatalogEntry, CatalogKind},
  journey::{
    FaithMilestone, Journey, NewFaithMilestone, NewPlacement, Placement, ProfileFaithMilestone,
  },
  profile::Profile,
  store::CommunityStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{acting::Acting, error::ApiError, lookup};

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LevelView {
  #[serde(flatten)]
  pub level:     CatalogEntry,
  pub sublevels: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClassificationView {
  #[serde(flatten)]
  pub classification:     CatalogEntry,
  pub subclassifications: Vec<CatalogEntry>,
}

async fn catalog_entry<S: CommunityStore>(
  store: &S,
  kind: CatalogKind,
  slug: &str,
) -> Result<CatalogEntry, ApiError> {
  store
    .get_catalog_entry(kind, slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{kind} {slug} not found")))
}

async fn children<S: CommunityStore>(
  store: &S,
  entry: &CatalogEntry,
) -> Result<Vec<CatalogEntry>, ApiError> {
  store.catalog_children(entry.entry_id).await.map_err(ApiError::store)
}

/// Every entry of `kind` paired with its linked children.
async fn with_children<S: CommunityStore>(
  store: &S,
  kind: CatalogKind,
) -> Result<Vec<(CatalogEntry, Vec<CatalogEntry>)>, ApiError> {
  let entries = store.list_catalog(kind).await.map_err(ApiError::store)?;
  let mut out = Vec::with_capacity(entries.len());
  for entry in entries {
    let below = children(store, &entry).await?;
    out.push((entry, below));
  }
  Ok(out)
}

/// `GET /levels`
pub async fn levels<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<LevelView>>, ApiError> {
  let levels = with_children(&*store, CatalogKind::Level).await?;
  Ok(Json(
    levels
      .into_iter()
      .map(|(level, sublevels)| LevelView { level, sublevels })
      .collect(),
  ))
}

/// `GET /levels/{slug}`
pub async fn level<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<LevelView>, ApiError> {
  let level = catalog_entry(&*store, CatalogKind::Level, &slug).await?;
  let sublevels = children(&*store, &level).await?;
  Ok(Json(LevelView { level, sublevels }))
}

/// `GET /levels/{slug}/sublevels`
pub async fn level_sublevels<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
  let level = catalog_entry(&*store, CatalogKind::Level, &slug).await?;
  Ok(Json(children(&*store, &level).await?))
}

/// `GET /sublevels`
pub async fn sublevels<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
  let all = store
    .list_catalog(CatalogKind::Sublevel)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(all))
}

/// `GET /classifications`
pub async fn classifications<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ClassificationView>>, ApiError> {
  let classes = with_children(&*store, CatalogKind::Classification).await?;
  Ok(Json(
    classes
      .into_iter()
      .map(|(classification, subclassifications)| ClassificationView {
        classification,
        subclassifications,
      })
      .collect(),
  ))
}

/// `GET /classifications/{slug}/subclassifications`
pub async fn classification_subclassifications<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
  let class = catalog_entry(&*store, CatalogKind::Classification, &slug).await?;
  Ok(Json(children(&*store, &class).await?))
}

// ─── Faith milestones ────────────────────────────────────────────────────────

/// `GET /faith-milestones`
pub async fn faith_milestones<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<FaithMilestone>>, ApiError> {
  Ok(Json(store.list_faith_milestones().await.map_err(ApiError::store)?))
}

/// `POST /faith-milestones`
pub async fn add_faith_milestone<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Json(body): Json<NewFaithMilestone>,
) -> Result<impl IntoResponse, ApiError> {
  lookup::led_group(&*store, &acting).await?;
  body.validate()?;
  let milestone = store
    .add_faith_milestone(acting.profile_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(milestone)))
}

// ─── Journey ─────────────────────────────────────────────────────────────────

/// `GET /profiles/{slug}/journey`
pub async fn journey<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Journey>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  Ok(Json(store.journey(profile.profile_id).await.map_err(ApiError::store)?))
}

async fn place<S: CommunityStore>(
  store: &S,
  acting: &Profile,
  slug: &str,
  kind: CatalogKind,
  body: NewPlacement,
) -> Result<(StatusCode, Json<Placement>), ApiError> {
  let profile = lookup::profile_by_slug(store, slug).await?;
  lookup::ensure_leads_profile(store, acting, &profile).await?;

  let entry = catalog_entry(store, kind, &body.entry).await?;
  let below = children(store, &entry).await?;
  let sub_entry = match (&body.sub_entry, kind.child()) {
    (Some(sub), Some(child_kind)) => Some(catalog_entry(store, child_kind, sub).await?),
    _ => None,
  };

  let placement =
    Placement::new(profile.profile_id, &entry, sub_entry.as_ref(), &below, Utc::now())?;
  let placement = store.add_placement(placement).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(placement)))
}

/// `POST /profiles/{slug}/level`
pub async fn set_level<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<NewPlacement>,
) -> Result<impl IntoResponse, ApiError> {
  place(&*store, &acting, &slug, CatalogKind::Level, body).await
}

/// `POST /profiles/{slug}/classifications`
pub async fn add_classification<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<NewPlacement>,
) -> Result<impl IntoResponse, ApiError> {
  place(&*store, &acting, &slug, CatalogKind::Classification, body).await
}

/// `DELETE /profiles/{slug}/placements/{id}`
pub async fn close_placement<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path((slug, id)): Path<(String, Uuid)>,
) -> Result<Json<Placement>, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  lookup::ensure_leads_profile(&*store, &acting, &profile).await?;
  let closed = store
    .close_placement(profile.profile_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(closed))
}

#[derive(Debug, Deserialize)]
pub struct RecordMilestoneBody {
  /// Slug of the faith milestone.
  pub milestone: String,
}

/// `POST /profiles/{slug}/faith-milestones`
pub async fn record_faith_milestone<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<RecordMilestoneBody>,
) -> Result<impl IntoResponse, ApiError> {
  let profile = lookup::profile_by_slug(&*store, &slug).await?;
  lookup::ensure_leads_profile(&*store, &acting, &profile).await?;
  let milestone = store
    .get_faith_milestone_by_slug(&body.milestone)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("faith milestone {} not found", body.milestone)))?;

  let record =
    ProfileFaithMilestone::record(profile.profile_id, milestone, acting.profile_id, Utc::now())?;
  let record = store.record_faith_milestone(record).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}
