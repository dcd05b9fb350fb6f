//! Handlers for `/groups` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/groups` | Optional `?search=`, `?country=`, `?city=` |
//! | `POST` | `/groups` | Register; the acting profile becomes leader |
//! | `GET`  | `/groups/statistics` | |
//! | `GET`  | `/groups/{slug}` | 404 if not found |
//! | `GET`  | `/groups/{slug}/children` | Direct children, by name |
//! | `GET`  | `/groups/{slug}/sisters` | |
//! | `GET`  | `/groups/{slug}/ancestors` | Nearest first |
//! | `GET`  | `/groups/{slug}/descendants` | Flat, pre-order, with depth |
//! | `GET`  | `/groups/{slug}/close-groups` | Same city / same country |
//! | `GET`  | `/groups/{slug}/tree` | Nested view-model |
//! | `GET`  | `/groups/{slug}/tree.html` | Nested `<ul>` |
//! | `GET`  | `/groups/{slug}/members` | |
//! | `POST` | `/groups/{slug}/members` | Body: `{"profile_slug":"…"}` |
//! | `POST` | `/groups/{slug}/move-to-child` | Body: `{"profile_slug":"…","target_group_slug":"…"}` |
//! | `POST` | `/groups/{slug}/move-to-sister` | Same body |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{Html, IntoResponse},
};
use kns_core::{
  group::{Group, GroupMember, NewGroup},
  hierarchy::{MoveKind, MoveRequest, plan_move},
  profile::Profile,
  stats::GroupStatistics,
  store::CommunityStore,
  tree::{DescendantRow, GroupNode},
};
use serde::{Deserialize, Serialize};

use crate::{
  acting::Acting,
  error::ApiError,
  lookup::{self, RoleInputs},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Case-insensitive substring of the group name.
  pub search:  Option<String>,
  pub country: Option<String>,
  pub city:    Option<String>,
}

impl ListParams {
  fn matches(&self, group: &Group) -> bool {
    let search = self
      .search
      .as_deref()
      .is_none_or(|s| group.name.to_lowercase().contains(&s.to_lowercase()));
    let country = self
      .country
      .as_deref()
      .is_none_or(|c| group.location.country.as_deref().is_some_and(|gc| gc.eq_ignore_ascii_case(c)));
    let city = self
      .city
      .as_deref()
      .is_none_or(|c| group.location.city.as_deref().is_some_and(|gc| gc.eq_ignore_ascii_case(c)));
    search && country && city
  }
}

/// `GET /groups`
pub async fn list<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let groups = store.list_groups().await.map_err(ApiError::store)?;
  Ok(Json(groups.into_iter().filter(|g| params.matches(g)).collect()))
}

// ─── Register ────────────────────────────────────────────────────────────────

/// `POST /groups` — the new group hangs under the registrant's own group.
pub async fn register<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Json(body): Json<NewGroup>,
) -> Result<impl IntoResponse, ApiError> {
  let inputs = RoleInputs::load(&*store, &acting).await?;
  inputs
    .context(&acting)
    .can_register_group()
    .map_err(kns_core::Error::Ineligible)?;
  body.validate()?;

  let parent_id = store
    .membership_of(acting.profile_id)
    .await
    .map_err(ApiError::store)?
    .map(|m| m.group_id);

  let group = store
    .register_group(acting.profile_id, parent_id, body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(group = %group.slug, leader = %acting.slug, "group registered");
  Ok((StatusCode::CREATED, Json(group)))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /groups/statistics`
pub async fn statistics<S: CommunityStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<GroupStatistics>, ApiError> {
  let groups = store.list_groups().await.map_err(ApiError::store)?;
  let counts = store.member_counts().await.map_err(ApiError::store)?;
  Ok(Json(GroupStatistics::compute(&groups, &counts)))
}

/// `GET /groups/{slug}`
pub async fn get_one<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Group>, ApiError> {
  Ok(Json(lookup::group_by_slug(&*store, &slug).await?))
}

/// `GET /groups/{slug}/children`
pub async fn children<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  let tree = lookup::group_tree(&*store).await?;
  Ok(Json(tree.children(group.group_id).into_iter().cloned().collect()))
}

/// `GET /groups/{slug}/sisters`
pub async fn sisters<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  let tree = lookup::group_tree(&*store).await?;
  Ok(Json(tree.sisters(group.group_id).into_iter().cloned().collect()))
}

/// `GET /groups/{slug}/ancestors`
pub async fn ancestors<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  let tree = lookup::group_tree(&*store).await?;
  Ok(Json(tree.ancestors(group.group_id).into_iter().cloned().collect()))
}

#[derive(Debug, Serialize)]
pub struct CloseGroups {
  pub city:    Vec<Group>,
  pub country: Vec<Group>,
}

/// `GET /groups/{slug}/close-groups`
pub async fn close_groups<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<CloseGroups>, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  let tree = lookup::group_tree(&*store).await?;
  Ok(Json(CloseGroups {
    city:    tree.close_city_groups(group.group_id).into_iter().cloned().collect(),
    country: tree.close_country_groups(group.group_id).into_iter().cloned().collect(),
  }))
}

async fn build_tree<S: CommunityStore>(store: &S, slug: &str) -> Result<GroupNode, ApiError> {
  let group = lookup::group_by_slug(store, slug).await?;
  let tree = lookup::group_tree(store).await?;
  let stats = lookup::tree_stats(store, &tree).await?;
  GroupNode::build(&tree, &stats, group.group_id)
    .ok_or_else(|| ApiError::NotFound(format!("group {slug} not found")))
}

/// `GET /groups/{slug}/descendants`
pub async fn descendants<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<DescendantRow>>, ApiError> {
  Ok(Json(build_tree(&*store, &slug).await?.flatten()))
}

/// `GET /groups/{slug}/tree`
pub async fn tree<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<GroupNode>, ApiError> {
  Ok(Json(build_tree(&*store, &slug).await?))
}

/// `GET /groups/{slug}/tree.html`
pub async fn tree_html<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Html<String>, ApiError> {
  Ok(Html(build_tree(&*store, &slug).await?.render_html()))
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// `GET /groups/{slug}/members`
pub async fn members<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Vec<Profile>>, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  let members = store.list_members(group.group_id).await.map_err(ApiError::store)?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
  pub profile_slug: String,
}

/// `POST /groups/{slug}/members` — leader only.
pub async fn add_member<S: CommunityStore>(
  State(store): State<Arc<S>>,
  Acting(acting): Acting,
  Path(slug): Path<String>,
  Json(body): Json<AddMemberBody>,
) -> Result<impl IntoResponse, ApiError> {
  let group = lookup::group_by_slug(&*store, &slug).await?;
  lookup::ensure_leads(&acting, &group)?;
  let profile = lookup::profile_by_slug(&*store, &body.profile_slug).await?;

  if store
    .membership_of(profile.profile_id)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!("{} already belongs to a group", profile.slug)));
  }

  let member = store
    .add_member(profile.profile_id, group.group_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(member)))
}

// ─── Moves ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveBody {
  pub profile_slug:      String,
  pub target_group_slug: String,
}

/// `POST /groups/{slug}/move-to-child`
pub async fn move_to_child<S: CommunityStore>(
  State(store): State<Arc<S>>,
  acting: Acting,
  Path(slug): Path<String>,
  Json(body): Json<MoveBody>,
) -> Result<Json<GroupMember>, ApiError> {
  move_member(&*store, acting, &slug, body, MoveKind::ChildGroup).await
}

/// `POST /groups/{slug}/move-to-sister`
pub async fn move_to_sister<S: CommunityStore>(
  State(store): State<Arc<S>>,
  acting: Acting,
  Path(slug): Path<String>,
  Json(body): Json<MoveBody>,
) -> Result<Json<GroupMember>, ApiError> {
  move_member(&*store, acting, &slug, body, MoveKind::SisterGroup).await
}

async fn move_member<S: CommunityStore>(
  store: &S,
  Acting(acting): Acting,
  slug: &str,
  body: MoveBody,
  kind: MoveKind,
) -> Result<Json<GroupMember>, ApiError> {
  let source = lookup::group_by_slug(store, slug).await?;
  lookup::ensure_leads(&acting, &source)?;
  let profile = lookup::profile_by_slug(store, &body.profile_slug).await?;

  let membership = store
    .membership_of(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  let led = store
    .group_led_by(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  let tree = lookup::group_tree(store).await?;

  let plan = plan_move(&tree, MoveRequest {
    kind,
    source_group_id: source.group_id,
    profile_id: profile.profile_id,
    profile_group_id: membership.map(|m| m.group_id),
    profile_led_group: led.map(|g| g.group_id),
    target_slug: &body.target_group_slug,
  })?;

  let member = store.apply_move(plan).await.map_err(ApiError::store)?;
  tracing::info!(
    profile = %profile.slug,
    from = %source.slug,
    to = %body.target_group_slug,
    ?kind,
    "member moved"
  );
  Ok(Json(member))
}
