//! JSON REST API for the Kingdom Nurturing Suite.
//!
//! Exposes an axum [`Router`] backed by any [`kns_core::store::CommunityStore`].
//! The acting profile is named by the `x-kns-profile` request header; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kns_api::api_router(store.clone()))
//! ```

pub mod acting;
pub mod approvals;
pub mod consent;
pub mod encryption;
pub mod error;
pub mod groups;
pub mod journey;
mod lookup;
pub mod notifications;
pub mod profiles;
pub mod reference;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use kns_core::store::CommunityStore;

pub use acting::ACTING_HEADER;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CommunityStore + 'static,
{
  Router::new()
    // Groups
    .route("/groups", get(groups::list::<S>).post(groups::register::<S>))
    .route("/groups/statistics", get(groups::statistics::<S>))
    .route("/groups/{slug}", get(groups::get_one::<S>))
    .route("/groups/{slug}/children", get(groups::children::<S>))
    .route("/groups/{slug}/sisters", get(groups::sisters::<S>))
    .route("/groups/{slug}/ancestors", get(groups::ancestors::<S>))
    .route("/groups/{slug}/descendants", get(groups::descendants::<S>))
    .route("/groups/{slug}/close-groups", get(groups::close_groups::<S>))
    .route("/groups/{slug}/tree", get(groups::tree::<S>))
    .route("/groups/{slug}/tree.html", get(groups::tree_html::<S>))
    .route(
      "/groups/{slug}/members",
      get(groups::members::<S>).post(groups::add_member::<S>),
    )
    .route("/groups/{slug}/move-to-child", post(groups::move_to_child::<S>))
    .route("/groups/{slug}/move-to-sister", post(groups::move_to_sister::<S>))
    // Profiles
    .route("/profiles", get(profiles::list::<S>).post(profiles::create::<S>))
    .route(
      "/profiles/{slug}",
      get(profiles::get_one::<S>).patch(profiles::update::<S>),
    )
    .route("/profiles/{slug}/verify-email", post(profiles::verify_email::<S>))
    .route("/profiles/{slug}/eligibility", get(profiles::eligibility::<S>))
    .route("/profiles/{slug}/make-leader", post(profiles::make_leader::<S>))
    .route("/profiles/{slug}/make-member", post(profiles::make_member::<S>))
    .route(
      "/profiles/{slug}/make-external-person",
      post(profiles::make_external_person::<S>),
    )
    // Name encryption
    .route("/encryption-reasons", get(encryption::reasons))
    .route("/profiles/{slug}/encrypt", post(encryption::encrypt::<S>))
    .route("/profiles/{slug}/decrypt", post(encryption::decrypt::<S>))
    // Catalogs and journey
    .route("/levels", get(journey::levels::<S>))
    .route("/levels/{slug}", get(journey::level::<S>))
    .route("/levels/{slug}/sublevels", get(journey::level_sublevels::<S>))
    .route("/sublevels", get(journey::sublevels::<S>))
    .route("/classifications", get(journey::classifications::<S>))
    .route(
      "/classifications/{slug}/subclassifications",
      get(journey::classification_subclassifications::<S>),
    )
    .route(
      "/faith-milestones",
      get(journey::faith_milestones::<S>).post(journey::add_faith_milestone::<S>),
    )
    .route("/profiles/{slug}/journey", get(journey::journey::<S>))
    .route("/profiles/{slug}/level", post(journey::set_level::<S>))
    .route("/profiles/{slug}/classifications", post(journey::add_classification::<S>))
    .route("/profiles/{slug}/placements/{id}", delete(journey::close_placement::<S>))
    .route("/profiles/{slug}/faith-milestones", post(journey::record_faith_milestone::<S>))
    // Consent forms
    .route("/profiles/{slug}/consent-form", post(consent::submit::<S>))
    .route("/consent-forms/{id}", get(consent::get_one::<S>))
    .route("/consent-forms/{id}/approve", post(consent::approve::<S>))
    .route("/consent-forms/{id}/reject", post(consent::reject::<S>))
    // Approvals
    .route("/approvals", get(approvals::list::<S>))
    .route("/approvals/{id}/approve", post(approvals::approve::<S>))
    .route("/approvals/{id}/reject", post(approvals::reject::<S>))
    // Drawer and reference data
    .route("/notifications", get(notifications::drawer::<S>))
    .route("/countries", get(reference::countries))
    .route("/settings", get(reference::settings::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
