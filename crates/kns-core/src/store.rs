//! The `CommunityStore` trait.
//!
//! Implemented by storage backends (e.g. `kns-store-sqlite`). The HTTP layer
//! depends on this abstraction only. Rules live in the domain types; the store
//! persists their outcomes and keeps multi-row mutations atomic.

use std::{collections::HashMap, future::Future};

use uuid::Uuid;

use crate::{
  approval::ActionApproval,
  catalog::{CatalogEntry, CatalogKind},
  consent::{ConsentForm, ConsentStatus},
  encryption::ProfileEncryption,
  group::{Group, GroupMember, NewGroup},
  hierarchy::MovePlan,
  journey::{FaithMilestone, Journey, NewFaithMilestone, Placement, ProfileFaithMilestone},
  profile::{NewProfile, Profile, Role},
  settings::Settings,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// How a backend failure surfaces to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The referenced record does not exist.
  NotFound,
  /// The write collides with existing state (a unique email, a second
  /// membership, a membership that changed underneath a move).
  Conflict,
  /// The input failed a domain rule.
  Invalid,
  Internal,
}

/// Error bound for [`CommunityStore`] backends.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over a KNS storage backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait CommunityStore: Send + Sync {
  type Error: StoreError;

  // ── Settings ──────────────────────────────────────────────────────────

  fn settings(&self) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  fn update_settings(
    &self,
    settings: Settings,
  ) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Persist a new profile. The id, slug and timestamps are assigned here;
  /// every new profile starts as an unverified [`Role::Member`].
  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn get_profile_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  fn get_profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  fn list_profiles(&self) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Overwrite the editable fields of an existing profile and bump
  /// `updated_at`. The role is left alone; see [`Self::set_role`].
  fn save_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn set_role(
    &self,
    profile_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Issue a fresh email confirmation token, replacing any earlier one.
  fn issue_email_token(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Mark the profile verified if `token` matches the issued one. The token
  /// is spent on success.
  fn confirm_email(
    &self,
    profile_id: Uuid,
    token: String,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Hide the profile's name. Fails if it is already hidden.
  fn encrypt_profile(
    &self,
    encryption: ProfileEncryption,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn decrypt_profile(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Create a group led by `leader_id` under `parent_id`. Fails if the
  /// leader already leads a group.
  fn register_group(
    &self,
    leader_id: Uuid,
    parent_id: Option<Uuid>,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn get_group_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + 'a;

  /// Every group, ordered by name.
  fn list_groups(&self) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// The group `profile_id` leads, if any.
  fn group_led_by(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  // ── Membership ────────────────────────────────────────────────────────

  /// Fails if the profile already belongs to a group.
  fn add_member(
    &self,
    profile_id: Uuid,
    group_id: Uuid,
  ) -> impl Future<Output = Result<GroupMember, Self::Error>> + Send + '_;

  fn membership_of(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Option<GroupMember>, Self::Error>> + Send + '_;

  /// Members of a group (the leader is not a member row), ordered by name.
  fn list_members(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Member rows per group id. Groups without members are absent.
  fn member_counts(
    &self,
  ) -> impl Future<Output = Result<HashMap<Uuid, usize>, Self::Error>> + Send + '_;

  /// Reassign the membership and detach the moved profile's led group, in
  /// one transaction.
  fn apply_move(
    &self,
    plan: MovePlan,
  ) -> impl Future<Output = Result<GroupMember, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Entries of one kind in display order.
  fn list_catalog(
    &self,
    kind: CatalogKind,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;

  fn get_catalog_entry<'a>(
    &'a self,
    kind: CatalogKind,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>> + Send + 'a;

  /// Entries linked below `entry_id`, in display order.
  fn catalog_children(
    &self,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;

  // ── Journey ───────────────────────────────────────────────────────────

  /// Store a placement. A level placement closes the profile's open level
  /// in the same transaction.
  fn add_placement(
    &self,
    placement: Placement,
  ) -> impl Future<Output = Result<Placement, Self::Error>> + Send + '_;

  /// Close an open placement of `profile_id`.
  fn close_placement(
    &self,
    profile_id: Uuid,
    placement_id: Uuid,
  ) -> impl Future<Output = Result<Placement, Self::Error>> + Send + '_;

  fn journey(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Journey, Self::Error>> + Send + '_;

  fn add_faith_milestone(
    &self,
    author_id: Uuid,
    input: NewFaithMilestone,
  ) -> impl Future<Output = Result<FaithMilestone, Self::Error>> + Send + '_;

  /// Every milestone, ordered by title.
  fn list_faith_milestones(
    &self,
  ) -> impl Future<Output = Result<Vec<FaithMilestone>, Self::Error>> + Send + '_;

  fn get_faith_milestone_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<FaithMilestone>, Self::Error>> + Send + 'a;

  /// Fails if the profile already has the milestone.
  fn record_faith_milestone(
    &self,
    record: ProfileFaithMilestone,
  ) -> impl Future<Output = Result<ProfileFaithMilestone, Self::Error>> + Send + '_;

  // ── Consent forms ─────────────────────────────────────────────────────

  /// Store `form` as the profile's consent form, replacing any previous one.
  fn submit_consent_form(
    &self,
    form: ConsentForm,
  ) -> impl Future<Output = Result<ConsentForm, Self::Error>> + Send + '_;

  fn consent_form_for(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Option<ConsentForm>, Self::Error>> + Send + '_;

  fn get_consent_form(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ConsentForm>, Self::Error>> + Send + '_;

  /// Persist a reviewed form.
  fn save_consent_form(
    &self,
    form: ConsentForm,
  ) -> impl Future<Output = Result<ConsentForm, Self::Error>> + Send + '_;

  /// Forms filtered by status, newest first.
  fn list_consent_forms(
    &self,
    status: Option<ConsentStatus>,
  ) -> impl Future<Output = Result<Vec<ConsentForm>, Self::Error>> + Send + '_;

  // ── Approvals ─────────────────────────────────────────────────────────

  fn add_approval(
    &self,
    approval: ActionApproval,
  ) -> impl Future<Output = Result<ActionApproval, Self::Error>> + Send + '_;

  fn get_approval(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ActionApproval>, Self::Error>> + Send + '_;

  /// Requests addressed to `consumer_group_id`, newest first.
  fn list_approvals(
    &self,
    consumer_group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ActionApproval>, Self::Error>> + Send + '_;

  /// The pending request promoting `new_leader_id`, if one exists.
  fn pending_approval_for(
    &self,
    new_leader_id: Uuid,
  ) -> impl Future<Output = Result<Option<ActionApproval>, Self::Error>> + Send + '_;

  /// Persist a decided or expired request. An approved `change role to
  /// leader` request promotes the new leader in the same transaction.
  fn save_approval(
    &self,
    approval: ActionApproval,
  ) -> impl Future<Output = Result<ActionApproval, Self::Error>> + Send + '_;
}
