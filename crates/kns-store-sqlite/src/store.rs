//! [`SqliteStore`] — the SQLite implementation of [`CommunityStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kns_core::{
  approval::{ActionApproval, ActionType, ApprovalStatus},
  catalog::{self, CatalogEntry, CatalogKind},
  consent::{ConsentForm, ConsentStatus},
  encryption::ProfileEncryption,
  group::{Group, GroupMember, NewGroup},
  hierarchy::MovePlan,
  journey::{FaithMilestone, Journey, NewFaithMilestone, Placement, ProfileFaithMilestone},
  profile::{Account, NewProfile, Profile, Role},
  settings::Settings,
  store::CommunityStore,
};

use crate::{
  Error, Result,
  encode::{
    APPROVAL_COLUMNS, CATALOG_COLUMNS, CONSENT_COLUMNS, GROUP_COLUMNS, MILESTONE_COLUMNS,
    PLACEMENT_SELECT, PROFILE_COLUMNS, PROFILE_FROM, RawApproval, RawCatalogEntry,
    RawConsentForm, RawFaithMilestone, RawGroup, RawMember, RawPlacement, RawProfile,
    RawProfileMilestone, decode_uuid, encode_date, encode_dt, encode_uuid, new_slug,
    settings_from_row, slugify,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A KNS community store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of a guarded insert or update run inside one `call`.
enum Outcome {
  Done,
  Missing,
  Conflict,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let now = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        seed_catalog(conn, &now)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Row fetchers ──────────────────────────────────────────────────────

  async fn fetch_profiles(&self, filter: &'static str, args: Vec<String>) -> Result<Vec<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM {PROFILE_FROM} {filter}");
    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn fetch_groups(&self, filter: &'static str, args: Vec<String>) -> Result<Vec<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM community_groups g {filter}");
    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawGroup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn fetch_consent_forms(
    &self,
    filter: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<ConsentForm>> {
    let sql = format!("SELECT {CONSENT_COLUMNS} FROM consent_forms {filter}");
    let raws: Vec<RawConsentForm> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawConsentForm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let mut forms: Vec<ConsentForm> =
      raws.into_iter().map(RawConsentForm::into_form).collect::<Result<_>>()?;
    forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(forms)
  }

  async fn fetch_approvals(
    &self,
    filter: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<ActionApproval>> {
    let sql = format!("SELECT {APPROVAL_COLUMNS} FROM action_approvals {filter}");
    let raws: Vec<RawApproval> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawApproval::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let mut approvals: Vec<ActionApproval> =
      raws.into_iter().map(RawApproval::into_approval).collect::<Result<_>>()?;
    approvals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(approvals)
  }

  async fn fetch_catalog(
    &self,
    filter: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<CatalogEntry>> {
    let sql = format!("SELECT {CATALOG_COLUMNS} FROM catalog_entries c {filter}");
    let raws: Vec<RawCatalogEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawCatalogEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCatalogEntry::into_entry).collect()
  }

  async fn fetch_placements(
    &self,
    filter: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<Placement>> {
    let sql = format!("{PLACEMENT_SELECT} {filter}");
    let raws: Vec<RawPlacement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawPlacement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let mut placements: Vec<Placement> =
      raws.into_iter().map(RawPlacement::into_placement).collect::<Result<_>>()?;
    placements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(placements)
  }

  async fn fetch_milestones(
    &self,
    filter: &'static str,
    args: Vec<String>,
  ) -> Result<Vec<FaithMilestone>> {
    let sql = format!("SELECT {MILESTONE_COLUMNS} FROM faith_milestones fm {filter}");
    let raws: Vec<RawFaithMilestone> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), |row| {
            RawFaithMilestone::from_row_at(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawFaithMilestone::into_milestone).collect()
  }

  async fn require_profile(&self, id: Uuid) -> Result<Profile> {
    self.get_profile(id).await?.ok_or(Error::ProfileNotFound(id))
  }
}

/// Insert the built-in catalog entries and their links. Entries already
/// present (matched by kind and title) are left untouched.
fn seed_catalog(conn: &mut rusqlite::Connection, now: &str) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  {
    let mut insert = tx.prepare(
      "INSERT OR IGNORE INTO catalog_entries
         (entry_id, kind, slug, title, content, position, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (kind, position, seed) in catalog::seeds() {
      insert.execute(rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        kind.as_ref(),
        slugify(seed.title),
        seed.title,
        seed.content,
        position,
        now,
      ])?;
    }

    let mut link = tx.prepare(
      "INSERT OR IGNORE INTO catalog_links (parent_id, child_id)
       SELECT p.entry_id, c.entry_id
       FROM catalog_entries p, catalog_entries c
       WHERE p.kind = ?1 AND p.title = ?2 AND c.kind = ?3 AND c.title = ?4",
    )?;
    for l in catalog::seed_links() {
      link.execute(rusqlite::params![
        l.parent.as_ref(),
        l.parent_title,
        l.child.as_ref(),
        l.child_title,
      ])?;
    }
  }
  tx.commit()
}

// ─── CommunityStore impl ─────────────────────────────────────────────────────

impl CommunityStore for SqliteStore {
  type Error = Error;

  // ── Settings ──────────────────────────────────────────────────────────

  async fn settings(&self) -> Result<Settings> {
    let settings = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT adult_age, min_registration_age, change_role_approval_required,
                  approval_timeout_days
           FROM settings WHERE id = 1",
          [],
          settings_from_row,
        )?)
      })
      .await?;
    Ok(settings)
  }

  async fn update_settings(&self, settings: Settings) -> Result<Settings> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE settings SET adult_age = ?1, min_registration_age = ?2,
                  change_role_approval_required = ?3, approval_timeout_days = ?4
           WHERE id = 1",
          rusqlite::params![
            settings.adult_age,
            settings.min_registration_age,
            settings.change_role_approval_required,
            settings.approval_timeout_days,
          ],
        )?;
        Ok(())
      })
      .await?;
    tracing::info!(adult_age = settings.adult_age, "settings updated");
    Ok(settings)
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    input.validate()?;
    let now = Utc::now();
    let profile = Profile {
      profile_id:    Uuid::new_v4(),
      slug:          new_slug(),
      email:         input.email,
      first_name:    input.first_name,
      last_name:     input.last_name,
      gender:        input.gender,
      date_of_birth: input.date_of_birth,
      location:      input.location,
      phone_prefix:  input.phone_prefix,
      phone:         input.phone,
      role:          Role::Member,
      is_mentor:     false,
      account:       Account::default(),
      encryption:    None,
      created_at:    now,
      updated_at:    now,
    };

    let p = profile.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (
             profile_id, slug, email, first_name, last_name, gender, date_of_birth,
             country, city, phone_prefix, phone, role, is_mentor,
             verified, agreed_to_terms, is_visitor, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
          rusqlite::params![
            encode_uuid(p.profile_id),
            p.slug,
            p.email,
            p.first_name,
            p.last_name,
            p.gender.map(|g| g.to_string()),
            p.date_of_birth.map(encode_date),
            p.location.country,
            p.location.city,
            p.phone_prefix,
            p.phone,
            p.role.as_ref(),
            p.is_mentor,
            p.account.verified,
            p.account.agreed_to_terms,
            p.account.is_visitor,
            encode_dt(p.created_at),
            encode_dt(p.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(profile = %profile.slug, "profile added");
    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let rows = self
      .fetch_profiles("WHERE p.profile_id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
    let rows = self
      .fetch_profiles("WHERE p.slug = ?1", vec![slug.to_owned()])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    let rows = self
      .fetch_profiles("WHERE p.email = ?1", vec![email.to_owned()])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    self
      .fetch_profiles("ORDER BY p.last_name, p.first_name, p.email", Vec::new())
      .await
  }

  async fn save_profile(&self, profile: Profile) -> Result<Profile> {
    let mut profile = profile;
    profile.updated_at = Utc::now();

    let p = profile.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET
             first_name = ?2, last_name = ?3, gender = ?4, date_of_birth = ?5,
             country = ?6, city = ?7, phone_prefix = ?8, phone = ?9, is_mentor = ?10,
             verified = ?11, agreed_to_terms = ?12, is_visitor = ?13, updated_at = ?14
           WHERE profile_id = ?1",
          rusqlite::params![
            encode_uuid(p.profile_id),
            p.first_name,
            p.last_name,
            p.gender.map(|g| g.to_string()),
            p.date_of_birth.map(encode_date),
            p.location.country,
            p.location.city,
            p.phone_prefix,
            p.phone,
            p.is_mentor,
            p.account.verified,
            p.account.agreed_to_terms,
            p.account.is_visitor,
            encode_dt(p.updated_at),
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ProfileNotFound(profile.profile_id));
    }
    Ok(profile)
  }

  async fn set_role(&self, profile_id: Uuid, role: Role) -> Result<Profile> {
    let id_str = encode_uuid(profile_id);
    let at_str = encode_dt(Utc::now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE profile_id = ?1",
          rusqlite::params![id_str, role.as_ref(), at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ProfileNotFound(profile_id));
    }
    tracing::info!(%profile_id, %role, "role changed");
    self.require_profile(profile_id).await
  }

  async fn issue_email_token(&self, profile_id: Uuid) -> Result<String> {
    self.require_profile(profile_id).await?;
    let token = new_slug();
    let (pid, tok, at) = (encode_uuid(profile_id), token.clone(), encode_dt(Utc::now()));
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO email_verifications (profile_id, token, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![pid, tok, at],
        )?;
        Ok(())
      })
      .await?;
    tracing::debug!(%profile_id, "email token issued");
    Ok(token)
  }

  async fn confirm_email(&self, profile_id: Uuid, token: String) -> Result<Profile> {
    self.require_profile(profile_id).await?;
    let (pid, at) = (encode_uuid(profile_id), encode_dt(Utc::now()));
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let spent = tx.execute(
          "DELETE FROM email_verifications WHERE profile_id = ?1 AND token = ?2",
          rusqlite::params![pid, token],
        )?;
        if spent == 0 {
          return Ok(Outcome::Conflict);
        }
        tx.execute(
          "UPDATE profiles SET verified = 1, updated_at = ?2 WHERE profile_id = ?1",
          rusqlite::params![pid, at],
        )?;
        tx.commit()?;
        Ok(Outcome::Done)
      })
      .await?;

    match outcome {
      Outcome::Done => {
        tracing::info!(%profile_id, "email confirmed");
        self.require_profile(profile_id).await
      }
      Outcome::Conflict | Outcome::Missing => Err(Error::InvalidToken(profile_id)),
    }
  }

  async fn encrypt_profile(&self, encryption: ProfileEncryption) -> Result<Profile> {
    let profile_id = encryption.profile_id;
    self.require_profile(profile_id).await?;
    let e = encryption.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO profile_encryptions (
             profile_id, first_name, last_name, reason, encrypted_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(e.profile_id),
            e.first_name,
            e.last_name,
            e.reason.as_ref(),
            encode_uuid(e.encrypted_by),
            encode_dt(e.created_at),
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::AlreadyEncrypted(profile_id));
    }
    tracing::info!(%profile_id, reason = %encryption.reason, "profile name hidden");
    self.require_profile(profile_id).await
  }

  async fn decrypt_profile(&self, profile_id: Uuid) -> Result<Profile> {
    let pid = encode_uuid(profile_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM profile_encryptions WHERE profile_id = ?1",
          rusqlite::params![pid],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::NotEncrypted(profile_id));
    }
    tracing::info!(%profile_id, "profile name revealed");
    self.require_profile(profile_id).await
  }

  // ── Groups ────────────────────────────────────────────────────────────

  async fn register_group(
    &self,
    leader_id: Uuid,
    parent_id: Option<Uuid>,
    input: NewGroup,
  ) -> Result<Group> {
    input.validate()?;
    self.require_profile(leader_id).await?;
    if let Some(parent) = parent_id {
      self.get_group(parent).await?.ok_or(Error::GroupNotFound(parent))?;
    }

    let now = Utc::now();
    let group = Group {
      group_id:    Uuid::new_v4(),
      slug:        new_slug(),
      name:        input.name,
      description: input.description,
      leader_id,
      parent_id,
      location:    input.location,
      created_at:  now,
      updated_at:  now,
    };

    let g = group.clone();
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let leads: bool = tx
          .query_row(
            "SELECT 1 FROM community_groups WHERE leader_id = ?1",
            rusqlite::params![encode_uuid(g.leader_id)],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if leads {
          return Ok(Outcome::Conflict);
        }
        tx.execute(
          "INSERT INTO community_groups (
             group_id, slug, name, description, leader_id, parent_id,
             country, city, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            encode_uuid(g.group_id),
            g.slug,
            g.name,
            g.description,
            encode_uuid(g.leader_id),
            g.parent_id.map(encode_uuid),
            g.location.country,
            g.location.city,
            encode_dt(g.created_at),
            encode_dt(g.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(Outcome::Done)
      })
      .await?;

    match outcome {
      Outcome::Done => {
        tracing::info!(group = %group.slug, %leader_id, "group registered");
        Ok(group)
      }
      Outcome::Conflict => Err(Error::AlreadyLeadsGroup(leader_id)),
      Outcome::Missing => Err(Error::ProfileNotFound(leader_id)),
    }
  }

  async fn get_group(&self, id: Uuid) -> Result<Option<Group>> {
    let rows = self
      .fetch_groups("WHERE g.group_id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
    let rows = self
      .fetch_groups("WHERE g.slug = ?1", vec![slug.to_owned()])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    self.fetch_groups("ORDER BY g.name, g.group_id", Vec::new()).await
  }

  async fn group_led_by(&self, profile_id: Uuid) -> Result<Option<Group>> {
    let rows = self
      .fetch_groups("WHERE g.leader_id = ?1", vec![encode_uuid(profile_id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  // ── Membership ────────────────────────────────────────────────────────

  async fn add_member(&self, profile_id: Uuid, group_id: Uuid) -> Result<GroupMember> {
    self.require_profile(profile_id).await?;
    self.get_group(group_id).await?.ok_or(Error::GroupNotFound(group_id))?;

    let member = GroupMember { profile_id, group_id, created_at: Utc::now() };
    let (pid, gid, at) =
      (encode_uuid(profile_id), encode_uuid(group_id), encode_dt(member.created_at));

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO group_members (profile_id, group_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![pid, gid, at],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::AlreadyMember(profile_id));
    }
    tracing::debug!(%profile_id, %group_id, "member added");
    Ok(member)
  }

  async fn membership_of(&self, profile_id: Uuid) -> Result<Option<GroupMember>> {
    let id_str = encode_uuid(profile_id);
    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT profile_id, group_id, created_at FROM group_members WHERE profile_id = ?1",
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawMember::into_member).transpose()
  }

  async fn list_members(&self, group_id: Uuid) -> Result<Vec<Profile>> {
    self
      .fetch_profiles(
        "JOIN group_members m ON m.profile_id = p.profile_id
         WHERE m.group_id = ?1
         ORDER BY p.last_name, p.first_name, p.email",
        vec![encode_uuid(group_id)],
      )
      .await
  }

  async fn member_counts(&self) -> Result<HashMap<Uuid, usize>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT group_id, COUNT(*) FROM group_members GROUP BY group_id")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, count)| Ok((decode_uuid(&id)?, usize::try_from(count).unwrap_or(0))))
      .collect()
  }

  async fn apply_move(&self, plan: MovePlan) -> Result<GroupMember> {
    let member = GroupMember {
      profile_id: plan.profile_id,
      group_id:   plan.to_group_id,
      created_at: Utc::now(),
    };

    let pid = encode_uuid(plan.profile_id);
    let from = encode_uuid(plan.from_group_id);
    let to = encode_uuid(plan.to_group_id);
    let detach = plan.detach_group_id.map(encode_uuid);
    let at = encode_dt(member.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let moved = tx.execute(
          "UPDATE group_members SET group_id = ?3, created_at = ?4
           WHERE profile_id = ?1 AND group_id = ?2",
          rusqlite::params![pid, from, to, at],
        )?;
        if moved == 0 {
          return Ok(Outcome::Missing);
        }
        if let Some(detach) = detach {
          tx.execute(
            "UPDATE community_groups SET parent_id = NULL, updated_at = ?2 WHERE group_id = ?1",
            rusqlite::params![detach, at],
          )?;
        }
        tx.commit()?;
        Ok(Outcome::Done)
      })
      .await?;

    match outcome {
      Outcome::Done => {
        tracing::info!(
          profile_id = %plan.profile_id,
          from = %plan.from_group_id,
          to = %plan.to_group_id,
          detached = ?plan.detach_group_id,
          "member moved"
        );
        Ok(member)
      }
      Outcome::Missing | Outcome::Conflict => {
        Err(Error::NotAMember(plan.profile_id, plan.from_group_id))
      }
    }
  }

  // ── Catalog ───────────────────────────────────────────────────────────

  async fn list_catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>> {
    self
      .fetch_catalog("WHERE c.kind = ?1 ORDER BY c.position, c.title", vec![kind.to_string()])
      .await
  }

  async fn get_catalog_entry(&self, kind: CatalogKind, slug: &str) -> Result<Option<CatalogEntry>> {
    let rows = self
      .fetch_catalog("WHERE c.kind = ?1 AND c.slug = ?2", vec![kind.to_string(), slug.to_owned()])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn catalog_children(&self, entry_id: Uuid) -> Result<Vec<CatalogEntry>> {
    self
      .fetch_catalog(
        "JOIN catalog_links l ON l.child_id = c.entry_id
         WHERE l.parent_id = ?1
         ORDER BY c.position, c.title",
        vec![encode_uuid(entry_id)],
      )
      .await
  }

  // ── Journey ───────────────────────────────────────────────────────────

  async fn add_placement(&self, placement: Placement) -> Result<Placement> {
    self.require_profile(placement.profile_id).await?;
    let p = placement.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if p.kind == CatalogKind::Level {
          tx.execute(
            "UPDATE profile_placements SET removed_at = ?3
             WHERE profile_id = ?1 AND kind = ?2 AND removed_at IS NULL",
            rusqlite::params![encode_uuid(p.profile_id), p.kind.as_ref(), encode_dt(p.created_at)],
          )?;
        }
        tx.execute(
          "INSERT INTO profile_placements (
             placement_id, profile_id, kind, entry_id, sub_entry_id, created_at, removed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
          rusqlite::params![
            encode_uuid(p.placement_id),
            encode_uuid(p.profile_id),
            p.kind.as_ref(),
            encode_uuid(p.entry_id),
            p.sub_entry_id.map(encode_uuid),
            encode_dt(p.created_at),
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::info!(
      profile_id = %placement.profile_id,
      kind = %placement.kind,
      entry = %placement.entry_title,
      "profile placed"
    );
    Ok(placement)
  }

  async fn close_placement(&self, profile_id: Uuid, placement_id: Uuid) -> Result<Placement> {
    let (pid, plid, at) =
      (encode_uuid(profile_id), encode_uuid(placement_id), encode_dt(Utc::now()));
    let closed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profile_placements SET removed_at = ?3
           WHERE placement_id = ?1 AND profile_id = ?2 AND removed_at IS NULL",
          rusqlite::params![plid, pid, at],
        )?)
      })
      .await?;

    if closed == 0 {
      return Err(Error::PlacementNotFound(placement_id));
    }
    let rows = self
      .fetch_placements("WHERE pl.placement_id = ?1", vec![encode_uuid(placement_id)])
      .await?;
    rows.into_iter().next().ok_or(Error::PlacementNotFound(placement_id))
  }

  async fn journey(&self, profile_id: Uuid) -> Result<Journey> {
    self.require_profile(profile_id).await?;
    let placements = self
      .fetch_placements("WHERE pl.profile_id = ?1", vec![encode_uuid(profile_id)])
      .await?;
    let (levels, classifications): (Vec<_>, Vec<_>) =
      placements.into_iter().partition(|p| p.kind == CatalogKind::Level);

    let pid = encode_uuid(profile_id);
    let raws: Vec<RawProfileMilestone> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT pm.profile_id, pm.recorded_by, pm.created_at, {MILESTONE_COLUMNS}
           FROM profile_faith_milestones pm
           JOIN faith_milestones fm ON fm.faith_milestone_id = pm.faith_milestone_id
           WHERE pm.profile_id = ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![pid], RawProfileMilestone::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    let mut faith_milestones: Vec<ProfileFaithMilestone> =
      raws.into_iter().map(RawProfileMilestone::into_record).collect::<Result<_>>()?;
    faith_milestones.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Journey { levels, classifications, faith_milestones })
  }

  async fn add_faith_milestone(
    &self,
    author_id: Uuid,
    input: NewFaithMilestone,
  ) -> Result<FaithMilestone> {
    input.validate()?;
    self.require_profile(author_id).await?;
    let milestone = FaithMilestone {
      faith_milestone_id: Uuid::new_v4(),
      slug: new_slug(),
      title: input.title,
      description: input.description,
      milestone_type: input.milestone_type,
      author_id,
      created_at: Utc::now(),
    };

    let m = milestone.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO faith_milestones (
             faith_milestone_id, slug, title, description, milestone_type, author_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(m.faith_milestone_id),
            m.slug,
            m.title,
            m.description,
            m.milestone_type.as_ref(),
            encode_uuid(m.author_id),
            encode_dt(m.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    tracing::debug!(milestone = %milestone.slug, "faith milestone added");
    Ok(milestone)
  }

  async fn list_faith_milestones(&self) -> Result<Vec<FaithMilestone>> {
    self.fetch_milestones("ORDER BY fm.title", Vec::new()).await
  }

  async fn get_faith_milestone_by_slug(&self, slug: &str) -> Result<Option<FaithMilestone>> {
    let rows = self
      .fetch_milestones("WHERE fm.slug = ?1", vec![slug.to_owned()])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn record_faith_milestone(
    &self,
    record: ProfileFaithMilestone,
  ) -> Result<ProfileFaithMilestone> {
    self.require_profile(record.profile_id).await?;
    let r = record.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO profile_faith_milestones
             (profile_id, faith_milestone_id, recorded_by, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_uuid(r.profile_id),
            encode_uuid(r.milestone.faith_milestone_id),
            encode_uuid(r.recorded_by),
            encode_dt(r.created_at),
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::DuplicateMilestone(record.profile_id));
    }
    tracing::info!(
      profile_id = %record.profile_id,
      milestone = %record.milestone.slug,
      "faith milestone recorded"
    );
    Ok(record)
  }

  // ── Consent forms ─────────────────────────────────────────────────────

  async fn submit_consent_form(&self, form: ConsentForm) -> Result<ConsentForm> {
    self.require_profile(form.profile_id).await?;
    let f = form.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO consent_forms (
             consent_form_id, profile_id, status, submitted_by,
             reviewed_by, reviewed_at, reject_reason, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(f.consent_form_id),
            encode_uuid(f.profile_id),
            f.status.as_ref(),
            encode_uuid(f.submitted_by),
            f.reviewed_by.map(encode_uuid),
            f.reviewed_at.map(encode_dt),
            f.reject_reason,
            encode_dt(f.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    tracing::debug!(profile_id = %form.profile_id, "consent form submitted");
    Ok(form)
  }

  async fn consent_form_for(&self, profile_id: Uuid) -> Result<Option<ConsentForm>> {
    let rows = self
      .fetch_consent_forms("WHERE profile_id = ?1", vec![encode_uuid(profile_id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn get_consent_form(&self, id: Uuid) -> Result<Option<ConsentForm>> {
    let rows = self
      .fetch_consent_forms("WHERE consent_form_id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn save_consent_form(&self, form: ConsentForm) -> Result<ConsentForm> {
    let f = form.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE consent_forms SET status = ?2, reviewed_by = ?3, reviewed_at = ?4,
                  reject_reason = ?5
           WHERE consent_form_id = ?1",
          rusqlite::params![
            encode_uuid(f.consent_form_id),
            f.status.as_ref(),
            f.reviewed_by.map(encode_uuid),
            f.reviewed_at.map(encode_dt),
            f.reject_reason,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ConsentFormNotFound(form.consent_form_id));
    }
    tracing::info!(form = %form.consent_form_id, status = %form.status, "consent form reviewed");
    Ok(form)
  }

  async fn list_consent_forms(&self, status: Option<ConsentStatus>) -> Result<Vec<ConsentForm>> {
    match status {
      Some(s) => {
        self
          .fetch_consent_forms("WHERE status = ?1", vec![s.to_string()])
          .await
      }
      None => self.fetch_consent_forms("", Vec::new()).await,
    }
  }

  // ── Approvals ─────────────────────────────────────────────────────────

  async fn add_approval(&self, approval: ActionApproval) -> Result<ActionApproval> {
    let a = approval.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO action_approvals (
             approval_id, action_type, new_leader_id, created_by, consumer_group_id,
             status, approved_by, approved_at, read, timeout_secs, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            encode_uuid(a.approval_id),
            a.action_type.as_ref(),
            encode_uuid(a.new_leader_id),
            encode_uuid(a.created_by),
            encode_uuid(a.consumer_group_id),
            a.status.as_ref(),
            a.approved_by.map(encode_uuid),
            a.approved_at.map(encode_dt),
            a.read,
            a.timeout_secs,
            encode_dt(a.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    tracing::info!(
      approval = %approval.approval_id,
      new_leader = %approval.new_leader_id,
      "approval requested"
    );
    Ok(approval)
  }

  async fn get_approval(&self, id: Uuid) -> Result<Option<ActionApproval>> {
    let rows = self
      .fetch_approvals("WHERE approval_id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn list_approvals(&self, consumer_group_id: Uuid) -> Result<Vec<ActionApproval>> {
    self
      .fetch_approvals("WHERE consumer_group_id = ?1", vec![encode_uuid(consumer_group_id)])
      .await
  }

  async fn pending_approval_for(&self, new_leader_id: Uuid) -> Result<Option<ActionApproval>> {
    let rows = self
      .fetch_approvals(
        "WHERE new_leader_id = ?1 AND status = ?2",
        vec![encode_uuid(new_leader_id), ApprovalStatus::Pending.to_string()],
      )
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn save_approval(&self, approval: ActionApproval) -> Result<ActionApproval> {
    let promote = approval.status == ApprovalStatus::Approved
      && approval.action_type == ActionType::ChangeRoleToLeader;
    let a = approval.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let at = encode_dt(Utc::now());
        let changed = tx.execute(
          "UPDATE action_approvals SET status = ?2, approved_by = ?3, approved_at = ?4,
                  read = ?5
           WHERE approval_id = ?1",
          rusqlite::params![
            encode_uuid(a.approval_id),
            a.status.as_ref(),
            a.approved_by.map(encode_uuid),
            a.approved_at.map(encode_dt),
            a.read,
          ],
        )?;
        if changed == 0 {
          return Ok(Outcome::Missing);
        }
        if promote {
          tx.execute(
            "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE profile_id = ?1",
            rusqlite::params![encode_uuid(a.new_leader_id), Role::Leader.as_ref(), at],
          )?;
        }
        tx.commit()?;
        Ok(Outcome::Done)
      })
      .await?;

    match outcome {
      Outcome::Done => {
        tracing::info!(
          approval = %approval.approval_id,
          status = %approval.status,
          "approval saved"
        );
        Ok(approval)
      }
      Outcome::Missing | Outcome::Conflict => Err(Error::ApprovalNotFound(approval.approval_id)),
    }
  }
}
