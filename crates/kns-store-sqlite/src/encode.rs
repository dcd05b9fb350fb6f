//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, birthdays are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings and enums use their `strum` string form.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use kns_core::{
  approval::ActionApproval,
  catalog::CatalogEntry,
  consent::ConsentForm,
  encryption::ProfileEncryption,
  group::{Group, GroupMember},
  journey::{FaithMilestone, Placement, ProfileFaithMilestone},
  location::Location,
  profile::{Account, Profile},
  settings::Settings,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a `strum`-encoded enum column.
pub fn decode_enum<T>(column: &'static str, s: &str) -> Result<T>
where
  T: FromStr<Err = strum::ParseError>,
{
  s.parse()
    .map_err(|e: strum::ParseError| Error::Decode(format!("{column} {s:?}: {e}")))
}

pub fn new_slug() -> String { Uuid::new_v4().simple().to_string() }

/// Lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(title: &str) -> String {
  title
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(str::to_ascii_lowercase)
    .collect::<Vec<_>>()
    .join("-")
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<Settings> {
  Ok(Settings {
    adult_age:                     row.get(0)?,
    min_registration_age:          row.get(1)?,
    change_role_approval_required: row.get(2)?,
    approval_timeout_days:         row.get(3)?,
  })
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str = "p.profile_id, p.slug, p.email, p.first_name, p.last_name, \
   p.gender, p.date_of_birth, p.country, p.city, p.phone_prefix, p.phone, p.role, \
   p.is_mentor, p.verified, p.agreed_to_terms, p.is_visitor, p.created_at, p.updated_at, \
   e.first_name, e.last_name, e.reason, e.encrypted_by, e.created_at";

/// Profiles with their encryption row, if any.
pub const PROFILE_FROM: &str =
  "profiles p LEFT JOIN profile_encryptions e ON e.profile_id = p.profile_id";

/// Raw strings read directly from a `profiles` row joined with
/// `profile_encryptions`.
pub struct RawProfile {
  pub profile_id:      String,
  pub slug:            String,
  pub email:           String,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub gender:          Option<String>,
  pub date_of_birth:   Option<String>,
  pub country:         Option<String>,
  pub city:            Option<String>,
  pub phone_prefix:    Option<String>,
  pub phone:           Option<String>,
  pub role:            String,
  pub is_mentor:       bool,
  pub verified:        bool,
  pub agreed_to_terms: bool,
  pub is_visitor:      bool,
  pub created_at:      String,
  pub updated_at:      String,
  pub pseudonym_first: Option<String>,
  pub pseudonym_last:  Option<String>,
  pub enc_reason:      Option<String>,
  pub encrypted_by:    Option<String>,
  pub encrypted_at:    Option<String>,
}

impl RawProfile {
  /// Reads the columns in [`PROFILE_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:      row.get(0)?,
      slug:            row.get(1)?,
      email:           row.get(2)?,
      first_name:      row.get(3)?,
      last_name:       row.get(4)?,
      gender:          row.get(5)?,
      date_of_birth:   row.get(6)?,
      country:         row.get(7)?,
      city:            row.get(8)?,
      phone_prefix:    row.get(9)?,
      phone:           row.get(10)?,
      role:            row.get(11)?,
      is_mentor:       row.get(12)?,
      verified:        row.get(13)?,
      agreed_to_terms: row.get(14)?,
      is_visitor:      row.get(15)?,
      created_at:      row.get(16)?,
      updated_at:      row.get(17)?,
      pseudonym_first: row.get(18)?,
      pseudonym_last:  row.get(19)?,
      enc_reason:      row.get(20)?,
      encrypted_by:    row.get(21)?,
      encrypted_at:    row.get(22)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    let profile_id = decode_uuid(&self.profile_id)?;
    let encryption = match (
      self.pseudonym_first,
      self.pseudonym_last,
      self.enc_reason,
      self.encrypted_by,
      self.encrypted_at,
    ) {
      (Some(first_name), Some(last_name), Some(reason), Some(by), Some(at)) => {
        Some(ProfileEncryption {
          profile_id,
          first_name,
          last_name,
          reason: decode_enum("encryption reason", &reason)?,
          encrypted_by: decode_uuid(&by)?,
          created_at: decode_dt(&at)?,
        })
      }
      _ => None,
    };
    Ok(Profile {
      profile_id,
      slug:          self.slug,
      email:         self.email,
      first_name:    self.first_name,
      last_name:     self.last_name,
      gender:        self.gender.as_deref().map(|g| decode_enum("gender", g)).transpose()?,
      date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
      location:      Location { country: self.country, city: self.city },
      phone_prefix:  self.phone_prefix,
      phone:         self.phone,
      role:          decode_enum("role", &self.role)?,
      is_mentor:     self.is_mentor,
      account:       Account {
        verified:        self.verified,
        agreed_to_terms: self.agreed_to_terms,
        is_visitor:      self.is_visitor,
      },
      encryption,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Groups ──────────────────────────────────────────────────────────────────

pub const GROUP_COLUMNS: &str = "g.group_id, g.slug, g.name, g.description, g.leader_id, \
   g.parent_id, g.country, g.city, g.created_at, g.updated_at";

/// Raw strings read directly from a `community_groups` row.
pub struct RawGroup {
  pub group_id:    String,
  pub slug:        String,
  pub name:        String,
  pub description: String,
  pub leader_id:   String,
  pub parent_id:   Option<String>,
  pub country:     Option<String>,
  pub city:        Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawGroup {
  /// Reads the columns in [`GROUP_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:    row.get(0)?,
      slug:        row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      leader_id:   row.get(4)?,
      parent_id:   row.get(5)?,
      country:     row.get(6)?,
      city:        row.get(7)?,
      created_at:  row.get(8)?,
      updated_at:  row.get(9)?,
    })
  }

  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:    decode_uuid(&self.group_id)?,
      slug:        self.slug,
      name:        self.name,
      description: self.description,
      leader_id:   decode_uuid(&self.leader_id)?,
      parent_id:   decode_opt_uuid(self.parent_id)?,
      location:    Location { country: self.country, city: self.city },
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `group_members` row.
pub struct RawMember {
  pub profile_id: String,
  pub group_id:   String,
  pub created_at: String,
}

impl RawMember {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { profile_id: row.get(0)?, group_id: row.get(1)?, created_at: row.get(2)? })
  }

  pub fn into_member(self) -> Result<GroupMember> {
    Ok(GroupMember {
      profile_id: decode_uuid(&self.profile_id)?,
      group_id:   decode_uuid(&self.group_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Consent forms ───────────────────────────────────────────────────────────

pub const CONSENT_COLUMNS: &str = "consent_form_id, profile_id, status, submitted_by, \
   reviewed_by, reviewed_at, reject_reason, created_at";

/// Raw strings read directly from a `consent_forms` row.
pub struct RawConsentForm {
  pub consent_form_id: String,
  pub profile_id:      String,
  pub status:          String,
  pub submitted_by:    String,
  pub reviewed_by:     Option<String>,
  pub reviewed_at:     Option<String>,
  pub reject_reason:   Option<String>,
  pub created_at:      String,
}

impl RawConsentForm {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      consent_form_id: row.get(0)?,
      profile_id:      row.get(1)?,
      status:          row.get(2)?,
      submitted_by:    row.get(3)?,
      reviewed_by:     row.get(4)?,
      reviewed_at:     row.get(5)?,
      reject_reason:   row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_form(self) -> Result<ConsentForm> {
    Ok(ConsentForm {
      consent_form_id: decode_uuid(&self.consent_form_id)?,
      profile_id:      decode_uuid(&self.profile_id)?,
      status:          decode_enum("consent status", &self.status)?,
      submitted_by:    decode_uuid(&self.submitted_by)?,
      reviewed_by:     decode_opt_uuid(self.reviewed_by)?,
      reviewed_at:     decode_opt_dt(self.reviewed_at)?,
      reject_reason:   self.reject_reason,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

// ─── Approvals ───────────────────────────────────────────────────────────────

pub const APPROVAL_COLUMNS: &str = "approval_id, action_type, new_leader_id, created_by, \
   consumer_group_id, status, approved_by, approved_at, read, timeout_secs, created_at";

/// Raw strings read directly from an `action_approvals` row.
pub struct RawApproval {
  pub approval_id:       String,
  pub action_type:       String,
  pub new_leader_id:     String,
  pub created_by:        String,
  pub consumer_group_id: String,
  pub status:            String,
  pub approved_by:       Option<String>,
  pub approved_at:       Option<String>,
  pub read:              bool,
  pub timeout_secs:      i64,
  pub created_at:        String,
}

impl RawApproval {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      approval_id:       row.get(0)?,
      action_type:       row.get(1)?,
      new_leader_id:     row.get(2)?,
      created_by:        row.get(3)?,
      consumer_group_id: row.get(4)?,
      status:            row.get(5)?,
      approved_by:       row.get(6)?,
      approved_at:       row.get(7)?,
      read:              row.get(8)?,
      timeout_secs:      row.get(9)?,
      created_at:        row.get(10)?,
    })
  }

  pub fn into_approval(self) -> Result<ActionApproval> {
    Ok(ActionApproval {
      approval_id:       decode_uuid(&self.approval_id)?,
      action_type:       decode_enum("action type", &self.action_type)?,
      new_leader_id:     decode_uuid(&self.new_leader_id)?,
      created_by:        decode_uuid(&self.created_by)?,
      consumer_group_id: decode_uuid(&self.consumer_group_id)?,
      status:            decode_enum("approval status", &self.status)?,
      approved_by:       decode_opt_uuid(self.approved_by)?,
      approved_at:       decode_opt_dt(self.approved_at)?,
      read:              self.read,
      timeout_secs:      self.timeout_secs,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

pub const CATALOG_COLUMNS: &str =
  "c.entry_id, c.kind, c.slug, c.title, c.content, c.position, c.created_at";

pub struct RawCatalogEntry {
  pub entry_id:   String,
  pub kind:       String,
  pub slug:       String,
  pub title:      String,
  pub content:    String,
  pub position:   u32,
  pub created_at: String,
}

impl RawCatalogEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:   row.get(0)?,
      kind:       row.get(1)?,
      slug:       row.get(2)?,
      title:      row.get(3)?,
      content:    row.get(4)?,
      position:   row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<CatalogEntry> {
    Ok(CatalogEntry {
      entry_id:   decode_uuid(&self.entry_id)?,
      kind:       decode_enum("catalog kind", &self.kind)?,
      slug:       self.slug,
      title:      self.title,
      content:    self.content,
      position:   self.position,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Journey ─────────────────────────────────────────────────────────────────

pub const PLACEMENT_SELECT: &str = "SELECT pl.placement_id, pl.profile_id, pl.kind, \
   pl.entry_id, ce.title, pl.sub_entry_id, se.title, pl.created_at, pl.removed_at \
   FROM profile_placements pl \
   JOIN catalog_entries ce ON ce.entry_id = pl.entry_id \
   LEFT JOIN catalog_entries se ON se.entry_id = pl.sub_entry_id";

pub struct RawPlacement {
  pub placement_id:    String,
  pub profile_id:      String,
  pub kind:            String,
  pub entry_id:        String,
  pub entry_title:     String,
  pub sub_entry_id:    Option<String>,
  pub sub_entry_title: Option<String>,
  pub created_at:      String,
  pub removed_at:      Option<String>,
}

impl RawPlacement {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      placement_id:    row.get(0)?,
      profile_id:      row.get(1)?,
      kind:            row.get(2)?,
      entry_id:        row.get(3)?,
      entry_title:     row.get(4)?,
      sub_entry_id:    row.get(5)?,
      sub_entry_title: row.get(6)?,
      created_at:      row.get(7)?,
      removed_at:      row.get(8)?,
    })
  }

  pub fn into_placement(self) -> Result<Placement> {
    Ok(Placement {
      placement_id:    decode_uuid(&self.placement_id)?,
      profile_id:      decode_uuid(&self.profile_id)?,
      kind:            decode_enum("placement kind", &self.kind)?,
      entry_id:        decode_uuid(&self.entry_id)?,
      entry_title:     self.entry_title,
      sub_entry_id:    decode_opt_uuid(self.sub_entry_id)?,
      sub_entry_title: self.sub_entry_title,
      created_at:      decode_dt(&self.created_at)?,
      removed_at:      decode_opt_dt(self.removed_at)?,
    })
  }
}

pub const MILESTONE_COLUMNS: &str = "fm.faith_milestone_id, fm.slug, fm.title, fm.description, \
   fm.milestone_type, fm.author_id, fm.created_at";

pub struct RawFaithMilestone {
  pub faith_milestone_id: String,
  pub slug:               String,
  pub title:              String,
  pub description:        String,
  pub milestone_type:     String,
  pub author_id:          String,
  pub created_at:         String,
}

impl RawFaithMilestone {
  /// Reads the columns in [`MILESTONE_COLUMNS`] order, starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      faith_milestone_id: row.get(offset)?,
      slug:               row.get(offset + 1)?,
      title:              row.get(offset + 2)?,
      description:        row.get(offset + 3)?,
      milestone_type:     row.get(offset + 4)?,
      author_id:          row.get(offset + 5)?,
      created_at:         row.get(offset + 6)?,
    })
  }

  pub fn into_milestone(self) -> Result<FaithMilestone> {
    Ok(FaithMilestone {
      faith_milestone_id: decode_uuid(&self.faith_milestone_id)?,
      slug:               self.slug,
      title:              self.title,
      description:        self.description,
      milestone_type:     decode_enum("milestone type", &self.milestone_type)?,
      author_id:          decode_uuid(&self.author_id)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// A `profile_faith_milestones` row followed by [`MILESTONE_COLUMNS`].
pub struct RawProfileMilestone {
  pub profile_id:  String,
  pub recorded_by: String,
  pub created_at:  String,
  pub milestone:   RawFaithMilestone,
}

impl RawProfileMilestone {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:  row.get(0)?,
      recorded_by: row.get(1)?,
      created_at:  row.get(2)?,
      milestone:   RawFaithMilestone::from_row_at(row, 3)?,
    })
  }

  pub fn into_record(self) -> Result<ProfileFaithMilestone> {
    Ok(ProfileFaithMilestone {
      profile_id:  decode_uuid(&self.profile_id)?,
      milestone:   self.milestone.into_milestone()?,
      recorded_by: decode_uuid(&self.recorded_by)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugify_collapses_punctuation() {
    assert_eq!(slugify("Politics, Governance and Rulership"), "politics-governance-and-rulership");
    assert_eq!(slugify("Internally Displaced Person (IDP)"), "internally-displaced-person-idp");
    assert_eq!(slugify("Far from God"), "far-from-god");
  }
}
