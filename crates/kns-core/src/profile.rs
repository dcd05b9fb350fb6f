//! Profiles — the member records that groups are built from.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  encryption::ProfileEncryption,
  location::{Location, is_known_phone_prefix},
};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The role a profile holds within its group.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  #[default]
  Member,
  Leader,
  ExternalPerson,
}

impl Role {
  pub fn label(self) -> &'static str {
    match self {
      Self::Member => "Member",
      Self::Leader => "Leader",
      Self::ExternalPerson => "External Person",
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
}

/// Account-level flags that gate role changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub verified:        bool,
  pub agreed_to_terms: bool,
  pub is_visitor:      bool,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A member record. Serialized with the pseudonym in place of the real name
/// while [`Profile::encryption`] is set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
  pub profile_id:    Uuid,
  pub slug:          String,
  pub email:         String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub gender:        Option<Gender>,
  pub date_of_birth: Option<NaiveDate>,
  pub location:      Location,
  pub phone_prefix:  Option<String>,
  pub phone:         Option<String>,
  pub role:          Role,
  pub is_mentor:     bool,
  pub account:       Account,
  #[serde(default, skip_deserializing)]
  pub encryption:    Option<ProfileEncryption>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Serialize for Profile {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Wire<'a> {
      profile_id:    Uuid,
      slug:          &'a str,
      email:         &'a str,
      first_name:    Option<&'a str>,
      last_name:     Option<&'a str>,
      gender:        Option<Gender>,
      date_of_birth: Option<NaiveDate>,
      location:      &'a Location,
      phone_prefix:  Option<&'a str>,
      phone:         Option<&'a str>,
      role:          Role,
      is_mentor:     bool,
      account:       Account,
      encrypted:     bool,
      created_at:    DateTime<Utc>,
      updated_at:    DateTime<Utc>,
    }

    let (first_name, last_name) = match &self.encryption {
      Some(e) => (Some(e.first_name.as_str()), Some(e.last_name.as_str())),
      None => (self.first_name.as_deref(), self.last_name.as_deref()),
    };
    Wire {
      profile_id: self.profile_id,
      slug: &self.slug,
      email: &self.email,
      first_name,
      last_name,
      gender: self.gender,
      date_of_birth: self.date_of_birth,
      location: &self.location,
      phone_prefix: self.phone_prefix.as_deref(),
      phone: self.phone.as_deref(),
      role: self.role,
      is_mentor: self.is_mentor,
      account: self.account,
      encrypted: self.encryption.is_some(),
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
    .serialize(serializer)
  }
}

impl Profile {
  /// `"First Last"`, falling back to the email address. An encrypted profile
  /// shows its pseudonym.
  pub fn full_name(&self) -> String {
    if let Some(e) = &self.encryption {
      return e.full_name();
    }
    let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
      .into_iter()
      .flatten()
      .filter(|s| !s.is_empty())
      .collect();
    if parts.is_empty() {
      self.email.clone()
    } else {
      parts.join(" ")
    }
  }

  /// Whole years between the date of birth and `today`.
  pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
    let dob = self.date_of_birth?;
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
      years -= 1;
    }
    u32::try_from(years).ok()
  }

  /// A profile without a date of birth is treated as under age.
  pub fn is_under_age(&self, adult_age: u32, today: NaiveDate) -> bool {
    self.age_on(today).is_none_or(|age| age < adult_age)
  }

  /// Names of the required bio fields that are still empty.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    fn blank(v: &Option<String>) -> bool { v.as_deref().is_none_or(str::is_empty) }

    let mut missing = Vec::new();
    if blank(&self.first_name) {
      missing.push("first_name");
    }
    if blank(&self.last_name) {
      missing.push("last_name");
    }
    if self.gender.is_none() {
      missing.push("gender");
    }
    if self.date_of_birth.is_none() {
      missing.push("date_of_birth");
    }
    if blank(&self.location.country) {
      missing.push("location_country");
    }
    if blank(&self.location.city) {
      missing.push("location_city");
    }
    missing
  }

  /// All bio fields filled, email verified and terms accepted.
  pub fn is_complete(&self) -> bool {
    self.missing_fields().is_empty()
      && self.account.verified
      && self.account.agreed_to_terms
  }
}

// ─── NewProfile ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::CommunityStore::add_profile`]. Identifiers and
/// timestamps are assigned by the store. A new profile is always an
/// unverified [`Role::Member`]; roles change through the role actions and the
/// email flag through the verification token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
  pub email:         String,
  #[serde(default)]
  pub first_name:    Option<String>,
  #[serde(default)]
  pub last_name:     Option<String>,
  #[serde(default)]
  pub gender:        Option<Gender>,
  #[serde(default)]
  pub date_of_birth: Option<NaiveDate>,
  #[serde(default)]
  pub location:      Location,
  #[serde(default)]
  pub phone_prefix:  Option<String>,
  #[serde(default)]
  pub phone:         Option<String>,
}

impl NewProfile {
  pub fn new(email: impl Into<String>) -> Self {
    Self { email: email.into(), ..Self::default() }
  }

  pub fn validate(&self) -> Result<()> {
    validate_phone_prefix(self.phone_prefix.as_deref())
  }
}

// ─── ProfileUpdate ───────────────────────────────────────────────────────────

/// A partial edit of the bio and contact fields plus the terms flag. `None`
/// leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub gender:          Option<Gender>,
  pub date_of_birth:   Option<NaiveDate>,
  pub location:        Option<Location>,
  pub phone_prefix:    Option<String>,
  pub phone:           Option<String>,
  pub is_mentor:       Option<bool>,
  pub agreed_to_terms: Option<bool>,
}

impl ProfileUpdate {
  pub fn apply(self, profile: &mut Profile) -> Result<()> {
    validate_phone_prefix(self.phone_prefix.as_deref())?;

    if let Some(v) = self.first_name {
      profile.first_name = Some(v);
    }
    if let Some(v) = self.last_name {
      profile.last_name = Some(v);
    }
    if let Some(v) = self.gender {
      profile.gender = Some(v);
    }
    if let Some(v) = self.date_of_birth {
      profile.date_of_birth = Some(v);
    }
    if let Some(v) = self.location {
      profile.location = v;
    }
    if let Some(v) = self.phone_prefix {
      profile.phone_prefix = Some(v);
    }
    if let Some(v) = self.phone {
      profile.phone = Some(v);
    }
    if let Some(v) = self.is_mentor {
      profile.is_mentor = v;
    }
    if let Some(v) = self.agreed_to_terms {
      profile.account.agreed_to_terms = v;
    }
    Ok(())
  }
}

fn validate_phone_prefix(prefix: Option<&str>) -> Result<()> {
  match prefix {
    Some(p) if !is_known_phone_prefix(p) => Err(Error::UnknownPhonePrefix(p.to_owned())),
    _ => Ok(()),
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// A complete, adult, verified member profile.
  pub(crate) fn complete_profile() -> Profile {
    let now = Utc::now();
    Profile {
      profile_id:    Uuid::new_v4(),
      slug:          Uuid::new_v4().to_string(),
      email:         "grace@example.org".into(),
      first_name:    Some("Grace".into()),
      last_name:     Some("Hopper".into()),
      gender:        Some(Gender::Female),
      date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15),
      location:      Location::new("GB", "Leeds"),
      phone_prefix:  None,
      phone:         None,
      role:          Role::Member,
      is_mentor:     false,
      account:       Account { verified: true, agreed_to_terms: true, is_visitor: false },
      encryption:    None,
      created_at:    now,
      updated_at:    now,
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn age_counts_whole_years() {
    let p = complete_profile();
    assert_eq!(p.age_on(date(2024, 6, 14)), Some(33));
    assert_eq!(p.age_on(date(2024, 6, 15)), Some(34));
  }

  #[test]
  fn missing_date_of_birth_is_under_age() {
    let mut p = complete_profile();
    p.date_of_birth = None;
    assert!(p.is_under_age(16, date(2024, 1, 1)));
  }

  #[test]
  fn under_age_boundary() {
    let mut p = complete_profile();
    p.date_of_birth = Some(date(2008, 3, 1));
    assert!(p.is_under_age(16, date(2024, 2, 29)));
    assert!(!p.is_under_age(16, date(2024, 3, 1)));
  }

  #[test]
  fn completeness_requires_fields_and_account_flags() {
    let mut p = complete_profile();
    assert!(p.is_complete());

    p.location.city = None;
    assert_eq!(p.missing_fields(), vec!["location_city"]);
    assert!(!p.is_complete());

    let mut p = complete_profile();
    p.account.verified = false;
    assert!(p.missing_fields().is_empty());
    assert!(!p.is_complete());
  }

  #[test]
  fn full_name_falls_back_to_email() {
    let mut p = complete_profile();
    assert_eq!(p.full_name(), "Grace Hopper");
    p.first_name = None;
    p.last_name = None;
    assert_eq!(p.full_name(), "grace@example.org");
  }

  #[test]
  fn serialized_names_hide_behind_the_pseudonym() {
    let mut p = complete_profile();
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["first_name"], "Grace");
    assert_eq!(json["encrypted"], false);

    p.encryption = Some(ProfileEncryption {
      profile_id:   p.profile_id,
      first_name:   "Ruth".into(),
      last_name:    "Walker".into(),
      reason:       crate::encryption::EncryptionReason::PrivacyConcerns,
      encrypted_by: Uuid::new_v4(),
      created_at:   Utc::now(),
    });
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["first_name"], "Ruth");
    assert_eq!(json["last_name"], "Walker");
    assert_eq!(json["encrypted"], true);
    assert!(!json.to_string().contains("Hopper"));

    let back: Profile = serde_json::from_value(json).unwrap();
    assert_eq!(back.full_name(), "Ruth Walker");
  }

  #[test]
  fn new_profile_ignores_role_and_account_fields() {
    let input: NewProfile = serde_json::from_value(serde_json::json!({
      "email": "eve@example.org",
      "role": "leader",
      "account": { "verified": true, "agreed_to_terms": true, "is_visitor": false },
    }))
    .unwrap();
    assert_eq!(input.email, "eve@example.org");

    let update: ProfileUpdate =
      serde_json::from_value(serde_json::json!({ "verified": true })).unwrap();
    let mut p = complete_profile();
    p.account.verified = false;
    update.apply(&mut p).unwrap();
    assert!(!p.account.verified);
  }

  #[test]
  fn role_strings() {
    assert_eq!(Role::ExternalPerson.to_string(), "external_person");
    assert_eq!("leader".parse::<Role>().unwrap(), Role::Leader);
    assert_eq!(Role::ExternalPerson.label(), "External Person");
  }

  #[test]
  fn update_rejects_unknown_phone_prefix() {
    let mut p = complete_profile();
    let update = ProfileUpdate { phone_prefix: Some("+999".into()), ..Default::default() };
    assert!(matches!(update.apply(&mut p), Err(Error::UnknownPhonePrefix(_))));

    let update = ProfileUpdate {
      phone_prefix: Some("+44".into()),
      phone: Some("7700900123".into()),
      ..Default::default()
    };
    update.apply(&mut p).unwrap();
    assert_eq!(p.phone_prefix.as_deref(), Some("+44"));
  }
}
