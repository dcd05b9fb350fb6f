//! Name encryption: hiding a profile's real name behind a pseudonym.
//!
//! While a [`ProfileEncryption`] exists for a profile, every rendering of the
//! profile's name uses the pseudonym. Only the profile that encrypted it may
//! lift it again.

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;
use uuid::Uuid;

use crate::profile::{Gender, Profile};

// ─── Reasons ─────────────────────────────────────────────────────────────────

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
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EncryptionReason {
  PrivacyConcerns,
  SecurityPurposes,
  AvoidingUnwantedAttention,
  MaintainingAnonymity,
  RespectingPersonalBoundaries,
}

impl EncryptionReason {
  pub fn title(self) -> &'static str {
    match self {
      Self::PrivacyConcerns => "Privacy Concerns",
      Self::SecurityPurposes => "Security Purposes",
      Self::AvoidingUnwantedAttention => "Avoiding Unwanted Attention",
      Self::MaintainingAnonymity => "Maintaining Anonymity",
      Self::RespectingPersonalBoundaries => "Respecting Personal Boundaries",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      Self::PrivacyConcerns => {
        "Disciples may have concerns about their privacy and prefer to keep their personal \
         details confidential."
      }
      Self::SecurityPurposes => {
        "Revealing the identity of a disciple could put them at risk in places where faith is \
         persecuted."
      }
      Self::AvoidingUnwantedAttention => {
        "Some disciples prefer not to draw attention to their involvement in the community."
      }
      Self::MaintainingAnonymity => {
        "The disciple has asked to remain anonymous to other members of the organisation."
      }
      Self::RespectingPersonalBoundaries => {
        "Leaders respect the personal boundaries a disciple has set about sharing their name."
      }
    }
  }

  /// Every reason, in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

/// One entry of `GET /encryption-reasons`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonEntry {
  pub reason:      EncryptionReason,
  pub title:       String,
  pub description: String,
}

impl From<EncryptionReason> for ReasonEntry {
  fn from(reason: EncryptionReason) -> Self {
    Self {
      reason,
      title: reason.title().to_owned(),
      description: reason.description().to_owned(),
    }
  }
}

// ─── Pseudonyms ──────────────────────────────────────────────────────────────

const MALE_FIRST_NAMES: &[&str] = &[
  "Aaron", "Benjamin", "Caleb", "Daniel", "Elijah", "Gabriel", "Isaac", "Jonah", "Levi", "Micah",
  "Nathan", "Samuel", "Simon", "Thomas", "Zachary",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
  "Abigail", "Anna", "Deborah", "Esther", "Eve", "Hannah", "Joanna", "Leah", "Lydia", "Miriam",
  "Naomi", "Priscilla", "Rachel", "Rebecca", "Ruth",
];

const LAST_NAMES: &[&str] = &[
  "Adams", "Baker", "Carter", "Ellis", "Fletcher", "Garner", "Hughes", "Jennings", "Lawson",
  "Mercer", "Norris", "Parker", "Reeves", "Shepherd", "Walker",
];

fn pick<R: Rng + ?Sized>(names: &[&'static str], rng: &mut R) -> String {
  names.choose(rng).copied().unwrap_or_default().to_owned()
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptionError {
  #[error("profile name is already hidden")]
  AlreadyEncrypted,

  #[error("profile name is not hidden")]
  NotEncrypted,

  #[error("only the profile that hid this name can reveal it")]
  NotEncrypter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEncryption {
  pub profile_id:   Uuid,
  /// Pseudonymous first name; female profiles get a female name.
  pub first_name:   String,
  pub last_name:    String,
  pub reason:       EncryptionReason,
  pub encrypted_by: Uuid,
  pub created_at:   DateTime<Utc>,
}

impl ProfileEncryption {
  /// Hide `profile`'s name behind a freshly drawn pseudonym.
  pub fn new(
    profile: &Profile,
    reason: EncryptionReason,
    encrypted_by: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Self, EncryptionError> {
    Self::with_rng(profile, reason, encrypted_by, now, &mut rand::thread_rng())
  }

  pub fn with_rng<R: Rng + ?Sized>(
    profile: &Profile,
    reason: EncryptionReason,
    encrypted_by: Uuid,
    now: DateTime<Utc>,
    rng: &mut R,
  ) -> Result<Self, EncryptionError> {
    if profile.encryption.is_some() {
      return Err(EncryptionError::AlreadyEncrypted);
    }
    let first_names = match profile.gender {
      Some(Gender::Female) => FEMALE_FIRST_NAMES,
      _ => MALE_FIRST_NAMES,
    };
    Ok(Self {
      profile_id: profile.profile_id,
      first_name: pick(first_names, rng),
      last_name: pick(LAST_NAMES, rng),
      reason,
      encrypted_by,
      created_at: now,
    })
  }

  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }

  /// Checks that `acting` may lift the encryption on `profile`.
  pub fn ensure_can_decrypt(profile: &Profile, acting: Uuid) -> Result<(), EncryptionError> {
    match &profile.encryption {
      None => Err(EncryptionError::NotEncrypted),
      Some(e) if e.encrypted_by != acting => Err(EncryptionError::NotEncrypter),
      Some(_) => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::profile::tests::complete_profile;

  #[test]
  fn female_profiles_get_female_first_names() {
    let mut rng = StdRng::seed_from_u64(7);
    let profile = complete_profile();
    for _ in 0..20 {
      let e = ProfileEncryption::with_rng(
        &profile,
        EncryptionReason::PrivacyConcerns,
        Uuid::new_v4(),
        Utc::now(),
        &mut rng,
      )
      .unwrap();
      assert!(FEMALE_FIRST_NAMES.contains(&e.first_name.as_str()), "{}", e.first_name);
      assert!(LAST_NAMES.contains(&e.last_name.as_str()));
    }

    let mut male = complete_profile();
    male.gender = Some(Gender::Male);
    let e = ProfileEncryption::with_rng(
      &male,
      EncryptionReason::SecurityPurposes,
      Uuid::new_v4(),
      Utc::now(),
      &mut rng,
    )
    .unwrap();
    assert!(MALE_FIRST_NAMES.contains(&e.first_name.as_str()));
  }

  #[test]
  fn full_name_uses_the_pseudonym_while_encrypted() {
    let mut profile = complete_profile();
    let leader = Uuid::new_v4();
    let e = ProfileEncryption::new(&profile, EncryptionReason::MaintainingAnonymity, leader, Utc::now())
      .unwrap();
    let pseudonym = e.full_name();
    profile.encryption = Some(e);

    assert_eq!(profile.full_name(), pseudonym);
    assert_ne!(profile.full_name(), "Grace Hopper");
    assert_eq!(
      ProfileEncryption::new(&profile, EncryptionReason::PrivacyConcerns, leader, Utc::now()),
      Err(EncryptionError::AlreadyEncrypted)
    );
  }

  #[test]
  fn only_the_encrypter_may_decrypt() {
    let mut profile = complete_profile();
    let leader = Uuid::new_v4();
    assert_eq!(
      ProfileEncryption::ensure_can_decrypt(&profile, leader),
      Err(EncryptionError::NotEncrypted)
    );

    profile.encryption = Some(
      ProfileEncryption::new(&profile, EncryptionReason::PrivacyConcerns, leader, Utc::now())
        .unwrap(),
    );
    assert_eq!(
      ProfileEncryption::ensure_can_decrypt(&profile, Uuid::new_v4()),
      Err(EncryptionError::NotEncrypter)
    );
    assert!(ProfileEncryption::ensure_can_decrypt(&profile, leader).is_ok());
  }

  #[test]
  fn reasons_have_titles() {
    let entries: Vec<ReasonEntry> = EncryptionReason::all().map(Into::into).collect();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].title, "Privacy Concerns");
    assert_eq!(EncryptionReason::AvoidingUnwantedAttention.to_string(), "avoiding_unwanted_attention");
  }
}
