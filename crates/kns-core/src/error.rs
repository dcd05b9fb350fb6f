//! Error types for `kns-core`.

use thiserror::Error;

use crate::{
  approval::ApprovalError, consent::ConsentError, counter::CounterReading,
  eligibility::Ineligibility, encryption::EncryptionError, hierarchy::MoveError,
  journey::JourneyError,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Move(#[from] MoveError),

  #[error(transparent)]
  Consent(#[from] ConsentError),

  #[error(transparent)]
  Approval(#[from] ApprovalError),

  #[error(transparent)]
  Encryption(#[from] EncryptionError),

  #[error(transparent)]
  Journey(#[from] JourneyError),

  #[error("not eligible: {}", join_reasons(.0))]
  Ineligible(Vec<Ineligibility>),

  #[error("{field} must be between {} and {} characters (got {})", .reading.min, .reading.max, .reading.length)]
  InvalidLength {
    field:   &'static str,
    reading: CounterReading,
  },

  #[error("unknown phone prefix: {0:?}")]
  UnknownPhonePrefix(String),
}

fn join_reasons(reasons: &[Ineligibility]) -> String {
  reasons
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
