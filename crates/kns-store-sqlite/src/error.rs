//! Error type for `kns-store-sqlite`.

use kns_core::store::{ErrorKind, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kns_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its enum.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("group not found: {0}")]
  GroupNotFound(Uuid),

  #[error("consent form not found: {0}")]
  ConsentFormNotFound(Uuid),

  #[error("approval request not found: {0}")]
  ApprovalNotFound(Uuid),

  #[error("placement not found: {0}")]
  PlacementNotFound(Uuid),

  #[error("profile {0} already leads a group")]
  AlreadyLeadsGroup(Uuid),

  #[error("profile {0} already belongs to a group")]
  AlreadyMember(Uuid),

  #[error("profile {0} is not a member of group {1}")]
  NotAMember(Uuid, Uuid),

  #[error("profile {0} is already encrypted")]
  AlreadyEncrypted(Uuid),

  #[error("profile {0} is not encrypted")]
  NotEncrypted(Uuid),

  #[error("profile {0} already has this faith milestone")]
  DuplicateMilestone(Uuid),

  #[error("verification token does not match for profile {0}")]
  InvalidToken(Uuid),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::ProfileNotFound(_)
      | Error::GroupNotFound(_)
      | Error::ConsentFormNotFound(_)
      | Error::ApprovalNotFound(_)
      | Error::PlacementNotFound(_) => ErrorKind::NotFound,
      Error::AlreadyLeadsGroup(_)
      | Error::AlreadyMember(_)
      | Error::NotAMember(..)
      | Error::AlreadyEncrypted(_)
      | Error::NotEncrypted(_)
      | Error::DuplicateMilestone(_) => ErrorKind::Conflict,
      Error::Core(_) | Error::InvalidToken(_) => ErrorKind::Invalid,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e))
        if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) =>
      {
        ErrorKind::Conflict
      }
      Error::Database(_) | Error::Uuid(_) | Error::DateParse(_) | Error::Decode(_) => {
        ErrorKind::Internal
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
