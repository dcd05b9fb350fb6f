//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kns_core::{
  approval::ApprovalError,
  consent::ConsentError,
  eligibility::Ineligibility,
  encryption::EncryptionError,
  hierarchy::MoveError,
  journey::JourneyError,
  store::{ErrorKind, StoreError},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// A form-style rejection: a message plus any eligibility reasons.
  #[error("{message}")]
  Validation {
    message: String,
    reasons: Vec<Ineligibility>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Maps a backend error by its [`ErrorKind`]; only internal failures
  /// become 500s.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.kind() {
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::Conflict => ApiError::Conflict(e.to_string()),
      ErrorKind::Invalid => ApiError::invalid(e),
      ErrorKind::Internal => ApiError::Store(Box::new(e)),
    }
  }

  pub fn invalid(message: impl ToString) -> Self {
    ApiError::Validation { message: message.to_string(), reasons: Vec::new() }
  }
}

impl From<kns_core::Error> for ApiError {
  fn from(e: kns_core::Error) -> Self {
    use kns_core::Error as E;
    match e {
      E::Move(e) => e.into(),
      E::Consent(e) => e.into(),
      E::Approval(e) => e.into(),
      E::Encryption(e) => e.into(),
      E::Journey(e) => e.into(),
      E::Ineligible(reasons) => ApiError::Validation {
        message: "profile is not eligible".into(),
        reasons,
      },
      e @ (E::InvalidLength { .. } | E::UnknownPhonePrefix(_)) => ApiError::invalid(e),
    }
  }
}

impl From<MoveError> for ApiError {
  fn from(e: MoveError) -> Self {
    match e {
      MoveError::GroupNotFound(_) => ApiError::NotFound(e.to_string()),
      _ => ApiError::invalid(e),
    }
  }
}

impl From<ConsentError> for ApiError {
  fn from(e: ConsentError) -> Self {
    match e {
      ConsentError::InvalidReason(_) => ApiError::invalid(e),
      ConsentError::SelfReview => ApiError::Forbidden(e.to_string()),
      ConsentError::NotPending(_) | ConsentError::SubmissionBlocked(_) => {
        ApiError::Conflict(e.to_string())
      }
    }
  }
}

impl From<ApprovalError> for ApiError {
  fn from(e: ApprovalError) -> Self {
    match e {
      ApprovalError::NotConsumerLeader => ApiError::Forbidden(e.to_string()),
      ApprovalError::NotPending(_) => ApiError::Conflict(e.to_string()),
    }
  }
}

impl From<EncryptionError> for ApiError {
  fn from(e: EncryptionError) -> Self {
    match e {
      EncryptionError::NotEncrypter => ApiError::Forbidden(e.to_string()),
      EncryptionError::AlreadyEncrypted | EncryptionError::NotEncrypted => {
        ApiError::Conflict(e.to_string())
      }
    }
  }
}

impl From<JourneyError> for ApiError {
  fn from(e: JourneyError) -> Self { ApiError::invalid(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "missing or unknown x-kns-profile header" }),
      ),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Validation { message, reasons } => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({
          "error": message,
          "reasons": reasons,
          "messages": reasons.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
