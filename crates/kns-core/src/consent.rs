//! Guardian consent forms for under-age profiles.
//!
//! A form moves `pending -> approved | rejected`; both outcomes are terminal.
//! A rejected form can be replaced by a fresh submission, which starts over at
//! `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::counter::{self, CounterReading};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsentStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsentError {
  #[error("consent form is already {0}")]
  NotPending(ConsentStatus),

  #[error("a consent form cannot be submitted while the current one is {0}")]
  SubmissionBlocked(ConsentStatus),

  #[error("a consent form cannot be reviewed by the profile that submitted it")]
  SelfReview,

  #[error("reject reason must be between {} and {} characters (got {})", .0.min, .0.max, .0.length)]
  InvalidReason(CounterReading),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentForm {
  pub consent_form_id: Uuid,
  pub profile_id:      Uuid,
  pub status:          ConsentStatus,
  pub submitted_by:    Uuid,
  pub reviewed_by:     Option<Uuid>,
  pub reviewed_at:     Option<DateTime<Utc>>,
  pub reject_reason:   Option<String>,
  pub created_at:      DateTime<Utc>,
}

impl ConsentForm {
  /// A fresh pending submission.
  pub fn submit(profile_id: Uuid, submitted_by: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      consent_form_id: Uuid::new_v4(),
      profile_id,
      status: ConsentStatus::Pending,
      submitted_by,
      reviewed_by: None,
      reviewed_at: None,
      reject_reason: None,
      created_at: now,
    }
  }

  /// Only a missing or rejected form may be replaced.
  pub fn ensure_can_submit(existing: Option<&ConsentForm>) -> Result<(), ConsentError> {
    match existing.map(|f| f.status) {
      None | Some(ConsentStatus::Rejected) => Ok(()),
      Some(status) => Err(ConsentError::SubmissionBlocked(status)),
    }
  }

  pub fn approve(&mut self, reviewer: Uuid, now: DateTime<Utc>) -> Result<(), ConsentError> {
    self.review(ConsentStatus::Approved, reviewer, now)
  }

  /// The reason is optional but, when present, must fit the description
  /// bounds.
  pub fn reject(
    &mut self,
    reviewer: Uuid,
    reason: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<(), ConsentError> {
    if let Some(r) = &reason {
      let reading = counter::DESCRIPTION.read(r);
      if reading.is_out_of_range() || r.is_empty() {
        return Err(ConsentError::InvalidReason(reading));
      }
    }
    self.review(ConsentStatus::Rejected, reviewer, now)?;
    self.reject_reason = reason;
    Ok(())
  }

  fn review(
    &mut self,
    outcome: ConsentStatus,
    reviewer: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(), ConsentError> {
    if self.status != ConsentStatus::Pending {
      return Err(ConsentError::NotPending(self.status));
    }
    if reviewer == self.submitted_by {
      return Err(ConsentError::SelfReview);
    }
    self.status = outcome;
    self.reviewed_by = Some(reviewer);
    self.reviewed_at = Some(now);
    Ok(())
  }

  pub fn is_approved(&self) -> bool { self.status == ConsentStatus::Approved }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pending() -> ConsentForm { ConsentForm::submit(Uuid::new_v4(), Uuid::new_v4(), Utc::now()) }

  #[test]
  fn approve_from_pending() {
    let mut form = pending();
    let reviewer = Uuid::new_v4();
    form.approve(reviewer, Utc::now()).unwrap();
    assert!(form.is_approved());
    assert_eq!(form.reviewed_by, Some(reviewer));
    assert!(form.reviewed_at.is_some());
  }

  #[test]
  fn terminal_states_reject_further_review() {
    let mut form = pending();
    form.approve(Uuid::new_v4(), Utc::now()).unwrap();
    assert_eq!(
      form.reject(Uuid::new_v4(), None, Utc::now()),
      Err(ConsentError::NotPending(ConsentStatus::Approved))
    );

    let mut form = pending();
    form.reject(Uuid::new_v4(), None, Utc::now()).unwrap();
    assert_eq!(
      form.approve(Uuid::new_v4(), Utc::now()),
      Err(ConsentError::NotPending(ConsentStatus::Rejected))
    );
  }

  #[test]
  fn reject_reason_length_is_checked() {
    let mut form = pending();
    let err = form
      .reject(Uuid::new_v4(), Some("blurry scan".into()), Utc::now())
      .unwrap_err();
    assert!(matches!(err, ConsentError::InvalidReason(r) if r.length == 11));
    assert_eq!(form.status, ConsentStatus::Pending);

    let reason = "The guardian signature is missing from the second page. ".repeat(3);
    form.reject(Uuid::new_v4(), Some(reason.clone()), Utc::now()).unwrap();
    assert_eq!(form.reject_reason, Some(reason));
  }

  #[test]
  fn submitter_cannot_review() {
    let leader = Uuid::new_v4();
    let mut form = ConsentForm::submit(Uuid::new_v4(), leader, Utc::now());
    assert_eq!(form.approve(leader, Utc::now()), Err(ConsentError::SelfReview));
    assert_eq!(form.reject(leader, None, Utc::now()), Err(ConsentError::SelfReview));
    assert_eq!(form.status, ConsentStatus::Pending);
  }

  #[test]
  fn resubmission_only_after_rejection() {
    assert!(ConsentForm::ensure_can_submit(None).is_ok());

    let mut form = pending();
    assert_eq!(
      ConsentForm::ensure_can_submit(Some(&form)),
      Err(ConsentError::SubmissionBlocked(ConsentStatus::Pending))
    );

    form.reject(Uuid::new_v4(), None, Utc::now()).unwrap();
    assert!(ConsentForm::ensure_can_submit(Some(&form)).is_ok());
  }
}
