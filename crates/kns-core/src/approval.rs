//! Approval requests for role changes that need a parent leader's sign-off.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

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
pub enum ApprovalStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
  Expired,
}

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
  #[default]
  ChangeRoleToLeader,
}

impl ActionType {
  pub fn label(self) -> &'static str {
    match self {
      Self::ChangeRoleToLeader => "Change role to leader",
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApprovalError {
  #[error("approval request is already {0}")]
  NotPending(ApprovalStatus),

  #[error("only the leader of the requested group can decide this request")]
  NotConsumerLeader,
}

/// A role change waiting on the leader of `consumer_group_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionApproval {
  pub approval_id:       Uuid,
  pub action_type:       ActionType,
  pub new_leader_id:     Uuid,
  pub created_by:        Uuid,
  pub consumer_group_id: Uuid,
  pub status:            ApprovalStatus,
  pub approved_by:       Option<Uuid>,
  pub approved_at:       Option<DateTime<Utc>>,
  pub read:              bool,
  pub timeout_secs:      i64,
  pub created_at:        DateTime<Utc>,
}

impl ActionApproval {
  pub fn change_role_to_leader(
    new_leader_id: Uuid,
    created_by: Uuid,
    consumer_group_id: Uuid,
    timeout: Duration,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      approval_id: Uuid::new_v4(),
      action_type: ActionType::ChangeRoleToLeader,
      new_leader_id,
      created_by,
      consumer_group_id,
      status: ApprovalStatus::Pending,
      approved_by: None,
      approved_at: None,
      read: false,
      timeout_secs: timeout.num_seconds(),
      created_at: now,
    }
  }

  pub fn timeout(&self) -> Duration { Duration::seconds(self.timeout_secs) }

  pub fn is_pending(&self) -> bool { self.status == ApprovalStatus::Pending }

  /// Move a stale pending request to `expired`. Returns `true` if the status
  /// changed and needs persisting.
  pub fn check_timeout(&mut self, now: DateTime<Utc>) -> bool {
    if self.is_pending() && self.created_at + self.timeout() < now {
      self.status = ApprovalStatus::Expired;
      true
    } else {
      false
    }
  }

  /// `consumer_leader_id` is the current leader of the consumer group.
  pub fn approve(
    &mut self,
    decider: Uuid,
    consumer_leader_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(), ApprovalError> {
    self.decide(ApprovalStatus::Approved, decider, consumer_leader_id, now)
  }

  pub fn reject(
    &mut self,
    decider: Uuid,
    consumer_leader_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(), ApprovalError> {
    self.decide(ApprovalStatus::Rejected, decider, consumer_leader_id, now)
  }

  fn decide(
    &mut self,
    outcome: ApprovalStatus,
    decider: Uuid,
    consumer_leader_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(), ApprovalError> {
    if decider != consumer_leader_id {
      return Err(ApprovalError::NotConsumerLeader);
    }
    self.check_timeout(now);
    if !self.is_pending() {
      return Err(ApprovalError::NotPending(self.status));
    }
    self.status = outcome;
    self.approved_by = Some(decider);
    self.approved_at = Some(now);
    self.read = true;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(now: DateTime<Utc>) -> ActionApproval {
    ActionApproval::change_role_to_leader(
      Uuid::new_v4(),
      Uuid::new_v4(),
      Uuid::new_v4(),
      Duration::days(7),
      now,
    )
  }

  #[test]
  fn approve_by_consumer_leader() {
    let now = Utc::now();
    let mut a = request(now);
    let leader = Uuid::new_v4();
    a.approve(leader, leader, now).unwrap();
    assert_eq!(a.status, ApprovalStatus::Approved);
    assert_eq!(a.approved_by, Some(leader));
    assert!(a.read);
  }

  #[test]
  fn only_consumer_leader_may_decide() {
    let now = Utc::now();
    let mut a = request(now);
    assert_eq!(
      a.reject(Uuid::new_v4(), Uuid::new_v4(), now),
      Err(ApprovalError::NotConsumerLeader)
    );
    assert!(a.is_pending());
  }

  #[test]
  fn stale_request_expires() {
    let created = Utc::now() - Duration::days(8);
    let mut a = request(created);
    assert!(a.check_timeout(Utc::now()));
    assert_eq!(a.status, ApprovalStatus::Expired);
    assert!(!a.check_timeout(Utc::now()));

    let mut b = request(created);
    let leader = Uuid::new_v4();
    assert_eq!(
      b.approve(leader, leader, Utc::now()),
      Err(ApprovalError::NotPending(ApprovalStatus::Expired))
    );
  }

  #[test]
  fn fresh_request_does_not_expire() {
    let mut a = request(Utc::now() - Duration::days(6));
    assert!(!a.check_timeout(Utc::now()));
    assert!(a.is_pending());
  }
}
