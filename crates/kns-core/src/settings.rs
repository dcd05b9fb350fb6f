//! Organisation-wide settings. A single row exists per store.

use chrono::Duration;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADULT_AGE: u32 = 16;
pub const MIN_REGISTRATION_AGE: u32 = 13;
pub const DEFAULT_APPROVAL_TIMEOUT_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  /// Profiles younger than this need an approved consent form to lead.
  pub adult_age:                     u32,
  pub min_registration_age:          u32,
  /// Leader promotions inside a non-root group need the parent leader's
  /// approval.
  pub change_role_approval_required: bool,
  pub approval_timeout_days:         u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      adult_age:                     DEFAULT_ADULT_AGE,
      min_registration_age:          MIN_REGISTRATION_AGE,
      change_role_approval_required: true,
      approval_timeout_days:         DEFAULT_APPROVAL_TIMEOUT_DAYS,
    }
  }
}

impl Settings {
  pub fn approval_timeout(&self) -> Duration {
    Duration::days(i64::from(self.approval_timeout_days))
  }
}
