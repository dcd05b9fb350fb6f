//! Role-change eligibility.
//!
//! Every check collects *all* failed conditions rather than stopping at the
//! first, so a form can list everything the member still has to fix.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::{
  consent::ConsentForm,
  profile::{Profile, Role},
  settings::Settings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligibility {
  #[error("profile is incomplete")]
  ProfileIncomplete,
  #[error("email address is not verified")]
  EmailNotVerified,
  #[error("terms have not been accepted")]
  TermsNotAccepted,
  #[error("profile is a visitor")]
  Visitor,
  #[error("profile already leads a group")]
  LeadsGroup,
  #[error("profile is already a leader")]
  AlreadyLeader,
  #[error("profile is already a member")]
  AlreadyMember,
  #[error("profile is already an external person")]
  AlreadyExternalPerson,
  #[error("profile does not hold the leader role")]
  NotLeaderRole,
  #[error("an approved consent form is required")]
  ConsentFormRequired,
}

/// Everything a check needs to know about one profile.
#[derive(Debug, Clone, Copy)]
pub struct RoleContext<'a> {
  pub profile:      &'a Profile,
  pub leads_group:  bool,
  pub consent_form: Option<&'a ConsentForm>,
  pub settings:     &'a Settings,
  pub today:        NaiveDate,
}

type Check = Result<(), Vec<Ineligibility>>;

fn verdict(reasons: Vec<Ineligibility>) -> Check {
  if reasons.is_empty() { Ok(()) } else { Err(reasons) }
}

impl RoleContext<'_> {
  fn completeness(&self) -> Vec<Ineligibility> {
    let mut reasons = Vec::new();
    if !self.profile.missing_fields().is_empty() {
      reasons.push(Ineligibility::ProfileIncomplete);
    }
    if !self.profile.account.verified {
      reasons.push(Ineligibility::EmailNotVerified);
    }
    if !self.profile.account.agreed_to_terms {
      reasons.push(Ineligibility::TermsNotAccepted);
    }
    reasons
  }

  /// Under-age profiles need an approved consent form on file.
  pub fn needs_consent_form(&self) -> bool {
    self.profile.is_under_age(self.settings.adult_age, self.today)
      && !self.consent_form.is_some_and(ConsentForm::is_approved)
  }

  pub fn can_become_leader(&self) -> Check {
    let mut reasons = self.completeness();
    if self.profile.role == Role::Leader {
      reasons.push(Ineligibility::AlreadyLeader);
    }
    if self.needs_consent_form() {
      reasons.push(Ineligibility::ConsentFormRequired);
    }
    verdict(reasons)
  }

  pub fn can_become_member(&self) -> Check {
    let mut reasons = Vec::new();
    if self.profile.role == Role::Member {
      reasons.push(Ineligibility::AlreadyMember);
    }
    if self.leads_group {
      reasons.push(Ineligibility::LeadsGroup);
    }
    verdict(reasons)
  }

  pub fn can_become_external_person(&self) -> Check {
    let mut reasons = self.completeness();
    if self.profile.role == Role::ExternalPerson {
      reasons.push(Ineligibility::AlreadyExternalPerson);
    }
    if self.leads_group {
      reasons.push(Ineligibility::LeadsGroup);
    }
    verdict(reasons)
  }

  pub fn can_register_group(&self) -> Check {
    let mut reasons = Vec::new();
    if self.profile.account.is_visitor {
      reasons.push(Ineligibility::Visitor);
    }
    if self.leads_group {
      reasons.push(Ineligibility::LeadsGroup);
    }
    if self.profile.role != Role::Leader {
      reasons.push(Ineligibility::NotLeaderRole);
    }
    reasons.extend(self.completeness());
    verdict(reasons)
  }

  pub fn can_become(&self, role: Role) -> Check {
    match role {
      Role::Leader => self.can_become_leader(),
      Role::Member => self.can_become_member(),
      Role::ExternalPerson => self.can_become_external_person(),
    }
  }

  pub fn report(&self) -> EligibilityReport {
    EligibilityReport {
      leader:          self.can_become_leader().into(),
      member:          self.can_become_member().into(),
      external_person: self.can_become_external_person().into(),
      register_group:  self.can_register_group().into(),
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
  pub eligible: bool,
  pub reasons:  Vec<Ineligibility>,
}

impl From<Check> for Verdict {
  fn from(check: Check) -> Self {
    match check {
      Ok(()) => Self { eligible: true, reasons: Vec::new() },
      Err(reasons) => Self { eligible: false, reasons },
    }
  }
}

/// Outcome of every role check for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
  pub leader:          Verdict,
  pub member:          Verdict,
  pub external_person: Verdict,
  pub register_group:  Verdict,
}
