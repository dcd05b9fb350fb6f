//! Groups and group membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, counter, location::Location};

/// A node in the organisational hierarchy. Every group has exactly one
/// leader; a group has at most one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:    Uuid,
  pub slug:        String,
  pub name:        String,
  pub description: String,
  pub leader_id:   Uuid,
  /// `None` for a root group (or a group detached by a move).
  pub parent_id:   Option<Uuid>,
  pub location:    Location,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Group {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  pub fn location_display(&self) -> String { self.location.display_or("None") }
}

/// Input to [`crate::store::CommunityStore::register_group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
  pub name:        String,
  pub description: String,
  #[serde(default)]
  pub location:    Location,
}

impl NewGroup {
  pub fn validate(&self) -> Result<()> {
    counter::GROUP_NAME.validate("name", &self.name)?;
    counter::DESCRIPTION.validate("description", &self.description)?;
    Ok(())
  }
}

/// A profile's membership in a group. A profile has at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
  pub profile_id: Uuid,
  pub group_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  #[test]
  fn new_group_validates_lengths() {
    let ok = NewGroup {
      name:        "Harbour Street".into(),
      description: "d".repeat(120),
      location:    Location::new("GB", "Hull"),
    };
    assert!(ok.validate().is_ok());

    let long_name = NewGroup { name: "n".repeat(51), ..ok.clone() };
    assert!(matches!(
      long_name.validate(),
      Err(Error::InvalidLength { field: "name", .. })
    ));

    let short_desc = NewGroup { description: "brief".into(), ..ok };
    assert!(matches!(
      short_desc.validate(),
      Err(Error::InvalidLength { field: "description", .. })
    ));
  }
}
