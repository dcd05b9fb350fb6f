//! Reference catalogs: levels, sublevels, classifications and
//! subclassifications.
//!
//! Entries are seeded by the store from the tables below. Sublevels hang off
//! levels and subclassifications off classifications through link rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

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
pub enum CatalogKind {
  Level,
  Sublevel,
  Classification,
  Subclassification,
}

impl CatalogKind {
  /// The kind linked below this one.
  pub fn child(self) -> Option<Self> {
    match self {
      Self::Level => Some(Self::Sublevel),
      Self::Classification => Some(Self::Subclassification),
      Self::Sublevel | Self::Subclassification => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
  pub entry_id:   Uuid,
  pub kind:       CatalogKind,
  pub slug:       String,
  pub title:      String,
  pub content:    String,
  /// Display order; classifications carry an explicit order, the rest keep
  /// their seed order.
  pub position:   u32,
  pub created_at: DateTime<Utc>,
}

// ─── Seed data ───────────────────────────────────────────────────────────────

pub struct Seed {
  pub title:   &'static str,
  pub content: &'static str,
}

const fn seed(title: &'static str, content: &'static str) -> Seed { Seed { title, content } }

pub const LEVELS: &[Seed] = &[
  seed(
    "Far from God",
    "Individuals who are currently distant from a relationship with God, often unaware or \
     uninterested in spiritual matters.",
  ),
  seed(
    "Seekers",
    "Individuals actively exploring faith and spirituality, showing interest in learning more \
     about God and the teachings of Jesus.",
  ),
  seed(
    "Team Members",
    "Individuals who are part of a movement team, contributing to the group's mission and \
     activities through various roles and responsibilities.",
  ),
  seed(
    "Team Leaders",
    "Individuals who lead and guide movement teams, providing direction, support, and \
     encouragement to team members.",
  ),
  seed(
    "Movement Leaders",
    "Individuals who lead entire movements, overseeing multiple teams and initiatives, and \
     ensuring alignment with the movement's vision and goals.",
  ),
  seed(
    "Movement Catalysts",
    "Individuals who inspire and initiate new movements, identifying opportunities for growth \
     and expansion, and equipping others to lead effectively.",
  ),
];

pub const SUBLEVELS: &[Seed] = &[
  seed("Unreached person", "Persons currently among Unreached Peoples Group (UPG)"),
  seed(
    "From Unreached and Unengaged Group",
    "Persons from a people group that have not been previously reached and engaged with the \
     gospel (UUPG)",
  ),
  seed("Other religion", "Persons from other religions or belief systems other than Christianity"),
  seed(
    "Christian religious background",
    "Persons from Christian background but that are not saved nor with a relationship with God \
     through Christ.",
  ),
  seed("Reached people", "Persons from peoples groups that have already been reached with the gospel"),
  seed("Reached and engaged", "Persons from peoples groups that have been reached and engaged"),
  seed(
    "Person of Peace",
    "Persons that God is currently working on their hearts and are becoming interested in \
     becoming a bridge for the gospel to enter their community.",
  ),
  seed("Unbelieving team member", "Team members that are yet to be saved or become believers in Jesus Christ"),
  seed(
    "Believing team member",
    "Team members that have believed in Jesus Christ, are saved and on a journey of \
     transformation",
  ),
  seed("Team leader with a group", "Team leaders that have started only one functioning DBS group"),
  seed(
    "Team leader with more than 1 group",
    "Team leaders that have started and leading more than 1 DBS group",
  ),
  seed(
    "Movement leaders below 4 generations",
    "Movement leaders that have multiplied less than 4 generations of other DBS groups and teams",
  ),
  seed(
    "Movement leaders of 4 generations",
    "Movement leaders that have multiplied up to 4 functioning generations of DBS groups and teams",
  ),
  seed(
    "Movement Catalyst Beginner",
    "Movement Catalysts that have shared and mobilized other organization(s) or corporate \
     entities or community that are multiplying movements",
  ),
];

/// `(level, sublevel)` title pairs.
pub const LEVEL_SUBLEVELS: &[(&str, &str)] = &[
  ("Far from God", "Unreached person"),
  ("Far from God", "From Unreached and Unengaged Group"),
  ("Far from God", "Other religion"),
  ("Far from God", "Christian religious background"),
  ("Seekers", "Reached people"),
  ("Seekers", "Reached and engaged"),
  ("Seekers", "Person of Peace"),
  ("Team Members", "Unbelieving team member"),
  ("Team Members", "Believing team member"),
  ("Team Leaders", "Team leader with a group"),
  ("Team Leaders", "Team leader with more than 1 group"),
  ("Movement Leaders", "Movement leaders below 4 generations"),
  ("Movement Leaders", "Movement leaders of 4 generations"),
  ("Movement Catalysts", "Movement Catalyst Beginner"),
];

/// In display order.
pub const CLASSIFICATIONS: &[Seed] = &[
  seed("Other Religions", "Persons practicing other religions or faiths with a different belief system"),
  seed(
    "Politics, Governance and Rulership",
    "Persons serving in areas of politics, governance and rulership including responsibilities \
     in traditional institution",
  ),
  seed(
    "Student, Pupil, Learner or Apprentice",
    "Persons currently undergoing academic study or in an educational institution, a \
     professional area of study, or apprenticeship, or any other area of learning",
  ),
  seed(
    "Businessperson or Entrepreneur",
    "Persons engaged in business or in the market place domain for trading or other areas of \
     commercial enterprise",
  ),
  seed("Teacher or Lecturer", "Persons engaged in teaching or lecturing others"),
  seed(
    "Disciple Maker",
    "One involved and committed to remaining an obedient disciple that also makes other \
     obedient disciples and equips them to multiply.",
  ),
  seed(
    "Underprivileged",
    "One that has inadequate access to needed care and resources for a meaningful livelihood",
  ),
  seed(
    "Substance Abusers",
    "One who is currently involved in substance abuse and is vulnerable to its addiction.",
  ),
  seed(
    "Displaced Persons",
    "Those forced from their original locations due to conflict, crisis or other \
     natural/human disasters or uncontrollable events.",
  ),
];

pub const SUBCLASSIFICATIONS: &[Seed] = &[
  seed("Hinduist", "Persons practicing Hinduism"),
  seed("Buddhist", "Persons practicing Buddhism"),
  seed("Atheist", "Persons who do not believe in the existence of God"),
  seed("Elected political leader", "Persons elected into a political office"),
  seed("Appointed civil servant", "Persons appointed into public service"),
  seed("Traditional Ruler or Chief", "Persons holding a traditional title or chieftaincy"),
  seed("Unemployed with no skills", "Unemployed due to lack of relevant skills and training"),
  seed("Unemployed with skills", "Unemployed though with relevant skills that can be marketable"),
  seed("Vulnerable to homelessness", "Persons at risk of losing their home"),
  seed("Vulnerable to substance abuse", "Persons that have been rendered vulnerable due to substance abuse"),
  seed("Withdrawal syndrome", "Persons going through withdrawal from an addictive substance"),
  seed(
    "Internally Displaced Person (IDP)",
    "Persons forced from their homes but still within their national borders",
  ),
];

/// `(classification, subclassification)` title pairs.
pub const CLASSIFICATION_SUBCLASSIFICATIONS: &[(&str, &str)] = &[
  ("Other Religions", "Hinduist"),
  ("Other Religions", "Buddhist"),
  ("Other Religions", "Atheist"),
  ("Politics, Governance and Rulership", "Elected political leader"),
  ("Politics, Governance and Rulership", "Appointed civil servant"),
  ("Politics, Governance and Rulership", "Traditional Ruler or Chief"),
  ("Underprivileged", "Unemployed with no skills"),
  ("Underprivileged", "Unemployed with skills"),
  ("Underprivileged", "Vulnerable to homelessness"),
  ("Substance Abusers", "Vulnerable to substance abuse"),
  ("Substance Abusers", "Withdrawal syndrome"),
  ("Displaced Persons", "Internally Displaced Person (IDP)"),
];

/// Every seed with its kind and 1-based position.
pub fn seeds() -> impl Iterator<Item = (CatalogKind, u32, &'static Seed)> {
  [
    (CatalogKind::Level, LEVELS),
    (CatalogKind::Sublevel, SUBLEVELS),
    (CatalogKind::Classification, CLASSIFICATIONS),
    (CatalogKind::Subclassification, SUBCLASSIFICATIONS),
  ]
  .into_iter()
  .flat_map(|(kind, table)| {
    table.iter().zip(1u32..).map(move |(seed, position)| (kind, position, seed))
  })
}

/// A seeded link between two catalog entries, by title.
pub struct SeedLink {
  pub parent:       CatalogKind,
  pub parent_title: &'static str,
  pub child:        CatalogKind,
  pub child_title:  &'static str,
}

pub fn seed_links() -> impl Iterator<Item = SeedLink> {
  let levels = LEVEL_SUBLEVELS.iter().map(|&(parent_title, child_title)| SeedLink {
    parent: CatalogKind::Level,
    parent_title,
    child: CatalogKind::Sublevel,
    child_title,
  });
  let classes =
    CLASSIFICATION_SUBCLASSIFICATIONS.iter().map(|&(parent_title, child_title)| SeedLink {
      parent: CatalogKind::Classification,
      parent_title,
      child: CatalogKind::Subclassification,
      child_title,
    });
  levels.chain(classes)
}
