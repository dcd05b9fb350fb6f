//! Locations and the static country / phone-prefix table.

use serde::{Deserialize, Serialize};

/// Where a group meets or a profile lives. Countries are ISO 3166-1 alpha-2
/// codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub country: Option<String>,
  pub city:    Option<String>,
}

impl Location {
  pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
    Self { country: Some(country.into()), city: Some(city.into()) }
  }

  /// `"Country, City"`, `"Country"`, or `placeholder` when no country is set.
  pub fn display_or(&self, placeholder: &str) -> String {
    let Some(code) = self.country.as_deref() else {
      return placeholder.to_owned();
    };
    let country = country_by_code(code).map_or(code, |c| c.name);
    match self.city.as_deref().filter(|c| !c.is_empty()) {
      Some(city) => format!("{country}, {city}"),
      None => country.to_owned(),
    }
  }

  pub fn is_complete(&self) -> bool {
    self.country.as_deref().is_some_and(|c| !c.is_empty())
      && self.city.as_deref().is_some_and(|c| !c.is_empty())
  }
}

// ─── Countries ───────────────────────────────────────────────────────────────

/// One row of the phone-prefix lookup table served to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
  pub code:         &'static str,
  pub name:         &'static str,
  pub phone_prefix: &'static str,
}

pub const COUNTRIES: &[Country] = &[
  Country { code: "AU", name: "Australia", phone_prefix: "+61" },
  Country { code: "BR", name: "Brazil", phone_prefix: "+55" },
  Country { code: "CA", name: "Canada", phone_prefix: "+1" },
  Country { code: "DE", name: "Germany", phone_prefix: "+49" },
  Country { code: "ES", name: "Spain", phone_prefix: "+34" },
  Country { code: "FR", name: "France", phone_prefix: "+33" },
  Country { code: "GB", name: "United Kingdom", phone_prefix: "+44" },
  Country { code: "GH", name: "Ghana", phone_prefix: "+233" },
  Country { code: "IN", name: "India", phone_prefix: "+91" },
  Country { code: "KE", name: "Kenya", phone_prefix: "+254" },
  Country { code: "MX", name: "Mexico", phone_prefix: "+52" },
  Country { code: "NG", name: "Nigeria", phone_prefix: "+234" },
  Country { code: "NL", name: "Netherlands", phone_prefix: "+31" },
  Country { code: "PH", name: "Philippines", phone_prefix: "+63" },
  Country { code: "UG", name: "Uganda", phone_prefix: "+256" },
  Country { code: "US", name: "United States", phone_prefix: "+1" },
  Country { code: "ZA", name: "South Africa", phone_prefix: "+27" },
];

pub fn country_by_code(code: &str) -> Option<&'static Country> {
  COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

pub fn is_known_phone_prefix(prefix: &str) -> bool {
  COUNTRIES.iter().any(|c| c.phone_prefix == prefix)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_uses_country_name() {
    assert_eq!(Location::new("NL", "Utrecht").display_or("---"), "Netherlands, Utrecht");
    let no_city = Location { country: Some("KE".into()), city: None };
    assert_eq!(no_city.display_or("---"), "Kenya");
    assert_eq!(Location::default().display_or("None"), "None");
  }

  #[test]
  fn unknown_code_falls_back_to_code() {
    let loc = Location { country: Some("XX".into()), city: Some("Nowhere".into()) };
    assert_eq!(loc.display_or("---"), "XX, Nowhere");
  }

  #[test]
  fn phone_prefix_lookup() {
    assert!(is_known_phone_prefix("+44"));
    assert!(!is_known_phone_prefix("+999"));
    assert_eq!(country_by_code("gb").map(|c| c.phone_prefix), Some("+44"));
  }
}
