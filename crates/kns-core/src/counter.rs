//! Character counters for length-bounded text fields.
//!
//! A counter reports the live length of a value against its allowed range and
//! flags out-of-range values so the form can highlight them.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bounds used by group and faith-milestone descriptions and consent-form
/// reject reasons.
pub const DESCRIPTION: CharCounter = CharCounter::new(100, 500);

/// Bounds for group names.
pub const GROUP_NAME: CharCounter = CharCounter::new(1, 50);

pub const MILESTONE_TITLE: CharCounter = CharCounter::new(1, 255);

/// Where a value sits relative to its counter's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterState {
  Empty,
  TooShort,
  Ok,
  TooLong,
}

/// The rendering hint attached to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
  Neutral,
  Valid,
  OutOfRange,
}

impl Indicator {
  /// CSS class used by the counter badge.
  pub fn css_class(self) -> &'static str {
    match self {
      Self::Neutral => "text-gray-500",
      Self::Valid => "text-green-600",
      Self::OutOfRange => "text-red-600",
    }
  }
}

/// An inclusive `[min, max]` length range, counted in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
  pub min: usize,
  pub max: usize,
}

/// A single evaluation of a counter against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReading {
  pub length: usize,
  pub min:    usize,
  pub max:    usize,
  pub state:  CounterState,
}

impl CharCounter {
  pub const fn new(min: usize, max: usize) -> Self { Self { min, max } }

  pub fn read(&self, text: &str) -> CounterReading {
    let length = text.chars().count();
    let state = if length == 0 {
      CounterState::Empty
    } else if length < self.min {
      CounterState::TooShort
    } else if length > self.max {
      CounterState::TooLong
    } else {
      CounterState::Ok
    };
    CounterReading { length, min: self.min, max: self.max, state }
  }

  /// Reject `text` unless its length lies within the range. An empty value
  /// only passes when `min` is zero.
  pub fn validate(&self, field: &'static str, text: &str) -> Result<()> {
    let reading = self.read(text);
    let ok = match reading.state {
      CounterState::Ok => true,
      CounterState::Empty => self.min == 0,
      CounterState::TooShort | CounterState::TooLong => false,
    };
    if ok {
      Ok(())
    } else {
      Err(Error::InvalidLength { field, reading })
    }
  }
}

impl CounterReading {
  pub fn is_out_of_range(&self) -> bool {
    matches!(self.state, CounterState::TooShort | CounterState::TooLong)
  }

  pub fn indicator(&self) -> Indicator {
    match self.state {
      CounterState::Empty => Indicator::Neutral,
      CounterState::Ok => Indicator::Valid,
      CounterState::TooShort | CounterState::TooLong => Indicator::OutOfRange,
    }
  }

  /// The `"length/max"` badge text.
  pub fn display(&self) -> String { format!("{}/{}", self.length, self.max) }
}
