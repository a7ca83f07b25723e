//! Query parameter types shared by every front end.
//!
//! The query surface is a fixed parameter set — ranges and exact-match
//! filters only, no free-form predicates.

use serde::{Deserialize, Serialize};

/// Inclusive calendar-year range over PIT datasets.
///
/// The default covers the published PIT count series (2011–2024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
  pub year_min: i32,
  pub year_max: i32,
}

impl Default for YearRange {
  fn default() -> Self {
    Self { year_min: 2011, year_max: 2024 }
  }
}

impl YearRange {
  pub fn new(year_min: i32, year_max: i32) -> Self {
    Self { year_min, year_max }
  }

  /// A range covering every representable year. Used by the validation
  /// command to fetch whole datasets.
  pub fn unbounded() -> Self {
    Self { year_min: i32::MIN, year_max: i32::MAX }
  }
}

/// Inclusive fiscal-year range over the spending dataset.
///
/// The default covers the city department's lifetime to date (FY2021, when
/// it was created, through the FY2026 adopted budget).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearRange {
  pub fy_min: i32,
  pub fy_max: i32,
}

impl Default for FiscalYearRange {
  fn default() -> Self {
    Self { fy_min: 2021, fy_max: 2026 }
  }
}

impl FiscalYearRange {
  pub fn new(fy_min: i32, fy_max: i32) -> Self {
    Self { fy_min, fy_max }
  }

  pub fn unbounded() -> Self {
    Self { fy_min: i32::MIN, fy_max: i32::MAX }
  }
}
