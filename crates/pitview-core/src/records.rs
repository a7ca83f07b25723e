//! Record types for the four derived datasets and the views computed from
//! them.
//!
//! Every PIT (point-in-time) figure is a count of people from an annual
//! single-night census. Metric fields are `Option` because the builder
//! nulls an individual metric it cannot cast while keeping the rest of the
//! row; a row's year is mandatory (uncastable years drop the whole row at
//! build time).

use serde::{Deserialize, Serialize};

// ─── Dataset rows ─────────────────────────────────────────────────────────────

/// One year of the countywide PIT count: total, sheltered, unsheltered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
  pub year:        i32,
  pub total:       Option<i64>,
  pub sheltered:   Option<i64>,
  pub unsheltered: Option<i64>,
}

/// A demographic subgroup count for one year. Groups may overlap; the set
/// of names is open but conventionally small ("Veterans", "Chronically
/// Homeless", "Families", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpopulationRecord {
  pub year:       i32,
  pub group_name: String,
  pub count:      i64,
}

/// A subregional PIT count for one year. Region coverage may be incomplete,
/// so regional sums only approximate the countywide total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyRecord {
  pub year:        i32,
  pub region:      String,
  pub total:       Option<i64>,
  pub sheltered:   Option<i64>,
  pub unsheltered: Option<i64>,
}

/// Adopted-budget expense for the city's homelessness department in one
/// fiscal year (USD). Fiscal years are offset from PIT calendar years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRecord {
  pub fiscal_year: i32,
  pub amount:      f64,
}

// ─── Derived views ────────────────────────────────────────────────────────────

/// Distinct filter values available to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
  /// Years present in the trend dataset, ascending, deduplicated.
  pub years:   Vec<i32>,
  /// Regions present in the geography dataset, ascending. Empty when that
  /// dataset is absent — that is "no data", not an error.
  pub regions: Vec<String>,
}

/// A single year's headline figures with a year-over-year comparison.
///
/// When the requested year has no record this is the zero-filled sentinel:
/// all counts 0, all comparison fields `None`. Callers must treat that as
/// "no data" rather than a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub year:             i32,
  pub total:            i64,
  pub sheltered:        i64,
  pub unsheltered:      i64,
  pub prior_year_total: Option<i64>,
  pub yoy_change:       Option<i64>,
  pub yoy_pct:          Option<f64>,
}

impl Overview {
  /// The "no data" sentinel for `year`.
  pub fn absent(year: i32) -> Self {
    Self {
      year,
      total: 0,
      sheltered: 0,
      unsheltered: 0,
      prior_year_total: None,
      yoy_change: None,
      yoy_pct: None,
    }
  }

  /// Compute the overview for `year` from the trend rows for that year and
  /// the one before it.
  ///
  /// `yoy_pct` is `(total - prior) / prior * 100` rounded to one decimal;
  /// `None` when the prior year is absent or its total is zero or missing.
  pub fn compute(
    year:    i32,
    current: Option<&TrendRecord>,
    prior:   Option<&TrendRecord>,
  ) -> Self {
    let Some(current) = current else {
      return Self::absent(year);
    };

    let total = current.total.unwrap_or(0);
    let mut overview = Self {
      year,
      total,
      sheltered: current.sheltered.unwrap_or(0),
      unsheltered: current.unsheltered.unwrap_or(0),
      prior_year_total: None,
      yoy_change: None,
      yoy_pct: None,
    };

    if let Some(prior_total) = prior.and_then(|p| p.total) {
      overview.prior_year_total = Some(prior_total);
      overview.yoy_change = Some(total - prior_total);
      if prior_total != 0 {
        let pct = (total - prior_total) as f64 / prior_total as f64 * 100.0;
        overview.yoy_pct = Some((pct * 10.0).round() / 10.0);
      }
    }

    overview
  }
}
