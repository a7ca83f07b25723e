//! Data-quality checks over the derived datasets.
//!
//! Run after the aggregation builder to catch problems before publishing.
//! Everything here is pure: the caller fetches the datasets and receives a
//! [`ValidationReport`] back, so checks compose and test in isolation.

use serde::{Deserialize, Serialize};

use crate::records::{
  GeographyRecord, SpendingRecord, SubpopulationRecord, TrendRecord,
};

// ─── Tolerances ───────────────────────────────────────────────────────────────

/// Reconciliation tolerances between related datasets.
///
/// The PIT count is survey-based, so sheltered + unsheltered only
/// approximates the published total, and subregional coverage may be
/// incomplete. The defaults are tuned to this dataset's noise; they are
/// configuration, not physics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
  /// Allowed relative gap between `total` and `sheltered + unsheltered`.
  pub trend_split:   f64,
  /// Allowed relative gap between a year's regional sum and its trend
  /// total.
  pub geography_sum: f64,
}

impl Default for Tolerances {
  fn default() -> Self {
    Self { trend_split: 0.05, geography_sum: 0.10 }
  }
}

// ─── Findings ─────────────────────────────────────────────────────────────────

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
  Pass,
  Fail,
  Warn,
}

/// One check result: a stable label, an outcome, and optional detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
  pub check:   String,
  pub outcome: Outcome,
  pub detail:  Option<String>,
}

/// All findings from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub findings: Vec<Finding>,
}

impl ValidationReport {
  fn push(&mut self, check: &str, outcome: Outcome, detail: Option<String>) {
    self.findings.push(Finding { check: check.to_owned(), outcome, detail });
  }

  /// Record a pass/fail check; `detail` is attached only on failure.
  fn check(&mut self, check: &str, ok: bool, detail: impl FnOnce() -> String) {
    if ok {
      self.push(check, Outcome::Pass, None);
    } else {
      self.push(check, Outcome::Fail, Some(detail()));
    }
  }

  fn warn(&mut self, check: &str, detail: String) {
    self.push(check, Outcome::Warn, Some(detail));
  }

  pub fn passed(&self) -> usize {
    self.count(Outcome::Pass)
  }

  pub fn failed(&self) -> usize {
    self.count(Outcome::Fail)
  }

  pub fn warnings(&self) -> usize {
    self.count(Outcome::Warn)
  }

  pub fn is_ok(&self) -> bool {
    self.failed() == 0
  }

  fn count(&self, outcome: Outcome) -> usize {
    self.findings.iter().filter(|f| f.outcome == outcome).count()
  }
}

// ─── Checks ───────────────────────────────────────────────────────────────────

/// Run every check against the four derived datasets.
///
/// Empty datasets produce warnings rather than failures: each dataset is
/// independently optional and may legitimately be absent.
pub fn validate_datasets(
  trends:     &[TrendRecord],
  subpops:    &[SubpopulationRecord],
  geography:  &[GeographyRecord],
  spending:   &[SpendingRecord],
  tolerances: &Tolerances,
) -> ValidationReport {
  let mut report = ValidationReport::default();

  check_trends(&mut report, trends, tolerances);
  check_subpopulations(&mut report, subpops, trends);
  check_geography(&mut report, geography, trends, tolerances);
  check_spending(&mut report, spending);

  report
}

fn trend_total(trends: &[TrendRecord], year: i32) -> Option<i64> {
  trends.iter().find(|t| t.year == year).and_then(|t| t.total)
}

fn check_trends(
  report:     &mut ValidationReport,
  trends:     &[TrendRecord],
  tolerances: &Tolerances,
) {
  if trends.is_empty() {
    report.warn("pit_trends non-empty", "dataset is empty".into());
    return;
  }

  let min_year = trends.iter().map(|t| t.year).min().unwrap_or(0);
  let max_year = trends.iter().map(|t| t.year).max().unwrap_or(0);
  report.check("trend min year >= 2007", min_year >= 2007, || {
    format!("min={min_year}")
  });
  report.check("trend max year >= 2023", max_year >= 2023, || {
    format!("max={max_year}")
  });

  // sheltered + unsheltered ≈ total, within tolerance, where all three are
  // present.
  let mismatched: Vec<i32> = trends
    .iter()
    .filter_map(|t| {
      let (total, sheltered, unsheltered) =
        (t.total?, t.sheltered?, t.unsheltered?);
      let gap = (total - (sheltered + unsheltered)).abs() as f64;
      (gap > total as f64 * tolerances.trend_split).then_some(t.year)
    })
    .collect();
  report.check(
    "sheltered + unsheltered ≈ total",
    mismatched.is_empty(),
    || format!("years over tolerance: {mismatched:?}"),
  );

  // Plausibility band for recent countywide totals.
  for t in trends.iter().filter(|t| t.year >= 2020) {
    if let Some(total) = t.total {
      report.check(
        &format!("PIT {} total in 5k-20k band", t.year),
        total > 5_000 && total < 20_000,
        || format!("got {total}"),
      );
    }
  }

  // NULL rate on metric columns.
  let rows = trends.len();
  for (name, nulls) in [
    ("total", trends.iter().filter(|t| t.total.is_none()).count()),
    ("sheltered", trends.iter().filter(|t| t.sheltered.is_none()).count()),
    (
      "unsheltered",
      trends.iter().filter(|t| t.unsheltered.is_none()).count(),
    ),
  ] {
    let pct = nulls as f64 / rows as f64 * 100.0;
    if pct > 10.0 {
      report
        .warn(&format!("{name} NULL rate"), format!("{pct:.1}% ({nulls}/{rows})"));
    } else {
      report.check(&format!("{name} NULL rate < 10%"), true, String::new);
    }
  }
}

fn check_subpopulations(
  report:  &mut ValidationReport,
  subpops: &[SubpopulationRecord],
  trends:  &[TrendRecord],
) {
  if subpops.is_empty() {
    report.warn("pit_subpopulations non-empty", "dataset is empty".into());
    return;
  }

  for group in ["Chronically Homeless", "Veterans"] {
    report.check(
      &format!("has {group} group"),
      subpops.iter().any(|s| s.group_name == group),
      || "group missing".into(),
    );
  }

  // A subgroup can never exceed the year's total count.
  let violations: Vec<(i32, &str)> = subpops
    .iter()
    .filter_map(|s| {
      let total = trend_total(trends, s.year)?;
      (s.count > total).then_some((s.year, s.group_name.as_str()))
    })
    .collect();
  report.check("subpopulation count <= total", violations.is_empty(), || {
    format!("{} violations: {violations:?}", violations.len())
  });
}

fn check_geography(
  report:     &mut ValidationReport,
  geography:  &[GeographyRecord],
  trends:     &[TrendRecord],
  tolerances: &Tolerances,
) {
  if geography.is_empty() {
    report.warn("pit_geography non-empty", "dataset is empty".into());
    return;
  }

  report.check(
    "has City of San Diego region",
    geography.iter().any(|g| g.region == "City of San Diego"),
    || "region missing".into(),
  );

  // Regional sums reconcile with the countywide total per year.
  let mut years: Vec<i32> = geography.iter().map(|g| g.year).collect();
  years.sort_unstable();
  years.dedup();

  let mismatched: Vec<i32> = years
    .into_iter()
    .filter(|&year| {
      let Some(total) = trend_total(trends, year) else {
        return false;
      };
      let regional: i64 = geography
        .iter()
        .filter(|g| g.year == year)
        .filter_map(|g| g.total)
        .sum();
      (regional - total).abs() as f64 > total as f64 * tolerances.geography_sum
    })
    .collect();
  report.check("regional sums ≈ trend total", mismatched.is_empty(), || {
    format!("years over tolerance: {mismatched:?}")
  });
}

fn check_spending(report: &mut ValidationReport, spending: &[SpendingRecord]) {
  if spending.is_empty() {
    report.warn(
      "homelessness_spending non-empty",
      "dataset is empty (cross-reference unavailable?)".into(),
    );
    return;
  }

  report.check(
    "spending has FY2021+",
    spending.iter().any(|s| s.fiscal_year >= 2021),
    || {
      let years: Vec<i32> = spending.iter().map(|s| s.fiscal_year).collect();
      format!("years: {years:?}")
    },
  );

  for s in spending {
    report.check(
      &format!("FY{} spending > 0", s.fiscal_year),
      s.amount > 0.0,
      || format!("got {:.2}", s.amount),
    );
    if s.amount <= 1_000_000.0 {
      report.warn(
        &format!("FY{} spending below $1M", s.fiscal_year),
        format!("${:.0}", s.amount),
      );
    }
  }
}
