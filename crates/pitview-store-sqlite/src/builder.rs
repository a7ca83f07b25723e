//! The offline aggregation builder.
//!
//! Reshapes the manually-curated raw CSVs (plus the externally-produced
//! budget cross-reference) into the four derived tables of the aggregated
//! SQLite file. The file is rebuilt wholesale on every run: everything is
//! written to a sibling temp file first and renamed over the target, so a
//! concurrent reader never observes a partial write.
//!
//! Missing sources are never fatal. The corresponding table is simply left
//! empty and the gap is reported in the returned [`BuildSummary`].

use std::{
  fs,
  path::{Path, PathBuf},
};

use pitview_core::records::{
  GeographyRecord, SpendingRecord, SubpopulationRecord, TrendRecord,
};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::{Error, Result, parse, schema::SCHEMA};

// ─── Spending cross-reference constants ──────────────────────────────────────

/// The city budget department whose expenses count as homelessness spending.
pub const SPENDING_DEPT: &str = "Homelessness Strategies & Solutions";

const BUDGET_CYCLE: &str = "adopted";
const EXPENSE_TAG: &str = "Expense";
const SOURCE_TAG: &str = "budget";

// ─── Raw sources ──────────────────────────────────────────────────────────────

/// Locations of the builder's inputs.
///
/// There is no clean download endpoint for PIT data; the three CSVs are
/// compiled by hand from HUD Exchange and RTFH reports. The budget
/// cross-reference is produced by a separate project and may legitimately
/// be absent.
#[derive(Debug, Clone)]
pub struct RawSources {
  pub pit_counts:     PathBuf,
  pub subpopulations: PathBuf,
  pub geography:      PathBuf,
  pub budget_db:      PathBuf,
}

impl RawSources {
  /// Conventional layout: the three CSVs under `raw_dir`, the budget
  /// cross-reference wherever the sibling project put it.
  pub fn from_dir(raw_dir: &Path, budget_db: PathBuf) -> Self {
    Self {
      pit_counts:     raw_dir.join("pit_counts.csv"),
      subpopulations: raw_dir.join("pit_subpopulations.csv"),
      geography:      raw_dir.join("pit_geography.csv"),
      budget_db,
    }
  }

  /// Report which sources exist and are non-empty, logging each one.
  pub fn verify(&self) -> Vec<SourceStatus> {
    let statuses: Vec<SourceStatus> = [
      ("pit_counts", &self.pit_counts),
      ("pit_subpopulations", &self.subpopulations),
      ("pit_geography", &self.geography),
      ("budget cross-reference", &self.budget_db),
    ]
    .into_iter()
    .map(|(name, path)| SourceStatus {
      name:      name.to_owned(),
      path:      path.clone(),
      available: fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false),
    })
    .collect();

    for s in &statuses {
      if s.available {
        info!(source = %s.name, path = %s.path.display(), "source found");
      } else {
        warn!(source = %s.name, path = %s.path.display(), "source missing");
      }
    }
    statuses
  }
}

/// Availability of one raw source.
#[derive(Debug, Clone)]
pub struct SourceStatus {
  pub name:      String,
  pub path:      PathBuf,
  pub available: bool,
}

/// Row counts per derived dataset plus the sources that were unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
  pub trend_rows:         usize,
  pub subpopulation_rows: usize,
  pub geography_rows:     usize,
  pub spending_rows:      usize,
  pub missing_sources:    Vec<String>,
}

// ─── Build ────────────────────────────────────────────────────────────────────

/// Rebuild the aggregated file at `out` from `sources`.
///
/// Rebuilding twice from identical input produces a byte-identical file:
/// rows are inserted in a deterministic sorted order, the schema carries no
/// timestamps, and journalling is left at the rollback default.
pub fn build(sources: &RawSources, out: &Path) -> Result<BuildSummary> {
  if let Some(parent) = out.parent() {
    fs::create_dir_all(parent)?;
  }

  let tmp = tmp_path(out);
  if tmp.exists() {
    fs::remove_file(&tmp)?;
  }

  let mut conn = Connection::open(&tmp)?;
  conn.execute_batch(SCHEMA)?;

  let mut summary = BuildSummary::default();
  let tx = conn.transaction()?;

  match load_trends(&sources.pit_counts)? {
    Some(rows) => {
      for r in &rows {
        tx.execute(
          "INSERT INTO pit_trends (year, total, sheltered, unsheltered)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![r.year, r.total, r.sheltered, r.unsheltered],
        )?;
      }
      summary.trend_rows = rows.len();
    }
    None => summary.missing_sources.push("pit_counts".into()),
  }

  match load_subpopulations(&sources.subpopulations)? {
    Some(rows) => {
      for r in &rows {
        tx.execute(
          "INSERT INTO pit_subpopulations (year, group_name, count)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![r.year, r.group_name, r.count],
        )?;
      }
      summary.subpopulation_rows = rows.len();
    }
    None => summary.missing_sources.push("pit_subpopulations".into()),
  }

  match load_geography(&sources.geography)? {
    Some(rows) => {
      for r in &rows {
        tx.execute(
          "INSERT INTO pit_geography
             (year, region, total, sheltered, unsheltered)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![r.year, r.region, r.total, r.sheltered, r.unsheltered],
        )?;
      }
      summary.geography_rows = rows.len();
    }
    None => summary.missing_sources.push("pit_geography".into()),
  }

  match load_spending(&sources.budget_db)? {
    Some(rows) => {
      for r in &rows {
        tx.execute(
          "INSERT INTO homelessness_spending (fiscal_year, amount)
           VALUES (?1, ?2)",
          rusqlite::params![r.fiscal_year, r.amount],
        )?;
      }
      summary.spending_rows = rows.len();
    }
    None => summary.missing_sources.push("budget cross-reference".into()),
  }

  tx.commit()?;
  conn.close().map_err(|(_, e)| Error::Sqlite(e))?;

  fs::rename(&tmp, out).map_err(|source| Error::Replace {
    from: tmp.clone(),
    to:   out.to_path_buf(),
    source,
  })?;

  info!(
    trends = summary.trend_rows,
    subpopulations = summary.subpopulation_rows,
    geography = summary.geography_rows,
    spending = summary.spending_rows,
    path = %out.display(),
    "aggregated datasets rebuilt"
  );
  Ok(summary)
}

fn tmp_path(out: &Path) -> PathBuf {
  let mut os = out.as_os_str().to_owned();
  os.push(".tmp");
  PathBuf::from(os)
}

// ─── CSV loading ──────────────────────────────────────────────────────────────

/// Open `path` as a headered CSV, or `None` if the source is absent.
fn open_csv(path: &Path) -> Result<Option<csv::Reader<fs::File>>> {
  if !path.exists() {
    warn!(path = %path.display(), "raw source not found, dataset left empty");
    return Ok(None);
  }
  Ok(Some(csv::ReaderBuilder::new().flexible(true).from_path(path)?))
}

/// Case-insensitive header lookup.
fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
  headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
  idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn load_trends(path: &Path) -> Result<Option<Vec<TrendRecord>>> {
  let Some(mut reader) = open_csv(path)? else {
    return Ok(None);
  };

  let headers = reader.headers()?.clone();
  let year_col = column(&headers, "year");
  let total_col = column(&headers, "total_homeless");
  let sheltered_col = column(&headers, "sheltered");
  let unsheltered_col = column(&headers, "unsheltered");

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    // An uncastable year drops the whole row; an uncastable metric only
    // nulls that metric.
    let Some(year) = parse::parse_year(field(&record, year_col)) else {
      continue;
    };
    rows.push(TrendRecord {
      year,
      total:       parse::parse_count(field(&record, total_col)),
      sheltered:   parse::parse_count(field(&record, sheltered_col)),
      unsheltered: parse::parse_count(field(&record, unsheltered_col)),
    });
  }

  rows.sort_by_key(|r| r.year);
  rows.dedup_by_key(|r| r.year);
  Ok(Some(rows))
}

fn load_subpopulations(path: &Path) -> Result<Option<Vec<SubpopulationRecord>>> {
  let Some(mut reader) = open_csv(path)? else {
    return Ok(None);
  };

  let headers = reader.headers()?.clone();
  let year_col = column(&headers, "year");
  let group_col = column(&headers, "group_name");
  let count_col = column(&headers, "count");

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    // Subgroup rows carry a single metric, so an uncastable count (or a
    // blank group label) leaves nothing worth keeping.
    let Some(year) = parse::parse_year(field(&record, year_col)) else {
      continue;
    };
    let Some(count) = parse::parse_count(field(&record, count_col)) else {
      continue;
    };
    let group_name = field(&record, group_col).trim();
    if group_name.is_empty() {
      continue;
    }
    rows.push(SubpopulationRecord { year, group_name: group_name.to_owned(), count });
  }

  rows.sort_by(|a, b| {
    (a.year, a.group_name.as_str()).cmp(&(b.year, b.group_name.as_str()))
  });
  rows.dedup_by(|a, b| a.year == b.year && a.group_name == b.group_name);
  Ok(Some(rows))
}

fn load_geography(path: &Path) -> Result<Option<Vec<GeographyRecord>>> {
  let Some(mut reader) = open_csv(path)? else {
    return Ok(None);
  };

  let headers = reader.headers()?.clone();
  let year_col = column(&headers, "year");
  let region_col = column(&headers, "region");
  let total_col = column(&headers, "total");
  let sheltered_col = column(&headers, "sheltered");
  let unsheltered_col = column(&headers, "unsheltered");

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    let Some(year) = parse::parse_year(field(&record, year_col)) else {
      continue;
    };
    let region = field(&record, region_col).trim();
    if region.is_empty() {
      continue;
    }
    rows.push(GeographyRecord {
      year,
      region:      region.to_owned(),
      total:       parse::parse_count(field(&record, total_col)),
      sheltered:   parse::parse_count(field(&record, sheltered_col)),
      unsheltered: parse::parse_count(field(&record, unsheltered_col)),
    });
  }

  rows.sort_by(|a, b| {
    (a.year, a.region.as_str()).cmp(&(b.year, b.region.as_str()))
  });
  rows.dedup_by(|a, b| a.year == b.year && a.region == b.region);
  Ok(Some(rows))
}

// ─── Spending cross-reference ─────────────────────────────────────────────────

/// Derive homelessness spending from the budget project's database.
///
/// Filters to the department's adopted-budget expense rows and sums by
/// fiscal year. All filter values are bound parameters.
fn load_spending(budget_db: &Path) -> Result<Option<Vec<SpendingRecord>>> {
  if !budget_db.exists() {
    info!(
      path = %budget_db.display(),
      "budget cross-reference not found, spending left empty"
    );
    return Ok(None);
  }

  let budget = Connection::open_with_flags(
    budget_db,
    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
  )?;

  let mut stmt = budget.prepare(
    "SELECT fiscal_year, SUM(amount)
     FROM dept_budget_trends
     WHERE dept_name = ?1
       AND budget_cycle = ?2
       AND revenue_or_expense = ?3
       AND source = ?4
     GROUP BY fiscal_year
     ORDER BY fiscal_year",
  )?;

  let rows = stmt
    .query_map(
      rusqlite::params![SPENDING_DEPT, BUDGET_CYCLE, EXPENSE_TAG, SOURCE_TAG],
      |row| {
        Ok(SpendingRecord { fiscal_year: row.get(0)?, amount: row.get(1)? })
      },
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(rows))
}
