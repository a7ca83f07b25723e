//! [`SqliteStore`] — the SQLite implementation of [`StatStore`].

use std::path::{Path, PathBuf};

use pitview_core::{
  query::{FiscalYearRange, YearRange},
  records::{
    FilterOptions, GeographyRecord, Overview, SpendingRecord,
    SubpopulationRecord, TrendRecord,
  },
  store::StatStore,
};
use rusqlite::{OpenFlags, OptionalExtension as _};

use crate::{Error, Result};

// ─── Store ────────────────────────────────────────────────────────────────────

/// A statistics store backed by the aggregated SQLite file.
///
/// Every operation opens its own short-lived read-only connection, released
/// on every exit path. The datasets are never mutated while being served —
/// the offline builder replaces the whole file atomically — so no locking
/// is needed and a rebuild is picked up by the next request.
///
/// An absent aggregated file is "no data", not an error: operations return
/// empty collections or the zero-filled overview sentinel.
#[derive(Debug, Clone)]
pub struct SqliteStore {
  path: PathBuf,
}

impl SqliteStore {
  /// Point the store at an aggregated file. The file does not have to
  /// exist yet; it simply reads as empty until the builder produces it.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Whether the aggregated file currently exists.
  pub fn is_available(&self) -> bool {
    self.path.exists()
  }

  async fn read_conn(&self) -> Result<tokio_rusqlite::Connection> {
    let conn = tokio_rusqlite::Connection::open_with_flags(
      &self.path,
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;
    Ok(conn)
  }

  /// Every geography row across all years.
  ///
  /// The query operation is keyed by year, but data-quality checks must see
  /// the dataset whole: its year coverage need not match the trend dataset,
  /// since each raw source is independently optional.
  pub async fn geography_all(&self) -> Result<Vec<GeographyRecord>> {
    if !self.is_available() {
      return Ok(Vec::new());
    }
    let conn = self.read_conn().await?;

    let rows = conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT year, region, total, sheltered, unsheltered
           FROM pit_geography
           ORDER BY year, total DESC, region",
        )?;
        let rows = stmt
          .query_map([], geography_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}

fn trend_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrendRecord> {
  Ok(TrendRecord {
    year:        row.get(0)?,
    total:       row.get(1)?,
    sheltered:   row.get(2)?,
    unsheltered: row.get(3)?,
  })
}

fn geography_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<GeographyRecord> {
  Ok(GeographyRecord {
    year:        row.get(0)?,
    region:      row.get(1)?,
    total:       row.get(2)?,
    sheltered:   row.get(3)?,
    unsheltered: row.get(4)?,
  })
}

// ─── StatStore impl ───────────────────────────────────────────────────────────

impl StatStore for SqliteStore {
  type Error = Error;

  async fn filter_options(&self) -> Result<FilterOptions> {
    if !self.is_available() {
      return Ok(FilterOptions::default());
    }
    let conn = self.read_conn().await?;

    let options = conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT year FROM pit_trends
           WHERE year IS NOT NULL
           ORDER BY year",
        )?;
        let years = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i32>>>()?;

        let mut stmt = conn.prepare(
          "SELECT DISTINCT region FROM pit_geography ORDER BY region",
        )?;
        let regions = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(FilterOptions { years, regions })
      })
      .await?;

    Ok(options)
  }

  async fn overview(&self, year: Option<i32>) -> Result<Overview> {
    if !self.is_available() {
      return Ok(Overview::absent(year.unwrap_or(0)));
    }
    let conn = self.read_conn().await?;

    let (resolved, current, prior) = conn
      .call(move |conn| {
        let resolved = match year {
          Some(y) => Some(y),
          None => conn
            .query_row("SELECT MAX(year) FROM pit_trends", [], |row| row.get(0))?,
        };
        let Some(resolved) = resolved else {
          // Trend dataset is empty and no year was requested.
          return Ok((None, None, None));
        };

        let fetch = |y: i32| -> rusqlite::Result<Option<TrendRecord>> {
          conn
            .query_row(
              "SELECT year, total, sheltered, unsheltered
               FROM pit_trends WHERE year = ?1",
              rusqlite::params![y],
              trend_from_row,
            )
            .optional()
        };

        let current = fetch(resolved)?;
        let prior = fetch(resolved - 1)?;
        Ok((Some(resolved), current, prior))
      })
      .await?;

    let Some(resolved) = resolved else {
      return Ok(Overview::absent(year.unwrap_or(0)));
    };
    Ok(Overview::compute(resolved, current.as_ref(), prior.as_ref()))
  }

  async fn trends(&self, range: YearRange) -> Result<Vec<TrendRecord>> {
    if !self.is_available() {
      return Ok(Vec::new());
    }
    let conn = self.read_conn().await?;

    let rows = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT year, total, sheltered, unsheltered
           FROM pit_trends
           WHERE year >= ?1 AND year <= ?2
           ORDER BY year",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![range.year_min, range.year_max],
            trend_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn subpopulations(
    &self,
    range: YearRange,
    group: Option<String>,
  ) -> Result<Vec<SubpopulationRecord>> {
    if !self.is_available() {
      return Ok(Vec::new());
    }
    let conn = self.read_conn().await?;

    let rows = conn
      .call(move |conn| {
        // The group filter is a bound parameter; NULL disables it.
        let mut stmt = conn.prepare(
          "SELECT year, group_name, count
           FROM pit_subpopulations
           WHERE year >= ?1 AND year <= ?2
             AND (?3 IS NULL OR group_name = ?3)
           ORDER BY year, group_name",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![range.year_min, range.year_max, group],
            |row| {
              Ok(SubpopulationRecord {
                year:       row.get(0)?,
                group_name: row.get(1)?,
                count:      row.get(2)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn geography(
    &self,
    year:   Option<i32>,
    region: Option<String>,
  ) -> Result<Vec<GeographyRecord>> {
    if !self.is_available() {
      return Ok(Vec::new());
    }
    let conn = self.read_conn().await?;

    let rows = conn
      .call(move |conn| {
        let resolved = match year {
          Some(y) => Some(y),
          None => conn.query_row(
            "SELECT MAX(year) FROM pit_geography",
            [],
            |row| row.get(0),
          )?,
        };
        let Some(resolved) = resolved else {
          return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(
          "SELECT year, region, total, sheltered, unsheltered
           FROM pit_geography
           WHERE year = ?1
             AND (?2 IS NULL OR region = ?2)
           ORDER BY total DESC, region",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![resolved, region], geography_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn spending(
    &self,
    range: FiscalYearRange,
  ) -> Result<Vec<SpendingRecord>> {
    if !self.is_available() {
      return Ok(Vec::new());
    }
    let conn = self.read_conn().await?;

    let rows = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT fiscal_year, amount
           FROM homelessness_spending
           WHERE fiscal_year >= ?1 AND fiscal_year <= ?2
           ORDER BY fiscal_year",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![range.fy_min, range.fy_max], |row| {
            Ok(SpendingRecord {
              fiscal_year: row.get(0)?,
              amount:      row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}
