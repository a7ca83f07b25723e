//! Integration tests for the builder and `SqliteStore` against fixture
//! sources in a temp directory.

use std::{fs, path::Path};

use pitview_core::{
  query::{FiscalYearRange, YearRange},
  records::Overview,
  store::StatStore,
  validate::{Outcome, Tolerances, validate_datasets},
};
use tempfile::TempDir;

use crate::{RawSources, SqliteStore, build, builder::SPENDING_DEPT};

// ─── Fixtures ─────────────────────────────────────────────────────────────────

// The quoted "10,264" exercises thousands-separator parsing; the `n/a` year
// row must be dropped whole; the `bad` total must null only that metric.
const PIT_COUNTS_CSV: &str = "\
year,total_homeless,sheltered,unsheltered
2022,8427,4101,4326
2023,\"10,264\",4841,5423
2024,10605,5328,5277
n/a,9999,1,1
2021,bad,3000,4000
";

const SUBPOPS_CSV: &str = "\
year,group_name,count
2024,Veterans,743
2024,Chronically Homeless,3159
2023,Veterans,802
2024,Families,1195
2023,,500
2024,Youth,n/a
";

const GEO_CSV: &str = "\
year,region,total,sheltered,unsheltered
2024,City of San Diego,6500,3500,3000
2024,North County,2200,800,1400
2024,O'Brien Valley,500,200,300
2023,City of San Diego,6300,3400,2900
";

fn write_budget_fixture(path: &Path) {
  let conn = rusqlite::Connection::open(path).expect("budget fixture db");
  conn
    .execute_batch(
      "CREATE TABLE dept_budget_trends (
         dept_name          TEXT,
         fiscal_year        INTEGER,
         amount             REAL,
         budget_cycle       TEXT,
         revenue_or_expense TEXT,
         source             TEXT
       );",
    )
    .expect("budget schema");

  let rows: &[(&str, i32, f64, &str, &str, &str)] = &[
    (SPENDING_DEPT, 2021, 10_000_000.0, "adopted", "Expense", "budget"),
    (SPENDING_DEPT, 2021, 5_000_000.0, "adopted", "Expense", "budget"),
    (SPENDING_DEPT, 2022, 20_000_000.0, "adopted", "Expense", "budget"),
    // None of the following may reach the spending dataset.
    (SPENDING_DEPT, 2022, 99_000_000.0, "proposed", "Expense", "budget"),
    (SPENDING_DEPT, 2022, 1_000_000.0, "adopted", "Revenue", "budget"),
    ("Parks & Recreation", 2022, 7_000_000.0, "adopted", "Expense", "budget"),
    (SPENDING_DEPT, 2023, 3_000_000.0, "adopted", "Expense", "estimate"),
  ];
  for r in rows {
    conn
      .execute(
        "INSERT INTO dept_budget_trends VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![r.0, r.1, r.2, r.3, r.4, r.5],
      )
      .expect("budget row");
  }
}

fn write_sources(dir: &Path) -> RawSources {
  fs::write(dir.join("pit_counts.csv"), PIT_COUNTS_CSV).expect("pit csv");
  fs::write(dir.join("pit_subpopulations.csv"), SUBPOPS_CSV)
    .expect("subpop csv");
  fs::write(dir.join("pit_geography.csv"), GEO_CSV).expect("geo csv");

  let budget_db = dir.join("dept_budget_trends.sqlite");
  write_budget_fixture(&budget_db);

  RawSources::from_dir(dir, budget_db)
}

fn built_store(dir: &TempDir) -> SqliteStore {
  let sources = write_sources(dir.path());
  let out = dir.path().join("aggregated.sqlite");
  build(&sources, &out).expect("build");
  SqliteStore::new(out)
}

// ─── Builder ──────────────────────────────────────────────────────────────────

#[test]
fn build_summary_counts_rows() {
  let dir = TempDir::new().unwrap();
  let sources = write_sources(dir.path());
  let out = dir.path().join("aggregated.sqlite");

  let summary = build(&sources, &out).unwrap();
  assert_eq!(summary.trend_rows, 4); // n/a year dropped
  assert_eq!(summary.subpopulation_rows, 4); // blank group + bad count dropped
  assert_eq!(summary.geography_rows, 4);
  assert_eq!(summary.spending_rows, 2);
  assert!(summary.missing_sources.is_empty());
  assert!(out.exists());
  assert!(!out.with_extension("sqlite.tmp").exists());
}

#[tokio::test]
async fn builder_drops_bad_year_and_nulls_bad_metric() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let trends = store.trends(YearRange::unbounded()).await.unwrap();
  let years: Vec<i32> = trends.iter().map(|t| t.year).collect();
  assert_eq!(years, vec![2021, 2022, 2023, 2024]);

  // 2021 kept with a nulled total; other metrics intact.
  let t2021 = &trends[0];
  assert_eq!(t2021.total, None);
  assert_eq!(t2021.sheltered, Some(3_000));
  assert_eq!(t2021.unsheltered, Some(4_000));

  // Quoted thousands separator parsed.
  let t2023 = trends.iter().find(|t| t.year == 2023).unwrap();
  assert_eq!(t2023.total, Some(10_264));
}

#[test]
fn rebuild_from_identical_input_is_byte_identical() {
  let dir = TempDir::new().unwrap();
  let sources = write_sources(dir.path());
  let out = dir.path().join("aggregated.sqlite");

  build(&sources, &out).unwrap();
  let first = fs::read(&out).unwrap();

  build(&sources, &out).unwrap();
  let second = fs::read(&out).unwrap();

  assert_eq!(first, second);
}

#[tokio::test]
async fn missing_csv_leaves_dataset_empty() {
  let dir = TempDir::new().unwrap();
  let mut sources = write_sources(dir.path());
  sources.geography = dir.path().join("does_not_exist.csv");

  let out = dir.path().join("aggregated.sqlite");
  let summary = build(&sources, &out).unwrap();
  assert_eq!(summary.geography_rows, 0);
  assert!(summary.missing_sources.contains(&"pit_geography".to_owned()));

  let store = SqliteStore::new(out);
  let options = store.filter_options().await.unwrap();
  assert!(options.regions.is_empty());
  assert!(!options.years.is_empty());
  assert!(store.geography(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn geography_all_reads_whole_dataset_without_trends() {
  let dir = TempDir::new().unwrap();
  let mut sources = write_sources(dir.path());
  sources.pit_counts = dir.path().join("does_not_exist.csv");

  let out = dir.path().join("aggregated.sqlite");
  build(&sources, &out).unwrap();
  let store = SqliteStore::new(out);

  // Trend years are gone, so the year filter options report nothing.
  assert!(store.filter_options().await.unwrap().years.is_empty());

  // The unfiltered read still sees every geography row, year-ordered.
  let geography = store.geography_all().await.unwrap();
  let years: Vec<i32> = geography.iter().map(|g| g.year).collect();
  assert_eq!(years, vec![2023, 2024, 2024, 2024]);

  // And data-quality checks run against the actual table contents rather
  // than reporting the dataset empty.
  let report =
    validate_datasets(&[], &[], &geography, &[], &Tolerances::default());
  assert!(
    !report
      .findings
      .iter()
      .any(|f| f.check == "pit_geography non-empty")
  );
  assert!(report.findings.iter().any(|f| {
    f.check == "has City of San Diego region" && f.outcome == Outcome::Pass
  }));
}

#[tokio::test]
async fn missing_budget_db_leaves_spending_empty() {
  let dir = TempDir::new().unwrap();
  let mut sources = write_sources(dir.path());
  sources.budget_db = dir.path().join("missing_budget.sqlite");

  let out = dir.path().join("aggregated.sqlite");
  let summary = build(&sources, &out).unwrap();
  assert_eq!(summary.spending_rows, 0);

  let store = SqliteStore::new(out);
  let spending = store.spending(FiscalYearRange::default()).await.unwrap();
  assert!(spending.is_empty());
}

#[tokio::test]
async fn spending_filters_the_crossref() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  // Only adopted-cycle expense rows from the budget source, for the one
  // department, summed by fiscal year.
  let spending = store.spending(FiscalYearRange::default()).await.unwrap();
  assert_eq!(spending.len(), 2);
  assert_eq!(spending[0].fiscal_year, 2021);
  assert_eq!(spending[0].amount, 15_000_000.0);
  assert_eq!(spending[1].fiscal_year, 2022);
  assert_eq!(spending[1].amount, 20_000_000.0);
}

// ─── Query layer ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn filter_options_sorted_distinct() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let options = store.filter_options().await.unwrap();
  assert_eq!(options.years, vec![2021, 2022, 2023, 2024]);
  assert_eq!(
    options.regions,
    vec!["City of San Diego", "North County", "O'Brien Valley"]
  );
}

#[tokio::test]
async fn overview_defaults_to_latest_year() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let o = store.overview(None).await.unwrap();
  assert_eq!(o.year, 2024);
  assert_eq!(o.total, 10_605);
  assert_eq!(o.sheltered, 5_328);
  assert_eq!(o.unsheltered, 5_277);
  assert_eq!(o.prior_year_total, Some(10_264));
  assert_eq!(o.yoy_change, Some(341));
  assert_eq!(o.yoy_pct, Some(3.3));
}

#[tokio::test]
async fn overview_absent_year_returns_sentinel() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let o = store.overview(Some(2030)).await.unwrap();
  assert_eq!(o, Overview::absent(2030));
}

#[tokio::test]
async fn overview_without_prior_year() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  // 2021 exists but has no 2020 neighbour; its total is nulled.
  let o = store.overview(Some(2021)).await.unwrap();
  assert_eq!(o.total, 0);
  assert_eq!(o.sheltered, 3_000);
  assert_eq!(o.prior_year_total, None);
  assert_eq!(o.yoy_pct, None);
}

#[tokio::test]
async fn absent_aggregated_file_reads_as_no_data() {
  let dir = TempDir::new().unwrap();
  let store = SqliteStore::new(dir.path().join("never_built.sqlite"));

  assert!(!store.is_available());
  assert_eq!(store.filter_options().await.unwrap(), Default::default());
  assert_eq!(store.overview(Some(2024)).await.unwrap(), Overview::absent(2024));
  assert!(store.trends(YearRange::default()).await.unwrap().is_empty());
  assert!(
    store
      .subpopulations(YearRange::default(), None)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(store.geography(None, None).await.unwrap().is_empty());
  assert!(store.geography_all().await.unwrap().is_empty());
  assert!(
    store.spending(FiscalYearRange::default()).await.unwrap().is_empty()
  );
}

#[tokio::test]
async fn trends_range_is_inclusive() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store.trends(YearRange::new(2022, 2023)).await.unwrap();
  let years: Vec<i32> = rows.iter().map(|t| t.year).collect();
  assert_eq!(years, vec![2022, 2023]);
}

#[tokio::test]
async fn trends_out_of_range_is_empty_not_error() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store.trends(YearRange::new(2030, 2031)).await.unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn subpopulations_ordered_and_filterable() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let all = store
    .subpopulations(YearRange::default(), None)
    .await
    .unwrap();
  let keys: Vec<(i32, &str)> =
    all.iter().map(|s| (s.year, s.group_name.as_str())).collect();
  assert_eq!(
    keys,
    vec![
      (2023, "Veterans"),
      (2024, "Chronically Homeless"),
      (2024, "Families"),
      (2024, "Veterans"),
    ]
  );

  let veterans = store
    .subpopulations(YearRange::default(), Some("Veterans".into()))
    .await
    .unwrap();
  assert_eq!(veterans.len(), 2);
  assert!(veterans.iter().all(|s| s.group_name == "Veterans"));
}

#[tokio::test]
async fn subpopulations_unknown_group_is_empty() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store
    .subpopulations(YearRange::default(), Some("Nonexistent".into()))
    .await
    .unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn geography_defaults_to_latest_year_ordered_by_total() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store.geography(None, None).await.unwrap();
  assert!(rows.iter().all(|g| g.year == 2024));
  let regions: Vec<&str> = rows.iter().map(|g| g.region.as_str()).collect();
  assert_eq!(
    regions,
    vec!["City of San Diego", "North County", "O'Brien Valley"]
  );
}

#[tokio::test]
async fn geography_region_filter_binds_quotes_safely() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  // An apostrophe in the filter value must be bound, not interpolated.
  let rows = store
    .geography(Some(2024), Some("O'Brien Valley".into()))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].total, Some(500));

  let none = store
    .geography(Some(2024), Some("nowhere' OR '1'='1".into()))
    .await
    .unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn geography_explicit_year() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store.geography(Some(2023), None).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].region, "City of San Diego");
  assert_eq!(rows[0].total, Some(6_300));
}

#[tokio::test]
async fn spending_range_is_inclusive() {
  let dir = TempDir::new().unwrap();
  let store = built_store(&dir);

  let rows = store
    .spending(FiscalYearRange::new(2022, 2026))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].fiscal_year, 2022);
}
