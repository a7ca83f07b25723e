//! `pitview` — build, validate, and serve San Diego homelessness statistics.
//!
//! # Usage
//!
//! ```
//! pitview build              # rebuild the aggregated datasets from raw CSVs
//! pitview validate           # data-quality checks; non-zero exit on failure
//! pitview serve              # JSON API on the configured host/port
//! pitview -c prod.toml serve
//! ```
//!
//! Configuration comes from `config.toml` (optional) layered under
//! `PITVIEW_`-prefixed environment variables.

mod settings;

use std::sync::Arc;

use anyhow::Context as _;
use axum::{Json, Router, extract::State, routing::get};
use clap::{Parser, Subcommand};
use pitview_api::api_router;
use pitview_core::{
  query::{FiscalYearRange, YearRange},
  store::StatStore as _,
  validate::{Outcome, validate_datasets},
};
use pitview_store_sqlite::{RawSources, SqliteStore};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::AppConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pitview", about = "San Diego homelessness statistics service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Verify raw sources and rebuild the aggregated datasets.
  Build,
  /// Run data-quality checks against the aggregated datasets.
  Validate,
  /// Serve the JSON API.
  Serve,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = settings::load(&cli.config)
    .with_context(|| format!("loading config from {}", cli.config.display()))?;

  match cli.command {
    Command::Build => run_build(&config),
    Command::Validate => run_validate(&config).await,
    Command::Serve => run_serve(&config).await,
  }
}

// ─── build ────────────────────────────────────────────────────────────────────

fn run_build(config: &AppConfig) -> anyhow::Result<()> {
  let sources =
    RawSources::from_dir(&config.raw_dir, config.budget_db.clone());
  sources.verify();

  let summary = pitview_store_sqlite::build(&sources, &config.aggregated_path)
    .context("aggregation build failed")?;

  if !summary.missing_sources.is_empty() {
    tracing::warn!(
      missing = ?summary.missing_sources,
      "some datasets were left empty"
    );
  }
  Ok(())
}

// ─── validate ─────────────────────────────────────────────────────────────────

async fn run_validate(config: &AppConfig) -> anyhow::Result<()> {
  let store = SqliteStore::new(&config.aggregated_path);

  let trends = store.trends(YearRange::unbounded()).await?;
  let subpops = store.subpopulations(YearRange::unbounded(), None).await?;
  let spending = store.spending(FiscalYearRange::unbounded()).await?;
  // Fetched whole, not via the year-keyed query operation: geography years
  // need not match trend years when a raw source was absent.
  let geography = store.geography_all().await?;

  let report = validate_datasets(
    &trends,
    &subpops,
    &geography,
    &spending,
    &config.tolerances,
  );

  for finding in &report.findings {
    let label = match finding.outcome {
      Outcome::Pass => "PASS",
      Outcome::Fail => "FAIL",
      Outcome::Warn => "WARN",
    };
    match &finding.detail {
      Some(detail) if !detail.is_empty() => {
        println!("  {label}  {} — {detail}", finding.check);
      }
      _ => println!("  {label}  {}", finding.check),
    }
  }
  println!(
    "Results: {} passed, {} failed, {} warnings",
    report.passed(),
    report.failed(),
    report.warnings()
  );

  if !report.is_ok() {
    anyhow::bail!("{} validation failures", report.failed());
  }
  Ok(())
}

// ─── serve ────────────────────────────────────────────────────────────────────

async fn run_serve(config: &AppConfig) -> anyhow::Result<()> {
  let store = Arc::new(SqliteStore::new(&config.aggregated_path));
  if !store.is_available() {
    tracing::warn!(
      path = %store.path().display(),
      "aggregated file not found; all queries will return empty data \
       until `pitview build` runs"
    );
  }

  let app = Router::new()
    .route("/", get(root))
    .route("/health", get(health))
    .with_state(store.clone())
    .merge(api_router(store))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", config.host, config.port);
  tracing::info!("listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// `GET /` — endpoint index.
async fn root() -> Json<serde_json::Value> {
  Json(json!({
    "message": "San Diego Homelessness API",
    "endpoints": [
      "/filters", "/overview", "/trends", "/subpopulations",
      "/geography", "/spending"
    ]
  }))
}

/// `GET /health` — reports whether the aggregated file is present.
async fn health(
  State(store): State<Arc<SqliteStore>>,
) -> Json<serde_json::Value> {
  Json(json!({
    "aggregated_path": store.path().display().to_string(),
    "exists": store.is_available()
  }))
}
