//! Runtime configuration, deserialised from `config.toml` and the
//! environment.
//!
//! Every field has a default so a bare checkout runs without any config
//! file; `PITVIEW_`-prefixed environment variables override the file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use pitview_core::validate::Tolerances;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Directory holding the manually-compiled raw CSVs.
  pub raw_dir:         PathBuf,
  /// The aggregated SQLite file the builder writes and the API serves.
  pub aggregated_path: PathBuf,
  /// The sibling budget project's database (spending cross-reference).
  /// May be absent; spending is then served empty.
  pub budget_db:       PathBuf,
  pub host:            String,
  pub port:            u16,
  /// Reconciliation tolerances for `pitview validate`.
  pub tolerances:      Tolerances,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      raw_dir:         PathBuf::from("data/raw"),
      aggregated_path: PathBuf::from("data/aggregated.sqlite"),
      budget_db:       PathBuf::from("data/dept_budget_trends.sqlite"),
      host:            "127.0.0.1".to_owned(),
      port:            8000,
      tolerances:      Tolerances::default(),
    }
  }
}

/// Layer the optional config file under `PITVIEW_*` environment variables.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("PITVIEW").separator("__"))
    .build()
    .context("failed to read configuration")?;

  settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")
}
