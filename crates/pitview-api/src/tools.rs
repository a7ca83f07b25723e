//! Tool-calling surface: the six query operations as named tools.
//!
//! A conversational-agent host registers [`definitions`] and routes each
//! invocation through [`dispatch`], which deserialises the JSON argument
//! object, runs the matching query operation, and returns the result as
//! JSON. Transport and registration glue live in the host, not here.

use pitview_core::{
  query::{FiscalYearRange, YearRange},
  store::StatStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

/// One-paragraph orientation for the hosting agent.
pub const INSTRUCTIONS: &str =
  "San Diego homelessness data covering 2011-2024 PIT counts and \
   FY2021-FY2026 city spending. Call get_filter_options first to see \
   available years and regions. PIT counts are annual point-in-time \
   snapshots from January.";

/// A callable tool: name, human description, JSON-schema parameter object.
#[derive(Debug, Clone)]
pub struct ToolDef {
  pub name:        &'static str,
  pub description: &'static str,
  pub parameters:  Value,
}

/// The catalogue of the six query tools.
pub fn definitions() -> Vec<ToolDef> {
  let year_range = json!({
    "year_min": { "type": "integer", "default": 2011 },
    "year_max": { "type": "integer", "default": 2024 }
  });

  vec![
    ToolDef {
      name:        "get_filter_options",
      description: "Get available filter values: years and regions. Call \
                    this first to see what values are valid for other tools.",
      parameters:  json!({ "type": "object", "properties": {} }),
    },
    ToolDef {
      name:        "get_overview",
      description: "Get PIT count overview for a given year: total, \
                    sheltered, unsheltered, YoY change. If year is omitted, \
                    returns the most recent year. Counts are people.",
      parameters:  json!({
        "type": "object",
        "properties": { "year": { "type": "integer" } }
      }),
    },
    ToolDef {
      name:        "get_pit_trends",
      description: "Get annual PIT count trends: total, sheltered, \
                    unsheltered by year. Returns a time series suitable for \
                    charting. Counts are people.",
      parameters:  json!({ "type": "object", "properties": year_range }),
    },
    ToolDef {
      name:        "get_subpopulations",
      description: "Get demographic subgroup counts: Chronically Homeless, \
                    Veterans, Families. Optionally filter by group name. \
                    Returns year, group_name, and count.",
      parameters:  json!({
        "type": "object",
        "properties": {
          "year_min": { "type": "integer", "default": 2011 },
          "year_max": { "type": "integer", "default": 2024 },
          "group":    { "type": "string" }
        }
      }),
    },
    ToolDef {
      name:        "get_geography",
      description: "Get PIT counts by subregion within San Diego County. \
                    Returns year, region, total, sheltered, unsheltered.",
      parameters:  json!({
        "type": "object",
        "properties": {
          "year":   { "type": "integer" },
          "region": { "type": "string" }
        }
      }),
    },
    ToolDef {
      name:        "get_spending_trends",
      description: "Get city Homelessness Strategies & Solutions department \
                    spending by fiscal year (USD). The department was \
                    created in FY2021. City budget only — no county, state, \
                    or federal spending.",
      parameters:  json!({
        "type": "object",
        "properties": {
          "fy_min": { "type": "integer", "default": 2021 },
          "fy_max": { "type": "integer", "default": 2026 }
        }
      }),
    },
  ]
}

// ─── Argument shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
struct OverviewArgs {
  year: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
struct YearRangeArgs {
  year_min: Option<i32>,
  year_max: Option<i32>,
  group:    Option<String>,
}

impl YearRangeArgs {
  fn range(&self) -> YearRange {
    let defaults = YearRange::default();
    YearRange {
      year_min: self.year_min.unwrap_or(defaults.year_min),
      year_max: self.year_max.unwrap_or(defaults.year_max),
    }
  }
}

#[derive(Debug, Deserialize, Default)]
struct GeographyArgs {
  year:   Option<i32>,
  region: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SpendingArgs {
  fy_min: Option<i32>,
  fy_max: Option<i32>,
}

fn args<T>(arguments: Value) -> Result<T, ApiError>
where
  T: serde::de::DeserializeOwned + Default,
{
  if arguments.is_null() {
    return Ok(T::default());
  }
  serde_json::from_value(arguments)
    .map_err(|e| ApiError::BadRequest(format!("invalid tool arguments: {e}")))
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Invoke the tool called `name` with the JSON `arguments` object.
pub async fn dispatch<S>(
  store:     &S,
  name:      &str,
  arguments: Value,
) -> Result<Value, ApiError>
where
  S: StatStore,
{
  match name {
    "get_filter_options" => {
      let options = store.filter_options().await.map_err(ApiError::store)?;
      Ok(serde_json::to_value(options)?)
    }
    "get_overview" => {
      let a: OverviewArgs = args(arguments)?;
      let overview = store.overview(a.year).await.map_err(ApiError::store)?;
      Ok(serde_json::to_value(overview)?)
    }
    "get_pit_trends" => {
      let a: YearRangeArgs = args(arguments)?;
      let rows = store.trends(a.range()).await.map_err(ApiError::store)?;
      Ok(serde_json::to_value(rows)?)
    }
    "get_subpopulations" => {
      let a: YearRangeArgs = args(arguments)?;
      let rows = store
        .subpopulations(a.range(), a.group.clone())
        .await
        .map_err(ApiError::store)?;
      Ok(serde_json::to_value(rows)?)
    }
    "get_geography" => {
      let a: GeographyArgs = args(arguments)?;
      let rows = store
        .geography(a.year, a.region)
        .await
        .map_err(ApiError::store)?;
      Ok(serde_json::to_value(rows)?)
    }
    "get_spending_trends" => {
      let a: SpendingArgs = args(arguments)?;
      let defaults = FiscalYearRange::default();
      let range = FiscalYearRange {
        fy_min: a.fy_min.unwrap_or(defaults.fy_min),
        fy_max: a.fy_max.unwrap_or(defaults.fy_max),
      };
      let rows = store.spending(range).await.map_err(ApiError::store)?;
      Ok(serde_json::to_value(rows)?)
    }
    other => Err(ApiError::UnknownTool(other.to_owned())),
  }
}
