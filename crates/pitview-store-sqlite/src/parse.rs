//! Best-effort field casts for the loosely-typed raw CSV columns.
//!
//! Raw sources are compiled by hand from published PDF reports, so numbers
//! arrive as strings with stray whitespace, thousands separators, or
//! placeholder text. Each cast returns `None` on anything unparseable; row
//! policy (drop the row vs. null the field) is decided by the builder per
//! dataset.

/// Parse a year column. `None` drops the whole row.
pub fn parse_year(raw: &str) -> Option<i32> {
  raw.trim().parse().ok()
}

/// Parse a people-count column. Tolerates `1,234` style separators.
pub fn parse_count(raw: &str) -> Option<i64> {
  let cleaned: String =
    raw.trim().chars().filter(|c| *c != ',').collect();
  if cleaned.is_empty() {
    return None;
  }
  cleaned.parse().ok()
}
