//! SQL schema for the aggregated SQLite file.
//!
//! Executed against a fresh temp file on every builder run; the file is
//! replaced wholesale, never migrated. All four tables always exist — a
//! dataset whose source was unavailable is simply empty, which downstream
//! queries surface as "no data".
//!
//! Journal mode stays at the rollback default (no WAL): the file must be
//! byte-identical across builds from identical input, and it is strictly
//! read-only at serve time.

/// Full schema DDL for the four derived datasets.
pub const SCHEMA: &str = "
-- Annual countywide PIT totals. Metrics are nullable: the builder nulls a
-- metric it cannot cast while keeping the row.
CREATE TABLE pit_trends (
    year        INTEGER PRIMARY KEY,
    total       INTEGER,
    sheltered   INTEGER,
    unsheltered INTEGER
);

-- Demographic subgroup counts per year.
CREATE TABLE pit_subpopulations (
    year       INTEGER NOT NULL,
    group_name TEXT    NOT NULL,
    count      INTEGER NOT NULL,
    PRIMARY KEY (year, group_name)
);

-- Subregional PIT counts per year.
CREATE TABLE pit_geography (
    year        INTEGER NOT NULL,
    region      TEXT    NOT NULL,
    total       INTEGER,
    sheltered   INTEGER,
    unsheltered INTEGER,
    PRIMARY KEY (year, region)
);

-- Adopted-budget expense for the homelessness department per fiscal year.
CREATE TABLE homelessness_spending (
    fiscal_year INTEGER PRIMARY KEY,
    amount      REAL NOT NULL
);
";
