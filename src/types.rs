use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One CSV record as published. Everything is kept as text so the loader
/// can report exactly which field failed to parse.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "date")]
    pub date: Option<String>,
    #[serde(rename = "state")]
    pub state: Option<String>,
    #[serde(rename = "division")]
    pub division: Option<String>,
    #[serde(rename = "index")]
    pub index: Option<String>,
}

/// Columns the loader refuses to work without.
pub const REQUIRED_COLUMNS: [&str; 4] = ["date", "state", "division", "index"];

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub region: String,
    pub date: NaiveDate,
    pub category: String,
    pub index: f64,
}

/// An observation enriched with its year-over-year change.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub region: String,
    pub date: NaiveDate,
    pub category: String,
    pub index: f64,
    pub inflation_yoy: Option<f64>,
}

/// Normalized, annotated table. Rows are sorted by `(region, date)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    pub rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Sorted, de-duplicated region names.
    pub fn regions(&self) -> Vec<String> {
        // rows are already ordered by region, so dedup on adjacent values is enough
        let mut out: Vec<String> = self.rows.iter().map(|r| r.region.clone()).collect();
        out.dedup();
        out
    }

    /// Earliest and latest date in the table, the default filter interval.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.date).min()?;
        let max = self.rows.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// A single point on one of the trend charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One line of the data table. Values stay at full precision so the CSV
/// export keeps them; rounding happens only when rendered.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DataTableRow {
    #[serde(rename = "date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "index")]
    #[tabled(rename = "Index", display_with = "display_index")]
    pub index: f64,
    #[serde(rename = "inflation_yoy")]
    #[tabled(rename = "InflationYoY", display_with = "display_inflation")]
    pub inflation_yoy: Option<f64>,
}

fn display_index(v: &f64) -> String {
    format!("{:.1}", v)
}

fn display_inflation(v: &Option<f64>) -> String {
    v.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

#[derive(Debug, Tabled, Clone)]
pub struct TrendRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct RankingRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "InflationYoY")]
    pub inflation_yoy: String,
    #[tabled(rename = "")]
    pub bar: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryStats {
    pub total_regions: usize,
    pub total_observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub highest_latest_inflation: Option<RegionInflation>,
    pub lowest_latest_inflation: Option<RegionInflation>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RegionInflation {
    pub region: String,
    pub date: NaiveDate,
    pub inflation_yoy: f64,
}
