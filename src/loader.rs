use crate::error::{DashboardError, Result};
use crate::inflation::annotate;
use crate::types::{Observation, RawRow, SeriesTable, REQUIRED_COLUMNS};
use crate::util::{parse_date_safe, parse_f64_safe};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use tracing::{debug, info};

/// The only category the dashboard reports on.
pub const OVERALL_CATEGORY: &str = "overall";

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub regions: usize,
}

/// Parse the raw CSV bytes, keep the `overall` category and sort by
/// `(region, date)`.
///
/// Dates are validated on every row, mirroring a whole-column conversion;
/// the index is only parsed for rows that survive the category filter.
/// Rows sharing a `(region, date)` keep their input order.
pub fn normalize(raw: &[u8]) -> Result<(Vec<Observation>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(raw);

    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::Parse(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut total_rows = 0usize;
    let mut kept: Vec<Observation> = Vec::new();

    for (i, result) in rdr.deserialize::<RawRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        total_rows += 1;
        let row = result.map_err(|e| DashboardError::Parse(format!("line {}: {}", line, e)))?;

        let date = parse_date_safe(row.date.as_deref()).ok_or_else(|| {
            DashboardError::Parse(format!("line {}: invalid date {:?}", line, row.date))
        })?;

        let category = row.division.unwrap_or_default().trim().to_string();
        if category != OVERALL_CATEGORY {
            continue;
        }

        let region = row.state.unwrap_or_default().trim().to_string();
        if region.is_empty() {
            return Err(DashboardError::Parse(format!("line {}: empty state", line)));
        }

        let index = parse_f64_safe(row.index.as_deref()).ok_or_else(|| {
            DashboardError::Parse(format!("line {}: invalid index {:?}", line, row.index))
        })?;

        kept.push(Observation {
            region,
            date,
            category,
            index,
        });
    }

    // `sort_by` is stable, so duplicate (region, date) rows keep input order.
    kept.sort_by(|a, b| a.region.cmp(&b.region).then(a.date.cmp(&b.date)));

    let regions: HashSet<&str> = kept.iter().map(|o| o.region.as_str()).collect();
    let report = LoadReport {
        total_rows,
        kept_rows: kept.len(),
        regions: regions.len(),
    };
    debug!(?report, "normalized source rows");
    info!(
        total = report.total_rows,
        kept = report.kept_rows,
        regions = report.regions,
        "loaded CPI observations"
    );
    Ok((kept, report))
}

/// Normalize and annotate in one go: raw bytes to the finished table.
pub fn build_table(raw: &[u8]) -> Result<(SeriesTable, LoadReport)> {
    let (observations, report) = normalize(raw)?;
    Ok((annotate(observations), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn keeps_overall_rows_sorted_by_region_then_date() {
        let csv = "\
state,date,division,index
Selangor,2020-02-01,overall,101.0
Johor,2020-01-01,overall,99.5
Selangor,2020-01-01,overall,100.0
Selangor,2020-01-01,01,140.2
Johor,2020-02-01,overall,99.9
";
        let (rows, report) = normalize(csv.as_bytes()).unwrap();
        assert_eq!(
            report,
            LoadReport {
                total_rows: 5,
                kept_rows: 4,
                regions: 2
            }
        );
        let keys: Vec<(&str, NaiveDate)> =
            rows.iter().map(|o| (o.region.as_str(), o.date)).collect();
        assert_eq!(
            keys,
            vec![
                ("Johor", d(2020, 1)),
                ("Johor", d(2020, 2)),
                ("Selangor", d(2020, 1)),
                ("Selangor", d(2020, 2)),
            ]
        );
        assert!(rows.iter().all(|o| o.category == OVERALL_CATEGORY));
    }

    #[test]
    fn ignores_extra_columns() {
        let csv = "date,state,division,index,source\n2021-05-01,Perak,overall,120.5,dosm\n";
        let (rows, _) = normalize(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 120.5);
    }

    #[test]
    fn accepts_exponent_form_index() {
        let csv = "date,state,division,index\n2020-01-01,Kedah,overall,1.005e2\n";
        let (rows, _) = normalize(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].index - 100.5).abs() < 1e-9);
    }

    #[test]
    fn padded_header_names_still_match() {
        let csv = "date, state ,division,index\n2020-01-01,Kedah,overall,100\n";
        let (rows, report) = normalize(csv.as_bytes()).unwrap();
        assert_eq!(report.kept_rows, 1);
        assert_eq!(rows[0].region, "Kedah");
    }

    #[test]
    fn duplicate_dates_keep_input_order() {
        let csv = "\
date,state,division,index
2020-01-01,Kedah,overall,1.0
2020-01-01,Kedah,overall,2.0
";
        let (rows, _) = normalize(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].index, 1.0);
        assert_eq!(rows[1].index, 2.0);
    }

    #[test]
    fn missing_column_is_a_parse_error() {
        let csv = "date,state,index\n2020-01-01,Kedah,100\n";
        let err = normalize(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Parse(ref m) if m.contains("division")));
    }

    #[test]
    fn bad_date_is_a_parse_error_even_outside_overall() {
        let csv = "date,state,division,index\nJan 2020,Kedah,01,100\n";
        assert!(matches!(
            normalize(csv.as_bytes()),
            Err(DashboardError::Parse(_))
        ));
    }

    #[test]
    fn bad_index_is_a_parse_error() {
        let csv = "date,state,division,index\n2020-01-01,Kedah,overall,abc\n";
        let err = normalize(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Parse(ref m) if m.contains("line 2")));
    }

    #[test]
    fn header_only_yields_empty_table() {
        let (rows, report) = normalize(b"date,state,division,index\n").unwrap();
        assert!(rows.is_empty());
        assert_eq!(report.total_rows, 0);
    }
}
