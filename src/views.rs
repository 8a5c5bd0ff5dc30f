use crate::error::{DashboardError, Result};
use crate::types::{
    DataTableRow, RankingRow, RegionInflation, SeriesPoint, SeriesRow, SeriesTable, SummaryStats,
    TrendRow,
};
use crate::util::{format_number, format_pct};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const BAR_WIDTH: usize = 30;

/// Rows for `region` with `start <= date <= end`, in ascending date order.
///
/// An unknown region or a reversed interval simply yields nothing.
pub fn filter_view(
    table: &SeriesTable,
    region: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<SeriesRow> {
    let mut rows: Vec<SeriesRow> = table
        .rows
        .iter()
        .filter(|r| r.region == region && r.date >= start && r.date <= end)
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}

/// Chronologically last row for `region` that has an inflation value.
///
/// Works on any slice, so it serves both the whole table and a filtered view.
pub fn latest_for(rows: &[SeriesRow], region: &str) -> Result<SeriesRow> {
    rows.iter()
        .filter(|r| r.region == region && r.inflation_yoy.is_some())
        .fold(None, |best: Option<&SeriesRow>, r| match best {
            Some(b) if b.date > r.date => Some(b),
            _ => Some(r),
        })
        .cloned()
        .ok_or_else(|| {
            DashboardError::Empty(format!("no inflation figure available for {}", region))
        })
}

/// Latest defined inflation row per region, ordered by `inflation_yoy`
/// ascending with ties broken by region name.
pub fn latest_all(rows: &[SeriesRow]) -> Vec<SeriesRow> {
    let mut last: BTreeMap<&str, &SeriesRow> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.inflation_yoy.is_some()) {
        match last.get(r.region.as_str()) {
            Some(prev) if prev.date > r.date => {}
            _ => {
                last.insert(r.region.as_str(), r);
            }
        }
    }

    let mut out: Vec<SeriesRow> = last.into_values().cloned().collect();
    out.sort_by(|a, b| {
        a.inflation_yoy
            .partial_cmp(&b.inflation_yoy)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    out
}

/// CPI trend: one point per row.
pub fn cpi_series(rows: &[SeriesRow]) -> Vec<SeriesPoint> {
    rows.iter()
        .map(|r| SeriesPoint {
            date: r.date,
            value: r.index,
        })
        .collect()
}

/// Inflation trend: rows without a value are left out.
pub fn inflation_series(rows: &[SeriesRow]) -> Vec<SeriesPoint> {
    rows.iter()
        .filter_map(|r| {
            r.inflation_yoy.map(|value| SeriesPoint {
                date: r.date,
                value,
            })
        })
        .collect()
}

pub fn trend_rows(points: &[SeriesPoint], decimals: usize) -> Vec<TrendRow> {
    points
        .iter()
        .map(|p| TrendRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            value: format_number(p.value, decimals),
        })
        .collect()
}

pub fn data_table(rows: &[SeriesRow]) -> Vec<DataTableRow> {
    rows.iter()
        .map(|r| DataTableRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            index: r.index,
            inflation_yoy: r.inflation_yoy,
        })
        .collect()
}

/// Render the cross-region comparison, highest inflation first (ties in
/// region-name order), with a bar scaled to the largest absolute value.
pub fn ranking_rows(latest: &[SeriesRow]) -> Vec<RankingRow> {
    let mut ordered: Vec<&SeriesRow> = latest.iter().collect();
    ordered.sort_by(|a, b| {
        b.inflation_yoy
            .partial_cmp(&a.inflation_yoy)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });

    let max_abs = latest
        .iter()
        .filter_map(|r| r.inflation_yoy)
        .fold(0.0_f64, |m, v| m.max(v.abs()));

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, r)| {
            let v = r.inflation_yoy.unwrap_or(0.0);
            let len = if max_abs > 0.0 {
                ((v.abs() / max_abs) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let glyph = if v < 0.0 { "-" } else { "#" };
            RankingRow {
                rank: idx + 1,
                region: r.region.clone(),
                date: r.date.format("%Y-%m").to_string(),
                inflation_yoy: format_pct(r.inflation_yoy),
                bar: glyph.repeat(len),
            }
        })
        .collect()
}

pub fn generate_summary(table: &SeriesTable) -> SummaryStats {
    let bounds = table.date_bounds();
    let latest = latest_all(&table.rows);
    let to_region = |r: &SeriesRow| {
        r.inflation_yoy.map(|v| RegionInflation {
            region: r.region.clone(),
            date: r.date,
            inflation_yoy: v,
        })
    };
    SummaryStats {
        total_regions: table.regions().len(),
        total_observations: table.len(),
        first_date: bounds.map(|b| b.0),
        last_date: bounds.map(|b| b.1),
        highest_latest_inflation: latest.last().and_then(to_region),
        lowest_latest_inflation: latest.first().and_then(to_region),
    }
}
