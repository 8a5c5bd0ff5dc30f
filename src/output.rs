use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown table of at most `max_rows` rows, or `(no rows)`.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    let mut out = Table::new(slice).with(Style::markdown()).to_string();
    if rows.len() > max_rows {
        out.push_str(&format!("\n({} more rows)", rows.len() - max_rows));
    }
    out
}

/// Same as `render_table` but keeps the last `max_rows`, for time series
/// where the recent end matters most.
pub fn render_tail<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let skip = rows.len().saturating_sub(max_rows);
    let slice: Vec<T> = rows[skip..].to_vec();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    let mut out = String::new();
    if skip > 0 {
        out.push_str(&format!("({} earlier rows)\n", skip));
    }
    out.push_str(&Table::new(slice).with(Style::markdown()).to_string());
    out
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataTableRow;

    fn rows(n: usize) -> Vec<DataTableRow> {
        (0..n)
            .map(|i| DataTableRow {
                date: format!("2020-{:02}-01", i + 1),
                index: 100.0 + i as f64,
                inflation_yoy: None,
            })
            .collect()
    }

    #[test]
    fn empty_tables_say_so() {
        assert_eq!(render_table::<DataTableRow>(&[], 5), "(no rows)");
        assert_eq!(render_tail::<DataTableRow>(&[], 5), "(no rows)");
    }

    #[test]
    fn head_and_tail_truncate() {
        let data = rows(6);
        let head = render_table(&data, 2);
        assert!(head.contains("2020-01-01"));
        assert!(!head.contains("2020-03-01"));
        assert!(head.ends_with("(4 more rows)"));

        let tail = render_tail(&data, 2);
        assert!(tail.starts_with("(4 earlier rows)"));
        assert!(tail.contains("2020-06-01"));
        assert!(!tail.contains("2020-04-01"));
    }

    #[test]
    fn exports_data_table_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        write_csv(&path, &rows(2)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "date,index,inflation_yoy\n2020-01-01,100.0,\n2020-02-01,101.0,\n"
        );
    }

    #[test]
    fn export_keeps_full_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("precise.csv");
        let row = DataTableRow {
            date: "2021-01-01".to_string(),
            index: 123.456,
            inflation_yoy: Some(1.23456),
        };
        write_csv(&path, &[row.clone()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("2021-01-01,123.456,1.23456\n"));

        let rendered = render_table(&[row], 1);
        assert!(rendered.contains("123.5"));
        assert!(rendered.contains("1.23"));
        assert!(!rendered.contains("1.23456"));
    }

    #[test]
    fn exports_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({ "total_regions": 2 })).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"total_regions\": 2"));
    }
}
