// Entry point and interactive console flow.
//
// The console stands in for a dashboard page:
// - Option [1] downloads the CPI file (bypassing the cache) and rebuilds the table.
// - Options [2] and [3] set the region and date-range filters.
// - Option [4] renders the headline figure, both trend series, the
//   cross-region comparison and the data table.
// - Options [5] and [6] export the data table and a JSON summary.
mod cache;
mod config;
mod error;
mod fetch;
mod inflation;
mod loader;
mod output;
mod types;
mod util;
mod views;

use cache::DataCache;
use chrono::NaiveDate;
use config::Config;
use error::DashboardError;
use fetch::{HttpSource, Source};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use types::SeriesTable;

const TREND_PREVIEW_ROWS: usize = 12;
const DATA_PREVIEW_ROWS: usize = 24;

/// Everything one interactive session owns. Handlers borrow it mutably
/// instead of reaching for global state.
struct Session {
    source: Box<dyn Source>,
    cache: DataCache,
    region: Option<String>,
    range: Option<(NaiveDate, NaiveDate)>,
}

/// Print `prompt` and read one trimmed line. `None` means stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Cached table if fresh, otherwise a new load. When loading fails the
/// previously loaded table, if any, is still returned.
fn table_for_view(session: &mut Session, force: bool) -> Option<Arc<SeriesTable>> {
    match session.cache.get(session.source.as_ref(), force) {
        Ok(table) => Some(table),
        Err(e) => {
            println!("Error: {}", e);
            let previous = session.cache.current();
            if previous.is_some() {
                println!("Showing previously loaded data.");
            } else {
                println!("No data available. Use option [1] to retry.");
            }
            previous
        }
    }
}

/// Force a reload and describe what was loaded. Errors leave the cache's
/// previous table in place.
fn refresh(cache: &mut DataCache, source: &dyn Source) -> error::Result<String> {
    let table = cache.get(source, true)?;
    let mut msg = match cache.last_report() {
        Some(report) => format!(
            "Processing dataset... ({} rows read, {} overall rows kept across {} regions)",
            util::format_int(report.total_rows),
            util::format_int(report.kept_rows),
            report.regions
        ),
        None => String::new(),
    };
    if table.is_empty() {
        msg.push_str("\nThe dataset contains no overall rows.");
    }
    Ok(msg)
}

/// Handle option [1]: download and rebuild, ignoring the cache.
fn handle_refresh(session: &mut Session) {
    println!("Downloading {} ...", session.source.location());
    match refresh(&mut session.cache, session.source.as_ref()) {
        Ok(msg) => println!("{}", msg),
        Err(e) => {
            println!("Error: {}", e);
            if session.cache.current().is_some() {
                println!("Previously loaded data is still available.");
            } else {
                println!("No data available. Use option [1] to retry.");
            }
        }
    }
    println!();
}

/// Handle option [2]: pick a region by number or by name.
fn handle_select_region(session: &mut Session) {
    let Some(table) = table_for_view(session, false) else {
        return;
    };
    let regions = table.regions();
    if regions.is_empty() {
        println!("The dataset has no regions.\n");
        return;
    }
    for (i, r) in regions.iter().enumerate() {
        println!("[{}] {}", i + 1, r);
    }
    let Some(choice) = read_line("Select region: ") else {
        return;
    };
    let picked = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| regions.get(i).cloned())
        .or_else(|| {
            regions
                .iter()
                .find(|r| r.eq_ignore_ascii_case(&choice))
                .cloned()
        });
    match picked {
        Some(region) => {
            println!("Region set to {}.\n", region);
            session.region = Some(region);
        }
        None => println!("Invalid choice.\n"),
    }
}

/// Handle option [3]: read two dates; blank input keeps the data's own bound.
fn handle_select_range(session: &mut Session) {
    let Some(table) = table_for_view(session, false) else {
        return;
    };
    let Some((min, max)) = table.date_bounds() else {
        println!("The dataset is empty.\n");
        return;
    };
    println!("Data covers {} to {}.", min, max);

    let read_bound = |label: &str, default: NaiveDate| -> Option<NaiveDate> {
        let input = read_line(&format!("{} date (YYYY-MM-DD, blank for {}): ", label, default))?;
        if input.is_empty() {
            return Some(default);
        }
        let parsed = util::parse_date_safe(Some(&input));
        if parsed.is_none() {
            println!("Invalid date: {}", input);
        }
        parsed
    };
    let Some(start) = read_bound("Start", min) else {
        println!();
        return;
    };
    let Some(end) = read_bound("End", max) else {
        println!();
        return;
    };
    println!("Date range set to {} .. {}.\n", start, end);
    session.range = Some((start, end));
}

/// Handle option [4]: render every view for the current filters.
fn handle_dashboard(session: &mut Session) {
    let Some(table) = table_for_view(session, false) else {
        return;
    };
    let Some(region) = session
        .region
        .clone()
        .or_else(|| table.regions().into_iter().next())
    else {
        println!("The dataset is empty.\n");
        return;
    };
    let Some((start, end)) = session.range.or_else(|| table.date_bounds()) else {
        println!("The dataset is empty.\n");
        return;
    };

    println!("Malaysia Cost of Living & Inflation Dashboard");
    if let Some(at) = session.cache.last_updated() {
        println!("Last Updated: {}", at.format("%d %B %Y, %H:%M"));
    }
    println!("Region: {}   Range: {} .. {}\n", region, start, end);

    let rows = views::filter_view(&table, &region, start, end);

    match views::latest_for(&rows, &region) {
        Ok(latest) => println!(
            "Latest Inflation Rate in {} (YoY): {} ({})\n",
            region,
            util::format_pct(latest.inflation_yoy),
            latest.date.format("%b %Y")
        ),
        Err(DashboardError::Empty(_)) => println!(
            "Latest Inflation Rate in {} (YoY): insufficient data for the selected range\n",
            region
        ),
        Err(e) => println!("Error: {}\n", e),
    }

    println!("CPI Trend Over Time ({})", region);
    let cpi = views::trend_rows(&views::cpi_series(&rows), 1);
    println!("{}\n", output::render_tail(&cpi, TREND_PREVIEW_ROWS));

    println!("Inflation Rate Trend (Year-on-Year %) ({})", region);
    let infl = views::trend_rows(&views::inflation_series(&rows), 2);
    println!("{}\n", output::render_tail(&infl, TREND_PREVIEW_ROWS));

    let ranking = views::ranking_rows(&views::latest_all(&table.rows));
    output::preview_table(
        "Latest Inflation Comparison Across Regions",
        Some("latest month with a year-over-year figure"),
        &ranking,
        ranking.len(),
    );

    println!("Data Table ({})", region);
    let data = views::data_table(&rows);
    println!("{}\n", output::render_tail(&data, DATA_PREVIEW_ROWS));
}

/// Handle option [5]: write the filtered data table to CSV.
fn handle_export(session: &mut Session) {
    let Some(table) = table_for_view(session, false) else {
        return;
    };
    let Some(region) = session.region.clone() else {
        println!("Select a region first (option 2).\n");
        return;
    };
    let Some((start, end)) = session.range.or_else(|| table.date_bounds()) else {
        return;
    };
    let rows = views::data_table(&views::filter_view(&table, &region, start, end));
    let file = format!("cpi_{}.csv", region.to_lowercase().replace(' ', "_"));
    match output::write_csv(&file, &rows) {
        Ok(()) => println!(
            "Exported {} rows to {}\n",
            util::format_int(rows.len()),
            file
        ),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

/// Handle option [6]: whole-table summary as JSON.
fn handle_summary(session: &mut Session) {
    let Some(table) = table_for_view(session, false) else {
        return;
    };
    let summary = views::generate_summary(&table);
    let file = "summary.json";
    if let Err(e) = output::write_json(file, &summary) {
        eprintln!("Write error: {}", e);
        return;
    }
    println!(
        "Summary ({}): {} regions, {} observations",
        file,
        summary.total_regions,
        util::format_int(summary.total_observations)
    );
    if let Some(high) = &summary.highest_latest_inflation {
        println!(
            "Highest latest inflation: {} at {}",
            high.region,
            util::format_pct(Some(high.inflation_yoy))
        );
    }
    println!();
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();

    let config = Config::from_env();
    info!(?config, "startup");
    let source = match HttpSource::new(config.source_url.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let mut session = Session {
        source: Box::new(source),
        cache: DataCache::new(config.cache_ttl),
        region: None,
        range: None,
    };

    loop {
        println!("CPI Dashboard Controls:");
        println!("[1] Load / refresh data");
        println!("[2] Select region");
        println!("[3] Select date range");
        println!("[4] Show dashboard");
        println!("[5] Export data table");
        println!("[6] Write summary");
        println!("[0] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        println!();
        match choice.as_str() {
            "1" => handle_refresh(&mut session),
            "2" => handle_select_region(&mut session),
            "3" => handle_select_range(&mut session),
            "4" => handle_dashboard(&mut session),
            "5" => handle_export(&mut session),
            "6" => handle_summary(&mut session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-6.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Hands out one canned response per fetch, then fails.
    struct Canned(RefCell<Vec<error::Result<Vec<u8>>>>);

    impl Source for Canned {
        fn fetch(&self) -> error::Result<Vec<u8>> {
            self.0
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(DashboardError::Fetch("no more responses".into())))
        }

        fn location(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn refresh_reports_only_the_load_that_succeeded() {
        let body = b"date,state,division,index\n2020-01-01,Kedah,overall,100\n".to_vec();
        let source = Canned(RefCell::new(vec![
            Err(DashboardError::Fetch("HTTP 500".into())),
            Ok(body),
        ]));
        let mut cache = DataCache::new(Duration::from_secs(300));

        let msg = refresh(&mut cache, &source).unwrap();
        assert!(msg.contains("1 rows read"));

        let err = refresh(&mut cache, &source).unwrap_err();
        assert!(matches!(err, DashboardError::Fetch(_)));
        assert!(cache.current().is_some());
    }

    #[test]
    fn refresh_flags_a_table_without_overall_rows() {
        let body = b"date,state,division,index\n2020-01-01,Kedah,01,100\n".to_vec();
        let source = Canned(RefCell::new(vec![Ok(body)]));
        let mut cache = DataCache::new(Duration::from_secs(300));
        let msg = refresh(&mut cache, &source).unwrap();
        assert!(msg.ends_with("The dataset contains no overall rows."));
    }
}
