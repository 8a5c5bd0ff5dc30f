// Owned cache for the loaded table.
//
// The front-end keeps one `DataCache` in its session and hands it to every
// handler. A successful load swaps in a new `Arc<SeriesTable>`; readers that
// still hold the old `Arc` keep a valid table.
use crate::error::Result;
use crate::fetch::Source;
use crate::loader::{build_table, LoadReport};
use crate::types::SeriesTable;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct DataCache {
    ttl: Duration,
    table: Option<Arc<SeriesTable>>,
    loaded_at: Option<Instant>,
    last_updated: Option<DateTime<Local>>,
    last_report: Option<LoadReport>,
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        DataCache {
            ttl,
            table: None,
            loaded_at: None,
            last_updated: None,
            last_report: None,
        }
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        match (self.loaded_at, &self.table) {
            (Some(at), Some(_)) => now.saturating_duration_since(at) < self.ttl,
            _ => false,
        }
    }

    /// Last successfully loaded table, fresh or not.
    pub fn current(&self) -> Option<Arc<SeriesTable>> {
        self.table.clone()
    }

    /// Wall-clock time of the last successful load.
    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }

    /// Drop freshness so the next `get` goes back to the source. The table
    /// itself stays available through `current`.
    pub fn invalidate(&mut self) {
        self.loaded_at = None;
    }

    /// Return the cached table while it is fresh, otherwise fetch and rebuild.
    ///
    /// `force` invalidates first. On failure the previous table is kept and
    /// the error is returned; nothing retries automatically.
    pub fn get(&mut self, source: &dyn Source, force: bool) -> Result<Arc<SeriesTable>> {
        self.get_at(Instant::now(), source, force)
    }

    pub fn get_at(
        &mut self,
        now: Instant,
        source: &dyn Source,
        force: bool,
    ) -> Result<Arc<SeriesTable>> {
        if force {
            debug!("forced refresh, invalidating cache");
            self.invalidate();
        }
        if self.is_fresh(now) {
            if let Some(table) = &self.table {
                debug!("serving cached table");
                return Ok(Arc::clone(table));
            }
        }

        info!(source = source.location(), "loading CPI table");
        let loaded = source.fetch().and_then(|raw| build_table(&raw));
        match loaded {
            Ok((table, report)) => {
                let table = Arc::new(table);
                self.table = Some(Arc::clone(&table));
                self.loaded_at = Some(now);
                self.last_updated = Some(Local::now());
                self.last_report = Some(report);
                Ok(table)
            }
            Err(e) => {
                warn!(error = %e, kept_previous = self.table.is_some(), "refresh failed");
                Err(e)
            }
        }
    }
}
