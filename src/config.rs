use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SOURCE_URL: &str = "https://storage.dosm.gov.my/cpi/cpi_2d_state.csv";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source_url: String,
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl Config {
    /// Defaults, overridden by `CPI_SOURCE_URL` and `CPI_CACHE_TTL_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config::default();
        if let Some(url) = lookup("CPI_SOURCE_URL").filter(|u| !u.trim().is_empty()) {
            cfg.source_url = url.trim().to_string();
        }
        if let Some(raw) = lookup("CPI_CACHE_TTL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => cfg.cache_ttl = Duration::from_secs(secs),
                Err(_) => warn!(value = %raw, "ignoring invalid CPI_CACHE_TTL_SECS"),
            }
        }
        cfg
    }
}
