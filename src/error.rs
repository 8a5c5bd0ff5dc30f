use thiserror::Error;

/// Everything that can go wrong between the source CSV and a rendered view.
///
/// All variants are recoverable: the console front-end prints them and keeps
/// the menu alive.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("failed to fetch source data: {0}")]
    Fetch(String),

    #[error("malformed source data: {0}")]
    Parse(String),

    #[error("insufficient data: {0}")]
    Empty(String),
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Fetch(e.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
