use std::time::Duration;
use thiserror::Error;

/// Failure to obtain the station list; this is the only error that aborts a
/// whole collector run, since without a station list there is nothing to do.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode station list from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to fetch one station's raw report. Always local to that station:
/// the collector records it and moves on.
#[derive(Debug, Error)]
pub enum FetchReportError {
    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read report body from {0}")]
    Body(String, #[source] reqwest::Error),

    #[error("empty report body for station '{station}'")]
    EmptyBody { station: String },

    #[error("fetching report for station '{station}' timed out after {timeout:?}")]
    Timeout { station: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
