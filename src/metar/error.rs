use thiserror::Error;

/// Raised when a raw report cannot be decoded at all.
///
/// Only the mandatory station and time groups can fail a report wholesale;
/// every other group decodes independently and falls back to an absent value
/// on mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReportError {
    #[error("report is empty")]
    EmptyReport,

    #[error("missing or invalid station code in report '{report}'")]
    InvalidStation { report: String },

    #[error("missing or invalid observation time in report for station '{station}'")]
    InvalidTime { station: String },
}
