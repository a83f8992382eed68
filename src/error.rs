use crate::collector::error::CollectError;
use crate::metar::error::MalformedReportError;
use crate::stats::error::StatsError;
use crate::store::error::StorageError;
use thiserror::Error;

/// Umbrella error for the crate's public surface; each module keeps its own
/// error type and this one wraps them transparently.
#[derive(Debug, Error)]
pub enum MetarScanError {
    #[error(transparent)]
    MalformedReport(#[from] MalformedReportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Collect(#[from] CollectError),
}
