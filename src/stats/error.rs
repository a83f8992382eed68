use crate::store::error::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The requested window holds no observations at all. A window that has
    /// observations but misses a particular metric everywhere is not an
    /// error; that metric's summary is simply absent.
    #[error("no observations for station '{station}' in the requested window")]
    NoData { station: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
