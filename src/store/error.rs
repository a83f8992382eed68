use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open database at '{0}'")]
    Open(PathBuf, #[source] rusqlite::Error),

    #[error("failed to create database directory '{0}'")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("database operation failed")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode sky layers for station '{station}'")]
    SkyEncode {
        station: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("store lock poisoned by a panicked writer")]
    LockPoisoned,
}
