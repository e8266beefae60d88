//! Common error types for chipdb

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for chipdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the chipdb crates
#[derive(Error, Debug)]
pub enum Error {
    /// The persisted component store cannot be opened, created, reset, written or read
    #[error("Component store unavailable ({context}): {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Record rejected before reaching the store
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Input source file cannot be opened or read
    #[error("Unable to read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an sqlx error as `StoreUnavailable` with a short description of the attempted operation
    pub fn store(context: impl Into<String>, source: sqlx::Error) -> Self {
        Error::StoreUnavailable {
            context: context.into(),
            source,
        }
    }

    /// True for the transient SQLite busy/locked condition raised when another
    /// process holds the write lock longer than the busy timeout.
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::StoreUnavailable { source, .. } => {
                let message = source.to_string();
                message.contains("database is locked") || message.contains("database is busy")
            }
            _ => false,
        }
    }
}
