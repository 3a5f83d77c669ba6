use std::path::PathBuf;

use thiserror::Error;

use crate::types::LinkHash;

/// Main error type for string store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid store path: {}", path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("String store is not initialized")]
    NotInitialized,

    #[error("No string linked to {0}")]
    NoString(LinkHash),

    #[error("Read error ({context}): {source}")]
    Read {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Write error ({context}): {source}")]
    Write {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for string store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn read(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Read {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn write(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Write {
            context: context.into(),
            source,
        }
    }

    /// Short or corrupt reads count as read errors
    pub fn is_read_error(&self) -> bool {
        matches!(self, StoreError::Read { .. } | StoreError::Corrupt(_))
    }

    pub fn is_write_error(&self) -> bool {
        matches!(self, StoreError::Write { .. })
    }

    /// `NoString` is an expected outcome for identifiers that were never linked
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NoString(_))
    }
}
