//! Error types for extraction

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, reporting, or writing tables
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open {label} file {}", path.display())]
    Open {
        label: String,
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("{label} file {} contains no worksheets", path.display())]
    NoSheets { label: String, path: PathBuf },

    #[error("sheet '{sheet}' not found in {label} file {}", path.display())]
    SheetNotFound {
        label: String,
        path: PathBuf,
        sheet: String,
    },

    #[error("cannot read sheet '{sheet}' of {label} file {}", path.display())]
    Sheet {
        label: String,
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("cannot write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("verification of {} failed: {reason}", path.display())]
    Verify { path: PathBuf, reason: String },

    #[error("cannot read config file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot write to console")]
    Console(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether this error happened while locating, opening, or decoding an input
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            ExtractError::Open { .. }
                | ExtractError::NoSheets { .. }
                | ExtractError::SheetNotFound { .. }
                | ExtractError::Sheet { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
