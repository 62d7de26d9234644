use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("invalid inventory configuration: {0}")]
    Config(String),

    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing YAML configuration {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("reading CSV row {row} of {path:?}: {source}")]
    Csv {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row} of {path:?} is not valid {encoding}")]
    Encoding {
        path: PathBuf,
        row: usize,
        encoding: &'static str,
    },

    #[error("column '{column}' appears more than once in the header of {path:?}")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("required column '{column}' is missing from the header of {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("invalid host range '{pattern}': {reason}")]
    RangeSyntax { pattern: String, reason: String },

    #[error("host '{host}': {reason}")]
    Resolution { host: String, reason: String },

    #[error("adding group '{child}' to '{parent}' would create a group cycle")]
    GroupCycle { parent: String, child: String },

    #[error("evaluating '{expression}': {message}")]
    Expression { expression: String, message: String },
}

impl InventoryError {
    pub(crate) fn range(pattern: &str, reason: impl Into<String>) -> Self {
        InventoryError::RangeSyntax {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;
