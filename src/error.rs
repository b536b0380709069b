use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("constraint violation: {0}")]
    Constraint(#[source] rusqlite::Error),

    #[error("database error: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("{row} row has no enclosing {parent}")]
    RowOrder {
        row: &'static str,
        parent: &'static str,
    },

    #[error("row shape mismatch for {table}: expected {expected} values, got {actual}")]
    RowShape {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ImportError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            Self::Constraint(err)
        } else {
            Self::Connection(err)
        }
    }
}
