use std::path::PathBuf;

use crate::error::ImportError;

pub const DATABASE_VAR: &str = "BIBLE_SQL_DATABASE";
pub const JOURNAL_MODE_VAR: &str = "BIBLE_SQL_JOURNAL_MODE";

const DEFAULT_JOURNAL_MODE: &str = "WAL";

/// Backend connection settings. Read from the environment only, never from
/// command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub journal_mode: String,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, ImportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(DATABASE_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ImportError::Config(format!("{DATABASE_VAR} is not set")))?;

        let journal_mode = lookup(JOURNAL_MODE_VAR)
            .map(|value| value.trim().to_uppercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_JOURNAL_MODE.to_string());

        Ok(Self {
            path: PathBuf::from(path),
            journal_mode,
        })
    }
}
