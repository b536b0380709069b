use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::config::DatabaseSettings;

const TABLES: [&str; 5] = ["translations", "books", "chapters", "verses", "cross_references"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    pub code: String,
    pub category: String,
    pub books: i64,
    pub verses: i64,
}

pub fn run() -> Result<()> {
    let settings = DatabaseSettings::from_env().context("database configuration is incomplete")?;
    if !settings.path.exists() {
        warn!(path = %settings.path.display(), "database file missing");
        return Ok(());
    }

    let conn = open_for_status(&settings.path)?;
    info!(path = %settings.path.display(), "status requested");

    for table in TABLES {
        match query_count(&conn, table) {
            Ok(rows) => info!(table, rows, "table rows"),
            Err(err) => warn!(table, error = %err, "table unavailable"),
        }
    }

    match translation_summaries(&conn) {
        Ok(summaries) => {
            for summary in summaries {
                info!(
                    translation = %summary.code,
                    category = %summary.category,
                    books = summary.books,
                    verses = summary.verses,
                    "translation status"
                );
            }
        }
        Err(err) => warn!(error = %err, "translation summary unavailable"),
    }

    Ok(())
}

/// Read-only connection; the database's journal mode is left as it is.
fn open_for_status(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open {}", path.display()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

fn query_count(conn: &Connection, table: &str) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

pub fn translation_summaries(conn: &Connection) -> Result<Vec<TranslationSummary>> {
    let mut statement = conn.prepare(
        "
        SELECT t.code, t.category, COUNT(DISTINCT b.id), COUNT(v.id)
        FROM translations t
        LEFT JOIN books b ON b.translation_id = t.id
        LEFT JOIN chapters c ON c.book_id = b.id
        LEFT JOIN verses v ON v.chapter_id = c.id
        GROUP BY t.id
        ORDER BY t.category, t.code
        ",
    )?;

    let summaries = statement
        .query_map([], |row| {
            Ok(TranslationSummary {
                code: row.get(0)?,
                category: row.get(1)?,
                books: row.get(2)?,
                verses: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(summaries)
}
