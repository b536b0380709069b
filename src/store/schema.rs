use rusqlite::Connection;

use crate::config::DatabaseSettings;
use crate::error::ImportError;

const TRANSLATION_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS translations (
  id INTEGER PRIMARY KEY,
  code TEXT NOT NULL UNIQUE,
  name TEXT NOT NULL,
  category TEXT NOT NULL,
  license TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS books (
  id INTEGER PRIMARY KEY,
  translation_id INTEGER NOT NULL REFERENCES translations(id) ON DELETE CASCADE,
  name TEXT NOT NULL,
  position INTEGER NOT NULL,
  UNIQUE(translation_id, position)
);

CREATE TABLE IF NOT EXISTS chapters (
  id INTEGER PRIMARY KEY,
  book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
  number INTEGER NOT NULL,
  UNIQUE(book_id, number)
);

CREATE TABLE IF NOT EXISTS verses (
  id INTEGER PRIMARY KEY,
  chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
  number INTEGER NOT NULL,
  text TEXT NOT NULL,
  UNIQUE(chapter_id, number)
);

CREATE INDEX IF NOT EXISTS idx_books_translation ON books(translation_id);
CREATE INDEX IF NOT EXISTS idx_chapters_book ON chapters(book_id);
CREATE INDEX IF NOT EXISTS idx_verses_chapter ON verses(chapter_id);
";

const REFERENCE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cross_references (
  id INTEGER PRIMARY KEY,
  source TEXT NOT NULL,
  from_book TEXT,
  from_chapter INTEGER,
  from_verse INTEGER,
  to_book TEXT,
  to_chapter INTEGER,
  to_verse_start INTEGER,
  to_verse_end INTEGER,
  votes INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_cross_references_from ON cross_references(from_book, from_chapter, from_verse);
CREATE INDEX IF NOT EXISTS idx_cross_references_to ON cross_references(to_book, to_chapter, to_verse_start);
CREATE INDEX IF NOT EXISTS idx_cross_references_source ON cross_references(source);
";

pub fn translation_schema_sql() -> &'static str {
    TRANSLATION_SCHEMA
}

pub fn reference_schema_sql() -> &'static str {
    REFERENCE_SCHEMA
}

pub fn ensure_translation_schema(connection: &Connection) -> Result<(), ImportError> {
    connection.execute_batch(TRANSLATION_SCHEMA)?;
    Ok(())
}

pub fn ensure_reference_schema(connection: &Connection) -> Result<(), ImportError> {
    connection.execute_batch(REFERENCE_SCHEMA)?;
    Ok(())
}

pub fn open_connection(settings: &DatabaseSettings) -> Result<Connection, ImportError> {
    let connection = Connection::open(&settings.path)?;
    configure_connection(&connection, &settings.journal_mode)?;
    Ok(connection)
}

/// Cascading deletes depend on `foreign_keys`, which SQLite leaves off per
/// connection.
pub fn configure_connection(connection: &Connection, journal_mode: &str) -> Result<(), ImportError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.pragma_update(None, "journal_mode", journal_mode)?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(connection: &Connection) -> Vec<String> {
        let mut statement = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare");
        statement
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<Vec<String>, _>>()
            .expect("rows")
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_translation_schema(&connection).expect("first run");
        ensure_translation_schema(&connection).expect("second run");
        ensure_reference_schema(&connection).expect("first run");
        ensure_reference_schema(&connection).expect("second run");

        assert_eq!(
            table_names(&connection),
            vec!["books", "chapters", "cross_references", "translations", "verses"]
        );
    }

    #[test]
    fn configure_connection_enables_foreign_keys() {
        let connection = Connection::open_in_memory().expect("in-memory db");
        configure_connection(&connection, "WAL").expect("configure");

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("pragma");
        assert_eq!(enabled, 1);
    }
}
