use rusqlite::types::Value;
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::model::ImportCounts;
use crate::store::batch::{BatchWriter, REFERENCE_SHAPE, VERSE_SHAPE};
use crate::store::rows::{ContentRow, ReferenceRow, TranslationRow};
use crate::store::schema::{ensure_reference_schema, ensure_translation_schema};
use crate::store::session::Session;
use crate::store::ImportSink;

/// Executes imports against a live database, one transaction per document.
#[derive(Debug)]
pub struct DirectSink {
    session: Session,
    batch_size: usize,
}

impl DirectSink {
    pub fn new(session: Session, batch_size: usize) -> Self {
        Self {
            session,
            batch_size,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl ImportSink for DirectSink {
    fn mode(&self) -> &'static str {
        "execute"
    }

    fn import_translation<'a, I>(
        &mut self,
        translation: &TranslationRow,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ContentRow<'a>>,
    {
        let batch_size = self.batch_size;
        // Schema DDL stays outside the document transaction.
        ensure_translation_schema(self.session.connection())?;
        self.session.in_transaction(&translation.code, |tx| {
            let connection: &Connection = tx;

            let translation_id = upsert_translation(connection, translation)?;
            let replaced_books = connection.execute(
                "DELETE FROM books WHERE translation_id = ?1",
                [translation_id],
            )?;
            if replaced_books > 0 {
                info!(
                    translation = %translation.code,
                    books = replaced_books,
                    "replacing existing translation content"
                );
            }

            let mut counts = ImportCounts::default();
            let mut writer = BatchWriter::new(VERSE_SHAPE, batch_size);
            let mut book_id = None;
            let mut chapter_id = None;

            for row in rows {
                counts.record(&row);
                match row {
                    ContentRow::Book { name, position } => {
                        book_id = Some(insert_book(connection, translation_id, name, position)?);
                        chapter_id = None;
                    }
                    ContentRow::Chapter { number } => {
                        let parent = book_id.ok_or(ImportError::RowOrder {
                            row: "chapter",
                            parent: "book",
                        })?;
                        chapter_id = Some(insert_chapter(connection, parent, number)?);
                    }
                    ContentRow::Verse { number, text } => {
                        let parent = chapter_id.ok_or(ImportError::RowOrder {
                            row: "verse",
                            parent: "chapter",
                        })?;
                        let flushed = writer.push(
                            connection,
                            vec![
                                Value::Integer(parent),
                                Value::Integer(number),
                                Value::Text(text),
                            ],
                        )?;
                        if let Some(inserted) = flushed {
                            info!(translation = %translation.code, verses = inserted, "verses inserted");
                        }
                    }
                }
            }

            let summary = writer.finish(connection)?;
            counts.flushes = summary.flushes;
            Ok(counts)
        })
    }

    fn import_references<'a, I>(
        &mut self,
        source: &str,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ReferenceRow<'a>>,
    {
        let batch_size = self.batch_size;
        ensure_reference_schema(self.session.connection())?;
        self.session.in_transaction(source, |tx| {
            let connection: &Connection = tx;

            let replaced = connection.execute(
                "DELETE FROM cross_references WHERE source = ?1",
                [source],
            )?;
            if replaced > 0 {
                info!(source, rows = replaced, "replacing existing cross references");
            }

            let mut writer = BatchWriter::new(REFERENCE_SHAPE, batch_size);
            for row in rows {
                let flushed = writer.push(
                    connection,
                    vec![
                        Value::Text(source.to_string()),
                        Value::Text(row.from_book.to_string()),
                        Value::Integer(row.from_chapter),
                        Value::Integer(row.from_verse),
                        Value::Text(row.to_book.to_string()),
                        Value::Integer(row.to_chapter),
                        Value::Integer(row.to_verse_start),
                        Value::Integer(row.to_verse_end),
                        Value::Integer(row.votes),
                    ],
                )?;
                if let Some(inserted) = flushed {
                    info!(source, references = inserted, "cross references inserted");
                }
            }

            let summary = writer.finish(connection)?;
            Ok(ImportCounts {
                references: summary.rows,
                flushes: summary.flushes,
                ..ImportCounts::default()
            })
        })
    }

    fn delete_translation(&mut self, code: &str) -> Result<(), ImportError> {
        ensure_translation_schema(self.session.connection())?;
        self.session.in_transaction(code, |tx| {
            let connection: &Connection = tx;

            let deleted = connection.execute("DELETE FROM translations WHERE code = ?1", [code])?;
            if deleted == 0 {
                return Err(ImportError::not_found("translation", code));
            }
            Ok(())
        })
    }

    fn finish(self) -> Result<(), ImportError> {
        debug!(state = ?self.session.state(), "closing database session");
        self.session.close();
        Ok(())
    }
}

fn upsert_translation(connection: &Connection, translation: &TranslationRow) -> Result<i64, ImportError> {
    let id = connection.query_row(
        "
        INSERT INTO translations(code, name, category, license)
        VALUES(?1, ?2, ?3, ?4)
        ON CONFLICT(code) DO UPDATE SET
          name=excluded.name,
          category=excluded.category,
          license=excluded.license
        RETURNING id
        ",
        params![
            translation.code,
            translation.name,
            translation.category,
            translation.license
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_book(
    connection: &Connection,
    translation_id: i64,
    name: &str,
    position: i64,
) -> Result<i64, ImportError> {
    let mut statement = connection.prepare_cached(
        "INSERT INTO books(translation_id, name, position) VALUES(?1, ?2, ?3) RETURNING id",
    )?;
    let id = statement.query_row(params![translation_id, name, position], |row| row.get(0))?;
    Ok(id)
}

fn insert_chapter(connection: &Connection, book_id: i64, number: i64) -> Result<i64, ImportError> {
    let mut statement =
        connection.prepare_cached("INSERT INTO chapters(book_id, number) VALUES(?1, ?2) RETURNING id")?;
    let id = statement.query_row(params![book_id, number], |row| row.get(0))?;
    Ok(id)
}
