use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ImportError;
use crate::model::ImportCounts;
use crate::store::rows::{ContentRow, ReferenceRow, TranslationRow};
use crate::store::schema::{reference_schema_sql, translation_schema_sql};
use crate::store::ImportSink;

const DELETE_SCRIPT: &str = "delete.sql";
const REFERENCES_DIR: &str = "cross_references";

/// Writes each import as a standalone `.sql` file under `out_dir`.
#[derive(Debug)]
pub struct ScriptSink {
    out_dir: PathBuf,
    deleted_codes: Vec<String>,
}

impl ScriptSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            deleted_codes: Vec::new(),
        }
    }

    pub fn translation_script_path(&self, translation: &TranslationRow) -> PathBuf {
        self.out_dir
            .join(&translation.category)
            .join(format!("{}.sql", translation.code))
    }

    pub fn reference_script_path(&self, source: &str) -> PathBuf {
        self.out_dir.join(REFERENCES_DIR).join(format!("{source}.sql"))
    }

    pub fn delete_script_path(&self) -> PathBuf {
        self.out_dir.join(DELETE_SCRIPT)
    }
}

impl ImportSink for ScriptSink {
    fn mode(&self) -> &'static str {
        "script"
    }

    fn import_translation<'a, I>(
        &mut self,
        translation: &TranslationRow,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ContentRow<'a>>,
    {
        let mut counts = ImportCounts::default();
        let script = render_translation_script(translation, rows, &mut counts)?;

        let path = self.translation_script_path(translation);
        write_script(&path, &script)?;
        info!(translation = %translation.code, path = %path.display(), "wrote translation script");

        Ok(counts)
    }

    fn import_references<'a, I>(
        &mut self,
        source: &str,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ReferenceRow<'a>>,
    {
        let mut counts = ImportCounts::default();
        let script = render_reference_script(source, rows, &mut counts);

        let path = self.reference_script_path(source);
        write_script(&path, &script)?;
        info!(source, path = %path.display(), "wrote cross reference script");

        Ok(counts)
    }

    fn delete_translation(&mut self, code: &str) -> Result<(), ImportError> {
        self.deleted_codes.push(code.to_string());
        Ok(())
    }

    fn finish(self) -> Result<(), ImportError> {
        if self.deleted_codes.is_empty() {
            return Ok(());
        }

        let path = self.delete_script_path();
        write_script(&path, &render_delete_script(&self.deleted_codes))?;
        info!(path = %path.display(), translations = self.deleted_codes.len(), "wrote delete script");
        Ok(())
    }
}

/// Quotes a string as an SQL literal. Only embedded single quotes are
/// escaped.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn render_translation_script<'a, I>(
    translation: &TranslationRow,
    rows: I,
    counts: &mut ImportCounts,
) -> Result<String, ImportError>
where
    I: IntoIterator<Item = ContentRow<'a>>,
{
    let code = sql_literal(&translation.code);
    let mut script = String::new();

    let _ = writeln!(
        script,
        "-- translation {} ({})",
        translation.code, translation.category
    );
    script.push_str("PRAGMA foreign_keys = ON;\n");
    script.push_str(translation_schema_sql().trim());
    script.push_str("\n\n");

    let _ = writeln!(
        script,
        "INSERT INTO translations(code, name, category, license) VALUES({}, {}, {}, {}) \
         ON CONFLICT(code) DO UPDATE SET name=excluded.name, category=excluded.category, license=excluded.license;",
        code,
        sql_literal(&translation.name),
        sql_literal(&translation.category),
        sql_literal(&translation.license),
    );
    let _ = writeln!(
        script,
        "DELETE FROM books WHERE translation_id = (SELECT id FROM translations WHERE code = {code});"
    );

    let mut book_ref: Option<String> = None;
    let mut chapter_ref: Option<String> = None;

    for row in rows {
        counts.record(&row);
        match row {
            ContentRow::Book { name, position } => {
                let _ = writeln!(
                    script,
                    "INSERT INTO books(translation_id, name, position) VALUES((SELECT id FROM translations WHERE code = {code}), {}, {position});",
                    sql_literal(name),
                );
                book_ref = Some(format!(
                    "FROM books b JOIN translations t ON t.id = b.translation_id WHERE t.code = {code} AND b.position = {position}"
                ));
                chapter_ref = None;
            }
            ContentRow::Chapter { number } => {
                let Some(book) = book_ref.as_deref() else {
                    return Err(ImportError::RowOrder {
                        row: "chapter",
                        parent: "book",
                    });
                };
                let _ = writeln!(
                    script,
                    "INSERT INTO chapters(book_id, number) VALUES((SELECT b.id {book}), {number});"
                );
                chapter_ref = Some(format!(
                    "(SELECT c.id FROM chapters c WHERE c.number = {number} AND c.book_id = (SELECT b.id {book}))"
                ));
            }
            ContentRow::Verse { number, text } => {
                let Some(chapter) = chapter_ref.as_deref() else {
                    return Err(ImportError::RowOrder {
                        row: "verse",
                        parent: "chapter",
                    });
                };
                let _ = writeln!(
                    script,
                    "INSERT INTO verses(chapter_id, number, text) VALUES({chapter}, {number}, {});",
                    sql_literal(&text),
                );
            }
        }
    }

    Ok(script)
}

pub fn render_reference_script<'a, I>(source: &str, rows: I, counts: &mut ImportCounts) -> String
where
    I: IntoIterator<Item = ReferenceRow<'a>>,
{
    let source_literal = sql_literal(source);
    let mut script = String::new();

    let _ = writeln!(script, "-- cross references {source}");
    script.push_str(reference_schema_sql().trim());
    script.push_str("\n\n");
    let _ = writeln!(
        script,
        "DELETE FROM cross_references WHERE source = {source_literal};"
    );

    for row in rows {
        counts.references += 1;
        let _ = writeln!(
            script,
            "INSERT INTO cross_references(source, from_book, from_chapter, from_verse, to_book, to_chapter, to_verse_start, to_verse_end, votes) \
             VALUES({source_literal}, {}, {}, {}, {}, {}, {}, {}, {});",
            sql_literal(row.from_book),
            row.from_chapter,
            row.from_verse,
            sql_literal(row.to_book),
            row.to_chapter,
            row.to_verse_start,
            row.to_verse_end,
            row.votes,
        );
    }

    script
}

pub fn render_delete_script(codes: &[String]) -> String {
    let mut script = String::from("PRAGMA foreign_keys = ON;\n");
    for code in codes {
        let _ = writeln!(
            script,
            "DELETE FROM translations WHERE code = {};",
            sql_literal(code)
        );
    }
    script
}

fn write_script(path: &Path, script: &str) -> Result<(), ImportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| ImportError::io(parent, err))?;
    }
    fs::write(path, script).map_err(|err| ImportError::io(path, err))
}
