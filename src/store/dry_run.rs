use tracing::info;

use crate::error::ImportError;
use crate::model::ImportCounts;
use crate::store::rows::{ContentRow, ReferenceRow, TranslationRow};
use crate::store::ImportSink;

/// Walks the row sequences and counts them without writing anything.
#[derive(Debug, Default)]
pub struct DryRunSink;

impl ImportSink for DryRunSink {
    fn mode(&self) -> &'static str {
        "dry-run"
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
        for row in rows {
            counts.record(&row);
        }

        info!(
            translation = %translation.code,
            books = counts.books,
            chapters = counts.chapters,
            verses = counts.verses,
            "dry-run: translation not written"
        );
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
        let counts = ImportCounts {
            references: rows.into_iter().count(),
            ..ImportCounts::default()
        };

        info!(source, references = counts.references, "dry-run: cross references not written");
        Ok(counts)
    }

    fn delete_translation(&mut self, code: &str) -> Result<(), ImportError> {
        info!(translation = code, "dry-run: translation not deleted");
        Ok(())
    }

    fn finish(self) -> Result<(), ImportError> {
        Ok(())
    }
}
