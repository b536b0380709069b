pub mod batch;
pub mod direct;
pub mod dry_run;
pub mod rows;
pub mod schema;
pub mod script;
pub mod session;


use crate::error::ImportError;
use crate::model::ImportCounts;

pub use direct::DirectSink;
pub use dry_run::DryRunSink;
pub use rows::{ContentRow, ReferenceRow, TranslationRow, reference_rows, translation_rows};
pub use script::ScriptSink;
pub use session::Session;

/// Consumer of the shared row sequences. Each implementation is one output
/// mode: direct execution, script emission, or a dry run.
pub trait ImportSink {
    fn mode(&self) -> &'static str;

    fn import_translation<'a, I>(
        &mut self,
        translation: &TranslationRow,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ContentRow<'a>>;

    fn import_references<'a, I>(
        &mut self,
        source: &str,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ReferenceRow<'a>>;

    fn delete_translation(&mut self, code: &str) -> Result<(), ImportError>;

    /// Releases whatever the sink holds. Called once, on every exit path.
    fn finish(self) -> Result<(), ImportError>
    where
        Self: Sized;
}
