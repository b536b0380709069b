pub mod delete;
pub mod import;
pub mod references;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::cli::ModeArgs;
use crate::config::DatabaseSettings;
use crate::error::ImportError;
use crate::model::{ImportCounts, ItemOutcome, RunManifest};
use crate::store::{
    ContentRow, DirectSink, DryRunSink, ImportSink, ReferenceRow, ScriptSink, Session,
    TranslationRow,
};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    DryRun,
    Script,
    Execute,
}

impl OutputMode {
    /// `--dry-run` wins over `--execute`.
    pub fn from_flags(flags: ModeArgs) -> Self {
        if flags.dry_run {
            if flags.execute {
                warn!("--dry-run given together with --execute; nothing will be written");
            }
            Self::DryRun
        } else if flags.execute {
            Self::Execute
        } else {
            Self::Script
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DryRun => "dry-run",
            Self::Script => "script",
            Self::Execute => "execute",
        }
    }
}

/// Database settings for `--execute`, resolved before any source is read.
pub fn preflight(mode: OutputMode) -> Result<Option<DatabaseSettings>> {
    if mode != OutputMode::Execute {
        return Ok(None);
    }
    let settings = DatabaseSettings::from_env().context("database configuration is incomplete")?;
    Ok(Some(settings))
}

pub enum OutputSink {
    DryRun(DryRunSink),
    Script(ScriptSink),
    Direct(DirectSink),
}

impl OutputSink {
    pub fn open(
        mode: OutputMode,
        settings: Option<&DatabaseSettings>,
        out_dir: &Path,
        batch_size: usize,
    ) -> Result<Self> {
        let sink = match (mode, settings) {
            (OutputMode::DryRun, _) => Self::DryRun(DryRunSink),
            (OutputMode::Script, _) => Self::Script(ScriptSink::new(out_dir)),
            (OutputMode::Execute, Some(settings)) => {
                let session = Session::open(settings).with_context(|| {
                    format!("failed to open database {}", settings.path.display())
                })?;
                Self::Direct(DirectSink::new(session, batch_size))
            }
            (OutputMode::Execute, None) => {
                return Err(anyhow!(ImportError::Config(
                    "execute mode requires database settings".to_string()
                )));
            }
        };
        Ok(sink)
    }
}

impl ImportSink for OutputSink {
    fn mode(&self) -> &'static str {
        match self {
            Self::DryRun(sink) => sink.mode(),
            Self::Script(sink) => sink.mode(),
            Self::Direct(sink) => sink.mode(),
        }
    }

    fn import_translation<'a, I>(
        &mut self,
        translation: &TranslationRow,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ContentRow<'a>>,
    {
        match self {
            Self::DryRun(sink) => sink.import_translation(translation, rows),
            Self::Script(sink) => sink.import_translation(translation, rows),
            Self::Direct(sink) => sink.import_translation(translation, rows),
        }
    }

    fn import_references<'a, I>(
        &mut self,
        source: &str,
        rows: I,
    ) -> Result<ImportCounts, ImportError>
    where
        I: IntoIterator<Item = ReferenceRow<'a>>,
    {
        match self {
            Self::DryRun(sink) => sink.import_references(source, rows),
            Self::Script(sink) => sink.import_references(source, rows),
            Self::Direct(sink) => sink.import_references(source, rows),
        }
    }

    fn delete_translation(&mut self, code: &str) -> Result<(), ImportError> {
        match self {
            Self::DryRun(sink) => sink.delete_translation(code),
            Self::Script(sink) => sink.delete_translation(code),
            Self::Direct(sink) => sink.delete_translation(code),
        }
    }

    fn finish(self) -> Result<(), ImportError> {
        match self {
            Self::DryRun(sink) => sink.finish(),
            Self::Script(sink) => sink.finish(),
            Self::Direct(sink) => sink.finish(),
        }
    }
}

/// Per-item bookkeeping for one command invocation.
#[derive(Debug)]
pub struct RunLog {
    command: &'static str,
    mode: OutputMode,
    batch: bool,
    run_id: String,
    started_ts: DateTime<Utc>,
    started_at: String,
    items: Vec<ItemOutcome>,
}

impl RunLog {
    pub fn new(command: &'static str, mode: OutputMode, batch: bool) -> Self {
        let started_ts = Utc::now();
        let run_id = format!("run-{}", utc_compact_string(started_ts));
        info!(command, mode = mode.as_str(), run_id = %run_id, batch, "starting run");

        Self {
            command,
            mode,
            batch,
            run_id,
            started_ts,
            started_at: now_utc_string(),
            items: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Records the outcome of one item. In batch mode a failure is logged and
    /// swallowed; otherwise it is returned with the item name as context.
    pub fn record(
        &mut self,
        name: &str,
        source_sha256: Option<String>,
        outcome: Result<ImportCounts, ImportError>,
    ) -> Result<()> {
        match outcome {
            Ok(counts) => {
                info!(
                    item = name,
                    books = counts.books,
                    chapters = counts.chapters,
                    verses = counts.verses,
                    references = counts.references,
                    flushes = counts.flushes,
                    "item completed"
                );
                self.items.push(ItemOutcome {
                    name: name.to_string(),
                    status: "ok".to_string(),
                    source_sha256,
                    counts,
                    error: None,
                });
                Ok(())
            }
            Err(err) => {
                self.items.push(ItemOutcome {
                    name: name.to_string(),
                    status: "failed".to_string(),
                    source_sha256,
                    counts: ImportCounts::default(),
                    error: Some(err.to_string()),
                });
                if self.batch {
                    error!(item = name, error = %err, "item failed, continuing with the next one");
                    Ok(())
                } else {
                    Err(anyhow::Error::new(err).context(format!("{} failed for {name}", self.command)))
                }
            }
        }
    }

    /// Logs the totals and, unless this was a dry run, writes the run
    /// manifest under `<out_dir>/manifests`.
    pub fn finish(self, out_dir: &Path) -> Result<Option<PathBuf>> {
        let succeeded = self.succeeded();
        let failed = self.failed();
        info!(
            command = self.command,
            run_id = %self.run_id,
            succeeded,
            failed,
            "run finished"
        );

        if self.mode == OutputMode::DryRun {
            return Ok(None);
        }

        let manifest_path = out_dir.join("manifests").join(format!(
            "{}_run_{}.json",
            self.command,
            utc_compact_string(self.started_ts)
        ));
        let manifest = RunManifest {
            manifest_version: MANIFEST_VERSION,
            run_id: self.run_id,
            command: self.command.to_string(),
            mode: self.mode.as_str().to_string(),
            started_at: self.started_at,
            finished_at: now_utc_string(),
            succeeded,
            failed,
            items: self.items,
        };

        write_json_pretty(&manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
        Ok(Some(manifest_path))
    }
}

/// Closes the sink and writes the manifest whatever the loop returned; the
/// loop's own error takes precedence.
pub fn conclude(
    sink: OutputSink,
    log: RunLog,
    out_dir: &Path,
    outcome: Result<()>,
) -> Result<()> {
    let mode = sink.mode();
    let finished = sink
        .finish()
        .with_context(|| format!("failed to finish {mode} output"));
    let manifest = log.finish(out_dir);

    outcome?;
    finished?;
    manifest?;
    Ok(())
}
