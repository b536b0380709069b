use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::cli::ReferencesArgs;
use crate::commands::{OutputMode, OutputSink, RunLog, conclude, preflight};
use crate::source::{SourceTree, load_references};
use crate::store::{ImportSink, reference_rows};

pub fn run(args: ReferencesArgs) -> Result<()> {
    let mode = OutputMode::from_flags(args.mode);
    let settings = preflight(mode)?;

    let files = if args.files.is_empty() {
        SourceTree::new(&args.source_root).reference_files()?
    } else {
        args.files.clone()
    };
    info!(files = files.len(), "importing cross references");

    let mut sink = OutputSink::open(mode, settings.as_ref(), &args.out_dir, args.batch_size)?;
    let mut log = RunLog::new("references", mode, files.len() > 1);
    let outcome = import_reference_files(&mut sink, &mut log, &files);
    conclude(sink, log, &args.out_dir, outcome)
}

pub fn import_reference_files<S: ImportSink>(
    sink: &mut S,
    log: &mut RunLog,
    files: &[PathBuf],
) -> Result<()> {
    for path in files {
        let name = path.display().to_string();
        let (sha256, outcome) = match load_references(path) {
            Ok(loaded) => {
                let outcome = sink.import_references(&loaded.source, reference_rows(&loaded.records));
                (loaded.sha256, outcome)
            }
            Err(err) => (None, Err(err)),
        };
        log.record(&name, sha256, outcome)?;
    }

    Ok(())
}
