use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ImportArgs;
use crate::commands::{OutputMode, OutputSink, RunLog, conclude, preflight};
use crate::prompt;
use crate::source::{LoadedTranslation, SourceTree};
use crate::store::{ImportSink, TranslationRow, translation_rows};

pub fn run(args: ImportArgs) -> Result<()> {
    let mode = OutputMode::from_flags(args.mode);
    let settings = preflight(mode)?;

    let tree = SourceTree::new(&args.source_root);
    let category = match args.category.clone() {
        Some(category) => category,
        None => prompt::select("category", &tree.categories()?)?,
    };

    let codes = if args.all {
        let codes = tree.translations(&category)?;
        if codes.is_empty() {
            warn!(category = %category, "category has no translations");
        }
        codes
    } else {
        match args.translation.clone() {
            Some(code) => vec![code],
            None => vec![prompt::select("translation", &tree.translations(&category)?)?],
        }
    };

    info!(
        category = %category,
        translations = codes.len(),
        source_root = %args.source_root.display(),
        "importing translations"
    );

    let mut sink = OutputSink::open(mode, settings.as_ref(), &args.out_dir, args.batch_size)?;
    let mut log = RunLog::new("import", mode, args.all);
    let outcome = import_translations(&mut sink, &mut log, &tree, &category, &codes);
    conclude(sink, log, &args.out_dir, outcome)
}

pub fn import_translations<S: ImportSink>(
    sink: &mut S,
    log: &mut RunLog,
    tree: &SourceTree,
    category: &str,
    codes: &[String],
) -> Result<()> {
    for code in codes {
        let (sha256, outcome) = match tree.load_translation(category, code) {
            Ok(loaded) => {
                let row = translation_row(&loaded);
                let outcome = sink.import_translation(&row, translation_rows(&loaded.books));
                (loaded.sha256, outcome)
            }
            Err(err) => (None, Err(err)),
        };
        log.record(code, sha256, outcome)?;
    }

    Ok(())
}

fn translation_row(loaded: &LoadedTranslation) -> TranslationRow {
    TranslationRow {
        code: loaded.code.clone(),
        name: loaded.title.clone(),
        category: loaded.category.clone(),
        license: loaded.license.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::store::ScriptSink;

    const BOOKS: &str = r#"[{"name": "Genesis", "chapters": [{"chapter": 1, "verses": [
        {"verse": 1, "text": "In the beginning"}, {"verse": 2, "text": "And the earth"}
    ]}]}]"#;

    fn write_translation(root: &Path, category: &str, code: &str, json: &str) {
        let dir = root.join("translations").join(category).join(code);
        fs::create_dir_all(&dir).expect("translation dir");
        fs::write(dir.join(format!("{code}.json")), json).expect("json");
        fs::write(
            dir.join("README.md"),
            format!("# {code} Bible\n\n## License\n\nPublic Domain\n"),
        )
        .expect("readme");
    }

    #[test]
    fn batch_import_continues_past_a_broken_translation() {
        let sources = tempfile::tempdir().expect("sources");
        let out = tempfile::tempdir().expect("out");
        write_translation(sources.path(), "en", "kjv", BOOKS);
        write_translation(sources.path(), "en", "broken", "{ not json");
        write_translation(sources.path(), "en", "web", BOOKS);

        let tree = SourceTree::new(sources.path());
        let codes = tree.translations("en").expect("codes");
        let mut sink = ScriptSink::new(out.path());
        let mut log = RunLog::new("import", OutputMode::Script, true);

        import_translations(&mut sink, &mut log, &tree, "en", &codes).expect("batch run");
        sink.finish().expect("finish");

        assert_eq!(log.succeeded(), 2);
        assert_eq!(log.failed(), 1);
        let script = fs::read_to_string(out.path().join("en/kjv.sql")).expect("kjv script");
        assert!(script.contains("'kjv Bible'"));
        assert!(script.contains("'Public Domain'"));
        assert!(out.path().join("en/web.sql").is_file());
        assert!(!out.path().join("en/broken.sql").exists());
    }

    #[test]
    fn single_import_stops_on_missing_translation() {
        let sources = tempfile::tempdir().expect("sources");
        write_translation(sources.path(), "en", "kjv", BOOKS);

        let tree = SourceTree::new(sources.path());
        let mut sink = crate::store::DryRunSink;
        let mut log = RunLog::new("import", OutputMode::DryRun, false);

        let err = import_translations(&mut sink, &mut log, &tree, "en", &["nope".to_string()])
            .expect_err("missing translation");
        assert!(err.to_string().contains("nope"));
        assert_eq!(log.failed(), 1);
    }
}
