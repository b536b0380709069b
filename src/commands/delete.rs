use anyhow::Result;
use tracing::info;

use crate::cli::DeleteArgs;
use crate::commands::{OutputMode, OutputSink, RunLog, conclude, preflight};
use crate::model::ImportCounts;
use crate::store::ImportSink;
use crate::store::batch::DEFAULT_BATCH_SIZE;

pub fn run(args: DeleteArgs) -> Result<()> {
    let mode = OutputMode::from_flags(args.mode);
    let settings = preflight(mode)?;
    info!(translations = args.codes.len(), "deleting translations");

    let mut sink = OutputSink::open(mode, settings.as_ref(), &args.out_dir, DEFAULT_BATCH_SIZE)?;
    let mut log = RunLog::new("delete", mode, args.codes.len() > 1);
    let outcome = delete_translations(&mut sink, &mut log, &args.codes);
    conclude(sink, log, &args.out_dir, outcome)
}

pub fn delete_translations<S: ImportSink>(
    sink: &mut S,
    log: &mut RunLog,
    codes: &[String],
) -> Result<()> {
    for code in codes {
        let outcome = sink
            .delete_translation(code)
            .map(|()| ImportCounts::default());
        log.record(code, None, outcome)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::store::{DirectSink, Session};

    #[test]
    fn unknown_codes_fail_without_stopping_a_batch() {
        let session = Session::from_connection(Connection::open_in_memory().expect("db"))
            .expect("session");
        session
            .connection()
            .execute_batch(crate::store::schema::translation_schema_sql())
            .expect("schema");
        session
            .connection()
            .execute("INSERT INTO translations(code, name, category) VALUES('kjv', 'KJV', 'en')", [])
            .expect("seed");

        let mut sink = DirectSink::new(session, DEFAULT_BATCH_SIZE);
        let mut log = RunLog::new("delete", OutputMode::Execute, true);
        delete_translations(&mut sink, &mut log, &["nope".to_string(), "kjv".to_string()])
            .expect("batch");

        assert_eq!(log.succeeded(), 1);
        assert_eq!(log.failed(), 1);
        let remaining: i64 = sink
            .session()
            .connection()
            .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(remaining, 0);
    }
}
