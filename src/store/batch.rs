//! Multi-row parameterized inserts, flushed in fixed-size batches.
//!
//! A `BatchWriter` accumulates rows for one table and, once `batch_size`
//! rows are pending, issues a single `INSERT ... VALUES (...), (...)`
//! statement. Placeholders are numbered from `?1` inside every flushed
//! statement. Failed flushes propagate immediately and leave the pending rows
//! behind; callers run the writer inside a transaction.

use std::fmt::Write as _;

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, warn};

use crate::error::ImportError;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Highest `?NNN` placeholder SQLite accepts in one statement.
pub const MAX_BOUND_PARAMETERS: usize = 32766;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertShape {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

impl InsertShape {
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

pub const VERSE_SHAPE: InsertShape = InsertShape {
    table: "verses",
    columns: &["chapter_id", "number", "text"],
};

pub const REFERENCE_SHAPE: InsertShape = InsertShape {
    table: "cross_references",
    columns: &[
        "source",
        "from_book",
        "from_chapter",
        "from_verse",
        "to_book",
        "to_chapter",
        "to_verse_start",
        "to_verse_end",
        "votes",
    ],
};

/// The storage round trip a flush performs.
pub trait BatchExecutor {
    fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<usize, ImportError>;
}

impl BatchExecutor for Connection {
    fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<usize, ImportError> {
        let mut statement = self.prepare_cached(sql)?;
        let inserted = statement.execute(params_from_iter(params.iter()))?;
        Ok(inserted)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub flushes: usize,
}

#[derive(Debug)]
pub struct BatchWriter {
    shape: InsertShape,
    batch_size: usize,
    full_batch_sql: String,
    pending: Vec<Value>,
    pending_rows: usize,
    inserted: usize,
    flushes: usize,
}

impl BatchWriter {
    pub fn new(shape: InsertShape, batch_size: usize) -> Self {
        let batch_size = clamp_batch_size(&shape, batch_size);
        Self {
            shape,
            batch_size,
            full_batch_sql: render_insert_sql(&shape, batch_size),
            pending: Vec::with_capacity(batch_size * shape.arity()),
            pending_rows: 0,
            inserted: 0,
            flushes: 0,
        }
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Queues one row. Returns the running insert total when this push
    /// triggered a flush.
    pub fn push<E>(&mut self, executor: &E, row: Vec<Value>) -> Result<Option<usize>, ImportError>
    where
        E: BatchExecutor + ?Sized,
    {
        if row.len() != self.shape.arity() {
            return Err(ImportError::RowShape {
                table: self.shape.table,
                expected: self.shape.arity(),
                actual: row.len(),
            });
        }

        self.pending.extend(row);
        self.pending_rows += 1;

        if self.pending_rows >= self.batch_size {
            self.flush(executor)?;
            return Ok(Some(self.inserted()));
        }

        Ok(None)
    }

    /// Flushes the trailing partial batch, if any.
    pub fn finish<E>(mut self, executor: &E) -> Result<BatchSummary, ImportError>
    where
        E: BatchExecutor + ?Sized,
    {
        if self.pending_rows > 0 {
            self.flush(executor)?;
        }

        Ok(BatchSummary {
            rows: self.inserted,
            flushes: self.flushes,
        })
    }

    fn flush<E>(&mut self, executor: &E) -> Result<(), ImportError>
    where
        E: BatchExecutor + ?Sized,
    {
        let rows = self.pending_rows;
        if rows == self.batch_size {
            executor.execute_insert(&self.full_batch_sql, &self.pending)?;
        } else {
            let sql = render_insert_sql(&self.shape, rows);
            executor.execute_insert(&sql, &self.pending)?;
        }

        self.pending.clear();
        self.pending_rows = 0;
        self.inserted += rows;
        self.flushes += 1;

        debug!(
            table = self.shape.table,
            rows,
            inserted = self.inserted,
            flushes = self.flushes,
            "batch flushed"
        );

        Ok(())
    }
}

/// Bounds `requested` to `1..=MAX_BOUND_PARAMETERS / arity` rows.
pub fn clamp_batch_size(shape: &InsertShape, requested: usize) -> usize {
    let limit = (MAX_BOUND_PARAMETERS / shape.arity().max(1)).max(1);
    let batch_size = requested.clamp(1, limit);
    if batch_size < requested {
        warn!(
            table = shape.table,
            requested,
            batch_size,
            "batch size exceeds the bound parameter limit, clamping"
        );
    }
    batch_size
}

/// Renders `INSERT INTO t(a, b) VALUES (?1, ?2), (?3, ?4), ...` for `rows`
/// row groups.
pub fn render_insert_sql(shape: &InsertShape, rows: usize) -> String {
    let arity = shape.arity();
    let mut sql = format!(
        "INSERT INTO {}({}) VALUES ",
        shape.table,
        shape.columns.join(", ")
    );

    let mut parameter_index = 1;
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for column in 0..arity {
            if column > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "?{parameter_index}");
            parameter_index += 1;
        }
        sql.push(')');
    }

    sql
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: RefCell<Vec<(String, Vec<Value>)>>,
        fail_on_call: Option<usize>,
    }

    impl BatchExecutor for RecordingExecutor {
        fn execute_insert(&self, sql: &str, params: &[Value]) -> Result<usize, ImportError> {
            let mut calls = self.calls.borrow_mut();
            if self.fail_on_call == Some(calls.len()) {
                return Err(ImportError::Connection(rusqlite::Error::InvalidQuery));
            }
            calls.push((sql.to_string(), params.to_vec()));
            Ok(params.len())
        }
    }

    const PAIR: InsertShape = InsertShape {
        table: "pairs",
        columns: &["a", "b"],
    };

    fn row(value: i64) -> Vec<Value> {
        vec![Value::Integer(value), Value::Text(format!("v{value}"))]
    }

    #[test]
    fn render_insert_sql_numbers_placeholders_sequentially() {
        assert_eq!(
            render_insert_sql(&PAIR, 2),
            "INSERT INTO pairs(a, b) VALUES (?1, ?2), (?3, ?4)"
        );
        assert_eq!(
            render_insert_sql(&VERSE_SHAPE, 1),
            "INSERT INTO verses(chapter_id, number, text) VALUES (?1, ?2, ?3)"
        );
    }

    #[test]
    fn flush_count_and_sizes_follow_batch_size() {
        for (total, batch_size) in [(0usize, 3usize), (1, 3), (3, 3), (7, 3), (10, 100), (250, 100)] {
            let executor = RecordingExecutor::default();
            let mut writer = BatchWriter::new(PAIR, batch_size);
            for value in 0..total {
                writer.push(&executor, row(value as i64)).expect("push");
            }
            let summary = writer.finish(&executor).expect("finish");

            let calls = executor.calls.borrow();
            let expected_flushes = total.div_ceil(batch_size);
            assert_eq!(calls.len(), expected_flushes, "total={total} batch={batch_size}");
            assert_eq!(summary.flushes, expected_flushes);
            assert_eq!(summary.rows, total);

            let parameters: usize = calls.iter().map(|(_, params)| params.len()).sum();
            assert_eq!(parameters, total * PAIR.arity());

            if let Some((_, last)) = calls.last() {
                let remainder = total % batch_size;
                let expected_last = if remainder == 0 { batch_size } else { remainder };
                assert_eq!(last.len(), expected_last * PAIR.arity());
            }
        }
    }

    #[test]
    fn every_flush_restarts_parameter_numbering() {
        let executor = RecordingExecutor::default();
        let mut writer = BatchWriter::new(PAIR, 2);
        for value in 0..5 {
            writer.push(&executor, row(value)).expect("push");
        }
        writer.finish(&executor).expect("finish");

        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 3);
        for (sql, _) in calls.iter() {
            assert!(sql.contains("(?1, ?2)"), "{sql}");
        }
        assert_eq!(calls[2].0, "INSERT INTO pairs(a, b) VALUES (?1, ?2)");
    }

    #[test]
    fn push_reports_progress_only_on_flush() {
        let executor = RecordingExecutor::default();
        let mut writer = BatchWriter::new(PAIR, 2);

        assert_eq!(writer.push(&executor, row(1)).expect("push"), None);
        assert_eq!(writer.push(&executor, row(2)).expect("push"), Some(2));
        assert_eq!(writer.push(&executor, row(3)).expect("push"), None);
        assert_eq!(writer.push(&executor, row(4)).expect("push"), Some(4));
        assert_eq!(writer.inserted(), 4);
    }

    #[test]
    fn rows_keep_source_order_across_batches() {
        let executor = RecordingExecutor::default();
        let mut writer = BatchWriter::new(PAIR, 2);
        for value in 1..=3 {
            writer.push(&executor, row(value)).expect("push");
        }
        writer.finish(&executor).expect("finish");

        let flattened: Vec<Value> = executor
            .calls
            .borrow()
            .iter()
            .flat_map(|(_, params)| params.clone())
            .collect();
        let expected: Vec<Value> = (1..=3).flat_map(row).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn wrong_arity_is_rejected_without_flushing() {
        let executor = RecordingExecutor::default();
        let mut writer = BatchWriter::new(PAIR, 1);

        let err = writer
            .push(&executor, vec![Value::Integer(1)])
            .expect_err("arity mismatch");
        assert!(matches!(
            err,
            ImportError::RowShape { expected: 2, actual: 1, .. }
        ));
        assert!(executor.calls.borrow().is_empty());
    }

    #[test]
    fn flush_failure_propagates_and_stops_the_writer() {
        let executor = RecordingExecutor {
            fail_on_call: Some(1),
            ..Default::default()
        };
        let mut writer = BatchWriter::new(PAIR, 2);

        writer.push(&executor, row(1)).expect("push");
        writer.push(&executor, row(2)).expect("first flush succeeds");
        writer.push(&executor, row(3)).expect("buffered");
        let err = writer.push(&executor, row(4)).expect_err("second flush fails");

        assert!(matches!(err, ImportError::Connection(_)));
        assert_eq!(writer.inserted(), 2);
        assert_eq!(executor.calls.borrow().len(), 1);
    }

    #[test]
    fn connection_executor_inserts_rows() {
        let connection = Connection::open_in_memory().expect("in-memory db");
        connection
            .execute_batch("CREATE TABLE pairs(a INTEGER, b TEXT)")
            .expect("table");

        let mut writer = BatchWriter::new(PAIR, 4);
        for value in 0..10 {
            writer.push(&connection, row(value)).expect("push");
        }
        let summary = writer.finish(&connection).expect("finish");
        assert_eq!(summary, BatchSummary { rows: 10, flushes: 3 });

        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM pairs", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 10);
    }

    #[test]
    fn batch_size_is_bounded_by_parameter_limit() {
        assert_eq!(clamp_batch_size(&REFERENCE_SHAPE, 4000), 3640);
        assert_eq!(clamp_batch_size(&VERSE_SHAPE, 20_000), 10922);
        assert_eq!(clamp_batch_size(&VERSE_SHAPE, 0), 1);
        assert_eq!(clamp_batch_size(&VERSE_SHAPE, 100), 100);
    }

    #[test]
    fn oversized_batch_size_still_inserts_every_row() {
        let connection = Connection::open_in_memory().expect("in-memory db");
        connection
            .execute_batch(
                "CREATE TABLE cross_references(source TEXT, from_book TEXT, from_chapter INTEGER, from_verse INTEGER, \
                 to_book TEXT, to_chapter INTEGER, to_verse_start INTEGER, to_verse_end INTEGER, votes INTEGER)",
            )
            .expect("table");

        let mut writer = BatchWriter::new(REFERENCE_SHAPE, 4000);
        for value in 0..4000 {
            let row = vec![
                Value::Text("openbible".to_string()),
                Value::Text("Genesis".to_string()),
                Value::Integer(1),
                Value::Integer(value),
                Value::Text("John".to_string()),
                Value::Integer(1),
                Value::Integer(1),
                Value::Integer(3),
                Value::Integer(0),
            ];
            writer.push(&connection, row).expect("push");
        }
        let summary = writer.finish(&connection).expect("finish");
        assert_eq!(summary, BatchSummary { rows: 4000, flushes: 2 });

        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM cross_references", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 4000);
    }
}
