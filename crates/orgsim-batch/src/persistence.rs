use std::fmt;
use std::path::Path;

use contracts::{StepRecord, SCHEMA_VERSION_V1};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    NotAttached,
    KeyOutOfRange { column: &'static str, value: u64 },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
            Self::NotAttached => write!(f, "sqlite store is not attached"),
            Self::KeyOutOfRange { column, value } => {
                write!(f, "key column {column} out of range: {value}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// SQLite sink for flattened simulation records. One row per
/// `(run_id, iteration, step)`; re-delivered batches overwrite in place so
/// at-least-once upstream delivery stays idempotent.
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS simulation_data (
                run_id INTEGER NOT NULL,
                iteration INTEGER NOT NULL,
                step INTEGER NOT NULL,
                schema_version TEXT NOT NULL,
                combination_id TEXT NOT NULL,
                params_json TEXT NOT NULL,
                actor_sequence_lst TEXT NOT NULL,
                time_lst TEXT NOT NULL,
                step_tag TEXT NOT NULL,
                PRIMARY KEY (run_id, iteration, step)
            );

            CREATE INDEX IF NOT EXISTS idx_simulation_data_combination
                ON simulation_data(combination_id, step);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', 'batch-000000')",
            [],
        )?;

        Ok(())
    }

    /// Write a batch of records in one transaction. Conflicting rows are
    /// replaced with the incoming values.
    pub fn persist_records(&mut self, records: &[StepRecord]) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;

        for record in records {
            let params_json = serde_json::to_string(&record.params)?;
            tx.execute(
                "INSERT INTO simulation_data (
                    run_id,
                    iteration,
                    step,
                    schema_version,
                    combination_id,
                    params_json,
                    actor_sequence_lst,
                    time_lst,
                    step_tag
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(run_id, iteration, step) DO UPDATE SET
                    schema_version = excluded.schema_version,
                    combination_id = excluded.combination_id,
                    params_json = excluded.params_json,
                    actor_sequence_lst = excluded.actor_sequence_lst,
                    time_lst = excluded.time_lst,
                    step_tag = excluded.step_tag",
                params![
                    key_i64("run_id", record.run_id)?,
                    key_i64("iteration", record.iteration)?,
                    key_i64("step", record.step)?,
                    record.schema_version.as_str(),
                    record.combination_id.as_str(),
                    params_json,
                    record.actor_sequence_lst.as_str(),
                    record.time_lst.as_str(),
                    step_stamp(record.step),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Sampled records of one run, ordered by iteration then step.
    pub fn load_run(&self, run_id: u64) -> Result<Vec<StepRecord>, PersistenceError> {
        let mut statement = self.conn.prepare(
            "SELECT run_id, iteration, step, combination_id, params_json,
                    actor_sequence_lst, time_lst
             FROM simulation_data
             WHERE run_id = ?1
             ORDER BY iteration, step",
        )?;
        let rows = statement.query_map(
            params![key_i64("run_id", run_id)?],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (run_id, iteration, step, combination_id, params_json, routines, times) = row?;
            records.push(StepRecord {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                run_id: run_id.max(0) as u64,
                iteration: iteration.max(0) as u64,
                step: step.max(0) as u64,
                params: serde_json::from_str(&params_json)?,
                combination_id,
                actor_sequence_lst: routines,
                time_lst: times,
            });
        }
        Ok(records)
    }

    pub fn record_count(&self) -> Result<u64, PersistenceError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM simulation_data", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }
}

fn step_stamp(step: u64) -> String {
    format!("step-{step:06}")
}

/// Key columns are stored as SQLite INTEGERs; a value past `i64::MAX` must
/// not be clamped or distinct keys could collide in the upsert.
fn key_i64(column: &'static str, value: u64) -> Result<i64, PersistenceError> {
    i64::try_from(value).map_err(|_| PersistenceError::KeyOutOfRange { column, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ModelParams;

    fn record(run_id: u64, iteration: u64, step: u64, times: &str) -> StepRecord {
        StepRecord {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id,
            iteration,
            step,
            params: ModelParams::default(),
            combination_id: "num_nodes20".to_string(),
            actor_sequence_lst: "[]".to_string(),
            time_lst: times.to_string(),
        }
    }

    #[test]
    fn persists_and_loads_ordered_run_records() {
        let mut store = SqliteRecordStore::open_in_memory().expect("store");
        store
            .persist_records(&[
                record(1, 0, 4, "[9]"),
                record(1, 0, 0, "[]"),
                record(2, 0, 0, "[]"),
            ])
            .expect("persist");

        let loaded = store.load_run(1).expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].step, 0);
        assert_eq!(loaded[1].step, 4);
        assert_eq!(loaded[1].time_lst, "[9]");
        assert_eq!(store.record_count().expect("count"), 3);
    }

    #[test]
    fn redelivery_overwrites_instead_of_duplicating() {
        let mut store = SqliteRecordStore::open_in_memory().expect("store");
        store
            .persist_records(&[record(7, 1, 3, "[1]")])
            .expect("persist");
        store
            .persist_records(&[record(7, 1, 3, "[2]")])
            .expect("persist again");

        assert_eq!(store.record_count().expect("count"), 1);
        let loaded = store.load_run(7).expect("load");
        assert_eq!(loaded[0].time_lst, "[2]");
    }

    #[test]
    fn out_of_range_key_is_rejected_not_clamped() {
        let mut store = SqliteRecordStore::open_in_memory().expect("store");
        let outcome = store.persist_records(&[record(u64::MAX, 0, 0, "[]")]);
        assert!(matches!(
            outcome,
            Err(PersistenceError::KeyOutOfRange {
                column: "run_id",
                value: u64::MAX,
            })
        ));
        assert_eq!(store.record_count().expect("count"), 0);
        assert!(matches!(
            store.load_run(u64::MAX),
            Err(PersistenceError::KeyOutOfRange { .. })
        ));
    }

    #[test]
    fn rows_carry_their_step_tag() {
        let mut store = SqliteRecordStore::open_in_memory().expect("store");
        store
            .persist_records(&[record(1, 0, 4, "[9]")])
            .expect("persist");
        let tag: String = store
            .conn
            .query_row("SELECT step_tag FROM simulation_data", [], |row| row.get(0))
            .expect("tag");
        assert_eq!(tag, "step-000004");
    }

    #[test]
    fn migration_is_idempotent() {
        let mut store = SqliteRecordStore::open_in_memory().expect("store");
        store.migrate().expect("second migrate");
        assert_eq!(store.record_count().expect("count"), 0);
    }
}
