//! Batch facade: expand a trigger event, drive the simulation runs, and
//! flush the flattened records into the SQLite sink.

mod persistence;

use std::fmt;
use std::path::Path;

use contracts::{BatchRequest, ExecutorConfig, StepRecord};
use orgsim_core::error::ModelError;
use orgsim_core::executor::run_batch;
pub use persistence::{PersistenceError, SqliteRecordStore};
use serde::Serialize;

#[derive(Debug)]
pub enum BatchError {
    /// The trigger payload was not a valid batch request.
    Event(serde_json::Error),
    Model(ModelError),
    Persistence(PersistenceError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(err) => write!(f, "invalid batch event: {err}"),
            Self::Model(err) => write!(f, "model error: {err}"),
            Self::Persistence(err) => write!(f, "persistence error: {err}"),
        }
    }
}

impl std::error::Error for BatchError {}

impl From<ModelError> for BatchError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<PersistenceError> for BatchError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Outcome of one processed batch event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub runs: u64,
    pub records_written: u64,
    pub combination_ids: Vec<String>,
}

/// In-process entry point tying the executor to the record store.
#[derive(Debug)]
pub struct BatchApi {
    config: ExecutorConfig,
    store: Option<SqliteRecordStore>,
}

impl BatchApi {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        self.store = Some(SqliteRecordStore::open(path)?);
        Ok(())
    }

    pub fn attach_in_memory_store(&mut self) -> Result<(), PersistenceError> {
        self.store = Some(SqliteRecordStore::open_in_memory()?);
        Ok(())
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Parse a trigger event, execute every run, and persist the sampled
    /// records. Without an attached store the batch still runs and the
    /// summary reports zero written records.
    pub fn run_batch(&mut self, event: &str) -> Result<BatchSummary, BatchError> {
        let request: BatchRequest = serde_json::from_str(event).map_err(BatchError::Event)?;
        self.run_request(&request)
    }

    pub fn run_request(&mut self, request: &BatchRequest) -> Result<BatchSummary, BatchError> {
        let results = run_batch(request, &self.config)?;
        let runs = results.len() as u64;
        let records: Vec<StepRecord> = results.into_iter().flatten().collect();

        // Runs executed in parallel; the sink sees a single writer.
        let records_written = match self.store.as_mut() {
            Some(store) => {
                store.persist_records(&records)?;
                records.len() as u64
            }
            None => 0,
        };

        let mut combination_ids: Vec<String> = records
            .iter()
            .map(|record| record.combination_id.clone())
            .collect();
        combination_ids.sort_unstable();
        combination_ids.dedup();

        Ok(BatchSummary {
            runs,
            records_written,
            combination_ids,
        })
    }

    /// Readback of one run's persisted records.
    pub fn load_run(&self, run_id: u64) -> Result<Vec<StepRecord>, PersistenceError> {
        match self.store.as_ref() {
            Some(store) => store.load_run(run_id),
            None => Err(PersistenceError::NotAttached),
        }
    }
}
