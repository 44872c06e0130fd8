//! Per-step metrics history for one run.

use std::collections::BTreeMap;

use crate::{ActorId, TaskId};

/// Model-level values captured at the end of one discrete step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSnapshot {
    /// Elapsed cost units of the problem in progress.
    pub problem_time: u64,
    /// Routines of every problem completed so far.
    pub routines: Vec<BTreeMap<TaskId, ActorId>>,
    /// Total times of every problem completed so far.
    pub times: Vec<u64>,
}

/// Append-only, in-memory, one entry per discrete step. No eviction;
/// lifetime is one run.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    history: Vec<StepSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: StepSnapshot) {
        self.history.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepSnapshot> {
        self.history.get(index)
    }

    pub fn history(&self) -> &[StepSnapshot] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(problem_time: u64) -> StepSnapshot {
        StepSnapshot {
            problem_time,
            routines: Vec::new(),
            times: Vec::new(),
        }
    }

    #[test]
    fn history_appends_in_order() {
        let mut recorder = MetricsRecorder::new();
        recorder.record(snapshot(1));
        recorder.record(snapshot(2));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.get(0).map(|s| s.problem_time), Some(1));
        assert_eq!(recorder.get(1).map(|s| s.problem_time), Some(2));
        assert_eq!(recorder.get(2), None);
    }
}
