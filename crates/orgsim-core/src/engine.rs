//! Problem engine: the per-step search/assignment state machine.
//!
//! One engine owns one problem at a time — an ordered pool of unsolved
//! tasks, a FIFO frontier of candidate actors, and elapsed-cost accounting.
//! Solving the last task archives the problem and immediately seeds a fresh
//! one from a new random initial actor, so a run is an unbroken sequence of
//! problems driven by `step()`.

use std::collections::{BTreeMap, VecDeque};

use contracts::ModelParams;

use crate::actor::Actor;
use crate::error::ModelError;
use crate::recorder::{MetricsRecorder, StepSnapshot};
use crate::rng::Rng64;
use crate::topology::Topology;
use crate::{ActorId, TaskId};

/// Discrete cost charged per step phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCost {
    Searching,
    Working,
}

impl TimeCost {
    pub fn units(self) -> u64 {
        match self {
            Self::Searching => 1,
            Self::Working => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemStatus {
    Initial,
    Searching,
    Working,
}

/// Transient search-tree bookkeeping, reset for every task. Index-based so
/// actors carry no back-references.
#[derive(Debug, Clone)]
struct SearchState {
    explored: Vec<bool>,
    parent: Vec<Option<ActorId>>,
}

impl SearchState {
    fn new(num_actors: usize) -> Self {
        Self {
            explored: vec![false; num_actors],
            parent: vec![None; num_actors],
        }
    }

    fn reset(&mut self) {
        self.explored.fill(false);
        self.parent.fill(None);
    }
}

#[derive(Debug)]
pub struct ProblemEngine {
    params: ModelParams,
    topology: Topology,
    actors: Vec<Actor>,
    rng: Rng64,
    search: SearchState,
    frontier: VecDeque<ActorId>,
    tasks_remaining: VecDeque<TaskId>,
    status: ProblemStatus,
    elapsed_time: u64,
    routine: BTreeMap<TaskId, ActorId>,
    completed_routines: Vec<BTreeMap<TaskId, ActorId>>,
    completed_times: Vec<u64>,
    completed_problems: u64,
    recorder: MetricsRecorder,
}

impl ProblemEngine {
    pub fn new(params: ModelParams, run_seed: u64) -> Result<Self, ModelError> {
        if params.num_tasks < 1 {
            return Err(ModelError::InvalidParameter(format!(
                "num_tasks must be at least 1, got {}",
                params.num_tasks
            )));
        }

        let mut rng = Rng64::new(run_seed);
        let topology =
            Topology::preferential_attachment(params.num_nodes, params.num_new_edges, &mut rng)?;

        let mut actors: Vec<Actor> = (0..params.num_nodes)
            .map(|id| Actor::new(id, params.availability))
            .collect();
        let skilled_per_task =
            (params.num_nodes as f64 * params.skills_proportion).ceil() as usize;
        for task in 0..params.num_tasks {
            for actor_id in rng.sample_distinct(params.num_nodes, skilled_per_task) {
                actors[actor_id].skills.insert(task);
            }
        }

        let num_actors = actors.len();
        let mut engine = Self {
            params,
            topology,
            actors,
            rng,
            search: SearchState::new(num_actors),
            frontier: VecDeque::new(),
            tasks_remaining: VecDeque::new(),
            status: ProblemStatus::Initial,
            elapsed_time: 0,
            routine: BTreeMap::new(),
            completed_routines: Vec::new(),
            completed_times: Vec::new(),
            completed_problems: 0,
            recorder: MetricsRecorder::new(),
        };
        engine.init_problem();
        Ok(engine)
    }

    /// Seed a fresh problem: random initial actor, full task pool, cleared
    /// routine and clock. The prior problem's solver is not carried over.
    fn init_problem(&mut self) {
        self.search.reset();
        let initial = self.rng.index(self.params.num_nodes);
        self.search.explored[initial] = true;
        self.frontier.clear();
        self.frontier.push_back(initial);
        self.status = ProblemStatus::Initial;
        self.routine.clear();
        self.tasks_remaining = (0..self.params.num_tasks).collect();
        self.elapsed_time = 0;
    }

    /// One discrete step: finalize a pending assignment if an available
    /// candidate was found last step, then advance the search for the
    /// current task, then snapshot the recorder.
    pub fn step(&mut self) -> Result<(), ModelError> {
        if self.status == ProblemStatus::Working {
            if let (Some(&solver), Some(&task)) =
                (self.frontier.front(), self.tasks_remaining.front())
            {
                self.elapsed_time += TimeCost::Working.units();
                self.routine.insert(task, solver);
                self.propagate_success(task, solver);
                self.tasks_remaining.pop_front();
                // Fresh search tree for the next task.
                self.search.reset();
                self.status = ProblemStatus::Searching;

                if self.tasks_remaining.is_empty() {
                    self.completed_problems += 1;
                    self.completed_routines.push(std::mem::take(&mut self.routine));
                    self.completed_times.push(self.elapsed_time);
                    self.init_problem();
                }
            }
        }

        let Some(&current) = self.frontier.front() else {
            return Err(ModelError::Stalled {
                completed_problems: self.completed_problems,
            });
        };
        let Some(&task) = self.tasks_remaining.front() else {
            return Err(ModelError::Stalled {
                completed_problems: self.completed_problems,
            });
        };

        self.elapsed_time += TimeCost::Searching.units();

        let candidate = if self.actors[current].has_skill(task) {
            Some(current)
        } else {
            self.actors[current].recall(task, &mut self.rng)
        };

        match candidate {
            Some(candidate) => {
                if self.actors[candidate].is_available(&mut self.rng) {
                    // The rest of the frontier is abandoned; the assignment
                    // is finalized on the next step.
                    self.frontier.clear();
                    self.frontier.push_back(candidate);
                    self.status = ProblemStatus::Working;
                } else {
                    // Deferred retry: the busy candidate goes to the tail.
                    self.frontier.pop_front();
                    self.frontier.push_back(candidate);
                    self.status = ProblemStatus::Searching;
                }
            }
            None => {
                // Dead end: expand unexplored neighbors breadth-first.
                self.frontier.pop_front();
                for &neighbor in self.topology.neighbors(current) {
                    if !self.search.explored[neighbor]
                        && self.search.parent[current] != Some(neighbor)
                    {
                        self.search.explored[neighbor] = true;
                        self.search.parent[neighbor] = Some(current);
                        self.frontier.push_back(neighbor);
                    }
                }
                self.status = ProblemStatus::Searching;
            }
        }

        self.recorder.record(StepSnapshot {
            problem_time: self.elapsed_time,
            routines: self.completed_routines.clone(),
            times: self.completed_times.clone(),
        });

        Ok(())
    }

    /// Walk the parent chain above the solving actor; every ancestor learns
    /// about the original solver (not the intermediate relays).
    fn propagate_success(&mut self, task: TaskId, solver: ActorId) {
        let retention = self.params.prob_memory;
        let mut ancestor = self.search.parent[solver];
        while let Some(id) = ancestor {
            ancestor = self.search.parent[id];
            self.actors[id].learn(task, solver, retention, &mut self.rng);
        }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        &self.actors[id]
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn status(&self) -> ProblemStatus {
        self.status
    }

    /// Head of the frontier: the actor being tried this step.
    pub fn current_actor(&self) -> Option<ActorId> {
        self.frontier.front().copied()
    }

    pub fn elapsed_time(&self) -> u64 {
        self.elapsed_time
    }

    /// Problems completed so far — the run-level step counter consumed by
    /// budgets and sampling.
    pub fn completed_problems(&self) -> u64 {
        self.completed_problems
    }

    pub fn completed_routines(&self) -> &[BTreeMap<TaskId, ActorId>] {
        &self.completed_routines
    }

    pub fn completed_times(&self) -> &[u64] {
        &self.completed_times
    }

    pub fn recorder(&self) -> &MetricsRecorder {
        &self.recorder
    }
}
