//! Deterministic word-of-mouth routing kernel.
//!
//! An organization is a preferential-attachment network of actors holding
//! skills and imperfect memory of who else can solve what. A problem routes
//! every task in a fixed pool to a capable actor through a frontier-driven
//! search with backtracking; the executor layer expands a parameter sweep
//! into independent runs, drives each to a step budget, and samples the
//! per-step metrics history at a configured cadence.

pub mod actor;
pub mod engine;
pub mod error;
pub mod executor;
pub mod recorder;
pub mod rng;
pub mod sweep;
pub mod topology;

/// Stable integer identity of an actor within one run.
pub type ActorId = usize;
/// Opaque task identifier drawn from the pool `0..num_tasks`.
pub type TaskId = usize;

pub use engine::{ProblemEngine, ProblemStatus, TimeCost};
pub use error::ModelError;
pub use executor::{execute_run, expand_runs, run_batch, sample_steps, RunPlan};
pub use sweep::make_combinations;
