//! Run executor: batch expansion, run budgets, and time-series sampling.

use contracts::{BatchRequest, Combination, ExecutorConfig, StepRecord};
use rayon::prelude::*;

use crate::engine::ProblemEngine;
use crate::error::ModelError;
use crate::rng::mix_seed;
use crate::sweep::make_combinations;

/// One scheduled run: an iteration of a parameter combination with its
/// batch-unique id.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub run_id: u64,
    pub iteration: u64,
    pub combination: Combination,
}

/// Expand a batch request into run plans: iteration-major over the sweep's
/// combinations, run ids assigned sequentially from zero.
pub fn expand_runs(request: &BatchRequest) -> Result<Vec<RunPlan>, ModelError> {
    let combinations = make_combinations(&request.parameters)?;
    let mut plans = Vec::with_capacity(combinations.len() * request.iterations as usize);
    let mut run_id = 0;
    for iteration in 0..request.iterations {
        for combination in &combinations {
            plans.push(RunPlan {
                run_id,
                iteration,
                combination: combination.clone(),
            });
            run_id += 1;
        }
    }
    Ok(plans)
}

/// History indices to report for a run that completed `problem_steps`
/// problems: every multiple of the period below the final index, then the
/// final index itself. A non-positive period keeps only the final index.
/// The terminal entry appears exactly once either way.
pub fn sample_steps(problem_steps: u64, period: i64) -> Vec<u64> {
    if problem_steps == 0 {
        return Vec::new();
    }
    let last = problem_steps - 1;
    let mut indices = Vec::new();
    if period > 0 {
        indices.extend((0..last).step_by(period as usize));
    }
    indices.push(last);
    indices
}

/// Drive one run to its problem budget and flatten the sampled history into
/// sink records. A stall fails the whole run.
pub fn execute_run(
    plan: &RunPlan,
    config: &ExecutorConfig,
) -> Result<Vec<StepRecord>, ModelError> {
    let params = plan
        .combination
        .to_model_params()
        .map_err(|err| ModelError::InvalidParameter(err.to_string()))?;
    let run_seed = mix_seed(params.seed, plan.run_id);
    let mut engine = ProblemEngine::new(params.clone(), run_seed)?;

    while engine.completed_problems() <= config.max_steps {
        engine.step()?;
    }

    let history = engine.recorder().history();
    let indices = sample_steps(engine.completed_problems(), config.data_collection_period);
    let mut records = Vec::with_capacity(indices.len());
    for index in indices {
        // Each problem spans several discrete steps, so problem-count
        // indices always land inside the per-step history.
        let snapshot = &history[index as usize];
        let record = StepRecord::new(
            plan.run_id,
            plan.iteration,
            index,
            params.clone(),
            plan.combination.combination_id.clone(),
            &snapshot.routines,
            &snapshot.times,
        )
        .map_err(|err| ModelError::Serialization(err.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

/// Execute every run of a batch in parallel. Runs share nothing mutable;
/// the first failure aborts the batch.
pub fn run_batch(
    request: &BatchRequest,
    config: &ExecutorConfig,
) -> Result<Vec<Vec<StepRecord>>, ModelError> {
    let plans = expand_runs(request)?;
    plans
        .par_iter()
        .map(|plan| execute_run(plan, config))
        .collect()
}
