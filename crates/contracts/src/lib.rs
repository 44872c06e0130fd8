//! v1 cross-boundary contracts for the routing kernel, batch store, and CLI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Concrete parameters for one simulated organization.
///
/// Every field carries a serde default so a sparse combination map (or an
/// empty one) deserializes into a fully-populated parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    #[serde(default = "default_num_tasks")]
    pub num_tasks: usize,
    #[serde(default = "default_num_nodes")]
    pub num_nodes: usize,
    #[serde(default = "default_num_new_edges")]
    pub num_new_edges: usize,
    #[serde(default = "default_skills_proportion")]
    pub skills_proportion: f64,
    #[serde(default = "default_prob_memory")]
    pub prob_memory: f64,
    #[serde(default = "default_availability")]
    pub availability: f64,
    #[serde(default = "default_seed", with = "serde_u64_string")]
    pub seed: u64,
}

fn default_num_tasks() -> usize {
    8
}

fn default_num_nodes() -> usize {
    20
}

fn default_num_new_edges() -> usize {
    3
}

fn default_skills_proportion() -> f64 {
    0.1
}

fn default_prob_memory() -> f64 {
    0.6
}

fn default_availability() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    1337
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            num_tasks: default_num_tasks(),
            num_nodes: default_num_nodes(),
            num_new_edges: default_num_new_edges(),
            skills_proportion: default_skills_proportion(),
            prob_memory: default_prob_memory(),
            availability: default_availability(),
            seed: default_seed(),
        }
    }
}

/// Budget and sampling cadence for one run of the executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
    #[serde(default = "default_data_collection_period")]
    pub data_collection_period: i64,
}

fn default_max_steps() -> u64 {
    100
}

fn default_data_collection_period() -> i64 {
    -1
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            data_collection_period: default_data_collection_period(),
        }
    }
}

/// One fully-resolved parameter assignment plus its derived identifier.
///
/// The identifier concatenates `name` then the rendered value for every
/// parameter in map-iteration order (sorted, since the map is a `BTreeMap`),
/// so it is a pure function of the key/value pairs. The sink relies on that
/// for idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Combination {
    pub values: BTreeMap<String, Value>,
    pub combination_id: String,
}

impl Combination {
    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        let mut combination_id = String::new();
        for (name, value) in &values {
            combination_id.push_str(name);
            combination_id.push_str(&render_scalar(value));
        }
        Self {
            values,
            combination_id,
        }
    }

    /// Resolve the combination into concrete model parameters, filling any
    /// parameter the sweep left out with its default.
    pub fn to_model_params(&self) -> Result<ModelParams, serde_json::Error> {
        let map: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(map))
    }
}

/// Render a scalar the way it appears inside a combination identifier:
/// strings bare, everything else in its JSON form.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Batch trigger payload: a mandatory repeat count plus the raw parameter
/// mapping handed to the combinator. Unknown keys all land in `parameters`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRequest {
    pub iterations: u64,
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Value>,
}

/// One flattened per-(run, iteration, step) record for the downstream sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub schema_version: String,
    #[serde(rename = "RunId")]
    pub run_id: u64,
    pub iteration: u64,
    #[serde(rename = "Step")]
    pub step: u64,
    #[serde(flatten)]
    pub params: ModelParams,
    pub combination_id: String,
    pub actor_sequence_lst: String,
    pub time_lst: String,
}

impl StepRecord {
    pub fn new(
        run_id: u64,
        iteration: u64,
        step: u64,
        params: ModelParams,
        combination_id: String,
        routines: &impl Serialize,
        times: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id,
            iteration,
            step,
            params,
            combination_id,
            actor_sequence_lst: serde_json::to_string(routines)?,
            time_lst: serde_json::to_string(times)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_params_fill_defaults_from_sparse_map() {
        let params: ModelParams =
            serde_json::from_value(json!({ "num_nodes": 5, "seed": 9 })).expect("deserialize");
        assert_eq!(params.num_nodes, 5);
        assert_eq!(params.seed, 9);
        assert_eq!(params.num_tasks, 8);
        assert_eq!(params.num_new_edges, 3);
    }

    #[test]
    fn combination_id_concatenates_in_key_order() {
        let mut values = BTreeMap::new();
        values.insert("b".to_string(), json!("x"));
        values.insert("a".to_string(), json!(1));
        let combination = Combination::from_values(values);
        assert_eq!(combination.combination_id, "a1bx");
    }

    #[test]
    fn combination_resolves_to_params_with_defaults() {
        let mut values = BTreeMap::new();
        values.insert("num_nodes".to_string(), json!(6));
        values.insert("availability".to_string(), json!(1.0));
        let params = Combination::from_values(values)
            .to_model_params()
            .expect("valid params");
        assert_eq!(params.num_nodes, 6);
        assert_eq!(params.availability, 1.0);
        assert_eq!(params.prob_memory, 0.6);
    }

    #[test]
    fn batch_request_splits_iterations_from_parameters() {
        let request: BatchRequest = serde_json::from_value(json!({
            "iterations": 3,
            "num_nodes": [10, 20],
            "prob_memory": 0.5
        }))
        .expect("deserialize");
        assert_eq!(request.iterations, 3);
        assert_eq!(request.parameters.len(), 2);
        assert!(request.parameters.contains_key("num_nodes"));
    }

    #[test]
    fn batch_request_requires_iterations() {
        assert!(serde_json::from_value::<BatchRequest>(json!({ "num_nodes": 10 })).is_err());
    }

    #[test]
    fn step_record_serializes_sink_fields() {
        let record = StepRecord::new(
            4,
            1,
            99,
            ModelParams::default(),
            "num_nodes20".to_string(),
            &vec![serde_json::Map::new()],
            &vec![7_u64],
        )
        .expect("record");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["RunId"], 4);
        assert_eq!(value["Step"], 99);
        assert_eq!(value["num_nodes"], 20);
        assert_eq!(value["seed"], "1337");
        assert_eq!(value["time_lst"], "[7]");
    }
}
