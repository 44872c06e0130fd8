//! Parameter sweeps: expand a request's axes into concrete combinations.

use std::collections::BTreeMap;

use contracts::Combination;
use serde_json::Value;

use crate::error::ModelError;

/// Cartesian product over the request's parameter axes.
///
/// A scalar value is a one-element axis; an array contributes one
/// combination per element. Axes iterate in key order with the last key
/// varying fastest, so output order is deterministic. An empty array axis
/// yields zero combinations.
pub fn make_combinations(
    parameters: &BTreeMap<String, Value>,
) -> Result<Vec<Combination>, ModelError> {
    let mut axes: Vec<(&str, Vec<Value>)> = Vec::with_capacity(parameters.len());
    for (name, value) in parameters {
        let axis = match value {
            Value::Array(items) => items.clone(),
            Value::Null | Value::Object(_) => {
                return Err(ModelError::InvalidParameter(format!(
                    "parameter {name} must be a scalar or an array of scalars"
                )));
            }
            scalar => vec![scalar.clone()],
        };
        if axis
            .iter()
            .any(|item| matches!(item, Value::Null | Value::Object(_) | Value::Array(_)))
        {
            return Err(ModelError::InvalidParameter(format!(
                "parameter {name} must be a scalar or an array of scalars"
            )));
        }
        axes.push((name.as_str(), axis));
    }

    if axes.iter().any(|(_, axis)| axis.is_empty()) {
        return Ok(Vec::new());
    }

    let total: usize = axes.iter().map(|(_, axis)| axis.len()).product();
    let mut combinations = Vec::with_capacity(total);
    let mut odometer = vec![0_usize; axes.len()];

    for _ in 0..total {
        let values: BTreeMap<String, Value> = axes
            .iter()
            .zip(&odometer)
            .map(|((name, axis), &digit)| ((*name).to_owned(), axis[digit].clone()))
            .collect();
        combinations.push(Combination::from_values(values));

        // Rightmost axis varies fastest.
        for position in (0..axes.len()).rev() {
            odometer[position] += 1;
            if odometer[position] < axes[position].1.len() {
                break;
            }
            odometer[position] = 0;
        }
    }

    Ok(combinations)
}
