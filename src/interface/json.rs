//! Canonical JSON rendering of an instance and of a solution, used by
//! `--export-json-instance` and by the general-purpose (non-PB-competition)
//! output path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use loaders::model::{RawBound, RawConstraint, RawModel, RawSense};
use problemo::Problem;
use problemo::common::IntoCommonProblem;

use crate::Status;
use crate::model::{ConstraintSense, ModelStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonVariable {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonConstraint {
    pub name: String,
    pub coefficients: Vec<(String, f64)>,
    pub sense: String,
    pub rhs: f64,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonInstance {
    pub minimize: bool,
    pub variables: Vec<JsonVariable>,
    pub objective: Vec<(String, f64)>,
    pub objective_constant: f64,
    pub constraints: Vec<JsonConstraint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSolution {
    pub status: String,
    pub objective: f64,
    pub total_violation: f64,
    pub values: HashMap<String, i64>,
    pub constraint_values: HashMap<String, f64>,
    pub constraint_violations: HashMap<String, f64>,
}

fn sense_str(sense: ConstraintSense) -> &'static str {
    match sense {
        ConstraintSense::Le => "Le",
        ConstraintSense::Eq => "Eq",
        ConstraintSense::Ge => "Ge",
    }
}

fn sense_from_str(s: &str) -> Result<RawSense, Problem> {
    match s {
        "Le" => Ok(RawSense::Le),
        "Eq" => Ok(RawSense::Eq),
        "Ge" => Ok(RawSense::Ge),
        other => Err(format!("unknown constraint sense in JSON instance: '{other}'").gloss()),
    }
}

/// Dumps the model's declared structure (not the current search state) as a
/// `JsonInstance`, the canonical form `--export-json-instance` writes.
pub fn dump_instance(store: &ModelStore) -> JsonInstance {
    let variables = store
        .variables
        .iter()
        .map(|v| JsonVariable {
            name: v.name.clone(),
            lower: v.lower,
            upper: v.upper,
            value: v.value,
        })
        .collect();

    let objective = store
        .expressions[store.objective_expression.0]
        .terms
        .iter()
        .map(|(v, c)| (store.variables[v.0].name.clone(), *c))
        .collect();

    let constraints = store
        .constraints
        .iter()
        .map(|c| JsonConstraint {
            name: c.name.clone(),
            coefficients: store.expressions[c.expression.0]
                .terms
                .iter()
                .map(|(v, coeff)| (store.variables[v.0].name.clone(), *coeff))
                .collect(),
            sense: sense_str(c.sense).to_string(),
            rhs: c.rhs,
            weight: c.soft_weight,
        })
        .collect();

    JsonInstance {
        minimize: store.minimize,
        variables,
        objective,
        objective_constant: store.expressions[store.objective_expression.0].constant,
        constraints,
    }
}

/// Reconstructs a `RawModel` from a previously dumped `JsonInstance`, the
/// other half of the JSON round trip.
pub fn parse_instance(text: &str) -> Result<RawModel, Problem> {
    let instance: JsonInstance = serde_json::from_str(text).map_err(|e| e.to_string().gloss())?;

    let mut model = RawModel {
        minimize: instance.minimize,
        objective: instance.objective,
        objective_constant: instance.objective_constant,
        ..Default::default()
    };
    for var in &instance.variables {
        model.variable_order.push(var.name.clone());
        model.bounds.insert(var.name.clone(), RawBound { lower: var.lower, upper: var.upper });
    }
    for constraint in &instance.constraints {
        model.constraints.push(RawConstraint {
            name: constraint.name.clone(),
            coefficients: constraint.coefficients.clone(),
            sense: sense_from_str(&constraint.sense)?,
            rhs: constraint.rhs,
            weight: constraint.weight,
        });
    }
    Ok(model)
}

/// Dumps the named solution: variable assignment, expression/constraint
/// values and violations, final status.
pub fn dump_solution(store: &ModelStore, status: Status) -> JsonSolution {
    let values = store.variables.iter().map(|v| (v.name.clone(), v.value)).collect();
    let constraint_values = store
        .constraints
        .iter()
        .map(|c| (c.name.clone(), store.expressions[c.expression.0].value))
        .collect();
    let constraint_violations = store.constraints.iter().map(|c| (c.name.clone(), c.violation)).collect();

    JsonSolution {
        status: format!("{status:?}"),
        objective: store.objective_value,
        total_violation: store.total_violation(),
        values,
        constraint_values,
        constraint_violations,
    }
}
