//! Bridges a parsed [`loaders::model::RawModel`] into a [`ModelStore`], and
//! reads the optional side files the CLI table accepts (`-i`, `-m`, `-f`,
//! `-s`, `-x`).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use loaders::model::{RawModel, RawSense};
use problemo::Problem;
use problemo::common::IntoCommonProblem;

use crate::error::SolverWarning;
use crate::model::{ConstraintSense, ModelStore, VariableId};

fn to_sense(sense: RawSense) -> ConstraintSense {
    match sense {
        RawSense::Le => ConstraintSense::Le,
        RawSense::Eq => ConstraintSense::Eq,
        RawSense::Ge => ConstraintSense::Ge,
    }
}

/// Builds a `ModelStore` from a raw parsed instance. `force_minimize`
/// overrides the parsed objective sense when `--minimize`/`--maximize` was
/// given on the command line.
pub fn build_model_store(raw: &RawModel, force_minimize: Option<bool>) -> Result<ModelStore, Problem> {
    let minimize = force_minimize.unwrap_or(raw.minimize);
    let mut store = ModelStore::new(minimize);
    let mut by_name: HashMap<String, VariableId> = HashMap::with_capacity(raw.variable_order.len());

    for name in &raw.variable_order {
        let bound = raw.bounds.get(name).copied().unwrap_or_default();
        if bound.lower > bound.upper {
            return Err(format!("variable '{name}' has lower bound {} greater than upper bound {}", bound.lower, bound.upper).gloss());
        }
        let id = store.create_variable(name.clone(), bound.lower, bound.upper);
        by_name.insert(name.clone(), id);
    }

    for constraint in &raw.constraints {
        let mut terms = Vec::with_capacity(constraint.coefficients.len());
        for (name, coeff) in &constraint.coefficients {
            let Some(&id) = by_name.get(name) else {
                return Err(format!("constraint '{}' references undeclared variable '{name}'", constraint.name).gloss());
            };
            terms.push((id, *coeff));
        }
        let expr = store.create_expression(terms, 0.0);
        let constraint_id = store.create_constraint(constraint.name.clone(), expr, to_sense(constraint.sense), constraint.rhs);
        if let Some(weight) = constraint.weight {
            store.constraints[constraint_id.0].soft_weight = Some(weight);
            store.constraints[constraint_id.0].local_penalty_coefficient = weight;
            store.constraints[constraint_id.0].global_penalty_coefficient = weight;
        }
    }
    store.recompute_penalty_totals();

    let mut objective_terms = Vec::with_capacity(raw.objective.len());
    for (name, coeff) in &raw.objective {
        let Some(&id) = by_name.get(name) else {
            return Err(format!("objective references undeclared variable '{name}'").gloss());
        };
        objective_terms.push((id, *coeff));
    }
    store.set_objective(objective_terms, raw.objective_constant);

    Ok(store)
}

/// Reads an initial solution file (`name value` per line), applying each
/// value and correcting out-of-bound entries with a warning, per the
/// InvalidInitialValue recovery policy. Fixed variables with a conflicting
/// initial value are a hard error.
pub fn apply_initial_solution(
    store: &mut ModelStore,
    by_name: &HashMap<String, VariableId>,
    path: impl AsRef<Path>,
) -> Result<Vec<SolverWarning>, Problem> {
    let text = fs::read_to_string(&path).map_err(|e| e.to_string().gloss())?;
    let mut warnings = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(name), Some(raw_value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(&id) = by_name.get(name) else {
            return Err(format!("initial solution references undeclared variable '{name}'").gloss());
        };
        let value: i64 = raw_value
            .parse()
            .map_err(|_| format!("initial value for '{name}' is not an integer: '{raw_value}'").gloss())?;

        let var = &store.variables[id.0];
        if value < var.lower || value > var.upper {
            if var.fixed {
                return Err(format!("initial value {value} for fixed variable '{name}' conflicts with its bound").gloss());
            }
            let corrected = value.clamp(var.lower, var.upper);
            warnings.push(SolverWarning::InitialValueCorrected {
                variable: name.to_string(),
                from: value,
                to: corrected,
            });
            store.set_variable_value(id, corrected);
        } else {
            store.set_variable_value(id, value);
        }
    }
    Ok(warnings)
}

/// Reads a newline-separated list of variable names and fixes each to its
/// current value, honouring `-f`.
pub fn apply_fixed_list(store: &mut ModelStore, by_name: &HashMap<String, VariableId>, path: impl AsRef<Path>) -> Result<(), Problem> {
    let text = fs::read_to_string(&path).map_err(|e| e.to_string().gloss())?;
    for name in text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
        let Some(&id) = by_name.get(name) else {
            return Err(format!("fixed-variable list references undeclared variable '{name}'").gloss());
        };
        let value = store.variables[id.0].value;
        store.fix_variable(id, value);
    }
    Ok(())
}

/// Reads pairs of variable names, one pair per line, as user-defined
/// flippable pairs (`-x`); returned for the chain-move generator to seed.
pub fn read_flippable_pairs(
    by_name: &HashMap<String, VariableId>,
    path: impl AsRef<Path>,
) -> Result<Vec<(VariableId, VariableId)>, Problem> {
    let text = fs::read_to_string(&path).map_err(|e| e.to_string().gloss())?;
    let mut pairs = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
        let mut parts = line.split_whitespace();
        let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
            return Err(format!("malformed flippable-pair line: '{line}'").gloss());
        };
        let (Some(&va), Some(&vb)) = (by_name.get(a), by_name.get(b)) else {
            return Err(format!("flippable pair references undeclared variable in line '{line}'").gloss());
        };
        pairs.push((va, vb));
    }
    Ok(pairs)
}

/// Reads newline-separated groups of variable names (space-separated per
/// line) as user-defined selection constraints (`-s`), registering each as
/// a `Selection` directly rather than via presolve extraction.
pub fn apply_user_selections(store: &mut ModelStore, by_name: &HashMap<String, VariableId>, path: impl AsRef<Path>) -> Result<(), Problem> {
    let text = fs::read_to_string(&path).map_err(|e| e.to_string().gloss())?;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
        let mut members = Vec::new();
        for name in line.split_whitespace() {
            let Some(&id) = by_name.get(name) else {
                return Err(format!("user-defined selection references undeclared variable '{name}'").gloss());
            };
            members.push(id);
        }
        if members.len() < 2 {
            return Err(format!("user-defined selection line '{line}' needs at least two members").gloss());
        }
        let terms: Vec<(VariableId, f64)> = members.iter().map(|v| (*v, 1.0)).collect();
        let expr = store.create_expression(terms, 0.0);
        let constraint_id = store.create_constraint("user_selection", expr, ConstraintSense::Eq, 1.0);
        let selected = members
            .iter()
            .copied()
            .find(|v| store.variables[v.0].value == 1)
            .unwrap_or(members[0]);
        store.create_selection(members, constraint_id, selected);
        store.disable_constraint(constraint_id);
    }
    Ok(())
}
