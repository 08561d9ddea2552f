//! Fixed-point presolve: six passes run in order, repeated until a round
//! makes no further progress. Every action either fixes a variable,
//! tightens a bound, disables a constraint, or substitutes a dependent
//! variable out of the model; the round loop stops as soon as neither the
//! mutable-variable count nor the enabled-constraint count drops.

use std::collections::HashMap;

use crate::classify::ConstraintType;
use crate::error::SolverError;
use crate::model::{ConstraintId, ConstraintSense, ModelStore, VariableId};

#[derive(Debug, Default, Clone)]
pub struct PresolveReport {
    pub rounds: usize,
    pub variables_fixed: usize,
    pub constraints_disabled: usize,
    pub dependents_extracted: usize,
    pub selections_extracted: usize,
}

pub struct Presolver {
    max_rounds: usize,
}

impl Default for Presolver {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Presolver {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    pub fn run(&self, store: &mut ModelStore) -> Result<PresolveReport, SolverError> {
        let mut report = PresolveReport::default();
        for _ in 0..self.max_rounds {
            let before = (store.mutable_variable_count(), store.enabled_constraint_count());

            self.redundant_constraint_removal(store, &mut report)?;
            self.independent_variable_fixing(store, &mut report);
            self.implicit_fix(store, &mut report);
            self.redundant_variable_fixing(store, &mut report);
            self.dependent_variable_extraction(store, &mut report);
            self.selection_extraction(store, &mut report);

            report.rounds += 1;
            let after = (store.mutable_variable_count(), store.enabled_constraint_count());
            if after == before {
                break;
            }
        }
        Ok(report)
    }

    /// Disables constraints whose sense holds for every value the
    /// expression can take given current bounds; singleton constraints are
    /// used to fix or tighten their one mutable variable first. A row with
    /// no mutable variable left that the bounds can never satisfy, or a
    /// singleton whose implied bound empties its variable's domain, proves
    /// the instance infeasible.
    fn redundant_constraint_removal(&self, store: &mut ModelStore, report: &mut PresolveReport) -> Result<(), SolverError> {
        let ids: Vec<ConstraintId> = (0..store.constraints.len()).map(ConstraintId).collect();
        for id in ids {
            if !store.constraints[id.0].enabled {
                continue;
            }
            let expr_id = store.constraints[id.0].expression;
            let terms = store.expressions[expr_id.0].terms.clone();
            let constant = store.expressions[expr_id.0].constant;
            let sense = store.constraints[id.0].sense;
            let rhs = store.constraints[id.0].rhs;
            let name = store.constraints[id.0].name.clone();

            let mut min_lhs = constant;
            let mut max_lhs = constant;
            for (v, c) in &terms {
                let lower = store.variables[v.0].lower as f64;
                let upper = store.variables[v.0].upper as f64;
                if *c >= 0.0 {
                    min_lhs += c * lower;
                    max_lhs += c * upper;
                } else {
                    min_lhs += c * upper;
                    max_lhs += c * lower;
                }
            }

            let eps = 1e-9;
            let always_holds = match sense {
                ConstraintSense::Le => max_lhs <= rhs + eps,
                ConstraintSense::Ge => min_lhs >= rhs - eps,
                ConstraintSense::Eq => (max_lhs - min_lhs).abs() < eps && (min_lhs - rhs).abs() < eps,
            };
            let never_holds = match sense {
                ConstraintSense::Le => min_lhs > rhs + eps,
                ConstraintSense::Ge => max_lhs < rhs - eps,
                ConstraintSense::Eq => min_lhs > rhs + eps || max_lhs < rhs - eps,
            };

            let mutable: Vec<(VariableId, f64)> = terms.iter().filter(|(v, _)| !store.variables[v.0].fixed).copied().collect();

            if mutable.is_empty() {
                if never_holds {
                    return Err(SolverError::InfeasibleByConstruction {
                        message: format!("constraint '{name}' cannot be satisfied by any fixed variable's value"),
                    });
                }
                store.disable_constraint(id);
                report.constraints_disabled += 1;
            } else if mutable.len() == 1 {
                let (var, coeff) = mutable[0];
                let other = store.expressions[expr_id.0].value - coeff * store.variables[var.0].value as f64;
                if let Some((lo, hi)) = singleton_tighten(coeff, other, rhs, sense) {
                    let lo = lo.unwrap_or(i64::MIN).max(store.variables[var.0].lower);
                    let hi = hi.unwrap_or(i64::MAX).min(store.variables[var.0].upper);
                    if lo > hi {
                        return Err(SolverError::InfeasibleByConstruction {
                            message: format!("constraint '{name}' leaves variable '{}' with an empty domain", store.variables[var.0].name),
                        });
                    }
                    store.tighten_bounds(var, lo, hi);
                    report.variables_fixed += 1;
                }
                store.disable_constraint(id);
                report.constraints_disabled += 1;
            } else if always_holds {
                store.disable_constraint(id);
                report.constraints_disabled += 1;
            }
        }
        Ok(())
    }

    /// A mutable variable touched by no enabled constraint is fixed to
    /// whichever bound is best for the objective.
    fn independent_variable_fixing(&self, store: &mut ModelStore, report: &mut PresolveReport) {
        let ids: Vec<VariableId> = (0..store.variables.len()).map(VariableId).collect();
        for id in ids {
            if store.variables[id.0].fixed || store.variables[id.0].dependent_expression.is_some() {
                continue;
            }
            let touches_enabled = store.related_constraints(id).next().is_some();
            if touches_enabled {
                continue;
            }
            let coeff = store.variables[id.0].objective_coefficient;
            let lower = store.variables[id.0].lower;
            let upper = store.variables[id.0].upper;
            let value = if coeff.abs() < 1e-12 {
                if lower <= 0 && upper >= 0 { 0 } else { lower }
            } else if (coeff > 0.0) == store.minimize {
                lower
            } else {
                upper
            };
            store.fix_variable(id, value);
            report.variables_fixed += 1;
        }
    }

    /// Any variable whose bounds have already collapsed is marked fixed.
    fn implicit_fix(&self, store: &mut ModelStore, report: &mut PresolveReport) {
        let ids: Vec<VariableId> = (0..store.variables.len()).map(VariableId).collect();
        for id in ids {
            if !store.variables[id.0].fixed && store.variables[id.0].lower == store.variables[id.0].upper {
                let value = store.variables[id.0].lower;
                store.fix_variable(id, value);
                report.variables_fixed += 1;
            }
        }
    }

    /// For set-partitioning/-packing/-covering models, a binary strictly
    /// costlier than another with an identical constraint pattern can never
    /// help; fix it to 0.
    fn redundant_variable_fixing(&self, store: &mut ModelStore, report: &mut PresolveReport) {
        let is_partition_like = |t: ConstraintType| {
            matches!(
                t,
                ConstraintType::SetPartitioning | ConstraintType::SetPacking | ConstraintType::SetCovering
            )
        };

        let mut signatures: HashMap<String, Vec<VariableId>> = HashMap::new();
        for (i, var) in store.variables.iter().enumerate() {
            if var.fixed || !var.is_binary() || var.dependent_expression.is_some() {
                continue;
            }
            let mut pattern: Vec<(usize, String)> = var
                .related_constraints
                .iter()
                .filter(|(c, _)| store.constraints[c.0].enabled && is_partition_like(store.constraints[c.0].classified_type))
                .map(|(c, coeff)| (c.0, format!("{:.6}", coeff)))
                .collect();
            if pattern.is_empty() {
                continue;
            }
            pattern.sort();
            let key = pattern.iter().map(|(c, w)| format!("{c}:{w}")).collect::<Vec<_>>().join(",");
            signatures.entry(key).or_default().push(VariableId(i));
        }

        for group in signatures.into_values() {
            if group.len() < 2 {
                continue;
            }
            let target = if store.minimize {
                group.iter().map(|v| store.variables[v.0].objective_coefficient).fold(f64::INFINITY, f64::min)
            } else {
                group.iter().map(|v| store.variables[v.0].objective_coefficient).fold(f64::NEG_INFINITY, f64::max)
            };
            for var in group {
                let coeff = store.variables[var.0].objective_coefficient;
                let dominated = if store.minimize { coeff > target + 1e-9 } else { coeff < target - 1e-9 };
                if dominated {
                    store.fix_variable(var, 0);
                    report.variables_fixed += 1;
                }
            }
        }
    }

    /// Substitutes out the determined variable of closed-form equality
    /// constraints, creating bound-preserving inequalities on the
    /// remaining expression when the eliminated variable had finite bounds.
    fn dependent_variable_extraction(&self, store: &mut ModelStore, report: &mut PresolveReport) {
        let ids: Vec<ConstraintId> = (0..store.constraints.len()).map(ConstraintId).collect();
        for id in ids {
            if !store.constraints[id.0].enabled {
                continue;
            }
            let ctype = store.constraints[id.0].classified_type;
            let extractable = matches!(
                ctype,
                ConstraintType::ExclusiveOr
                    | ConstraintType::ExclusiveNor
                    | ConstraintType::InvertedIntegers
                    | ConstraintType::BalancedIntegers
                    | ConstraintType::ConstantSumIntegers
                    | ConstraintType::ConstantDifferenceIntegers
                    | ConstraintType::ConstantRatioIntegers
                    | ConstraintType::TrinomialExclusiveNor
                    | ConstraintType::Intermediate
            );
            if !extractable {
                continue;
            }

            let expr_id = store.constraints[id.0].expression;
            let terms = store.expressions[expr_id.0].terms.clone();
            let constant = store.expressions[expr_id.0].constant;
            let rhs = store.constraints[id.0].rhs;

            let chosen = store.constraints[id.0].auxiliary_variable.or_else(|| {
                terms
                    .iter()
                    .find(|(v, c)| !store.variables[v.0].fixed && (c.abs() - 1.0).abs() < 1e-9)
                    .map(|(v, _)| *v)
            });
            let Some(var) = chosen else { continue };
            let Some((_, var_coeff)) = terms.iter().find(|(v, _)| *v == var).copied() else {
                continue;
            };
            if var_coeff.abs() < 1e-12 || store.variables[var.0].dependent_expression.is_some() {
                continue;
            }

            let other_terms: Vec<(VariableId, f64)> = terms
                .iter()
                .filter(|(v, _)| *v != var)
                .map(|(v, c)| (*v, -c / var_coeff))
                .collect();
            let other_constant = (rhs - constant) / var_coeff;

            let lower = store.variables[var.0].lower;
            let upper = store.variables[var.0].upper;

            let dependent_expr = store.create_expression(other_terms.clone(), other_constant);
            store.make_dependent(var, dependent_expr);
            store.disable_constraint(id);
            report.dependents_extracted += 1;
            report.constraints_disabled += 1;

            if lower > i64::MIN / 2 {
                let expr_ge = store.create_expression(other_terms.clone(), other_constant);
                store.create_constraint(format!("{}_dep_lb", store.constraints[id.0].name), expr_ge, ConstraintSense::Ge, lower as f64);
            }
            if upper < i64::MAX / 2 {
                let expr_le = store.create_expression(other_terms, other_constant);
                store.create_constraint(format!("{}_dep_ub", store.constraints[id.0].name), expr_le, ConstraintSense::Le, upper as f64);
            }
        }
    }

    /// Greedily selects a non-overlapping, smallest-first set of
    /// set-partitioning equalities and turns their members into Selections.
    fn selection_extraction(&self, store: &mut ModelStore, report: &mut PresolveReport) {
        let mut candidates: Vec<(ConstraintId, usize)> = (0..store.constraints.len())
            .map(ConstraintId)
            .filter(|id| store.constraints[id.0].enabled && store.constraints[id.0].classified_type == ConstraintType::SetPartitioning)
            .map(|id| {
                let expr_id = store.constraints[id.0].expression;
                (id, store.expressions[expr_id.0].terms.len())
            })
            .collect();
        candidates.sort_by_key(|(_, size)| *size);

        let mut used: std::collections::HashSet<VariableId> = std::collections::HashSet::new();
        for (id, _) in candidates {
            let expr_id = store.constraints[id.0].expression;
            let members: Vec<VariableId> = store.expressions[expr_id.0].terms.iter().map(|(v, _)| *v).collect();
            if members.iter().any(|v| used.contains(v) || store.variables[v.0].fixed) {
                continue;
            }
            let selected = members
                .iter()
                .copied()
                .find(|v| store.variables[v.0].value == 1)
                .unwrap_or(members[0]);
            for &m in &members {
                used.insert(m);
            }
            store.create_selection(members, id, selected);
            store.disable_constraint(id);
            report.selections_extracted += 1;
        }
    }
}

/// For a singleton constraint `coeff*var + other <compare> rhs`, returns the
/// `(lower, upper)` bound implied on `var`.
fn singleton_tighten(coeff: f64, other: f64, rhs: f64, sense: ConstraintSense) -> Option<(Option<i64>, Option<i64>)> {
    if coeff.abs() < 1e-12 {
        return None;
    }
    let bound = (rhs - other) / coeff;
    Some(match sense {
        ConstraintSense::Eq => {
            let v = bound.round() as i64;
            (Some(v), Some(v))
        }
        ConstraintSense::Le => {
            if coeff > 0.0 {
                (None, Some(bound.floor() as i64))
            } else {
                (Some(bound.ceil() as i64), None)
            }
        }
        ConstraintSense::Ge => {
            if coeff > 0.0 {
                (Some(bound.ceil() as i64), None)
            } else {
                (None, Some(bound.floor() as i64))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintSense as CS;

    #[test]
    fn singleton_equality_fixes_variable() {
        let mut store = ModelStore::new(true);
        let x = store.create_variable("x", 0, 10);
        let expr = store.create_expression(vec![(x, 3.0)], 1.0);
        store.create_constraint("c", expr, CS::Eq, 7.0);
        store.set_objective(vec![(x, 1.0)], 0.0);

        let report = Presolver::new(6).run(&mut store).unwrap();
        assert_eq!(store.variables[x.0].lower, 2);
        assert_eq!(store.variables[x.0].upper, 2);
        assert!(store.variables[x.0].fixed);
        assert!(!store.constraints[0].enabled);
        assert!(report.variables_fixed >= 1);
    }

    #[test]
    fn independent_variable_is_fixed_to_objective_optimal_bound() {
        let mut store = ModelStore::new(true);
        let x = store.create_variable("x", -5, 5);
        store.set_objective(vec![(x, 2.0)], 0.0);

        Presolver::new(6).run(&mut store).unwrap();
        assert!(store.variables[x.0].fixed);
        assert_eq!(store.variables[x.0].lower, -5);
    }

    #[test]
    fn redundant_constraint_without_mutable_variables_is_disabled() {
        let mut store = ModelStore::new(true);
        let x = store.create_variable("x", 0, 1);
        let y = store.create_variable("y", 0, 1);
        let expr = store.create_expression(vec![(x, 1.0), (y, 1.0)], 0.0);
        store.create_constraint("always_holds", expr, CS::Le, 5.0);
        store.set_objective(vec![(x, 1.0), (y, 1.0)], 0.0);

        Presolver::new(6).run(&mut store).unwrap();
        assert!(!store.constraints[0].enabled);
    }

    #[test]
    fn redundant_constraint_with_no_mutable_variables_left_is_infeasible() {
        let mut store = ModelStore::new(true);
        let x = store.create_variable("x", 0, 0);
        let expr = store.create_expression(vec![(x, 1.0)], 0.0);
        store.create_constraint("unsatisfiable", expr, CS::Ge, 5.0);
        store.set_objective(vec![(x, 1.0)], 0.0);

        let err = Presolver::new(6).run(&mut store).unwrap_err();
        assert!(matches!(err, SolverError::InfeasibleByConstruction { .. }));
    }

    #[test]
    fn set_partitioning_equality_becomes_a_selection() {
        let mut store = ModelStore::new(true);
        let a = store.create_variable("a", 0, 1);
        let b = store.create_variable("b", 0, 1);
        let c = store.create_variable("c", 0, 1);
        let expr = store.create_expression(vec![(a, 1.0), (b, 1.0), (c, 1.0)], 0.0);
        store.create_constraint("partition", expr, CS::Eq, 1.0);
        // Equal costs: no pair strictly dominates another, so redundant-variable
        // fixing leaves all three free for selection extraction to claim.
        store.set_objective(vec![(a, 1.0), (b, 1.0), (c, 1.0)], 0.0);

        let report = Presolver::new(6).run(&mut store).unwrap();
        assert_eq!(report.selections_extracted, 1);
        assert_eq!(store.selections.len(), 1);
        assert!(!store.constraints[0].enabled);
    }
}
