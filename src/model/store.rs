use std::collections::HashMap;

use crate::classify::{self, ClassifyInput, ClassifySense, ClassifyVariable};

use super::constraint::{Constraint, ConstraintSense};
use super::expression::Expression;
use super::ids::{ConstraintId, ExpressionId, SelectionId, VariableId};
use super::moves::Move;
use super::selection::Selection;
use super::variable::{Variable, VariableSense};

/// Objective, per-constraint violations and augmented objective for one
/// candidate, without committing anything to the store.
#[derive(Debug, Clone)]
pub struct SolutionScore {
    pub objective: f64,
    /// Sum of `violations` below, i.e. violation among constraints touched
    /// by the evaluated move, not the whole model's violation.
    pub total_violation: f64,
    pub local_augmented: f64,
    pub global_augmented: f64,
    pub violations: Vec<(ConstraintId, f64)>,
}

/// Owns every entity arena and exposes the incremental evaluation API.
pub struct ModelStore {
    pub variables: Vec<Variable>,
    pub expressions: Vec<Expression>,
    pub constraints: Vec<Constraint>,
    pub selections: Vec<Selection>,
    pub objective_expression: ExpressionId,
    pub objective_value: f64,
    pub minimize: bool,
    /// true when the objective and every enabled constraint are linear;
    /// enables the O(touched-only) evaluation path.
    pub fast_path: bool,
    /// `Σ ρ_local_c * violation_c` and `Σ ρ_global_c * violation_c` over
    /// every enabled constraint, maintained incrementally so `evaluate_move`
    /// never has to re-sum the whole model.
    local_penalty_total: f64,
    global_penalty_total: f64,
}

impl ModelStore {
    pub fn new(minimize: bool) -> Self {
        let objective = Expression::linear(Vec::new(), 0.0);
        Self {
            variables: Vec::new(),
            expressions: vec![objective],
            constraints: Vec::new(),
            selections: Vec::new(),
            objective_expression: ExpressionId(0),
            objective_value: 0.0,
            minimize,
            fast_path: true,
            local_penalty_total: 0.0,
            global_penalty_total: 0.0,
        }
    }

    pub fn create_variable(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(Variable::new(name, lower, upper));
        id
    }

    pub fn create_expression(&mut self, terms: Vec<(VariableId, f64)>, constant: f64) -> ExpressionId {
        let id = ExpressionId(self.expressions.len());
        let mut expr = Expression::linear(terms, constant);
        expr.value = self.evaluate_expression_terms(&expr);
        self.expressions.push(expr);
        id
    }

    pub fn create_constraint(
        &mut self,
        name: impl Into<String>,
        expression: ExpressionId,
        sense: ConstraintSense,
        rhs: f64,
    ) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        let mut constraint = Constraint::new(name, expression, sense, rhs);
        let lhs = self.expressions[expression.0].value;
        constraint.violation = constraint.penalty(lhs);
        self.local_penalty_total += constraint.local_penalty_coefficient * constraint.violation;
        self.global_penalty_total += constraint.global_penalty_coefficient * constraint.violation;
        self.constraints.push(constraint);

        let coefficient_by_var: Vec<(VariableId, f64)> = self.expressions[expression.0].terms.clone();
        for (var, coeff) in coefficient_by_var {
            self.variables[var.0].related_constraints.push((id, coeff));
        }
        self.classify_constraint(id);
        id
    }

    pub fn set_objective(&mut self, terms: Vec<(VariableId, f64)>, constant: f64) {
        for (var, coeff) in &terms {
            self.variables[var.0].objective_coefficient = *coeff;
        }
        let mut expr = Expression::linear(terms, constant);
        expr.value = self.evaluate_expression_terms(&expr);
        self.expressions[self.objective_expression.0] = expr;
        self.objective_value = self.expressions[self.objective_expression.0].value;
    }

    fn evaluate_expression_terms(&self, expr: &Expression) -> f64 {
        expr.terms
            .iter()
            .map(|(v, c)| c * self.variables[v.0].value as f64)
            .sum::<f64>()
            + expr.constant
    }

    pub fn classify_constraint(&mut self, id: ConstraintId) {
        let expr_id = self.constraints[id.0].expression;
        let terms = self.expressions[expr_id.0].terms.clone();
        let nonlinear = self.expressions[expr_id.0].nonlinear;
        let vars: Vec<ClassifyVariable> = terms
            .iter()
            .map(|(v, c)| {
                let var = &self.variables[v.0];
                ClassifyVariable {
                    id: *v,
                    coefficient: *c,
                    lower: var.lower,
                    upper: var.upper,
                    fixed: var.fixed,
                }
            })
            .collect();
        let sense = match self.constraints[id.0].sense {
            ConstraintSense::Le => ClassifySense::Le,
            ConstraintSense::Eq => ClassifySense::Eq,
            ConstraintSense::Ge => ClassifySense::Ge,
        };
        let input = ClassifyInput {
            variables: &vars,
            sense,
            rhs: self.constraints[id.0].rhs,
            nonlinear,
        };
        let (ctype, aux) = classify::classify(&input);
        self.constraints[id.0].classified_type = ctype;
        self.constraints[id.0].auxiliary_variable = aux;
        if nonlinear {
            self.fast_path = false;
        }
    }

    /// Related, enabled constraints touched by `var`.
    pub fn related_constraints(&self, var: VariableId) -> impl Iterator<Item = (ConstraintId, f64)> + '_ {
        self.variables[var.0]
            .related_constraints
            .iter()
            .copied()
            .filter(|(c, _)| self.constraints[c.0].enabled)
    }

    /// Returns objective, per-constraint violations and augmented objective
    /// for `mv` without mutating committed state. Cost is proportional to
    /// `Σ |related_constraints(v)|` over the touched variables.
    pub fn evaluate_move(&self, mv: &Move) -> SolutionScore {
        let mut deltas: HashMap<VariableId, i64> = HashMap::new();
        for (var, new_value) in &mv.alterations {
            deltas.insert(*var, new_value - self.variables[var.0].value);
        }

        let mut objective_delta = 0.0;
        for (var, delta) in &deltas {
            objective_delta += self.variables[var.0].objective_coefficient * (*delta as f64);
        }
        let objective = self.objective_value + objective_delta;

        let mut touched_constraints: Vec<ConstraintId> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for var in deltas.keys() {
            for (c, _) in self.related_constraints(*var) {
                if seen.insert(c) {
                    touched_constraints.push(c);
                }
            }
        }

        let mut violations = Vec::with_capacity(touched_constraints.len());
        let mut local_augmented_delta = 0.0;
        let mut global_augmented_delta = 0.0;
        let mut total_violation = 0.0;

        for c in &touched_constraints {
            let constraint = &self.constraints[c.0];
            let expr = &self.expressions[constraint.expression.0];
            let mut lhs = expr.value;
            for (var, delta) in &deltas {
                lhs += expr.coefficient_of(*var) * (*delta as f64);
            }
            let violation = constraint.penalty(lhs);
            total_violation += violation;
            let delta_violation = violation - constraint.violation;
            local_augmented_delta += constraint.local_penalty_coefficient * delta_violation;
            global_augmented_delta += constraint.global_penalty_coefficient * delta_violation;
            violations.push((*c, violation));
        }

        // Constraints untouched by this move keep their existing penalty
        // contribution, so the full augmented objective is the running
        // total plus just the delta contributed by the touched rows.
        let sign = if self.minimize { 1.0 } else { -1.0 };
        SolutionScore {
            objective,
            total_violation,
            local_augmented: sign * objective + self.local_penalty_total + local_augmented_delta,
            global_augmented: sign * objective + self.global_penalty_total + global_augmented_delta,
            violations,
        }
    }

    /// Commits `mv`, updating all affected expression and constraint caches.
    pub fn apply_move(&mut self, mv: &Move) {
        let mut touched_constraints: Vec<ConstraintId> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (var, new_value) in &mv.alterations {
            let delta = new_value - self.variables[var.0].value;
            if delta == 0 {
                continue;
            }
            self.variables[var.0].value = *new_value;

            self.objective_value += self.variables[var.0].objective_coefficient * (delta as f64);

            let related = self.variables[var.0].related_constraints.clone();
            for (c, coeff) in related {
                if !self.constraints[c.0].enabled {
                    continue;
                }
                let expr_id = self.constraints[c.0].expression;
                self.expressions[expr_id.0].value += coeff * (delta as f64);
                if seen.insert(c) {
                    touched_constraints.push(c);
                }
            }
        }

        for c in touched_constraints {
            let lhs = self.expressions[self.constraints[c.0].expression.0].value;
            let new_violation = self.constraints[c.0].penalty(lhs);
            let old_violation = self.constraints[c.0].violation;
            let delta = new_violation - old_violation;
            self.local_penalty_total += self.constraints[c.0].local_penalty_coefficient * delta;
            self.global_penalty_total += self.constraints[c.0].global_penalty_coefficient * delta;
            self.constraints[c.0].violation = new_violation;
        }

        if let Some(selection_move) = self.find_selection_for(mv) {
            self.selections[selection_move.0].selected = mv
                .alterations
                .iter()
                .find(|(v, n)| *n == 1 && self.variables[v.0].selection == Some(selection_move))
                .map(|(v, _)| *v)
                .unwrap_or(self.selections[selection_move.0].selected);
        }
    }

    fn find_selection_for(&self, mv: &Move) -> Option<SelectionId> {
        mv.alterations
            .iter()
            .find_map(|(v, _)| self.variables[v.0].selection)
    }

    pub fn recompute_violation_from_scratch(&self, c: ConstraintId) -> f64 {
        let constraint = &self.constraints[c.0];
        let expr = &self.expressions[constraint.expression.0];
        let lhs: f64 = expr
            .terms
            .iter()
            .map(|(v, coeff)| coeff * self.variables[v.0].value as f64)
            .sum::<f64>()
            + expr.constant;
        constraint.penalty(lhs)
    }

    pub fn total_violation(&self) -> f64 {
        self.constraints
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.violation)
            .sum()
    }

    /// Soft (weighted) rows never block feasibility; only hard constraints
    /// do. A soft row's violation is still tracked and penalised, it is
    /// simply not required to reach zero.
    pub fn is_feasible(&self) -> bool {
        self.constraints
            .iter()
            .filter(|c| c.enabled && c.soft_weight.is_none())
            .all(|c| c.is_feasible())
    }

    pub fn local_penalty_total(&self) -> f64 {
        self.local_penalty_total
    }

    pub fn global_penalty_total(&self) -> f64 {
        self.global_penalty_total
    }

    /// Recomputes the cached penalty totals from scratch; call after
    /// bulk-adjusting penalty coefficients or enabling/disabling rows.
    pub fn recompute_penalty_totals(&mut self) {
        self.local_penalty_total = 0.0;
        self.global_penalty_total = 0.0;
        for c in &self.constraints {
            if c.enabled {
                self.local_penalty_total += c.local_penalty_coefficient * c.violation;
                self.global_penalty_total += c.global_penalty_coefficient * c.violation;
            }
        }
    }

    pub fn disable_constraint(&mut self, id: ConstraintId) {
        if self.constraints[id.0].enabled {
            self.constraints[id.0].enabled = false;
            self.recompute_penalty_totals();
        }
    }

    /// Pins `var` to `value`, regardless of its current bounds; used by
    /// presolve once it has proved the value is forced.
    pub fn fix_variable(&mut self, var: VariableId, value: i64) {
        self.variables[var.0].lower = value;
        self.variables[var.0].upper = value;
        self.variables[var.0].fixed = true;
        self.set_variable_value(var, value);
    }

    /// Commits `value` as `var`'s current value, cascading the delta into
    /// the objective, expression caches and touched-constraint violations.
    /// Does not touch bounds or the `fixed` flag; used to apply a supplied
    /// initial solution.
    pub fn set_variable_value(&mut self, var: VariableId, value: i64) {
        let delta = value - self.variables[var.0].value;
        if delta != 0 {
            self.variables[var.0].value = value;
            self.objective_value += self.variables[var.0].objective_coefficient * (delta as f64);
            let related = self.variables[var.0].related_constraints.clone();
            for (c, coeff) in related {
                let expr_id = self.constraints[c.0].expression;
                self.expressions[expr_id.0].value += coeff * (delta as f64);
            }
        }
        self.recompute_constraint_violations_touching(var);
    }

    /// Narrows `var`'s bounds without necessarily fixing it.
    pub fn tighten_bounds(&mut self, var: VariableId, lower: i64, upper: i64) {
        self.variables[var.0].lower = self.variables[var.0].lower.max(lower);
        self.variables[var.0].upper = self.variables[var.0].upper.min(upper);
        if self.variables[var.0].lower == self.variables[var.0].upper {
            let value = self.variables[var.0].lower;
            self.fix_variable(var, value);
        } else {
            self.variables[var.0].value = self.variables[var.0].value.clamp(self.variables[var.0].lower, self.variables[var.0].upper);
        }
    }

    fn recompute_constraint_violations_touching(&mut self, var: VariableId) {
        let related: Vec<ConstraintId> = self.variables[var.0].related_constraints.iter().map(|(c, _)| *c).collect();
        for c in related {
            if !self.constraints[c.0].enabled {
                continue;
            }
            let lhs = self.expressions[self.constraints[c.0].expression.0].value;
            let violation = self.constraints[c.0].penalty(lhs);
            let delta = violation - self.constraints[c.0].violation;
            self.local_penalty_total += self.constraints[c.0].local_penalty_coefficient * delta;
            self.global_penalty_total += self.constraints[c.0].global_penalty_coefficient * delta;
            self.constraints[c.0].violation = violation;
        }
    }

    /// Count of variables that are neither fixed nor dependent, i.e. still
    /// decided by the search.
    pub fn mutable_variable_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| !v.fixed && v.dependent_expression.is_none())
            .count()
    }

    pub fn enabled_constraint_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.enabled).count()
    }

    pub fn create_selection(&mut self, members: Vec<VariableId>, constraint: ConstraintId, selected: VariableId) -> SelectionId {
        let id = SelectionId(self.selections.len());
        for &m in &members {
            self.variables[m.0].selection = Some(id);
            self.variables[m.0].sense = VariableSense::Selection;
        }
        self.selections.push(Selection::new(members, constraint, selected));
        id
    }

    /// Declares `var` dependent on `expr`, eliminating it from every
    /// enabled constraint and the objective by substitution.
    pub fn make_dependent(&mut self, var: VariableId, expr: ExpressionId) {
        self.variables[var.0].dependent_expression = Some(expr);
        self.variables[var.0].sense = if self.variables[var.0].is_binary() {
            VariableSense::DependentBinary
        } else {
            VariableSense::DependentInteger
        };
        let substitute = self.expressions[expr.0].clone();
        let related = self.variables[var.0].related_constraints.clone();
        for (c, _) in related {
            let expr_id = self.constraints[c.0].expression;
            self.expressions[expr_id.0].substitute(var, &substitute);
            self.expressions[expr_id.0].value = self.evaluate_expression_terms(&self.expressions[expr_id.0]);
            let lhs = self.expressions[expr_id.0].value;
            let violation = self.constraints[c.0].penalty(lhs);
            let delta = violation - self.constraints[c.0].violation;
            self.local_penalty_total += self.constraints[c.0].local_penalty_coefficient * delta;
            self.global_penalty_total += self.constraints[c.0].global_penalty_coefficient * delta;
            self.constraints[c.0].violation = violation;
        }
        let obj_id = self.objective_expression;
        self.expressions[obj_id.0].substitute(var, &substitute);
        self.expressions[obj_id.0].value = self.evaluate_expression_terms(&self.expressions[obj_id.0]);
        self.objective_value = self.expressions[obj_id.0].value;
    }

    /// Evaluates every dependent variable's stored expression and writes the
    /// result back into its value; called before each outer restart phase.
    pub fn refresh_dependent_variables(&mut self) {
        let dependents: Vec<(VariableId, ExpressionId)> = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.dependent_expression.map(|e| (VariableId(i), e)))
            .collect();
        for (var, expr) in dependents {
            let value = self.evaluate_expression_terms(&self.expressions[expr.0]);
            self.variables[var.0].value = value.round() as i64;
        }
    }
}
