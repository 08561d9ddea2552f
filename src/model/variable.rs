use super::ids::{ConstraintId, ExpressionId, SelectionId};

/// What role a variable plays in the model, per the data model's sense tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSense {
    Binary,
    Integer,
    Selection,
    DependentBinary,
    DependentInteger,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub lower: i64,
    pub upper: i64,
    pub value: i64,
    pub fixed: bool,
    pub sense: VariableSense,
    /// Constraints whose expression references this variable, with the
    /// coefficient it carries there. Rebuilt on presolve changes only.
    pub related_constraints: Vec<(ConstraintId, f64)>,
    pub objective_coefficient: f64,
    pub dependent_expression: Option<ExpressionId>,
    pub selection: Option<SelectionId>,
    pub is_objective_improvable: bool,
    pub is_feasibility_improvable: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            value: lower.max(0).min(upper),
            fixed: lower == upper,
            sense: if lower == 0 && upper == 1 {
                VariableSense::Binary
            } else {
                VariableSense::Integer
            },
            related_constraints: Vec::new(),
            objective_coefficient: 0.0,
            dependent_expression: None,
            selection: None,
            is_objective_improvable: true,
            is_feasibility_improvable: true,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.lower == 0 && self.upper == 1
    }

    pub fn in_bounds(&self, candidate: i64) -> bool {
        candidate >= self.lower && candidate <= self.upper
    }
}
