use super::ids::{ExpressionId, VariableId};
use crate::classify::ConstraintType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Le,
    Eq,
    Ge,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub expression: ExpressionId,
    pub sense: ConstraintSense,
    pub rhs: f64,
    pub enabled: bool,
    pub classified_type: ConstraintType,
    /// Auxiliary variable singled out by classification, e.g. the
    /// determined variable of an `Intermediate` constraint.
    pub auxiliary_variable: Option<VariableId>,
    pub violation: f64,
    pub local_penalty_coefficient: f64,
    pub global_penalty_coefficient: f64,
    pub lagrangian_coefficient: f64,
    /// Soft-constraint weight from OPB input; `None` for a hard constraint.
    pub soft_weight: Option<f64>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expression: ExpressionId, sense: ConstraintSense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expression,
            sense,
            rhs,
            enabled: true,
            classified_type: ConstraintType::GeneralLinear,
            auxiliary_variable: None,
            violation: 0.0,
            local_penalty_coefficient: 1.0,
            global_penalty_coefficient: 1.0,
            lagrangian_coefficient: 0.0,
            soft_weight: None,
        }
    }

    /// `max(0, lhs-rhs)` for <=, `max(0, rhs-lhs)` for >=, `|lhs-rhs|` for =.
    pub fn penalty(&self, lhs: f64) -> f64 {
        match self.sense {
            ConstraintSense::Le => (lhs - self.rhs).max(0.0),
            ConstraintSense::Ge => (self.rhs - lhs).max(0.0),
            ConstraintSense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.violation <= 1e-10
    }
}
