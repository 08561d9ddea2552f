//! Format-neutral intermediate representation produced by every loader.

use std::collections::HashMap;

/// Sense of a linear constraint, mirroring the three senses the core model
/// store recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSense {
    Le,
    Eq,
    Ge,
}

/// One linear row: a sparse coefficient map over variable names, a sense and
/// a right-hand side. `weight` is `Some(w)` for an OPB/PB soft constraint.
#[derive(Debug, Clone)]
pub struct RawConstraint {
    pub name: String,
    pub coefficients: Vec<(String, f64)>,
    pub sense: RawSense,
    pub rhs: f64,
    pub weight: Option<f64>,
}

/// Declared bound on a single variable. Binary variables are represented as
/// `lower = 0, upper = 1, integer = true` by convention.
#[derive(Debug, Clone, Copy)]
pub struct RawBound {
    pub lower: i64,
    pub upper: i64,
}

impl Default for RawBound {
    fn default() -> Self {
        Self { lower: 0, upper: 1 }
    }
}

/// A parsed instance, prior to construction of the solver's model store.
#[derive(Debug, Clone, Default)]
pub struct RawModel {
    pub minimize: bool,
    pub variable_order: Vec<String>,
    pub objective: Vec<(String, f64)>,
    pub objective_constant: f64,
    pub constraints: Vec<RawConstraint>,
    pub bounds: HashMap<String, RawBound>,
    pub integer_variables: std::collections::HashSet<String>,
    /// Top cost for OPB soft constraints (`soft: <top>`); `None` for MPS/hard-only OPB.
    pub soft_top_cost: Option<f64>,
}

impl RawModel {
    pub fn ensure_variable(&mut self, name: &str) {
        if !self.bounds.contains_key(name) {
            self.variable_order.push(name.to_string());
            self.bounds.insert(name.to_string(), RawBound::default());
        }
    }
}
