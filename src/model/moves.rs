use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::ids::{ConstraintId, VariableId};

/// Tags the family a move was generated by, used for dispatch and for the
/// "Selection moves are always Any-mode" tabu exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSense {
    Binary,
    Integer,
    Selection,
    ExclusiveOr,
    ExclusiveNor,
    Chain,
    UserDefined,
}

/// An atomic change set: a list of `(variable, new_value)` alterations.
#[derive(Debug, Clone)]
pub struct Move {
    pub alterations: Vec<(VariableId, i64)>,
    pub sense: MoveSense,
    pub related_constraints: Vec<ConstraintId>,
    pub hash_key: u64,
}

impl Move {
    pub fn new(alterations: Vec<(VariableId, i64)>, sense: MoveSense, related_constraints: Vec<ConstraintId>) -> Self {
        let hash_key = Self::compute_hash(&alterations);
        Self {
            alterations,
            sense,
            related_constraints,
            hash_key,
        }
    }

    fn compute_hash(alterations: &[(VariableId, i64)]) -> u64 {
        let mut sorted: Vec<_> = alterations.iter().map(|(v, n)| (v.index(), *n)).collect();
        sorted.sort_unstable();
        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    }

    /// Fraction of this move's altered variables that also appear in
    /// `previous` — the per-iteration ingredient of search intensity.
    pub fn overlap_rate(&self, previous: &Move) -> f64 {
        if self.alterations.is_empty() {
            return 0.0;
        }
        let previous_vars: std::collections::HashSet<VariableId> =
            previous.alterations.iter().map(|(v, _)| *v).collect();
        let shared = self
            .alterations
            .iter()
            .filter(|(v, _)| previous_vars.contains(v))
            .count();
        shared as f64 / self.alterations.len() as f64
    }

    pub fn touches(&self, var: VariableId) -> bool {
        self.alterations.iter().any(|(v, _)| *v == var)
    }
}
