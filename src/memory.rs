//! Tabu memory: last-update iteration and update count per variable.
//!
//! Updated only when a move is *applied*, never when merely evaluated.

use crate::model::VariableId;
use crate::model::moves::{Move, MoveSense};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabuMode {
    /// Permissible iff *every* altered variable clears tenure.
    Any,
    /// Permissible iff *at least one* altered variable clears tenure.
    All,
}

pub struct Memory {
    last_update_iteration: Vec<i64>,
    update_count: Vec<u64>,
    total_update_count_reciprocal: f64,
    pub frequency_penalty_coefficient: f64,
}

impl Memory {
    pub fn new(variable_count: usize, frequency_penalty_coefficient: f64) -> Self {
        Self {
            last_update_iteration: vec![-1; variable_count],
            update_count: vec![0; variable_count],
            total_update_count_reciprocal: 1.0,
            frequency_penalty_coefficient,
        }
    }

    pub fn update(&mut self, mv: &Move, iteration: i64) {
        for (var, _) in &mv.alterations {
            self.last_update_iteration[var.index()] = iteration;
            self.update_count[var.index()] += 1;
        }
        let total: u64 = self.update_count.iter().sum();
        self.total_update_count_reciprocal = if total == 0 { 1.0 } else { 1.0 / total as f64 };
    }

    pub fn last_update_iteration(&self, var: VariableId) -> i64 {
        self.last_update_iteration[var.index()]
    }

    pub fn update_count(&self, var: VariableId) -> u64 {
        self.update_count[var.index()]
    }

    /// "Any" mode: every altered variable must clear tenure. "All" mode: at
    /// least one must. Selection-sense moves are always treated as "Any"
    /// since the swap's two halves act as one unit.
    pub fn compute_permissibility(&self, mv: &Move, iteration: i64, tenure: i64, mode: TabuMode) -> bool {
        let effective_mode = if mv.sense == MoveSense::Selection { TabuMode::Any } else { mode };
        let clears = |var: VariableId| iteration - self.last_update_iteration(var) >= tenure;
        match effective_mode {
            TabuMode::Any => mv.alterations.iter().all(|(v, _)| clears(*v)),
            TabuMode::All => mv.alterations.iter().any(|(v, _)| clears(*v)),
        }
    }

    pub fn compute_frequency_penalty(&self, mv: &Move) -> f64 {
        let sum: u64 = mv.alterations.iter().map(|(v, _)| self.update_count(*v)).sum();
        sum as f64 * self.total_update_count_reciprocal * self.frequency_penalty_coefficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::VariableId;

    fn mv(vars: &[usize]) -> Move {
        Move::new(
            vars.iter().map(|&v| (VariableId(v), 1)).collect(),
            MoveSense::Binary,
            Vec::new(),
        )
    }

    #[test]
    fn tenure_zero_is_always_permissible() {
        let memory = Memory::new(4, 1.0);
        let m = mv(&[0, 1]);
        assert!(memory.compute_permissibility(&m, 100, 0, TabuMode::Any));
    }

    #[test]
    fn variable_touched_at_iteration_zero_stays_tabu_under_large_tenure() {
        let mut memory = Memory::new(4, 1.0);
        memory.update(&mv(&[0]), 0);
        let m = mv(&[0]);
        assert!(!memory.compute_permissibility(&m, 5, 1000, TabuMode::Any));
    }

    #[test]
    fn selection_moves_always_use_any_mode() {
        let mut memory = Memory::new(4, 1.0);
        memory.update(&mv(&[0]), 0);
        let m = Move::new(vec![(VariableId(0), 1), (VariableId(1), 0)], MoveSense::Selection, Vec::new());
        // variable 0 is still tabu, variable 1 clears trivially: under "All"
        // this would pass, but Selection is forced to "Any" so it must fail.
        assert!(!memory.compute_permissibility(&m, 1, 10, TabuMode::All));
    }
}
