//! Move scoring: combines the model store's incremental augmented-objective
//! computation with Memory's frequency penalty and each constraint's
//! Lagrangian coefficient, the same composition the inner loop ranks
//! candidate moves by.

use crate::memory::Memory;
use crate::model::{ModelStore, Move, SolutionScore};

#[derive(Debug, Clone)]
pub struct MoveScore {
    pub solution: SolutionScore,
    pub frequency_penalty: f64,
    pub lagrangian_penalty: f64,
}

impl MoveScore {
    /// The rank key the tabu-search loop minimises: local augmented
    /// objective plus frequency and Lagrangian penalties.
    pub fn rank_value(&self) -> f64 {
        self.solution.local_augmented + self.frequency_penalty + self.lagrangian_penalty
    }
}

pub fn compute_lagrangian_penalty(store: &ModelStore, solution: &SolutionScore) -> f64 {
    solution
        .violations
        .iter()
        .map(|(c, violation)| store.constraints[c.index()].lagrangian_coefficient * violation)
        .sum()
}

pub fn evaluate(store: &ModelStore, memory: &Memory, mv: &Move) -> MoveScore {
    let solution = store.evaluate_move(mv);
    let frequency_penalty = memory.compute_frequency_penalty(mv);
    let lagrangian_penalty = compute_lagrangian_penalty(store, &solution);
    MoveScore {
        solution,
        frequency_penalty,
        lagrangian_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintSense, MoveSense, VariableId};

    #[test]
    fn evaluate_move_matches_apply_then_read_augmented() {
        let mut store = ModelStore::new(true);
        let x = store.create_variable("x", 0, 5);
        let expr = store.create_expression(vec![(x, 1.0)], 0.0);
        store.create_constraint("c", expr, ConstraintSense::Le, 3.0);
        store.set_objective(vec![(x, 1.0)], 0.0);
        let memory = Memory::new(1, 0.0);

        let mv = Move::new(vec![(x, 4)], MoveSense::Integer, vec![crate::model::ConstraintId(0)]);
        let before = evaluate(&store, &memory, &mv);

        store.apply_move(&mv);
        let after_local_augmented = store.objective_value + store.local_penalty_total();

        assert!((before.solution.local_augmented - after_local_augmented).abs() < 1e-9);
        let _ = VariableId(0);
    }
}
