use rand::Rng;

use crate::classify::ConstraintType;
use crate::model::{ModelStore, Move, MoveSense, VariableId};

use super::{AcceptFilter, NeighbourhoodGenerator};

fn passes(filter: AcceptFilter, objective_improvable: bool, feasibility_improvable: bool) -> bool {
    filter.accept_all
        || (filter.accept_objective_improving && objective_improvable)
        || (filter.accept_feasibility_improving && feasibility_improvable)
}

/// Emits the flip of every unfixed binary variable.
pub struct BinaryFlipGenerator {
    buffer: Vec<Move>,
}

impl BinaryFlipGenerator {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl Default for BinaryFlipGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighbourhoodGenerator for BinaryFlipGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        self.buffer.clear();
        for (i, var) in store.variables.iter().enumerate() {
            if var.fixed || !var.is_binary() {
                continue;
            }
            if !passes(filter, var.is_objective_improvable, var.is_feasibility_improvable) {
                continue;
            }
            let id = VariableId(i);
            let new_value = 1 - var.value;
            let related: Vec<_> = store.related_constraints(id).map(|(c, _)| c).collect();
            self.buffer.push(Move::new(vec![(id, new_value)], MoveSense::Binary, related));
        }
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "binary_flip"
    }
}

/// For each unfixed non-binary integer variable, emits up to four moves:
/// `v+1`, `v-1`, a random `v+k` within bounds, and an "aggressive" step
/// toward reducing the violation of the most-violated related constraint.
pub struct IntegerStepGenerator {
    buffer: Vec<Move>,
    rng: rand::rngs::StdRng,
}

impl IntegerStepGenerator {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            buffer: Vec::new(),
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    fn aggressive_direction(&self, store: &ModelStore, id: VariableId) -> Option<i64> {
        let mut worst: Option<(f64, f64)> = None; // (violation, coefficient)
        for (c, coeff) in store.related_constraints(id) {
            let constraint = &store.constraints[c.0];
            if constraint.violation <= 0.0 {
                continue;
            }
            if worst.map(|(v, _)| constraint.violation > v).unwrap_or(true) {
                worst = Some((constraint.violation, coeff));
            }
        }
        worst.map(|(_, coeff)| if coeff > 0.0 { -1 } else { 1 })
    }
}

impl NeighbourhoodGenerator for IntegerStepGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        self.buffer.clear();
        for (i, var) in store.variables.iter().enumerate() {
            if var.fixed || var.is_binary() {
                continue;
            }
            if !passes(filter, var.is_objective_improvable, var.is_feasibility_improvable) {
                continue;
            }
            let id = VariableId(i);
            let related: Vec<_> = store.related_constraints(id).map(|(c, _)| c).collect();

            let mut candidates: Vec<i64> = Vec::with_capacity(4);
            if var.in_bounds(var.value + 1) {
                candidates.push(var.value + 1);
            }
            if var.in_bounds(var.value - 1) {
                candidates.push(var.value - 1);
            }
            if var.upper > var.lower {
                let k = self.rng.random_range(var.lower..=var.upper);
                if k != var.value {
                    candidates.push(k);
                }
            }
            if let Some(direction) = self.aggressive_direction(store, id) {
                let candidate = var.value + direction;
                if var.in_bounds(candidate) {
                    candidates.push(candidate);
                }
            }
            candidates.sort_unstable();
            candidates.dedup();

            for new_value in candidates {
                self.buffer
                    .push(Move::new(vec![(id, new_value)], MoveSense::Integer, related.clone()));
            }
        }
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "integer_step"
    }
}

/// For each Selection, emits the swap moving every other member to 1 and the
/// currently-selected member to 0, keeping the partitioning row satisfied by
/// construction.
pub struct SelectionMoveGenerator {
    buffer: Vec<Move>,
}

impl SelectionMoveGenerator {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }
}

impl Default for SelectionMoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighbourhoodGenerator for SelectionMoveGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        self.buffer.clear();
        for selection in &store.selections {
            for other in selection.others() {
                let var = &store.variables[other.index()];
                if var.fixed {
                    continue;
                }
                if !passes(filter, var.is_objective_improvable, var.is_feasibility_improvable) {
                    continue;
                }
                let mut related: Vec<_> = store.related_constraints(other).map(|(c, _)| c).collect();
                related.extend(store.related_constraints(selection.selected).map(|(c, _)| c));
                related.sort_unstable();
                related.dedup();
                self.buffer.push(Move::new(
                    vec![(other, 1), (selection.selected, 0)],
                    MoveSense::Selection,
                    related,
                ));
            }
        }
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "selection_move"
    }
}

/// Emits the small closed-form move set that keeps a single structurally
/// recognised constraint satisfied, for the constraint classes whose
/// defining relationship admits one: Aggregation, VariableBound,
/// ExclusiveOr/Nor, Precedence and the ConstantSum/Difference/Ratio family.
pub struct StructuredConstraintGenerator {
    buffer: Vec<Move>,
}

impl StructuredConstraintGenerator {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn emit_for(&mut self, store: &ModelStore, ctype: ConstraintType, constraint_index: usize) {
        let constraint = &store.constraints[constraint_index];
        if !constraint.enabled {
            return;
        }
        let expr = &store.expressions[constraint.expression.0];
        let terms: Vec<(VariableId, f64)> = expr
            .terms
            .iter()
            .copied()
            .filter(|(v, _)| !store.variables[v.0].fixed)
            .collect();
        let related = vec![crate::model::ConstraintId(constraint_index)];

        match ctype {
            ConstraintType::ExclusiveOr | ConstraintType::ExclusiveNor | ConstraintType::Precedence => {
                if terms.len() != 2 {
                    return;
                }
                let (a, _) = terms[0];
                let (b, _) = terms[1];
                let av = store.variables[a.0].value;
                let bv = store.variables[b.0].value;
                for (x, xv, y, yv) in [(a, av, b, bv), (b, bv, a, av)] {
                    let flipped = 1 - xv;
                    if store.variables[x.0].in_bounds(flipped) {
                        self.buffer.push(Move::new(
                            vec![(x, flipped), (y, yv)],
                            MoveSense::ExclusiveOr,
                            related.clone(),
                        ));
                    }
                }
            }
            ConstraintType::Aggregation | ConstraintType::ConstantSumIntegers | ConstraintType::ConstantDifferenceIntegers => {
                if terms.len() != 2 {
                    return;
                }
                let (a, ca) = terms[0];
                let (b, cb) = terms[1];
                let av = store.variables[a.0].value;
                let bv = store.variables[b.0].value;
                // moving a by +1 requires b to move by -ca/cb to keep the
                // equality satisfied.
                if cb.abs() > 1e-12 {
                    let delta_b = (-ca / cb).round() as i64;
                    let candidate_a = av + 1;
                    let candidate_b = bv + delta_b;
                    if store.variables[a.0].in_bounds(candidate_a) && store.variables[b.0].in_bounds(candidate_b) {
                        self.buffer.push(Move::new(
                            vec![(a, candidate_a), (b, candidate_b)],
                            MoveSense::Chain,
                            related.clone(),
                        ));
                    }
                }
            }
            ConstraintType::ConstantRatioIntegers => {
                if terms.len() != 2 {
                    return;
                }
                let (x, a) = terms[0];
                let (y, b) = terms[1];
                if b.abs() < 1e-12 {
                    return;
                }
                let xv = store.variables[x.0].value;
                let yv = store.variables[y.0].value;
                let step = (a / b).abs().round() as i64;
                for (dx, dy) in [(1, -step), (-1, step)] {
                    let cand_x = xv + dx;
                    let cand_y = yv + dy;
                    if store.variables[x.0].in_bounds(cand_x) && store.variables[y.0].in_bounds(cand_y) {
                        self.buffer.push(Move::new(
                            vec![(x, cand_x), (y, cand_y)],
                            MoveSense::Chain,
                            related.clone(),
                        ));
                    }
                }
            }
            ConstraintType::VariableBound => {
                if terms.len() != 2 {
                    return;
                }
                for (v, _) in &terms {
                    let var = &store.variables[v.0];
                    for delta in [-1, 1] {
                        let candidate = var.value + delta;
                        if var.in_bounds(candidate) {
                            self.buffer
                                .push(Move::new(vec![(*v, candidate)], MoveSense::Integer, related.clone()));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

impl Default for StructuredConstraintGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighbourhoodGenerator for StructuredConstraintGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        self.buffer.clear();
        let _ = filter; // structured moves are always considered, like the source's dedicated generators
        for i in 0..store.constraints.len() {
            self.emit_for(store, store.constraints[i].classified_type, i);
        }
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "structured_constraint"
    }
}

/// Composite moves built from recently-useful simple moves. Maintains a
/// capacity-bounded pool, deduplicates by alteration hash, and sorts by
/// overlap rate; lower-scoring entries are evicted once the pool is full.
pub struct ChainMoveGenerator {
    capacity: usize,
    pool: Vec<Move>,
    scores: Vec<f64>,
    buffer: Vec<Move>,
}

impl ChainMoveGenerator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pool: Vec::new(),
            scores: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Records a simple move that was useful (applied or highly scored),
    /// evicting the lowest-scoring pool entry if at capacity.
    pub fn record(&mut self, mv: Move, score: f64) {
        if self.pool.iter().any(|m| m.hash_key == mv.hash_key) {
            return;
        }
        if self.pool.len() >= self.capacity {
            if let Some((worst_idx, _)) = self
                .scores
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            {
                self.pool.remove(worst_idx);
                self.scores.remove(worst_idx);
            }
        }
        self.pool.push(mv);
        self.scores.push(score);
    }

    /// Builds chain candidates by concatenating pairs of pool moves whose
    /// alterations touch disjoint variables, deduplicating by hash and
    /// sorting by overlap rate against the most recently-applied move.
    fn rebuild(&mut self, store: &ModelStore, reference: Option<&Move>) {
        self.buffer.clear();
        let mut seen = std::collections::HashSet::new();
        for i in 0..self.pool.len() {
            for j in (i + 1)..self.pool.len() {
                let a = &self.pool[i];
                let b = &self.pool[j];
                let a_vars: std::collections::HashSet<_> = a.alterations.iter().map(|(v, _)| *v).collect();
                if b.alterations.iter().any(|(v, _)| a_vars.contains(v)) {
                    continue;
                }
                let mut alterations = a.alterations.clone();
                alterations.extend(b.alterations.clone());
                if alterations
                    .iter()
                    .any(|(v, n)| !store.variables[v.0].in_bounds(*n) || store.variables[v.0].fixed)
                {
                    continue;
                }
                let mut related = a.related_constraints.clone();
                related.extend(b.related_constraints.clone());
                related.sort_unstable();
                related.dedup();
                let chained = Move::new(alterations, MoveSense::Chain, related);
                if seen.insert(chained.hash_key) {
                    self.buffer.push(chained);
                }
            }
        }
        if let Some(reference) = reference {
            self.buffer
                .sort_by(|a, b| b.overlap_rate(reference).partial_cmp(&a.overlap_rate(reference)).unwrap());
        }
    }
}

impl NeighbourhoodGenerator for ChainMoveGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        let _ = filter;
        self.rebuild(store, None);
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

/// Invokes a user-supplied closure that rewrites the move buffer wholesale,
/// for domains (quadratic assignment swaps, puzzle-specific moves) with no
/// structural generator of their own.
pub struct UserDefinedGenerator {
    rewrite: Box<dyn Fn(&ModelStore) -> Vec<Move> + Send>,
    buffer: Vec<Move>,
}

impl UserDefinedGenerator {
    pub fn new(rewrite: Box<dyn Fn(&ModelStore) -> Vec<Move> + Send>) -> Self {
        Self {
            rewrite,
            buffer: Vec::new(),
        }
    }
}

impl NeighbourhoodGenerator for UserDefinedGenerator {
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter) {
        let _ = filter;
        self.buffer = (self.rewrite)(store);
    }

    fn moves(&self) -> &[Move] {
        &self.buffer
    }

    fn name(&self) -> &'static str {
        "user_defined"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintSense;

    fn toy_store() -> ModelStore {
        let mut store = ModelStore::new(true);
        let x0 = store.create_variable("x0", 0, 1);
        let x1 = store.create_variable("x1", 0, 1);
        let x2 = store.create_variable("x2", 0, 1);
        let expr = store.create_expression(vec![(x0, 1.0), (x1, 1.0), (x2, 1.0)], 0.0);
        store.create_constraint("partition", expr, ConstraintSense::Eq, 1.0);
        store.set_objective(vec![(x0, 2.0), (x1, 1.0), (x2, 3.0)], 0.0);
        store
    }

    #[test]
    fn binary_flip_emits_one_move_per_unfixed_binary() {
        let store = toy_store();
        let mut gen = BinaryFlipGenerator::new();
        let filter = AcceptFilter {
            accept_all: true,
            accept_objective_improving: false,
            accept_feasibility_improving: false,
            parallel: false,
        };
        gen.update_moves(&store, filter);
        assert_eq!(gen.moves().len(), 3);
    }

    #[test]
    fn selection_move_swaps_every_other_member_in() {
        let mut store = toy_store();
        let members: Vec<VariableId> = (0..3).map(VariableId).collect();
        store.variables[0].value = 1;
        for v in &members {
            store.variables[v.index()].selection = Some(crate::model::SelectionId(0));
        }
        store.selections.push(crate::model::Selection::new(
            members,
            crate::model::ConstraintId(0),
            VariableId(0),
        ));
        let mut gen = SelectionMoveGenerator::new();
        let filter = AcceptFilter {
            accept_all: true,
            accept_objective_improving: false,
            accept_feasibility_improving: false,
            parallel: false,
        };
        gen.update_moves(&store, filter);
        assert_eq!(gen.moves().len(), 2);
    }
}
