//! Structured neighbourhood generation: each generator knows how to emit
//! moves of one kind, filtered by the requested improvability criteria.

pub mod generators;

use crate::model::{ModelStore, Move};

pub use generators::{
    BinaryFlipGenerator, ChainMoveGenerator, IntegerStepGenerator, SelectionMoveGenerator,
    StructuredConstraintGenerator, UserDefinedGenerator,
};

/// Which moves to keep this refresh. `accept_all` overrides the other two;
/// otherwise a move is kept if it satisfies either requested criterion.
#[derive(Debug, Clone, Copy)]
pub struct AcceptFilter {
    pub accept_all: bool,
    pub accept_objective_improving: bool,
    pub accept_feasibility_improving: bool,
    pub parallel: bool,
}

pub trait NeighbourhoodGenerator: Send {
    /// Refills the generator's internal move buffer with moves valid from
    /// the current committed solution that pass `filter`.
    fn update_moves(&mut self, store: &ModelStore, filter: AcceptFilter);

    fn moves(&self) -> &[Move];

    fn name(&self) -> &'static str;
}

/// Runs every enabled generator and concatenates their buffers, shuffling
/// the result to break ties uniformly before the inner loop scores them.
pub struct NeighbourhoodDispatcher {
    pub generators: Vec<Box<dyn NeighbourhoodGenerator>>,
}

impl NeighbourhoodDispatcher {
    pub fn new(generators: Vec<Box<dyn NeighbourhoodGenerator>>) -> Self {
        Self { generators }
    }

    pub fn update_all(&mut self, store: &ModelStore, filter: AcceptFilter) {
        if filter.parallel {
            use rayon::prelude::*;
            self.generators
                .par_iter_mut()
                .for_each(|g| g.update_moves(store, filter));
        } else {
            for g in &mut self.generators {
                g.update_moves(store, filter);
            }
        }
    }

    /// Concatenates every generator's buffer and shuffles the combined
    /// index order using `rng`, returning indices into the flattened list
    /// alongside the flattened moves themselves.
    pub fn collect_shuffled(&self, rng: &mut impl rand::Rng) -> Vec<Move> {
        let mut combined: Vec<Move> = self.generators.iter().flat_map(|g| g.moves().to_vec()).collect();
        use rand::seq::SliceRandom;
        combined.shuffle(rng);
        combined
    }
}
