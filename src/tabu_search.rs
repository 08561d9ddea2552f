//! Tabu-search inner loop: neighbour selection under tabu and aspiration,
//! one restart phase at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::evaluator;
use crate::incumbent::{Incumbent, IncumbentHolder};
use crate::memory::{Memory, TabuMode};
use crate::model::{Move, ModelStore};
use crate::neighborhood::{AcceptFilter, NeighbourhoodDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    TimeOver,
    IterationOver,
    NoMove,
    ReachTarget,
    LocalOptimal,
}

#[derive(Debug, Clone)]
pub struct TabuSearchOptions {
    pub max_time: Option<Duration>,
    pub max_iterations: Option<i64>,
    pub target_objective: Option<f64>,
    /// Consecutive non-improving iterations before declaring LocalOptimal.
    pub no_improvement_patience: i64,
    pub tenure: i64,
    pub tabu_mode: TabuMode,
    pub ignore_tabu_if_global_incumbent: bool,
    pub initial_modification_flips: usize,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for TabuSearchOptions {
    fn default() -> Self {
        Self {
            max_time: Some(Duration::from_secs(10)),
            max_iterations: Some(10_000),
            target_objective: None,
            no_improvement_patience: 2_000,
            tenure: 10,
            tabu_mode: TabuMode::Any,
            ignore_tabu_if_global_incumbent: false,
            initial_modification_flips: 0,
            seed: 0,
            parallel: false,
        }
    }
}

pub struct InnerResult {
    pub reason: TerminationReason,
    pub iterations: i64,
    pub intensity: f64,
}

pub struct TabuSearch {
    dispatcher: NeighbourhoodDispatcher,
    memory: Memory,
    options: TabuSearchOptions,
    rng: StdRng,
    iteration: i64,
    previous_move: Option<Move>,
    intensity: f64,
}

const EPSILON: f64 = 1e-10;
const INTENSITY_DECAY: f64 = 0.1;

impl TabuSearch {
    pub fn new(dispatcher: NeighbourhoodDispatcher, variable_count: usize, options: TabuSearchOptions, frequency_penalty_coefficient: f64) -> Self {
        Self {
            dispatcher,
            memory: Memory::new(variable_count, frequency_penalty_coefficient),
            rng: StdRng::seed_from_u64(options.seed),
            iteration: 0,
            previous_move: None,
            intensity: 0.0,
            options,
        }
    }

    fn snapshot(store: &ModelStore, objective: f64, augmented: f64, total_violation: f64) -> Incumbent {
        Incumbent {
            objective,
            augmented,
            total_violation,
            values: store
                .variables
                .iter()
                .enumerate()
                .map(|(i, v)| (crate::model::VariableId(i), v.value))
                .collect(),
        }
    }

    /// Optionally flips a configured number of randomly chosen unfixed
    /// binaries to escape local attractors before the phase begins.
    fn initial_modification(&mut self, store: &mut ModelStore) {
        use rand::seq::SliceRandom;
        if self.options.initial_modification_flips == 0 {
            return;
        }
        let mut candidates: Vec<usize> = store
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.fixed && v.is_binary())
            .map(|(i, _)| i)
            .collect();
        candidates.shuffle(&mut self.rng);
        for &idx in candidates.iter().take(self.options.initial_modification_flips) {
            let id = crate::model::VariableId(idx);
            let new_value = 1 - store.variables[idx].value;
            let related: Vec<_> = store.related_constraints(id).map(|(c, _)| c).collect();
            let mv = Move::new(vec![(id, new_value)], crate::model::MoveSense::Binary, related);
            store.apply_move(&mv);
            self.memory.update(&mv, self.iteration);
        }
    }

    /// Runs one restart phase until an inner termination reason fires.
    pub fn run(
        &mut self,
        store: &mut ModelStore,
        incumbents: &mut IncumbentHolder,
        cancel: &Arc<AtomicBool>,
    ) -> InnerResult {
        let start = Instant::now();
        incumbents.reset_local();
        self.initial_modification(store);

        let mut no_improvement_streak: i64 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return InnerResult {
                    reason: TerminationReason::TimeOver,
                    iterations: self.iteration,
                    intensity: self.intensity,
                };
            }
            if let Some(max_time) = self.options.max_time {
                if start.elapsed() >= max_time {
                    return InnerResult {
                        reason: TerminationReason::TimeOver,
                        iterations: self.iteration,
                        intensity: self.intensity,
                    };
                }
            }
            if let Some(max_iterations) = self.options.max_iterations {
                if self.iteration >= max_iterations {
                    return InnerResult {
                        reason: TerminationReason::IterationOver,
                        iterations: self.iteration,
                        intensity: self.intensity,
                    };
                }
            }
            if let Some(target) = self.options.target_objective {
                if let Some(feasible) = &incumbents.feasible {
                    if feasible.objective <= target + EPSILON {
                        return InnerResult {
                            reason: TerminationReason::ReachTarget,
                            iterations: self.iteration,
                            intensity: self.intensity,
                        };
                    }
                }
            }
            if no_improvement_streak >= self.options.no_improvement_patience {
                return InnerResult {
                    reason: TerminationReason::LocalOptimal,
                    iterations: self.iteration,
                    intensity: self.intensity,
                };
            }

            let feasible_now = store.is_feasible();
            let filter = AcceptFilter {
                accept_all: false,
                accept_objective_improving: feasible_now,
                accept_feasibility_improving: !feasible_now,
                parallel: self.options.parallel,
            };
            self.dispatcher.update_all(store, filter);
            let candidates = self.dispatcher.collect_shuffled(&mut self.rng);

            if candidates.is_empty() {
                return InnerResult {
                    reason: TerminationReason::NoMove,
                    iterations: self.iteration,
                    intensity: self.intensity,
                };
            }

            let mut best: Option<(Move, evaluator::MoveScore)> = None;
            for mv in candidates {
                let valid = mv
                    .alterations
                    .iter()
                    .all(|(v, n)| store.variables[v.index()].in_bounds(*n) && !store.variables[v.index()].fixed);
                if !valid {
                    continue;
                }
                let score = evaluator::evaluate(store, &self.memory, &mv);
                let permissible = self
                    .memory
                    .compute_permissibility(&mv, self.iteration, self.options.tenure, self.options.tabu_mode);
                let aspiration = incumbents
                    .global_augmented
                    .as_ref()
                    .map(|inc| score.solution.global_augmented < inc.augmented - EPSILON)
                    .unwrap_or(true)
                    || (self.options.ignore_tabu_if_global_incumbent
                        && incumbents
                            .feasible
                            .as_ref()
                            .map(|inc| score.solution.objective < inc.objective - EPSILON)
                            .unwrap_or(false));
                let admissible = permissible || aspiration;
                if !admissible {
                    continue;
                }
                if best.as_ref().map(|(_, b)| score.rank_value() < b.rank_value()).unwrap_or(true) {
                    best = Some((mv, score));
                }
            }

            let Some((chosen, score)) = best else {
                return InnerResult {
                    reason: TerminationReason::NoMove,
                    iterations: self.iteration,
                    intensity: self.intensity,
                };
            };

            store.apply_move(&chosen);
            self.memory.update(&chosen, self.iteration);

            let candidate_incumbent = Self::snapshot(
                store,
                score.solution.objective,
                score.solution.local_augmented,
                store.total_violation(),
            );
            let status = incumbents.try_update(&candidate_incumbent, store.is_feasible());
            if status.is_empty() {
                no_improvement_streak += 1;
            } else {
                no_improvement_streak = 0;
            }

            if let Some(previous) = &self.previous_move {
                let overlap = chosen.overlap_rate(previous);
                self.intensity = self.intensity * (1.0 - INTENSITY_DECAY) + overlap * INTENSITY_DECAY;
            }
            self.previous_move = Some(chosen);

            self.iteration += 1;
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn iteration(&self) -> i64 {
        self.iteration
    }

    pub fn set_tenure(&mut self, tenure: i64) {
        self.options.tenure = tenure;
    }
}
