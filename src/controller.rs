//! Outer controller: penalty-coefficient learning, tenure adjustment,
//! restart solution selection and dependent-expression substitution around
//! the tabu-search inner loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::Status;
use crate::incumbent::IncumbentHolder;
use crate::model::ModelStore;
use crate::tabu_search::{TabuSearch, TerminationReason};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub penalty_coefficient_relaxing_rate: f64,
    pub penalty_coefficient_tightening_rate: f64,
    pub tenure_min: i64,
    pub tenure_max: i64,
    pub tenure_increase_rate: f64,
    pub tenure_decrease_rate: f64,
    pub intensity_increase_streak: i64,
    pub intensity_decrease_streak: i64,
    pub reset_intensity_threshold: f64,
    pub max_unsuccessful_restarts: i64,
    pub max_restarts: i64,
    pub global_max_time: Option<Duration>,
    pub global_max_iterations: Option<i64>,
    pub target_objective: Option<f64>,
    pub feasible_stable_restarts: i64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            penalty_coefficient_relaxing_rate: 0.9,
            penalty_coefficient_tightening_rate: 1.1,
            tenure_min: 1,
            tenure_max: 50,
            tenure_increase_rate: 1.2,
            tenure_decrease_rate: 0.9,
            intensity_increase_streak: 4,
            intensity_decrease_streak: 4,
            reset_intensity_threshold: 0.95,
            max_unsuccessful_restarts: 20,
            max_restarts: 200,
            global_max_time: Some(Duration::from_secs(60)),
            global_max_iterations: None,
            target_objective: None,
            feasible_stable_restarts: 10,
        }
    }
}

pub struct SolveReport {
    pub status: Status,
    pub restarts: i64,
    pub total_inner_iterations: i64,
}

pub struct Controller {
    options: ControllerOptions,
    previous_feasible_violated: Vec<bool>,
    recent_feasible_violated: Vec<bool>,
    intensity_history: Vec<f64>,
    current_tenure: i64,
    unsuccessful_restarts: i64,
    feasible_stable_count: i64,
}

impl Controller {
    pub fn new(options: ControllerOptions, constraint_count: usize, initial_tenure: i64) -> Self {
        Self {
            options,
            previous_feasible_violated: vec![false; constraint_count],
            recent_feasible_violated: vec![false; constraint_count],
            intensity_history: Vec::new(),
            current_tenure: initial_tenure,
            unsuccessful_restarts: 0,
            feasible_stable_count: 0,
        }
    }

    /// Relaxes penalty coefficients on constraints that stayed satisfied (or
    /// were violated in neither comparison), tightens those violated
    /// recently but not by the global-augmented incumbent.
    fn update_penalty_coefficients(&mut self, store: &mut ModelStore) {
        for (i, constraint) in store.constraints.iter_mut().enumerate() {
            if !constraint.enabled || constraint.soft_weight.is_some() {
                continue;
            }
            let violated_now = !constraint.is_feasible();
            let violated_before = self.previous_feasible_violated.get(i).copied().unwrap_or(false);

            if violated_now && violated_before {
                constraint.global_penalty_coefficient *= self.options.penalty_coefficient_relaxing_rate;
            } else if !violated_now && !violated_before {
                constraint.global_penalty_coefficient *=
                    self.options.penalty_coefficient_relaxing_rate * self.options.penalty_coefficient_relaxing_rate;
            } else if violated_now {
                constraint.global_penalty_coefficient *= self.options.penalty_coefficient_tightening_rate;
            }
            constraint.local_penalty_coefficient = constraint.global_penalty_coefficient;
            self.recent_feasible_violated[i] = violated_now;
        }
        store.recompute_penalty_totals();
    }

    fn maybe_reset_penalty_coefficients(&mut self, store: &mut ModelStore, intensity: f64) {
        let should_reset =
            intensity >= self.options.reset_intensity_threshold || self.unsuccessful_restarts >= self.options.max_unsuccessful_restarts;
        if should_reset {
            for constraint in &mut store.constraints {
                if constraint.soft_weight.is_some() {
                    continue;
                }
                constraint.global_penalty_coefficient = 1.0;
                constraint.local_penalty_coefficient = 1.0;
            }
            store.recompute_penalty_totals();
            self.unsuccessful_restarts = 0;
        }
    }

    fn adjust_tenure(&mut self) {
        if self.intensity_history.len() < self.options.intensity_increase_streak as usize {
            return;
        }
        let window = &self.intensity_history[self.intensity_history.len() - self.options.intensity_increase_streak as usize..];
        if window.windows(2).all(|w| w[1] >= w[0]) {
            self.current_tenure = ((self.current_tenure as f64 * self.options.tenure_increase_rate) as i64)
                .clamp(self.options.tenure_min, self.options.tenure_max);
        } else if window.windows(2).all(|w| w[1] <= w[0]) {
            self.current_tenure = ((self.current_tenure as f64 * self.options.tenure_decrease_rate) as i64)
                .clamp(self.options.tenure_min, self.options.tenure_max);
        }
    }

    pub fn run(
        &mut self,
        store: &mut ModelStore,
        search: &mut TabuSearch,
        incumbents: &mut IncumbentHolder,
        cancel: &Arc<AtomicBool>,
    ) -> SolveReport {
        let start = Instant::now();
        let mut restarts: i64 = 0;
        let mut total_inner_iterations: i64 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return self.finish(Status::Interrupted, restarts, total_inner_iterations);
            }
            if let Some(max_time) = self.options.global_max_time {
                if start.elapsed() >= max_time {
                    return self.finish(Status::TimeLimit, restarts, total_inner_iterations);
                }
            }
            if let Some(max_iterations) = self.options.global_max_iterations {
                if total_inner_iterations >= max_iterations {
                    return self.finish(Status::IterationLimit, restarts, total_inner_iterations);
                }
            }
            if restarts >= self.options.max_restarts {
                return self.finish(Status::Unknown, restarts, total_inner_iterations);
            }
            if let Some(target) = self.options.target_objective {
                if let Some(feasible) = &incumbents.feasible {
                    if feasible.objective <= target + 1e-10 {
                        return self.finish(Status::Optimal, restarts, total_inner_iterations);
                    }
                }
            }

            store.refresh_dependent_variables();
            search.set_tenure(self.current_tenure);

            let feasible_before = incumbents.feasible.as_ref().map(|i| i.objective);
            let result = search.run(store, incumbents, cancel);
            total_inner_iterations += result.iterations;
            restarts += 1;

            let improved = incumbents
                .feasible
                .as_ref()
                .map(|i| feasible_before.map(|b| i.objective < b - 1e-10).unwrap_or(true))
                .unwrap_or(false);
            if improved {
                self.unsuccessful_restarts = 0;
                self.feasible_stable_count = 0;
            } else {
                self.unsuccessful_restarts += 1;
                self.feasible_stable_count += 1;
            }

            self.intensity_history.push(result.intensity);
            self.adjust_tenure();
            self.update_penalty_coefficients(store);
            self.maybe_reset_penalty_coefficients(store, result.intensity);
            std::mem::swap(&mut self.previous_feasible_violated, &mut self.recent_feasible_violated);

            if self.feasible_stable_count >= self.options.feasible_stable_restarts {
                return self.finish(
                    if incumbents.feasible.is_some() { Status::Optimal } else { Status::Unknown },
                    restarts,
                    total_inner_iterations,
                );
            }

            match result.reason {
                TerminationReason::ReachTarget => {
                    return self.finish(Status::Optimal, restarts, total_inner_iterations);
                }
                TerminationReason::TimeOver | TerminationReason::IterationOver => {
                    return self.finish(Status::TimeLimit, restarts, total_inner_iterations);
                }
                TerminationReason::NoMove | TerminationReason::LocalOptimal => {
                    // fall through to the next restart phase
                }
            }
        }
    }

    fn finish(&self, status: Status, restarts: i64, total_inner_iterations: i64) -> SolveReport {
        SolveReport {
            status,
            restarts,
            total_inner_iterations,
        }
    }
}
