use std::any::Any;

use dyn_clone::DynClone;
use macros::build_options;
use problemo::Problem;

pub mod callback;
pub mod classify;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod incumbent;
pub mod interface;
pub mod memory;
pub mod model;
pub mod neighborhood;
pub mod options;
pub mod presolve;
pub mod tabu_search;
pub mod terminators;

pub trait OptionTrait: Any + Sync + Send + DynClone {}
impl OptionTrait for &'static str {}
impl OptionTrait for String {}
impl OptionTrait for bool {}
impl OptionTrait for usize {}
impl OptionTrait for u8 {}
impl OptionTrait for u16 {}
impl OptionTrait for u32 {}
impl OptionTrait for u64 {}
impl OptionTrait for i8 {}
impl OptionTrait for i16 {}
impl OptionTrait for i32 {}
impl OptionTrait for i64 {}
impl OptionTrait for f32 {}
impl OptionTrait for f64 {}

impl Clone for Box<dyn OptionTrait> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

/// Status codes for the solver.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Status {
    #[default]
    /// The solver is still running.
    InProgress,
    /// A feasible solution meeting the target objective was found.
    Optimal,
    /// Presolve proved the model has no feasible point.
    Infeasible,
    /// No bound on the objective exists (unused by this engine; kept for
    /// interface parity with the option registry's Status family).
    Unbounded,
    /// The solver stopped without a conclusive outcome.
    Unknown,
    /// The solver stopped due to a time limit.
    TimeLimit,
    /// The solver stopped due to an iteration limit.
    IterationLimit,
    /// The solver was interrupted (signal, or a programmatic cancel flag).
    Interrupted,
}

impl Status {
    /// PB-competition status line token.
    pub fn pb_label(&self) -> &'static str {
        match self {
            Status::Optimal => "SATISFIABLE",
            Status::Infeasible => "UNSATISFIABLE",
            _ => "UNKNOWN",
        }
    }
}

build_options!(registry_name = OPTION_REGISTRY);
