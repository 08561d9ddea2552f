//! Iteration reporting hooks, separate from the PB-competition `o`/`s`/`v`
//! stream in `interface::pbo_output` so embedding callers can plug in their
//! own monitoring without going through stdout.

use macros::build_option_enum;

use crate::{Options, Status};

/// Mirrors spec verbosity levels: higher numbers print more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Off,
    Warning,
    Outer,
    Inner,
    Full,
    Debug,
}

impl Verbosity {
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Verbosity::Off,
            1 => Verbosity::Warning,
            2 => Verbosity::Outer,
            3 => Verbosity::Inner,
            4 => Verbosity::Full,
            _ => Verbosity::Debug,
        }
    }
}

/// One inner-loop or restart event, reported at the matching [`Verbosity`].
pub struct IterationReport {
    pub level: Verbosity,
    pub restart: i64,
    pub iteration: i64,
    pub objective: f64,
    pub feasible: bool,
    pub total_violation: f64,
    pub intensity: f64,
    pub tenure: i64,
    pub status: Status,
}

/// Hook invoked whenever the tabu search or outer controller has something
/// to report.
pub trait Callback {
    /// Creates a new callback from solver options.
    fn new(options: &Options) -> Self
    where
        Self: Sized;

    /// Called with the current report; implementations decide whether to
    /// act on it based on their configured verbosity.
    fn call(&mut self, report: &IterationReport);
}

/// A callback that does nothing. Use when no per-iteration output is needed.
pub struct NoOpCallback {}

impl Callback for NoOpCallback {
    fn new(_options: &Options) -> Self {
        Self {}
    }

    fn call(&mut self, _report: &IterationReport) {}
}

/// Prints one line per report that meets the configured verbosity, in the
/// PB-competition `c` comment style.
pub struct ConvergenceOutput {
    verbosity: Verbosity,
}

impl Callback for ConvergenceOutput {
    fn new(options: &Options) -> Self {
        let level = options.get_option::<i64>("verbosity").unwrap_or(1);
        Self {
            verbosity: Verbosity::from_level(level),
        }
    }

    fn call(&mut self, report: &IterationReport) {
        if report.level > self.verbosity {
            return;
        }
        println!(
            "c restart {:4} iter {:7} obj {:<12.4} feas {} viol {:<10.4} intensity {:<6.3} tenure {:3} status {:?}",
            report.restart,
            report.iteration,
            report.objective,
            report.feasible,
            report.total_violation,
            report.intensity,
            report.tenure,
            report.status,
        );
    }
}

build_option_enum!(
    trait_ = Callback,
    name = "Callbacks",
    variants = (NoOpCallback, ConvergenceOutput),
    new_arguments = (&Options,),
    doc_header = "An enum representing different callbacks for the tabu-search solver. Each variant corresponds to a specific reporting strategy."
);
