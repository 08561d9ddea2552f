//! Typed errors returned at the core solver boundary. Internally these stay
//! a `derive_more` enum so match arms are exhaustive; the CLI wrapper and any
//! embedding caller convert to [`problemo::Problem`] at the boundary via
//! [`IntoSolverProblem`].

use derive_more::{Display, Error};
use problemo::Problem;
use problemo::common::IntoCommonProblem;

#[derive(Debug, Display, Error)]
pub enum SolverError {
    /// A parser detected a structural violation in the instance file.
    #[display("malformed instance: {message}")]
    MalformedInstance { message: String },

    /// Presolve proved the model has no feasible point.
    #[display("infeasible by construction: {message}")]
    InfeasibleByConstruction { message: String },

    /// A provided initial value violates a bound or a selection constraint
    /// on a *fixed* variable, which cannot be silently corrected.
    #[display("invalid initial value for fixed variable '{variable}': {message}")]
    InvalidInitialValue { variable: String, message: String },

    /// An option value fell outside its documented range.
    #[display("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Defensive: an internal invariant was violated. Never expected to be
    /// caught by a caller; its presence indicates a bug.
    #[display("internal invariant violation: {message}")]
    InternalInvariantViolation { message: String },
}

impl SolverError {
    /// Exit status string used by the PB-competition output and exit code.
    pub fn status_label(&self) -> &'static str {
        match self {
            SolverError::MalformedInstance { .. } => "UNSUPPORTED",
            SolverError::InfeasibleByConstruction { .. } => "UNSATISFIABLE",
            SolverError::InvalidInitialValue { .. } => "UNSUPPORTED",
            SolverError::InvalidConfiguration { .. } => "UNSUPPORTED",
            SolverError::InternalInvariantViolation { .. } => "UNKNOWN",
        }
    }
}

impl From<SolverError> for Problem {
    fn from(err: SolverError) -> Problem {
        err.to_string().gloss()
    }
}

/// Warnings are textual only and never affect exit status; the CLI wrapper
/// just prints them at the configured verbosity.
#[derive(Debug, Clone, Display)]
pub enum SolverWarning {
    #[display("corrected initial value of '{variable}' from {from} to {to}")]
    InitialValueCorrected { variable: String, from: i64, to: i64 },
    #[display("{message}")]
    Other { message: String },
}
