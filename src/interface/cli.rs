//! Command-line surface: one `clap`-derived struct mirroring the flag table,
//! plus the glue that turns parsed flags into solver option overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::callback::Verbosity;

#[derive(Parser, Debug)]
#[command(name = "tabumilp", about = "Tabu-search metaheuristic solver for mixed-integer optimisation instances")]
pub struct Cli {
    /// Instance file (MPS or OPB/PB, auto-detected by content).
    pub instance: PathBuf,

    /// Option overrides as a JSON object of name -> value.
    #[arg(short = 'p', long = "options")]
    pub options_file: Option<PathBuf>,

    /// Initial solution: "name value" per line.
    #[arg(short = 'i', long = "initial")]
    pub initial_solution: Option<PathBuf>,

    /// Restricts the search to only the listed variables; all others are
    /// fixed at their initial/default value.
    #[arg(short = 'm', long = "mutable")]
    pub mutable_variables: Option<PathBuf>,

    /// Fixes the listed variables at their current value.
    #[arg(short = 'f', long = "fixed")]
    pub fixed_variables: Option<PathBuf>,

    /// User-defined selection constraints: space-separated member names, one
    /// group per line.
    #[arg(short = 's', long = "selections")]
    pub selections: Option<PathBuf>,

    /// User-defined flippable variable pairs, one pair per line.
    #[arg(short = 'x', long = "flippable")]
    pub flippable_pairs: Option<PathBuf>,

    /// Minimum shared-element count for flippable-pair extraction.
    #[arg(short = 'c', long = "min-common")]
    pub min_common_elements: Option<i64>,

    /// Maximum outer (restart) iterations.
    #[arg(short = 'k', long = "iteration-max")]
    pub iteration_max: Option<f64>,

    /// Maximum wall-clock time, in seconds.
    #[arg(short = 't', long = "time-max")]
    pub time_max_seconds: Option<f64>,

    /// Output verbosity.
    #[arg(short = 'v', long = "verbosity", value_enum)]
    pub verbosity: Option<VerbosityArg>,

    /// Worker threads for parallel move evaluation; -1 selects automatically.
    #[arg(short = 'j', long = "jobs")]
    pub worker_threads: Option<i64>,

    /// RNG seed.
    #[arg(short = 'r', long = "seed")]
    pub seed: Option<u64>,

    /// Count instance-parsing time against the time limit.
    #[arg(long = "include-instance-loading-time")]
    pub include_instance_loading_time: bool,

    /// Write the canonicalised instance as JSON instead of solving.
    #[arg(long = "export-json-instance")]
    pub export_json_instance: bool,

    #[arg(long = "minimize", conflicts_with = "maximize")]
    pub minimize: bool,

    #[arg(long = "maximize", conflicts_with = "minimize")]
    pub maximize: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityArg {
    Off,
    Warning,
    Outer,
    Inner,
    Full,
    Debug,
}

impl From<VerbosityArg> for Verbosity {
    fn from(arg: VerbosityArg) -> Self {
        match arg {
            VerbosityArg::Off => Verbosity::Off,
            VerbosityArg::Warning => Verbosity::Warning,
            VerbosityArg::Outer => Verbosity::Outer,
            VerbosityArg::Inner => Verbosity::Inner,
            VerbosityArg::Full => Verbosity::Full,
            VerbosityArg::Debug => Verbosity::Debug,
        }
    }
}

impl Cli {
    /// `Some(true)`/`Some(false)` if `--minimize`/`--maximize` was given,
    /// `None` to keep the objective sense the instance declares.
    pub fn force_minimize(&self) -> Option<bool> {
        if self.minimize {
            Some(true)
        } else if self.maximize {
            Some(false)
        } else {
            None
        }
    }
}
