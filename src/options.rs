//! Registers the solver's tunable options with the crate-wide registry so
//! [`crate::Options`] (built by `build_options!` in `lib.rs`) carries every
//! flag the CLI front-end and the tabu-search/controller constructors read.
//! This struct itself is never instantiated; it only exists to carry the
//! `#[use_option(...)]` attributes that `build_options!` collects.

use macros::{explicit_options, use_option};

#[explicit_options]
#[use_option(name = "iteration_max", type_ = i64, default = "10000", description = "Max outer iterations (-k)")]
#[use_option(name = "time_max_seconds", type_ = f64, default = "60.0", description = "Max time in seconds (-t)")]
#[use_option(name = "tenure_min", type_ = i64, default = "1", description = "Minimum tabu tenure")]
#[use_option(name = "tenure_max", type_ = i64, default = "50", description = "Maximum tabu tenure")]
#[use_option(name = "tenure_initial", type_ = i64, default = "10", description = "Initial tabu tenure")]
#[use_option(
    name = "penalty_coefficient_relaxing_rate",
    type_ = f64,
    default = "0.9",
    description = "Penalty relax factor, in (0,1)"
)]
#[use_option(
    name = "penalty_coefficient_tightening_rate",
    type_ = f64,
    default = "1.1",
    description = "Penalty tighten factor, > 1"
)]
#[use_option(
    name = "frequency_penalty_coefficient",
    type_ = f64,
    default = "0.1",
    description = "Weight of Memory's frequency penalty term"
)]
#[use_option(
    name = "ignore_tabu_if_global_incumbent",
    type_ = bool,
    default = "false",
    description = "Aspiration also applies against the feasible incumbent"
)]
#[use_option(
    name = "initial_modification_flips",
    type_ = usize,
    default = "0",
    description = "Random binary flips applied at each restart start"
)]
#[use_option(
    name = "worker_threads",
    type_ = i64,
    default = "-1",
    description = "Worker threads for parallel move evaluation, -1 = auto (-j)"
)]
#[use_option(name = "seed", type_ = u64, default = "0", description = "RNG seed (-r)")]
#[use_option(
    name = "verbosity",
    type_ = i64,
    default = "1",
    description = "Output level: 0=off, 1=warning, 2=outer, 3=inner, 4=full, 5=debug (-v)"
)]
#[use_option(
    name = "min_common_elements",
    type_ = i64,
    default = "1",
    description = "Min common elements for flippable-pair extraction (-c)"
)]
#[use_option(
    name = "include_instance_loading_time",
    type_ = bool,
    default = "false",
    description = "Count parse time against the time limit"
)]
#[use_option(
    name = "export_json_instance",
    type_ = bool,
    default = "false",
    description = "Dump the canonicalised model instead of solving"
)]
pub struct SolverOptionDefaults {}
