//! CLI entry point: parse an instance, presolve it, run the tabu-search
//! controller, and report the result.

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use problemo::Problem;
use problemo::common::IntoCommonProblem;
use serde_json::Value;

use tabumilp::Options;
use tabumilp::Status;
use tabumilp::callback::{Callback, ConvergenceOutput, IterationReport, Verbosity};
use tabumilp::controller::{Controller, ControllerOptions};
use tabumilp::error::SolverError;
use tabumilp::incumbent::IncumbentHolder;
use tabumilp::interface::cli::Cli;
use tabumilp::interface::pbo_output;
use tabumilp::interface::{json, loading};
use tabumilp::memory::TabuMode;
use tabumilp::model::{Move, ModelStore, MoveSense};
use tabumilp::neighborhood::{
    BinaryFlipGenerator, ChainMoveGenerator, IntegerStepGenerator, NeighbourhoodDispatcher, SelectionMoveGenerator,
    StructuredConstraintGenerator, UserDefinedGenerator,
};
use tabumilp::presolve::Presolver;
use tabumilp::tabu_search::{TabuSearch, TabuSearchOptions};
use tabumilp::terminators::InterruptTerminator;

fn detect_and_parse(path: &std::path::Path) -> Result<loaders::model::RawModel, Problem> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string().gloss())?;
    let looks_like_opb = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.starts_with('*') || l.starts_with("min:") || l.starts_with("max:"))
        .unwrap_or(false);
    if looks_like_opb {
        loaders::opb::parse_str(&text)
    } else {
        loaders::mps::parse_str(&text)
    }
}

fn apply_option_overrides(options: &mut Options, path: &std::path::Path) -> Result<(), Problem> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string().gloss())?;
    let value: Value = serde_json::from_str(&text).map_err(|e| e.to_string().gloss())?;
    let Value::Object(map) = value else {
        return Err("option file must contain a JSON object".gloss());
    };
    for (key, v) in map {
        let ok = match key.as_str() {
            "iteration_max" | "tenure_min" | "tenure_max" | "tenure_initial" | "min_common_elements" | "worker_threads" => {
                v.as_i64().map(|n| options.set_option::<i64>(&key, n).is_ok()).unwrap_or(false)
            }
            "seed" => v.as_u64().map(|n| options.set_option::<u64>(&key, n).is_ok()).unwrap_or(false),
            "initial_modification_flips" => v
                .as_u64()
                .map(|n| options.set_option::<usize>(&key, n as usize).is_ok())
                .unwrap_or(false),
            "verbosity" => v.as_i64().map(|n| options.set_option::<i64>(&key, n).is_ok()).unwrap_or(false),
            "time_max_seconds"
            | "penalty_coefficient_relaxing_rate"
            | "penalty_coefficient_tightening_rate"
            | "frequency_penalty_coefficient" => v.as_f64().map(|n| options.set_option::<f64>(&key, n).is_ok()).unwrap_or(false),
            "ignore_tabu_if_global_incumbent" | "include_instance_loading_time" | "export_json_instance" => {
                v.as_bool().map(|b| options.set_option::<bool>(&key, b).is_ok()).unwrap_or(false)
            }
            _ => return Err(format!("unknown option '{key}' in options file").gloss()),
        };
        if !ok {
            return Err(format!("option '{key}' has the wrong JSON type").gloss());
        }
    }
    Ok(())
}

fn build_dispatcher(
    store: &ModelStore,
    flippable_pairs: Vec<(tabumilp::model::VariableId, tabumilp::model::VariableId)>,
) -> NeighbourhoodDispatcher {
    let mut generators: Vec<Box<dyn tabumilp::neighborhood::NeighbourhoodGenerator>> = vec![
        Box::new(BinaryFlipGenerator::new()),
        Box::new(IntegerStepGenerator::new(0)),
        Box::new(SelectionMoveGenerator::new()),
        Box::new(StructuredConstraintGenerator::new()),
        Box::new(ChainMoveGenerator::new(store.variables.len())),
    ];
    if !flippable_pairs.is_empty() {
        generators.push(Box::new(UserDefinedGenerator::new(Box::new(move |store: &ModelStore| {
            flippable_pairs
                .iter()
                .filter_map(|&(a, b)| {
                    let va = &store.variables[a.0];
                    let vb = &store.variables[b.0];
                    if va.fixed || vb.fixed || va.value == vb.value {
                        return None;
                    }
                    let related = store
                        .related_constraints(a)
                        .chain(store.related_constraints(b))
                        .map(|(c, _)| c)
                        .collect::<Vec<_>>();
                    Some(Move::new(vec![(a, vb.value), (b, va.value)], MoveSense::UserDefined, related))
                })
                .collect()
        }))));
    }
    NeighbourhoodDispatcher::new(generators)
}

fn run() -> Result<ExitCode, Problem> {
    let cli = Cli::parse();

    let mut options = Options::new();
    if let Some(path) = &cli.options_file {
        apply_option_overrides(&mut options, path)?;
    }
    if let Some(v) = cli.min_common_elements {
        options.set_option::<i64>("min_common_elements", v).map_err(|e| e.gloss())?;
    }
    if let Some(v) = cli.iteration_max {
        options.set_option::<i64>("iteration_max", v as i64).map_err(|e| e.gloss())?;
    }
    if let Some(v) = cli.time_max_seconds {
        options.set_option::<f64>("time_max_seconds", v).map_err(|e| e.gloss())?;
    }
    if let Some(v) = cli.verbosity {
        let level = Verbosity::from(v);
        options
            .set_option::<i64>("verbosity", level as i64)
            .map_err(|e| e.gloss())?;
    }
    if let Some(v) = cli.worker_threads {
        options.set_option::<i64>("worker_threads", v).map_err(|e| e.gloss())?;
    }
    if let Some(v) = cli.seed {
        options.set_option::<u64>("seed", v).map_err(|e| e.gloss())?;
    }
    if cli.include_instance_loading_time {
        options.set_option::<bool>("include_instance_loading_time", true).map_err(|e| e.gloss())?;
    }
    if cli.export_json_instance {
        options.set_option::<bool>("export_json_instance", true).map_err(|e| e.gloss())?;
    }

    let loading_start = std::time::Instant::now();
    let raw = detect_and_parse(&cli.instance)?;
    let mut store = loading::build_model_store(&raw, cli.force_minimize())?;

    let by_name: std::collections::HashMap<String, tabumilp::model::VariableId> =
        store.variables.iter().enumerate().map(|(i, v)| (v.name.clone(), tabumilp::model::VariableId(i))).collect();

    if let Some(path) = &cli.initial_solution {
        let warnings = loading::apply_initial_solution(&mut store, &by_name, path)?;
        for warning in warnings {
            eprintln!("c warning: {warning}");
        }
    }
    if let Some(path) = &cli.fixed_variables {
        loading::apply_fixed_list(&mut store, &by_name, path)?;
    }
    if let Some(path) = &cli.mutable_variables {
        let text = fs::read_to_string(path).map_err(|e| e.to_string().gloss())?;
        let mutable: std::collections::HashSet<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        for name in &raw.variable_order {
            if !mutable.contains(name.as_str()) {
                let id = by_name[name];
                let value = store.variables[id.0].value;
                store.fix_variable(id, value);
            }
        }
    }
    if let Some(path) = &cli.selections {
        loading::apply_user_selections(&mut store, &by_name, path)?;
    }
    let flippable_pairs = match &cli.flippable_pairs {
        Some(path) => loading::read_flippable_pairs(&by_name, path)?,
        None => Vec::new(),
    };

    if options.get_option::<bool>("export_json_instance").unwrap_or(false) {
        let instance = json::dump_instance(&store);
        println!("{}", serde_json::to_string_pretty(&instance).map_err(|e| e.to_string().gloss())?);
        return Ok(ExitCode::SUCCESS);
    }

    match Presolver::default().run(&mut store) {
        Ok(_) => {}
        Err(err @ SolverError::InfeasibleByConstruction { .. }) => {
            eprintln!("c {err}");
            println!("s {}", Status::Infeasible.pb_label());
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(err.into()),
    }

    let include_loading_time = options.get_option::<bool>("include_instance_loading_time").unwrap_or(false);
    let time_max_seconds = options.get_option::<f64>("time_max_seconds").unwrap_or(60.0);
    let elapsed_loading = if include_loading_time { loading_start.elapsed() } else { Duration::ZERO };
    let max_time = Duration::from_secs_f64(time_max_seconds.max(0.0)).checked_sub(elapsed_loading).unwrap_or(Duration::ZERO);

    let tenure_initial = options.get_option::<i64>("tenure_initial").unwrap_or(10);
    let tenure_min = options.get_option::<i64>("tenure_min").unwrap_or(1);
    let tenure_max = options.get_option::<i64>("tenure_max").unwrap_or(50);
    let seed = options.get_option::<u64>("seed").unwrap_or(0);
    let worker_threads = options.get_option::<i64>("worker_threads").unwrap_or(-1);
    let frequency_penalty_coefficient = options.get_option::<f64>("frequency_penalty_coefficient").unwrap_or(0.1);
    let ignore_tabu_if_global_incumbent = options.get_option::<bool>("ignore_tabu_if_global_incumbent").unwrap_or(false);
    let initial_modification_flips = options.get_option::<usize>("initial_modification_flips").unwrap_or(0);
    let iteration_max = options.get_option::<i64>("iteration_max").unwrap_or(10_000);

    let dispatcher = build_dispatcher(&store, flippable_pairs);
    let tabu_options = TabuSearchOptions {
        max_time: Some(max_time),
        max_iterations: Some(iteration_max),
        target_objective: None,
        no_improvement_patience: iteration_max.min(2_000).max(1),
        tenure: tenure_initial,
        tabu_mode: TabuMode::Any,
        ignore_tabu_if_global_incumbent,
        initial_modification_flips,
        seed,
        parallel: worker_threads != 0,
    };
    let mut search = TabuSearch::new(dispatcher, store.variables.len(), tabu_options, frequency_penalty_coefficient);

    let controller_options = ControllerOptions {
        tenure_min,
        tenure_max,
        penalty_coefficient_relaxing_rate: options.get_option::<f64>("penalty_coefficient_relaxing_rate").unwrap_or(0.9),
        penalty_coefficient_tightening_rate: options.get_option::<f64>("penalty_coefficient_tightening_rate").unwrap_or(1.1),
        global_max_time: Some(max_time),
        ..ControllerOptions::default()
    };
    let mut controller = Controller::new(controller_options, store.constraints.len(), tenure_initial);

    let interrupt = InterruptTerminator::new();
    let cancel = Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let flag = interrupt.flag();
        let cancel = cancel.clone();
        std::thread::spawn(move || loop {
            if flag.load(std::sync::atomic::Ordering::SeqCst) {
                cancel.store(true, std::sync::atomic::Ordering::SeqCst);
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        });
    }

    let mut incumbents = IncumbentHolder::new();
    let verbosity_level = options.get_option::<i64>("verbosity").unwrap_or(1);
    let mut reporter = ConvergenceOutput::new(&options);
    let report = controller.run(&mut store, &mut search, &mut incumbents, &cancel);

    if let Some(feasible) = &incumbents.feasible {
        for (var, value) in &feasible.values {
            store.variables[var.0].value = *value;
        }
    }

    reporter.call(&IterationReport {
        level: Verbosity::from_level(verbosity_level),
        restart: report.restarts,
        iteration: report.total_inner_iterations,
        objective: incumbents.feasible.as_ref().map(|i| i.objective).unwrap_or(f64::NAN),
        feasible: incumbents.feasible.is_some(),
        total_violation: store.total_violation(),
        intensity: 0.0,
        tenure: tenure_initial,
        status: report.status,
    });

    if raw.soft_top_cost.is_some() || raw.constraints.iter().any(|c| c.weight.is_some()) {
        pbo_output::report_final(&store, if incumbents.feasible.is_some() { Status::Optimal } else { report.status });
    } else {
        let solution = json::dump_solution(&store, report.status);
        println!("{}", serde_json::to_string_pretty(&solution).map_err(|e| e.to_string().gloss())?);
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(problem) => {
            eprintln!("c error: {problem}");
            ExitCode::from(1)
        }
    }
}
