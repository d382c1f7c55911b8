//! Thin demonstrative CLI: bootstraps logging and dispatches to either a
//! single itinerary plan or the evaluation scenario matrix.
//!
//! Grounded on `ACTOTA-actota-api/src/main.rs`'s `env_logger::init_from_env`
//! + dotenv bootstrap pattern, minus the actix-web HTTP server (out of
//! scope per spec section 1).

use std::fs;
use std::process::ExitCode;

use env_logger::Env;
use rand::rngs::StdRng;
use rand::SeedableRng;

use tripweave::config::PlannerConfig;
use tripweave::place::Place;

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  tripweave plan <places.json> <start-date> <end-date> <walking|transit|driving>");
    eprintln!("  tripweave evaluate [num-random-solutions]");
}

fn run_plan(args: &[String]) -> ExitCode {
    let [places_path, start_date, end_date, mode] = args else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let raw = match fs::read_to_string(places_path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("failed to read {places_path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let places: Vec<Place> = match serde_json::from_str(&raw) {
        Ok(places) => places,
        Err(err) => {
            eprintln!("failed to parse {places_path} as a place list: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = PlannerConfig::from_env();
    let mut rng = StdRng::from_entropy();
    let output = tripweave::plan(&places, start_date, end_date, mode, &config, &mut rng);

    match serde_json::to_string_pretty(&output) {
        Ok(json) => {
            println!("{json}");
            if output.success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Err(err) => {
            eprintln!("failed to serialize planner output: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_evaluate(args: &[String]) -> ExitCode {
    let num_random_solutions = args
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| PlannerConfig::from_env().default_num_random_solutions);

    let config = PlannerConfig::from_env();
    let report = tripweave::eval::run_scenario_matrix(42, num_random_solutions, &config);

    log::info!(
        "evaluated {}/{} scenarios ({} failed, {} missing)",
        report.evaluated.len(),
        report.expected_count,
        report.failed.len(),
        report.missing.len(),
    );
    log::info!(
        "planner beats random median in {:.1}% of scenarios, significantly so in {:.1}%",
        report.better_than_random_rate * 100.0,
        report.significantly_better_rate * 100.0,
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize evaluation report: {err}"),
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    if cfg!(debug_assertions) {
        dotenvy::dotenv().ok();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((cmd, rest)) if cmd == "plan" => run_plan(rest),
        Some((cmd, rest)) if cmd == "evaluate" => run_evaluate(rest),
        _ => {
            print_usage();
            ExitCode::FAILURE
        }
    }
}
