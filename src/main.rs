use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use compas_engine::config::EngineConfig;
use compas_engine::graph::catalog;
use compas_engine::logging;
use compas_engine::simulation::{ExperimentReport, ProfileKind, SimulationRunner};

const DEFAULT_ITERATIONS: usize = 100;
const DEFAULT_SEED: u64 = 42;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationOutput {
    generated_at: String,
    iterations: usize,
    seed: u64,
    reports: Vec<ExperimentReport>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() {
    let _ = dotenvy::dotenv();
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _log_guard = logging::init_tracing(&log_level);

    let config = EngineConfig::from_env();
    if let Err(err) = config.validate() {
        tracing::error!(error = %err, "invalid engine configuration");
        std::process::exit(2);
    }

    let iterations = env_or("COMPAS_SIM_ITERATIONS", DEFAULT_ITERATIONS);
    let seed = env_or("COMPAS_SIM_SEED", DEFAULT_SEED);
    tracing::info!(iterations, seed, "starting learner simulation");

    let runner = SimulationRunner::new(config, Arc::new(catalog::unified()));
    // optional first argument narrows the run to one profile
    let result = match std::env::args().nth(1) {
        Some(name) => name
            .parse::<ProfileKind>()
            .and_then(|profile| runner.run_experiment(profile, iterations, seed))
            .map(|report| vec![report]),
        None => runner.run_all(iterations, seed),
    };
    let reports = match result {
        Ok(reports) => reports,
        Err(err) => {
            tracing::error!(error = %err, "simulation failed");
            std::process::exit(1);
        }
    };

    let output = SimulationOutput {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        iterations,
        seed,
        reports,
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize simulation report");
            std::process::exit(1);
        }
    }
}
