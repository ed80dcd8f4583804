//! Headless runner: load a config, tick the simulation and log statistics.
//!
//! Usage: `constellation [config.json] [ticks]`

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use constellation::{SimConfig, Simulation};

const DEFAULT_TICKS: u64 = 600;
const REPORT_INTERVAL: u64 = 60;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_config(path: Option<PathBuf>) -> SimConfig {
    let Some(path) = path else {
        tracing::info!("no config file given, using the cylinder preset");
        return SimConfig::default();
    };

    match SimConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load config, using the cylinder preset");
            SimConfig::default()
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let mut args = env::args().skip(1);
    let config = load_config(args.next().map(PathBuf::from));
    let ticks = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!(error = %e, "cannot start simulation");
            return ExitCode::FAILURE;
        }
    };

    let started = Instant::now();
    for _ in 0..ticks {
        sim.advance();
        let frame = sim.frame();
        if frame.frame_number() % REPORT_INTERVAL != 0 {
            continue;
        }

        let active = frame.positions().len();
        let outside = frame
            .positions()
            .iter()
            .filter(|p| !sim.volume().contains(**p))
            .count();
        let mean_degree = if active == 0 {
            0.0
        } else {
            frame.connections().iter().sum::<u32>() as f32 / active as f32
        };

        tracing::info!(
            frame = frame.frame_number(),
            active,
            edges = frame.edges().len(),
            mean_degree,
            outside,
            "frame stats"
        );
    }

    let elapsed = started.elapsed();
    tracing::info!(
        ticks,
        elapsed_ms = elapsed.as_millis() as u64,
        per_tick_us = elapsed.as_micros() as u64 / ticks.max(1),
        "done"
    );
    ExitCode::SUCCESS
}
