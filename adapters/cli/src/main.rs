#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line control surface for the load splitter simulation.

mod config;
mod config_transfer;
mod report;

use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loadsplit_core::{BalancingPolicy, SimulationConfig};
use loadsplit_engine::{Realtime, Simulation};
use loadsplit_rendering::{RenderHandles, Renderer, TextRenderer};
use loadsplit_system_scheduler::{Clock, SimulationSpeed, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::ConfigArgs,
    report::{comparison_table, RunReport},
};

/// Simulates a splitter feeding work-units into a pool of loaders and reports
/// latency and throughput for the configured balancing policy.
#[derive(Parser, Debug)]
#[command(name = "loadsplit", version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run a fixed number of ticks without a wall clock.
    Run {
        /// Ticks to execute.
        #[arg(short, long, default_value_t = 1_000)]
        ticks: u64,

        /// Print a text frame every N ticks.
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        render_every: Option<u64>,

        /// Print the final report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run every balancing preset with the same workload and compare them.
    Compare {
        /// Ticks to execute per preset.
        #[arg(short, long, default_value_t = 10_000)]
        ticks: u64,

        /// Print the reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Drive the simulation against the wall clock, rendering once per frame.
    Realtime {
        /// Seconds to run for.
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,

        /// Logarithmic speed control; ticks per second are 2.5 * 10^value.
        #[arg(long, default_value_t = 0.0)]
        log_speed: f64,

        /// Wall-clock milliseconds between frames.
        #[arg(long, default_value_t = 100)]
        frame_ms: u64,
    },
    /// Print a share string for the effective configuration.
    Share,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.resolve()?;

    match cli.mode {
        Mode::Run {
            ticks,
            render_every,
            json,
        } => run(config, ticks, render_every, json),
        Mode::Compare { ticks, json } => compare(&config, ticks, json),
        Mode::Realtime {
            duration,
            log_speed,
            frame_ms,
        } => realtime(
            config,
            duration,
            log_speed,
            Duration::from_millis(frame_ms),
        ),
        Mode::Share => {
            println!("{}", config_transfer::encode(&config));
            Ok(())
        }
    }
}

fn run(config: SimulationConfig, ticks: u64, render_every: Option<u64>, json: bool) -> Result<()> {
    let policy = config::preset_name(config.policy);
    let mut simulation = Simulation::new(config)?;
    let mut handles = RenderHandles::new();
    let mut renderer = TextRenderer::new(io::stdout());

    info!(ticks, policy, "starting headless run");
    for tick in 1..=ticks {
        let events = simulation.tick();
        handles.handle(&events)?;
        if render_every.is_some_and(|every| tick % every == 0) {
            renderer.present(&simulation.view())?;
        }
    }

    print_report(&RunReport::capture(policy, &simulation), json)
}

fn compare(config: &SimulationConfig, ticks: u64, json: bool) -> Result<()> {
    let mut reports = Vec::new();
    for (name, policy) in BalancingPolicy::presets() {
        let mut simulation = Simulation::new(SimulationConfig {
            policy,
            ..config.clone()
        })?;
        simulation.run(ticks);
        info!(policy = name, "preset finished");
        reports.push(RunReport::capture(name, &simulation));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", comparison_table(&reports));
    }
    Ok(())
}

fn realtime(
    config: SimulationConfig,
    duration: f64,
    log_speed: f64,
    frame_interval: Duration,
) -> Result<()> {
    let deadline = Duration::try_from_secs_f64(duration)
        .with_context(|| format!("invalid duration {duration}"))?;
    let speed = SimulationSpeed::from_log(log_speed)?;
    let policy = config::preset_name(config.policy);

    let clock = SystemClock::new();
    let mut realtime = Realtime::new(Simulation::new(config)?, speed, clock.now());
    let mut handles = RenderHandles::new();
    let mut renderer = TextRenderer::new(io::stdout());
    let mut discarded = 0.0;

    info!(
        ticks_per_second = speed.ticks_per_second(),
        "starting realtime run"
    );
    while clock.now() < deadline {
        thread::sleep(frame_interval);
        let frame = realtime.frame(&clock);
        handles.handle(&frame.events)?;
        if frame.report.budget_exceeded {
            discarded += frame.report.debt_discarded;
        }
        if let Some(view) = frame.view {
            renderer.present(&view)?;
        }
    }

    if discarded > 0.0 {
        warn!(discarded, "ticks dropped to keep frames responsive");
    }
    print_report(&RunReport::capture(policy, realtime.simulation()), false)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
