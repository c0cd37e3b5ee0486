#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that configures and runs a Sweeper cleaning simulation.

mod config;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sweeper_core::{CellCoord, MovementRule, SimulationConfig};
use sweeper_simulation::{RunSummary, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigFile, Overrides};

/// Runs cleaning agents over a dirty grid until a stopping condition fires.
#[derive(Debug, Parser)]
#[command(name = "sweeper", version, about)]
struct Cli {
    /// TOML file providing the base configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of cleaning agents.
    #[arg(long)]
    agents: Option<u32>,
    /// Number of grid columns.
    #[arg(long)]
    width: Option<u32>,
    /// Number of grid rows.
    #[arg(long)]
    height: Option<u32>,
    /// Turn limit after which the run times out.
    #[arg(long)]
    max_turns: Option<u64>,
    /// Percentage of grid cells that start dirty.
    #[arg(long, conflicts_with = "dirt_count")]
    dirty_percentage: Option<f64>,
    /// Exact number of dirty markers to scatter.
    #[arg(long)]
    dirt_count: Option<u64>,
    /// Start column shared by every agent.
    #[arg(long, requires = "start_row")]
    start_column: Option<u32>,
    /// Start row shared by every agent.
    #[arg(long, requires = "start_column")]
    start_row: Option<u32>,
    /// Movement rule applied by every agent.
    #[arg(long, value_enum)]
    movement: Option<Movement>,
    /// Wall-clock limit in seconds.
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<f64>,
    /// Clean percentage at which the run declares victory.
    #[arg(long, value_name = "PERCENT")]
    victory: Option<f64>,
    /// Seed for the run's random generator.
    #[arg(long)]
    seed: Option<u64>,
    /// Writes the per-turn metrics series to this file as JSON.
    #[arg(long, value_name = "PATH")]
    metrics_out: Option<PathBuf>,
    /// Prints the run summary as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Movement {
    AvoidAgents,
    Unrestricted,
}

impl From<Movement> for MovementRule {
    fn from(movement: Movement) -> Self {
        match movement {
            Movement::AvoidAgents => MovementRule::AvoidAgents,
            Movement::Unrestricted => MovementRule::Unrestricted,
        }
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            agents: self.agents,
            width: self.width,
            height: self.height,
            max_turns: self.max_turns,
            dirty_percentage: self.dirty_percentage,
            dirt_count: self.dirt_count,
            start: self
                .start_column
                .zip(self.start_row)
                .map(|(column, row)| CellCoord::new(column, row)),
            movement: self.movement.map(MovementRule::from),
            time_limit: self.time_limit,
            victory: self.victory,
            seed: self.seed,
        }
    }

    /// Merges defaults, the optional config file and flags, in that order.
    fn resolve(&self) -> Result<(SimulationConfig, Option<PathBuf>)> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let mut simulation = file.simulation;
        self.overrides().apply(&mut simulation);
        let metrics_out = self.metrics_out.clone().or(file.metrics_out);
        Ok((simulation, metrics_out))
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let (config, metrics_out) = cli.resolve()?;

    let mut simulation =
        Simulation::new(config).context("invalid simulation configuration")?;
    let outcome = simulation.run().context("simulation aborted")?;
    info!(
        %outcome,
        turns = simulation.turn(),
        seed = simulation.config().seed,
        elapsed = ?simulation.elapsed(),
        "run complete"
    );

    let summary = simulation.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if let Some(path) = metrics_out {
        let json = simulation.metrics().to_json()?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "metrics written");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let outcome = summary
        .outcome
        .map_or_else(|| "running".to_owned(), |outcome| outcome.to_string());
    println!("outcome:          {outcome}");
    println!("turns:            {}", summary.turns);
    println!("dirty remaining:  {}", summary.dirty_remaining);
    println!("total moves:      {}", summary.total_moves);
    println!("clean percentage: {:.2}", summary.clean_percentage);
    for agent in &summary.agents {
        println!(
            "  agent {} at {}: {} moves, {} cleaned",
            agent.id, agent.cell, agent.moves_made, agent.cells_cleaned
        );
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
