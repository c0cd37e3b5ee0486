#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation controller driving a cleaning run turn by turn.
//!
//! The controller owns the world, the scheduler, the cleaning system, the
//! termination policies and the metrics collector. Every source of randomness
//! (marker scatter, activation order, movement choice) draws from one seeded
//! ChaCha generator, so a configuration and seed fully determine a run.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sweeper_core::{
    AgentSnapshot, CellCoord, Command, ConfigurationError, EntityView, Event, GridError,
    MetricsSample, Outcome, SimulationConfig, TurnStatus,
};
use sweeper_system_analytics::MetricsCollector;
use sweeper_system_cleaning::Cleaning;
use sweeper_system_scheduler::Scheduler;
use sweeper_system_termination::{TerminationPolicies, TerminationPolicy};
use sweeper_world::{self as world, query, World};
use tracing::{debug, error, info};

/// A single cleaning run.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    scheduler: Scheduler,
    cleaning: Cleaning,
    policies: TerminationPolicies,
    metrics: MetricsCollector,
    rng: ChaCha8Rng,
    started: Instant,
    turn: u64,
    outcome: Option<Outcome>,
    fault: Option<GridError>,
    last_events: Vec<Event>,
}

impl Simulation {
    /// Validates the configuration and builds a run with the standard policies.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigurationError> {
        let policies = TerminationPolicies::from_config(&config);
        Self::with_policies(config, policies)
    }

    /// Validates the configuration and builds a run with custom termination policies.
    ///
    /// Agents are placed first, all at the start cell, followed by the dirty
    /// markers at independently drawn cells. Markers may stack.
    pub fn with_policies(
        config: SimulationConfig,
        policies: TerminationPolicies,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let size = config.grid_size();
        let mut world = World::new(size);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut events = Vec::new();

        let start = config.start_cell();
        for _ in 0..config.agent_count {
            world::apply(&mut world, Command::PlaceAgent { cell: start }, &mut events)?;
        }
        for _ in 0..config.marker_count() {
            let cell = CellCoord::new(
                rng.gen_range(0..size.columns()),
                rng.gen_range(0..size.rows()),
            );
            world::apply(&mut world, Command::PlaceMarker { cell }, &mut events)?;
        }

        info!(
            agents = config.agent_count,
            columns = size.columns(),
            rows = size.rows(),
            markers = query::dirty_count(&world),
            seed = config.seed,
            "simulation initialised"
        );

        Ok(Self {
            scheduler: Scheduler::new(query::agent_ids(&world)),
            cleaning: Cleaning::new(config.movement),
            config,
            world,
            policies,
            metrics: MetricsCollector::new(),
            rng,
            started: Instant::now(),
            turn: 0,
            outcome: None,
            fault: None,
            last_events: events,
        })
    }

    /// Advances the run by one turn.
    ///
    /// Returns the outcome once a termination policy fires. Calling `step` on
    /// a finished run is a no-op that returns the recorded outcome.
    ///
    /// A grid error aborts the turn before it is counted or sampled and halts
    /// the run: every later call returns the same error.
    pub fn step(&mut self) -> Result<Option<Outcome>, GridError> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        if self.outcome.is_some() {
            return Ok(self.outcome);
        }

        self.last_events.clear();

        let Self {
            world: state,
            scheduler,
            cleaning,
            rng,
            last_events,
            ..
        } = self;
        let mut commands = Vec::with_capacity(2);
        let pass = scheduler.run_turn(rng, |agent, rng| {
            commands.clear();
            cleaning.plan(agent, query::grid(state), rng, &mut commands)?;
            for command in commands.drain(..) {
                world::apply(state, command, last_events)?;
            }
            Ok::<(), GridError>(())
        });
        if let Err(fault) = pass {
            error!(turn = self.turn + 1, %fault, "turn aborted");
            self.fault = Some(fault);
            return Err(fault);
        }
        self.turn += 1;

        let total_cells = self.total_cells();
        let dirty = query::dirty_count(&self.world);
        let agents = query::agents(&self.world);
        let sample = self.metrics.record(self.turn, total_cells, dirty, &agents);
        debug!(
            turn = self.turn,
            dirty,
            total_moves = sample.total_moves,
            clean_percentage = sample.clean_percentage,
            "turn complete"
        );

        let status = self.status();
        self.outcome = self.policies.evaluate(&status);
        if let Some(outcome) = self.outcome {
            info!(
                turn = self.turn,
                %outcome,
                dirty = status.dirty_count,
                "simulation finished"
            );
        }
        Ok(self.outcome)
    }

    /// Steps until a termination policy fires.
    ///
    /// A custom policy list that never fires keeps the run going forever.
    pub fn run(&mut self) -> Result<Outcome, GridError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    /// Reports whether the host should keep calling [`Simulation::step`].
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.outcome.is_none() && self.fault.is_none()
    }

    /// Outcome of a finished run.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Number of completed turns.
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Dirty markers still on the grid.
    #[must_use]
    pub fn dirty_count(&self) -> u64 {
        query::dirty_count(&self.world)
    }

    /// Configuration the run was built from.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Per-turn metrics recorded so far.
    #[must_use]
    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Read-only projection of every entity on the grid.
    #[must_use]
    pub fn entity_view(&self) -> EntityView {
        query::entity_view(&self.world)
    }

    /// Snapshots of every cleaning agent ordered by id.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentSnapshot> {
        query::agents(&self.world)
    }

    /// Events produced by the most recent turn, or by set-up before the first one.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.last_events
    }

    /// Read-only access to the world for invariant checks and rendering.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Wall-clock time since the run was built.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Summary of the run in its current state.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let agents = self.agents();
        RunSummary {
            outcome: self.outcome,
            turns: self.turn,
            dirty_remaining: self.dirty_count(),
            total_moves: agents.iter().map(|agent| agent.moves_made).sum(),
            clean_percentage: self.status().clean_percentage(),
            agents,
        }
    }

    fn total_cells(&self) -> u64 {
        self.config.grid_size().cell_count()
    }

    fn status(&self) -> TurnStatus {
        TurnStatus {
            turn: self.turn,
            dirty_count: query::dirty_count(&self.world),
            total_cells: self.total_cells(),
            elapsed: self.elapsed(),
        }
    }
}

/// Serializable report of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Outcome, or `None` while the run is still going.
    pub outcome: Option<Outcome>,
    /// Completed turns.
    pub turns: u64,
    /// Dirty markers left on the grid.
    pub dirty_remaining: u64,
    /// Moves summed across every agent.
    pub total_moves: u64,
    /// Percentage of clean cells.
    pub clean_percentage: f64,
    /// Per-agent cumulative counters.
    pub agents: Vec<AgentSnapshot>,
}

impl RunSummary {
    /// Most recent aggregate sample implied by the summary.
    #[must_use]
    pub const fn as_sample(&self) -> MetricsSample {
        MetricsSample {
            turn: self.turns,
            total_moves: self.total_moves,
            clean_percentage: self.clean_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeper_core::{DirtSpec, EntityId};

    #[test]
    fn agents_are_placed_before_markers() {
        let config = SimulationConfig {
            agent_count: 3,
            grid_width: 4,
            grid_height: 4,
            dirt: DirtSpec::Count(5),
            ..SimulationConfig::default()
        };
        let simulation = Simulation::new(config).expect("valid");
        let ids: Vec<u32> = simulation.agents().iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(simulation.dirty_count(), 5);
        assert_eq!(simulation.entity_view().len(), 8);
        assert!(simulation
            .agents()
            .iter()
            .all(|agent| agent.cell == CellCoord::new(1, 1)));
    }

    #[test]
    fn step_after_finish_is_a_no_op() {
        let config = SimulationConfig {
            dirt: DirtSpec::Percentage(0.0),
            ..SimulationConfig::default()
        };
        let mut simulation = Simulation::new(config).expect("valid");
        assert_eq!(simulation.step().expect("step"), Some(Outcome::Cleared));
        assert_eq!(simulation.step().expect("step"), Some(Outcome::Cleared));
        assert_eq!(simulation.turn(), 1);
        assert_eq!(simulation.metrics().len(), 1);
    }

    #[test]
    fn grid_error_halts_the_run_without_counting_the_turn() {
        let mut simulation = Simulation::new(SimulationConfig::default()).expect("valid");
        let _ = simulation.step().expect("first turn");
        let ghost = EntityId::new(9_999);
        simulation.scheduler = Scheduler::new(vec![ghost]);

        assert_eq!(simulation.step(), Err(GridError::NotFound(ghost)));
        assert_eq!(simulation.turn(), 1);
        assert_eq!(simulation.metrics().len(), 1);
        assert!(!simulation.is_running());

        simulation.scheduler = Scheduler::new(query::agent_ids(&simulation.world));
        assert_eq!(simulation.step(), Err(GridError::NotFound(ghost)));
        assert_eq!(simulation.turn(), 1);
        assert_eq!(simulation.run(), Err(GridError::NotFound(ghost)));
    }

    #[test]
    fn summary_matches_last_sample() {
        let config = SimulationConfig {
            max_turns: 3,
            ..SimulationConfig::default()
        };
        let mut simulation = Simulation::new(config).expect("valid");
        let _ = simulation.run().expect("run");
        let summary = simulation.summary();
        assert_eq!(Some(&summary.as_sample()), simulation.metrics().last());
    }
}
