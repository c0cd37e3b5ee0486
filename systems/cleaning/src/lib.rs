#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cleaning agent behaviour: a memoryless random walk followed by a clean.
//!
//! The system never mutates the world itself. For every activation it emits a
//! movement command (`MoveAgent` or `HoldAgent`) followed by `Clean`, and the
//! controller applies them in that order so the clean always observes the cell
//! the agent ended up in.

use rand::{seq::SliceRandom, Rng};
use sweeper_core::{CellCoord, Command, EntityId, GridError, MovementRule};
use sweeper_world::Grid;
use tracing::trace;

/// Pure system that decides each agent's move and clean for one activation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cleaning {
    movement: MovementRule,
}

impl Cleaning {
    /// Creates a cleaning system applying the provided movement rule.
    #[must_use]
    pub const fn new(movement: MovementRule) -> Self {
        Self { movement }
    }

    /// Emits the commands for a single agent activation.
    ///
    /// An agent with no candidate cell holds its position; that is a normal
    /// outcome rather than an error.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        agent: EntityId,
        grid: &Grid,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> Result<(), GridError> {
        let cell = grid.location_of(agent).ok_or(GridError::NotFound(agent))?;
        let candidates = self.candidate_cells(grid, cell);

        match candidates.choose(rng).copied() {
            Some(to) => out.push(Command::MoveAgent { agent, to }),
            None => {
                trace!(agent = agent.get(), %cell, "no free neighbour");
                out.push(Command::HoldAgent { agent });
            }
        }
        out.push(Command::Clean { agent });
        Ok(())
    }

    /// Cells an agent standing at `cell` may move into under the active rule.
    #[must_use]
    pub fn candidate_cells(&self, grid: &Grid, cell: CellCoord) -> Vec<CellCoord> {
        match self.movement {
            MovementRule::AvoidAgents => grid
                .neighbors(cell, false)
                .into_iter()
                .filter(|neighbor| !grid.has_agent_at(*neighbor))
                .collect(),
            MovementRule::Unrestricted => grid.neighbors(cell, true),
        }
    }
}
