#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Sweeper cleaning simulation.
//!
//! The world owns the grid, every cleaning agent's cumulative counters and the
//! live dirty-marker count. It is mutated exclusively through [`apply`], which
//! reports what happened as [`Event`] values, and observed through the
//! read-only [`query`] module.

mod grid;

pub use grid::Grid;

use sweeper_core::{CellCoord, Command, EntityId, Event, GridError, GridSize, Occupant};
use tracing::{debug, trace};

/// Represents the authoritative cleaning world.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    agents: Vec<CleaningAgent>,
    dirty_count: u64,
    next_entity: u32,
}

impl World {
    /// Creates an empty world with the provided grid dimensions.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            grid: Grid::new(size),
            agents: Vec::new(),
            dirty_count: 0,
            next_entity: 0,
        }
    }

    fn allocate_id(&mut self) -> Result<EntityId, GridError> {
        let id = self.next_entity;
        self.next_entity = id.checked_add(1).ok_or(GridError::IdsExhausted)?;
        Ok(EntityId::new(id))
    }

    fn agent_mut(&mut self, agent: EntityId) -> Result<&mut CleaningAgent, GridError> {
        self.agents
            .iter_mut()
            .find(|candidate| candidate.id == agent)
            .ok_or(GridError::NotFound(agent))
    }

    fn require_in_bounds(&self, cell: CellCoord) -> Result<(), GridError> {
        let size = self.grid.size();
        if size.contains(cell) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                cell,
                columns: size.columns(),
                rows: size.rows(),
            })
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CleaningAgent {
    id: EntityId,
    moves_made: u64,
    cells_cleaned: u64,
}

impl CleaningAgent {
    const fn new(id: EntityId) -> Self {
        Self {
            id,
            moves_made: 0,
            cells_cleaned: 0,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Failed commands leave the world untouched and emit no events.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError> {
    match command {
        Command::PlaceAgent { cell } => {
            world.require_in_bounds(cell)?;
            let agent = world.allocate_id()?;
            world.grid.place(Occupant::agent(agent), cell)?;
            world.agents.push(CleaningAgent::new(agent));
            trace!(agent = agent.get(), %cell, "agent placed");
            out_events.push(Event::AgentPlaced { agent, cell });
        }
        Command::PlaceMarker { cell } => {
            world.require_in_bounds(cell)?;
            let marker = world.allocate_id()?;
            world.grid.place(Occupant::marker(marker), cell)?;
            world.dirty_count = world.dirty_count.saturating_add(1);
            trace!(marker = marker.get(), %cell, "marker placed");
            out_events.push(Event::MarkerPlaced { marker, cell });
        }
        Command::MoveAgent { agent, to } => {
            let _ = world.agent_mut(agent)?;
            let from = world.grid.move_to(agent, to)?;
            if from != to {
                let state = world.agent_mut(agent)?;
                state.moves_made = state.moves_made.saturating_add(1);
            }
            debug!(agent = agent.get(), %from, %to, "agent moved");
            out_events.push(Event::AgentMoved { agent, from, to });
        }
        Command::HoldAgent { agent } => {
            let _ = world.agent_mut(agent)?;
            let cell = world
                .grid
                .location_of(agent)
                .ok_or(GridError::NotFound(agent))?;
            debug!(agent = agent.get(), %cell, "agent held in place");
            out_events.push(Event::AgentHeld { agent, cell });
        }
        Command::Clean { agent } => {
            let _ = world.agent_mut(agent)?;
            let cell = world
                .grid
                .location_of(agent)
                .ok_or(GridError::NotFound(agent))?;
            let markers: Vec<EntityId> = world
                .grid
                .contents_at(cell)
                .iter()
                .filter(|occupant| occupant.is_marker())
                .map(|occupant| occupant.id)
                .collect();

            for marker in markers {
                let _ = world.grid.remove(marker)?;
                world.dirty_count = world.dirty_count.saturating_sub(1);
                let state = world.agent_mut(agent)?;
                state.cells_cleaned = state.cells_cleaned.saturating_add(1);
                debug!(agent = agent.get(), marker = marker.get(), %cell, "marker cleaned");
                out_events.push(Event::MarkerCleaned {
                    agent,
                    marker,
                    cell,
                });
            }
        }
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sweeper_core::{
        AgentSnapshot, EntityId, EntitySnapshot, EntityState, EntityView, GridSize,
    };

    use super::{Grid, World};

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Dimensions of the world's grid.
    #[must_use]
    pub fn grid_size(world: &World) -> GridSize {
        world.grid.size()
    }

    /// Live count of dirty markers still awaiting removal.
    #[must_use]
    pub fn dirty_count(world: &World) -> u64 {
        world.dirty_count
    }

    /// Counts the dirty markers physically present on the grid.
    #[must_use]
    pub fn markers_on_grid(world: &World) -> u64 {
        world
            .grid
            .iter()
            .map(|(_, occupants)| occupants.iter().filter(|o| o.is_marker()).count() as u64)
            .sum()
    }

    /// Identifiers of every cleaning agent in placement order.
    #[must_use]
    pub fn agent_ids(world: &World) -> Vec<EntityId> {
        world.agents.iter().map(|agent| agent.id).collect()
    }

    /// Snapshot of a single cleaning agent.
    #[must_use]
    pub fn agent(world: &World, id: EntityId) -> Option<AgentSnapshot> {
        let agent = world.agents.iter().find(|agent| agent.id == id)?;
        let cell = world.grid.location_of(id)?;
        Some(AgentSnapshot {
            id,
            cell,
            moves_made: agent.moves_made,
            cells_cleaned: agent.cells_cleaned,
        })
    }

    /// Snapshots of every cleaning agent in identifier order.
    #[must_use]
    pub fn agents(world: &World) -> Vec<AgentSnapshot> {
        world
            .agents
            .iter()
            .filter_map(|agent| self::agent(world, agent.id))
            .collect()
    }

    /// Sum of moves made across every agent.
    #[must_use]
    pub fn total_moves(world: &World) -> u64 {
        world.agents.iter().map(|agent| agent.moves_made).sum()
    }

    /// Captures a read-only projection of every entity on the grid.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let snapshots = world
            .grid
            .iter()
            .flat_map(|(cell, occupants)| {
                occupants.iter().map(move |occupant| (cell, *occupant))
            })
            .filter_map(|(cell, occupant)| {
                let state = if occupant.is_agent() {
                    let agent = world.agents.iter().find(|agent| agent.id == occupant.id)?;
                    EntityState::CleaningAgent {
                        moves_made: agent.moves_made,
                        cells_cleaned: agent.cells_cleaned,
                    }
                } else {
                    EntityState::DirtyMarker
                };
                Some(EntitySnapshot {
                    id: occupant.id,
                    cell,
                    state,
                })
            })
            .collect();
        EntityView::from_snapshots(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeper_core::EntityKind;

    fn world_with_agent(size: GridSize, cell: CellCoord) -> (World, EntityId) {
        let mut world = World::new(size);
        let mut events = Vec::new();
        apply(&mut world, Command::PlaceAgent { cell }, &mut events).expect("place agent");
        let agent = match events.as_slice() {
            [Event::AgentPlaced { agent, .. }] => *agent,
            other => panic!("unexpected events: {other:?}"),
        };
        (world, agent)
    }

    #[test]
    fn ids_follow_placement_order() {
        let mut world = World::new(GridSize::new(3, 3));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceAgent {
                cell: CellCoord::new(1, 1),
            },
            &mut events,
        )
        .expect("place agent");
        apply(
            &mut world,
            Command::PlaceMarker {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        )
        .expect("place marker");

        assert_eq!(
            events,
            vec![
                Event::AgentPlaced {
                    agent: EntityId::new(0),
                    cell: CellCoord::new(1, 1),
                },
                Event::MarkerPlaced {
                    marker: EntityId::new(1),
                    cell: CellCoord::new(0, 0),
                },
            ]
        );
        assert_eq!(query::dirty_count(&world), 1);
    }

    #[test]
    fn out_of_bounds_placement_allocates_nothing() {
        let mut world = World::new(GridSize::new(2, 2));
        let mut events = Vec::new();
        let result = apply(
            &mut world,
            Command::PlaceMarker {
                cell: CellCoord::new(2, 2),
            },
            &mut events,
        );
        assert!(matches!(result, Err(GridError::OutOfBounds { .. })));
        assert!(events.is_empty());
        assert_eq!(query::dirty_count(&world), 0);
        assert!(query::entity_view(&world).is_empty());
    }

    #[test]
    fn move_counts_only_real_relocation() {
        let (mut world, agent) = world_with_agent(GridSize::new(3, 3), CellCoord::new(1, 1));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveAgent {
                agent,
                to: CellCoord::new(1, 1),
            },
            &mut events,
        )
        .expect("stay");
        assert_eq!(query::total_moves(&world), 0);

        apply(
            &mut world,
            Command::MoveAgent {
                agent,
                to: CellCoord::new(2, 2),
            },
            &mut events,
        )
        .expect("move");
        let snapshot = query::agent(&world, agent).expect("agent snapshot");
        assert_eq!(snapshot.moves_made, 1);
        assert_eq!(snapshot.cell, CellCoord::new(2, 2));
    }

    #[test]
    fn clean_removes_every_stacked_marker() {
        let (mut world, agent) = world_with_agent(GridSize::new(3, 3), CellCoord::new(1, 1));
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(
                &mut world,
                Command::PlaceMarker {
                    cell: CellCoord::new(0, 1),
                },
                &mut events,
            )
            .expect("place marker");
        }
        apply(
            &mut world,
            Command::PlaceMarker {
                cell: CellCoord::new(2, 2),
            },
            &mut events,
        )
        .expect("place marker");
        assert_eq!(query::dirty_count(&world), 4);

        events.clear();
        apply(
            &mut world,
            Command::MoveAgent {
                agent,
                to: CellCoord::new(0, 1),
            },
            &mut events,
        )
        .expect("move");
        apply(&mut world, Command::Clean { agent }, &mut events).expect("clean");

        let cleaned = events
            .iter()
            .filter(|event| matches!(event, Event::MarkerCleaned { .. }))
            .count();
        assert_eq!(cleaned, 3);
        assert_eq!(query::dirty_count(&world), 1);
        assert_eq!(query::markers_on_grid(&world), 1);
        let snapshot = query::agent(&world, agent).expect("agent snapshot");
        assert_eq!(snapshot.cells_cleaned, 3);
    }

    #[test]
    fn clean_on_clean_cell_is_silent() {
        let (mut world, agent) = world_with_agent(GridSize::new(2, 2), CellCoord::new(0, 0));
        let mut events = Vec::new();
        apply(&mut world, Command::Clean { agent }, &mut events).expect("clean");
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_agent_is_reported() {
        let (mut world, _) = world_with_agent(GridSize::new(2, 2), CellCoord::new(0, 0));
        let mut events = Vec::new();
        let missing = EntityId::new(42);
        assert_eq!(
            apply(&mut world, Command::Clean { agent: missing }, &mut events),
            Err(GridError::NotFound(missing))
        );
        assert_eq!(
            apply(&mut world, Command::HoldAgent { agent: missing }, &mut events),
            Err(GridError::NotFound(missing))
        );
    }

    #[test]
    fn hold_reports_current_cell() {
        let (mut world, agent) = world_with_agent(GridSize::new(2, 2), CellCoord::new(1, 0));
        let mut events = Vec::new();
        apply(&mut world, Command::HoldAgent { agent }, &mut events).expect("hold");
        assert_eq!(
            events,
            vec![Event::AgentHeld {
                agent,
                cell: CellCoord::new(1, 0)
            }]
        );
    }

    #[test]
    fn markers_are_not_agents() {
        let mut world = World::new(GridSize::new(2, 2));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceMarker {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        )
        .expect("place marker");
        let marker = EntityId::new(0);
        assert_eq!(
            apply(
                &mut world,
                Command::MoveAgent {
                    agent: marker,
                    to: CellCoord::new(1, 1),
                },
                &mut events,
            ),
            Err(GridError::NotFound(marker))
        );
        let view = query::entity_view(&world);
        assert_eq!(view.of_kind(EntityKind::DirtyMarker).count(), 1);
        assert_eq!(view.of_kind(EntityKind::CleaningAgent).count(), 0);
    }

    #[test]
    fn exhausted_ids_are_never_reused() {
        let mut world = World::new(GridSize::new(2, 2));
        world.next_entity = u32::MAX - 1;
        let mut events = Vec::new();
        let cell = CellCoord::new(0, 0);

        apply(&mut world, Command::PlaceMarker { cell }, &mut events).expect("last id");
        assert_eq!(
            apply(&mut world, Command::PlaceMarker { cell }, &mut events),
            Err(GridError::IdsExhausted)
        );
        assert_eq!(
            apply(&mut world, Command::PlaceAgent { cell }, &mut events),
            Err(GridError::IdsExhausted)
        );

        assert_eq!(events.len(), 1);
        assert_eq!(query::dirty_count(&world), 1);
        assert_eq!(query::markers_on_grid(&world), 1);
        assert!(query::agent_ids(&world).is_empty());
    }
}
