#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sweeper cleaning simulation.
//!
//! This crate defines the message surface that connects the controller, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! actually happened. Read-only projections such as [`EntityView`] are handed
//! to external collaborators that render or chart a run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Seed used when a configuration does not provide one explicitly.
pub const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Starting cell shared by every cleaning agent unless configured otherwise.
pub const DEFAULT_START: CellCoord = CellCoord::new(1, 1);

/// Largest grid, in cells, a configuration may request.
///
/// Cells are stored densely, so the cap bounds the grid's allocation.
pub const MAX_CELLS: u64 = 1 << 22;

/// Largest number of entities (agents plus markers) a run may place.
///
/// Identifiers are `u32` values allocated in placement order.
pub const MAX_ENTITIES: u64 = u32::MAX as u64;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Chebyshev distance between two cells; Moore neighbours are at distance one.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Dimensions of the bounded, non-toroidal cleaning grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new size descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Reports whether the cell lies within `[0, columns) x [0, rows)`.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Pulls a cell into the grid by clamping each axis to the last valid index.
    ///
    /// A zero-sized axis clamps to zero; callers validate dimensions first.
    #[must_use]
    pub fn clamp(&self, cell: CellCoord) -> CellCoord {
        CellCoord::new(
            cell.column().min(self.columns.saturating_sub(1)),
            cell.row().min(self.rows.saturating_sub(1)),
        )
    }
}

/// Unique identifier assigned to every entity placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Variants of entity that can occupy a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Active entity that moves and cleans every turn.
    CleaningAgent,
    /// Passive entity marking uncleaned content until an agent removes it.
    DirtyMarker,
}

/// Entry stored in a grid cell's occupant list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
}

impl Occupant {
    /// Creates an occupant entry for a cleaning agent.
    #[must_use]
    pub const fn agent(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::CleaningAgent,
        }
    }

    /// Creates an occupant entry for a dirty marker.
    #[must_use]
    pub const fn marker(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::DirtyMarker,
        }
    }

    /// Reports whether the occupant is a cleaning agent.
    #[must_use]
    pub const fn is_agent(&self) -> bool {
        matches!(self.kind, EntityKind::CleaningAgent)
    }

    /// Reports whether the occupant is a dirty marker.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(self.kind, EntityKind::DirtyMarker)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Places a new cleaning agent at the provided cell.
    PlaceAgent {
        /// Cell the agent starts in.
        cell: CellCoord,
    },
    /// Places a new dirty marker at the provided cell.
    PlaceMarker {
        /// Cell the marker is dropped into. Markers may stack.
        cell: CellCoord,
    },
    /// Moves an agent into a neighbouring cell.
    MoveAgent {
        /// Agent performing the move.
        agent: EntityId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Records that an agent found no destination and stays put this turn.
    HoldAgent {
        /// Agent that stays put.
        agent: EntityId,
    },
    /// Removes every dirty marker sharing the agent's current cell.
    Clean {
        /// Agent performing the clean.
        agent: EntityId,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that a cleaning agent was placed.
    AgentPlaced {
        /// Identifier allocated to the agent.
        agent: EntityId,
        /// Cell the agent occupies.
        cell: CellCoord,
    },
    /// Confirms that a dirty marker was placed.
    MarkerPlaced {
        /// Identifier allocated to the marker.
        marker: EntityId,
        /// Cell the marker occupies.
        cell: CellCoord,
    },
    /// Confirms that an agent moved between two cells.
    AgentMoved {
        /// Agent that moved.
        agent: EntityId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that an agent had no valid destination and stayed put.
    AgentHeld {
        /// Agent that stayed put.
        agent: EntityId,
        /// Cell the agent remains in.
        cell: CellCoord,
    },
    /// Confirms that an agent removed a dirty marker.
    MarkerCleaned {
        /// Agent that performed the clean.
        agent: EntityId,
        /// Marker that was destroyed.
        marker: EntityId,
        /// Cell the marker was removed from.
        cell: CellCoord,
    },
}

/// Immutable representation of a single cleaning agent's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Identifier of the agent.
    pub id: EntityId,
    /// Cell currently occupied by the agent.
    pub cell: CellCoord,
    /// Cumulative number of moves the agent has made.
    pub moves_made: u64,
    /// Cumulative number of dirty markers the agent has removed.
    pub cells_cleaned: u64,
}

/// Kind-specific state carried by an [`EntitySnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// A cleaning agent together with its cumulative counters.
    CleaningAgent {
        /// Cumulative number of moves.
        moves_made: u64,
        /// Cumulative number of markers removed.
        cells_cleaned: u64,
    },
    /// A dirty marker still awaiting removal.
    DirtyMarker,
}

impl EntityState {
    /// Kind tag of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::CleaningAgent { .. } => EntityKind::CleaningAgent,
            Self::DirtyMarker => EntityKind::DirtyMarker,
        }
    }
}

/// Read-only projection of an entity sufficient to pick a visual style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Cell occupied by the entity.
    pub cell: CellCoord,
    /// Kind-specific state.
    pub state: EntityState,
}

/// Read-only snapshot describing every entity on the grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the snapshots of the given kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.state.kind() == kind)
    }

    /// Number of entities captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Failures raised at the grid boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The coordinate lies outside the grid.
    #[error("cell {cell} lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Offending coordinate.
        cell: CellCoord,
        /// Number of grid columns.
        columns: u32,
        /// Number of grid rows.
        rows: u32,
    },
    /// The entity is not currently tracked by the grid.
    #[error("entity {0} is not on the grid")]
    NotFound(EntityId),
    /// Every entity identifier has already been allocated.
    #[error("entity identifiers are exhausted")]
    IdsExhausted,
}

/// Failures raised while validating a [`SimulationConfig`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// The grid width must be positive.
    #[error("grid width must be positive")]
    ZeroWidth,
    /// The grid height must be positive.
    #[error("grid height must be positive")]
    ZeroHeight,
    /// At least one cleaning agent is required.
    #[error("agent count must be positive")]
    ZeroAgents,
    /// The turn limit must be positive.
    #[error("max turns must be positive")]
    ZeroMaxTurns,
    /// The dirty percentage must lie within `[0, 100]`.
    #[error("dirty percentage {0} must lie within [0, 100]")]
    DirtyPercentageOutOfRange(f64),
    /// The explicit start cell lies outside the grid.
    #[error("start cell {cell} lies outside the {columns}x{rows} grid")]
    StartOutOfBounds {
        /// Configured start cell.
        cell: CellCoord,
        /// Configured grid width.
        columns: u32,
        /// Configured grid height.
        rows: u32,
    },
    /// The wall-clock limit must be a positive, finite number of seconds.
    #[error("time limit {0}s must be positive and finite")]
    InvalidTimeLimit(f64),
    /// The victory percentage must lie within `(0, 100]`.
    #[error("victory percentage {0} must lie within (0, 100]")]
    VictoryPercentageOutOfRange(f64),
    /// The grid holds more cells than [`MAX_CELLS`].
    #[error("grid of {cells} cells exceeds the limit of {max}")]
    GridTooLarge {
        /// Requested number of cells.
        cells: u64,
        /// Largest accepted number of cells.
        max: u64,
    },
    /// Agents plus markers exceed the identifier range.
    #[error("{entities} agents and markers exceed the limit of {max}")]
    TooManyEntities {
        /// Requested number of agents plus markers.
        entities: u64,
        /// Largest accepted number of entities.
        max: u64,
    },
    /// Initial placement was rejected by the grid.
    #[error("initial placement failed: {0}")]
    Placement(#[from] GridError),
}

/// How many dirty markers a run starts with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtSpec {
    /// `floor(width * height * percentage / 100)` markers.
    Percentage(f64),
    /// An explicit number of markers.
    Count(u64),
}

/// Rule applied when an agent picks its next cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementRule {
    /// Eight Moore neighbours, skipping any cell that already holds an agent.
    #[default]
    AvoidAgents,
    /// Nine cells including the current one, with no collision filtering.
    Unrestricted,
}

/// Parameters required to construct a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of cleaning agents.
    pub agent_count: u32,
    /// Number of grid columns.
    pub grid_width: u32,
    /// Number of grid rows.
    pub grid_height: u32,
    /// Turn limit after which the run times out.
    pub max_turns: u64,
    /// Initial dirt density or count.
    pub dirt: DirtSpec,
    /// Shared starting cell for every agent.
    pub start: Option<CellCoord>,
    /// Movement rule applied by every agent.
    pub movement: MovementRule,
    /// Optional wall-clock limit in seconds.
    pub time_limit_secs: Option<f64>,
    /// Optional clean percentage at which the run declares victory.
    pub victory_percentage: Option<f64>,
    /// Seed for the run's single random generator.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: 12,
            grid_width: 7,
            grid_height: 20,
            max_turns: 120,
            dirt: DirtSpec::Percentage(30.0),
            start: None,
            movement: MovementRule::AvoidAgents,
            time_limit_secs: None,
            victory_percentage: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationConfig {
    /// Checks dimensions, counts and optional limits before any grid is built.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.grid_width == 0 {
            return Err(ConfigurationError::ZeroWidth);
        }
        if self.grid_height == 0 {
            return Err(ConfigurationError::ZeroHeight);
        }
        let cells = self.grid_size().cell_count();
        if cells > MAX_CELLS {
            return Err(ConfigurationError::GridTooLarge {
                cells,
                max: MAX_CELLS,
            });
        }
        if self.agent_count == 0 {
            return Err(ConfigurationError::ZeroAgents);
        }
        if self.max_turns == 0 {
            return Err(ConfigurationError::ZeroMaxTurns);
        }
        if let DirtSpec::Percentage(percentage) = self.dirt {
            if !(0.0..=100.0).contains(&percentage) {
                return Err(ConfigurationError::DirtyPercentageOutOfRange(percentage));
            }
        }
        let entities = u64::from(self.agent_count).saturating_add(self.marker_count());
        if entities > MAX_ENTITIES {
            return Err(ConfigurationError::TooManyEntities {
                entities,
                max: MAX_ENTITIES,
            });
        }
        if let Some(cell) = self.start {
            if !self.grid_size().contains(cell) {
                return Err(ConfigurationError::StartOutOfBounds {
                    cell,
                    columns: self.grid_width,
                    rows: self.grid_height,
                });
            }
        }
        if let Some(seconds) = self.time_limit_secs {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfigurationError::InvalidTimeLimit(seconds));
            }
        }
        if let Some(percentage) = self.victory_percentage {
            if !(percentage > 0.0 && percentage <= 100.0) {
                return Err(ConfigurationError::VictoryPercentageOutOfRange(percentage));
            }
        }
        Ok(())
    }

    /// Grid dimensions described by the configuration.
    #[must_use]
    pub const fn grid_size(&self) -> GridSize {
        GridSize::new(self.grid_width, self.grid_height)
    }

    /// Number of dirty markers to scatter at start-up.
    #[must_use]
    pub fn marker_count(&self) -> u64 {
        match self.dirt {
            DirtSpec::Percentage(percentage) => {
                let cells = self.grid_size().cell_count() as f64;
                (cells * percentage / 100.0).floor() as u64
            }
            DirtSpec::Count(count) => count,
        }
    }

    /// Cell every agent starts in.
    #[must_use]
    pub fn start_cell(&self) -> CellCoord {
        self.start
            .unwrap_or_else(|| self.grid_size().clamp(DEFAULT_START))
    }

    /// Optional wall-clock limit.
    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }
}

/// Reason a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every dirty marker was removed.
    Cleared,
    /// The configured turn limit was reached first.
    TimedOut,
    /// The wall-clock limit elapsed first.
    DeadlineElapsed,
    /// The configured clean percentage was reached first.
    VictoryDeclared,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Cleared => write!(f, "cleared"),
            Outcome::TimedOut => write!(f, "timed out"),
            Outcome::DeadlineElapsed => write!(f, "deadline elapsed"),
            Outcome::VictoryDeclared => write!(f, "victory declared"),
        }
    }
}

/// State handed to termination predicates at a turn boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnStatus {
    /// Number of completed turns.
    pub turn: u64,
    /// Dirty markers still on the grid.
    pub dirty_count: u64,
    /// Total number of grid cells.
    pub total_cells: u64,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

impl TurnStatus {
    /// Percentage of grid cells considered clean.
    #[must_use]
    pub fn clean_percentage(&self) -> f64 {
        clean_percentage(self.total_cells, self.dirty_count)
    }
}

/// `(total_cells - dirty_count) * 100 / total_cells`, saturating at zero.
///
/// An empty grid counts as fully clean.
#[must_use]
pub fn clean_percentage(total_cells: u64, dirty_count: u64) -> f64 {
    if total_cells == 0 {
        return 100.0;
    }
    total_cells.saturating_sub(dirty_count) as f64 * 100.0 / total_cells as f64
}

/// Aggregate state sampled once per turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Number of completed turns.
    pub turn: u64,
    /// Sum of moves made across every agent.
    pub total_moves: u64,
    /// Percentage of grid cells that are clean.
    pub clean_percentage: f64,
}

/// Per-agent cumulative counters sampled once per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSample {
    /// Number of completed turns.
    pub turn: u64,
    /// Agent the sample describes.
    pub agent: EntityId,
    /// Cumulative number of moves.
    pub moves_made: u64,
    /// Cumulative number of markers removed.
    pub cells_cleaned: u64,
}
