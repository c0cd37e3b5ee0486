//! Bounded multi-occupancy grid.

use std::collections::HashMap;

use sweeper_core::{CellCoord, EntityId, GridError, GridSize, Occupant};

/// Fixed-size grid where every cell holds an ordered list of occupants.
///
/// Each entity is tracked in at most one cell. Occupants keep their insertion
/// order within a cell; removal preserves the order of the remaining entries.
#[derive(Clone, Debug)]
pub struct Grid {
    size: GridSize,
    cells: Vec<Vec<Occupant>>,
    locations: HashMap<EntityId, CellCoord>,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        let capacity = usize::try_from(size.cell_count()).unwrap_or(0);
        Self {
            size,
            cells: vec![Vec::new(); capacity],
            locations: HashMap::new(),
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Inserts the occupant at the provided cell.
    ///
    /// An occupant that is already tracked is relocated so that it never
    /// appears in two cells.
    pub fn place(&mut self, occupant: Occupant, cell: CellCoord) -> Result<(), GridError> {
        let index = self.checked_index(cell)?;
        if self.locations.contains_key(&occupant.id) {
            let _ = self.remove(occupant.id)?;
        }
        self.cells[index].push(occupant);
        let _ = self.locations.insert(occupant.id, cell);
        Ok(())
    }

    /// Removes the entity from its current cell, returning its occupant entry.
    pub fn remove(&mut self, id: EntityId) -> Result<Occupant, GridError> {
        let cell = self.location_of(id).ok_or(GridError::NotFound(id))?;
        let index = self.checked_index(cell)?;
        let slot = &mut self.cells[index];
        let position = slot
            .iter()
            .position(|occupant| occupant.id == id)
            .ok_or(GridError::NotFound(id))?;
        let occupant = slot.remove(position);
        let _ = self.locations.remove(&id);
        Ok(occupant)
    }

    /// Moves the entity into the destination cell, returning the cell it left.
    ///
    /// Bounds and presence are both checked before anything is mutated, so a
    /// failed move leaves the grid untouched.
    pub fn move_to(
        &mut self,
        id: EntityId,
        destination: CellCoord,
    ) -> Result<CellCoord, GridError> {
        let target = self.checked_index(destination)?;
        let from = self.location_of(id).ok_or(GridError::NotFound(id))?;
        let occupant = self.remove(id)?;
        self.cells[target].push(occupant);
        let _ = self.locations.insert(id, destination);
        Ok(from)
    }

    /// Moore neighbourhood of `cell`, clipped at the grid edges.
    ///
    /// Coordinates are listed row by row, top-left first. The centre is only
    /// included when requested.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord, include_center: bool) -> Vec<CellCoord> {
        let mut neighbors = Vec::with_capacity(9);
        for row_offset in -1_i64..=1 {
            for column_offset in -1_i64..=1 {
                if row_offset == 0 && column_offset == 0 && !include_center {
                    continue;
                }

                let column = i64::from(cell.column()) + column_offset;
                let row = i64::from(cell.row()) + row_offset;
                let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
                    continue;
                };

                let candidate = CellCoord::new(column, row);
                if self.size.contains(candidate) {
                    neighbors.push(candidate);
                }
            }
        }
        neighbors
    }

    /// Entities currently at the cell in insertion order. Empty for invalid cells.
    #[must_use]
    pub fn contents_at(&self, cell: CellCoord) -> &[Occupant] {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Cell currently holding the entity, if tracked.
    #[must_use]
    pub fn location_of(&self, id: EntityId) -> Option<CellCoord> {
        self.locations.get(&id).copied()
    }

    /// Reports whether any cleaning agent occupies the cell.
    #[must_use]
    pub fn has_agent_at(&self, cell: CellCoord) -> bool {
        self.contents_at(cell).iter().any(Occupant::is_agent)
    }

    /// Iterator over every cell and its occupants in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &[Occupant])> + '_ {
        let columns = self.size.columns().max(1);
        self.cells.iter().enumerate().map(move |(index, slot)| {
            let index = index as u64;
            let column = (index % u64::from(columns)) as u32;
            let row = (index / u64::from(columns)) as u32;
            (CellCoord::new(column, row), slot.as_slice())
        })
    }

    /// Number of entities tracked by the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Reports whether the grid tracks no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn checked_index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.index(cell).ok_or(GridError::OutOfBounds {
            cell,
            columns: self.size.columns(),
            rows: self.size.rows(),
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.size.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.size.columns()).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
