//! Per-agent fog-of-war map.
//!
//! A [`MemoryGrid`] has the same shape as the world [`Grid`] but is owned by
//! a single agent and only changes when that agent looks at something.  Each
//! cell is either *unknown* (never observed, assumed open) or a snapshot of
//! the true tile taken the last time it was in view.
//!
//! # Example
//!
//! ```rust
//! use prowl_memory::fog::MemoryGrid;
//! use prowl_perception::grid::Grid;
//! use prowl_types::Position;
//!
//! let truth = Grid::parse(".#.").unwrap();
//! let mut memory = MemoryGrid::new(3, 1).unwrap();
//!
//! let update = memory
//!     .absorb(&truth, &[Position::new(0, 0), Position::new(1, 0)])
//!     .unwrap();
//! assert_eq!(update.new_walls, 1);
//! assert_eq!(memory.unknown_positions(), vec![Position::new(2, 0)]);
//! ```

use prowl_perception::grid::Grid;
use prowl_types::{EntityId, Position, ProwlError};

/// Summary of what a single [`MemoryGrid::absorb`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FogUpdate {
    /// Tiles that were unknown before this observation.
    pub revealed: usize,
    /// Walls the agent did not previously know about.
    pub new_walls: usize,
}

impl FogUpdate {
    /// True when the observation uncovered at least one wall, which may
    /// invalidate a path planned through previously assumed-open tiles.
    pub fn discovered_walls(&self) -> bool {
        self.new_walls > 0
    }
}

/// An agent's private, partially observed copy of the world.
#[derive(Debug, Clone)]
pub struct MemoryGrid {
    grid: Grid,
}

impl MemoryGrid {
    /// A memory with every tile unknown.
    pub fn new(width: usize, height: usize) -> Result<Self, ProwlError> {
        Ok(Self {
            grid: Grid::unknown(width, height)?,
        })
    }

    /// A memory that already knows where every wall of `truth` is.
    ///
    /// Entities are not copied: who stands where is still learned by sight.
    pub fn omniscient(truth: &Grid) -> Self {
        Self {
            grid: truth.layout(),
        }
    }

    /// Read-only view of the remembered tiles, e.g. for planning or display.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Overwrite every tile in `visible` with a fresh snapshot from `truth`.
    pub fn absorb(&mut self, truth: &Grid, visible: &[Position]) -> Result<FogUpdate, ProwlError> {
        let mut update = FogUpdate::default();
        for &p in visible {
            let observed = truth.tile(p)?;
            let remembered = self.grid.tile(p)?;
            if remembered.unknown {
                update.revealed += 1;
            }
            if observed.is_wall && (remembered.unknown || !remembered.is_wall) {
                update.new_walls += 1;
            }
            self.grid.adopt_observation(observed)?;
        }
        Ok(update)
    }

    /// Drop a stale occupant from the remembered tile at `p`.
    pub fn forget_occupant(&mut self, p: Position, id: EntityId) -> Result<bool, ProwlError> {
        self.grid.remove_occupant(p, id)
    }

    /// Every tile never observed, in row-major order.
    pub fn unknown_positions(&self) -> Vec<Position> {
        self.grid
            .tiles()
            .filter(|t| t.unknown)
            .map(|t| t.position)
            .collect()
    }

    /// Every tile observed and known not to be a wall.
    pub fn known_open_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.grid
            .tiles()
            .filter(|t| !t.unknown && !t.is_wall)
            .map(|t| t.position)
    }

    /// True when `p` has been observed and is a wall.
    pub fn is_known_wall(&self, p: Position) -> bool {
        self.grid.get(p).is_some_and(|t| !t.unknown && t.is_wall)
    }

    /// Share of tiles observed at least once, in `[0.0, 1.0]`.
    pub fn explored_fraction(&self) -> f64 {
        let total = self.grid.width() * self.grid.height();
        let known = self.grid.tiles().filter(|t| !t.unknown).count();
        known as f64 / total as f64
    }
}
