//! Discrete world model.
//!
//! A [`Grid`] is a fixed-size, row-major array of [`Tile`]s.  The true world
//! is one `Grid`; every agent additionally owns a private `Grid` created with
//! [`Grid::unknown`] that it fills in as it looks around.  The two are the
//! same shape and the same type, just independently owned.
//!
//! # Example
//!
//! ```rust
//! use prowl_perception::grid::Grid;
//! use prowl_types::{EntityId, EntityKind, Occupant, Position, Step};
//!
//! let mut grid = Grid::parse(
//!     "...
//!      .#.
//!      ...",
//! )
//! .unwrap();
//!
//! let mouse = Occupant::new(EntityId(1), EntityKind::Mouse);
//! grid.place_occupant(Position::new(1, 0), mouse).unwrap();
//!
//! // The wall below blocks the south move; the grid edge blocks north.
//! let moves = grid.valid_moves(Position::new(1, 0), EntityKind::Mouse);
//! assert_eq!(moves, vec![Step::EAST, Step::WEST]);
//! ```

use prowl_types::{EntityId, EntityKind, Occupant, Position, ProwlError, Step};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Tile
// ────────────────────────────────────────────────────────────────────────────

/// One cell of a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub is_wall: bool,
    /// Entities on this tile in arrival order.
    pub occupants: Vec<Occupant>,
    /// Never observed.  Only ever `true` inside an agent's memory grid.
    pub unknown: bool,
}

impl Tile {
    fn new(position: Position, is_wall: bool) -> Self {
        Self {
            position,
            is_wall,
            occupants: Vec::new(),
            unknown: false,
        }
    }

    /// True when at least one occupant has the given kind.
    pub fn holds_kind(&self, kind: EntityKind) -> bool {
        self.occupants.iter().any(|o| o.kind == kind)
    }

    /// True when the tile is neither a wall nor occupied.
    pub fn is_free(&self) -> bool {
        !self.is_wall && self.occupants.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grid
// ────────────────────────────────────────────────────────────────────────────

/// A rectangular tile map.
///
/// Dimensions are fixed at creation and every in-range coordinate maps to
/// exactly one tile.  The wall layout of the true grid never changes after
/// generation; only occupancy is mutated, through
/// [`place_occupant`][Grid::place_occupant] and
/// [`remove_occupant`][Grid::remove_occupant].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Generate a random world where each tile independently becomes a wall
    /// with probability `wall_density / 100`.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        wall_density: u8,
        rng: &mut R,
    ) -> Result<Self, ProwlError> {
        if wall_density > 100 {
            return Err(ProwlError::InvalidConfig(format!(
                "wall density must be within 0..=100, got {wall_density}"
            )));
        }
        let grid = Self::build(width, height, |_| rng.random_range(1..=100u8) <= wall_density)?;
        debug!(
            width,
            height,
            walls = grid.tiles.iter().filter(|t| t.is_wall).count(),
            "generated grid"
        );
        Ok(grid)
    }

    /// A world without any walls.
    pub fn open(width: usize, height: usize) -> Result<Self, ProwlError> {
        Self::build(width, height, |_| false)
    }

    /// A blank memory grid: every tile is unknown and optimistically assumed
    /// to be open until observed otherwise.
    pub fn unknown(width: usize, height: usize) -> Result<Self, ProwlError> {
        let mut grid = Self::open(width, height)?;
        for tile in &mut grid.tiles {
            tile.unknown = true;
        }
        Ok(grid)
    }

    /// Build a grid from an ASCII layout: `#` is a wall, anything else is
    /// open floor.  Leading and trailing whitespace on each line is ignored
    /// and blank lines are skipped.
    pub fn parse(layout: &str) -> Result<Self, ProwlError> {
        let rows: Vec<Vec<bool>> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|c| c == '#').collect())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ProwlError::InvalidDimensions { width, height });
        }
        Self::build(width, height, |p| rows[p.y as usize][p.x as usize])
    }

    fn build(
        width: usize,
        height: usize,
        mut is_wall: impl FnMut(Position) -> bool,
    ) -> Result<Self, ProwlError> {
        if width == 0 || height == 0 || i32::try_from(width.max(height)).is_err() {
            return Err(ProwlError::InvalidDimensions { width, height });
        }
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let p = Position::new(x, y);
                tiles.push(Tile::new(p, is_wall(p)));
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Geometric centre tile (rounded down).
    pub fn center(&self) -> Position {
        Position::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn in_bounds(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    /// Clamp a coordinate onto the nearest in-range tile.
    pub fn clamp(&self, p: Position) -> Position {
        Position::new(
            p.x.clamp(0, self.width as i32 - 1),
            p.y.clamp(0, self.height as i32 - 1),
        )
    }

    fn index(&self, p: Position) -> Option<usize> {
        self.in_bounds(p)
            .then(|| p.y as usize * self.width + p.x as usize)
    }

    /// Borrow the tile at `p`, or `None` when out of range.
    pub fn get(&self, p: Position) -> Option<&Tile> {
        self.index(p).map(|i| &self.tiles[i])
    }

    /// Borrow the tile at `p`.
    pub fn tile(&self, p: Position) -> Result<&Tile, ProwlError> {
        self.get(p).ok_or(ProwlError::OutOfBounds { x: p.x, y: p.y })
    }

    fn tile_mut(&mut self, p: Position) -> Result<&mut Tile, ProwlError> {
        let i = self
            .index(p)
            .ok_or(ProwlError::OutOfBounds { x: p.x, y: p.y })?;
        Ok(&mut self.tiles[i])
    }

    /// A copy of the walls with every tile emptied of occupants.
    pub fn layout(&self) -> Grid {
        let mut copy = self.clone();
        for tile in &mut copy.tiles {
            tile.occupants.clear();
        }
        copy
    }

    /// Iterate over every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// True when `p` is in range and not a wall.
    pub fn is_walkable(&self, p: Position) -> bool {
        self.get(p).is_some_and(|t| !t.is_wall)
    }

    // ── Occupancy ────────────────────────────────────────────────────────────

    /// Append `occupant` to the tile at `p`.
    pub fn place_occupant(&mut self, p: Position, occupant: Occupant) -> Result<(), ProwlError> {
        self.tile_mut(p)?.occupants.push(occupant);
        Ok(())
    }

    /// Remove the occupant with `id` from the tile at `p`.
    ///
    /// Returns `Ok(false)` when the tile does not hold that entity.
    pub fn remove_occupant(&mut self, p: Position, id: EntityId) -> Result<bool, ProwlError> {
        let tile = self.tile_mut(p)?;
        let before = tile.occupants.len();
        tile.occupants.retain(|o| o.id != id);
        Ok(tile.occupants.len() != before)
    }

    /// Overwrite the tile at the snapshot's position with `snapshot`, marking
    /// it as known.
    pub fn adopt_observation(&mut self, snapshot: &Tile) -> Result<(), ProwlError> {
        let tile = self.tile_mut(snapshot.position)?;
        tile.clone_from(snapshot);
        tile.unknown = false;
        Ok(())
    }

    // ── Movement rules ───────────────────────────────────────────────────────

    /// Whether an agent of `kind` may step onto `p`: in range, not a wall,
    /// and not already holding another agent of the same kind.
    pub fn can_enter(&self, p: Position, kind: EntityKind) -> bool {
        self.get(p)
            .is_some_and(|t| !t.is_wall && !t.holds_kind(kind))
    }

    /// All cardinal steps from `from` that an agent of `kind` may take.
    pub fn valid_moves(&self, from: Position, kind: EntityKind) -> Vec<Step> {
        Step::CARDINALS
            .into_iter()
            .filter(|&step| self.can_enter(from.offset(step), kind))
            .collect()
    }

    // ── Placement ────────────────────────────────────────────────────────────

    /// Positions of every tile that is neither a wall nor occupied.
    pub fn free_positions(&self) -> Vec<Position> {
        self.tiles
            .iter()
            .filter(|t| t.is_free())
            .map(|t| t.position)
            .collect()
    }

    /// A uniformly random free tile, or `None` when the grid is full.
    pub fn random_free_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.free_positions().choose(rng).copied()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
