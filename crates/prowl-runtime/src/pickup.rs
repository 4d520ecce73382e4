//! Passive food items.
//!
//! A pickup never acts.  When an agent steps onto it, it is lifted off the
//! grid and respawns on a uniformly random free tile.  The world decides who
//! gets the reward.

use prowl_perception::grid::Grid;
use prowl_types::{EntityId, EntityKind, Occupant, Position, ProwlError};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: EntityId,
    pub position: Position,
    /// Energy granted to a mouse that consumes it.
    pub reward: u32,
}

impl Pickup {
    pub fn new(id: EntityId, position: Position, reward: u32) -> Self {
        Self {
            id,
            position,
            reward,
        }
    }

    pub fn occupant(&self) -> Occupant {
        Occupant::new(self.id, EntityKind::Pickup)
    }

    /// Move to a random free tile of `grid`.
    ///
    /// Returns the new position, or `None` when no tile is free, in which
    /// case the pickup has been taken off the grid and should be retired.
    pub fn respawn<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<Option<Position>, ProwlError> {
        grid.remove_occupant(self.position, self.id)?;
        let Some(next) = grid.random_free_position(rng) else {
            return Ok(None);
        };
        grid.place_occupant(next, self.occupant())?;
        self.position = next;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn respawn_lands_on_a_free_tile() {
        let mut grid = Grid::parse(
            "..#
             #..",
        )
        .unwrap();
        let mouse = Occupant::new(EntityId(1), EntityKind::Mouse);
        grid.place_occupant(Position::new(0, 0), mouse).unwrap();
        let mut pickup = Pickup::new(EntityId(2), Position::new(0, 0), 20);
        grid.place_occupant(pickup.position, pickup.occupant()).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let next = pickup.respawn(&mut grid, &mut rng).unwrap().unwrap();
        assert_ne!(next, Position::new(0, 0));
        let tile = grid.tile(next).unwrap();
        assert!(!tile.is_wall);
        assert_eq!(tile.occupants, vec![pickup.occupant()]);
        assert_eq!(grid.tile(Position::new(0, 0)).unwrap().occupants, vec![mouse]);
    }

    #[test]
    fn respawn_on_full_grid_retires_the_pickup() {
        let mut grid = Grid::open(1, 1).unwrap();
        let mouse = Occupant::new(EntityId(1), EntityKind::Mouse);
        let mut pickup = Pickup::new(EntityId(2), Position::new(0, 0), 20);
        grid.place_occupant(pickup.position, pickup.occupant()).unwrap();
        grid.place_occupant(pickup.position, mouse).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(pickup.respawn(&mut grid, &mut rng).unwrap(), None);
        assert_eq!(grid.tile(Position::new(0, 0)).unwrap().occupants, vec![mouse]);
    }
}
