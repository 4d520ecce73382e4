//! `prowl-types` – shared vocabulary for the predator/prey simulation.
//!
//! Every other crate in the workspace speaks in these types: grid
//! coordinates, unit movement vectors, entity tags, and the events the
//! simulation emits for external reporters.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// A tile coordinate on the grid. `(0, 0)` is the top-left tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile reached by applying `step` to this position.
    pub fn offset(self, step: Step) -> Self {
        Self::new(self.x + step.dx, self.y + step.dy)
    }

    /// Manhattan distance; the true walking distance on an open 4-connected grid.
    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The unit step leading from `self` to an adjacent `next`.
    pub fn step_to(self, next: Position) -> Step {
        Step::new(next.x - self.x, next.y - self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// A movement vector. Agents only ever move by one of [`Step::CARDINALS`]
/// or stand still with [`Step::ZERO`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub dx: i32,
    pub dy: i32,
}

impl Step {
    pub const ZERO: Step = Step::new(0, 0);
    pub const NORTH: Step = Step::new(0, -1);
    pub const EAST: Step = Step::new(1, 0);
    pub const SOUTH: Step = Step::new(0, 1);
    pub const WEST: Step = Step::new(-1, 0);

    /// The four permitted moves. Diagonals are excluded so that agents
    /// cannot slip between two diagonally touching walls.
    pub const CARDINALS: [Step; 4] = [Step::NORTH, Step::EAST, Step::SOUTH, Step::WEST];

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self == Step::ZERO
    }

    /// True for a single orthogonal unit move.
    pub fn is_cardinal(self) -> bool {
        self.dx.abs() + self.dy.abs() == 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// Stable handle for any entity placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag distinguishing the three kinds of entity that can occupy a tile.
///
/// Behaviour that depends on "what is this thing" matches on the tag rather
/// than inspecting concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Cat,
    Mouse,
    Pickup,
}

impl EntityKind {
    /// The kind this entity hunts, if any.
    pub fn target_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::Cat => Some(EntityKind::Mouse),
            EntityKind::Mouse => Some(EntityKind::Pickup),
            EntityKind::Pickup => None,
        }
    }

    /// The kind this entity hides from, if any.
    pub fn flee_from_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::Mouse => Some(EntityKind::Cat),
            EntityKind::Cat | EntityKind::Pickup => None,
        }
    }

    pub fn is_agent(self) -> bool {
        !matches!(self, EntityKind::Pickup)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Cat => "Cat",
            EntityKind::Mouse => "Mouse",
            EntityKind::Pickup => "Pickup",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a tile's occupant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl Occupant {
    pub const fn new(id: EntityId, kind: EntityKind) -> Self {
        Self { id, kind }
    }
}

/// What ended an agent's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Killer {
    /// Energy reached zero.
    Starvation,
    /// Captured by another agent.
    Entity { occupant: Occupant, name: String },
}

impl fmt::Display for Killer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Killer::Starvation => f.write_str("Starvation"),
            Killer::Entity { name, .. } => f.write_str(name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Something notable that happened during a tick, emitted for reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    /// Tick number during which the event occurred (1-based).
    pub tick: u64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(tick: u64, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            tick,
            payload,
        }
    }
}

/// Variants of simulation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum EventPayload {
    /// A predator moved onto its prey's tile.
    Captured {
        predator: Occupant,
        prey: Occupant,
        at: Position,
    },
    /// An agent walked onto a pickup, which respawned elsewhere.
    PickupConsumed {
        by: Occupant,
        pickup: EntityId,
        at: Position,
        respawned_at: Option<Position>,
        reward: u32,
    },
    /// An agent left the active set.
    Died {
        agent: Occupant,
        name: String,
        killer: Killer,
        lifetime: u64,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised by the simulation core.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProwlError {
    #[error("Position out of bounds: ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("No free tile left on the grid")]
    NoFreeTile,

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_step_to_are_inverse() {
        let a = Position::new(3, 4);
        for step in Step::CARDINALS {
            let b = a.offset(step);
            assert_eq!(a.step_to(b), step);
            assert!(step.is_cardinal());
        }
        assert!(!Step::ZERO.is_cardinal());
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(Position::new(3, -4)), 7);
        assert_eq!(Position::new(2, 2).manhattan(Position::new(2, 2)), 0);
    }

    #[test]
    fn kind_capabilities() {
        assert_eq!(EntityKind::Cat.target_kind(), Some(EntityKind::Mouse));
        assert_eq!(EntityKind::Mouse.target_kind(), Some(EntityKind::Pickup));
        assert_eq!(EntityKind::Pickup.target_kind(), None);
        assert_eq!(EntityKind::Mouse.flee_from_kind(), Some(EntityKind::Cat));
        assert_eq!(EntityKind::Cat.flee_from_kind(), None);
        assert!(!EntityKind::Pickup.is_agent());
    }

    #[test]
    fn killer_display() {
        assert_eq!(Killer::Starvation.to_string(), "Starvation");
        let k = Killer::Entity {
            occupant: Occupant::new(EntityId(1), EntityKind::Cat),
            name: "Cat 2".to_string(),
        };
        assert_eq!(k.to_string(), "Cat 2");
    }

    #[test]
    fn event_roundtrip() {
        let event = Event::new(
            7,
            EventPayload::Captured {
                predator: Occupant::new(EntityId(0), EntityKind::Cat),
                prey: Occupant::new(EntityId(3), EntityKind::Mouse),
                at: Position::new(4, 5),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Captured"));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.tick, 7);
        assert!(matches!(
            back.payload,
            EventPayload::Captured { at, .. } if at == Position::new(4, 5)
        ));
    }

    #[test]
    fn error_display() {
        let err = ProwlError::OutOfBounds { x: -1, y: 9 };
        assert!(err.to_string().contains("(-1, 9)"));
    }
}
