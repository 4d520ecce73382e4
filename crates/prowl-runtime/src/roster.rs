//! Live entity directory.
//!
//! Agents remember *which* entities they have seen, not where.  When a plan
//! needs a location the scheduler looks it up here, so a remembered pickup
//! that has since respawned is chased to its new tile.  An id missing from
//! the roster refers to an entity that no longer exists.

use std::collections::HashMap;

use prowl_types::{EntityId, Occupant, Position, ProwlError};

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub occupant: Occupant,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: HashMap<EntityId, RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, occupant: Occupant, name: impl Into<String>, position: Position) {
        self.entries.insert(
            occupant.id,
            RosterEntry {
                occupant,
                name: name.into(),
                position,
            },
        );
    }

    /// Record that `id` now stands on `position`.
    pub fn relocate(&mut self, id: EntityId, position: Position) -> Result<(), ProwlError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(ProwlError::UnknownEntity(id))?;
        entry.position = position;
        Ok(())
    }

    pub fn remove(&mut self, id: EntityId) -> Option<RosterEntry> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&RosterEntry> {
        self.entries.get(&id)
    }

    pub fn locate(&self, id: EntityId) -> Option<Position> {
        self.entries.get(&id).map(|e| e.position)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prowl_types::EntityKind;

    #[test]
    fn insert_locate_relocate_remove() {
        let mut roster = Roster::new();
        let mouse = Occupant::new(EntityId(3), EntityKind::Mouse);
        roster.insert(mouse, "Mouse 1", Position::new(1, 1));
        assert_eq!(roster.locate(EntityId(3)), Some(Position::new(1, 1)));

        roster.relocate(EntityId(3), Position::new(2, 1)).unwrap();
        assert_eq!(roster.get(EntityId(3)).unwrap().position, Position::new(2, 1));
        assert_eq!(roster.get(EntityId(3)).unwrap().name, "Mouse 1");

        assert!(roster.remove(EntityId(3)).is_some());
        assert!(!roster.contains(EntityId(3)));
        assert!(roster.is_empty());
    }

    #[test]
    fn relocating_unknown_entity_fails() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.relocate(EntityId(9), Position::new(0, 0)),
            Err(ProwlError::UnknownEntity(EntityId(9)))
        );
    }
}
