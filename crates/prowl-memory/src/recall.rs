//! Entity recall: what is in sight now, and what has ever been seen.
//!
//! `current` is replaced wholesale on every observation.  `remembered` only
//! grows; entries leave it solely through [`EntityRecall::forget`], which the
//! simulation calls when an entity is consumed or destroyed.

use std::collections::HashSet;

use prowl_types::{EntityId, Occupant};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityRecall {
    current: Vec<Occupant>,
    remembered: Vec<Occupant>,
}

impl EntityRecall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-sight set with `sighted` and fold it into memory.
    ///
    /// Duplicates in `sighted` are ignored.  Returns `true` when the
    /// membership of the in-sight set changed, regardless of order.
    pub fn observe(&mut self, sighted: impl IntoIterator<Item = Occupant>) -> bool {
        let mut next: Vec<Occupant> = Vec::new();
        for occupant in sighted {
            if !next.contains(&occupant) {
                next.push(occupant);
            }
        }

        let before: HashSet<EntityId> = self.current.iter().map(|o| o.id).collect();
        let after: HashSet<EntityId> = next.iter().map(|o| o.id).collect();

        for occupant in &next {
            if !self.remembers(occupant.id) {
                self.remembered.push(*occupant);
            }
        }
        self.current = next;
        before != after
    }

    /// Entities visible during the latest observation.
    pub fn current(&self) -> &[Occupant] {
        &self.current
    }

    /// Every entity ever seen and not yet forgotten, in first-seen order.
    pub fn remembered(&self) -> &[Occupant] {
        &self.remembered
    }

    /// Remembered entities that are not currently in sight.
    pub fn remembered_only(&self) -> impl Iterator<Item = &Occupant> {
        self.remembered
            .iter()
            .filter(|o| !self.is_in_sight(o.id))
    }

    pub fn is_in_sight(&self, id: EntityId) -> bool {
        self.current.iter().any(|o| o.id == id)
    }

    pub fn remembers(&self, id: EntityId) -> bool {
        self.remembered.iter().any(|o| o.id == id)
    }

    /// Remove `id` from both sets.  Returns `true` if it was known.
    pub fn forget(&mut self, id: EntityId) -> bool {
        let known = self.remembers(id) || self.is_in_sight(id);
        self.current.retain(|o| o.id != id);
        self.remembered.retain(|o| o.id != id);
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prowl_types::EntityKind;

    fn cat(id: u32) -> Occupant {
        Occupant::new(EntityId(id), EntityKind::Cat)
    }

    fn pickup(id: u32) -> Occupant {
        Occupant::new(EntityId(id), EntityKind::Pickup)
    }

    #[test]
    fn first_sighting_is_a_change() {
        let mut r = EntityRecall::new();
        assert!(r.observe([cat(1)]));
        assert_eq!(r.current(), &[cat(1)]);
        assert_eq!(r.remembered(), &[cat(1)]);
    }

    #[test]
    fn same_membership_in_any_order_is_not_a_change() {
        let mut r = EntityRecall::new();
        r.observe([cat(1), pickup(2)]);
        assert!(!r.observe([pickup(2), cat(1), cat(1)]));
    }

    #[test]
    fn losing_sight_is_a_change_but_memory_persists() {
        let mut r = EntityRecall::new();
        r.observe([cat(1), pickup(2)]);
        assert!(r.observe([pickup(2)]));
        assert!(r.remembers(EntityId(1)));
        assert!(!r.is_in_sight(EntityId(1)));
        let only: Vec<_> = r.remembered_only().copied().collect();
        assert_eq!(only, vec![cat(1)]);
    }

    #[test]
    fn memory_never_shrinks_through_observation() {
        let mut r = EntityRecall::new();
        r.observe([cat(1)]);
        r.observe([pickup(2)]);
        r.observe(std::iter::empty());
        assert_eq!(r.remembered(), &[cat(1), pickup(2)]);
        assert!(r.current().is_empty());
    }

    #[test]
    fn forget_removes_from_both_sets() {
        let mut r = EntityRecall::new();
        r.observe([cat(1), pickup(2)]);
        assert!(r.forget(EntityId(2)));
        assert!(!r.forget(EntityId(2)));
        assert_eq!(r.current(), &[cat(1)]);
        assert_eq!(r.remembered(), &[cat(1)]);
    }
}
