//! Cats and mice.
//!
//! An [`Agent`] owns everything it knows: a fog-of-war [`MemoryGrid`], an
//! [`EntityRecall`] of what it has seen, and an [`Agenda`] of things to do.
//! [`Agent::act`] is the per-tick contract the world drives: look around,
//! then let the agenda pick one step.  Applying that step, and everything
//! that follows from it, is the world's job.

use prowl_memory::fog::{FogUpdate, MemoryGrid};
use prowl_memory::recall::EntityRecall;
use prowl_perception::grid::Grid;
use prowl_perception::visibility::visible_tiles;
use prowl_types::{EntityId, EntityKind, Killer, Occupant, Position, ProwlError};
use rand::Rng;
use tracing::trace;

use crate::agenda::{Agenda, Decision, Situation};
use crate::config::AgentProfile;
use crate::roster::Roster;

/// What one look around changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perception {
    pub visible: usize,
    pub fog: FogUpdate,
    /// The set of entities in sight differs from the previous tick.
    pub sight_changed: bool,
}

impl Perception {
    /// True when the agent's current plan may no longer make sense.
    pub fn warrants_replan(&self) -> bool {
        self.sight_changed || self.fog.discovered_walls()
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub position: Position,
    pub energy: u32,
    pub vision_range: f64,
    /// Energy handed to whoever captures this agent.
    pub capture_reward: u32,
    pub killer: Option<Killer>,
    pub points: u32,
    pub lifetime: u64,
    memory: MemoryGrid,
    recall: EntityRecall,
    agenda: Agenda,
}

impl Agent {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        name: impl Into<String>,
        position: Position,
        profile: AgentProfile,
        memory: MemoryGrid,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            position,
            energy: profile.energy,
            vision_range: profile.vision_range,
            capture_reward: profile.capture_reward,
            killer: None,
            points: 0,
            lifetime: 0,
            memory,
            recall: EntityRecall::new(),
            agenda: Agenda::new(),
        }
    }

    pub fn occupant(&self) -> Occupant {
        Occupant::new(self.id, self.kind)
    }

    pub fn memory(&self) -> &MemoryGrid {
        &self.memory
    }

    pub fn recall(&self) -> &EntityRecall {
        &self.recall
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn agenda_labels(&self) -> Vec<String> {
        self.agenda.labels()
    }

    /// Out of energy or captured.
    pub fn is_dead(&self) -> bool {
        self.energy == 0 || self.killer.is_some()
    }

    /// Perceive, then plan one step.
    pub fn act<R: Rng + ?Sized>(
        &mut self,
        world: &Grid,
        roster: &Roster,
        rng: &mut R,
    ) -> Result<Decision, ProwlError> {
        let perception = self.perceive(world, roster)?;
        if perception.warrants_replan() {
            self.agenda.request_reevaluation();
        }

        let situation = Situation {
            position: self.position,
            kind: self.kind,
            energy: self.energy,
            memory: &self.memory,
            recall: &self.recall,
            world,
            roster,
        };
        let decision = self.agenda.decide(&situation, rng);
        trace!(
            agent = %self.name,
            at = %self.position,
            step = ?decision.step,
            replanned = decision.replanned,
            interrupted = decision.interrupted,
            "decided"
        );
        Ok(decision)
    }

    /// Refresh memory and recall from what is in line of sight.
    ///
    /// Remembered entities that have left the roster no longer exist and are
    /// forgotten.
    pub fn perceive(&mut self, world: &Grid, roster: &Roster) -> Result<Perception, ProwlError> {
        let visible = visible_tiles(self.position, self.vision_range, world);
        let fog = self.memory.absorb(world, &visible)?;

        let mut sighted = Vec::new();
        for &p in &visible {
            sighted.extend(
                world
                    .tile(p)?
                    .occupants
                    .iter()
                    .filter(|o| o.id != self.id)
                    .copied(),
            );
        }
        let sight_changed = self.recall.observe(sighted);

        let gone: Vec<EntityId> = self
            .recall
            .remembered()
            .iter()
            .filter(|o| !roster.contains(o.id))
            .map(|o| o.id)
            .collect();
        for id in gone {
            self.recall.forget(id);
        }

        Ok(Perception {
            visible: visible.len(),
            fog,
            sight_changed,
        })
    }

    /// Drop every trace of a consumed entity that stood on `at`.
    pub fn forget(&mut self, id: EntityId, at: Position) -> Result<(), ProwlError> {
        self.recall.forget(id);
        self.memory.forget_occupant(at, id)?;
        Ok(())
    }

    /// Clear the agent's own snapshot from the tile it just stepped off.
    ///
    /// Memory only refreshes what is in sight, and a short-sighted agent may
    /// not see the tile behind it.  Left there, the stale copy of itself
    /// would block its own way back.
    pub fn leave(&mut self, from: Position) -> Result<(), ProwlError> {
        self.memory.forget_occupant(from, self.id)?;
        Ok(())
    }

    /// Ask for a fresh plan next tick, e.g. after a refused move.
    pub fn request_replan(&mut self) {
        self.agenda.request_reevaluation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile() -> AgentProfile {
        AgentProfile {
            energy: 100,
            vision_range: 7.5,
            capture_reward: 50,
        }
    }

    fn mouse_at(grid: &mut Grid, roster: &mut Roster, p: Position) -> Agent {
        let agent = Agent::new(
            EntityId(1),
            EntityKind::Mouse,
            "Mouse",
            p,
            profile(),
            MemoryGrid::new(grid.width(), grid.height()).unwrap(),
        );
        grid.place_occupant(p, agent.occupant()).unwrap();
        roster.insert(agent.occupant(), &agent.name, p);
        agent
    }

    #[test]
    fn perceive_excludes_self_and_reports_changes() {
        let mut grid = Grid::open(6, 6).unwrap();
        let mut roster = Roster::new();
        let mut mouse = mouse_at(&mut grid, &mut roster, Position::new(0, 0));

        let first = mouse.perceive(&grid, &roster).unwrap();
        assert!(!first.sight_changed);
        assert!(mouse.recall().current().is_empty());
        assert!(first.fog.revealed > 0);

        let food = Occupant::new(EntityId(2), EntityKind::Pickup);
        grid.place_occupant(Position::new(3, 0), food).unwrap();
        roster.insert(food, "Pickup", Position::new(3, 0));
        let second = mouse.perceive(&grid, &roster).unwrap();
        assert!(second.sight_changed);
        assert!(second.warrants_replan());
        assert_eq!(mouse.recall().current(), &[food]);
    }

    #[test]
    fn discovering_walls_warrants_replan() {
        let mut grid = Grid::parse("..#").unwrap();
        let mut roster = Roster::new();
        let mut mouse = mouse_at(&mut grid, &mut roster, Position::new(0, 0));
        let p = mouse.perceive(&grid, &roster).unwrap();
        assert_eq!(p.fog.new_walls, 1);
        assert!(p.warrants_replan());
        assert!(!mouse.perceive(&grid, &roster).unwrap().warrants_replan());
    }

    #[test]
    fn entities_that_left_the_roster_are_forgotten() {
        let mut grid = Grid::open(5, 1).unwrap();
        let mut roster = Roster::new();
        let mut mouse = mouse_at(&mut grid, &mut roster, Position::new(0, 0));
        let food = Occupant::new(EntityId(2), EntityKind::Pickup);
        grid.place_occupant(Position::new(4, 0), food).unwrap();
        roster.insert(food, "Pickup", Position::new(4, 0));
        mouse.perceive(&grid, &roster).unwrap();
        assert!(mouse.recall().remembers(EntityId(2)));

        grid.remove_occupant(Position::new(4, 0), EntityId(2)).unwrap();
        roster.remove(EntityId(2));
        mouse.perceive(&grid, &roster).unwrap();
        assert!(!mouse.recall().remembers(EntityId(2)));
    }

    #[test]
    fn act_plans_toward_a_visible_pickup() {
        let mut grid = Grid::open(10, 10).unwrap();
        let mut roster = Roster::new();
        let mut mouse = mouse_at(&mut grid, &mut roster, Position::new(0, 0));
        let food = Occupant::new(EntityId(2), EntityKind::Pickup);
        grid.place_occupant(Position::new(0, 3), food).unwrap();
        roster.insert(food, "Pickup", Position::new(0, 3));

        let mut rng = StdRng::seed_from_u64(7);
        let decision = mouse.act(&grid, &roster, &mut rng).unwrap();
        assert!(decision.replanned);
        assert_eq!(decision.step, prowl_types::Step::SOUTH);
        assert_eq!(
            mouse.agenda_labels().first().map(String::as_str),
            Some("Move Towards Pickup seen at [0, 3]")
        );
    }

    #[test]
    fn dead_when_starved_or_killed() {
        let mut grid = Grid::open(2, 2).unwrap();
        let mut roster = Roster::new();
        let mut mouse = mouse_at(&mut grid, &mut roster, Position::new(0, 0));
        assert!(!mouse.is_dead());
        mouse.energy = 0;
        assert!(mouse.is_dead());
        mouse.energy = 5;
        mouse.killer = Some(Killer::Starvation);
        assert!(mouse.is_dead());
    }
}
