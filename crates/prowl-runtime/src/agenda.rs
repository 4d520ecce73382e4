//! Agenda scheduler.
//!
//! Each tick an agent hands its agenda a [`Situation`] and gets back one
//! [`Decision`].  The agenda runs the following steps, in order:
//!
//! 1. **Interrupt.**  If a neighbouring tile the agent may enter holds its
//!    quarry, step onto it and skip everything else.
//! 2. **Replan.**  When the list is empty or a re-evaluation was requested,
//!    rebuild it: a Hide task per visible threat, a MoveToPosition task per
//!    known target (each nearest first), one Explore task, and a trailing
//!    Wander task.
//! 3. **Reorder.**  Stable sort by the kind's priority table.  Below
//!    [`DIRE_ENERGY_THRESHOLD`] the dire table applies.
//! 4. **Execute.**  Start or step the head task.  A completed head is
//!    popped.  A zero step abandons the head and requests re-evaluation.
//!
//! Re-evaluation is requested from outside too: the owning agent calls
//! [`Agenda::request_reevaluation`] when its sighted set changes or new walls
//! appear, and the world does so when a move is refused.

use std::collections::HashSet;

use prowl_memory::fog::MemoryGrid;
use prowl_memory::recall::EntityRecall;
use prowl_perception::grid::Grid;
use prowl_types::{EntityKind, Position, Step};
use rand::Rng;
use tracing::debug;

use crate::roster::Roster;
use crate::task::{Task, TaskClass, TaskContext, TaskState};

/// Energy below which the dire priority table replaces the normal one.
pub const DIRE_ENERGY_THRESHOLD: u32 = 20;

const MOUSE_PRIORITIES: &[TaskClass] = &[
    TaskClass::Hide,
    TaskClass::MoveToPosition,
    TaskClass::Explore,
    TaskClass::Wander,
];
const MOUSE_DIRE_PRIORITIES: &[TaskClass] = &[
    TaskClass::MoveToPosition,
    TaskClass::Hide,
    TaskClass::Explore,
    TaskClass::Wander,
];
const CAT_PRIORITIES: &[TaskClass] = &[
    TaskClass::MoveToPosition,
    TaskClass::Explore,
    TaskClass::Wander,
];

/// Task classes in descending priority for an agent of `kind` with
/// `energy` left.  Classes not listed are dropped from the agenda.
pub fn priorities(kind: EntityKind, energy: u32) -> &'static [TaskClass] {
    let dire = energy < DIRE_ENERGY_THRESHOLD;
    match kind {
        EntityKind::Mouse if dire => MOUSE_DIRE_PRIORITIES,
        EntityKind::Mouse => MOUSE_PRIORITIES,
        EntityKind::Cat => CAT_PRIORITIES,
        EntityKind::Pickup => &[],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs / outputs
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the scheduler may look at for one decision.
#[derive(Debug, Clone, Copy)]
pub struct Situation<'a> {
    pub position: Position,
    pub kind: EntityKind,
    pub energy: u32,
    pub memory: &'a MemoryGrid,
    pub recall: &'a EntityRecall,
    /// The true grid.  Only the interrupt rule reads it, and only for tiles
    /// adjacent to the agent.
    pub world: &'a Grid,
    pub roster: &'a Roster,
}

/// The outcome of one scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub step: Step,
    pub replanned: bool,
    pub interrupted: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agenda
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Agenda {
    tasks: Vec<Task>,
    reevaluate: bool,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn head(&self) -> Option<&Task> {
        self.tasks.first()
    }

    pub fn labels(&self) -> Vec<String> {
        self.tasks.iter().map(Task::label).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Force a replan at the next decision.
    pub fn request_reevaluation(&mut self) {
        self.reevaluate = true;
    }

    pub fn needs_reevaluation(&self) -> bool {
        self.reevaluate
    }

    /// Run one scheduling pass and return the chosen step.
    pub fn decide<R: Rng + ?Sized>(&mut self, situation: &Situation<'_>, rng: &mut R) -> Decision {
        if let Some(step) = capture_step(situation) {
            self.reevaluate = true;
            return Decision {
                step,
                replanned: false,
                interrupted: true,
            };
        }

        let replanned = self.tasks.is_empty() || self.reevaluate;
        if replanned {
            self.replan(situation, rng);
        }
        self.reevaluate = false;
        self.reorder(priorities(situation.kind, situation.energy));

        let step = self.execute_head(situation, rng);
        Decision {
            step,
            replanned,
            interrupted: false,
        }
    }

    fn replan<R: Rng + ?Sized>(&mut self, s: &Situation<'_>, rng: &mut R) {
        self.tasks.clear();

        if let Some(threat_kind) = s.kind.flee_from_kind() {
            let mut threats: Vec<(i32, Task)> = s
                .recall
                .current()
                .iter()
                .filter(|o| o.kind == threat_kind)
                .filter_map(|o| s.roster.get(o.id))
                .map(|e| {
                    (
                        e.position.manhattan(s.position),
                        Task::hide(e.occupant, e.name.clone(), e.position),
                    )
                })
                .collect();
            threats.sort_by_key(|(distance, _)| *distance);
            self.tasks.extend(threats.into_iter().map(|(_, task)| task));
        }

        if let Some(target_kind) = s.kind.target_kind() {
            let mut queued = HashSet::new();
            let mut targets: Vec<(i32, Task)> = Vec::new();
            for o in s.recall.current().iter().chain(s.recall.remembered_only()) {
                if o.kind != target_kind || !queued.insert(o.id) {
                    continue;
                }
                if let Some(e) = s.roster.get(o.id) {
                    targets.push((
                        e.position.manhattan(s.position),
                        Task::move_to(e.position, e.occupant, e.name.clone()),
                    ));
                }
            }
            targets.sort_by_key(|(distance, _)| *distance);
            self.tasks.extend(targets.into_iter().map(|(_, task)| task));
        }

        let explore = Task::explore(s.memory, rng);
        if !explore.is_fully_explored() {
            self.tasks.push(explore);
        }
        self.tasks.push(Task::wander());

        debug!(
            kind = %s.kind,
            at = %s.position,
            tasks = self.tasks.len(),
            "agenda rebuilt"
        );
    }

    /// Stable reorder by `order`; classes absent from `order` are dropped.
    fn reorder(&mut self, order: &[TaskClass]) {
        self.tasks.retain(|t| order.contains(&t.class()));
        self.tasks
            .sort_by_key(|t| order.iter().position(|c| *c == t.class()));
    }

    fn execute_head<R: Rng + ?Sized>(&mut self, s: &Situation<'_>, rng: &mut R) -> Step {
        let ctx = TaskContext {
            position: s.position,
            mover: s.kind,
            memory: s.memory,
        };
        let Some(head) = self.tasks.first_mut() else {
            self.reevaluate = true;
            return Step::ZERO;
        };

        let step = if head.state() == TaskState::Idle {
            head.start(&ctx, rng)
        } else {
            head.step(&ctx, rng)
        };
        if step.is_zero() {
            debug!(task = %head, "task produced no move");
            head.abandon();
            self.reevaluate = true;
        }
        if head.is_complete() {
            self.tasks.remove(0);
        }
        step
    }
}

/// The interrupt rule: a step onto an adjacent tile holding the agent's
/// quarry, if the agent may enter it.
fn capture_step(s: &Situation<'_>) -> Option<Step> {
    let quarry = s.kind.target_kind()?;
    s.world
        .valid_moves(s.position, s.kind)
        .into_iter()
        .find(|&step| {
            s.world
                .get(s.position.offset(step))
                .is_some_and(|tile| tile.holds_kind(quarry))
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
