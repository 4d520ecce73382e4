//! Task state machine.
//!
//! A [`Task`] is one candidate behaviour on an agent's agenda.  It moves
//! through three states:
//!
//! ```text
//!   Idle ──start()──▶ InProgress ──step()…──▶ Complete
//!     │                                          ▲
//!     └──────────── no plan (zero step) ─────────┘
//! ```
//!
//! [`Task::start`] computes a plan and returns the first step;
//! [`Task::step`] returns each subsequent one.  A task that cannot produce a
//! plan completes immediately and returns [`Step::ZERO`], which the scheduler
//! reads as "this didn't work, think again next tick".
//!
//! | Kind | Plan |
//! |------|------|
//! | [`TaskKind::MoveToPosition`] | A* to a sighted target. |
//! | [`TaskKind::Explore`] | A* to a random unknown tile, chosen on creation. |
//! | [`TaskKind::Wander`] | One random valid step, no pathfinding. |
//! | [`TaskKind::Hide`] | A* to the known tile with the best lead over a threat. |

use std::collections::VecDeque;
use std::fmt;

use prowl_memory::fog::MemoryGrid;
use prowl_types::{EntityKind, Occupant, Position, Step};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::pathfinder::find_path;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Idle,
    InProgress,
    Complete,
}

/// Coarse task category used by the agenda's priority tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskClass {
    Hide,
    MoveToPosition,
    Explore,
    Wander,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    /// Walk to where `quarry` was located when the task was queued.
    MoveToPosition {
        target: Position,
        quarry: Occupant,
        quarry_name: String,
    },
    /// Walk to a tile the agent has never seen.  `None` means the memory had
    /// no unknown tiles left when the task was prepared.
    Explore { target: Option<Position> },
    Wander,
    /// Get away from `threat`, last seen at `threat_at`.
    Hide {
        threat: Occupant,
        threat_name: String,
        threat_at: Position,
    },
}

/// What a task may consult while planning.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub position: Position,
    pub mover: EntityKind,
    pub memory: &'a MemoryGrid,
}

#[derive(Debug, Clone)]
pub struct Task {
    kind: TaskKind,
    state: TaskState,
    plan: VecDeque<Step>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

impl Task {
    fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            state: TaskState::Idle,
            plan: VecDeque::new(),
        }
    }

    pub fn move_to(target: Position, quarry: Occupant, quarry_name: impl Into<String>) -> Self {
        Self::new(TaskKind::MoveToPosition {
            target,
            quarry,
            quarry_name: quarry_name.into(),
        })
    }

    /// Prepare an exploration task by picking one unknown tile of `memory`
    /// uniformly at random.
    pub fn explore<R: Rng + ?Sized>(memory: &MemoryGrid, rng: &mut R) -> Self {
        let target = memory.unknown_positions().choose(rng).copied();
        Self::new(TaskKind::Explore { target })
    }

    pub fn wander() -> Self {
        Self::new(TaskKind::Wander)
    }

    pub fn hide(threat: Occupant, threat_name: impl Into<String>, threat_at: Position) -> Self {
        Self::new(TaskKind::Hide {
            threat,
            threat_name: threat_name.into(),
            threat_at,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn class(&self) -> TaskClass {
        match self.kind {
            TaskKind::MoveToPosition { .. } => TaskClass::MoveToPosition,
            TaskKind::Explore { .. } => TaskClass::Explore,
            TaskKind::Wander => TaskClass::Wander,
            TaskKind::Hide { .. } => TaskClass::Hide,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == TaskState::Complete
    }

    /// True for an exploration task that found nothing left to explore.
    pub fn is_fully_explored(&self) -> bool {
        matches!(self.kind, TaskKind::Explore { target: None })
    }

    /// Steps still queued in the current plan.
    pub fn remaining(&self) -> usize {
        self.plan.len()
    }

    /// Force the task into its terminal state.
    pub fn abandon(&mut self) {
        self.state = TaskState::Complete;
        self.plan.clear();
    }

    /// Human-readable description, as shown in agent reports.
    pub fn label(&self) -> String {
        self.to_string()
    }

    // ── Execution ────────────────────────────────────────────────────────────

    /// Plan and return the first step.
    ///
    /// Returns [`Step::ZERO`] and completes when no plan can be made.
    pub fn start<R: Rng + ?Sized>(&mut self, ctx: &TaskContext<'_>, rng: &mut R) -> Step {
        let path = match self.kind {
            TaskKind::MoveToPosition { target, .. } => {
                find_path(ctx.memory.grid(), ctx.position, target, ctx.mover)
            }
            TaskKind::Explore { target: Some(target) } => {
                find_path(ctx.memory.grid(), ctx.position, target, ctx.mover)
            }
            TaskKind::Explore { target: None } => None,
            TaskKind::Hide { threat_at, .. } => evade(ctx, threat_at)
                .and_then(|safe| find_path(ctx.memory.grid(), ctx.position, safe, ctx.mover)),
            TaskKind::Wander => {
                self.state = TaskState::Complete;
                return wander_step(ctx, rng);
            }
        };

        match path {
            Some(path) if !path.is_empty() => {
                self.plan = path.into();
                self.state = TaskState::InProgress;
                self.next_planned()
            }
            _ => {
                self.abandon();
                Step::ZERO
            }
        }
    }

    /// Advance along the plan.  An idle task is started instead.
    pub fn step<R: Rng + ?Sized>(&mut self, ctx: &TaskContext<'_>, rng: &mut R) -> Step {
        match self.state {
            TaskState::Idle => return self.start(ctx, rng),
            TaskState::Complete => return Step::ZERO,
            TaskState::InProgress => {}
        }

        if let TaskKind::Explore { target: Some(target) } = self.kind {
            if ctx.memory.is_known_wall(target) || ctx.position == target {
                self.abandon();
                return Step::ZERO;
            }
        }
        if self.kind == TaskKind::Wander {
            self.state = TaskState::Complete;
            return wander_step(ctx, rng);
        }

        self.next_planned()
    }

    fn next_planned(&mut self) -> Step {
        let step = self.plan.pop_front().unwrap_or(Step::ZERO);
        if self.plan.is_empty() {
            self.state = TaskState::Complete;
        }
        step
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskKind::MoveToPosition {
                target, quarry_name, ..
            } => write!(f, "Move Towards {quarry_name} seen at {target}"),
            TaskKind::Explore { target: Some(target) } => {
                write!(f, "Explore the Unknown Spot at {target}")
            }
            TaskKind::Explore { target: None } => f.write_str("Explore (nothing left unknown)"),
            TaskKind::Wander => f.write_str("Wander Randomly"),
            TaskKind::Hide {
                threat_name,
                threat_at,
                ..
            } => write!(f, "Hide from {threat_name} at {threat_at}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

fn wander_step<R: Rng + ?Sized>(ctx: &TaskContext<'_>, rng: &mut R) -> Step {
    ctx.memory
        .grid()
        .valid_moves(ctx.position, ctx.mover)
        .choose(rng)
        .copied()
        .unwrap_or(Step::ZERO)
}

/// Pick the hiding spot: the known open tile (other than the agent's own)
/// where the agent's lead over the threat, `dist(threat) - dist(self)`, is
/// largest.  Ties go to the tile nearest the grid centre.
pub fn evade(ctx: &TaskContext<'_>, threat_at: Position) -> Option<Position> {
    let center = ctx.memory.grid().center();
    let mut best: Option<(i32, i32, Position)> = None;

    for p in ctx.memory.known_open_positions() {
        if p == ctx.position {
            continue;
        }
        let lead = p.manhattan(threat_at) - p.manhattan(ctx.position);
        let off_center = p.manhattan(center);
        let better = match best {
            None => true,
            Some((best_lead, best_off, _)) => {
                lead > best_lead || (lead == best_lead && off_center < best_off)
            }
        };
        if better {
            best = Some((lead, off_center, p));
        }
    }

    best.map(|(_, _, p)| p)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use prowl_perception::grid::Grid;
    use prowl_types::EntityId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pickup() -> Occupant {
        Occupant::new(EntityId(5), EntityKind::Pickup)
    }

    fn cat() -> Occupant {
        Occupant::new(EntityId(1), EntityKind::Cat)
    }

    fn ctx(memory: &MemoryGrid, position: Position) -> TaskContext<'_> {
        TaskContext {
            position,
            mover: EntityKind::Mouse,
            memory,
        }
    }

    fn follow(task: &mut Task, memory: &MemoryGrid, mut at: Position, rng: &mut StdRng) -> Position {
        let mut step = task.start(&ctx(memory, at), rng);
        at = at.offset(step);
        while !task.is_complete() {
            step = task.step(&ctx(memory, at), rng);
            at = at.offset(step);
        }
        at
    }

    // ── MoveToPosition ──────────────────────────────────────────────────────

    #[test]
    fn move_to_walks_the_planned_path() {
        let memory = MemoryGrid::omniscient(&Grid::open(5, 5).unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::move_to(Position::new(0, 3), pickup(), "Pickup");
        assert_eq!(task.state(), TaskState::Idle);
        assert_eq!(task.label(), "Move Towards Pickup seen at [0, 3]");

        let first = task.start(&ctx(&memory, Position::new(0, 0)), &mut rng);
        assert_eq!(first, Step::SOUTH);
        assert_eq!(task.state(), TaskState::InProgress);
        assert_eq!(task.remaining(), 2);

        let mut far = Task::move_to(Position::new(4, 4), pickup(), "Pickup");
        let end = follow(&mut far, &memory, Position::new(0, 0), &mut rng);
        assert_eq!(end, Position::new(4, 4));
    }

    #[test]
    fn unreachable_target_completes_with_zero_step() {
        let memory = MemoryGrid::omniscient(&Grid::parse(".#.").unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::move_to(Position::new(2, 0), pickup(), "Pickup");
        assert_eq!(task.start(&ctx(&memory, Position::new(0, 0)), &mut rng), Step::ZERO);
        assert!(task.is_complete());
        assert_eq!(task.step(&ctx(&memory, Position::new(0, 0)), &mut rng), Step::ZERO);
    }

    #[test]
    fn single_step_plan_completes_on_start() {
        let memory = MemoryGrid::omniscient(&Grid::open(3, 1).unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::move_to(Position::new(1, 0), pickup(), "Pickup");
        assert_eq!(task.start(&ctx(&memory, Position::new(0, 0)), &mut rng), Step::EAST);
        assert!(task.is_complete());
    }

    // ── Explore ─────────────────────────────────────────────────────────────

    #[test]
    fn explore_targets_an_unknown_tile() {
        let truth = Grid::open(4, 1).unwrap();
        let mut memory = MemoryGrid::new(4, 1).unwrap();
        memory
            .absorb(&truth, &[Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let task = Task::explore(&memory, &mut rng);
        assert_eq!(task.kind(), &TaskKind::Explore { target: Some(Position::new(3, 0)) });
        assert_eq!(task.label(), "Explore the Unknown Spot at [3, 0]");
        assert!(!task.is_fully_explored());
    }

    #[test]
    fn explore_on_known_map_is_fully_explored() {
        let memory = MemoryGrid::omniscient(&Grid::open(3, 3).unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::explore(&memory, &mut rng);
        assert!(task.is_fully_explored());
        assert_eq!(task.start(&ctx(&memory, Position::new(1, 1)), &mut rng), Step::ZERO);
        assert!(task.is_complete());
    }

    #[test]
    fn explore_aborts_when_target_turns_out_to_be_a_wall() {
        let truth = Grid::parse("...#").unwrap();
        let mut memory = MemoryGrid::new(4, 1).unwrap();
        memory.absorb(&truth, &[Position::new(0, 0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let mut task = Task::new(TaskKind::Explore { target: Some(Position::new(3, 0)) });
        assert_eq!(task.start(&ctx(&memory, Position::new(0, 0)), &mut rng), Step::EAST);
        assert_eq!(task.state(), TaskState::InProgress);

        memory.absorb(&truth, &[Position::new(3, 0)]).unwrap();
        assert_eq!(task.step(&ctx(&memory, Position::new(1, 0)), &mut rng), Step::ZERO);
        assert!(task.is_complete());
    }

    // ── Wander ──────────────────────────────────────────────────────────────

    #[test]
    fn wander_takes_one_valid_step_and_completes() {
        let truth = Grid::parse(
            "#.#
             ...
             ###",
        )
        .unwrap();
        let memory = MemoryGrid::omniscient(&truth);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..20 {
            let mut task = Task::wander();
            let step = task.start(&ctx(&memory, Position::new(1, 1)), &mut rng);
            assert!([Step::NORTH, Step::EAST, Step::WEST].contains(&step));
            assert!(task.is_complete());
        }
    }

    #[test]
    fn boxed_in_wander_returns_zero() {
        let truth = Grid::parse(
            "###
             #.#
             ###",
        )
        .unwrap();
        let memory = MemoryGrid::omniscient(&truth);
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::wander();
        assert_eq!(task.start(&ctx(&memory, Position::new(1, 1)), &mut rng), Step::ZERO);
    }

    // ── Hide ────────────────────────────────────────────────────────────────

    #[test]
    fn evade_prefers_tiles_away_from_threat() {
        let memory = MemoryGrid::omniscient(&Grid::open(7, 1).unwrap());
        let c = ctx(&memory, Position::new(2, 0));
        let safe = evade(&c, Position::new(0, 0)).unwrap();
        // Every tile right of the agent has lead 2; the centre breaks the tie.
        assert_eq!(safe, Position::new(3, 0));
        assert!(safe.manhattan(Position::new(0, 0)) > Position::new(2, 0).manhattan(Position::new(0, 0)));
    }

    #[test]
    fn evade_ignores_unknown_tiles_and_own_tile() {
        let memory = MemoryGrid::new(3, 3).unwrap();
        assert_eq!(evade(&ctx(&memory, Position::new(1, 1)), Position::new(0, 0)), None);
    }

    #[test]
    fn hide_plans_a_path_away_from_threat() {
        let memory = MemoryGrid::omniscient(&Grid::open(9, 1).unwrap());
        let mut rng = StdRng::seed_from_u64(0);
        let mut task = Task::hide(cat(), "Cat", Position::new(1, 0));
        assert_eq!(task.label(), "Hide from Cat at [1, 0]");
        let step = task.start(&ctx(&memory, Position::new(2, 0)), &mut rng);
        assert_eq!(step, Step::EAST);
        assert_eq!(task.class(), TaskClass::Hide);
    }
}
