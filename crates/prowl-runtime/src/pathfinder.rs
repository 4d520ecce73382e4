//! A* search over an agent's remembered map.
//!
//! Agents plan against what they *believe*: the search runs on a memory
//! grid, where unknown tiles are assumed open.  A path found here may later
//! turn out to cross a wall the agent had not yet seen; the scheduler then
//! replans.
//!
//! # Cost model
//!
//! | Term | Meaning |
//! |------|---------|
//! | `g`  | Steps taken from the start (unit cost per move).            |
//! | `h`  | Manhattan distance to the target; admissible without diagonals. |
//!
//! The open node with the lowest `g + h` is expanded next; ties go to the
//! node with the lower `h`.
//!
//! # Re-expansion
//!
//! Neighbours are not filtered against the closed list before being added to
//! the open list.  A neighbour is queued whenever it is absent from the open
//! list or its new `g` beats the queued one, so a tile may be expanded more
//! than once.  With uniform step costs and a consistent heuristic this never
//! changes the returned path length; it only costs extra iterations, which
//! [`MAX_EXPANSIONS`] bounds.
//!
//! # Example
//!
//! ```rust
//! use prowl_perception::grid::Grid;
//! use prowl_runtime::pathfinder::find_path;
//! use prowl_types::{EntityKind, Position};
//!
//! let memory = Grid::parse(
//!     ".#.
//!      .#.
//!      ...",
//! )
//! .unwrap();
//! let path = find_path(&memory, Position::new(0, 0), Position::new(2, 0), EntityKind::Cat)
//!     .expect("a way around the wall");
//! assert_eq!(path.len(), 6);
//! ```

use prowl_perception::grid::Grid;
use prowl_types::{EntityKind, Position, Step};
use tracing::debug;

/// Expansions after which the search gives up and reports no path.
pub const MAX_EXPANSIONS: usize = 200;

#[derive(Debug, Clone, Copy)]
struct Node {
    position: Position,
    g: i32,
    h: i32,
    /// Index of the parent in the closed list.
    parent: Option<usize>,
}

impl Node {
    fn f(&self) -> i32 {
        self.g + self.h
    }

    /// Ordering used to pick the next node: lowest `f`, then lowest `h`.
    fn better_than(&self, other: &Node) -> bool {
        self.f() < other.f() || (self.f() == other.f() && self.h < other.h)
    }
}

/// Plan a sequence of unit moves taking an agent of `mover` kind from
/// `start` to `target` across `memory`.
///
/// Returns `None` when the target is unreachable on the remembered map or
/// the search exceeds [`MAX_EXPANSIONS`]; callers treat both identically.
/// `start == target` yields an empty path.
pub fn find_path(
    memory: &Grid,
    start: Position,
    target: Position,
    mover: EntityKind,
) -> Option<Vec<Step>> {
    let mut open = vec![Node {
        position: start,
        g: 0,
        h: start.manhattan(target),
        parent: None,
    }];
    let mut closed: Vec<Node> = Vec::new();
    let mut expansions = 0usize;

    while !open.is_empty() {
        expansions += 1;
        if expansions >= MAX_EXPANSIONS {
            debug!(%start, %target, expansions, "pathfinding bailed out");
            return None;
        }

        let mut best = 0;
        for (i, node) in open.iter().enumerate().skip(1) {
            if node.better_than(&open[best]) {
                best = i;
            }
        }
        let current = open.swap_remove(best);
        closed.push(current);
        let current_index = closed.len() - 1;

        if current.position == target {
            return Some(retrace(&closed, current_index));
        }

        for step in memory.valid_moves(current.position, mover) {
            let position = current.position.offset(step);
            let candidate = Node {
                position,
                g: current.g + 1,
                h: position.manhattan(target),
                parent: Some(current_index),
            };
            match open.iter().position(|n| n.position == position) {
                None => open.push(candidate),
                Some(i) if candidate.g < open[i].g => open.push(candidate),
                Some(_) => {}
            }
        }
    }

    None
}

/// Walk parent links from `goal` back to the start and convert the resulting
/// positions into unit steps.
fn retrace(closed: &[Node], goal: usize) -> Vec<Step> {
    let mut positions = Vec::new();
    let mut cursor = Some(goal);
    while let Some(i) = cursor {
        positions.push(closed[i].position);
        cursor = closed[i].parent;
    }
    positions.reverse();
    positions
        .windows(2)
        .map(|pair| pair[0].step_to(pair[1]))
        .collect()
}
