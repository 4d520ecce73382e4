//! `prowl-perception` – the world as it is, and what an agent can see of it.
//!
//! # Modules
//!
//! - [`grid`] – [`Grid`][grid::Grid] and [`Tile`][grid::Tile]: the
//!   authoritative wall layout and per-tile occupancy, plus the move
//!   validation rules shared by every agent.  The same type doubles as the
//!   backing store of each agent's fog-of-war memory.
//! - [`visibility`] – [`visible_tiles`][visibility::visible_tiles]: an
//!   approximate line-of-sight field of view built from a digital circle and
//!   Bresenham rays that stop at the first wall.

pub mod grid;
pub mod visibility;

pub use grid::{Grid, Tile};
pub use visibility::{raster_line, vision_bounds, visible_tiles};
