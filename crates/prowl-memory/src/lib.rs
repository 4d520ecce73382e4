//! `prowl-memory` – what an agent knows, as opposed to what is true.
//!
//! # Modules
//!
//! - [`fog`] – [`MemoryGrid`][fog::MemoryGrid]: a private, partially filled
//!   copy of the world grid.  Tiles start unknown and are overwritten with
//!   snapshots as the agent sees them.  Walls, once seen, are trusted forever;
//!   occupants may go stale.
//! - [`recall`] – [`EntityRecall`][recall::EntityRecall]: the set of entities
//!   currently in sight and the ever-growing set of entities ever seen.

pub mod fog;
pub mod recall;

pub use fog::{FogUpdate, MemoryGrid};
pub use recall::EntityRecall;
