//! `prowl-runtime` – the simulation engine.
//!
//! Agents plan on what they remember, the world checks their moves against
//! what is true.
//!
//! # Modules
//!
//! - [`world`] – [`World`][world::World]: owns the true grid, the agents,
//!   and the pickups, and drives one tick at a time.  Captures, pickup
//!   consumption, and starvation are resolved here and reported as
//!   [`Event`][prowl_types::Event]s.
//! - [`agent`] – [`Agent`][agent::Agent]: a cat or mouse with its own
//!   fog-of-war memory, entity recall, and agenda.
//! - [`agenda`] – [`Agenda`][agenda::Agenda]: the per-agent scheduler.
//!   Rebuilds a task list when the situation changes, orders it by a
//!   priority table that flips when energy runs low, and executes the head.
//! - [`task`] – [`Task`][task::Task]: Hide, MoveToPosition, Explore, and
//!   Wander, each a small state machine with a precomputed step plan.
//! - [`pathfinder`] – [`find_path`][pathfinder::find_path]: bounded A* over
//!   a memory grid.
//! - [`pickup`] – [`Pickup`][pickup::Pickup]: passive food that respawns
//!   when consumed.
//! - [`roster`] – [`Roster`][roster::Roster]: id to name and live position,
//!   used to resolve remembered entities.
//! - [`config`] – [`SimConfig`][config::SimConfig]: world generation
//!   parameters with serde defaults.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod agenda;
pub mod agent;
pub mod config;
pub mod pathfinder;
pub mod pickup;
pub mod roster;
pub mod task;
pub mod telemetry;
pub mod world;

pub use agenda::{Agenda, Decision, DIRE_ENERGY_THRESHOLD};
pub use agent::Agent;
pub use config::{AgentProfile, SimConfig};
pub use pathfinder::find_path;
pub use pickup::Pickup;
pub use roster::Roster;
pub use task::{Task, TaskClass, TaskKind, TaskState};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use world::World;
