//! Human and machine readable output: per-tick event lines, agent status
//! blocks, post-mortems, fog-of-war maps, and the JSON run report.

use std::collections::HashSet;

use prowl_memory::fog::MemoryGrid;
use prowl_perception::grid::Grid;
use prowl_perception::visibility::visible_tiles;
use prowl_runtime::agent::Agent;
use prowl_runtime::roster::Roster;
use prowl_runtime::world::World;
use prowl_types::{EntityKind, Event, EventPayload, Occupant, Position};
use serde::Serialize;

/// Legend printed under every map.
pub const MAP_KEY: &str = "Key: ? unknown, □ empty, ■ wall, A this agent, X another entity";

// ─────────────────────────────────────────────────────────────────────────────
// Event lines
// ─────────────────────────────────────────────────────────────────────────────

fn name_of(world: &World, occupant: Occupant) -> String {
    world
        .agent(occupant.id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| occupant.kind.label().to_string())
}

/// One line describing `event`.
pub fn event_line(event: &Event, world: &World) -> String {
    let body = match &event.payload {
        EventPayload::Captured { predator, prey, at } => format!(
            "{} captured {} at {at}",
            name_of(world, *predator),
            name_of(world, *prey)
        ),
        EventPayload::PickupConsumed {
            by,
            at,
            respawned_at,
            reward,
            ..
        } => {
            let who = name_of(world, *by);
            let what = if *reward > 0 {
                format!("{who} ate a pickup at {at} (+{reward} energy)")
            } else {
                format!("{who} knocked a pickup at {at} away")
            };
            match respawned_at {
                Some(next) => format!("{what}, it reappeared at {next}"),
                None => format!("{what}, no room left to respawn it"),
            }
        }
        EventPayload::Died {
            name,
            killer,
            lifetime,
            ..
        } => format!("{name} died (killer: {killer}) after {lifetime} ticks"),
    };
    format!("[tick {}] {body}", event.tick)
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent blocks
// ─────────────────────────────────────────────────────────────────────────────

fn entity_names<'a>(occupants: impl Iterator<Item = &'a Occupant>, roster: &Roster) -> Vec<String> {
    occupants
        .map(|o| match roster.get(o.id) {
            Some(entry) => format!("{} at {}", entry.name, entry.position),
            None => o.kind.label().to_string(),
        })
        .collect()
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn agenda_block(out: &mut String, heading: &str, labels: &[String]) {
    out.push_str(&format!("  {heading}:\n"));
    if labels.is_empty() {
        out.push_str("    (empty)\n");
    }
    for (n, label) in labels.iter().enumerate() {
        out.push_str(&format!("    {}. {label}\n", n + 1));
    }
}

fn explored_percent(memory: &MemoryGrid) -> f64 {
    memory.explored_fraction() * 100.0
}

/// Current stats of a living agent.
pub fn agent_status(agent: &Agent, roster: &Roster) -> String {
    let in_vision = entity_names(agent.recall().current().iter(), roster);
    let in_memory = entity_names(agent.recall().remembered_only(), roster);

    let mut out = format!("{}\n", agent.name);
    out.push_str(&format!("  Location: {}\n", agent.position));
    out.push_str(&format!("  Energy: {}\n", agent.energy));
    out.push_str(&format!("  Points: {}\n", agent.points));
    out.push_str(&format!("  In Vision: {}\n", list_or_none(&in_vision)));
    out.push_str(&format!("  In Memory: {}\n", list_or_none(&in_memory)));
    agenda_block(&mut out, "Agenda", &agent.agenda_labels());
    out
}

/// Summary of a dead agent.
pub fn post_mortem(agent: &Agent) -> String {
    let killer = agent
        .killer
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());

    let mut out = format!("{} (dead)\n", agent.name);
    out.push_str(&format!("  Last Location: {}\n", agent.position));
    out.push_str(&format!("  Remaining Energy: {}\n", agent.energy));
    out.push_str(&format!("  Lifetime: {} ticks\n", agent.lifetime));
    out.push_str(&format!("  Points: {}\n", agent.points));
    out.push_str(&format!("  Killer: {killer}\n"));
    out.push_str(&format!(
        "  Percentage of Grid Explored: {:.1}%\n",
        explored_percent(agent.memory())
    ));
    agenda_block(&mut out, "Previous Agenda", &agent.agenda_labels());
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Maps
// ─────────────────────────────────────────────────────────────────────────────

fn render(grid: &Grid, me: Position, hidden: impl Fn(Position) -> bool) -> String {
    let mut out = String::new();
    for y in 0..grid.height() as i32 {
        let row: Vec<&str> = (0..grid.width() as i32)
            .map(|x| {
                let p = Position::new(x, y);
                match grid.get(p) {
                    None => "?",
                    Some(_) if hidden(p) => "?",
                    Some(t) if t.unknown => "?",
                    Some(t) if t.is_wall => "■",
                    Some(_) if p == me => "A",
                    Some(t) if !t.occupants.is_empty() => "X",
                    Some(_) => "□",
                }
            })
            .collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

/// The agent's remembered map.
pub fn memory_map(agent: &Agent) -> String {
    render(agent.memory().grid(), agent.position, |_| false)
}

/// What the agent can see right now; everything out of sight is `?`.
pub fn vision_map(agent: &Agent, world: &Grid) -> String {
    let visible: HashSet<Position> = visible_tiles(agent.position, agent.vision_range, world)
        .into_iter()
        .collect();
    render(world, agent.position, |p| !visible.contains(&p))
}

// ─────────────────────────────────────────────────────────────────────────────
// Whole-run reports
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: EntityKind,
    pub alive: bool,
    pub position: Position,
    pub energy: u32,
    pub lifetime: u64,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killer: Option<String>,
    pub explored_percent: f64,
    pub in_vision: Vec<String>,
    pub in_memory: Vec<String>,
    pub agenda: Vec<String>,
}

impl AgentReport {
    fn new(agent: &Agent, roster: &Roster) -> Self {
        Self {
            name: agent.name.clone(),
            kind: agent.kind,
            alive: !agent.is_dead(),
            position: agent.position,
            energy: agent.energy,
            lifetime: agent.lifetime,
            points: agent.points,
            killer: agent.killer.as_ref().map(ToString::to_string),
            explored_percent: explored_percent(agent.memory()),
            in_vision: entity_names(agent.recall().current().iter(), roster),
            in_memory: entity_names(agent.recall().remembered_only(), roster),
            agenda: agent.agenda_labels(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ticks: u64,
    pub finished: bool,
    pub agents: Vec<AgentReport>,
    pub pickups: Vec<Position>,
}

impl RunReport {
    pub fn from_world(world: &World) -> Self {
        Self {
            ticks: world.tick_count(),
            finished: world.is_over(),
            agents: world
                .agents()
                .iter()
                .chain(world.graveyard())
                .map(|a| AgentReport::new(a, world.roster()))
                .collect(),
            pickups: world.pickups().iter().map(|p| p.position).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Plain-text report: survivors, then the dead, optionally with maps.
pub fn text_report(world: &World, show_maps: bool) -> String {
    let mut out = format!("After {} ticks\n\n", world.tick_count());

    out.push_str("Survivors\n");
    if world.agents().is_empty() {
        out.push_str("  none\n");
    }
    for agent in world.agents() {
        out.push_str(&agent_status(agent, world.roster()));
        if show_maps {
            push_maps(&mut out, agent, Some(world.grid()));
        }
        out.push('\n');
    }

    out.push_str("Fallen\n");
    if world.graveyard().is_empty() {
        out.push_str("  none\n");
    }
    for agent in world.graveyard() {
        out.push_str(&post_mortem(agent));
        if show_maps {
            push_maps(&mut out, agent, None);
        }
        out.push('\n');
    }
    out
}

fn push_maps(out: &mut String, agent: &Agent, world: Option<&Grid>) {
    out.push_str("  Memory:\n");
    out.push_str(&memory_map(agent));
    if let Some(world) = world {
        out.push_str("  Vision:\n");
        out.push_str(&vision_map(agent, world));
    }
    out.push_str(MAP_KEY);
    out.push('\n');
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
