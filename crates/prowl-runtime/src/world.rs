//! The simulation world and its tick driver.
//!
//! [`World`] owns the true [`Grid`], every living agent, the graveyard, the
//! pickups, and the single random number generator all decisions draw from.
//! One call to [`World::tick`] gives every living agent exactly one turn, in
//! spawn order:
//!
//! 1. the agent perceives and decides ([`Agent::act`]);
//! 2. the step is checked against the true grid and applied;
//! 3. whatever the agent stepped onto is resolved (pickup or capture);
//! 4. energy drops by one and lifetime grows by one.
//!
//! Agents that died during the tick are moved to the graveyard at its end.
//! Everything notable is returned as [`Event`]s for reporters.
//!
//! # Example
//!
//! ```rust
//! use prowl_runtime::config::SimConfig;
//! use prowl_runtime::world::World;
//!
//! let config = SimConfig { seed: Some(3), ..SimConfig::default() };
//! let mut world = World::generate(&config).unwrap();
//! while !world.is_over() && world.tick_count() < 50 {
//!     for event in world.tick() {
//!         println!("{:?}", event.payload);
//!     }
//! }
//! ```

use prowl_memory::fog::MemoryGrid;
use prowl_perception::grid::Grid;
use prowl_types::{
    EntityId, EntityKind, Event, EventPayload, Killer, Occupant, Position, ProwlError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, info_span, warn};

use crate::agent::Agent;
use crate::config::{AgentProfile, SimConfig};
use crate::pickup::Pickup;
use crate::roster::Roster;

#[derive(Debug)]
pub struct World {
    grid: Grid,
    agents: Vec<Agent>,
    graveyard: Vec<Agent>,
    pickups: Vec<Pickup>,
    roster: Roster,
    rng: StdRng,
    tick: u64,
    next_id: u32,
    /// New agents start with the wall layout already memorised.
    instant_learn: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction and placement
// ─────────────────────────────────────────────────────────────────────────────

impl World {
    /// Build a random world from `config`: walls first, then pickups, then
    /// cats and mice, each on a random free tile.
    pub fn generate(config: &SimConfig) -> Result<Self, ProwlError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let grid = Grid::generate(config.width, config.height, config.wall_density, &mut rng)?;
        let mut world = Self::with_rng(grid, rng);
        world.instant_learn = config.instant_learn;

        for _ in 0..config.pickups {
            let at = world.random_free_tile()?;
            world.spawn_pickup(at, config.pickup_reward)?;
        }
        for (kind, count) in [(EntityKind::Cat, config.cats), (EntityKind::Mouse, config.mice)] {
            let Some(profile) = config.profile(kind) else {
                continue;
            };
            for n in 1..=count {
                let name = if count > 1 {
                    format!("{kind} {n}")
                } else {
                    kind.to_string()
                };
                let at = world.random_free_tile()?;
                world.spawn_agent(kind, name, at, profile)?;
            }
        }

        info!(
            width = config.width,
            height = config.height,
            cats = config.cats,
            mice = config.mice,
            pickups = config.pickups,
            seed = ?config.seed,
            "world generated"
        );
        Ok(world)
    }

    /// An empty world on `grid` with a seeded generator.  Populate it with
    /// [`spawn_agent`][World::spawn_agent] and
    /// [`spawn_pickup`][World::spawn_pickup].
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self::with_rng(grid, StdRng::seed_from_u64(seed))
    }

    fn with_rng(grid: Grid, rng: StdRng) -> Self {
        Self {
            grid,
            agents: Vec::new(),
            graveyard: Vec::new(),
            pickups: Vec::new(),
            roster: Roster::new(),
            rng,
            tick: 0,
            next_id: 0,
            instant_learn: false,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn random_free_tile(&mut self) -> Result<Position, ProwlError> {
        self.grid
            .random_free_position(&mut self.rng)
            .ok_or(ProwlError::NoFreeTile)
    }

    fn ensure_free(&self, at: Position) -> Result<(), ProwlError> {
        if self.grid.tile(at)?.is_free() {
            Ok(())
        } else {
            Err(ProwlError::InvalidConfig(format!("tile {at} is not free")))
        }
    }

    /// Agents spawned from now on know every wall from the start.
    pub fn set_instant_learn(&mut self, enabled: bool) {
        self.instant_learn = enabled;
    }

    /// Place a new cat or mouse on the free tile `at`.  Its memory starts
    /// entirely unknown, or as the bare wall layout with instant learning on.
    pub fn spawn_agent(
        &mut self,
        kind: EntityKind,
        name: impl Into<String>,
        at: Position,
        profile: AgentProfile,
    ) -> Result<EntityId, ProwlError> {
        if !kind.is_agent() {
            return Err(ProwlError::InvalidConfig(format!("{kind} is not an agent")));
        }
        self.ensure_free(at)?;
        let id = self.allocate_id();
        let memory = if self.instant_learn {
            MemoryGrid::omniscient(&self.grid)
        } else {
            MemoryGrid::new(self.grid.width(), self.grid.height())?
        };
        let agent = Agent::new(id, kind, name, at, profile, memory);
        self.grid.place_occupant(at, agent.occupant())?;
        self.roster.insert(agent.occupant(), agent.name.clone(), at);
        debug!(agent = %agent.name, %at, "agent spawned");
        self.agents.push(agent);
        Ok(id)
    }

    /// Place a new pickup on the free tile `at`.
    pub fn spawn_pickup(&mut self, at: Position, reward: u32) -> Result<EntityId, ProwlError> {
        self.ensure_free(at)?;
        let id = self.allocate_id();
        let pickup = Pickup::new(id, at, reward);
        self.grid.place_occupant(at, pickup.occupant())?;
        self.roster
            .insert(pickup.occupant(), EntityKind::Pickup.label(), at);
        self.pickups.push(pickup);
        Ok(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Read-only views
// ─────────────────────────────────────────────────────────────────────────────

impl World {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Living agents in turn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Dead agents in order of death.
    pub fn graveyard(&self) -> &[Agent] {
        &self.graveyard
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Look up an agent, living or dead.
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents
            .iter()
            .chain(self.graveyard.iter())
            .find(|a| a.id == id)
    }

    /// The run is over once either side has no living member.
    pub fn is_over(&self) -> bool {
        let alive = |kind: EntityKind| self.agents.iter().any(|a| a.kind == kind && !a.is_dead());
        !alive(EntityKind::Cat) || !alive(EntityKind::Mouse)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick driver
// ─────────────────────────────────────────────────────────────────────────────

impl World {
    /// Advance the simulation by one tick and return what happened.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick += 1;
        let _span = info_span!("tick", tick = self.tick).entered();
        let mut events = Vec::new();

        for index in 0..self.agents.len() {
            if self.agents[index].is_dead() {
                continue;
            }
            if let Err(err) = self.take_turn(index, &mut events) {
                error!(agent = %self.agents[index].name, %err, "turn aborted");
                self.agents[index].request_replan();
            }
            let agent = &mut self.agents[index];
            agent.energy = agent.energy.saturating_sub(1);
            agent.lifetime += 1;
        }

        self.bury_dead(&mut events);
        events
    }

    fn take_turn(&mut self, index: usize, events: &mut Vec<Event>) -> Result<(), ProwlError> {
        let decision = self.agents[index].act(&self.grid, &self.roster, &mut self.rng)?;
        if decision.step.is_zero() {
            return Ok(());
        }

        let agent = &self.agents[index];
        let (id, kind, from) = (agent.id, agent.kind, agent.position);
        let to = self.grid.clamp(from.offset(decision.step));
        if to == from || !self.grid.can_enter(to, kind) {
            debug!(agent = %agent.name, %from, %to, "move refused");
            self.agents[index].request_replan();
            return Ok(());
        }

        self.grid.remove_occupant(from, id)?;
        self.grid.place_occupant(to, Occupant::new(id, kind))?;
        self.roster.relocate(id, to)?;
        let agent = &mut self.agents[index];
        agent.position = to;
        agent.leave(from)?;
        self.resolve_arrival(index, to, events)
    }

    /// Settle whatever shares the tile the agent just entered.
    fn resolve_arrival(
        &mut self,
        index: usize,
        at: Position,
        events: &mut Vec<Event>,
    ) -> Result<(), ProwlError> {
        let arrival = self.agents[index].occupant();
        let others: Vec<Occupant> = self
            .grid
            .tile(at)?
            .occupants
            .iter()
            .filter(|o| o.id != arrival.id)
            .copied()
            .collect();

        for other in others {
            match other.kind {
                EntityKind::Pickup => self.consume_pickup(index, other.id, at, events)?,
                EntityKind::Mouse if arrival.kind == EntityKind::Cat => {
                    self.capture(index, other.id, at, events)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Any agent stepping on a pickup makes it respawn; only a mouse is
    /// rewarded.
    fn consume_pickup(
        &mut self,
        index: usize,
        pickup_id: EntityId,
        at: Position,
        events: &mut Vec<Event>,
    ) -> Result<(), ProwlError> {
        let slot = self
            .pickups
            .iter()
            .position(|p| p.id == pickup_id)
            .ok_or(ProwlError::UnknownEntity(pickup_id))?;
        let respawned_at = self.pickups[slot].respawn(&mut self.grid, &mut self.rng)?;
        let value = self.pickups[slot].reward;
        match respawned_at {
            Some(next) => self.roster.relocate(pickup_id, next)?,
            None => {
                warn!(pickup = %pickup_id, "no free tile left, pickup retired");
                self.pickups.remove(slot);
                self.roster.remove(pickup_id);
            }
        }

        let agent = &mut self.agents[index];
        let reward = if agent.kind == EntityKind::Mouse {
            agent.energy = agent.energy.saturating_add(value);
            agent.points += 1;
            value
        } else {
            0
        };
        agent.forget(pickup_id, at)?;

        info!(agent = %agent.name, %at, reward, "pickup consumed");
        events.push(Event::new(
            self.tick,
            EventPayload::PickupConsumed {
                by: agent.occupant(),
                pickup: pickup_id,
                at,
                respawned_at,
                reward,
            },
        ));
        Ok(())
    }

    /// A cat lands on a mouse: the mouse dies, the cat eats.
    fn capture(
        &mut self,
        index: usize,
        prey_id: EntityId,
        at: Position,
        events: &mut Vec<Event>,
    ) -> Result<(), ProwlError> {
        let Some(prey_index) = self
            .agents
            .iter()
            .position(|a| a.id == prey_id && !a.is_dead())
        else {
            return Ok(());
        };

        let predator = self.agents[index].occupant();
        let predator_name = self.agents[index].name.clone();
        let prey = &mut self.agents[prey_index];
        prey.killer = Some(Killer::Entity {
            occupant: predator,
            name: predator_name,
        });
        let reward = prey.capture_reward;
        let prey_occupant = prey.occupant();
        let prey_name = prey.name.clone();

        self.grid.remove_occupant(at, prey_id)?;
        self.roster.remove(prey_id);

        let hunter = &mut self.agents[index];
        hunter.energy = hunter.energy.saturating_add(reward);
        hunter.points += 1;
        hunter.forget(prey_id, at)?;

        info!(hunter = %hunter.name, prey = %prey_name, %at, reward, "capture");
        events.push(Event::new(
            self.tick,
            EventPayload::Captured {
                predator,
                prey: prey_occupant,
                at,
            },
        ));
        Ok(())
    }

    /// Move every dead agent off the grid and into the graveyard.
    fn bury_dead(&mut self, events: &mut Vec<Event>) {
        let mut index = 0;
        while index < self.agents.len() {
            if !self.agents[index].is_dead() {
                index += 1;
                continue;
            }
            let mut agent = self.agents.remove(index);
            let killer = agent.killer.get_or_insert(Killer::Starvation).clone();
            if let Err(err) = self.grid.remove_occupant(agent.position, agent.id) {
                error!(agent = %agent.name, %err, "dead agent was off the grid");
            }
            self.roster.remove(agent.id);

            info!(agent = %agent.name, %killer, lifetime = agent.lifetime, "agent died");
            events.push(Event::new(
                self.tick,
                EventPayload::Died {
                    agent: agent.occupant(),
                    name: agent.name.clone(),
                    killer,
                    lifetime: agent.lifetime,
                },
            ));
            self.graveyard.push(agent);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
