//! Core simulation loop.
//!
//! The simulation advances in explicit `tick(dt)` steps and processes all
//! battle logic deterministically.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness (spawners draw from seeded generators)
//! - Consistent iteration order (sorted entity IDs)
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use lane_core::data::{BattleConfig, UnitRoster};
//! use lane_core::economy::Wallet;
//! use lane_core::simulation::Simulation;
//!
//! let config = BattleConfig::default();
//! let mut sim = Simulation::new(config, UnitRoster::builtin())
//!     .unwrap()
//!     .with_economy(Box::new(Wallet::new(100)));
//!
//! let footman = sim.request_spawn("footman", 1).unwrap();
//! sim.step();
//! assert!(sim.agent(footman).is_some());
//! assert_eq!(sim.funds(), Some(70));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentView};
use crate::components::{AgentState, CombatMode, EntityId, Target};
use crate::data::{BattleConfig, LaneConfig, UnitData, UnitRoster};
use crate::economy::Economy;
use crate::edge::EdgeDetector;
use crate::error::{GameError, Result, SpawnError};
use crate::events::{EngagementEnd, EventBus, SimEvent, SimListener, Subject, TickEvents};
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::projectile::Projectile;
use crate::spatial::{IndexEntry, LaneIndex};
use crate::spawner::Spawner;
use crate::structure::{Bases, Structure};
use crate::systems::{self, WorldView};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Duration of one tick in seconds.
#[must_use]
pub fn tick_duration() -> Fixed {
    Fixed::ONE / Fixed::from_num(TICK_RATE)
}

fn clamp_damage(amount: u32) -> i32 {
    i32::try_from(amount).unwrap_or(i32::MAX)
}

/// Storage for one kind of entity.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic iteration via
/// sorted keys when processing systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStorage<T> {
    entities: HashMap<EntityId, T>,
}

impl<T> Default for EntityStorage<T> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }
}

impl<T> EntityStorage<T> {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under `id`, replacing any previous one.
    pub fn insert(&mut self, id: EntityId, entity: T) {
        self.entities.insert(id, entity);
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate entities in id order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &T> {
        self.sorted_ids()
            .into_iter()
            .filter_map(move |id| self.entities.get(&id))
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.entities.iter()
    }
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Faction whose opponent's base fell.
    pub winner: Faction,
    /// Tick on which the base fell.
    pub tick: u64,
}

/// Everything a snapshot captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BattleState {
    tick: u64,
    #[serde(with = "crate::math::fixed_serde")]
    elapsed: Fixed,
    next_id: EntityId,
    agents: EntityStorage<Agent>,
    projectiles: EntityStorage<Projectile>,
    bases: Bases,
    spawners: Vec<Spawner>,
    player_units: Vec<EntityId>,
    outcome: Option<MatchOutcome>,
}

/// The lane battle simulation.
///
/// Owns the battle state and drives it one explicit tick at a time.
/// Collaborators are injected: an optional [`Economy`] for spawn gating and
/// kill rewards, and any number of [`SimListener`]s.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Spawners** - Prune dead instances, spawn when due
/// 2. **Agents** - In id order: validate target, detect, attack or move
/// 3. **Projectiles** - Fly, then hit or expire
/// 4. **Cleanup** - Remove dead agents (paying rewards) and strays
#[derive(Debug)]
pub struct Simulation {
    config: BattleConfig,
    roster: UnitRoster,
    edge: EdgeDetector,
    index: LaneIndex,
    state: BattleState,
    economy: Option<Box<dyn Economy>>,
    bus: EventBus,
}

impl Simulation {
    /// Create a simulation from a validated configuration.
    ///
    /// Fails if the configuration is invalid or a spawner names a unit the
    /// roster does not know.
    pub fn new(config: BattleConfig, roster: UnitRoster) -> Result<Self> {
        config.validate()?;
        for unit in roster.iter() {
            unit.validate()?;
        }
        for spawner in &config.enemy_spawners {
            roster.require(&spawner.unit)?;
        }

        let edge = EdgeDetector::new(config.viewport, config.edge_margin);
        let bases = Bases::new(
            &edge,
            config.detection.structure_half_width,
            config.player_base_health,
            config.enemy_base_health,
        );
        let spawners = config
            .enemy_spawners
            .iter()
            .enumerate()
            .map(|(index, spawner)| {
                Spawner::new(spawner.clone(), config.seed.wrapping_add(index as u64))
            })
            .collect();
        let index = LaneIndex::new(config.lanes.iter().map(|lane| lane.y));

        tracing::info!(
            seed = config.seed,
            lanes = config.lanes.len(),
            spawners = config.enemy_spawners.len(),
            "Battle created"
        );

        Ok(Self {
            config,
            roster,
            edge,
            index,
            state: BattleState {
                tick: 0,
                elapsed: Fixed::ZERO,
                next_id: 1,
                agents: EntityStorage::new(),
                projectiles: EntityStorage::new(),
                bases,
                spawners,
                player_units: Vec::new(),
                outcome: None,
            },
            economy: None,
            bus: EventBus::new(),
        })
    }

    /// Attach an economy.
    #[must_use]
    pub fn with_economy(mut self, economy: Box<dyn Economy>) -> Self {
        self.economy = Some(economy);
        self
    }

    /// Replace or remove the economy.
    pub fn set_economy(&mut self, economy: Option<Box<dyn Economy>>) {
        self.economy = economy;
    }

    /// Register a passive listener.
    pub fn subscribe(&mut self, listener: Box<dyn SimListener>) {
        self.bus.subscribe(listener);
    }

    /// The battle configuration.
    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// The unit roster.
    #[must_use]
    pub const fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// The screen-edge resolver.
    #[must_use]
    pub const fn edge(&self) -> &EdgeDetector {
        &self.edge
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.state.tick
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.state.elapsed
    }

    /// All live agents.
    #[must_use]
    pub const fn agents(&self) -> &EntityStorage<Agent> {
        &self.state.agents
    }

    /// One agent.
    #[must_use]
    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.state.agents.get(id)
    }

    /// Projectiles in flight.
    #[must_use]
    pub const fn projectiles(&self) -> &EntityStorage<Projectile> {
        &self.state.projectiles
    }

    /// Base owned by `faction`.
    #[must_use]
    pub const fn structure(&self, faction: Faction) -> &Structure {
        self.state.bases.get(faction)
    }

    /// Automatic spawners.
    #[must_use]
    pub fn spawners(&self) -> &[Spawner] {
        &self.state.spawners
    }

    /// Set once a base falls.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.state.outcome
    }

    /// The attached economy.
    #[must_use]
    pub fn economy(&self) -> Option<&dyn Economy> {
        self.economy.as_deref()
    }

    /// Current balance, if an economy is attached.
    #[must_use]
    pub fn funds(&self) -> Option<i64> {
        self.economy.as_ref().map(|economy| economy.funds())
    }

    /// Number of live agents owned by `faction`.
    #[must_use]
    pub fn agent_count(&self, faction: Faction) -> usize {
        self.state
            .agents
            .iter()
            .filter(|(_, agent)| agent.faction() == faction)
            .count()
    }

    /// Presentation snapshots of every agent in id order.
    #[must_use]
    pub fn agent_views(&self) -> Vec<AgentView> {
        self.state.agents.iter_sorted().map(Agent::view).collect()
    }

    /// Instantiate an agent directly, bypassing economy and caps.
    pub fn spawn_agent(&mut self, unit: &str, faction: Faction, lane: usize) -> Result<EntityId> {
        let lane_config = *self.config.lane(lane).ok_or(GameError::UnknownLane(lane))?;
        let data = self.roster.require(unit)?.clone();
        Ok(self.insert_agent(&data, faction, lane, lane_config))
    }

    /// Spawn a player agent, paying for it through the economy.
    ///
    /// The request is checked against lane, roster, population cap and
    /// funds before anything changes. Without an economy spawns are free.
    pub fn request_spawn(
        &mut self,
        unit: &str,
        lane: usize,
    ) -> std::result::Result<EntityId, SpawnError> {
        let result = self.try_player_spawn(unit, lane);
        if let Err(ref error) = result {
            tracing::warn!(unit, lane, %error, "Spawn request rejected");
        }
        result
    }

    fn try_player_spawn(
        &mut self,
        unit: &str,
        lane: usize,
    ) -> std::result::Result<EntityId, SpawnError> {
        if self.state.outcome.is_some() {
            return Err(SpawnError::MatchOver);
        }
        let lane_config = *self
            .config
            .lane(lane)
            .ok_or(SpawnError::NoSpawnPoint(lane))?;
        let data = self
            .roster
            .get(unit)
            .cloned()
            .ok_or_else(|| SpawnError::UnknownUnit(unit.to_string()))?;

        self.prune_player_units();
        let cap = self.config.player_unit_cap;
        if self.state.player_units.len() >= cap {
            return Err(SpawnError::PopulationCap { cap });
        }

        if let Some(economy) = self.economy.as_mut() {
            if !economy.has_enough_funds(data.cost) || !economy.spend(data.cost) {
                return Err(SpawnError::InsufficientFunds {
                    cost: data.cost,
                    funds: economy.funds(),
                });
            }
        }

        let id = self.insert_agent(&data, Faction::Player, lane, lane_config);
        self.state.player_units.push(id);
        Ok(id)
    }

    fn prune_player_units(&mut self) {
        let agents = &self.state.agents;
        self.state
            .player_units
            .retain(|&id| agents.get(id).is_some_and(Agent::is_alive));
    }

    fn insert_agent(
        &mut self,
        data: &UnitData,
        faction: Faction,
        lane: usize,
        lane_config: LaneConfig,
    ) -> EntityId {
        let id = self.allocate_id();
        let agent = Agent::from_data(
            id,
            data,
            faction,
            lane,
            lane_config.y,
            lane_config.spawn_x(faction),
        );
        self.state.agents.insert(id, agent);

        tracing::info!(id, unit = %data.id, %faction, lane, "Agent spawned");
        self.bus.publish(SimEvent::AgentSpawned {
            id,
            unit: data.id.clone(),
            faction,
            lane,
        });
        id
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.state.next_id;
        self.state.next_id += 1;
        id
    }

    /// Advance one tick of [`tick_duration`] seconds.
    pub fn step(&mut self) -> TickEvents {
        self.tick(tick_duration())
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Returns the events of this tick, including any published by spawn
    /// requests and damage calls made since the previous tick. Once the
    /// match is decided nothing advances any more. Negative `dt` counts as
    /// zero.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        if self.state.outcome.is_some() {
            return self.bus.drain();
        }
        let dt = dt.max(Fixed::ZERO);

        // 1. Spawners
        self.run_spawners(dt);

        // 2. Agents
        self.rebuild_index();
        for id in self.state.agents.sorted_ids() {
            if self.state.outcome.is_some() {
                break;
            }
            self.step_agent(id, dt);
        }

        // 3. Projectiles
        if self.state.outcome.is_none() {
            self.rebuild_index();
            self.run_projectiles(dt);
        }

        // 4. Cleanup
        self.remove_fallen();

        self.state.tick += 1;
        self.state.elapsed = self.state.elapsed.saturating_add(dt);

        #[cfg(feature = "debug-validation")]
        if let Err(error) = self.check_invariants() {
            tracing::error!(tick = self.state.tick, %error, "Simulation invariant broken");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.state.tick, state_hash = hash, "Simulation state hash");
        }

        self.bus.drain()
    }

    fn world(&self) -> WorldView<'_> {
        WorldView {
            agents: &self.state.agents,
            index: &self.index,
            bases: &self.state.bases,
            edge: &self.edge,
            detection: &self.config.detection,
        }
    }

    fn rebuild_index(&mut self) {
        let entries = self.state.agents.iter().filter(|(_, a)| a.is_alive()).map(|(_, a)| {
            (
                a.lane(),
                IndexEntry {
                    id: a.id(),
                    faction: a.faction(),
                    position: a.position(),
                },
            )
        });
        self.index.rebuild(entries);
    }

    fn run_spawners(&mut self, dt: Fixed) {
        let agents = &self.state.agents;
        let mut requests = Vec::new();
        for (index, spawner) in self.state.spawners.iter_mut().enumerate() {
            spawner.prune(|id| agents.get(id).is_some_and(Agent::is_alive));
            if let Some(request) = spawner.tick(dt) {
                requests.push((index, request));
            }
        }

        for (index, request) in requests {
            match self.spawn_agent(&request.unit, request.faction, request.lane) {
                Ok(id) => {
                    if let Some(spawner) = self.state.spawners.get_mut(index) {
                        spawner.track(id);
                    }
                }
                Err(error) => {
                    tracing::warn!(unit = %request.unit, lane = request.lane, %error, "Spawner failed");
                }
            }
        }
    }

    fn step_agent(&mut self, id: EntityId, dt: Fixed) {
        let (lost, detection) = {
            let Some(agent) = self.state.agents.get(id) else {
                return;
            };
            if !agent.is_alive() {
                return;
            }
            let world = self.world();
            let lost = agent
                .target()
                .filter(|&target| !systems::target_is_valid(target, &world));
            let needs_scan = agent.target().is_none() || lost.is_some();
            let detection = needs_scan.then(|| systems::detect(agent, &world));
            (lost, detection)
        };

        let Some(agent) = self.state.agents.get_mut(id) else {
            return;
        };
        agent.pin_lane();

        if let Some(target) = lost {
            agent.disengage();
            tracing::debug!(agent = id, ?target, "Target lost");
            self.bus.publish(SimEvent::EngagementEnded {
                agent: id,
                target,
                reason: EngagementEnd::TargetLost,
            });
        }

        let mut blocked = false;
        if let Some(detection) = detection {
            blocked = detection.blocked;
            if let Some(target) = detection.target {
                if let Some(agent) = self.state.agents.get_mut(id) {
                    agent.engage(target);
                }
                tracing::debug!(agent = id, ?target, "Engagement started");
                self.bus
                    .publish(SimEvent::EngagementStarted { agent: id, target });
            }
        }

        let Some(agent) = self.state.agents.get_mut(id) else {
            return;
        };
        match agent.target() {
            Some(target) => self.resolve_attack(id, target, dt),
            None if blocked => agent.block(),
            None => agent.advance(dt),
        }
    }

    fn resolve_attack(&mut self, id: EntityId, target: Target, dt: Fixed) {
        let Some(agent) = self.state.agents.get_mut(id) else {
            return;
        };
        if !agent.try_attack(dt) {
            return;
        }
        let faction = agent.faction();
        let damage = agent.damage();
        let origin = agent.position();

        match agent.combat() {
            CombatMode::Melee => {
                self.apply_damage(target.into(), clamp_damage(damage));
            }
            CombatMode::Ranged {
                range,
                projectile_speed,
            } => {
                let Some(aim) = systems::aim_point(origin, target, &self.world()) else {
                    return;
                };
                if origin.distance_squared(aim) > range.saturating_mul(range) {
                    if let Some(agent) = self.state.agents.get_mut(id) {
                        agent.disengage();
                    }
                    tracing::debug!(agent = id, ?target, "Target out of range");
                    self.bus.publish(SimEvent::EngagementEnded {
                        agent: id,
                        target,
                        reason: EngagementEnd::OutOfRange,
                    });
                    return;
                }
                self.fire_projectile(id, faction, origin, aim, projectile_speed, damage);
            }
        }
    }

    fn fire_projectile(
        &mut self,
        source: EntityId,
        faction: Faction,
        origin: Vec2Fixed,
        aim: Vec2Fixed,
        speed: Fixed,
        damage: u32,
    ) {
        let id = self.allocate_id();
        self.state.projectiles.insert(
            id,
            Projectile::new(id, source, faction, origin, aim, speed, damage),
        );
        tracing::debug!(projectile = id, source, "Projectile fired");
        self.bus.publish(SimEvent::ProjectileFired {
            projectile: id,
            source,
            target_point: aim,
        });
    }

    /// Deal damage to an agent or base from outside the battle loop.
    ///
    /// Zero or negative amounts change nothing. A dead agent is removed at
    /// the end of the next tick; a base reaching zero ends the match at
    /// once. Returns the health actually removed.
    pub fn take_damage(&mut self, subject: Subject, amount: i32) -> Result<u32> {
        if let Subject::Agent(id) = subject {
            if !self.state.agents.contains(id) {
                return Err(GameError::EntityNotFound(id));
            }
        }
        Ok(self.apply_damage(subject, amount))
    }

    fn apply_damage(&mut self, subject: Subject, amount: i32) -> u32 {
        match subject {
            Subject::Agent(id) => {
                let Some(victim) = self.state.agents.get_mut(id) else {
                    return 0;
                };
                let dealt = victim.take_damage(amount);
                if dealt > 0 {
                    let health = victim.health();
                    self.bus.publish(SimEvent::HealthChanged {
                        subject,
                        current: health.current,
                        max: health.max,
                    });
                }
                dealt
            }
            Subject::Structure(faction) => {
                let base = self.state.bases.get_mut(faction);
                let hit = base.take_damage(amount);
                let health = base.health();
                if hit.dealt > 0 {
                    self.bus.publish(SimEvent::HealthChanged {
                        subject,
                        current: health.current,
                        max: health.max,
                    });
                }
                if hit.destroyed {
                    tracing::info!(%faction, tick = self.state.tick, "Structure destroyed");
                    self.bus.publish(SimEvent::StructureDestroyed { faction });
                    self.declare_winner(faction.opponent());
                }
                hit.dealt
            }
        }
    }

    fn declare_winner(&mut self, winner: Faction) {
        if self.state.outcome.is_some() {
            return;
        }
        self.state.outcome = Some(MatchOutcome {
            winner,
            tick: self.state.tick,
        });
        tracing::info!(%winner, tick = self.state.tick, "Match ended");
        self.bus.publish(SimEvent::MatchEnded { winner });
    }

    fn run_projectiles(&mut self, dt: Fixed) {
        let tuning = self.config.projectiles;

        for id in self.state.projectiles.sorted_ids() {
            if self.state.outcome.is_some() {
                break;
            }
            let Some(projectile) = self.state.projectiles.get_mut(id) else {
                continue;
            };
            projectile.step(dt);
            let projectile = projectile.clone();

            let arrived = projectile.has_arrived(tuning.arrival_threshold);
            let victim = {
                let world = self.world();
                systems::projectile_victim(&projectile, tuning.contact_radius, &world).or_else(
                    || {
                        arrived
                            .then(|| {
                                systems::projectile_victim(
                                    &projectile,
                                    tuning.impact_radius,
                                    &world,
                                )
                            })
                            .flatten()
                    },
                )
            };

            if let Some(victim) = victim {
                self.state.projectiles.remove(id);
                let damage = self.apply_damage(victim, clamp_damage(projectile.damage()));
                tracing::debug!(projectile = id, ?victim, damage, "Projectile hit");
                self.bus.publish(SimEvent::ProjectileHit {
                    projectile: id,
                    victim,
                    damage,
                });
            } else if arrived || projectile.is_expired(tuning.lifetime) {
                self.state.projectiles.remove(id);
                tracing::debug!(projectile = id, arrived, "Projectile expired");
                self.bus
                    .publish(SimEvent::ProjectileExpired { projectile: id });
            }
        }
    }

    fn remove_fallen(&mut self) {
        for id in self.state.agents.sorted_ids() {
            let Some(agent) = self.state.agents.get(id) else {
                continue;
            };
            if !agent.is_alive() {
                self.remove_dead(id);
            } else if self.edge.is_outside_world(agent.position().x) {
                let faction = agent.faction();
                self.state.agents.remove(id);
                tracing::warn!(id, %faction, "Agent left the world");
                self.bus.publish(SimEvent::AgentLeftWorld { id, faction });
            }
        }
    }

    fn remove_dead(&mut self, id: EntityId) {
        let Some(agent) = self.state.agents.remove(id) else {
            return;
        };
        let faction = agent.faction();
        tracing::debug!(id, unit = agent.unit(), %faction, "Agent died");
        self.bus.publish(SimEvent::AgentDied {
            id,
            faction,
            unit: agent.unit().to_string(),
        });

        if faction != Faction::Enemy {
            return;
        }
        let cost = self.roster.get(agent.unit()).map(|data| data.cost);
        let amount = self.config.reward.reward_for(cost);
        match self.economy.as_mut() {
            Some(economy) => {
                economy.reward(amount);
                self.bus
                    .publish(SimEvent::RewardGranted { victim: id, amount });
            }
            None => tracing::debug!(id, amount, "No economy attached, reward dropped"),
        }
    }

    /// Calculate a deterministic hash of the battle state.
    ///
    /// Covers tick, agents, bases, projectiles and outcome in id order.
    /// Two simulations with identical inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.tick.hash(&mut hasher);
        for agent in self.state.agents.iter_sorted() {
            agent.hash(&mut hasher);
        }
        self.state.bases.hash(&mut hasher);
        for projectile in self.state.projectiles.iter_sorted() {
            projectile.hash(&mut hasher);
        }
        self.state.outcome.hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the battle state.
    ///
    /// The economy and listeners are collaborators and are not included.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.state).map_err(|e| GameError::Snapshot(e.to_string()))
    }

    /// Replace the battle state with a snapshot.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        let state: BattleState =
            bincode::deserialize(bytes).map_err(|e| GameError::Snapshot(e.to_string()))?;
        if state.agents.iter().any(|(_, a)| self.config.lane(a.lane()).is_none()) {
            return Err(GameError::Snapshot(
                "snapshot references a lane this battle does not have".to_string(),
            ));
        }
        self.state = state;
        self.rebuild_index();
        Ok(())
    }

    /// Verify the state invariants that must hold between ticks.
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |what: String| Err(GameError::InvariantViolation(what));

        for agent in self.state.agents.iter_sorted() {
            let id = agent.id();
            let health = agent.health();
            if health.current > health.max {
                return fail(format!("agent {id} health {} above max {}", health.current, health.max));
            }
            if !agent.is_alive() || agent.state() == AgentState::Dead {
                return fail(format!("agent {id} is dead but still present"));
            }
            if agent.position().y != agent.lane_y() {
                return fail(format!("agent {id} left its lane"));
            }
            let engaged = agent.state().is_engaged();
            match agent.target() {
                Some(target) if target.engaged_state() != agent.state() => {
                    return fail(format!("agent {id} state does not match its target"));
                }
                None if engaged => {
                    return fail(format!("agent {id} engaged without a target"));
                }
                _ => {}
            }
        }

        for spawner in &self.state.spawners {
            if spawner.tracked().len() > spawner.config().cap {
                return fail(format!("spawner for '{}' exceeds its cap", spawner.config().unit));
            }
        }

        for faction in Faction::ALL {
            let health = self.state.bases.get(faction).health();
            if health.current > health.max {
                return fail(format!("{faction} base health above max"));
            }
        }

        Ok(())
    }
}
