//! Mobile combat agents.
//!
//! Melee and ranged agents share one type; [`CombatMode`] carries the
//! difference. An agent owns its movement and combat bookkeeping, while the
//! decisions that need to look at other entities live in
//! [`crate::systems`].

use serde::{Deserialize, Serialize};

use crate::components::{AgentState, AttackTimer, CombatMode, EntityId, Health, Target};
use crate::data::UnitData;
use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// A unit walking one lane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    id: EntityId,
    unit: String,
    faction: Faction,
    lane: usize,
    #[serde(with = "fixed_serde")]
    lane_y: Fixed,
    position: Vec2Fixed,
    facing: Vec2Fixed,
    #[serde(with = "fixed_serde")]
    speed: Fixed,
    health: Health,
    damage: u32,
    cost: u32,
    combat: CombatMode,
    timer: AttackTimer,
    state: AgentState,
    target: Option<Target>,
}

impl Agent {
    /// Build an agent from a unit template at `spawn_x` in a lane.
    #[must_use]
    pub fn from_data(
        id: EntityId,
        data: &UnitData,
        faction: Faction,
        lane: usize,
        lane_y: Fixed,
        spawn_x: Fixed,
    ) -> Self {
        Self {
            id,
            unit: data.id.clone(),
            faction,
            lane,
            lane_y,
            position: Vec2Fixed::new(spawn_x, lane_y),
            facing: faction.facing(),
            speed: data.speed,
            health: Health::new(data.health),
            damage: data.damage,
            cost: data.cost,
            combat: data.combat_mode(),
            timer: AttackTimer::new(data.attack_interval),
            state: AgentState::Advancing,
            target: None,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Unit id from the roster.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Owning faction.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Lane index.
    #[must_use]
    pub const fn lane(&self) -> usize {
        self.lane
    }

    /// The y coordinate this agent is pinned to.
    #[must_use]
    pub const fn lane_y(&self) -> Fixed {
        self.lane_y
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Unit facing vector.
    #[must_use]
    pub const fn facing(&self) -> Vec2Fixed {
        self.facing
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> Fixed {
        self.speed
    }

    /// Current and maximum health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Damage per attack.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Spawn price.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Melee or ranged.
    #[must_use]
    pub const fn combat(&self) -> CombatMode {
        self.combat
    }

    /// Attack cadence.
    #[must_use]
    pub const fn timer(&self) -> AttackTimer {
        self.timer
    }

    /// Logical state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Current combat target.
    #[must_use]
    pub const fn target(&self) -> Option<Target> {
        self.target
    }

    /// Check if health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Restore the pinned lane coordinate.
    pub fn pin_lane(&mut self) {
        self.position.y = self.lane_y;
    }

    /// Apply damage. Returns the health actually removed.
    ///
    /// Reaching zero moves the agent to [`AgentState::Dead`] and drops any
    /// target; removal happens at the end of the tick.
    pub fn take_damage(&mut self, amount: i32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let dealt = self.health.apply_damage(amount);
        if self.health.is_dead() {
            self.state = AgentState::Dead;
            self.target = None;
        }
        dealt
    }

    /// Lock onto a target. The first attack is due immediately.
    pub fn engage(&mut self, target: Target) {
        self.target = Some(target);
        self.state = target.engaged_state();
        self.timer.prime();
    }

    /// Drop the current target and go back to advancing.
    pub fn disengage(&mut self) -> Option<Target> {
        let previous = self.target.take();
        if self.is_alive() {
            self.state = AgentState::Advancing;
        }
        previous
    }

    /// Halt behind a friendly.
    pub fn block(&mut self) {
        self.state = AgentState::BlockedByFriendly;
    }

    /// Walk forward for `dt` seconds.
    pub fn advance(&mut self, dt: Fixed) {
        self.state = AgentState::Advancing;
        let step = self.speed.saturating_mul(dt);
        self.position.x = self
            .position
            .x
            .saturating_add(self.facing.x.saturating_mul(step));
        self.pin_lane();
    }

    /// Check the attack timer and, if an attack is due, consume it.
    ///
    /// The timer then advances by `dt` either way.
    pub fn try_attack(&mut self, dt: Fixed) -> bool {
        let ready = self.timer.is_ready();
        if ready {
            self.timer.consume();
        }
        self.timer.advance(dt);
        ready
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            unit: self.unit.clone(),
            faction: self.faction,
            lane: self.lane,
            position: self.position,
            facing: self.facing,
            state: self.state,
            health: self.health,
            ranged: self.combat.is_ranged(),
        }
    }
}

/// What a renderer needs to draw an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    /// Agent id.
    pub id: EntityId,
    /// Unit id from the roster.
    pub unit: String,
    /// Owning faction.
    pub faction: Faction,
    /// Lane index.
    pub lane: usize,
    /// Position.
    pub position: Vec2Fixed,
    /// Facing vector.
    pub facing: Vec2Fixed,
    /// Logical state.
    pub state: AgentState,
    /// Health.
    pub health: Health,
    /// Whether the agent fights at range.
    pub ranged: bool,
}
