//! Component definitions shared by agents, structures and projectiles.
//!
//! Components are plain data. Behaviour lives in [`crate::agent`],
//! [`crate::systems`] and [`crate::simulation`].

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, TIME_EPSILON};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Health component for damageable entities.
///
/// `current` is always within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning the amount actually removed.
    ///
    /// Zero or negative amounts are ignored. Health saturates at zero.
    pub fn apply_damage(&mut self, amount: i32) -> u32 {
        let Ok(amount) = u32::try_from(amount) else {
            return 0;
        };
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (self.current * 100) / self.max
        }
    }
}

/// How an agent resolves combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatMode {
    /// Contact-range fighter. Detects through a short probe ahead of itself
    /// and damages its target directly. Halted by friendlies ahead.
    Melee,
    /// Detects inside a forward cone and attacks by firing projectiles.
    /// Never halted by friendlies.
    Ranged {
        /// Detection and firing radius.
        #[serde(with = "fixed_serde")]
        range: Fixed,
        /// Projectile travel speed in world units per second.
        #[serde(with = "fixed_serde")]
        projectile_speed: Fixed,
    },
}

impl CombatMode {
    /// Check if this is a ranged mode.
    #[must_use]
    pub const fn is_ranged(&self) -> bool {
        matches!(self, Self::Ranged { .. })
    }
}

/// Logical state of an agent, exposed for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Walking along the lane.
    Advancing,
    /// Halted behind a friendly melee agent, no target.
    BlockedByFriendly,
    /// Locked onto a hostile agent.
    EngagedWithUnit,
    /// Locked onto the hostile structure.
    EngagedWithStructure,
    /// Health reached zero; awaiting removal.
    Dead,
}

impl AgentState {
    /// Whether this state belongs to the combat sub-machine.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        matches!(self, Self::EngagedWithUnit | Self::EngagedWithStructure)
    }
}

/// The single combat target an agent may hold.
///
/// A unit target and a structure target are mutually exclusive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A hostile agent.
    Unit(EntityId),
    /// The structure owned by this faction.
    Structure(Faction),
}

impl Target {
    /// The engaged state matching this target.
    #[must_use]
    pub const fn engaged_state(&self) -> AgentState {
        match self {
            Self::Unit(_) => AgentState::EngagedWithUnit,
            Self::Structure(_) => AgentState::EngagedWithStructure,
        }
    }
}

/// Periodic attack cadence for an engagement.
///
/// Replaces a suspended attack loop with an accumulator checked every
/// tick: the first attack lands on the tick the engagement starts, later
/// ones every `interval` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackTimer {
    /// Seconds between attacks.
    #[serde(with = "fixed_serde")]
    pub interval: Fixed,
    /// Seconds since the last attack.
    #[serde(with = "fixed_serde")]
    pub since_last_attack: Fixed,
}

impl AttackTimer {
    /// Create a timer that is ready to fire.
    #[must_use]
    pub const fn new(interval: Fixed) -> Self {
        Self {
            interval,
            since_last_attack: interval,
        }
    }

    /// Make the next check fire immediately.
    pub fn prime(&mut self) {
        self.since_last_attack = self.interval;
    }

    /// Check if an attack is due.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.since_last_attack + TIME_EPSILON >= self.interval
    }

    /// Record that an attack was made.
    pub fn consume(&mut self) {
        self.since_last_attack -= self.interval;
        if self.since_last_attack > self.interval {
            // A stall longer than two intervals must not queue a burst.
            self.since_last_attack = Fixed::ZERO;
        }
    }

    /// Advance the timer by `dt` seconds.
    pub fn advance(&mut self, dt: Fixed) {
        self.since_last_attack = self.since_last_attack.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(15);
        assert_eq!(health.apply_damage(10), 10);
        assert_eq!(health.apply_damage(10), 5);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_ignores_non_positive_damage() {
        let mut health = Health::new(20);
        health.apply_damage(5);
        assert_eq!(health.apply_damage(0), 0);
        assert_eq!(health.apply_damage(-7), 0);
        assert_eq!(health.current, 15);
    }

    #[test]
    fn test_health_percentage() {
        let mut health = Health::new(200);
        health.apply_damage(50);
        assert_eq!(health.percentage(), 75);
        assert_eq!(Health::new(0).percentage(), 0);
    }

    #[test]
    fn test_attack_timer_cadence() {
        let dt = ratio(1, 4);
        let mut timer = AttackTimer::new(ratio(1, 2));

        // First attack is immediate
        assert!(timer.is_ready());
        timer.consume();
        timer.advance(dt);
        assert!(!timer.is_ready());

        // Half a second later it fires again
        timer.advance(dt);
        assert!(timer.is_ready());
    }

    #[test]
    fn test_attack_timer_at_twenty_hertz() {
        let dt = ratio(1, 20);
        let mut timer = AttackTimer::new(ratio(1, 2));
        let mut fired_at = Vec::new();
        for step in 0..21 {
            if timer.is_ready() {
                fired_at.push(step);
                timer.consume();
            }
            timer.advance(dt);
        }
        assert_eq!(fired_at, vec![0, 10, 20]);
    }

    #[test]
    fn test_target_variants_map_to_states() {
        assert_eq!(Target::Unit(3).engaged_state(), AgentState::EngagedWithUnit);
        assert_eq!(
            Target::Structure(Faction::Enemy).engaged_state(),
            AgentState::EngagedWithStructure
        );
        assert!(AgentState::EngagedWithUnit.is_engaged());
        assert!(!AgentState::BlockedByFriendly.is_engaged());
    }
}
