//! Projectiles fired by ranged agents.
//!
//! A projectile flies straight at a point captured when it was fired. It is
//! not re-aimed; whoever stands at the point on arrival takes the hit.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, Vec2Fixed, TIME_EPSILON};

/// A short-lived damage carrier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    id: EntityId,
    source: EntityId,
    faction: Faction,
    position: Vec2Fixed,
    target_point: Vec2Fixed,
    #[serde(with = "fixed_serde")]
    speed: Fixed,
    damage: u32,
    #[serde(with = "fixed_serde")]
    age: Fixed,
}

impl Projectile {
    /// Create a projectile at `origin` flying to `target_point`.
    #[must_use]
    pub const fn new(
        id: EntityId,
        source: EntityId,
        faction: Faction,
        origin: Vec2Fixed,
        target_point: Vec2Fixed,
        speed: Fixed,
        damage: u32,
    ) -> Self {
        Self {
            id,
            source,
            faction,
            position: origin,
            target_point,
            speed,
            damage,
            age: Fixed::ZERO,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Agent that fired it.
    #[must_use]
    pub const fn source(&self) -> EntityId {
        self.source
    }

    /// Faction of the shooter.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Aim point fixed at fire time.
    #[must_use]
    pub const fn target_point(&self) -> Vec2Fixed {
        self.target_point
    }

    /// Damage payload.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Seconds in flight.
    #[must_use]
    pub const fn age(&self) -> Fixed {
        self.age
    }

    /// Fly toward the aim point for `dt` seconds without overshooting.
    pub fn step(&mut self, dt: Fixed) {
        self.age = self.age.saturating_add(dt);

        let remaining = self.target_point - self.position;
        let distance = remaining.length();
        let travel = self.speed.saturating_mul(dt);
        if travel >= distance {
            self.position = self.target_point;
        } else {
            self.position = self.position + remaining.normalize().scale(travel);
        }
    }

    /// Whether the aim point is within `threshold`.
    #[must_use]
    pub fn has_arrived(&self, threshold: Fixed) -> bool {
        self.position.distance_squared(self.target_point) <= threshold.saturating_mul(threshold)
    }

    /// Whether the projectile outlived `lifetime` seconds.
    #[must_use]
    pub fn is_expired(&self, lifetime: Fixed) -> bool {
        self.age + TIME_EPSILON >= lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    fn arrow(target_x: i32) -> Projectile {
        Projectile::new(
            10,
            1,
            Faction::Player,
            Vec2Fixed::ZERO,
            Vec2Fixed::new(Fixed::from_num(target_x), Fixed::ZERO),
            Fixed::from_num(10),
            4,
        )
    }

    #[test]
    fn test_step_moves_toward_point() {
        let mut projectile = arrow(3);
        projectile.step(ratio(1, 10));
        assert!((projectile.position().x - Fixed::ONE).abs() < ratio(1, 1000));
        assert_eq!(projectile.position().y, Fixed::ZERO);
        assert!(!projectile.has_arrived(ratio(1, 5)));
    }

    #[test]
    fn test_step_never_overshoots() {
        let mut projectile = arrow(3);
        for _ in 0..5 {
            projectile.step(ratio(1, 10));
        }
        assert_eq!(projectile.position(), projectile.target_point());
        assert!(projectile.has_arrived(ratio(1, 5)));
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut projectile = arrow(1000);
        for _ in 0..99 {
            projectile.step(ratio(1, 20));
        }
        assert!(!projectile.is_expired(Fixed::from_num(5)));
        projectile.step(ratio(1, 20));
        assert!(projectile.is_expired(Fixed::from_num(5)));
    }
}
