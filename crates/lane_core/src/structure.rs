//! Faction bases.
//!
//! Each side owns one base placed just past its screen edge. The collider
//! spans every lane, so only the x extent matters for overlap tests.

use serde::{Deserialize, Serialize};

use crate::components::Health;
use crate::edge::EdgeDetector;
use crate::factions::Faction;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Result of damaging a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureHit {
    /// Health actually removed.
    pub dealt: u32,
    /// True only on the hit that took health to zero.
    pub destroyed: bool,
}

/// A stationary health pool that ends the match when emptied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    faction: Faction,
    #[serde(with = "fixed_serde")]
    x: Fixed,
    #[serde(with = "fixed_serde")]
    half_width: Fixed,
    health: Health,
}

impl Structure {
    /// Create a base at full health.
    #[must_use]
    pub const fn new(faction: Faction, x: Fixed, half_width: Fixed, max_health: u32) -> Self {
        Self {
            faction,
            x,
            half_width,
            health: Health::new(max_health),
        }
    }

    /// Owner.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Centre x of the collider.
    #[must_use]
    pub const fn x(&self) -> Fixed {
        self.x
    }

    /// Current and maximum health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Check if health reached zero.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.health.is_dead()
    }

    /// Whether a circle overlaps the collider.
    #[must_use]
    pub fn overlaps(&self, center: Vec2Fixed, radius: Fixed) -> bool {
        center.x.saturating_sub(self.x).abs() <= self.half_width.saturating_add(radius)
    }

    /// The point of the collider closest to `from`, at `from`'s height.
    #[must_use]
    pub fn closest_point(&self, from: Vec2Fixed) -> Vec2Fixed {
        let x = from
            .x
            .clamp(
                self.x.saturating_sub(self.half_width),
                self.x.saturating_add(self.half_width),
            );
        Vec2Fixed::new(x, from.y)
    }

    /// Apply damage, clamping at zero.
    pub fn take_damage(&mut self, amount: i32) -> StructureHit {
        let was_standing = !self.is_destroyed();
        let dealt = self.health.apply_damage(amount);
        StructureHit {
            dealt,
            destroyed: was_standing && self.is_destroyed(),
        }
    }
}

/// Both bases of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bases {
    player: Structure,
    enemy: Structure,
}

impl Bases {
    /// Place both bases past the screen edges.
    #[must_use]
    pub fn new(
        edge: &EdgeDetector,
        half_width: Fixed,
        player_health: u32,
        enemy_health: u32,
    ) -> Self {
        Self {
            player: Structure::new(
                Faction::Player,
                edge.structure_x(Faction::Player),
                half_width,
                player_health,
            ),
            enemy: Structure::new(
                Faction::Enemy,
                edge.structure_x(Faction::Enemy),
                half_width,
                enemy_health,
            ),
        }
    }

    /// Base owned by `faction`.
    #[must_use]
    pub const fn get(&self, faction: Faction) -> &Structure {
        match faction {
            Faction::Player => &self.player,
            Faction::Enemy => &self.enemy,
        }
    }

    /// Mutable base owned by `faction`.
    pub fn get_mut(&mut self, faction: Faction) -> &mut Structure {
        match faction {
            Faction::Player => &mut self.player,
            Faction::Enemy => &mut self.enemy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    #[test]
    fn test_destroyed_reported_once() {
        let mut base = Structure::new(Faction::Enemy, Fixed::from_num(10), ratio(1, 2), 200);
        for _ in 0..39 {
            assert!(!base.take_damage(5).destroyed);
        }
        let hit = base.take_damage(5);
        assert_eq!(hit.dealt, 5);
        assert!(hit.destroyed);
        assert_eq!(base.health().current, 0);

        let after = base.take_damage(10);
        assert_eq!(after.dealt, 0);
        assert!(!after.destroyed);
    }

    #[test]
    fn test_overkill_clamps_to_zero() {
        let mut base = Structure::new(Faction::Player, Fixed::ZERO, ratio(1, 2), 30);
        let hit = base.take_damage(45);
        assert_eq!(hit.dealt, 30);
        assert!(hit.destroyed);
        assert!(base.is_destroyed());
    }

    #[test]
    fn test_overlap_spans_lanes() {
        let base = Structure::new(Faction::Enemy, Fixed::from_num(10), ratio(1, 2), 200);
        let far_lane = Vec2Fixed::new(Fixed::from_num(9), Fixed::from_num(-2));
        assert!(!base.overlaps(far_lane, ratio(3, 10)));
        let touching = Vec2Fixed::new(ratio(93, 10), Fixed::from_num(-2));
        assert!(base.overlaps(touching, ratio(3, 10)));
        assert_eq!(
            base.closest_point(far_lane),
            Vec2Fixed::new(ratio(19, 2), Fixed::from_num(-2))
        );
    }
}
