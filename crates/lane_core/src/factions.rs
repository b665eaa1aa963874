//! Faction definitions and hostility rules.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// The two sides of a lane battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Human-controlled side. Its base sits on the left edge and its units
    /// march right.
    Player,
    /// Computer-controlled side. Its base sits on the right edge and its
    /// units march left.
    Enemy,
}

impl Faction {
    /// Both factions, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Enemy];

    /// The opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Whether an entity of `other` is a valid target for this faction.
    #[must_use]
    pub const fn is_hostile_to(self, other: Self) -> bool {
        !matches!(
            (self, other),
            (Self::Player, Self::Player) | (Self::Enemy, Self::Enemy)
        )
    }

    /// Facing direction of this faction's agents along the lane.
    #[must_use]
    pub const fn facing(self) -> Vec2Fixed {
        match self {
            Self::Player => Vec2Fixed::RIGHT,
            Self::Enemy => Vec2Fixed::LEFT,
        }
    }

    /// Display name used in logs and reports.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Enemy => "Enemy",
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostility_is_symmetric_and_irreflexive() {
        assert!(Faction::Player.is_hostile_to(Faction::Enemy));
        assert!(Faction::Enemy.is_hostile_to(Faction::Player));
        assert!(!Faction::Player.is_hostile_to(Faction::Player));
        assert!(!Faction::Enemy.is_hostile_to(Faction::Enemy));
    }

    #[test]
    fn test_factions_face_each_other() {
        let sum = Faction::Player.facing() + Faction::Enemy.facing();
        assert_eq!(sum, Vec2Fixed::ZERO);
        assert_eq!(Faction::Player.opponent(), Faction::Enemy);
    }
}
