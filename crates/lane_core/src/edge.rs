//! Screen-edge resolution for the invisible bases.
//!
//! Bases sit just past the visible edges of the battlefield and span every
//! lane. Rather than relying on collider overlap alone, an agent counts as
//! having reached the hostile base once its screen-space distance to that
//! edge falls within the configured margin.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{decimal_serde, Fixed};

/// The visible slice of the world along the movement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// World x of the left screen edge.
    #[serde(with = "decimal_serde")]
    pub left: Fixed,
    /// World x of the right screen edge.
    #[serde(with = "decimal_serde")]
    pub right: Fixed,
    /// Screen width in pixels.
    pub width_px: u32,
}

impl Viewport {
    /// Create a viewport covering `left..=right` rendered `width_px` wide.
    #[must_use]
    pub const fn new(left: Fixed, right: Fixed, width_px: u32) -> Self {
        Self {
            left,
            right,
            width_px,
        }
    }

    /// World units visible across the screen.
    #[must_use]
    pub fn world_width(&self) -> Fixed {
        self.right.saturating_sub(self.left)
    }

    /// Pixels per world unit.
    #[must_use]
    pub fn pixels_per_unit(&self) -> Fixed {
        let width = self.world_width();
        if width <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        Fixed::saturating_from_num(self.width_px).saturating_div(width)
    }

    /// Map a world x coordinate to a screen x coordinate in pixels.
    #[must_use]
    pub fn world_to_screen_x(&self, x: Fixed) -> Fixed {
        x.saturating_sub(self.left)
            .saturating_mul(self.pixels_per_unit())
    }
}

/// Maps agent positions to "reached the hostile base".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    viewport: Viewport,
    margin: Fixed,
}

impl EdgeDetector {
    /// Create a detector with a world-space margin.
    #[must_use]
    pub const fn new(viewport: Viewport, margin: Fixed) -> Self {
        Self { viewport, margin }
    }

    /// The underlying viewport.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// World-space margin.
    #[must_use]
    pub const fn margin(&self) -> Fixed {
        self.margin
    }

    /// World x where the base owned by `owner` is placed.
    #[must_use]
    pub fn structure_x(&self, owner: Faction) -> Fixed {
        match owner {
            Faction::Player => self.viewport.left.saturating_sub(self.margin),
            Faction::Enemy => self.viewport.right.saturating_add(self.margin),
        }
    }

    /// Screen-space distance in pixels from `x` to the edge holding the
    /// base owned by `owner`. Negative once past the edge.
    #[must_use]
    pub fn edge_distance_px(&self, x: Fixed, owner: Faction) -> Fixed {
        let screen_x = self.viewport.world_to_screen_x(x);
        match owner {
            Faction::Player => screen_x,
            Faction::Enemy => {
                Fixed::saturating_from_num(self.viewport.width_px).saturating_sub(screen_x)
            }
        }
    }

    /// The hostile base an agent of `faction` standing at `x` has reached,
    /// if any.
    #[must_use]
    pub fn reached_hostile_edge(&self, faction: Faction, x: Fixed) -> Option<Faction> {
        let hostile = faction.opponent();
        let margin_px = self.margin.saturating_mul(self.viewport.pixels_per_unit());
        (self.edge_distance_px(x, hostile) <= margin_px).then_some(hostile)
    }

    /// Whether `x` lies beyond either base, where no agent should be.
    #[must_use]
    pub fn is_outside_world(&self, x: Fixed) -> bool {
        let slack = self.margin.saturating_mul(Fixed::from_num(2));
        x < self.structure_x(Faction::Player).saturating_sub(slack)
            || x > self.structure_x(Faction::Enemy).saturating_add(slack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    fn detector() -> EdgeDetector {
        EdgeDetector::new(
            Viewport::new(Fixed::from_num(-10), Fixed::from_num(10), 2000),
            ratio(1, 2),
        )
    }

    #[test]
    fn test_world_to_screen_maps_edges() {
        let viewport = detector().viewport;
        assert_eq!(viewport.world_to_screen_x(Fixed::from_num(-10)), Fixed::ZERO);
        assert_eq!(
            viewport.world_to_screen_x(Fixed::from_num(10)),
            Fixed::from_num(2000)
        );
        assert_eq!(viewport.pixels_per_unit(), Fixed::from_num(100));
    }

    #[test]
    fn test_structures_sit_past_edges() {
        let edge = detector();
        assert_eq!(edge.structure_x(Faction::Player), ratio(-21, 2));
        assert_eq!(edge.structure_x(Faction::Enemy), ratio(21, 2));
    }

    #[test]
    fn test_player_agent_reaches_enemy_edge() {
        let edge = detector();
        assert_eq!(edge.reached_hostile_edge(Faction::Player, Fixed::from_num(9)), None);
        assert_eq!(
            edge.reached_hostile_edge(Faction::Player, ratio(19, 2)),
            Some(Faction::Enemy)
        );
        // Standing at its own edge does not count
        assert_eq!(
            edge.reached_hostile_edge(Faction::Player, Fixed::from_num(-10)),
            None
        );
    }

    #[test]
    fn test_enemy_agent_reaches_player_edge() {
        let edge = detector();
        assert_eq!(
            edge.reached_hostile_edge(Faction::Enemy, ratio(-39, 4)),
            Some(Faction::Player)
        );
        assert_eq!(edge.reached_hostile_edge(Faction::Enemy, Fixed::ZERO), None);
    }

    #[test]
    fn test_outside_world() {
        let edge = detector();
        assert!(!edge.is_outside_world(Fixed::from_num(11)));
        assert!(edge.is_outside_world(Fixed::from_num(12)));
        assert!(edge.is_outside_world(Fixed::from_num(-12)));
    }

    #[test]
    fn test_pixel_width_beyond_fixed_range_saturates() {
        let edge = EdgeDetector::new(
            Viewport::new(Fixed::from_num(-10), Fixed::from_num(10), 3_000_000_000),
            ratio(1, 2),
        );
        assert!(edge.viewport().pixels_per_unit() > Fixed::ZERO);
        assert_eq!(edge.reached_hostile_edge(Faction::Player, Fixed::ZERO), None);
        assert_eq!(
            edge.reached_hostile_edge(Faction::Player, Fixed::from_num(10)),
            Some(Faction::Enemy)
        );
        assert_eq!(
            edge.reached_hostile_edge(Faction::Enemy, Fixed::from_num(-10)),
            Some(Faction::Player)
        );
    }

    #[test]
    fn test_sliver_viewport_does_not_overflow() {
        let sliver = Viewport::new(Fixed::ZERO, Fixed::from_bits(1), u32::MAX);
        assert_eq!(sliver.pixels_per_unit(), Fixed::MAX);
        assert_eq!(sliver.world_to_screen_x(Fixed::from_num(5)), Fixed::MAX);
    }
}
