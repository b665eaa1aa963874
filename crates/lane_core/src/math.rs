//! Fixed-point math utilities for deterministic simulation.
//!
//! All lane simulation uses fixed-point arithmetic so that two runs with
//! the same seed and the same inputs produce bit-identical battles.
//! Floating-point values never enter the tick loop.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Slack used when comparing accumulated time against a threshold.
///
/// Tick lengths such as `1/20` are not exactly representable, so a sum of
/// twenty ticks lands a few ulps short of one second.
pub const TIME_EPSILON: Fixed = Fixed::from_bits(1 << 12);

/// Largest world coordinate or distance a configuration may use.
///
/// Keeps squared distances between any two configured points inside the
/// fixed-point range.
pub const WORLD_LIMIT: Fixed = Fixed::from_bits(10_000 << 32);

/// Build an exact fixed-point ratio `num / den`.
///
/// Used for tuning constants such as `0.3` without going through floats.
#[must_use]
pub fn ratio(num: i32, den: i32) -> Fixed {
    Fixed::from_num(num) / Fixed::from_num(den)
}

/// Fixed-point 2D vector.
///
/// `x` is the movement axis along a lane, `y` is the lane axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers in simulation state.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// so snapshots restore to exactly the same state.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers in hand-written config files.
///
/// Values are written as decimal strings (`"0.5"`) and parsed exactly,
/// which keeps RON files readable without routing through floats.
pub mod decimal_serde {
    use super::Fixed;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal string.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Deserialize a fixed-point number from a decimal string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.trim().parse::<Fixed>().map_err(D::Error::custom)
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Unit vector pointing along +x.
    pub const RIGHT: Self = Self {
        x: Fixed::ONE,
        y: Fixed::ZERO,
    };

    /// Unit vector pointing along -x.
    pub const LEFT: Self = Self {
        x: Fixed::NEG_ONE,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Normalize vector using fixed-point math.
    ///
    /// Returns the zero vector for zero-length input. Axis-aligned input
    /// maps to an exact unit axis.
    #[must_use]
    pub fn normalize(self) -> Self {
        if self.y == Fixed::ZERO {
            return Self::new(self.x.signum(), Fixed::ZERO);
        }
        if self.x == Fixed::ZERO {
            return Self::new(Fixed::ZERO, self.y.signum());
        }
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Cosine of the angle between `self - origin` and `facing`.
    ///
    /// Both vectors are normalized first; a zero offset yields zero, which
    /// never counts as "ahead". Always within `[-1, 1]`.
    #[must_use]
    pub fn alignment_from(self, origin: Self, facing: Self) -> Fixed {
        (self - origin)
            .normalize()
            .dot(facing.normalize())
            .clamp(Fixed::NEG_ONE, Fixed::ONE)
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub(crate) fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE {
        value
    } else {
        Fixed::ONE
    };

    for _ in 0..48 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    #[test]
    fn test_distance_is_pythagorean() {
        let a = v(3, 0);
        let b = v(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));

        let epsilon = ratio(1, 10_000);
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_ratio_is_exact_for_binary_fractions() {
        assert_eq!(ratio(1, 2), Fixed::from_num(0.5));
        assert_eq!(ratio(3, 2) * Fixed::from_num(2), Fixed::from_num(3));
    }

    #[test]
    fn test_twenty_ticks_reach_one_second_within_epsilon() {
        let dt = ratio(1, 20);
        let mut elapsed = Fixed::ZERO;
        for _ in 0..20 {
            elapsed += dt;
        }
        assert!(elapsed <= Fixed::ONE);
        assert!(elapsed + TIME_EPSILON >= Fixed::ONE);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_alignment_ahead_and_behind() {
        let origin = v(0, 0);
        let ahead = v(4, 0);
        let behind = v(-4, 0);

        assert_eq!(ahead.alignment_from(origin, Vec2Fixed::RIGHT), Fixed::ONE);
        assert_eq!(
            behind.alignment_from(origin, Vec2Fixed::RIGHT),
            Fixed::NEG_ONE
        );
        assert_eq!(origin.alignment_from(origin, Vec2Fixed::RIGHT), Fixed::ZERO);
    }

    #[test]
    fn test_alignment_stays_within_unit_range() {
        let origin = v(0, 0);
        let offsets = [v(3, 0), v(0, -7), v(5, 5), v(-2, 9), v(1, 1000), v(-640, -3)];
        let facings = [Vec2Fixed::RIGHT, Vec2Fixed::LEFT, v(2, 1), v(-1, 3)];
        for point in offsets {
            for facing in facings {
                let cos = point.alignment_from(origin, facing);
                assert!(cos >= Fixed::NEG_ONE && cos <= Fixed::ONE, "{point:?} {facing:?}");
            }
        }
        assert_eq!(
            v(0, 5).alignment_from(origin, v(0, 2)),
            Fixed::ONE
        );
    }

    #[test]
    fn test_far_apart_points_saturate() {
        let far = Vec2Fixed::new(Fixed::MAX, Fixed::MAX);
        let near = Vec2Fixed::new(Fixed::MIN, Fixed::ZERO);
        assert_eq!(far.distance_squared(near), Fixed::MAX);
        assert_eq!(far.dot(far), Fixed::MAX);
        assert_eq!((far - near).x, Fixed::MAX);
        assert!(far.distance(near) > Fixed::from_num(40_000));
        let cos = far.alignment_from(near, Vec2Fixed::RIGHT);
        assert!(cos >= Fixed::NEG_ONE && cos <= Fixed::ONE);
    }

    #[test]
    fn test_alignment_diagonal_is_below_half() {
        // 45 degrees off the facing axis: cos = ~0.707
        let diagonal = v(1, 1).alignment_from(v(0, 0), Vec2Fixed::RIGHT);
        assert!(diagonal > ratio(1, 2));
        // Steeper than 60 degrees falls under the blocking threshold
        let steep = v(1, 3).alignment_from(v(0, 0), Vec2Fixed::RIGHT);
        assert!(steep < ratio(1, 2));
    }

    #[test]
    fn test_decimal_serde_round_trip() {
        #[derive(Serialize, Deserialize)]
        struct Tuning {
            #[serde(with = "decimal_serde")]
            radius: Fixed,
        }

        let parsed: Tuning = ron::from_str("(radius: \"0.25\")").unwrap();
        assert_eq!(parsed.radius, ratio(1, 4));

        let text = ron::to_string(&parsed).unwrap();
        let again: Tuning = ron::from_str(&text).unwrap();
        assert_eq!(again.radius, parsed.radius);
    }
}
