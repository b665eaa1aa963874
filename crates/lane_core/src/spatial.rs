//! Lane-bucketed spatial index.
//!
//! Agents never leave their lane, so a flat list per lane sorted by x is
//! enough to answer radius queries: a binary search finds the x window and
//! a distance check trims the corners. The index is rebuilt from scratch at
//! fixed points of the tick, so it never holds stale ids across ticks.

use crate::components::EntityId;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};

/// One indexed agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Agent id.
    pub id: EntityId,
    /// Owning faction.
    pub faction: Faction,
    /// Position when the index was built.
    pub position: Vec2Fixed,
}

/// A query hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nearby {
    /// The indexed agent.
    pub entry: IndexEntry,
    /// Squared distance from the query centre.
    pub distance_squared: Fixed,
}

#[derive(Debug, Clone, Default)]
struct LaneBucket {
    y: Fixed,
    entries: Vec<IndexEntry>,
}

/// Per-lane sorted agent lists.
#[derive(Debug, Clone, Default)]
pub struct LaneIndex {
    lanes: Vec<LaneBucket>,
}

impl LaneIndex {
    /// Create an empty index for lanes at the given y coordinates.
    #[must_use]
    pub fn new(lane_ys: impl IntoIterator<Item = Fixed>) -> Self {
        Self {
            lanes: lane_ys
                .into_iter()
                .map(|y| LaneBucket {
                    y,
                    entries: Vec::new(),
                })
                .collect(),
        }
    }

    /// Replace the contents with `(lane, entry)` pairs.
    ///
    /// Entries naming a lane the index does not know are dropped.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (usize, IndexEntry)>) {
        for bucket in &mut self.lanes {
            bucket.entries.clear();
        }
        for (lane, entry) in entries {
            if let Some(bucket) = self.lanes.get_mut(lane) {
                bucket.entries.push(entry);
            }
        }
        for bucket in &mut self.lanes {
            bucket
                .entries
                .sort_unstable_by(|a, b| a.position.x.cmp(&b.position.x).then(a.id.cmp(&b.id)));
        }
    }

    /// Entries of one lane in x order.
    #[must_use]
    pub fn lane_entries(&self, lane: usize) -> &[IndexEntry] {
        self.lanes
            .get(lane)
            .map_or(&[][..], |bucket| bucket.entries.as_slice())
    }

    /// Total number of indexed agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.iter().map(|bucket| bucket.entries.len()).sum()
    }

    /// Check if no agent is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Agents within `radius` of `center` accepted by `filter`.
    ///
    /// Results are ordered by distance to `center`, ties by lower id.
    pub fn find_nearby(
        &self,
        center: Vec2Fixed,
        radius: Fixed,
        mut filter: impl FnMut(&IndexEntry) -> bool,
    ) -> Vec<Nearby> {
        if radius < Fixed::ZERO {
            return Vec::new();
        }
        let radius_sq = radius.saturating_mul(radius);
        let min_x = center.x.saturating_sub(radius);
        let max_x = center.x.saturating_add(radius);

        let mut hits = Vec::new();
        for bucket in &self.lanes {
            if (bucket.y - center.y).abs() > radius {
                continue;
            }
            let start = bucket.entries.partition_point(|e| e.position.x < min_x);
            for entry in &bucket.entries[start..] {
                if entry.position.x > max_x {
                    break;
                }
                let distance_squared = entry.position.distance_squared(center);
                if distance_squared <= radius_sq && filter(entry) {
                    hits.push(Nearby {
                        entry: *entry,
                        distance_squared,
                    });
                }
            }
        }

        hits.sort_unstable_by(|a, b| {
            a.distance_squared
                .cmp(&b.distance_squared)
                .then(a.entry.id.cmp(&b.entry.id))
        });
        hits
    }

    /// The closest agent accepted by `filter`, if any.
    pub fn closest(
        &self,
        center: Vec2Fixed,
        radius: Fixed,
        filter: impl FnMut(&IndexEntry) -> bool,
    ) -> Option<Nearby> {
        self.find_nearby(center, radius, filter).into_iter().next()
    }
}
