//! Simulation systems.
//!
//! Everything here reads the battle through a [`WorldView`] and returns a
//! decision; the simulation applies it. Keeping the queries pure lets each
//! agent's step be split into a read phase and a write phase without
//! aliasing the entity storage.

use crate::agent::Agent;
use crate::components::{CombatMode, EntityId, Target};
use crate::data::DetectionTuning;
use crate::edge::EdgeDetector;
use crate::events::Subject;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::projectile::Projectile;
use crate::simulation::EntityStorage;
use crate::spatial::LaneIndex;
use crate::structure::Bases;

/// Read-only view of the battle used by detection and resolution.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    /// Live agents.
    pub agents: &'a EntityStorage<Agent>,
    /// Spatial index built this tick.
    pub index: &'a LaneIndex,
    /// Both bases.
    pub bases: &'a Bases,
    /// Screen-edge resolver.
    pub edge: &'a EdgeDetector,
    /// Proximity tuning.
    pub detection: &'a DetectionTuning,
}

impl WorldView<'_> {
    /// Check if `id` names an agent that is still alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.agents.get(id).is_some_and(Agent::is_alive)
    }

    /// Live position of an agent.
    #[must_use]
    pub fn agent_position(&self, id: EntityId) -> Option<Vec2Fixed> {
        self.agents.get(id).map(Agent::position)
    }
}

/// Outcome of a proximity scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detection {
    /// Target to lock onto, if any.
    pub target: Option<Target>,
    /// A friendly stands ahead. Only melee agents report this.
    pub blocked: bool,
}

/// Scan for a target according to the agent's combat mode.
#[must_use]
pub fn detect(agent: &Agent, world: &WorldView<'_>) -> Detection {
    match agent.combat() {
        CombatMode::Melee => detect_melee(agent, world),
        CombatMode::Ranged { range, .. } => detect_ranged(agent, range, world),
    }
}

/// Probe a small circle just ahead of the agent.
///
/// The closest living hostile wins. A living friendly inside the probe and
/// ahead of the agent blocks it. With no hostile agent found, the hostile
/// base is taken if the probe touches its collider or the agent has reached
/// the screen edge in front of it.
#[must_use]
pub fn detect_melee(agent: &Agent, world: &WorldView<'_>) -> Detection {
    let tuning = world.detection;
    let origin = agent.position();
    let center = origin + agent.facing().scale(tuning.probe_distance);

    let mut detection = Detection::default();
    for hit in world
        .index
        .find_nearby(center, tuning.probe_radius, |e| e.id != agent.id())
    {
        if !world.is_alive(hit.entry.id) {
            continue;
        }
        if hit.entry.faction == agent.faction() {
            let alignment = hit.entry.position.alignment_from(origin, agent.facing());
            if alignment > tuning.block_alignment {
                detection.blocked = true;
            }
        } else if detection.target.is_none() {
            detection.target = Some(Target::Unit(hit.entry.id));
        }
    }

    if detection.target.is_none() {
        let hostile = agent.faction().opponent();
        let base = world.bases.get(hostile);
        let touching = base.overlaps(center, tuning.probe_radius);
        if !base.is_destroyed() && (touching || reached_edge(agent, world.edge)) {
            detection.target = Some(Target::Structure(hostile));
        }
    }

    detection
}

/// Scan a forward cone of radius `range`.
///
/// Picks the closest living hostile whose direction is within the cone,
/// then falls back to the hostile base. Ranged agents are never blocked.
#[must_use]
pub fn detect_ranged(agent: &Agent, range: Fixed, world: &WorldView<'_>) -> Detection {
    let cone = world.detection.ranged_cone_alignment;
    let origin = agent.position();
    let facing = agent.facing();

    let unit = world
        .index
        .find_nearby(origin, range, |e| {
            e.faction != agent.faction() && e.id != agent.id()
        })
        .into_iter()
        .find(|hit| {
            world.is_alive(hit.entry.id)
                && hit.entry.position.alignment_from(origin, facing) > cone
        })
        .map(|hit| Target::Unit(hit.entry.id));

    let target = unit.or_else(|| {
        let hostile = agent.faction().opponent();
        let base = world.bases.get(hostile);
        if base.is_destroyed() {
            return None;
        }
        let point = base.closest_point(origin);
        let in_cone = origin.distance_squared(point) <= range.saturating_mul(range)
            && point.alignment_from(origin, facing) > cone;
        (in_cone || reached_edge(agent, world.edge)).then_some(Target::Structure(hostile))
    });

    Detection {
        target,
        blocked: false,
    }
}

fn reached_edge(agent: &Agent, edge: &EdgeDetector) -> bool {
    edge.reached_hostile_edge(agent.faction(), agent.position().x)
        == Some(agent.faction().opponent())
}

/// Whether a held target can still be attacked.
#[must_use]
pub fn target_is_valid(target: Target, world: &WorldView<'_>) -> bool {
    match target {
        Target::Unit(id) => world.is_alive(id),
        Target::Structure(faction) => !world.bases.get(faction).is_destroyed(),
    }
}

/// Where an attacker at `from` should aim to hit `target` right now.
#[must_use]
pub fn aim_point(from: Vec2Fixed, target: Target, world: &WorldView<'_>) -> Option<Vec2Fixed> {
    match target {
        Target::Unit(id) => world.agent_position(id),
        Target::Structure(faction) => Some(world.bases.get(faction).closest_point(from)),
    }
}

/// The hostile a projectile touches within `radius` of its position.
///
/// Living agents are preferred, closest first; the hostile base counts if
/// its collider is within reach.
#[must_use]
pub fn projectile_victim(
    projectile: &Projectile,
    radius: Fixed,
    world: &WorldView<'_>,
) -> Option<Subject> {
    let hostile: Faction = projectile.faction().opponent();
    let position = projectile.position();

    world
        .index
        .find_nearby(position, radius, |e| e.faction == hostile)
        .into_iter()
        .find(|hit| world.is_alive(hit.entry.id))
        .map(|hit| Subject::Agent(hit.entry.id))
        .or_else(|| {
            let base = world.bases.get(hostile);
            (!base.is_destroyed() && base.overlaps(position, radius))
                .then_some(Subject::Structure(hostile))
        })
}
