//! Simulation events and passive listeners.
//!
//! Every observable change the simulation makes is published as a
//! [`SimEvent`]. Listeners registered on the [`EventBus`] see each event as
//! it happens; the same events are also collected and handed back from
//! [`crate::simulation::Simulation::tick`] as [`TickEvents`]. Listeners get
//! a shared reference only and cannot feed back into the battle.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Target};
use crate::factions::Faction;
use crate::math::Vec2Fixed;

/// Something whose health can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// An agent.
    Agent(EntityId),
    /// The base owned by a faction.
    Structure(Faction),
}

impl From<Target> for Subject {
    fn from(target: Target) -> Self {
        match target {
            Target::Unit(id) => Self::Agent(id),
            Target::Structure(faction) => Self::Structure(faction),
        }
    }
}

/// Why an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementEnd {
    /// The target died or was removed.
    TargetLost,
    /// A ranged attacker's target left its range.
    OutOfRange,
}

/// Observable simulation events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Health of an agent or structure changed.
    HealthChanged {
        /// Whose health changed.
        subject: Subject,
        /// Health after the change.
        current: u32,
        /// Maximum health.
        max: u32,
    },
    /// A base reached zero health. Fires once per base.
    StructureDestroyed {
        /// Owner of the destroyed base.
        faction: Faction,
    },
    /// An agent entered the battle.
    AgentSpawned {
        /// New agent id.
        id: EntityId,
        /// Unit id from the roster.
        unit: String,
        /// Owning faction.
        faction: Faction,
        /// Lane index.
        lane: usize,
    },
    /// An agent died and was removed.
    AgentDied {
        /// Agent id.
        id: EntityId,
        /// Owning faction.
        faction: Faction,
        /// Unit id from the roster.
        unit: String,
    },
    /// The economy was credited for a kill.
    RewardGranted {
        /// The killed agent.
        victim: EntityId,
        /// Amount credited.
        amount: u32,
    },
    /// An agent locked onto a target.
    EngagementStarted {
        /// The attacker.
        agent: EntityId,
        /// What it locked onto.
        target: Target,
    },
    /// An agent dropped its target.
    EngagementEnded {
        /// The attacker.
        agent: EntityId,
        /// The dropped target.
        target: Target,
        /// Why.
        reason: EngagementEnd,
    },
    /// A ranged agent loosed a projectile.
    ProjectileFired {
        /// Projectile id.
        projectile: EntityId,
        /// Firing agent.
        source: EntityId,
        /// Point the projectile flies to.
        target_point: Vec2Fixed,
    },
    /// A projectile delivered its damage.
    ProjectileHit {
        /// Projectile id.
        projectile: EntityId,
        /// What it hit.
        victim: Subject,
        /// Damage actually removed.
        damage: u32,
    },
    /// A projectile resolved without hitting anything.
    ProjectileExpired {
        /// Projectile id.
        projectile: EntityId,
    },
    /// An agent wandered past the world bounds and was removed.
    AgentLeftWorld {
        /// Agent id.
        id: EntityId,
        /// Owning faction.
        faction: Faction,
    },
    /// The match is decided.
    MatchEnded {
        /// Faction whose opponent's base fell.
        winner: Faction,
    },
}

/// Passive observer of simulation events.
pub trait SimListener: Send {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &SimEvent);
}

impl<F> SimListener for F
where
    F: FnMut(&SimEvent) + Send,
{
    fn on_event(&mut self, event: &SimEvent) {
        self(event);
    }
}

/// Events produced by one tick, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// The events.
    pub events: Vec<SimEvent>,
}

impl TickEvents {
    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate events in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    /// Ids of agents that died this tick.
    #[must_use]
    pub fn deaths(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::AgentDied { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Ids of agents spawned this tick.
    #[must_use]
    pub fn spawned(&self) -> Vec<EntityId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::AgentSpawned { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Winner if the match ended this tick.
    #[must_use]
    pub fn winner(&self) -> Option<Faction> {
        self.events.iter().find_map(|event| match event {
            SimEvent::MatchEnded { winner } => Some(*winner),
            _ => None,
        })
    }
}

impl IntoIterator for TickEvents {
    type Item = SimEvent;
    type IntoIter = std::vec::IntoIter<SimEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Fan-out of events to listeners plus a log of the current tick.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn SimListener>>,
    pending: Vec<SimEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: Box<dyn SimListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every listener and record the event.
    pub fn publish(&mut self, event: SimEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.pending.push(event);
    }

    /// Take everything recorded since the last drain.
    pub fn drain(&mut self) -> TickEvents {
        TickEvents {
            events: std::mem::take(&mut self.pending),
        }
    }
}
