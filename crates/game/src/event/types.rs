use crate::entity::ProjectileId;
use crate::net::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPriority {
    /// May be evicted from a full queue.
    Transient,
    /// Never evicted.
    Critical,
}

impl EventPriority {
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DespawnCause {
    Hit,
    LeftArena,
}

/// Notifications for the presentation and match-lifecycle layers.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    Countdown {
        seconds: u32,
    },
    ProjectileSpawned {
        projectile: ProjectileId,
        source: PlayerId,
    },
    ProjectileDespawned {
        projectile: ProjectileId,
        cause: DespawnCause,
    },
    HitPointsChanged {
        combatant: PlayerId,
        hit_points: u32,
    },
    MatchOver {
        winner: PlayerId,
        loser: PlayerId,
    },
    ReconnectStarted {
        rejoin: bool,
    },
    ReconnectCompleted {
        frame_id: u32,
        executed: u64,
    },
    ReconnectAbandoned,
}

impl MatchEvent {
    pub fn priority(&self) -> EventPriority {
        match self {
            Self::HitPointsChanged { .. } => EventPriority::Critical,
            Self::MatchOver { .. } => EventPriority::Critical,
            Self::ReconnectStarted { .. } => EventPriority::Critical,
            Self::ReconnectCompleted { .. } => EventPriority::Critical,
            Self::ReconnectAbandoned => EventPriority::Critical,

            Self::Countdown { .. } => EventPriority::Transient,
            Self::ProjectileSpawned { .. } => EventPriority::Transient,
            Self::ProjectileDespawned { .. } => EventPriority::Transient,
        }
    }
}
