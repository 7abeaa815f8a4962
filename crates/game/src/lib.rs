pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod net;
pub mod simulation;
pub mod sync;

pub use config::{ArenaConfig, SyncConfig, DEFAULT_JITTER_THRESHOLD, DEFAULT_TICK_RATE};
pub use entity::{Combatant, CombatantProfile, PresentationLink, Projectile, ProjectileId};
pub use error::SyncError;
pub use event::{DespawnCause, EventPriority, EventQueue, MatchEvent, PendingEvent};
pub use net::{
    CodecError, CommandKind, DebugOverlay, Delivery, Frame, FrameCommand, FrameLog, LinkConditions,
    LinkEvent, LinkSimulator, PlayerId, Telemetry,
};
pub use simulation::{
    arbitrate, CombatantSnapshot, CommandProcessor, MatchContext, MatchOutcome, MatchResult,
    RejoinSnapshot,
};
pub use sync::{BufferState, Lockstep, ResumeKind, ResumeMode, TickReport};
