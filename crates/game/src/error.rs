use crate::net::PlayerId;

/// Problems the core recovers from locally. None of them stop the scheduler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("command references unknown combatant {actor}")]
    UnknownActor { actor: PlayerId },
    #[error("combatant {id} is already registered")]
    DuplicateCombatant { id: PlayerId },
    #[error("heading {heading} from {actor} is not a finite angle")]
    InvalidHeading { actor: PlayerId, heading: f32 },
    #[error("match is over; command from {actor} ignored")]
    MatchOver { actor: PlayerId },
}
