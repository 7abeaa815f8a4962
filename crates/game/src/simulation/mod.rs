mod collision;
mod command;
mod world;

pub use collision::{arbitrate, circles_overlap, CollisionReport};
pub use command::{CommandProcessor, Decoded};
pub use world::{
    CombatantSnapshot, MatchContext, MatchOutcome, MatchResult, RejoinSnapshot,
};
