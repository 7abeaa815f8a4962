mod protocol;
mod simulator;
mod stats;

pub use protocol::{
    CodecError, CommandKind, Delivery, Frame, FrameCommand, FrameLog, PlayerId, FRAME_LOG_MAGIC,
    FRAME_LOG_VERSION,
};
pub use simulator::{LinkEvent, LinkSimulator};
pub use stats::{DebugOverlay, DelayStats, LinkConditions, Telemetry};
