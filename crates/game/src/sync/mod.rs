mod clock;
mod frame_queue;
mod lockstep;
mod reconnect;

pub use clock::SchedulerClock;
pub use frame_queue::{BufferState, FrameQueue};
pub use lockstep::{Lockstep, TickReport};
pub use reconnect::{ReconnectController, ResumeKind, ResumeMode};
