use crate::net::Delivery;
use crate::simulation::RejoinSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeKind {
    /// Transient link loss: only the missed frames are replayed.
    NetworkDrop,
    /// The local player re-entered the match and receives authoritative
    /// positions before the backlog is replayed.
    Rejoin(RejoinSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    NetworkDrop,
    Rejoin,
}

/// Tracks an in-progress resume. It completes once the transport has
/// delivered a live frame again and execution has reached the target id.
#[derive(Debug, Default)]
pub struct ReconnectController {
    mode: Option<ResumeMode>,
    target_frame_id: Option<u32>,
    signal_pending: bool,
    started_at_ms: u64,
    successes: u32,
    failures: u32,
}

impl ReconnectController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, mode: ResumeMode, now_ms: u64) {
        if self.mode.is_some() {
            log::debug!("resume restarted while one was in progress");
        }
        self.mode = Some(mode);
        self.target_frame_id = None;
        self.signal_pending = true;
        self.started_at_ms = now_ms;
    }

    /// Records the highest frame id the backlog must reach. Only ever raised.
    pub fn set_target(&mut self, frame_id: u32) {
        if self.mode.is_none() {
            return;
        }
        self.target_frame_id = Some(match self.target_frame_id {
            Some(current) => current.max(frame_id),
            None => frame_id,
        });
    }

    pub fn observe(&mut self, delivery: Delivery) {
        if self.mode.is_some() && delivery == Delivery::Live {
            self.signal_pending = false;
        }
    }

    pub fn is_reconnecting(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<ResumeMode> {
        self.mode
    }

    pub fn target_frame_id(&self) -> Option<u32> {
        self.target_frame_id
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Completes the resume if the signal has cleared and `executed_id` has
    /// reached the target.
    pub fn try_complete(&mut self, executed_id: Option<u32>) -> bool {
        if self.mode.is_none() || self.signal_pending {
            return false;
        }
        let reached = match (self.target_frame_id, executed_id) {
            (None, _) => true,
            (Some(target), Some(executed)) => executed >= target,
            (Some(_), None) => false,
        };
        if reached {
            self.mode = None;
            self.target_frame_id = None;
            self.successes += 1;
        }
        reached
    }

    pub fn abandon(&mut self) {
        if self.mode.take().is_some() {
            self.target_frame_id = None;
            self.signal_pending = false;
            self.failures += 1;
        }
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.mode = None;
        self.target_frame_id = None;
        self.signal_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_live_frame_and_target() {
        let mut rc = ReconnectController::new();
        rc.begin(ResumeMode::NetworkDrop, 0);
        rc.set_target(40);

        rc.observe(Delivery::Replay);
        assert!(!rc.try_complete(Some(45)));

        rc.observe(Delivery::Live);
        assert!(!rc.try_complete(Some(39)));
        assert!(rc.try_complete(Some(40)));
        assert!(!rc.is_reconnecting());
        assert_eq!(rc.successes(), 1);
    }

    #[test]
    fn target_only_rises() {
        let mut rc = ReconnectController::new();
        rc.begin(ResumeMode::Rejoin, 0);
        rc.set_target(50);
        rc.set_target(20);
        assert_eq!(rc.target_frame_id(), Some(50));
    }

    #[test]
    fn abandon_counts_failure() {
        let mut rc = ReconnectController::new();
        rc.abandon();
        assert_eq!(rc.failures(), 0);

        rc.begin(ResumeMode::NetworkDrop, 0);
        rc.abandon();
        assert_eq!(rc.failures(), 1);
        assert!(!rc.is_reconnecting());
    }

    #[test]
    fn target_is_ignored_when_idle() {
        let mut rc = ReconnectController::new();
        rc.set_target(10);
        assert_eq!(rc.target_frame_id(), None);
    }
}
