/// Time origin plus executed-frame counter. Lag is wall time since the
/// origin minus the time the executed frames account for.
#[derive(Debug, Clone)]
pub struct SchedulerClock {
    interval_ms: u64,
    origin_ms: i64,
    executed: u64,
    anchored: bool,
}

impl SchedulerClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            origin_ms: 0,
            executed: 0,
            anchored: false,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Sets the origin one interval in the past on the first frame, so the
    /// first update after start executes immediately.
    pub fn anchor_first(&mut self, now_ms: u64) {
        if !self.anchored {
            self.origin_ms = now_ms as i64 - self.interval_ms as i64;
            self.anchored = true;
        }
    }

    /// Moves the origin so `frames` intervals have elapsed as of `now_ms`.
    pub fn re_anchor(&mut self, now_ms: u64, frames: u64) {
        self.origin_ms = now_ms as i64 - (self.interval_ms * frames) as i64;
        self.anchored = true;
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> i64 {
        now_ms as i64 - self.origin_ms
    }

    pub fn lag_ms(&self, now_ms: u64) -> i64 {
        self.elapsed_ms(now_ms) - (self.executed * self.interval_ms) as i64
    }

    pub fn frame_due(&self, now_ms: u64) -> bool {
        self.anchored && self.lag_ms(now_ms) >= self.interval_ms as i64
    }

    pub fn expected_frames(&self, now_ms: u64) -> u64 {
        (self.elapsed_ms(now_ms).max(0) as u64) / self.interval_ms
    }

    pub fn record_frame(&mut self) {
        self.executed += 1;
    }

    pub fn reset(&mut self) {
        self.origin_ms = 0;
        self.executed = 0;
        self.anchored = false;
    }
}
