use rand::Rng;

use super::protocol::{CommandKind, Frame, FrameCommand, PlayerId};

/// Artificial latency for a simulated link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkConditions {
    pub enabled: bool,
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub jitter_ms: u32,
}

impl LinkConditions {
    pub fn delay_ms(&self, rng: &mut impl Rng) -> u32 {
        if !self.enabled || self.max_latency_ms == 0 {
            return 0;
        }
        let base = self.min_latency_ms.min(self.max_latency_ms);
        let range = self.max_latency_ms.saturating_sub(base);
        let spread = if range > 0 { rng.gen_range(0..=range) } else { 0 };
        let jitter = if self.jitter_ms > 0 {
            rng.gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        base + spread + jitter
    }
}

/// Running mean of round-trip command delay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayStats {
    samples: u64,
    average_ms: f64,
    last_ms: u64,
}

impl DelayStats {
    pub fn record(&mut self, delay_ms: u64) {
        self.samples += 1;
        self.last_ms = delay_ms;
        self.average_ms += (delay_ms as f64 - self.average_ms) / self.samples as f64;
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    pub fn last_ms(&self) -> u64 {
        self.last_ms
    }
}

/// Diagnostics only: nothing here feeds back into the simulation.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    local_player: Option<PlayerId>,
    delay: DelayStats,
    heartbeat_seq: u32,
}

impl Telemetry {
    pub fn new(local_player: Option<PlayerId>) -> Self {
        Self {
            local_player,
            ..Default::default()
        }
    }

    pub fn local_player(&self) -> Option<&PlayerId> {
        self.local_player.as_ref()
    }

    /// Samples every heartbeat the local player sent that came back in
    /// `frame`. Returns the number of samples taken.
    pub fn observe_frame(&mut self, frame: &Frame, now_ms: u64) -> usize {
        let Some(local) = &self.local_player else {
            return 0;
        };

        let mut sampled = 0;
        for command in &frame.commands {
            if let CommandKind::Heartbeat { sent_at_ms, .. } = command.kind {
                if &command.actor == local {
                    self.delay.record(now_ms.saturating_sub(sent_at_ms));
                    sampled += 1;
                }
            }
        }
        sampled
    }

    /// Builds the next outgoing probe, if a local player is configured.
    pub fn next_heartbeat(&mut self, now_ms: u64) -> Option<FrameCommand> {
        let local = self.local_player.clone()?;
        self.heartbeat_seq += 1;
        Some(FrameCommand::new(
            local,
            CommandKind::Heartbeat {
                seq: self.heartbeat_seq,
                sent_at_ms: now_ms,
            },
        ))
    }

    pub fn delay(&self) -> &DelayStats {
        &self.delay
    }

    pub fn reset(&mut self) {
        self.delay = DelayStats::default();
        self.heartbeat_seq = 0;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugOverlay {
    pub game_time_ms: u64,
    pub expected_frames: u64,
    pub received_frames: u32,
    pub average_delay_ms: f64,
    pub last_delay_ms: u64,
    pub reconnect_successes: u32,
    pub reconnect_failures: u32,
}

impl DebugOverlay {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("game time: {}s", self.game_time_ms / 1000),
            format!("expected frames: {}", self.expected_frames),
            format!("received frames: {}", self.received_frames),
            format!(
                "command delay: {:.1}({})ms",
                self.average_delay_ms, self.last_delay_ms
            ),
        ];
        if self.reconnect_successes > 0 {
            lines.push(format!("reconnects ok: {}", self.reconnect_successes));
        }
        if self.reconnect_failures > 0 {
            lines.push(format!("reconnects failed: {}", self.reconnect_failures));
        }
        lines
    }
}
