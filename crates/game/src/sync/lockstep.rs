use crate::config::{COUNTDOWN_SECONDS, SyncConfig};
use crate::event::{EventQueue, MatchEvent, PendingEvent};
use crate::net::{DebugOverlay, Delivery, Frame, FrameCommand, Telemetry};
use crate::simulation::{CommandProcessor, MatchContext, arbitrate};

use super::clock::SchedulerClock;
use super::frame_queue::{BufferState, FrameQueue};
use super::reconnect::{ReconnectController, ResumeKind, ResumeMode};

/// What one `update` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frames_executed: u32,
    pub caught_up: bool,
    pub rendered: bool,
    pub reconnect_completed: bool,
}

/// Fixed-interval frame scheduler. Inbound frames are buffered, executed
/// against a `MatchContext` at the tick rate, drained without pacing when
/// the backlog grows, and followed by a prediction pass every update.
#[derive(Debug)]
pub struct Lockstep {
    config: SyncConfig,
    queue: FrameQueue,
    clock: SchedulerClock,
    reconnect: ReconnectController,
    telemetry: Telemetry,
    processor: CommandProcessor,
    events: EventQueue,
    state: BufferState,
    last_executed_id: Option<u32>,
}

impl Lockstep {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            queue: FrameQueue::new(config.jitter_threshold),
            clock: SchedulerClock::new(config.frame_interval_ms()),
            reconnect: ReconnectController::new(),
            telemetry: Telemetry::new(config.local_player.clone()),
            processor: CommandProcessor::new(),
            events: EventQueue::new(config.event_capacity),
            state: BufferState::Empty,
            last_executed_id: None,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.queue.is_started()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect.is_reconnecting()
    }

    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    pub fn executed_frames(&self) -> u64 {
        self.clock.executed()
    }

    pub fn last_executed_id(&self) -> Option<u32> {
        self.last_executed_id
    }

    pub fn latest_received_id(&self) -> Option<u32> {
        self.queue.latest_received_id()
    }

    pub fn clock(&self) -> &SchedulerClock {
        &self.clock
    }

    pub fn reconnect(&self) -> &ReconnectController {
        &self.reconnect
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PendingEvent> {
        self.events.drain().collect()
    }

    pub fn next_heartbeat(&mut self, now_ms: u64) -> Option<FrameCommand> {
        self.telemetry.next_heartbeat(now_ms)
    }

    /// Hands an inbound frame to the jitter buffer.
    pub fn receive(&mut self, frame: Frame, delivery: Delivery, now_ms: u64) {
        if !self.reconnect.is_reconnecting() {
            self.telemetry.observe_frame(&frame, now_ms);
        }
        self.reconnect.observe(delivery);

        let id = frame.id;
        let started = self.queue.push(frame);
        self.clock.anchor_first(now_ms);

        if self.reconnect.is_reconnecting() {
            self.state = BufferState::Reconnecting;
        } else if started {
            log::info!(
                "playback started at frame {} with {} buffered",
                id,
                self.queue.len()
            );
            self.state = BufferState::Running;
        } else if self.state == BufferState::Empty {
            self.state = BufferState::Buffering;
        }
    }

    /// One real-time update: render easing, at most one paced frame, a
    /// catch-up drain if the backlog is above the threshold, then prediction.
    pub fn update(&mut self, ctx: &mut MatchContext, now_ms: u64, dt_ms: f32) -> TickReport {
        let mut report = TickReport::default();
        if !self.queue.is_started() {
            return report;
        }

        let reconnecting = self.reconnect.is_reconnecting();
        if !reconnecting {
            ctx.step_render(dt_ms);
            report.rendered = true;
        }

        if self.clock.frame_due(now_ms) {
            if let Some(frame) = self.queue.pop() {
                self.execute(frame, ctx);
                report.frames_executed += 1;
            }
        }

        if self.queue.exceeds_threshold() {
            if !reconnecting {
                self.state = BufferState::CatchingUp;
            }
            log::debug!("catching up on {} buffered frames", self.queue.len());
            while let Some(frame) = self.queue.pop() {
                self.execute(frame, ctx);
                report.frames_executed += 1;
            }
            report.caught_up = true;
        }

        if reconnecting && self.reconnect.try_complete(self.last_executed_id) {
            let executed = self.clock.executed();
            self.clock.re_anchor(now_ms, executed);
            let frame_id = self.last_executed_id.unwrap_or_default();
            log::info!(
                "resume complete at frame {} after {}ms",
                frame_id,
                now_ms.saturating_sub(self.reconnect.started_at_ms())
            );
            self.events
                .push(ctx.frame_id(), MatchEvent::ReconnectCompleted { frame_id, executed });
            report.reconnect_completed = true;
        }

        if !self.reconnect.is_reconnecting() {
            self.state = BufferState::Running;
        }

        ctx.step_prediction(self.config.frame_interval_ms() as f32);
        report
    }

    /// Decode, logic step, collision pass. After match over the frame is
    /// consumed and counted without touching state.
    fn execute(&mut self, frame: Frame, ctx: &mut MatchContext) {
        self.clock.record_frame();
        self.last_executed_id = Some(frame.id);
        if ctx.is_over() {
            return;
        }

        ctx.begin_frame(frame.id);
        if frame.id == 1 {
            self.events.push(
                Some(frame.id),
                MatchEvent::Countdown {
                    seconds: COUNTDOWN_SECONDS,
                },
            );
        }

        self.processor.process_all(&frame, ctx, &mut self.events);
        ctx.step_logic(self.config.frame_interval_ms() as f32, &mut self.events);
        arbitrate(ctx, &mut self.events);
    }

    /// Enters the reconnecting state. A rejoin resets the named combatants
    /// to the snapshot before any backlog frame runs.
    pub fn resume(&mut self, ctx: &mut MatchContext, kind: ResumeKind, now_ms: u64) {
        let mode = match kind {
            ResumeKind::NetworkDrop => ResumeMode::NetworkDrop,
            ResumeKind::Rejoin(snapshot) => {
                ctx.restore(&snapshot);
                ResumeMode::Rejoin
            }
        };
        log::info!("resume started ({:?}) at {}ms", mode, now_ms);

        self.reconnect.begin(mode, now_ms);
        self.queue.force_start();
        self.clock.anchor_first(now_ms);
        self.state = BufferState::Reconnecting;
        self.events.push(
            ctx.frame_id(),
            MatchEvent::ReconnectStarted {
                rejoin: mode == ResumeMode::Rejoin,
            },
        );
    }

    /// Highest frame id the resume backlog has to reach.
    pub fn set_resume_target(&mut self, frame_id: u32) {
        self.reconnect.set_target(frame_id);
    }

    pub fn abandon_resume(&mut self) {
        if !self.reconnect.is_reconnecting() {
            return;
        }
        log::warn!(
            "resume abandoned with target {:?}",
            self.reconnect.target_frame_id()
        );
        self.reconnect.abandon();
        self.state = if self.queue.is_started() {
            BufferState::Running
        } else {
            BufferState::Buffering
        };
        self.events.push(self.last_executed_id, MatchEvent::ReconnectAbandoned);
    }

    /// Clears the buffer and counters. Entity state lives in the match
    /// context and is untouched.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.clock.reset();
        self.reconnect.reset();
        self.telemetry.reset();
        self.processor = CommandProcessor::new();
        self.events.clear();
        self.state = BufferState::Empty;
        self.last_executed_id = None;
    }

    pub fn debug_overlay(&self, now_ms: u64) -> DebugOverlay {
        let (game_time_ms, expected_frames) = if self.clock.is_anchored() {
            (
                self.clock.elapsed_ms(now_ms).max(0) as u64,
                self.clock.expected_frames(now_ms),
            )
        } else {
            (0, 0)
        };
        let delay = self.telemetry.delay();

        DebugOverlay {
            game_time_ms,
            expected_frames,
            received_frames: self.queue.latest_received_id().unwrap_or(0),
            average_delay_ms: delay.average_ms(),
            last_delay_ms: delay.last_ms(),
            reconnect_successes: self.reconnect.successes(),
            reconnect_failures: self.reconnect.failures(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CombatantProfile;
    use crate::net::{CommandKind, PlayerId};

    fn duel() -> MatchContext {
        MatchContext::two_player(
            (PlayerId::from("alice"), CombatantProfile::named("Alice")),
            (PlayerId::from("bob"), CombatantProfile::named("Bob")),
            Default::default(),
        )
        .unwrap()
    }

    fn lockstep() -> Lockstep {
        Lockstep::new(SyncConfig::default().with_local_player("alice"))
    }

    #[test]
    fn buffering_until_threshold() {
        let mut sync = lockstep();
        let mut ctx = duel();

        assert_eq!(sync.state(), BufferState::Empty);
        sync.receive(Frame::new(1), Delivery::Live, 0);
        assert_eq!(sync.state(), BufferState::Buffering);
        sync.receive(Frame::new(2), Delivery::Live, 33);

        let report = sync.update(&mut ctx, 100, 16.0);
        assert_eq!(report, TickReport::default());

        sync.receive(Frame::new(3), Delivery::Live, 66);
        assert_eq!(sync.state(), BufferState::Running);

        let report = sync.update(&mut ctx, 100, 16.0);
        assert_eq!(report.frames_executed, 1);
        assert_eq!(sync.last_executed_id(), Some(1));
    }

    #[test]
    fn burst_is_drained_within_one_update() {
        let mut sync = lockstep();
        let mut ctx = duel();
        for id in 1..=3 {
            sync.receive(Frame::new(id), Delivery::Live, 0);
        }
        sync.update(&mut ctx, 0, 0.0);
        for id in 4..=8 {
            sync.receive(Frame::new(id), Delivery::Live, 10);
        }

        let report = sync.update(&mut ctx, 10, 10.0);

        assert!(report.caught_up);
        assert_eq!(report.frames_executed, 7);
        assert_eq!(sync.buffered(), 0);
        assert_eq!(sync.state(), BufferState::Running);
        assert_eq!(sync.last_executed_id(), Some(8));
    }

    #[test]
    fn paced_at_tick_interval() {
        let mut sync = lockstep();
        let mut ctx = duel();
        for id in 1..=3 {
            sync.receive(Frame::new(id), Delivery::Live, 0);
        }

        // Origin is one interval back, so the first frame runs at once.
        assert_eq!(sync.update(&mut ctx, 0, 0.0).frames_executed, 1);
        assert_eq!(sync.update(&mut ctx, 20, 20.0).frames_executed, 0);
        assert_eq!(sync.update(&mut ctx, 33, 13.0).frames_executed, 1);
        assert_eq!(sync.executed_frames(), 2);
    }

    #[test]
    fn countdown_on_first_frame() {
        let mut sync = lockstep();
        let mut ctx = duel();
        for id in 1..=3 {
            sync.receive(Frame::new(id), Delivery::Live, 0);
        }
        sync.update(&mut ctx, 0, 0.0);

        let events = sync.drain_events();
        assert!(events.iter().any(|e| e.event == MatchEvent::Countdown { seconds: 3 }));
    }

    #[test]
    fn heartbeats_sampled_only_when_not_resuming() {
        let mut sync = lockstep();
        let mut ctx = duel();
        let probe = |sent_at_ms| {
            Frame::with_commands(
                1,
                vec![FrameCommand::new(
                    "alice",
                    CommandKind::Heartbeat { seq: 1, sent_at_ms },
                )],
            )
        };

        sync.receive(probe(100), Delivery::Live, 180);
        assert_eq!(sync.telemetry().delay().samples(), 1);
        assert_eq!(sync.telemetry().delay().last_ms(), 80);

        sync.resume(&mut ctx, ResumeKind::NetworkDrop, 200);
        sync.receive(probe(100), Delivery::Replay, 400);
        assert_eq!(sync.telemetry().delay().samples(), 1);
    }

    #[test]
    fn render_suppressed_while_resuming() {
        let mut sync = lockstep();
        let mut ctx = duel();
        sync.resume(&mut ctx, ResumeKind::NetworkDrop, 0);
        sync.set_resume_target(5);
        for id in 1..=5 {
            sync.receive(Frame::new(id), Delivery::Replay, 0);
        }

        let report = sync.update(&mut ctx, 0, 16.0);

        assert!(!report.rendered);
        assert!(report.caught_up);
        assert_eq!(report.frames_executed, 5);
        assert!(!report.reconnect_completed);
        assert_eq!(sync.state(), BufferState::Reconnecting);
    }

    #[test]
    fn abandon_records_failure() {
        let mut sync = lockstep();
        let mut ctx = duel();
        sync.resume(&mut ctx, ResumeKind::NetworkDrop, 0);

        sync.abandon_resume();

        assert!(!sync.is_reconnecting());
        assert_eq!(sync.debug_overlay(0).reconnect_failures, 1);
        assert!(sync
            .drain_events()
            .iter()
            .any(|e| e.event == MatchEvent::ReconnectAbandoned));
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut sync = lockstep();
        let mut ctx = duel();
        for id in 1..=3 {
            sync.receive(Frame::new(id), Delivery::Live, 0);
        }
        sync.update(&mut ctx, 0, 0.0);

        sync.reset();

        assert_eq!(sync.state(), BufferState::Empty);
        assert!(!sync.is_started());
        assert_eq!(sync.executed_frames(), 0);
        assert_eq!(sync.buffered(), 0);
        assert!(sync.events().is_empty());
    }

    #[test]
    fn overlay_reports_expected_and_received() {
        let mut sync = lockstep();
        for id in 1..=3 {
            sync.receive(Frame::new(id), Delivery::Live, 1000);
        }

        let overlay = sync.debug_overlay(1000 + 2000);

        assert_eq!(overlay.received_frames, 3);
        assert_eq!(overlay.game_time_ms, 2033);
        assert_eq!(overlay.expected_frames, 61);
    }
}
