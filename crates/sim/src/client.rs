use std::time::Duration;

use anyhow::Result;
use duel::{
    Delivery, FrameCommand, FrameLog, LinkEvent, Lockstep, MatchContext, MatchResult,
    RejoinSnapshot, ResumeKind, TickReport,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

use crate::clock::Epoch;
use crate::config::SimConfig;
use crate::events::SimEvent;
use crate::present::Presenter;

/// The local participant: one lockstep scheduler driving one match.
pub struct Client {
    config: SimConfig,
    sync: Lockstep,
    ctx: MatchContext,
    recording: Option<FrameLog>,
    last_update_ms: Option<u64>,
    next_heartbeat_ms: u64,
    results: Option<Vec<MatchResult>>,
}

impl Client {
    pub fn new(config: SimConfig, ctx: MatchContext) -> Self {
        let recording = config
            .record
            .as_ref()
            .map(|_| FrameLog::new(config.sync.tick_rate));
        Self {
            sync: Lockstep::new(config.sync.clone()),
            ctx,
            recording,
            last_update_ms: None,
            next_heartbeat_ms: 0,
            results: None,
            config,
        }
    }

    pub fn sync(&self) -> &Lockstep {
        &self.sync
    }

    pub fn ctx(&self) -> &MatchContext {
        &self.ctx
    }

    pub fn is_finished(&self) -> bool {
        self.results.is_some()
    }

    pub fn handle_link(&mut self, event: LinkEvent, now_ms: u64) -> Option<SimEvent> {
        match event {
            LinkEvent::Frame(frame, delivery) => {
                if let Some(log) = &mut self.recording {
                    log.push(frame.clone());
                }
                self.sync.receive(frame, delivery, now_ms);
                None
            }
            LinkEvent::Disconnected => {
                self.sync
                    .resume(&mut self.ctx, ResumeKind::NetworkDrop, now_ms);
                Some(SimEvent::LinkDown { at_ms: now_ms })
            }
            LinkEvent::Resumed { backlog_through } => {
                if let Some(id) = backlog_through {
                    self.sync.set_resume_target(id);
                }
                Some(SimEvent::LinkResumed { backlog_through })
            }
        }
    }

    /// Probe for the relay, at most one per heartbeat period.
    pub fn heartbeat(&mut self, now_ms: u64) -> Option<FrameCommand> {
        if now_ms < self.next_heartbeat_ms {
            return None;
        }
        self.next_heartbeat_ms = now_ms + self.config.heartbeat_ms;
        self.sync.next_heartbeat(now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<SimEvent> {
        let mut out = Vec::new();

        if self.sync.is_reconnecting() {
            let waited = now_ms.saturating_sub(self.sync.reconnect().started_at_ms());
            if waited > self.config.resume_timeout_ms {
                self.sync.abandon_resume();
                out.push(SimEvent::ResumeTimedOut { after_ms: waited });
            }
        }

        let dt = now_ms.saturating_sub(self.last_update_ms.unwrap_or(now_ms)) as f32;
        self.last_update_ms = Some(now_ms);
        self.sync.update(&mut self.ctx, now_ms, dt);

        out.extend(self.drain());
        if self.ctx.is_over() && self.results.is_none() {
            out.push(SimEvent::Finished {
                results: self.finish(),
            });
        }
        out
    }

    /// Drains a recorded stream as a resume backlog. Its last frame stands
    /// in for the live edge so the resume can complete.
    pub fn replay(&mut self, log: FrameLog, now_ms: u64) -> (TickReport, Vec<SimEvent>) {
        if log.tick_rate != self.config.sync.tick_rate {
            log::warn!(
                "log recorded at {} fps, replaying at {}",
                log.tick_rate,
                self.config.sync.tick_rate
            );
        }

        let last = log.last_frame_id();
        self.sync
            .resume(&mut self.ctx, ResumeKind::NetworkDrop, now_ms);
        if let Some(id) = last {
            self.sync.set_resume_target(id);
        }
        for frame in log.frames {
            let delivery = if Some(frame.id) == last {
                Delivery::Live
            } else {
                Delivery::Replay
            };
            self.sync.receive(frame, delivery, now_ms);
        }

        let report = self.sync.update(&mut self.ctx, now_ms, 0.0);
        (report, self.drain())
    }

    /// Settles the match once; later calls return the same standings.
    pub fn finish(&mut self) -> Vec<MatchResult> {
        self.results
            .get_or_insert_with(|| self.ctx.settle())
            .clone()
    }

    pub fn take_recording(&mut self) -> Option<FrameLog> {
        self.recording.take()
    }

    fn drain(&mut self) -> Vec<SimEvent> {
        self.sync
            .drain_events()
            .into_iter()
            .map(|pending| SimEvent::Match {
                frame_id: pending.frame_id,
                event: pending.event,
            })
            .collect()
    }
}

pub struct ClientIo {
    pub downlink: mpsc::Receiver<LinkEvent>,
    pub uplink: mpsc::Sender<FrameCommand>,
    pub view: watch::Sender<RejoinSnapshot>,
}

/// Render-rate loop: feed the scheduler, publish confirmed positions for the
/// bots, present. Ends at match over, on the time limit, or when the
/// presenter asks to quit.
pub async fn run(
    client: &mut Client,
    mut io: ClientIo,
    epoch: Epoch,
    presenter: &mut impl Presenter,
) -> Result<()> {
    let mut render_tick = interval(Duration::from_millis(client.config.render_interval_ms()));
    render_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline_ms = client.config.max_secs * 1000;

    loop {
        render_tick.tick().await;
        let now = epoch.now_ms();

        let mut events = Vec::new();
        while let Ok(event) = io.downlink.try_recv() {
            events.extend(client.handle_link(event, now));
        }

        if let Some(probe) = client.heartbeat(now) {
            if io.uplink.try_send(probe).is_err() {
                log::debug!("uplink full, heartbeat skipped");
            }
        }

        events.extend(client.tick(now));
        io.view.send_replace(client.ctx.snapshot());

        if !presenter.present(client, &events, now)? {
            log::info!("stopped by user");
            break;
        }
        if client.is_finished() {
            break;
        }
        if now >= deadline_ms {
            log::info!("time limit of {}s reached", client.config.max_secs);
            break;
        }
    }
    Ok(())
}
