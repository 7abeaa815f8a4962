use std::time::Duration;

use duel::{Frame, FrameCommand, LinkEvent, LinkSimulator};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::clock::Epoch;
use crate::config::SimConfig;

const POLL_MS: u64 = 2;

/// Stand-in for the frame server: collects commands for one interval, seals
/// them into a numbered frame and pushes it through the simulated link.
pub struct Relay {
    link: LinkSimulator,
    interval_ms: u64,
    next_frame_id: u32,
    pending: Vec<FrameCommand>,
    drop_at: Option<u32>,
    drop_ms: u64,
}

impl Relay {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            link: LinkSimulator::new(config.link.clone(), config.seed),
            interval_ms: config.sync.frame_interval_ms(),
            next_frame_id: 1,
            pending: Vec::new(),
            drop_at: config.drop_at,
            drop_ms: config.drop_ms,
        }
    }

    pub fn queue(&mut self, command: FrameCommand) {
        self.pending.push(command);
    }

    /// Closes the current frame and hands it to the link. Returns its id.
    pub fn seal_frame(&mut self, now_ms: u64) -> u32 {
        let id = self.next_frame_id;
        if self.drop_at == Some(id) {
            log::info!("dropping link at frame {} for {}ms", id, self.drop_ms);
            self.link.schedule_outage(now_ms, self.drop_ms);
        }

        let frame = Frame::with_commands(id, std::mem::take(&mut self.pending));
        self.link.send(frame, now_ms);
        self.next_frame_id += 1;
        id
    }

    pub fn poll(&mut self, now_ms: u64) -> Vec<LinkEvent> {
        self.link.poll(now_ms)
    }

    pub async fn run(
        mut self,
        epoch: Epoch,
        mut uplink: mpsc::Receiver<FrameCommand>,
        downlink: mpsc::Sender<LinkEvent>,
    ) {
        let mut frame_tick = interval(Duration::from_millis(self.interval_ms));
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut poll_tick = interval(Duration::from_millis(POLL_MS));
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = frame_tick.tick() => {
                    while let Ok(command) = uplink.try_recv() {
                        self.queue(command);
                    }
                    let id = self.seal_frame(epoch.now_ms());
                    log::trace!("sealed frame {}", id);
                }
                _ = poll_tick.tick() => {
                    for event in self.poll(epoch.now_ms()) {
                        if downlink.send(event).await.is_err() {
                            log::debug!("client gone, relay stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}
