use std::collections::VecDeque;

use crate::net::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Empty,
    /// Collecting frames; playback has not started.
    Buffering,
    Running,
    /// Backlog above the jitter threshold; draining without pacing. Only held
    /// inside a single `Lockstep::update`, which empties the queue before it
    /// returns, so `state()` reads `Running` afterwards. Check
    /// `TickReport::caught_up` to see whether an update drained a burst.
    CatchingUp,
    /// Draining a resume backlog with render smoothing suppressed.
    Reconnecting,
}

/// Strict FIFO of inbound frames. Playback starts once more than
/// `jitter_threshold` frames have been buffered.
#[derive(Debug)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
    jitter_threshold: usize,
    started: bool,
    latest_received_id: Option<u32>,
    received: u64,
}

impl FrameQueue {
    pub fn new(jitter_threshold: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            jitter_threshold,
            started: false,
            latest_received_id: None,
            received: 0,
        }
    }

    /// Appends at the tail. Returns true if this push started playback.
    pub fn push(&mut self, frame: Frame) -> bool {
        if let Some(latest) = self.latest_received_id {
            if frame.id != latest.wrapping_add(1) {
                log::warn!("frame {} received after {}; stream is not contiguous", frame.id, latest);
            }
        }
        self.latest_received_id = Some(frame.id);
        self.received += 1;
        self.frames.push_back(frame);

        if !self.started && self.exceeds_threshold() {
            self.started = true;
            return true;
        }
        false
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn front(&self) -> Option<&Frame> {
        self.frames.front()
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.frames.len() > self.jitter_threshold
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Starts playback regardless of depth, used for resume backlogs.
    pub fn force_start(&mut self) {
        self.started = true;
    }

    pub fn jitter_threshold(&self) -> usize {
        self.jitter_threshold
    }

    pub fn latest_received_id(&self) -> Option<u32> {
        self.latest_received_id
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.started = false;
        self.latest_received_id = None;
        self.received = 0;
    }
}
