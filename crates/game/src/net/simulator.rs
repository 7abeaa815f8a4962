use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::protocol::{Delivery, Frame};
use super::stats::LinkConditions;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Frame(Frame, Delivery),
    /// The link went down; frames are being withheld.
    Disconnected,
    /// The link is back and the withheld frames follow as a replay.
    Resumed { backlog_through: Option<u32> },
}

#[derive(Debug)]
struct Scheduled {
    release_ms: u64,
    order: u64,
    event: LinkEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.release_ms == other.release_ms && self.order == other.order
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        (other.release_ms, other.order).cmp(&(self.release_ms, self.order))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outage {
    start_ms: u64,
    end_ms: u64,
    active: bool,
}

/// One-way relay link with latency and jitter. Frames never overtake each
/// other. During an outage they are withheld and redelivered as a replay
/// backlog when the link comes back.
#[derive(Debug)]
pub struct LinkSimulator {
    conditions: LinkConditions,
    queue: BinaryHeap<Scheduled>,
    next_order: u64,
    last_release_ms: u64,
    outage: Option<Outage>,
    withheld: Vec<Frame>,
    rng: StdRng,
}

impl LinkSimulator {
    pub fn new(conditions: LinkConditions, seed: u64) -> Self {
        Self {
            conditions,
            queue: BinaryHeap::new(),
            next_order: 0,
            last_release_ms: 0,
            outage: None,
            withheld: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn conditions(&self) -> &LinkConditions {
        &self.conditions
    }

    pub fn set_conditions(&mut self, conditions: LinkConditions) {
        self.conditions = conditions;
    }

    pub fn schedule_outage(&mut self, start_ms: u64, duration_ms: u64) {
        self.outage = Some(Outage {
            start_ms,
            end_ms: start_ms + duration_ms,
            active: false,
        });
    }

    pub fn is_down(&self) -> bool {
        self.outage.is_some_and(|o| o.active)
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len() + self.withheld.len()
    }

    pub fn send(&mut self, frame: Frame, now_ms: u64) {
        self.update_outage(now_ms);

        if self.is_down() {
            self.withheld.push(frame);
            return;
        }

        let delay = u64::from(self.conditions.delay_ms(&mut self.rng));
        let release_ms = (now_ms + delay).max(self.last_release_ms);
        self.schedule(release_ms, LinkEvent::Frame(frame, Delivery::Live));
    }

    pub fn poll(&mut self, now_ms: u64) -> Vec<LinkEvent> {
        self.update_outage(now_ms);

        let mut ready = Vec::new();
        while self.queue.peek().is_some_and(|s| s.release_ms <= now_ms) {
            if let Some(scheduled) = self.queue.pop() {
                ready.push(scheduled.event);
            }
        }
        ready
    }

    fn schedule(&mut self, release_ms: u64, event: LinkEvent) {
        self.last_release_ms = self.last_release_ms.max(release_ms);
        self.queue.push(Scheduled {
            release_ms,
            order: self.next_order,
            event,
        });
        self.next_order += 1;
    }

    fn update_outage(&mut self, now_ms: u64) {
        let Some(mut outage) = self.outage else {
            return;
        };

        if !outage.active && now_ms >= outage.start_ms && now_ms < outage.end_ms {
            outage.active = true;
            self.outage = Some(outage);
            log::info!("link down at {}ms for {}ms", now_ms, outage.end_ms - now_ms);

            // Everything still in flight is lost and must be replayed.
            let mut lost: Vec<Scheduled> = self.queue.drain().collect();
            lost.sort_by_key(|s| (s.release_ms, s.order));
            self.withheld.extend(lost.into_iter().filter_map(|s| match s.event {
                LinkEvent::Frame(frame, _) => Some(frame),
                _ => None,
            }));
            self.last_release_ms = now_ms;
            self.schedule(now_ms, LinkEvent::Disconnected);
        } else if outage.active && now_ms >= outage.end_ms {
            self.outage = None;
            let backlog = std::mem::take(&mut self.withheld);
            let backlog_through = backlog.last().map(|f| f.id);
            log::info!(
                "link back at {}ms, replaying {} frames",
                now_ms,
                backlog.len()
            );

            let release_ms = now_ms.max(self.last_release_ms);
            self.schedule(release_ms, LinkEvent::Resumed { backlog_through });
            for frame in backlog {
                self.schedule(release_ms, LinkEvent::Frame(frame, Delivery::Replay));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(events: &[LinkEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Frame(f, _) => Some(f.id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn jitter_never_reorders() {
        let conditions = LinkConditions {
            enabled: true,
            min_latency_ms: 10,
            max_latency_ms: 120,
            jitter_ms: 40,
        };
        let mut link = LinkSimulator::new(conditions, 42);
        for id in 1..=50 {
            link.send(Frame::new(id), u64::from(id) * 33);
        }

        let delivered = link.poll(10_000);

        assert_eq!(ids(&delivered), (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn frames_wait_for_their_release_time() {
        let conditions = LinkConditions {
            enabled: true,
            min_latency_ms: 50,
            max_latency_ms: 50,
            jitter_ms: 0,
        };
        let mut link = LinkSimulator::new(conditions, 1);
        link.send(Frame::new(1), 100);

        assert!(link.poll(149).is_empty());
        assert_eq!(ids(&link.poll(150)), vec![1]);
    }

    #[test]
    fn outage_withholds_then_replays() {
        let mut link = LinkSimulator::new(LinkConditions::default(), 1);
        link.schedule_outage(100, 200);

        link.send(Frame::new(1), 50);
        assert_eq!(ids(&link.poll(60)), vec![1]);

        link.send(Frame::new(2), 100);
        link.send(Frame::new(3), 200);
        let during = link.poll(250);
        assert_eq!(during, vec![LinkEvent::Disconnected]);

        link.send(Frame::new(4), 300);
        let after = link.poll(300);

        assert_eq!(
            after[0],
            LinkEvent::Resumed {
                backlog_through: Some(3)
            }
        );
        assert_eq!(after[1], LinkEvent::Frame(Frame::new(2), Delivery::Replay));
        assert_eq!(after[2], LinkEvent::Frame(Frame::new(3), Delivery::Replay));
        assert_eq!(after[3], LinkEvent::Frame(Frame::new(4), Delivery::Live));
    }
}
