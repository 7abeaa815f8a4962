use std::collections::VecDeque;

use super::types::MatchEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    /// Logic frame that produced the event, if any.
    pub frame_id: Option<u32>,
    pub sequence: u32,
    pub event: MatchEvent,
}

/// Bounded outbox polled by the presentation layer once per tick.
#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<PendingEvent>,
    next_sequence: u32,
    max_pending: usize,
    evicted: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            next_sequence: 0,
            max_pending: max_pending.max(1),
            evicted: 0,
        }
    }

    pub fn push(&mut self, frame_id: Option<u32>, event: MatchEvent) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if self.pending.len() >= self.max_pending && !self.evict_oldest_transient() {
            log::warn!(
                "event queue over capacity ({}) with only critical events pending",
                self.max_pending
            );
        }

        self.pending.push_back(PendingEvent {
            frame_id,
            sequence,
            event,
        });

        sequence
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PendingEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn evict_oldest_transient(&mut self) -> bool {
        match self
            .pending
            .iter()
            .position(|e| !e.event.priority().is_critical())
        {
            Some(idx) => {
                self.pending.remove(idx);
                self.evicted += 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ProjectileId;
    use crate::event::DespawnCause;
    use crate::net::PlayerId;

    fn hit(hp: u32) -> MatchEvent {
        MatchEvent::HitPointsChanged {
            combatant: PlayerId::from("a"),
            hit_points: hp,
        }
    }

    #[test]
    fn full_queue_drops_transient_first() {
        let mut queue = EventQueue::new(2);

        queue.push(Some(1), MatchEvent::Countdown { seconds: 3 });
        queue.push(Some(1), hit(19));
        queue.push(
            Some(2),
            MatchEvent::ProjectileDespawned {
                projectile: ProjectileId(1),
                cause: DespawnCause::Hit,
            },
        );

        let kept: Vec<_> = queue.drain().map(|e| e.event).collect();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], hit(19));
        assert!(queue.is_empty());
        assert_eq!(queue.evicted(), 1);
    }

    #[test]
    fn critical_events_are_never_dropped() {
        let mut queue = EventQueue::new(1);

        queue.push(None, hit(2));
        queue.push(None, hit(1));

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn sequences_increase() {
        let mut queue = EventQueue::new(8);
        let a = queue.push(None, hit(3));
        let b = queue.push(None, hit(2));
        assert_eq!(b, a + 1);
    }
}
