use std::time::Duration;

use duel::entity::{normalize_degrees, shortest_delta};
use duel::{CombatantSnapshot, FrameCommand, PlayerId, RejoinSnapshot};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

use crate::clock::Epoch;

pub const THINK_MS: u64 = 100;

const STOP_CHANCE: f64 = 0.04;
const AIM_SPREAD_DEGREES: f32 = 6.0;
const RETARGET_DEGREES: f32 = 8.0;
const FIRE_COOLDOWN_MS: u64 = 500;

/// Heading in degrees from `from` toward `to`, screen coordinates.
pub fn aim_at(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    normalize_degrees(d.y.atan2(d.x).to_degrees())
}

/// Scripted opponent: steers toward the other combatant's confirmed
/// position, pauses now and then, and fires on a cooldown.
pub struct Bot {
    id: PlayerId,
    opponent: PlayerId,
    rng: StdRng,
    heading: Option<f32>,
    paused_until_ms: u64,
    next_fire_ms: u64,
}

impl Bot {
    pub fn new(id: impl Into<PlayerId>, opponent: impl Into<PlayerId>, seed: u64) -> Self {
        Self {
            id: id.into(),
            opponent: opponent.into(),
            rng: StdRng::seed_from_u64(seed),
            heading: None,
            paused_until_ms: 0,
            next_fire_ms: 0,
        }
    }

    pub fn decide(&mut self, now_ms: u64, view: &RejoinSnapshot) -> Vec<FrameCommand> {
        let mut commands = Vec::new();
        let (Some(me), Some(target)) = (find(view, &self.id), find(view, &self.opponent)) else {
            return commands;
        };
        if me.hit_points == 0 || target.hit_points == 0 || now_ms < self.paused_until_ms {
            return commands;
        }

        if self.rng.gen_bool(STOP_CHANCE) {
            self.paused_until_ms = now_ms + self.rng.gen_range(300..=900);
            self.heading = None;
            commands.push(FrameCommand::stop(self.id.clone()));
            return commands;
        }

        let spread = self.rng.gen_range(-AIM_SPREAD_DEGREES..=AIM_SPREAD_DEGREES);
        let aim = normalize_degrees(aim_at(me.position, target.position) + spread);
        if self
            .heading
            .is_none_or(|h| shortest_delta(h, aim).abs() > RETARGET_DEGREES)
        {
            self.heading = Some(aim);
            commands.push(FrameCommand::set_heading(self.id.clone(), aim));
        }

        if now_ms >= self.next_fire_ms {
            self.next_fire_ms = now_ms + FIRE_COOLDOWN_MS + self.rng.gen_range(0..=400);
            commands.push(FrameCommand::fire(self.id.clone()));
        }
        commands
    }

    pub async fn run(
        mut self,
        epoch: Epoch,
        view: watch::Receiver<RejoinSnapshot>,
        uplink: mpsc::Sender<FrameCommand>,
    ) {
        let mut think = interval(Duration::from_millis(THINK_MS));
        think.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            think.tick().await;
            let commands = {
                let snapshot = view.borrow();
                self.decide(epoch.now_ms(), &snapshot)
            };
            for command in commands {
                if uplink.send(command).await.is_err() {
                    log::debug!("relay gone, bot {} stopping", self.id);
                    return;
                }
            }
        }
    }
}

fn find<'a>(view: &'a RejoinSnapshot, id: &PlayerId) -> Option<&'a CombatantSnapshot> {
    view.combatants.iter().find(|c| &c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel::CommandKind;

    fn view(red: Vec2, blue: Vec2) -> RejoinSnapshot {
        RejoinSnapshot {
            combatants: vec![
                CombatantSnapshot {
                    id: PlayerId::from("red"),
                    position: red,
                    hit_points: 20,
                    heading: 0.0,
                },
                CombatantSnapshot {
                    id: PlayerId::from("blue"),
                    position: blue,
                    hit_points: 20,
                    heading: 180.0,
                },
            ],
        }
    }

    #[test]
    fn aims_in_screen_coordinates() {
        assert_eq!(aim_at(Vec2::ZERO, Vec2::new(10.0, 0.0)), 0.0);
        assert!((aim_at(Vec2::ZERO, Vec2::new(0.0, 10.0)) - 90.0).abs() < 1e-4);
        assert!((aim_at(Vec2::ZERO, Vec2::new(-10.0, 0.0)) - 180.0).abs() < 1e-4);
        assert!((aim_at(Vec2::ZERO, Vec2::new(0.0, -10.0)) - 270.0).abs() < 1e-4);
    }

    #[test]
    fn fires_no_faster_than_cooldown() {
        let mut bot = Bot::new("red", "blue", 3);
        let view = view(Vec2::new(100.0, 375.0), Vec2::new(1200.0, 375.0));

        let mut fire_times = Vec::new();
        for step in 0..200 {
            let now = step * THINK_MS;
            let commands = bot.decide(now, &view);
            if commands.iter().any(|c| c.kind == CommandKind::Fire) {
                fire_times.push(now);
            }
        }

        assert!(!fire_times.is_empty());
        assert!(fire_times.windows(2).all(|w| w[1] - w[0] >= FIRE_COOLDOWN_MS));
    }

    #[test]
    fn headings_point_roughly_at_opponent() {
        let mut bot = Bot::new("blue", "red", 9);
        let view = view(Vec2::new(100.0, 375.0), Vec2::new(1200.0, 375.0));

        for step in 0..50 {
            for command in bot.decide(step * THINK_MS, &view) {
                if let CommandKind::SetHeading { heading } = command.kind {
                    assert!(shortest_delta(heading, 180.0).abs() <= AIM_SPREAD_DEGREES + 1e-3);
                }
            }
        }
    }

    #[test]
    fn idle_without_opponent() {
        let mut bot = Bot::new("red", "green", 1);
        let view = view(Vec2::ZERO, Vec2::ONE);
        assert!(bot.decide(0, &view).is_empty());
    }
}
