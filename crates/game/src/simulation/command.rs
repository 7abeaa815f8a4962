use crate::entity::{normalize_degrees, ProjectileId};
use crate::error::SyncError;
use crate::event::{EventQueue, MatchEvent};
use crate::net::{CommandKind, Frame, FrameCommand};

use super::world::MatchContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Fired(ProjectileId),
    Heading(f32),
    Stopped,
    /// Heartbeats carry telemetry only.
    Skipped,
}

/// Turns frame commands into combatant mutations. Commands are applied in
/// list order, once per frame execution.
#[derive(Debug, Default)]
pub struct CommandProcessor {
    applied: u64,
    dropped: u64,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn process(
        &mut self,
        command: &FrameCommand,
        ctx: &mut MatchContext,
        events: &mut EventQueue,
    ) -> Result<Decoded, SyncError> {
        if ctx.is_over() {
            return Err(SyncError::MatchOver {
                actor: command.actor.clone(),
            });
        }

        let speed = ctx.arena().combatant_speed;
        let actor = &command.actor;
        let decoded = match command.kind {
            CommandKind::Fire => {
                let projectile = ctx.spawn_projectile(actor)?;
                events.push(
                    ctx.frame_id(),
                    MatchEvent::ProjectileSpawned {
                        projectile,
                        source: actor.clone(),
                    },
                );
                Decoded::Fired(projectile)
            }
            CommandKind::SetHeading { heading } => {
                if !heading.is_finite() {
                    return Err(SyncError::InvalidHeading {
                        actor: actor.clone(),
                        heading,
                    });
                }
                let combatant = ctx
                    .combatant_mut(actor)
                    .ok_or_else(|| SyncError::UnknownActor {
                        actor: actor.clone(),
                    })?;
                let normalized = normalize_degrees(heading);
                if normalized != heading {
                    log::warn!("heading {} from {} normalized to {}", heading, actor, normalized);
                }
                combatant.apply_heading_command(normalized, speed);
                Decoded::Heading(normalized)
            }
            CommandKind::Stop => {
                ctx.combatant_mut(actor)
                    .ok_or_else(|| SyncError::UnknownActor {
                        actor: actor.clone(),
                    })?
                    .apply_stop();
                Decoded::Stopped
            }
            CommandKind::Heartbeat { .. } => Decoded::Skipped,
        };

        self.applied += 1;
        Ok(decoded)
    }

    /// Applies every command of `frame`; failures are logged and dropped.
    pub fn process_all(
        &mut self,
        frame: &Frame,
        ctx: &mut MatchContext,
        events: &mut EventQueue,
    ) -> usize {
        let mut applied = 0;
        for command in &frame.commands {
            match self.process(command, ctx, events) {
                Ok(_) => applied += 1,
                Err(e) => {
                    self.dropped += 1;
                    log::warn!("frame {}: dropping command: {}", frame.id, e);
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::config::ArenaConfig;
    use crate::entity::CombatantProfile;
    use crate::net::PlayerId;

    fn duel() -> MatchContext {
        MatchContext::two_player(
            (PlayerId::from("a"), CombatantProfile::default()),
            (PlayerId::from("b"), CombatantProfile::default()),
            ArenaConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn unknown_actor_is_dropped_and_the_rest_apply() {
        let mut ctx = duel();
        let mut events = EventQueue::default();
        let mut processor = CommandProcessor::new();
        let frame = Frame::with_commands(
            1,
            vec![
                FrameCommand::fire("ghost"),
                FrameCommand::set_heading("a", 90.0),
            ],
        );

        let applied = processor.process_all(&frame, &mut ctx, &mut events);

        assert_eq!(applied, 1);
        assert_eq!(processor.dropped(), 1);
        let a = ctx.combatant(&PlayerId::from("a")).unwrap();
        assert_eq!(a.destination_heading(), 90.0);
    }

    #[test]
    fn out_of_range_heading_is_normalized() {
        let mut ctx = duel();
        let mut events = EventQueue::default();
        let mut processor = CommandProcessor::new();

        let decoded = processor
            .process(&FrameCommand::set_heading("a", -90.0), &mut ctx, &mut events)
            .unwrap();

        assert_eq!(decoded, Decoded::Heading(270.0));
    }

    #[test]
    fn non_finite_heading_is_dropped() {
        let mut ctx = duel();
        let mut events = EventQueue::default();
        let mut processor = CommandProcessor::new();
        let frame = Frame::with_commands(
            1,
            vec![
                FrameCommand::set_heading("a", f32::INFINITY),
                FrameCommand::set_heading("b", f32::NAN),
            ],
        );

        let applied = processor.process_all(&frame, &mut ctx, &mut events);
        for _ in 0..10 {
            ctx.step_logic(33.0, &mut events);
        }

        assert_eq!(applied, 0);
        assert_eq!(processor.dropped(), 2);
        let a = ctx.combatant(&PlayerId::from("a")).unwrap();
        assert_eq!(a.destination_heading(), 0.0);
        assert_eq!(a.logic_heading(), 0.0);
        assert_eq!(a.logic_position(), Vec2::new(45.0, 375.0));
        let b = ctx.combatant(&PlayerId::from("b")).unwrap();
        assert_eq!(b.destination_heading(), 180.0);
    }

    #[test]
    fn fire_spawns_at_the_muzzle() {
        let mut ctx = duel();
        let mut events = EventQueue::default();
        let mut processor = CommandProcessor::new();

        let decoded = processor
            .process(&FrameCommand::fire("a"), &mut ctx, &mut events)
            .unwrap();

        assert!(matches!(decoded, Decoded::Fired(_)));
        let shot = &ctx.projectiles()[0];
        assert_eq!(shot.source(), &PlayerId::from("a"));
        assert!((shot.logic_position().x - 90.0).abs() < 1e-3);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stop_collapses_destination_to_logic_heading() {
        let mut ctx = duel();
        let mut events = EventQueue::default();
        let mut processor = CommandProcessor::new();

        processor
            .process(&FrameCommand::set_heading("a", 90.0), &mut ctx, &mut events)
            .unwrap();
        processor
            .process(&FrameCommand::stop("a"), &mut ctx, &mut events)
            .unwrap();

        let a = ctx.combatant(&PlayerId::from("a")).unwrap();
        assert_eq!(a.destination_heading(), a.logic_heading());
        assert_eq!(a.speed(), 0.0);
    }
}
