use glam::Vec2;

use crate::event::{DespawnCause, EventQueue, MatchEvent};

use super::world::MatchContext;

pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    a.distance(b) <= a_radius + b_radius
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub hits: u32,
    pub match_over: bool,
}

/// Post-logic pass: each projectile is tested against every combatant other
/// than its shooter, on logic positions. A hit consumes the projectile and
/// one hit point.
pub fn arbitrate(ctx: &mut MatchContext, events: &mut EventQueue) -> CollisionReport {
    if ctx.is_over() {
        return CollisionReport::default();
    }

    let frame_id = ctx.frame_id();
    let mut hits = 0;
    let (combatants, projectiles) = ctx.parts_mut();

    projectiles.retain(|shot| {
        let target = combatants.iter_mut().find(|c| {
            c.id() != shot.source()
                && circles_overlap(
                    c.logic_position(),
                    c.radius(),
                    shot.logic_position(),
                    shot.radius(),
                )
        });
        let Some(target) = target else {
            return true;
        };

        let hit_points = target.take_hit();
        hits += 1;
        log::debug!(
            "frame {:?}: projectile {} hit {} ({} hp left)",
            frame_id,
            shot.id(),
            target.id(),
            hit_points
        );
        events.push(
            frame_id,
            MatchEvent::ProjectileDespawned {
                projectile: shot.id(),
                cause: DespawnCause::Hit,
            },
        );
        events.push(
            frame_id,
            MatchEvent::HitPointsChanged {
                combatant: target.id().clone(),
                hit_points,
            },
        );
        false
    });

    let match_over = ctx.resolve_outcome(events).is_some();
    CollisionReport { hits, match_over }
}
