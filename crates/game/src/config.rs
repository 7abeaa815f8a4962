use glam::Vec2;

use crate::net::PlayerId;

pub const DEFAULT_TICK_RATE: u32 = 30;
pub const DEFAULT_JITTER_THRESHOLD: usize = 2;
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Playfield geometry and entity tuning. Distances are pixels, times are
/// milliseconds, so speeds are pixels per millisecond.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,

    pub combatant_width: f32,
    pub combatant_speed: f32,
    pub turn_step_degrees: f32,
    pub hit_points: u32,

    pub render_move_rate: f32,
    pub render_turn_rate: f32,

    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub projectile_render_rate: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1334.0,
            height: 750.0,

            combatant_width: 90.0,
            combatant_speed: 0.2,
            turn_step_degrees: 10.0,
            hit_points: 20,

            render_move_rate: 0.2,
            render_turn_rate: 10.0 / (1000.0 / 30.0),

            projectile_speed: 0.7,
            projectile_radius: 10.0,
            projectile_render_rate: 0.7,
        }
    }
}

impl ArenaConfig {
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn combatant_radius(&self) -> f32 {
        (self.combatant_width / 2.0).floor()
    }

    /// Distance from a combatant's center to where its projectiles spawn.
    pub fn muzzle_offset(&self) -> f32 {
        (self.combatant_width / 2.0).floor()
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub tick_rate: u32,
    pub jitter_threshold: usize,
    pub event_capacity: usize,
    pub local_player: Option<PlayerId>,
    pub arena: ArenaConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            jitter_threshold: DEFAULT_JITTER_THRESHOLD,
            event_capacity: 256,
            local_player: None,
            arena: ArenaConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.tick_rate.max(1))
    }

    pub fn with_local_player(mut self, id: impl Into<PlayerId>) -> Self {
        self.local_player = Some(id.into());
        self
    }
}
