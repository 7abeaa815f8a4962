use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::net::PlayerId;

use super::heading::{normalize_degrees, shortest_delta, turn_toward, velocity};
use super::motion::Body;

/// Match metadata owned by the lobby layer and carried through untouched,
/// apart from `win`, which is filled in on settlement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatantProfile {
    pub name: String,
    pub win: bool,
    pub custom: Option<String>,
}

impl CombatantProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Opaque handles the presentation layer attaches to a combatant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationLink {
    pub sprite: Option<u32>,
    pub hit_point_bar: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    id: PlayerId,
    hit_points: u32,
    body: Body,
    speed: f32,
    destination_heading: f32,
    logic_heading: f32,
    render_heading: f32,
    pub profile: CombatantProfile,
    pub presentation: PresentationLink,
}

impl Combatant {
    pub fn new(id: PlayerId, position: Vec2, heading: f32, arena: &ArenaConfig) -> Self {
        let heading = normalize_degrees(heading);
        Self {
            id,
            hit_points: arena.hit_points,
            body: Body::at(position, arena.combatant_radius()),
            speed: 0.0,
            destination_heading: heading,
            logic_heading: heading,
            render_heading: heading,
            profile: CombatantProfile::default(),
            presentation: PresentationLink::default(),
        }
    }

    pub fn with_profile(mut self, profile: CombatantProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub fn is_defeated(&self) -> bool {
        self.hit_points == 0
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn logic_position(&self) -> Vec2 {
        self.body.logic
    }

    pub fn predicted_position(&self) -> Vec2 {
        self.body.predicted
    }

    pub fn render_position(&self) -> Vec2 {
        self.body.render
    }

    pub fn radius(&self) -> f32 {
        self.body.radius
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn destination_heading(&self) -> f32 {
        self.destination_heading
    }

    pub fn logic_heading(&self) -> f32 {
        self.logic_heading
    }

    pub fn render_heading(&self) -> f32 {
        self.render_heading
    }

    /// Forces every heading to `degrees`, used at spawn and on rejoin.
    pub fn set_direction(&mut self, degrees: f32) {
        let degrees = normalize_degrees(degrees);
        self.destination_heading = degrees;
        self.logic_heading = degrees;
        self.render_heading = degrees;
        self.refresh_velocity();
    }

    /// Overwrites authoritative and displayed state from a server snapshot.
    pub fn restore(&mut self, position: Vec2, hit_points: u32, heading: f32) {
        self.body.place(position);
        self.hit_points = hit_points;
        self.set_direction(heading);
    }

    pub fn apply_heading_command(&mut self, degrees: f32, speed: f32) {
        self.destination_heading = normalize_degrees(degrees);
        self.speed = speed;
        self.refresh_velocity();
    }

    /// Halts and cancels any turn in progress at the present logic heading.
    pub fn apply_stop(&mut self) {
        self.speed = 0.0;
        self.destination_heading = self.logic_heading;
        self.refresh_velocity();
    }

    /// Returns the remaining hit points.
    pub fn take_hit(&mut self) -> u32 {
        self.hit_points = self.hit_points.saturating_sub(1);
        self.hit_points
    }

    pub fn muzzle(&self, arena: &ArenaConfig) -> Vec2 {
        self.body.logic + velocity(arena.muzzle_offset(), self.logic_heading)
    }

    pub fn step_logic(&mut self, dt: f32, arena: &ArenaConfig) {
        self.body.step_logic_walled(dt, arena.bounds());

        if self.logic_heading != self.destination_heading {
            self.logic_heading = turn_toward(
                self.logic_heading,
                self.destination_heading,
                arena.turn_step_degrees,
            );
            self.refresh_velocity();
        }
    }

    pub fn step_prediction(&mut self, dt: f32, arena: &ArenaConfig) {
        self.body.predict_walled(dt, arena.bounds());
    }

    pub fn step_render(&mut self, dt: f32, arena: &ArenaConfig) {
        self.body.chase(dt, arena.render_move_rate);

        if self.render_heading == self.logic_heading {
            return;
        }
        let delta = shortest_delta(self.render_heading, self.logic_heading);
        if delta == 0.0 {
            if dt > 0.0 {
                self.render_heading = self.logic_heading;
            }
            return;
        }
        let fraction = (arena.render_turn_rate * dt / delta.abs()).clamp(0.0, 1.0);
        self.render_heading = normalize_degrees(self.render_heading + delta * fraction);
    }

    fn refresh_velocity(&mut self) {
        self.body.velocity = velocity(self.speed, self.logic_heading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combatant_at(x: f32, y: f32, heading: f32) -> (Combatant, ArenaConfig) {
        let arena = ArenaConfig::default();
        let combatant = Combatant::new(PlayerId::from("a"), Vec2::new(x, y), heading, &arena);
        (combatant, arena)
    }

    #[test]
    fn heading_turns_ten_degrees_per_frame() {
        let (mut c, arena) = combatant_at(500.0, 300.0, 0.0);
        c.apply_heading_command(35.0, arena.combatant_speed);

        c.step_logic(33.0, &arena);
        assert_eq!(c.logic_heading(), 10.0);
        c.step_logic(33.0, &arena);
        c.step_logic(33.0, &arena);
        assert_eq!(c.logic_heading(), 30.0);
        c.step_logic(33.0, &arena);
        assert_eq!(c.logic_heading(), 35.0);
    }

    #[test]
    fn turning_through_zero_stays_normalized() {
        let (mut c, arena) = combatant_at(500.0, 300.0, 5.0);
        c.apply_heading_command(330.0, arena.combatant_speed);

        c.step_logic(33.0, &arena);
        assert_eq!(c.logic_heading(), 355.0);
        for _ in 0..4 {
            c.step_logic(33.0, &arena);
            assert!((0.0..360.0).contains(&c.logic_heading()));
        }
        assert_eq!(c.logic_heading(), 330.0);
    }

    #[test]
    fn stop_freezes_turn_and_motion() {
        let (mut c, arena) = combatant_at(500.0, 300.0, 0.0);
        c.apply_heading_command(90.0, arena.combatant_speed);
        c.step_logic(33.0, &arena);

        c.apply_stop();
        let before = c.logic_position();
        c.step_logic(33.0, &arena);

        assert_eq!(c.destination_heading(), 10.0);
        assert_eq!(c.logic_heading(), 10.0);
        assert_eq!(c.logic_position(), before);
    }

    #[test]
    fn heading_command_at_current_heading_resumes_motion() {
        let (mut c, arena) = combatant_at(500.0, 300.0, 0.0);
        c.apply_stop();

        c.apply_heading_command(0.0, arena.combatant_speed);
        c.step_logic(33.0, &arena);

        assert_eq!(c.speed(), arena.combatant_speed);
        assert_eq!(c.logic_heading(), 0.0);
        assert!((c.logic_position().x - (500.0 + arena.combatant_speed * 33.0)).abs() < 1e-3);
        assert_eq!(c.logic_position().y, 300.0);
    }

    #[test]
    fn wall_blocks_only_the_offending_axis() {
        let arena = ArenaConfig::default();
        let mut c = Combatant::new(
            PlayerId::from("a"),
            Vec2::new(arena.width - 46.0, 300.0),
            45.0,
            &arena,
        );
        c.apply_heading_command(45.0, arena.combatant_speed);

        c.step_logic(33.0, &arena);

        assert_eq!(c.logic_position().x, arena.width - 46.0);
        assert!(c.logic_position().y > 300.0);
    }

    #[test]
    fn render_heading_eases_toward_logic() {
        let (mut c, arena) = combatant_at(500.0, 300.0, 0.0);
        c.apply_heading_command(90.0, 0.0);
        c.step_logic(33.0, &arena);
        c.step_logic(33.0, &arena);

        c.step_render(1000.0 / 60.0, &arena);
        assert!((c.render_heading() - 5.0).abs() < 1e-3);

        c.step_render(1000.0, &arena);
        assert!((c.render_heading() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn hit_points_floor_at_zero() {
        let (mut c, _) = combatant_at(500.0, 300.0, 0.0);
        for _ in 0..25 {
            c.take_hit();
        }
        assert_eq!(c.hit_points(), 0);
        assert!(c.is_defeated());
    }

    #[test]
    fn muzzle_sits_half_a_width_ahead() {
        let (c, arena) = combatant_at(500.0, 300.0, 180.0);
        let muzzle = c.muzzle(&arena);
        assert!((muzzle.x - 455.0).abs() < 1e-3);
        assert!((muzzle.y - 300.0).abs() < 1e-3);
    }
}
