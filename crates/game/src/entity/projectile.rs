use std::fmt;

use glam::Vec2;

use crate::net::PlayerId;

use super::heading::{normalize_degrees, velocity};
use super::motion::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u32);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A shot in flight. Heading and speed are fixed when it is fired.
#[derive(Debug, Clone)]
pub struct Projectile {
    id: ProjectileId,
    source: PlayerId,
    heading: f32,
    speed: f32,
    body: Body,
}

impl Projectile {
    pub fn new(
        id: ProjectileId,
        source: PlayerId,
        origin: Vec2,
        heading: f32,
        speed: f32,
        radius: f32,
    ) -> Self {
        let heading = normalize_degrees(heading);
        let mut body = Body::at(origin, radius);
        body.velocity = velocity(speed, heading);
        Self {
            id,
            source,
            heading,
            speed,
            body,
        }
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn source(&self) -> &PlayerId {
        &self.source
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn logic_position(&self) -> Vec2 {
        self.body.logic
    }

    pub fn render_position(&self) -> Vec2 {
        self.body.render
    }

    pub fn radius(&self) -> f32 {
        self.body.radius
    }

    pub fn step_logic(&mut self, dt: f32) {
        self.body.step_logic_free(dt);
    }

    pub fn step_prediction(&mut self, dt: f32) {
        self.body.predict_free(dt);
    }

    pub fn step_render(&mut self, dt: f32, rate: f32) {
        self.body.chase(dt, rate);
    }

    pub fn is_outside(&self, bounds: Vec2) -> bool {
        self.body.is_outside(bounds)
    }
}
