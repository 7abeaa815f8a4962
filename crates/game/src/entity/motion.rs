use glam::Vec2;

/// Position kept three ways: `logic` is authoritative and only written while
/// a logic frame executes, `predicted` is a one-tick extrapolation of it and
/// `render` eases toward `predicted` in real time.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub logic: Vec2,
    pub predicted: Vec2,
    pub render: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn at(position: Vec2, radius: f32) -> Self {
        Self {
            logic: position,
            predicted: position,
            render: position,
            velocity: Vec2::ZERO,
            radius,
        }
    }

    pub fn place(&mut self, position: Vec2) {
        self.logic = position;
        self.predicted = position;
        self.render = position;
    }

    /// Advances the logic position, committing each axis only if the full
    /// circle stays inside `bounds`. A blocked axis keeps its old value, so
    /// diagonal motion against a wall slides along it.
    pub fn step_logic_walled(&mut self, dt: f32, bounds: Vec2) {
        self.logic = walled_advance(self.logic, self.velocity, dt, self.radius, bounds);
    }

    pub fn step_logic_free(&mut self, dt: f32) {
        self.logic += self.velocity * dt;
    }

    pub fn predict_walled(&mut self, dt: f32, bounds: Vec2) {
        self.predicted = walled_advance(self.logic, self.velocity, dt, self.radius, bounds);
    }

    pub fn predict_free(&mut self, dt: f32) {
        self.predicted = self.logic + self.velocity * dt;
    }

    /// Closes `rate * dt` of the gap between `render` and `predicted`,
    /// expressed as a fraction of the remaining distance clamped to `[0, 1]`.
    pub fn chase(&mut self, dt: f32, rate: f32) {
        if self.render == self.predicted {
            return;
        }

        let distance = self.render.distance(self.predicted);
        if distance <= 0.0 {
            // Coordinates differ below f32 resolution of the distance.
            if dt > 0.0 {
                self.render = self.predicted;
            }
            return;
        }

        let fraction = (rate * dt / distance).clamp(0.0, 1.0);
        self.render += (self.predicted - self.render) * fraction;
    }

    /// True when the logic circle lies completely outside `bounds`.
    pub fn is_outside(&self, bounds: Vec2) -> bool {
        let r = self.radius;
        self.logic.x + r < 0.0
            || self.logic.y + r < 0.0
            || self.logic.x - r > bounds.x
            || self.logic.y - r > bounds.y
    }
}

fn axis_fits(value: f32, radius: f32, extent: f32) -> bool {
    value - radius >= 0.0 && value + radius <= extent
}

fn walled_advance(from: Vec2, velocity: Vec2, dt: f32, radius: f32, bounds: Vec2) -> Vec2 {
    let next = from + velocity * dt;
    Vec2::new(
        if axis_fits(next.x, radius, bounds.x) { next.x } else { from.x },
        if axis_fits(next.y, radius, bounds.y) { next.y } else { from.y },
    )
}
