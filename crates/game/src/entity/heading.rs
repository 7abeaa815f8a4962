use glam::Vec2;

/// Wraps any angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Splits a speed along a heading. Screen space: +y points down, so a
/// heading of 90 degrees moves toward larger y.
pub fn velocity(speed: f32, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(cos * speed, sin * speed)
}

/// Steps `current` toward `target` by at most `step` degrees along the
/// shortest arc, snapping once the remaining distance fits in one step.
pub fn turn_toward(current: f32, target: f32, step: f32) -> f32 {
    let delta = shortest_delta(current, target);
    if delta.abs() <= step {
        normalize_degrees(target)
    } else {
        normalize_degrees(current + step.copysign(delta))
    }
}
