pub mod vec2;

pub use vec2::Vec2;

/// Wraps any angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Heading in `[0, 360)` that points from `from` towards `to`.
pub fn bearing_degrees(from: Vec2, to: Vec2) -> f64 {
    let delta = to - from;
    normalize_degrees(delta.y.atan2(delta.x).to_degrees())
}
