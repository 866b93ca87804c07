use crate::field::Field;
use crate::math::Vec2;

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

/// Distance along the ray to the first field edge it meets.
pub fn distance_to_boundary(field: &Field, origin: Vec2, heading: f64) -> f64 {
    let direction = Vec2::from_degrees(heading);
    let mut nearest = f64::INFINITY;

    if direction.x > 0.0 {
        nearest = nearest.min((field.field_width - origin.x) / direction.x);
    } else if direction.x < 0.0 {
        nearest = nearest.min(-origin.x / direction.x);
    }

    if direction.y > 0.0 {
        nearest = nearest.min((field.field_length - origin.y) / direction.y);
    } else if direction.y < 0.0 {
        nearest = nearest.min(-origin.y / direction.y);
    }

    nearest.max(0.0)
}

/// Distance along the ray to the near surface of `circle`, if it is hit.
/// Circles that contain the origin are ignored.
pub fn distance_to_circle(circle: &Circle, origin: Vec2, heading: f64) -> Option<f64> {
    let direction = Vec2::from_degrees(heading);
    let to_center = circle.center - origin;
    if to_center.magnitude() <= circle.radius {
        return None;
    }

    let along = to_center.dot(&direction);
    if along <= 0.0 {
        return None;
    }

    let miss_squared = to_center.dot(&to_center) - along * along;
    let radius_squared = circle.radius * circle.radius;
    if miss_squared > radius_squared {
        return None;
    }

    Some(along - (radius_squared - miss_squared).sqrt())
}

/// Range a perfect single-beam laser would report: nearest circle, else the field edge.
pub fn raycast(field: &Field, circles: &[Circle], origin: Vec2, heading: f64) -> f64 {
    let wall = distance_to_boundary(field, origin, heading);

    circles
        .iter()
        .filter_map(|circle| distance_to_circle(circle, origin, heading))
        .filter(|distance| *distance < wall)
        .fold(wall, f64::min)
}
