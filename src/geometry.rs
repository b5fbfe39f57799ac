use crate::pose::Point;

/// Angle in degrees at vertex `b` formed by the rays b->a and b->c.
///
/// Always within [0, 180]. Coincident points do not fail; they produce some
/// angle inside the same range.
pub fn angle(a: Point, b: Point, c: Point) -> f64 {
    let radians = (c.1 - b.1).atan2(c.0 - b.0) - (a.1 - b.1).atan2(a.0 - b.0);
    let degrees = radians.to_degrees().abs();

    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}
