//! Distance engine.
//!
//! Uses the Haversine formula for distances on Earth's surface. Segment
//! projection happens in a local equirectangular frame centered on the query
//! point, which is accurate enough for street segments under a kilometer.

use geo::{HaversineDistance, LineString, Point};

/// Earth radius used for the local tangent frame (meters)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Offsets below this in the local frame are rounding noise
pub(crate) const ON_SEGMENT_TOLERANCE_M: f64 = 1e-3;

/// Meters per degree of latitude, rounded down so boxes built from it err wide
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Great-circle distance between two points in meters
pub fn point_distance(p: Point, q: Point) -> f64 {
    p.haversine_distance(&q)
}

/// Distance from `p` to the segment `a`–`b` in meters.
///
/// The projection parameter is clamped to [0, 1] so points beyond either end
/// measure to the nearest endpoint.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    if a == b {
        return point_distance(p, a);
    }

    // Local frame: x east, y north, meters, origin at p
    let lat_scale = EARTH_RADIUS_M * p.y().to_radians().cos();
    let to_local = |q: Point| {
        (
            (q.x() - p.x()).to_radians() * lat_scale,
            (q.y() - p.y()).to_radians() * EARTH_RADIUS_M,
        )
    };

    let (ax, ay) = to_local(a);
    let (bx, by) = to_local(b);
    let (dx, dy) = (bx - ax, by - ay);

    let length_2 = dx * dx + dy * dy;
    if length_2 == 0.0 {
        return point_distance(p, a);
    }

    let t = (-ax * dx - ay * dy) / length_2;
    if t <= 0.0 {
        return point_distance(p, a);
    }
    if t >= 1.0 {
        return point_distance(p, b);
    }

    // Closest point within a millimeter of p: p lies on the segment
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    if cx.hypot(cy) < ON_SEGMENT_TOLERANCE_M {
        return 0.0;
    }

    // The frame is linear in degrees, so interpolate the closest point there
    let closest = Point::new(a.x() + t * (b.x() - a.x()), a.y() + t * (b.y() - a.y()));
    point_distance(p, closest)
}

/// Minimum distance from `p` to any segment of `polyline` in meters.
///
/// A single vertex degrades to point distance; an empty line is infinitely far.
pub fn point_to_polyline_distance(p: Point, polyline: &LineString<f64>) -> f64 {
    match polyline.0.as_slice() {
        [] => f64::INFINITY,
        [only] => point_distance(p, Point::from(*only)),
        _ => polyline
            .lines()
            .map(|segment| point_to_segment_distance(p, segment.start.into(), segment.end.into()))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Half-sizes (longitude, latitude) in degrees of a box that contains every
/// point within `meters` of a point at `latitude`.
pub fn meters_to_degree_box(meters: f64, latitude: f64) -> (f64, f64) {
    let lat_deg = (meters / METERS_PER_DEGREE).min(180.0);
    let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
    let lon_deg = (meters / (METERS_PER_DEGREE * cos_lat)).min(360.0);
    (lon_deg, lat_deg)
}
