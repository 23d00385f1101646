//! Street matcher: which cleaning zone is a parked car on?

use std::sync::Arc;

use geo::Point;

use crate::models::zone::CleaningZone;
use crate::spatial::queries::point_to_polyline_distance;

/// A zone within the match threshold of a query point
#[derive(Clone, Debug)]
pub struct ZoneMatch {
    pub zone: Arc<CleaningZone>,
    pub distance_m: f64,
    /// Position of the zone in the input order
    pub position: usize,
}

fn threshold_is_valid(max_distance_m: f64) -> bool {
    !max_distance_m.is_nan() && max_distance_m >= 0.0
}

/// Nearest zone within `max_distance_m` (inclusive) of `point`.
///
/// Linear scan; ties keep the first zone in input order.
pub fn match_zone(
    point: Point,
    zones: &[Arc<CleaningZone>],
    max_distance_m: f64,
) -> Option<ZoneMatch> {
    if !threshold_is_valid(max_distance_m) {
        return None;
    }

    best_of(point, zones.iter().enumerate())
        .filter(|found| found.distance_m <= max_distance_m)
}

/// Every zone within `max_distance_m` of `point`, nearest first.
///
/// The sort is stable, so equally distant zones keep their input order.
pub fn nearby_zones(
    point: Point,
    zones: &[Arc<CleaningZone>],
    max_distance_m: f64,
) -> Vec<ZoneMatch> {
    if !threshold_is_valid(max_distance_m) {
        return Vec::new();
    }

    let mut nearby: Vec<ZoneMatch> = zones
        .iter()
        .enumerate()
        .map(|(position, zone)| ZoneMatch {
            zone: zone.clone(),
            distance_m: point_to_polyline_distance(point, &zone.geometry),
            position,
        })
        .filter(|found| found.distance_m <= max_distance_m)
        .collect();

    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby
}

/// Minimum-distance zone over `(position, zone)` pairs in ascending position.
pub(crate) fn best_of<'a>(
    point: Point,
    candidates: impl Iterator<Item = (usize, &'a Arc<CleaningZone>)>,
) -> Option<ZoneMatch> {
    let mut best: Option<ZoneMatch> = None;

    for (position, zone) in candidates {
        let distance_m = point_to_polyline_distance(point, &zone.geometry);
        let closer = best
            .as_ref()
            .map_or(true, |current| distance_m < current.distance_m);

        if closer {
            best = Some(ZoneMatch {
                zone: zone.clone(),
                distance_m,
                position,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::StreetName;
    use crate::models::{DayCode, DaySet};
    use geo::LineString;

    const LAT: f64 = 43.7731;
    const LON: f64 = 11.2560;
    const EARTH_RADIUS_M: f64 = 6_371_008.8;

    fn offset(east_m: f64, north_m: f64) -> Point {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (east_m / (EARTH_RADIUS_M * LAT.to_radians().cos())).to_degrees();
        Point::new(LON + dlon, LAT + dlat)
    }

    fn zone(name: &str, day: DayCode, points: Vec<Point>) -> Arc<CleaningZone> {
        Arc::new(
            CleaningZone::new(
                StreetName::new(name),
                None,
                DaySet::single(day),
                LineString::from(points),
            )
            .unwrap(),
        )
    }

    /// A straight 100 m east-west segment at the origin
    fn via_roma() -> Arc<CleaningZone> {
        zone("VIA ROMA", DayCode::Mon, vec![offset(0.0, 0.0), offset(100.0, 0.0)])
    }

    #[test]
    fn test_match_within_threshold() {
        let zones = vec![via_roma()];
        let point = offset(50.0, 15.0);

        let found = match_zone(point, &zones, 20.0).expect("should match");
        assert_eq!(found.zone.street.as_str(), "VIA ROMA");
        assert!((found.distance_m - 15.0).abs() < 0.1);

        assert!(match_zone(point, &zones, 10.0).is_none());
    }

    #[test]
    fn test_vertex_matches_at_zero_threshold() {
        let zones = vec![via_roma()];
        for vertex in zones[0].geometry.points() {
            for max in [0.0, 0.5, 20.0] {
                let found = match_zone(vertex, &zones, max).expect("vertex is on the zone");
                assert_eq!(found.distance_m, 0.0);
            }
        }
    }

    #[test]
    fn test_points_along_zone_match_at_zero_threshold() {
        let bent = zone(
            "VIA DEL PROCONSOLO",
            DayCode::Thu,
            vec![offset(0.0, 40.0), offset(70.0, 95.0), offset(70.0, 160.0)],
        );
        let zones = vec![via_roma(), bent];

        for (position, zone) in zones.iter().enumerate() {
            for segment in zone.geometry.lines() {
                for t in [0.1, 0.25, 0.5, 0.75, 0.9] {
                    let point = Point::new(
                        segment.start.x + t * segment.dx(),
                        segment.start.y + t * segment.dy(),
                    );
                    let found = match_zone(point, &zones, 0.0).expect("point lies on the zone");
                    assert_eq!(found.position, position);
                    assert_eq!(found.distance_m, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let zones = vec![via_roma()];
        let point = offset(50.0, 15.0);
        let exact = point_to_polyline_distance(point, &zones[0].geometry);

        assert!(match_zone(point, &zones, exact).is_some());
        assert!(match_zone(point, &zones, exact - 1e-6).is_none());
    }

    #[test]
    fn test_empty_and_invalid_threshold() {
        assert!(match_zone(offset(0.0, 0.0), &[], 100.0).is_none());

        let zones = vec![via_roma()];
        assert!(match_zone(offset(0.0, 0.0), &zones, -1.0).is_none());
        assert!(match_zone(offset(0.0, 0.0), &zones, f64::NAN).is_none());
    }

    #[test]
    fn test_nearest_zone_wins() {
        let far = zone("VIA LONTANA", DayCode::Tue, vec![offset(0.0, 12.0), offset(100.0, 12.0)]);
        let near = zone("VIA VICINA", DayCode::Wed, vec![offset(0.0, -4.0), offset(100.0, -4.0)]);
        let zones = vec![far, near];

        let found = match_zone(offset(50.0, 0.0), &zones, 20.0).unwrap();
        assert_eq!(found.zone.street.as_str(), "VIA VICINA");
        assert_eq!(found.position, 1);
    }

    #[test]
    fn test_tie_keeps_first_in_input_order() {
        let mon = via_roma();
        let thu = zone("VIA ROMA", DayCode::Thu, vec![offset(0.0, 0.0), offset(100.0, 0.0)]);
        let zones = vec![mon, thu];

        let found = match_zone(offset(50.0, 5.0), &zones, 20.0).unwrap();
        assert_eq!(found.position, 0);
        assert!(found.zone.days.contains(DayCode::Mon));
    }

    #[test]
    fn test_nearby_sorted_by_distance() {
        let far = zone("VIA LONTANA", DayCode::Tue, vec![offset(0.0, 12.0), offset(100.0, 12.0)]);
        let near = zone("VIA VICINA", DayCode::Wed, vec![offset(0.0, -4.0), offset(100.0, -4.0)]);
        let out = zone("VIA FUORI", DayCode::Fri, vec![offset(0.0, 80.0), offset(100.0, 80.0)]);
        let zones = vec![far, out, near];

        let nearby = nearby_zones(offset(50.0, 0.0), &zones, 20.0);
        let names: Vec<&str> = nearby.iter().map(|m| m.zone.street.as_str()).collect();
        assert_eq!(names, vec!["VIA VICINA", "VIA LONTANA"]);
    }
}
