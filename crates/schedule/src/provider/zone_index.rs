//! In-memory zone index backed by one loaded schedule.
//!
//! Stores all zones in stable load order with an R-tree of street segments
//! for candidate lookup. Results always agree with the linear scan in
//! [`crate::spatial::matching`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use geo::Point;
use rstar::{RTree, AABB};

use crate::identifiers::ZoneKey;
use crate::models::zone::CleaningZone;
use crate::spatial::index::SegmentNode;
use crate::spatial::matching::{best_of, ZoneMatch};
use crate::spatial::queries::{meters_to_degree_box, point_to_polyline_distance, ON_SEGMENT_TOLERANCE_M};

/// Immutable snapshot of the queryable cleaning zones
///
/// Readers hold it behind an `Arc`; a refresh builds a new one.
#[derive(Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<Arc<CleaningZone>>,
    key_map: HashMap<ZoneKey, usize>,
    segment_tree: RTree<SegmentNode>,
}

impl ZoneIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zones(zones: Vec<CleaningZone>) -> Self {
        let zones: Vec<Arc<CleaningZone>> = zones.into_iter().map(Arc::new).collect();

        // First occurrence wins for duplicate keys
        let mut key_map = HashMap::new();
        for (position, zone) in zones.iter().enumerate() {
            key_map.entry(zone.key()).or_insert(position);
        }

        let mut segments = Vec::new();
        for (position, zone) in zones.iter().enumerate() {
            for segment in zone.geometry.lines() {
                segments.push(SegmentNode::new(segment, position));
            }
        }

        Self {
            zones,
            key_map,
            segment_tree: RTree::bulk_load(segments),
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[Arc<CleaningZone>] {
        &self.zones
    }

    pub fn get(&self, key: &ZoneKey) -> Option<&Arc<CleaningZone>> {
        self.key_map.get(key).map(|&position| &self.zones[position])
    }

    /// Nearest zone within `max_distance_m` (inclusive); ties keep load order.
    pub fn match_point(&self, point: Point, max_distance_m: f64) -> Option<ZoneMatch> {
        if max_distance_m.is_nan() || max_distance_m < 0.0 {
            return None;
        }

        let candidates = self.candidates(point, max_distance_m);
        best_of(
            point,
            candidates.into_iter().map(|position| (position, &self.zones[position])),
        )
        .filter(|found| found.distance_m <= max_distance_m)
    }

    /// Every zone within `max_distance_m`, nearest first
    pub fn zones_near(&self, point: Point, max_distance_m: f64) -> Vec<ZoneMatch> {
        if max_distance_m.is_nan() || max_distance_m < 0.0 {
            return Vec::new();
        }

        let mut nearby: Vec<ZoneMatch> = self
            .candidates(point, max_distance_m)
            .into_iter()
            .map(|position| {
                let zone = &self.zones[position];
                ZoneMatch {
                    zone: zone.clone(),
                    distance_m: point_to_polyline_distance(point, &zone.geometry),
                    position,
                }
            })
            .filter(|found| found.distance_m <= max_distance_m)
            .collect();

        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        nearby
    }

    /// Case-insensitive substring lookup by street name.
    ///
    /// When several zones match, the one cleaned soonest on or after `from`
    /// wins; zones with no computable date fall back to load order.
    pub fn find_by_name(&self, name: &str, from: NaiveDate) -> Option<Arc<CleaningZone>> {
        let needle = name.trim().to_uppercase();
        if needle.is_empty() {
            return None;
        }

        let matching: Vec<&Arc<CleaningZone>> = self
            .zones
            .iter()
            .filter(|zone| zone.street.as_str().to_uppercase().contains(&needle))
            .collect();

        let soonest = matching
            .iter()
            .filter_map(|zone| zone.next_cleaning(from).map(|date| (date, *zone)))
            .min_by_key(|(date, _)| *date)
            .map(|(_, zone)| zone.clone());

        soonest.or_else(|| matching.first().map(|zone| (*zone).clone()))
    }

    /// Zone positions, ascending, whose segments may lie within range.
    fn candidates(&self, point: Point, max_distance_m: f64) -> BTreeSet<usize> {
        if max_distance_m.is_infinite() {
            return (0..self.zones.len()).collect();
        }

        // Padded so points on a segment survive rounding at a zero radius
        let (dlon, dlat) = meters_to_degree_box(max_distance_m + ON_SEGMENT_TOLERANCE_M, point.y());
        let envelope = AABB::from_corners(
            [point.x() - dlon, point.y() - dlat],
            [point.x() + dlon, point.y() + dlat],
        );

        self.segment_tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|node| node.zone)
            .collect()
    }
}
