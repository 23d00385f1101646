//! R-tree nodes for spatial pre-filtering.
//!
//! Each node is one street segment tagged with the position of its zone in
//! snapshot order. The tree only narrows the candidate set with a degree-space
//! bounding box; final distances are always great-circle.

use geo::Line;
use rstar::{RTreeObject, AABB};

#[derive(Clone, Debug)]
pub struct SegmentNode {
    /// Position of the owning zone in the snapshot's stable order
    pub zone: usize,
    pub segment: Line,
    aabb: AABB<[f64; 2]>,
}

impl SegmentNode {
    pub fn new(segment: Line, zone: usize) -> Self {
        let start = [segment.start.x, segment.start.y];
        let end = [segment.end.x, segment.end.y];

        Self {
            zone,
            segment,
            aabb: AABB::from_corners(start, end),
        }
    }
}

impl RTreeObject for SegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}
