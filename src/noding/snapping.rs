//! Snapping noder (C7): an alternative to snap-rounding usable at floating or
//! very-fine fixed precision, built around a tolerance-based KD-tree (the
//! "snapping point index") rather than a hot-pixel grid.
//!
//! 1. Snap every input vertex through the index; duplicate consecutive
//!    vertices after snapping are removed.
//! 2. Run the monotone-chain noder; for every single-point intersection,
//!    snap the intersection point through the same index and add it to both
//!    segments. Adjacent segments on the same string (including the ring
//!    closing pair) never intersect each other in a way that counts here.

use super::{remove_repeated_points, SegmentString};
use crate::chain::MonotoneChainIndex;
use crate::kdtree::KdTree;
use crate::numeric::GeoFloat;
use crate::predicates::{edge_distance, line_intersection, LineIntersection};
use geo_types::Coord;

pub struct SnappingNoder<T: GeoFloat> {
    tolerance: T,
}

impl<T: GeoFloat> SnappingNoder<T> {
    pub fn new(tolerance: T) -> Self {
        SnappingNoder { tolerance }
    }

    fn near_vertex_tolerance(&self) -> T {
        self.tolerance
    }
}

impl<T: GeoFloat, C: Clone> super::Noder<T, C> for SnappingNoder<T> {
    fn compute_nodes(&mut self, input: Vec<SegmentString<T, C>>) -> Vec<SegmentString<T, C>> {
        let mut index: KdTree<T> = KdTree::new(self.tolerance);

        // Phase 1: snap vertices.
        let snapped_inputs: Vec<SegmentString<T, C>> = input
            .into_iter()
            .map(|s| {
                let coords: Vec<Coord<T>> = s.coords.iter().map(|&c| index.insert(c)).collect();
                SegmentString::new(remove_repeated_points(&coords), s.context)
            })
            .filter(|s: &SegmentString<T, C>| s.coords.len() >= 2)
            .collect();

        // Phase 2: snap intersections.
        let mc_indices: Vec<MonotoneChainIndex<T>> = snapped_inputs
            .iter()
            .map(|s| MonotoneChainIndex::new(s.coords.clone()))
            .collect();

        let mut extra_nodes: Vec<Vec<Vec<Coord<T>>>> = snapped_inputs
            .iter()
            .map(|s| vec![Vec::new(); s.segment_count()])
            .collect();

        let near_tol = self.near_vertex_tolerance();

        for i in 0..snapped_inputs.len() {
            for j in i..snapped_inputs.len() {
                let left = &mc_indices[i];
                let right = &mc_indices[j];
                left.compute_overlaps(right, near_tol, |_, sa, _, sb| {
                    if i == j && is_adjacent_or_same(&snapped_inputs[i], sa, sb) {
                        return;
                    }
                    let seg_a = mc_indices[i].segment(0, sa);
                    let seg_b = mc_indices[j].segment(0, sb);
                    if let Some(LineIntersection::SinglePoint { intersection, .. }) =
                        line_intersection(seg_a, seg_b)
                    {
                        let snapped = index.insert(intersection);
                        push_if_interior(&mut extra_nodes[i][sa], seg_a, snapped);
                        push_if_interior(&mut extra_nodes[j][sb], seg_b, snapped);
                    }
                });
            }
        }

        snapped_inputs
            .into_iter()
            .zip(extra_nodes)
            .map(|(s, extras)| splice(s, extras))
            .collect()
    }
}

/// Segments sharing a string and either identical or consecutive (including
/// the ring-closing pair) are adjacent and excluded from intersection
/// reporting — they always meet at their shared endpoint, which is not a
/// noding event.
fn is_adjacent_or_same<T: GeoFloat, C>(s: &SegmentString<T, C>, a: usize, b: usize) -> bool {
    if a == b {
        return true;
    }
    let n = s.segment_count();
    let diff = if a > b { a - b } else { b - a };
    if diff == 1 {
        return true;
    }
    s.is_closed() && diff == n - 1
}

fn push_if_interior<T: GeoFloat>(bucket: &mut Vec<Coord<T>>, seg: geo_types::Line<T>, c: Coord<T>) {
    if c != seg.start && c != seg.end {
        bucket.push(c);
    }
}

fn splice<T: GeoFloat, C: Clone>(s: SegmentString<T, C>, extras: Vec<Vec<Coord<T>>>) -> SegmentString<T, C> {
    let mut out = Vec::with_capacity(s.coords.len());
    for i in 0..s.segment_count() {
        let seg = s.segment(i);
        out.push(seg.start);
        let mut mids = extras[i].clone();
        mids.sort_by(|a, b| {
            edge_distance(*a, seg)
                .partial_cmp(&edge_distance(*b, seg))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out.extend(mids);
    }
    out.push(*s.coords.last().unwrap());
    SegmentString::new(remove_repeated_points(&out), s.context)
}
