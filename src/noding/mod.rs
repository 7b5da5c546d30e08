//! Noding: the stage that turns possibly-crossing input segment strings into
//! a fully noded set where no segment's interior touches another segment's
//! vertex.
//!
//! [`Noder`] is the injection point named in the external interface: the
//! floating-precision path uses [`McIndexNoder`] wrapped in a
//! [`ValidatingNoder`]; the fixed-precision path uses
//! [`snap_rounding::SnapRoundingNoder`]; very-fine-precision or
//! floating-precision retries use [`snapping::SnappingNoder`]. Callers may
//! also supply a custom implementation.

pub mod snap_rounding;
pub mod snapping;

use crate::chain::MonotoneChainIndex;
use crate::numeric::GeoFloat;
use crate::predicates::line_intersection;
use geo_types::{Coord, Line};

/// A polyline (open) or ring (closed) to be noded, tagged with an opaque
/// `context` the caller can use to recover which input edge a noded
/// substring came from.
#[derive(Debug, Clone)]
pub struct SegmentString<T: GeoFloat, C> {
    pub coords: Vec<Coord<T>>,
    pub context: C,
}

impl<T: GeoFloat, C> SegmentString<T, C> {
    pub fn new(coords: Vec<Coord<T>>, context: C) -> Self {
        SegmentString { coords, context }
    }

    pub fn is_closed(&self) -> bool {
        self.coords.len() > 1 && self.coords.first() == self.coords.last()
    }

    pub fn segment_count(&self) -> usize {
        self.coords.len().saturating_sub(1)
    }

    pub fn segment(&self, i: usize) -> Line<T> {
        Line::new(self.coords[i], self.coords[i + 1])
    }
}

/// The noder injection point: `compute_nodes` consumes input segment strings
/// and produces fully noded substrings, each still tagged with its origin
/// context.
pub trait Noder<T: GeoFloat, C: Clone> {
    fn compute_nodes(&mut self, input: Vec<SegmentString<T, C>>) -> Vec<SegmentString<T, C>>;
}

/// Removes consecutive duplicate coordinates (including, for closed rings, a
/// duplicate of the closing point against the one before it).
pub fn remove_repeated_points<T: GeoFloat>(coords: &[Coord<T>]) -> Vec<Coord<T>> {
    let mut out: Vec<Coord<T>> = Vec::with_capacity(coords.len());
    for &c in coords {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    out
}

/// Basic monotone-chain noder: finds every interior intersection between
/// segments of the input (within one string and across strings) via
/// [`MonotoneChainIndex::compute_overlaps`], and splits segments at each
/// recorded intersection coordinate. Collinear intersections contribute both
/// endpoints of the overlap as nodes.
pub struct McIndexNoder;

impl<T: GeoFloat, C: Clone> Noder<T, C> for McIndexNoder {
    fn compute_nodes(&mut self, input: Vec<SegmentString<T, C>>) -> Vec<SegmentString<T, C>> {
        let indices: Vec<MonotoneChainIndex<T>> =
            input.iter().map(|s| MonotoneChainIndex::new(s.coords.clone())).collect();

        // node_coords[i] holds, per segment index within string i, a set of
        // extra interior coordinates to splice in, keyed by segment offset.
        let mut extra_nodes: Vec<Vec<Vec<Coord<T>>>> =
            input.iter().map(|s| vec![Vec::new(); s.segment_count()]).collect();

        for i in 0..input.len() {
            for j in i..input.len() {
                let (left, right) = if i == j {
                    (&indices[i], &indices[i])
                } else {
                    (&indices[i], &indices[j])
                };
                left.compute_overlaps(right, T::zero(), |_ca, sa, _cb, sb| {
                    if i == j && sa == sb {
                        return;
                    }
                    let seg_a = indices[i].segment(_ca, sa);
                    let seg_b = indices[j].segment(_cb, sb);
                    if let Some(result) = line_intersection(seg_a, seg_b) {
                        add_interior_node(&mut extra_nodes[i][sa], seg_a, &result);
                        add_interior_node(&mut extra_nodes[j][sb], seg_b, &result);
                    }
                });
            }
        }

        input
            .into_iter()
            .zip(extra_nodes)
            .map(|(s, extras)| split_segment_string(s, extras))
            .collect()
    }
}

fn add_interior_node<T: GeoFloat>(
    bucket: &mut Vec<Coord<T>>,
    seg: Line<T>,
    result: &crate::predicates::LineIntersection<T>,
) {
    use crate::predicates::LineIntersection::*;
    let is_interior = |c: Coord<T>| c != seg.start && c != seg.end;
    match *result {
        SinglePoint { intersection, .. } => {
            if is_interior(intersection) {
                bucket.push(intersection);
            }
        }
        Collinear { intersection } => {
            if is_interior(intersection.start) {
                bucket.push(intersection.start);
            }
            if is_interior(intersection.end) {
                bucket.push(intersection.end);
            }
        }
    }
}

fn split_segment_string<T: GeoFloat, C: Clone>(
    s: SegmentString<T, C>,
    extras: Vec<Vec<Coord<T>>>,
) -> SegmentString<T, C> {
    let mut out = Vec::with_capacity(s.coords.len());
    for i in 0..s.segment_count() {
        let seg = s.segment(i);
        out.push(seg.start);
        let mut mids = extras[i].clone();
        mids.sort_by(|a, b| edge_order(seg, *a, *b));
        out.extend(mids);
    }
    out.push(*s.coords.last().unwrap());
    SegmentString::new(remove_repeated_points(&out), s.context)
}

fn edge_order<T: GeoFloat>(seg: Line<T>, a: Coord<T>, b: Coord<T>) -> std::cmp::Ordering {
    use crate::predicates::edge_distance;
    edge_distance(a, seg)
        .partial_cmp(&edge_distance(b, seg))
        .unwrap_or(std::cmp::Ordering::Equal)
}

/// Checks a noded output for an interior vertex of one segment string lying
/// on the interior of a segment of another (or itself) — the signature of an
/// incomplete noding pass.
pub struct FastNodingValidator;

impl FastNodingValidator {
    /// Returns the first offending coordinate, if noding is invalid.
    pub fn validate<T: GeoFloat, C: Clone>(strings: &[SegmentString<T, C>]) -> Option<Coord<T>> {
        let indices: Vec<MonotoneChainIndex<T>> =
            strings.iter().map(|s| MonotoneChainIndex::new(s.coords.clone())).collect();

        for (i, si) in strings.iter().enumerate() {
            for (j, sj) in strings.iter().enumerate() {
                if j < i {
                    continue;
                }
                let mut found = None;
                indices[i].compute_overlaps(&indices[j], T::zero(), |ca, sa, cb, sb| {
                    if found.is_some() {
                        return;
                    }
                    if i == j && sa == sb {
                        return;
                    }
                    let seg_a = indices[i].segment(ca, sa);
                    let seg_b = indices[j].segment(cb, sb);
                    if let Some(crate::predicates::LineIntersection::SinglePoint {
                        intersection,
                        is_proper: false,
                    }) = line_intersection(seg_a, seg_b)
                    {
                        // An improper (endpoint) intersection is fine only
                        // if it coincides with an endpoint of *both*
                        // segments (a shared node); otherwise a vertex of
                        // one lies on the interior of the other.
                        let on_a_endpoint = intersection == seg_a.start || intersection == seg_a.end;
                        let on_b_endpoint = intersection == seg_b.start || intersection == seg_b.end;
                        if !(on_a_endpoint && on_b_endpoint) {
                            found = Some(intersection);
                        }
                    }
                });
                if let Some(c) = found {
                    return Some(c);
                }
                let _ = si;
                let _ = sj;
            }
        }
        None
    }
}

/// Wraps any [`Noder`] and re-checks its output with [`FastNodingValidator`],
/// surfacing a topology exception if an unnoded interior intersection
/// survives.
pub struct ValidatingNoder<N> {
    pub inner: N,
}

impl<N> ValidatingNoder<N> {
    pub fn new(inner: N) -> Self {
        ValidatingNoder { inner }
    }
}

impl<T: GeoFloat, C: Clone, N: Noder<T, C>> ValidatingNoder<N> {
    pub fn compute_nodes_checked(
        &mut self,
        input: Vec<SegmentString<T, C>>,
    ) -> Result<Vec<SegmentString<T, C>>, crate::error::OverlayError<T>> {
        let result = self.inner.compute_nodes(input);
        if let Some(coord) = FastNodingValidator::validate(&result) {
            return Err(crate::error::OverlayError::noding_failure(coord));
        }
        Ok(result)
    }
}
