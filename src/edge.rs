//! Noded edges (C9): the fully-noded, merged segment strings the overlay
//! graph is built from.

use crate::clip::{robust_clip_envelope, LineLimiter, RingClipper};
use crate::noding::snap_rounding::SnapRoundingNoder;
use crate::noding::{McIndexNoder, Noder, SegmentString, ValidatingNoder};
use crate::numeric::GeoFloat;
use crate::precision::{Envelope, PrecisionModel};
use geo_types::{Coord, Geometry, Line, LineString, Polygon};

/// Which input a geometry fed to the overlay came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIndex {
    A,
    B,
}

/// Dimension of the geometry an edge was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDim {
    Line,
    Area,
}

/// Provenance attached to a segment string before noding: which input it
/// came from, its orientation marker, and whether it's a hole ring.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSourceInfo {
    pub index: InputIndex,
    /// +1 if canonically oriented (shell CW, hole CCW), -1 otherwise. 0 for
    /// line input.
    pub depth_delta: i32,
    pub is_hole: bool,
    pub dim: EdgeDim,
}

impl EdgeSourceInfo {
    pub fn for_line(index: InputIndex) -> Self {
        EdgeSourceInfo {
            index,
            depth_delta: 0,
            is_hole: false,
            dim: EdgeDim::Line,
        }
    }

    pub fn for_ring(index: InputIndex, is_hole: bool, is_canonically_oriented: bool) -> Self {
        EdgeSourceInfo {
            index,
            depth_delta: if is_canonically_oriented { 1 } else { -1 },
            is_hole,
            dim: EdgeDim::Area,
        }
    }
}

/// A fully noded, possibly-merged edge. `depth_delta` and `is_hole`/`is_shell`
/// are the merged sums/ORs over every source segment string that collapsed
/// onto this edge's `(p0, p1)` pair.
#[derive(Debug, Clone)]
pub struct Edge<T: GeoFloat> {
    pub coords: Vec<Coord<T>>,
    pub a_dim: Option<EdgeDim>,
    pub b_dim: Option<EdgeDim>,
    pub a_depth_delta: i32,
    pub b_depth_delta: i32,
    pub a_is_hole: bool,
    pub b_is_hole: bool,
    pub a_is_shell: bool,
    pub b_is_shell: bool,
}

impl<T: GeoFloat> Edge<T> {
    pub fn new(coords: Vec<Coord<T>>, source: EdgeSourceInfo) -> Self {
        let mut e = Edge {
            coords,
            a_dim: None,
            b_dim: None,
            a_depth_delta: 0,
            b_depth_delta: 0,
            a_is_hole: false,
            b_is_hole: false,
            a_is_shell: false,
            b_is_shell: false,
        };
        e.apply(source, true);
        e
    }

    fn apply(&mut self, source: EdgeSourceInfo, forward: bool) {
        let delta = if forward { source.depth_delta } else { -source.depth_delta };
        match source.index {
            InputIndex::A => {
                self.a_dim = Some(source.dim);
                self.a_depth_delta += delta;
                self.a_is_hole |= source.is_hole;
                self.a_is_shell |= !source.is_hole && source.dim == EdgeDim::Area;
            }
            InputIndex::B => {
                self.b_dim = Some(source.dim);
                self.b_depth_delta += delta;
                self.b_is_hole |= source.is_hole;
                self.b_is_shell |= !source.is_hole && source.dim == EdgeDim::Area;
            }
        }
    }

    pub fn p0(&self) -> Coord<T> {
        self.coords[0]
    }

    pub fn p1(&self) -> Coord<T> {
        *self.coords.last().unwrap()
    }

    /// `true` iff `self` and `other` coincide as undirected edges (same
    /// endpoints, opposite direction counts as a match).
    pub fn direction_matches(&self, first_seg_other_start: Coord<T>, first_seg_other_end: Coord<T>) -> bool {
        self.coords.len() >= 2
            && self.coords[0] == first_seg_other_start
            && self.coords[1] == first_seg_other_end
    }
}

/// Groups edges by their undirected `(p0, p1)` key so [`merge_edges`] can
/// find coincident copies without an O(n^2) scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(u64, u64, u64, u64);

impl EdgeKey {
    pub fn of<T: GeoFloat>(p0: Coord<T>, p1: Coord<T>) -> Self {
        let a = bitkey(p0);
        let b = bitkey(p1);
        // Order-independent: the key is the same regardless of which
        // endpoint is "first" in a given source segment string.
        if a <= b {
            EdgeKey(a.0, a.1, b.0, b.1)
        } else {
            EdgeKey(b.0, b.1, a.0, a.1)
        }
    }
}

fn bitkey<T: GeoFloat>(c: Coord<T>) -> (u64, u64) {
    (c.x.to_f64().unwrap_or(0.0).to_bits(), c.y.to_f64().unwrap_or(0.0).to_bits())
}

/// Merges edges whose first segment coincides (as an undirected pair),
/// summing depth deltas (negated when traversed backward relative to the
/// first-seen copy) and OR-ing hole/shell flags.
///
/// Panics (an `Unexpected` topology invariant in the caller's terms) if two
/// edges claiming to coincide have different lengths — a symptom of a
/// noding bug upstream.
pub fn merge_edges<T: GeoFloat>(
    raw: Vec<(Vec<Coord<T>>, EdgeSourceInfo)>,
) -> Result<Vec<Edge<T>>, crate::error::OverlayError<T>> {
    use std::collections::HashMap;

    let mut by_key: HashMap<EdgeKey, usize> = HashMap::new();
    let mut edges: Vec<Edge<T>> = Vec::new();

    for (coords, source) in raw {
        if coords.len() < 2 {
            continue;
        }
        let key = EdgeKey::of(coords[0], coords[1]);
        match by_key.get(&key) {
            None => {
                let idx = edges.len();
                edges.push(Edge::new(coords, source));
                by_key.insert(key, idx);
            }
            Some(&idx) => {
                let existing = &mut edges[idx];
                if existing.coords.len() != coords.len() {
                    return Err(crate::error::OverlayError::unexpected(
                        "merged edges of different lengths",
                    ));
                }
                let forward = existing.coords[0] == coords[0];
                existing.apply(source, forward);
            }
        }
    }

    Ok(edges)
}

/// Signed area (shoelace, ×2) of a ring, computed from the **unrounded**
/// coordinates — rounding first could flip the sign of a near-degenerate
/// ring and misclassify its canonical orientation.
pub(crate) fn signed_area<T: GeoFloat>(ring: &[Coord<T>]) -> T {
    let mut sum = T::zero();
    for i in 0..ring.len().saturating_sub(1) {
        let p = ring[i];
        let q = ring[i + 1];
        sum = sum + (p.x * q.y - q.x * p.y);
    }
    sum
}

/// `true` iff `ring` is clockwise (the canonical shell orientation).
pub(crate) fn is_clockwise<T: GeoFloat>(ring: &[Coord<T>]) -> bool {
    signed_area(ring) < T::zero()
}

/// Extracts labelled, clipped/limited segment strings from one input
/// geometry, ready for noding.
fn extract_segment_strings<T: GeoFloat>(
    geom: &Geometry<T>,
    index: InputIndex,
    ring_clipper: Option<&RingClipper<T>>,
    line_limiter: Option<&LineLimiter<T>>,
) -> Vec<SegmentString<T, EdgeSourceInfo>> {
    let mut out = Vec::new();

    let mut add_ring = |ring: &LineString<T>, is_hole: bool| {
        let canonical = if is_hole {
            !is_clockwise(&ring.0)
        } else {
            is_clockwise(&ring.0)
        };
        let source = EdgeSourceInfo::for_ring(index, is_hole, canonical);
        let coords = match ring_clipper {
            Some(clipper) => clipper.clip(&ring.0),
            None => ring.0.clone(),
        };
        let coords = crate::noding::remove_repeated_points(&coords);
        if coords.len() >= 2 {
            out.push(SegmentString::new(coords, source));
        }
    };

    let mut add_polygon = |poly: &Polygon<T>| {
        add_ring(poly.exterior(), false);
        for hole in poly.interiors() {
            add_ring(hole, true);
        }
    };

    let mut add_line = |line: &LineString<T>| {
        let source = EdgeSourceInfo::for_line(index);
        let sections = match line_limiter {
            Some(limiter) => limiter.limit(&line.0),
            None => vec![line.0.clone()],
        };
        for section in sections {
            let coords = crate::noding::remove_repeated_points(&section);
            if coords.len() >= 2 {
                out.push(SegmentString::new(coords, source));
            }
        }
    };

    match geom {
        Geometry::Polygon(p) => add_polygon(p),
        Geometry::MultiPolygon(mp) => {
            for p in &mp.0 {
                add_polygon(p);
            }
        }
        Geometry::LineString(ls) => add_line(ls),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                add_line(ls);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                out.extend(extract_segment_strings(g, index, ring_clipper, line_limiter));
            }
        }
        _ => {}
    }
    out
}

pub(crate) fn geometry_envelope<T: GeoFloat>(geom: &Geometry<T>) -> Envelope<T> {
    let mut env = Envelope::empty();
    fn walk<T: GeoFloat>(geom: &Geometry<T>, env: &mut Envelope<T>) {
        match geom {
            Geometry::Polygon(p) => {
                for c in p.exterior().0.iter() {
                    env.expand_to_include(*c);
                }
                for h in p.interiors() {
                    for c in h.0.iter() {
                        env.expand_to_include(*c);
                    }
                }
            }
            Geometry::MultiPolygon(mp) => {
                for p in &mp.0 {
                    walk(&Geometry::Polygon(p.clone()), env);
                }
            }
            Geometry::LineString(ls) => {
                for c in ls.0.iter() {
                    env.expand_to_include(*c);
                }
            }
            Geometry::MultiLineString(mls) => {
                for ls in &mls.0 {
                    walk(&Geometry::LineString(ls.clone()), env);
                }
            }
            Geometry::Point(pt) => env.expand_to_include(pt.0),
            Geometry::MultiPoint(mp) => {
                for p in &mp.0 {
                    env.expand_to_include(p.0);
                }
            }
            Geometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    walk(g, env);
                }
            }
            _ => {}
        }
    }
    walk(geom, &mut env);
    env
}

fn area_edges_crossing<T: GeoFloat>(geom: &Geometry<T>, target: &Envelope<T>) -> Vec<Line<T>> {
    let mut out = Vec::new();
    fn lines_of<T: GeoFloat>(ring: &LineString<T>, target: &Envelope<T>, out: &mut Vec<Line<T>>) {
        for i in 0..ring.0.len().saturating_sub(1) {
            let seg = Line::new(ring.0[i], ring.0[i + 1]);
            let seg_env = Envelope::of_points(seg.start, seg.end);
            if seg_env.intersects(target) && !seg_env.covers(target) && !target.covers(&seg_env) {
                out.push(seg);
            }
        }
    }
    match geom {
        Geometry::Polygon(p) => {
            lines_of(p.exterior(), target, &mut out);
            for h in p.interiors() {
                lines_of(h, target, &mut out);
            }
        }
        Geometry::MultiPolygon(mp) => {
            for p in &mp.0 {
                out.extend(area_edges_crossing(&Geometry::Polygon(p.clone()), target));
            }
        }
        _ => {}
    }
    out
}

/// Builds the fully noded, merged edge set for one overlay call.
///
/// `b` is `None` for a unary union. `custom_noder`, if supplied, overrides
/// the precision-model-driven noder selection.
pub fn build_edges<T: GeoFloat>(
    a: &Geometry<T>,
    b: Option<&Geometry<T>>,
    pm: &PrecisionModel<T>,
    custom_noder: Option<&mut dyn Noder<T, EdgeSourceInfo>>,
) -> Result<Vec<Edge<T>>, crate::error::OverlayError<T>> {
    let a_env = geometry_envelope(a);
    let b_env = b.map(geometry_envelope);

    let needs_clip = b.is_some();
    let clip_env = if needs_clip {
        let mut crossing = area_edges_crossing(a, &a_env);
        if let Some(b_geom) = b {
            crossing.extend(area_edges_crossing(b_geom, &a_env));
        }
        Some(robust_clip_envelope(&a_env, b_env.as_ref(), pm, crossing.into_iter()))
    } else {
        None
    };

    let ring_clipper = clip_env.map(RingClipper::new);
    let line_limiter = clip_env.map(LineLimiter::new);

    let mut strings = extract_segment_strings(a, InputIndex::A, ring_clipper.as_ref(), line_limiter.as_ref());
    if let Some(b_geom) = b {
        strings.extend(extract_segment_strings(
            b_geom,
            InputIndex::B,
            ring_clipper.as_ref(),
            line_limiter.as_ref(),
        ));
    }

    let noded = if let Some(noder) = custom_noder {
        noder.compute_nodes(strings)
    } else {
        match pm {
            PrecisionModel::Floating => {
                let mut validating = ValidatingNoder::new(McIndexNoder);
                validating.compute_nodes_checked(strings)?
            }
            PrecisionModel::Fixed { scale } => {
                let mut noder = SnapRoundingNoder::new(*scale);
                noder.compute_nodes(strings)
            }
        }
    };

    let raw: Vec<(Vec<Coord<T>>, EdgeSourceInfo)> = noded
        .into_iter()
        .filter(|s| {
            let distinct: std::collections::HashSet<(u64, u64)> =
                s.coords.iter().map(|&c| bitkey(c)).collect();
            distinct.len() >= 2
        })
        .map(|s| (s.coords, s.context))
        .collect();

    merge_edges(raw)
}
