//! Ring clipper, line limiter, and robust clip-envelope computation (C8).

use crate::numeric::GeoFloat;
use crate::precision::{Envelope, PrecisionModel};
use geo_types::{Coord, Line, LineString};

/// Cohen-Sutherland polygon clipping against an axis-aligned rectangle, one
/// side at a time in the order bottom, right, top, left. The result may
/// contain collinear segments along the clip boundary; downstream noding
/// handles coincident edges, so this is not cleaned up here.
pub struct RingClipper<T: GeoFloat> {
    env: Envelope<T>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

const CLIP_ORDER: [Side; 4] = [Side::Bottom, Side::Right, Side::Top, Side::Left];

impl<T: GeoFloat> RingClipper<T> {
    pub fn new(env: Envelope<T>) -> Self {
        RingClipper { env }
    }

    /// `ring` is expected closed (first == last coordinate). Returns a
    /// clipped, closed ring, or an empty vec if nothing of it survives.
    pub fn clip(&self, ring: &[Coord<T>]) -> Vec<Coord<T>> {
        if ring.len() < 2 {
            return Vec::new();
        }
        let mut coords: Vec<Coord<T>> = ring.to_vec();
        for (i, &side) in CLIP_ORDER.iter().enumerate() {
            if coords.len() < 2 {
                return Vec::new();
            }
            coords = self.clip_side(&coords, side);
            if i == CLIP_ORDER.len() - 1 {
                close_ring(&mut coords);
            }
        }
        coords
    }

    fn clip_side(&self, coords: &[Coord<T>], side: Side) -> Vec<Coord<T>> {
        let mut out = Vec::with_capacity(coords.len());
        let n = coords.len();
        for i in 0..n {
            let current = coords[i];
            let prev = coords[(i + n - 1) % n];
            let current_in = self.is_inside(current, side);
            let prev_in = self.is_inside(prev, side);

            if current_in {
                if !prev_in {
                    out.push(self.intersect(prev, current, side));
                }
                out.push(current);
            } else if prev_in {
                out.push(self.intersect(prev, current, side));
            }
        }
        out
    }

    fn is_inside(&self, p: Coord<T>, side: Side) -> bool {
        match side {
            Side::Bottom => p.y >= self.env.min_y(),
            Side::Right => p.x <= self.env.max_x(),
            Side::Top => p.y <= self.env.max_y(),
            Side::Left => p.x >= self.env.min_x(),
        }
    }

    /// Exact parametric intersection of `p -> q` with the (axis-parallel)
    /// clip boundary named by `side`.
    fn intersect(&self, p: Coord<T>, q: Coord<T>, side: Side) -> Coord<T> {
        match side {
            Side::Bottom => {
                let t = (self.env.min_y() - p.y) / (q.y - p.y);
                Coord {
                    x: p.x + t * (q.x - p.x),
                    y: self.env.min_y(),
                }
            }
            Side::Top => {
                let t = (self.env.max_y() - p.y) / (q.y - p.y);
                Coord {
                    x: p.x + t * (q.x - p.x),
                    y: self.env.max_y(),
                }
            }
            Side::Right => {
                let t = (self.env.max_x() - p.x) / (q.x - p.x);
                Coord {
                    x: self.env.max_x(),
                    y: p.y + t * (q.y - p.y),
                }
            }
            Side::Left => {
                let t = (self.env.min_x() - p.x) / (q.x - p.x);
                Coord {
                    x: self.env.min_x(),
                    y: p.y + t * (q.y - p.y),
                }
            }
        }
    }
}

fn close_ring<T: GeoFloat>(coords: &mut Vec<Coord<T>>) {
    if coords.is_empty() {
        return;
    }
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
}

/// Emits subsections of a polyline that may interact with the clip envelope.
/// Not expected to clip exactly: a fully-outside run neighboring a
/// crossing segment is retained as a single connecting segment, so the
/// output never silently drops topology a downstream consumer might need.
pub struct LineLimiter<T: GeoFloat> {
    env: Envelope<T>,
}

impl<T: GeoFloat> LineLimiter<T> {
    pub fn new(env: Envelope<T>) -> Self {
        LineLimiter { env }
    }

    pub fn limit(&self, coords: &[Coord<T>]) -> Vec<Vec<Coord<T>>> {
        if coords.len() < 20 || self.fully_covered(coords) {
            return vec![coords.to_vec()];
        }

        let mut sections: Vec<Vec<Coord<T>>> = Vec::new();
        let mut current: Vec<Coord<T>> = Vec::new();

        for i in 0..coords.len() - 1 {
            let seg = Line::new(coords[i], coords[i + 1]);
            let seg_env = Envelope::of_points(seg.start, seg.end);
            let relevant = seg_env.intersects(&self.env);

            if relevant {
                if current.is_empty() {
                    current.push(seg.start);
                }
                current.push(seg.end);
            } else if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            sections.push(current);
        }
        sections
    }

    fn fully_covered(&self, coords: &[Coord<T>]) -> bool {
        let mut env = Envelope::empty();
        for &c in coords {
            env.expand_to_include(c);
        }
        self.env.covers(&env)
    }
}

/// The clip envelope used for one overlay operation: the intersection of the
/// input envelopes (for intersection/difference), expanded by a safety
/// margin, then further expanded to include both endpoints of any input
/// polygon edge that crosses the nominal target envelope.
pub fn robust_clip_envelope<T: GeoFloat>(
    a_env: &Envelope<T>,
    b_env: Option<&Envelope<T>>,
    pm: &PrecisionModel<T>,
    crossing_edges: impl Iterator<Item = Line<T>>,
) -> Envelope<T> {
    let mut target = *a_env;
    if let Some(b) = b_env {
        target = target.intersection(b);
        if target.is_empty() {
            return target;
        }
    }

    let margin = match pm {
        PrecisionModel::Floating => {
            let smaller_dim = target.width().min(target.height());
            let tenth = T::one() / ten();
            smaller_dim * tenth
        }
        PrecisionModel::Fixed { scale } => {
            let three = T::one() + T::one() + T::one();
            three / *scale
        }
    };
    // Nudge the margin out by one ULP so a segment sitting exactly on the
    // nominal envelope boundary is never clipped away by floating-point
    // round-off in the margin computation itself.
    let margin = margin.next_after(T::infinity());
    let mut expanded = target.expand_by(margin);

    for edge in crossing_edges {
        let edge_env = Envelope::of_points(edge.start, edge.end);
        if edge_env.intersects(&expanded) {
            expanded.expand_to_include(edge.start);
            expanded.expand_to_include(edge.end);
        }
    }
    expanded
}

fn ten<T: GeoFloat>() -> T {
    let mut t = T::zero();
    for _ in 0..10 {
        t = t + T::one();
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    fn square(min: f64, max: f64) -> Vec<Coord<f64>> {
        vec![
            coord! {x: min, y: min},
            coord! {x: max, y: min},
            coord! {x: max, y: max},
            coord! {x: min, y: max},
            coord! {x: min, y: min},
        ]
    }

    #[test]
    fn ring_fully_inside_is_unchanged_in_shape() {
        let clip_env = Envelope::of_points(coord! {x: -10.0, y: -10.0}, coord! {x: 10.0, y: 10.0});
        let clipper = RingClipper::new(clip_env);
        let ring = square(0.0, 1.0);
        let out = clipper.clip(&ring);
        assert_eq!(out.len(), ring.len());
    }

    #[test]
    fn ring_fully_outside_clips_to_empty() {
        let clip_env = Envelope::of_points(coord! {x: -1.0, y: -1.0}, coord! {x: 1.0, y: 1.0});
        let clipper = RingClipper::new(clip_env);
        let ring = square(10.0, 11.0);
        let out = clipper.clip(&ring);
        assert!(out.is_empty());
    }

    #[test]
    fn ring_straddling_clip_edge_is_cut() {
        let clip_env = Envelope::of_points(coord! {x: -10.0, y: -10.0}, coord! {x: 0.5, y: 10.0});
        let clipper = RingClipper::new(clip_env);
        let ring = square(0.0, 1.0);
        let out = clipper.clip(&ring);
        assert!(!out.is_empty());
        for c in &out {
            assert!(c.x <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn short_lines_bypass_limiting() {
        let env = Envelope::of_points(coord! {x: 0.0, y: 0.0}, coord! {x: 1.0, y: 1.0});
        let limiter = LineLimiter::new(env);
        let coords = vec![coord! {x: 5.0, y: 5.0}, coord! {x: 6.0, y: 6.0}];
        let sections = limiter.limit(&coords);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].len(), 2);
    }
}
