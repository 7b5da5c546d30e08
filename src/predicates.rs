//! Exact-sign orientation and full-precision segment intersection.
//!
//! Strongly inspired by, and meant to produce the same results as, JTS's
//! `RobustLineIntersector` / `CGAlgorithmsDD`. Intersections are always
//! computed in full precision, regardless of the overlay's target precision
//! model — rounding happens downstream, in the noder.

use crate::kernels::{HasKernel, Kernel, Orientation};
use crate::numeric::GeoFloat;
use crate::precision::Envelope;
use geo_types::{Coord, Line};

/// `orientationIndex(p, q, r)`: -1, 0 or +1, guaranteed consistent for any
/// permutation of the triangle `p, q, r`.
pub fn orientation_index<T: GeoFloat>(p: Coord<T>, q: Coord<T>, r: Coord<T>) -> i8 {
    <T as HasKernel>::Ker::orient2d(p, q, r).index()
}

fn line_envelope<T: GeoFloat>(l: Line<T>) -> Envelope<T> {
    Envelope::of_points(l.start, l.end)
}

/// The result of intersecting two line segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineIntersection<T: GeoFloat> {
    /// The segments meet at exactly one point.
    SinglePoint {
        intersection: Coord<T>,
        /// `true` iff the point lies in the interior of *both* segments.
        is_proper: bool,
    },
    /// The segments overlap collinearly along a sub-segment.
    Collinear { intersection: Line<T> },
}

impl<T: GeoFloat> LineIntersection<T> {
    pub fn is_proper(&self) -> bool {
        match self {
            LineIntersection::Collinear { .. } => false,
            LineIntersection::SinglePoint { is_proper, .. } => *is_proper,
        }
    }

    /// Number of intersection points this result contributes: 0 is never
    /// returned (absence is `None` on [`line_intersection`]), 1 for a single
    /// point, 2 for a collinear overlap (its two endpoints).
    pub fn count(&self) -> u8 {
        match self {
            LineIntersection::SinglePoint { .. } => 1,
            LineIntersection::Collinear { .. } => 2,
        }
    }
}

/// Computes the intersection, if any, between two line segments.
pub fn line_intersection<T: GeoFloat>(p: Line<T>, q: Line<T>) -> Option<LineIntersection<T>> {
    if !line_envelope(p).intersects(&line_envelope(q)) {
        return None;
    }

    use Orientation::*;
    let p_q1 = <T as HasKernel>::Ker::orient2d(p.start, p.end, q.start);
    let p_q2 = <T as HasKernel>::Ker::orient2d(p.start, p.end, q.end);
    if matches!(
        (p_q1, p_q2),
        (Clockwise, Clockwise) | (CounterClockwise, CounterClockwise)
    ) {
        return None;
    }

    let q_p1 = <T as HasKernel>::Ker::orient2d(q.start, q.end, p.start);
    let q_p2 = <T as HasKernel>::Ker::orient2d(q.start, q.end, p.end);
    if matches!(
        (q_p1, q_p2),
        (Clockwise, Clockwise) | (CounterClockwise, CounterClockwise)
    ) {
        return None;
    }

    if matches!((p_q1, p_q2, q_p1, q_p2), (Collinear, Collinear, Collinear, Collinear)) {
        return collinear_intersection(p, q);
    }

    // Not collinear, so there is exactly one intersection point. If it falls
    // exactly on an endpoint, use the endpoint's exact coordinate rather than
    // recomputing it, for robustness.
    if p_q1 == Collinear || p_q2 == Collinear || q_p1 == Collinear || q_p2 == Collinear {
        let intersection = if p.start == q.start || p.start == q.end {
            p.start
        } else if p.end == q.start || p.end == q.end {
            p.end
        } else if p_q1 == Collinear {
            q.start
        } else if p_q2 == Collinear {
            q.end
        } else if q_p1 == Collinear {
            p.start
        } else {
            p.end
        };
        Some(LineIntersection::SinglePoint {
            intersection,
            is_proper: false,
        })
    } else {
        let intersection = proper_intersection(p, q);
        Some(LineIntersection::SinglePoint {
            intersection,
            is_proper: true,
        })
    }
}

fn collinear_intersection<T: GeoFloat>(p: Line<T>, q: Line<T>) -> Option<LineIntersection<T>> {
    fn collinear<T: GeoFloat>(intersection: Line<T>) -> LineIntersection<T> {
        LineIntersection::Collinear { intersection }
    }
    fn improper<T: GeoFloat>(intersection: Coord<T>) -> LineIntersection<T> {
        LineIntersection::SinglePoint {
            intersection,
            is_proper: false,
        }
    }

    let p_bounds = line_envelope(p);
    let q_bounds = line_envelope(q);
    Some(match (
        p_bounds.intersects_point(q.start),
        p_bounds.intersects_point(q.end),
        q_bounds.intersects_point(p.start),
        q_bounds.intersects_point(p.end),
    ) {
        (true, true, _, _) => collinear(q),
        (_, _, true, true) => collinear(p),
        (true, false, true, false) if q.start == p.start => improper(q.start),
        (true, _, true, _) => collinear(Line::new(q.start, p.start)),
        (true, false, false, true) if q.start == p.end => improper(q.start),
        (true, _, _, true) => collinear(Line::new(q.start, p.end)),
        (false, true, true, false) if q.end == p.start => improper(q.end),
        (_, true, true, _) => collinear(Line::new(q.end, p.start)),
        (false, true, false, true) if q.end == p.end => improper(q.end),
        (_, true, _, true) => collinear(Line::new(q.end, p.end)),
        _ => return None,
    })
}

/// The endpoint (of either segment) closest to the *other* segment — used as
/// a fallback when the homogeneous-coordinate computation is too
/// ill-conditioned to trust (near-parallel segments).
fn nearest_endpoint<T: GeoFloat>(p: Line<T>, q: Line<T>) -> Coord<T> {
    fn point_line_distance<T: GeoFloat>(p: Coord<T>, l: Line<T>) -> T {
        let dx = l.end.x - l.start.x;
        let dy = l.end.y - l.start.y;
        let len2 = dx * dx + dy * dy;
        if len2 == T::zero() {
            let ddx = p.x - l.start.x;
            let ddy = p.y - l.start.y;
            return (ddx * ddx + ddy * ddy).sqrt();
        }
        let t = ((p.x - l.start.x) * dx + (p.y - l.start.y) * dy) / len2;
        let t = t.max(T::zero()).min(T::one());
        let projx = l.start.x + t * dx;
        let projy = l.start.y + t * dy;
        let ddx = p.x - projx;
        let ddy = p.y - projy;
        (ddx * ddx + ddy * ddy).sqrt()
    }

    let mut nearest = p.start;
    let mut min_dist = point_line_distance(p.start, q);

    let d = point_line_distance(p.end, q);
    if d < min_dist {
        min_dist = d;
        nearest = p.end;
    }
    let d = point_line_distance(q.start, p);
    if d < min_dist {
        min_dist = d;
        nearest = q.start;
    }
    let d = point_line_distance(q.end, p);
    if d < min_dist {
        nearest = q.end;
    }
    nearest
}

fn raw_line_intersection<T: GeoFloat>(p: Line<T>, q: Line<T>) -> Option<Coord<T>> {
    let p_min_x = p.start.x.min(p.end.x);
    let p_min_y = p.start.y.min(p.end.y);
    let p_max_x = p.start.x.max(p.end.x);
    let p_max_y = p.start.y.max(p.end.y);
    let q_min_x = q.start.x.min(q.end.x);
    let q_min_y = q.start.y.min(q.end.y);
    let q_max_x = q.start.x.max(q.end.x);
    let q_max_y = q.start.y.max(q.end.y);

    let int_min_x = p_min_x.max(q_min_x);
    let int_max_x = p_max_x.min(q_max_x);
    let int_min_y = p_min_y.max(q_min_y);
    let int_max_y = p_max_y.min(q_max_y);

    let two = T::one() + T::one();
    let mid_x = (int_min_x + int_max_x) / two;
    let mid_y = (int_min_y + int_max_y) / two;

    // Condition ordinates by subtracting the midpoint: removes common
    // significant digits so the homogeneous-coordinate solve keeps more
    // usable bits of precision.
    let p1x = p.start.x - mid_x;
    let p1y = p.start.y - mid_y;
    let p2x = p.end.x - mid_x;
    let p2y = p.end.y - mid_y;
    let q1x = q.start.x - mid_x;
    let q1y = q.start.y - mid_y;
    let q2x = q.end.x - mid_x;
    let q2y = q.end.y - mid_y;

    let px = p1y - p2y;
    let py = p2x - p1x;
    let pw = p1x * p2y - p2x * p1y;

    let qx = q1y - q2y;
    let qy = q2x - q1x;
    let qw = q1x * q2y - q2x * q1y;

    let xw = py * qw - qy * pw;
    let yw = qx * pw - px * qw;
    let w = px * qy - qx * py;

    let x_int = xw / w;
    let y_int = yw / w;

    if x_int.is_nan() || x_int.is_infinite() || y_int.is_nan() || y_int.is_infinite() {
        None
    } else {
        Some(Coord {
            x: x_int + mid_x,
            y: y_int + mid_y,
        })
    }
}

fn proper_intersection<T: GeoFloat>(p: Line<T>, q: Line<T>) -> Coord<T> {
    let mut int_pt = raw_line_intersection(p, q).unwrap_or_else(|| nearest_endpoint(p, q));
    if !(line_envelope(p).intersects_point(int_pt) && line_envelope(q).intersects_point(int_pt)) {
        int_pt = nearest_endpoint(p, q);
    }
    int_pt
}

/// The parametric position of `intersection` along `line`, measured by
/// whichever of `dx`/`dy` is larger (a robust, if not Euclidean, ordering
/// metric — see JTS `RobustLineIntersector.computeEdgeDistance`).
pub fn edge_distance<T: GeoFloat>(intersection: Coord<T>, line: Line<T>) -> T {
    let dx = (line.end.x - line.start.x).abs();
    let dy = (line.end.y - line.start.y).abs();

    if intersection == line.start {
        T::zero()
    } else if intersection == line.end {
        dx.max(dy)
    } else {
        let idx = (intersection.x - line.start.x).abs();
        let idy = (intersection.y - line.start.y).abs();
        let dist = if dx > dy { idx } else { idy };
        if dist == T::zero() {
            idx.max(idy)
        } else {
            dist
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn crossing_lines_are_proper() {
        let a = Line::new(coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0});
        let b = Line::new(coord! {x: 0.0, y: 5.0}, coord! {x: 5.0, y: 0.0});
        let expected = LineIntersection::SinglePoint {
            intersection: coord! {x: 2.5, y: 2.5},
            is_proper: true,
        };
        assert_eq!(line_intersection(a, b), Some(expected));
    }

    #[test]
    fn disjoint_lines_have_no_intersection() {
        let a = Line::new(coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0});
        let b = Line::new(coord! {x: 0.0, y: 1.0}, coord! {x: 5.0, y: 6.0});
        assert_eq!(line_intersection(a, b), None);
    }

    #[test]
    fn shared_endpoint_is_improper() {
        let a = Line::new(coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0});
        let b = Line::new(coord! {x: 5.0, y: 5.0}, coord! {x: 5.0, y: 0.0});
        let expected = LineIntersection::SinglePoint {
            intersection: coord! {x: 5.0, y: 5.0},
            is_proper: false,
        };
        assert_eq!(line_intersection(a, b), Some(expected));
    }

    #[test]
    fn overlapping_collinear_segments() {
        let a = Line::new(coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0});
        let b = Line::new(coord! {x: 3.0, y: 3.0}, coord! {x: 6.0, y: 6.0});
        let expected = LineIntersection::Collinear {
            intersection: Line::new(coord! {x: 3.0, y: 3.0}, coord! {x: 5.0, y: 5.0}),
        };
        assert_eq!(line_intersection(a, b), Some(expected));
    }

    #[test]
    fn orientation_index_is_consistent_under_permutation() {
        let p = coord! {x: 0.0, y: 0.0};
        let q = coord! {x: 1.0, y: 0.0};
        let r = coord! {x: 1.0, y: 1.0};
        let pqr = orientation_index(p, q, r);
        let qrp = orientation_index(q, r, p);
        let rpq = orientation_index(r, p, q);
        assert_eq!(pqr, qrp);
        assert_eq!(pqr, rpq);
    }
}
