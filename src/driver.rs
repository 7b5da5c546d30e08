//! The robust overlay driver (C12, §4.11) and the crate's public entry
//! points (§6).
//!
//! [`overlay`] runs the pipeline once, at whatever precision model the
//! caller asks for. [`overlay_robust`] wraps it in the retry ladder: on a
//! retryable failure at floating precision it tries the snapping noder at a
//! widening tolerance, then self-snapping each input through a unary union
//! at that tolerance, then finally falls back to snap-rounding at a
//! heuristic "safe" grid scale. If every fallback also fails, the original
//! floating-precision error is what gets returned — a later failure at a
//! coarser precision is never more informative than the first one.

use crate::build;
use crate::edge;
use crate::error::{InvalidInputKind, OverlayError};
use crate::graph::labeller::label_graph;
use crate::graph::OverlayGraph;
use crate::numeric::GeoFloat;
use crate::noding::snap_rounding::SnapRoundingNoder;
use crate::noding::snapping::SnappingNoder;
use crate::noding::Noder;
use crate::op::OpType;
use crate::precision::PrecisionModel;
use geo_types::{Coord, Geometry, MultiPoint, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeomKind {
    Empty,
    Point,
    Line,
    Area,
    Mixed,
}

fn combine(a: GeomKind, b: GeomKind) -> GeomKind {
    match (a, b) {
        (GeomKind::Empty, x) | (x, GeomKind::Empty) => x,
        (x, y) if x == y => x,
        _ => GeomKind::Mixed,
    }
}

fn geometry_kind<T: GeoFloat>(geom: &Geometry<T>) -> GeomKind {
    match geom {
        Geometry::Point(_) | Geometry::MultiPoint(_) => GeomKind::Point,
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => GeomKind::Line,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => GeomKind::Area,
        Geometry::GeometryCollection(gc) => {
            if gc.0.is_empty() {
                GeomKind::Empty
            } else {
                gc.0.iter().map(geometry_kind).fold(GeomKind::Empty, combine)
            }
        }
    }
}

fn dim_of(kind: GeomKind) -> Option<u8> {
    match kind {
        GeomKind::Point => Some(0),
        GeomKind::Line => Some(1),
        GeomKind::Area => Some(2),
        GeomKind::Empty | GeomKind::Mixed => None,
    }
}

fn reject_mixed<T: GeoFloat>(geom: &Geometry<T>) -> Result<(), OverlayError<T>> {
    if geometry_kind(geom) == GeomKind::Mixed {
        return Err(OverlayError::InvalidInput {
            kind: InvalidInputKind::MixedDimensionCollection,
            message: "a geometry collection mixing points with lines or areas cannot be overlaid directly",
        });
    }
    Ok(())
}

/// Flattens a validated point-kind geometry into its coordinates. Defensive:
/// a non-point leaf can only be reached here if [`geometry_kind`] and the
/// dispatch in [`overlay`] disagree with each other, which is itself a bug,
/// but the spec calls this situation out by name so it gets its own error
/// kind rather than a panic.
fn flatten_points<T: GeoFloat>(geom: &Geometry<T>) -> Result<Vec<Coord<T>>, OverlayError<T>> {
    let mut out = Vec::new();
    fn walk<T: GeoFloat>(geom: &Geometry<T>, out: &mut Vec<Coord<T>>) -> Result<(), OverlayError<T>> {
        match geom {
            Geometry::Point(p) => out.push(p.0),
            Geometry::MultiPoint(mp) => out.extend(mp.0.iter().map(|p| p.0)),
            Geometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    walk(g, out)?;
                }
            }
            _ => {
                return Err(OverlayError::InvalidInput {
                    kind: InvalidInputKind::NonPointFedToPointOverlay,
                    message: "expected a point or multipoint geometry here",
                })
            }
        }
        Ok(())
    }
    walk(geom, &mut out)?;
    Ok(out)
}

fn points_to_geometry<T: GeoFloat>(points: Vec<Coord<T>>) -> Geometry<T> {
    match points.len() {
        0 => Geometry::MultiPoint(MultiPoint::new(vec![])),
        1 => Geometry::Point(Point(points[0])),
        _ => Geometry::MultiPoint(MultiPoint::new(points.into_iter().map(Point).collect())),
    }
}

fn reduce_geometry_precision<T: GeoFloat>(geom: &Geometry<T>, pm: &PrecisionModel<T>) -> Geometry<T> {
    if pm.is_floating() {
        return geom.clone();
    }
    match geometry_kind(geom) {
        GeomKind::Empty => geom.clone(),
        GeomKind::Point => {
            let pts = flatten_points(geom).unwrap_or_default();
            let rounded: Vec<Coord<T>> = pts.iter().map(|&c| pm.round_coord(c)).collect();
            points_to_geometry(build::point::point_point_overlay(&rounded, &[], OpType::Union, pm))
        }
        _ => reduce_precision(geom, pm).unwrap_or_else(|_| geom.clone()),
    }
}

/// Handles the case where at least one operand is empty (or an empty nested
/// collection), per §8's empty-input laws: intersection and a
/// difference-from-empty are always empty at the op's dimension rule;
/// otherwise the non-empty operand passes through unchanged (reduced to the
/// target precision).
fn overlay_with_empty_operand<T: GeoFloat>(
    a: &Geometry<T>,
    b: &Geometry<T>,
    kind_a: GeomKind,
    kind_b: GeomKind,
    op: OpType,
    pm: &PrecisionModel<T>,
) -> Geometry<T> {
    let a_empty = kind_a == GeomKind::Empty;
    let b_empty = kind_b == GeomKind::Empty;
    match op {
        OpType::Intersection => build::empty_result(op.empty_result_dimension(dim_of(kind_a), dim_of(kind_b))),
        OpType::Difference => {
            if a_empty {
                build::empty_result(None)
            } else {
                reduce_geometry_precision(a, pm)
            }
        }
        OpType::Union | OpType::SymDifference => {
            if a_empty && b_empty {
                build::empty_result(op.empty_result_dimension(dim_of(kind_a), dim_of(kind_b)))
            } else if a_empty {
                reduce_geometry_precision(b, pm)
            } else {
                reduce_geometry_precision(a, pm)
            }
        }
    }
}

/// Runs one boolean overlay of `a` and `b`, at the given precision model
/// (floating by default) and noder (auto-selected by precision model by
/// default — see [`edge::build_edges`]).
pub fn overlay<T: GeoFloat>(
    a: &Geometry<T>,
    b: &Geometry<T>,
    op: OpType,
    pm: Option<PrecisionModel<T>>,
    custom_noder: Option<&mut dyn Noder<T, edge::EdgeSourceInfo>>,
) -> Result<Geometry<T>, OverlayError<T>> {
    reject_mixed(a)?;
    reject_mixed(b)?;
    let pm = pm.unwrap_or(PrecisionModel::Floating);

    let kind_a = geometry_kind(a);
    let kind_b = geometry_kind(b);
    if kind_a == GeomKind::Empty || kind_b == GeomKind::Empty {
        return Ok(overlay_with_empty_operand(a, b, kind_a, kind_b, op, &pm));
    }

    match (kind_a, kind_b) {
        (GeomKind::Point, GeomKind::Point) => {
            let pa = flatten_points(a)?;
            let pb = flatten_points(b)?;
            Ok(points_to_geometry(build::point::point_point_overlay(&pa, &pb, op, &pm)))
        }
        (GeomKind::Point, _) => {
            let pa = flatten_points(a)?;
            Ok(points_to_geometry(build::point::mixed_point_overlay(&pa, b, op, true, &pm)))
        }
        (_, GeomKind::Point) => {
            let pb = flatten_points(b)?;
            Ok(points_to_geometry(build::point::mixed_point_overlay(&pb, a, op, false, &pm)))
        }
        _ => {
            let edges = edge::build_edges(a, Some(b), &pm, custom_noder)?;
            let mut graph = OverlayGraph::build(edges);
            label_graph(&mut graph, a, Some(b))?;
            let empty_dim = build::empty_result_dim(op, dim_of(kind_a), dim_of(kind_b));
            build::build_result_with_options(&mut graph, op, false, false, empty_dim)
        }
    }
}

/// Dissolves a single input into its noded, merged, hole-assigned union —
/// equivalent to `overlay(a, a, Union, ...)` but without a second input to
/// label, so collapsed or exterior-only fragments of `a` can drop out
/// without a self-intersection against a phantom B ever entering the graph.
pub fn unary_union<T: GeoFloat>(a: &Geometry<T>, pm: Option<PrecisionModel<T>>) -> Result<Geometry<T>, OverlayError<T>> {
    reject_mixed(a)?;
    let pm = pm.unwrap_or(PrecisionModel::Floating);

    match geometry_kind(a) {
        GeomKind::Empty => Ok(build::empty_result(None)),
        GeomKind::Point => {
            let pts = flatten_points(a)?;
            Ok(points_to_geometry(build::point::point_point_overlay(&pts, &[], OpType::Union, &pm)))
        }
        _ => {
            let edges = edge::build_edges(a, None, &pm, None)?;
            let mut graph = OverlayGraph::build(edges);
            label_graph(&mut graph, a, None)?;
            let empty_dim = build::empty_result_dim(OpType::Union, dim_of(geometry_kind(a)), None);
            build::build_result_with_options(&mut graph, OpType::Union, false, false, empty_dim)
        }
    }
}

/// Snaps every ordinate of `g` onto `pm`'s grid and renodes/reassembles the
/// result, without combining it against any second geometry. Used both as a
/// public utility and as the retry ladder's snap-rounding fallback.
pub fn reduce_precision<T: GeoFloat>(g: &Geometry<T>, pm: &PrecisionModel<T>) -> Result<Geometry<T>, OverlayError<T>> {
    reject_mixed(g)?;
    match geometry_kind(g) {
        GeomKind::Empty => Ok(build::empty_result(None)),
        GeomKind::Point => {
            let pts = flatten_points(g)?;
            let rounded: Vec<Coord<T>> = pts.iter().map(|&c| pm.round_coord(c)).collect();
            Ok(points_to_geometry(build::point::point_point_overlay(&rounded, &[], OpType::Union, pm)))
        }
        _ => {
            let edges = edge::build_edges(g, None, pm, None)?;
            let mut graph = OverlayGraph::build(edges);
            label_graph(&mut graph, g, None)?;
            let empty_dim = build::empty_result_dim(OpType::Union, dim_of(geometry_kind(g)), None);
            build::build_result_with_options(&mut graph, OpType::Union, false, false, empty_dim)
        }
    }
}

fn visit_coords<T: GeoFloat>(geom: &Geometry<T>, visit: &mut dyn FnMut(Coord<T>)) {
    match geom {
        Geometry::Point(p) => visit(p.0),
        Geometry::Line(l) => {
            visit(l.start);
            visit(l.end);
        }
        Geometry::LineString(ls) => ls.0.iter().for_each(|&c| visit(c)),
        Geometry::Polygon(p) => {
            p.exterior().0.iter().for_each(|&c| visit(c));
            p.interiors().iter().for_each(|h| h.0.iter().for_each(|&c| visit(c)));
        }
        Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| visit(p.0)),
        Geometry::MultiLineString(mls) => mls.0.iter().for_each(|ls| ls.0.iter().for_each(|&c| visit(c))),
        Geometry::MultiPolygon(mp) => mp.0.iter().for_each(|p| visit_coords(&Geometry::Polygon(p.clone()), visit)),
        Geometry::Rect(r) => {
            visit(r.min());
            visit(r.max());
        }
        Geometry::Triangle(t) => {
            visit(t.0);
            visit(t.1);
            visit(t.2);
        }
        Geometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| visit_coords(g, visit)),
    }
}

/// The largest absolute ordinate value appearing in either input — the
/// reference magnitude §4.11 scales its first snap tolerance guess from.
fn magnitude<T: GeoFloat>(a: &Geometry<T>, b: &Geometry<T>) -> f64 {
    let mut m = 0f64;
    for env in [edge::geometry_envelope(a), edge::geometry_envelope(b)] {
        if env.is_empty() {
            continue;
        }
        for v in [env.min_x(), env.max_x(), env.min_y(), env.max_y()] {
            if let Some(f) = v.to_f64() {
                m = m.max(f.abs());
            }
        }
    }
    m
}

/// The finest power-of-ten grid that represents every input ordinate
/// exactly, read off each ordinate's decimal text the way JTS's
/// `PrecisionReducer` does, since float bit patterns alone don't say how
/// many decimal digits the caller actually meant.
fn inherent_scale<T: GeoFloat>(a: &Geometry<T>, b: &Geometry<T>) -> f64 {
    let mut max_decimals = 0usize;
    let mut track = |c: Coord<T>| {
        for v in [c.x, c.y] {
            if let Some(f) = v.to_f64() {
                let s = format!("{f}");
                if let Some(dot) = s.find('.') {
                    max_decimals = max_decimals.max(s.len() - dot - 1);
                }
            }
        }
    };
    visit_coords(a, &mut track);
    visit_coords(b, &mut track);
    10f64.powi(max_decimals.min(15) as i32)
}

/// The coarsest grid that still keeps 14 significant decimal digits of
/// headroom given the inputs' magnitude, so the safe-scale fallback never
/// rounds away more precision than floating point already carried.
fn safe_scale(magnitude: f64) -> f64 {
    let digits_before_point = if magnitude < 1.0 {
        1
    } else {
        magnitude.log10().floor() as i32 + 1
    };
    let safe_digits = (14 - digits_before_point).max(1);
    10f64.powi(safe_digits)
}

fn f64_to_scale<T: GeoFloat>(scale: f64) -> T {
    T::from(scale).unwrap_or_else(T::one)
}

/// Dissolves `geom` against itself through a snapping noder at `tol`, the
/// "self-snap" step of the retry ladder: unlike [`unary_union`], this lets
/// the caller pick the noder rather than the precision model, since a
/// self-snap at a widening tolerance is still nominally floating precision.
fn self_snap<T: GeoFloat>(geom: &Geometry<T>, tol: T) -> Result<Geometry<T>, OverlayError<T>> {
    let mut snapping = SnappingNoder::new(tol);
    let edges = edge::build_edges(geom, None, &PrecisionModel::Floating, Some(&mut snapping))?;
    let mut graph = OverlayGraph::build(edges);
    label_graph(&mut graph, geom, None)?;
    build::build_result(&mut graph, OpType::Union, false)
}

/// Runs [`overlay`] with the §4.11 retry ladder: on a retryable failure at
/// floating precision, widen a snapping tolerance across five attempts (each
/// also trying a [`self_snap`] of both inputs before retrying the overlay),
/// then fall back to snap-rounding at a heuristic
/// safe grid scale. A non-retryable error, or exhaustion of every fallback,
/// surfaces the *original* floating-precision error — a later failure under
/// a coarser precision model is never more useful to the caller than the
/// first one.
pub fn overlay_robust<T: GeoFloat>(a: &Geometry<T>, b: &Geometry<T>, op: OpType) -> Result<Geometry<T>, OverlayError<T>> {
    let first_attempt = overlay(a, b, op, None, None);
    let original_error = match first_attempt {
        Ok(result) => return Ok(result),
        Err(e) if !e.is_retryable() => return Err(e),
        Err(e) => e,
    };
    debug!("floating-precision overlay failed ({original_error}), entering retry ladder");

    let mag = magnitude(a, b).max(1.0);
    let mut snap_tol = mag / 1e12;

    for attempt in 0..5 {
        let tol: T = f64_to_scale(snap_tol);
        trace!("retry {attempt}: snapping noder at tolerance {snap_tol}");

        let mut snapping = SnappingNoder::new(tol);
        if let Ok(result) = overlay(a, b, op, Some(PrecisionModel::Floating), Some(&mut snapping)) {
            return Ok(result);
        }

        if let (Ok(snapped_a), Ok(snapped_b)) = (self_snap(a, tol), self_snap(b, tol)) {
            let mut snapping = SnappingNoder::new(tol);
            if let Ok(result) = overlay(&snapped_a, &snapped_b, op, Some(PrecisionModel::Floating), Some(&mut snapping)) {
                return Ok(result);
            }
        }

        snap_tol *= 10.0;
    }

    let scale = inherent_scale(a, b).min(safe_scale(mag));
    debug!("retry ladder exhausted snapping, falling back to snap-rounding at scale {scale}");
    let round_pm = PrecisionModel::fixed(f64_to_scale::<T>(scale));
    let mut rounding = SnapRoundingNoder::new(f64_to_scale::<T>(scale));
    if let Ok(result) = overlay(a, b, op, Some(round_pm), Some(&mut rounding)) {
        return Ok(result);
    }

    warn!("overlay_robust exhausted every fallback, surfacing the original floating-precision error");
    Err(original_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, polygon};

    #[test]
    fn overlay_dispatches_to_point_point_path() {
        let a: Geometry<f64> = Geometry::Point(Point(coord! {x: 0.0, y: 0.0}));
        let b: Geometry<f64> = Geometry::Point(Point(coord! {x: 0.0, y: 0.0}));
        let result = overlay(&a, &b, OpType::Intersection, None, None).unwrap();
        assert_eq!(result, Geometry::Point(Point(coord! {x: 0.0, y: 0.0})));
    }

    #[test]
    fn overlay_intersection_of_overlapping_squares() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 2.0, y: 2.0), (x: 6.0, y: 2.0), (x: 6.0, y: 6.0), (x: 2.0, y: 6.0), (x: 2.0, y: 2.0),
        ]
        .into();
        let result = overlay(&a, &b, OpType::Intersection, None, None).unwrap();
        match result {
            Geometry::Polygon(p) => {
                assert_eq!(p.interiors().len(), 0);
                assert!(p.exterior().0.len() >= 4);
            }
            other => panic!("expected a polygon, got {other:?}"),
        }
    }

    #[test]
    fn overlay_with_empty_operand_for_union_returns_the_other_input() {
        let a: Geometry<f64> = Geometry::GeometryCollection(GeometryCollectionEmptyHelper::empty());
        let b: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let result = overlay(&a, &b, OpType::Union, None, None).unwrap();
        assert!(matches!(result, Geometry::Polygon(_)));
    }

    #[test]
    fn overlay_rejects_mixed_dimension_collection() {
        let mixed: Geometry<f64> = Geometry::GeometryCollection(geo_types::GeometryCollection::new_from(vec![
            Geometry::Point(Point(coord! {x: 0.0, y: 0.0})),
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)].into(),
        ]));
        let other: Geometry<f64> = Geometry::Point(Point(coord! {x: 0.0, y: 0.0}));
        let err = overlay(&mixed, &other, OpType::Union, None, None).unwrap_err();
        assert!(matches!(
            err,
            OverlayError::InvalidInput {
                kind: InvalidInputKind::MixedDimensionCollection,
                ..
            }
        ));
    }

    #[test]
    fn unary_union_merges_touching_squares() {
        let a: Geometry<f64> = Geometry::GeometryCollection(geo_types::GeometryCollection::new_from(vec![
            polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0)].into(),
            polygon![(x: 2.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0)].into(),
        ]));
        let result = unary_union(&a, None).unwrap();
        match result {
            Geometry::Polygon(p) => assert_eq!(p.interiors().len(), 0),
            other => panic!("expected a single merged polygon, got {other:?}"),
        }
    }

    #[test]
    fn overlay_robust_succeeds_on_a_well_formed_input() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0), (x: 1.0, y: 1.0),
        ]
        .into();
        let result = overlay_robust(&a, &b, OpType::Union).unwrap();
        assert!(matches!(result, Geometry::Polygon(_)));
    }

    #[test]
    fn safe_scale_shrinks_as_magnitude_grows() {
        assert!(safe_scale(1.0) > safe_scale(1.0e10));
    }

    struct GeometryCollectionEmptyHelper;
    impl GeometryCollectionEmptyHelper {
        fn empty() -> geo_types::GeometryCollection<f64> {
            geo_types::GeometryCollection::new_from(vec![])
        }
    }

    // End-to-end scenarios (§8 "End-to-end scenarios").

    #[test]
    fn scenario_1_two_identical_unit_squares() {
        use wkt::TryFromWkt;
        let square = Geometry::<f64>::try_from_wkt_str("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();

        let intersection = overlay(&square, &square, OpType::Intersection, None, None).unwrap();
        assert_eq!(intersection, square);

        let union = overlay(&square, &square, OpType::Union, None, None).unwrap();
        assert_eq!(union, square);

        let difference = overlay(&square, &square, OpType::Difference, None, None).unwrap();
        assert_eq!(difference, build::empty_result(Some(2)));

        let symdiff = overlay(&square, &square, OpType::SymDifference, None, None).unwrap();
        assert_eq!(symdiff, build::empty_result(Some(2)));
    }

    #[test]
    fn scenario_2_two_overlapping_rectangles() {
        use wkt::TryFromWkt;
        let a = Geometry::<f64>::try_from_wkt_str("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        let b = Geometry::<f64>::try_from_wkt_str("POLYGON ((5 5, 15 5, 15 15, 5 15, 5 5))").unwrap();
        let expected = Geometry::<f64>::try_from_wkt_str("POLYGON ((5 5, 10 5, 10 10, 5 10, 5 5))").unwrap();

        let intersection = overlay(&a, &b, OpType::Intersection, None, None).unwrap();
        assert_eq!(intersection, expected);
    }

    #[test]
    fn scenario_6_mixed_point_area_intersection() {
        use wkt::TryFromWkt;
        let a = Geometry::<f64>::try_from_wkt_str("MULTIPOINT ((1 1), (5 5), (10 10))").unwrap();
        let b = Geometry::<f64>::try_from_wkt_str("POLYGON ((0 0, 8 0, 8 8, 0 8, 0 0))").unwrap();
        let expected = Geometry::<f64>::try_from_wkt_str("MULTIPOINT ((1 1), (5 5))").unwrap();

        let intersection = overlay(&a, &b, OpType::Intersection, None, None).unwrap();
        assert_eq!(intersection, expected);
    }
}
