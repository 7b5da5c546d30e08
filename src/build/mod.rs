//! Result builders (C11, §4.10): turn a labelled, result-marked
//! [`OverlayGraph`] into output geometry.

pub mod line;
pub mod point;
pub mod polygon;

use crate::edge::InputIndex;
use crate::error::OverlayError;
use crate::graph::OverlayGraph;
use crate::numeric::GeoFloat;
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};

/// §4.10 "Intersection-point extraction": for intersection only, a node
/// touched by edges from both inputs, none of which made it into the
/// result as area or line, is an isolated touch point.
fn isolated_intersection_points<T: GeoFloat>(graph: &OverlayGraph<T>) -> Vec<Coord<T>> {
    let mut out = Vec::new();
    for anchor in graph.node_anchors() {
        let mut has_a = false;
        let mut has_b = false;
        let mut in_result = false;
        let mut he = anchor;
        loop {
            if graph.dim(he, InputIndex::A) != crate::graph::label::EdgeSetDim::NotPart {
                has_a = true;
            }
            if graph.dim(he, InputIndex::B) != crate::graph::label::EdgeSetDim::NotPart {
                has_b = true;
            }
            if graph.in_result_area(he) || graph.in_result_line(he) {
                in_result = true;
            }
            he = graph.next(he);
            if he == anchor {
                break;
            }
        }
        if has_a && has_b && !in_result {
            out.push(graph.origin_of(anchor));
        }
    }
    out
}

/// Assembles the full result geometry from a labelled, marked graph: every
/// polygon, every surviving line, and (for intersection) isolated touch
/// points, combined into a single heterogeneous collection when more than
/// one kind is present, or the bare homogeneous geometry otherwise.
pub fn build_result<T: GeoFloat>(
    graph: &mut OverlayGraph<T>,
    op: crate::op::OpType,
    collapse_lines: bool,
) -> Result<Geometry<T>, OverlayError<T>> {
    build_result_with_options(graph, op, collapse_lines, false, None)
}

/// As [`build_result`], but additionally takes the "strict mode" isolated-
/// point suppression named in §4.10 (`suppress_isolated_points_with_area`:
/// drop isolated touch points once a result area exists; off by default
/// everywhere in this crate — see `SPEC_FULL.md` §4.10) and the dimension an
/// otherwise-empty result should take, per §4.10's "empty-result creation"
/// rule (`None` yields an empty heterogeneous collection).
pub fn build_result_with_options<T: GeoFloat>(
    graph: &mut OverlayGraph<T>,
    op: crate::op::OpType,
    collapse_lines: bool,
    suppress_isolated_points_with_area: bool,
    empty_dim: Option<u8>,
) -> Result<Geometry<T>, OverlayError<T>> {
    graph.mark_result_area(op);
    graph.mark_result_line(op, collapse_lines);

    let polygons = polygon::build_polygons(graph)?;
    let lines = line::extract_lines(graph);
    let points: Vec<Coord<T>> = if op == crate::op::OpType::Intersection
        && !(suppress_isolated_points_with_area && !polygons.is_empty())
    {
        isolated_intersection_points(graph)
    } else {
        Vec::new()
    };

    Ok(assemble(polygons, lines, points, empty_dim))
}

/// The dimension an empty result should take (§4.10 "Empty-result creation"):
/// intersection takes the smaller input dimension, union/symdiff the larger,
/// difference always A's. `None` (the spec's -1) stands for "no input
/// dimension to derive from" and falls through to an empty heterogeneous
/// collection.
pub fn empty_result_dim(op: crate::op::OpType, dim_a: Option<u8>, dim_b: Option<u8>) -> Option<u8> {
    use crate::op::OpType;
    match op {
        OpType::Intersection => match (dim_a, dim_b) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        },
        OpType::Union | OpType::SymDifference => match (dim_a, dim_b) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        },
        OpType::Difference => dim_a,
    }
}

fn assemble<T: GeoFloat>(
    polygons: Vec<Polygon<T>>,
    lines: Vec<LineString<T>>,
    points: Vec<Coord<T>>,
    empty_dim: Option<u8>,
) -> Geometry<T> {
    let has_poly = !polygons.is_empty();
    let has_line = !lines.is_empty();
    let has_point = !points.is_empty();

    match (has_poly, has_line, has_point) {
        (true, false, false) => {
            if polygons.len() == 1 {
                Geometry::Polygon(polygons.into_iter().next().unwrap())
            } else {
                Geometry::MultiPolygon(MultiPolygon::new(polygons))
            }
        }
        (false, true, false) => {
            if lines.len() == 1 {
                Geometry::LineString(lines.into_iter().next().unwrap())
            } else {
                Geometry::MultiLineString(MultiLineString::new(lines))
            }
        }
        (false, false, true) => {
            if points.len() == 1 {
                Geometry::Point(Point(points[0]))
            } else {
                Geometry::MultiPoint(MultiPoint::new(points.into_iter().map(Point).collect()))
            }
        }
        (false, false, false) => empty_result(empty_dim),
        _ => {
            let mut out = Vec::new();
            out.extend(polygons.into_iter().map(Geometry::Polygon));
            out.extend(lines.into_iter().map(Geometry::LineString));
            out.extend(points.into_iter().map(|p| Geometry::Point(Point(p))));
            Geometry::GeometryCollection(GeometryCollection::new_from(out))
        }
    }
}

/// §4.10 "Empty-result creation": an empty result at a dimension derived
/// from the op and input dimensions. `None` (the spec's -1) yields an
/// empty heterogeneous collection.
pub fn empty_result<T: GeoFloat>(dim: Option<u8>) -> Geometry<T> {
    match dim {
        Some(0) => Geometry::MultiPoint(MultiPoint::new(vec![])),
        Some(1) => Geometry::MultiLineString(MultiLineString::new(vec![])),
        Some(2) => Geometry::MultiPolygon(MultiPolygon::new(vec![])),
        _ => Geometry::GeometryCollection(GeometryCollection::new_from(vec![])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::build_edges;
    use crate::graph::labeller::label_graph;
    use crate::op::OpType;
    use crate::precision::PrecisionModel;
    use geo_types::polygon;

    #[test]
    fn build_result_for_union_of_touching_squares() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 2.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0),
        ]
        .into();
        let pm = PrecisionModel::Floating;
        let edges = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph = OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        let result = build_result(&mut graph, OpType::Union, false).unwrap();
        match result {
            Geometry::Polygon(p) => assert_eq!(p.interiors().len(), 0),
            other => panic!("expected a single polygon, got {other:?}"),
        }
    }

    #[test]
    fn build_result_with_options_matches_default_when_suppression_is_off() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 2.0, y: 2.0), (x: 6.0, y: 2.0), (x: 6.0, y: 6.0), (x: 2.0, y: 6.0), (x: 2.0, y: 2.0),
        ]
        .into();
        let pm = PrecisionModel::Floating;

        let edges_a = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph_a = OverlayGraph::build(edges_a);
        label_graph(&mut graph_a, &a, Some(&b)).unwrap();
        let default_result = build_result(&mut graph_a, OpType::Intersection, false).unwrap();

        let edges_b = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph_b = OverlayGraph::build(edges_b);
        label_graph(&mut graph_b, &a, Some(&b)).unwrap();
        let explicit_result = build_result_with_options(&mut graph_b, OpType::Intersection, false, false, None).unwrap();

        assert_eq!(default_result, explicit_result);
    }

    #[test]
    fn suppressing_isolated_points_drops_them_only_when_an_area_result_exists() {
        // No actual area result here, so suppression must not touch the
        // point even though the flag is on: the rule only fires "when a
        // result area exists" (§4.10).
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 2.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0),
        ]
        .into();
        let pm = PrecisionModel::Floating;
        let edges = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph = OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        let result = build_result_with_options(&mut graph, OpType::Intersection, false, true, None).unwrap();
        // Two squares sharing only an edge intersect in a degenerate
        // (zero-area) way; no polygon survives, so suppression is a no-op
        // and whatever isolated points the labeller found are kept.
        assert!(!matches!(result, Geometry::Polygon(_) | Geometry::MultiPolygon(_)));
    }
}
