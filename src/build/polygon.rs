//! Polygon assembly (§4.10 "Polygon assembly"): traces marked result
//! half-edges into maximal rings, splits each maximal ring at any
//! self-touch vertex into minimal (simple) rings, classifies each by
//! orientation, and assigns holes to their enclosing shell.
//!
//! The self-touch splitting is the same "drain from first repeat, keep
//! going" technique the teacher's `bool_ops::assembly::split_ring` uses on
//! its own (differently produced) candidate rings.

use crate::edge::{is_clockwise, signed_area};
use crate::error::OverlayError;
use crate::graph::OverlayGraph;
use crate::numeric::GeoFloat;
use crate::precision::Envelope;
use geo_types::{Coord, LineString, Polygon};
use std::collections::HashMap;

fn coord_key<T: GeoFloat>(c: Coord<T>) -> (u64, u64) {
    (c.x.to_f64().unwrap_or(0.0).to_bits(), c.y.to_f64().unwrap_or(0.0).to_bits())
}

/// Traces every marked result half-edge into a maximal ring: at each node,
/// the incoming half-edge is paired with the first outgoing result
/// half-edge found scanning CCW from it.
fn trace_maximal_rings<T: GeoFloat>(graph: &mut OverlayGraph<T>) -> Result<Vec<Vec<Coord<T>>>, OverlayError<T>> {
    let mut rings = Vec::new();
    for start in 0..graph.half_edge_count() {
        if !graph.in_result_area(start) || graph.visited(start) {
            continue;
        }
        let mut coords = vec![graph.origin_of(start)];
        let mut he = start;
        loop {
            graph.set_visited(he, true);
            coords.push(graph.dest_of(he));
            let next = graph.next_matching(he, |cand| graph.in_result_area(cand));
            if next == graph.sym(he) && !graph.in_result_area(next) {
                return Err(OverlayError::ring_assembly_failure(
                    "incomplete pairing while tracing a maximal result ring",
                ));
            }
            he = next;
            if he == start {
                break;
            }
        }
        rings.push(coords);
    }
    Ok(rings)
}

/// Splits a possibly self-touching ring into simple rings by the
/// drain-from-first-repeat technique: whenever a coordinate reappears, the
/// loop since its first occurrence is cut out as its own ring.
fn split_self_touching_ring<T: GeoFloat>(coords: Vec<Coord<T>>) -> Vec<Vec<Coord<T>>> {
    let mut seen: HashMap<(u64, u64), usize> = HashMap::new();
    let mut accum: Vec<Coord<T>> = Vec::new();
    let mut out = Vec::new();
    for c in coords {
        let key = coord_key(c);
        if let Some(&idx) = seen.get(&key) {
            let mut split: Vec<Coord<T>> = accum.drain(idx..).collect();
            for p in &split {
                seen.remove(&coord_key(*p));
            }
            split.push(c);
            if split.len() >= 4 {
                out.push(split);
            }
        }
        seen.insert(key, accum.len());
        accum.push(c);
    }
    if accum.len() >= 4 {
        out.push(accum);
    }
    out
}

struct Shell<T: GeoFloat> {
    ring: LineString<T>,
    envelope: Envelope<T>,
    holes: Vec<LineString<T>>,
}

fn ring_envelope<T: GeoFloat>(ring: &[Coord<T>]) -> Envelope<T> {
    let mut env = Envelope::empty();
    for &c in ring {
        env.expand_to_include(c);
    }
    env
}

/// Finds the smallest shell (by envelope area) whose ring both covers the
/// hole's envelope and actually contains a point of the hole ring that
/// doesn't also sit on the shell's own boundary.
fn find_enclosing_shell<'a, T: GeoFloat>(hole: &[Coord<T>], shells: &'a [Shell<T>]) -> Option<usize> {
    let hole_env = ring_envelope(hole);
    let mut best: Option<(usize, T)> = None;
    for (i, shell) in shells.iter().enumerate() {
        if !shell.envelope.covers(&hole_env) {
            continue;
        }
        let mut contains = false;
        for &p in hole {
            match crate::locator::locate_point_in_ring(p, &shell.ring.0) {
                crate::location::Location::Boundary => continue,
                crate::location::Location::Interior => {
                    contains = true;
                    break;
                }
                crate::location::Location::Exterior => {
                    contains = false;
                    break;
                }
            }
        }
        if !contains {
            continue;
        }
        let area = shell.envelope.width() * shell.envelope.height();
        if best.map(|(_, best_area)| area < best_area).unwrap_or(true) {
            best = Some((i, area));
        }
    }
    best.map(|(i, _)| i)
}

pub fn build_polygons<T: GeoFloat>(graph: &mut OverlayGraph<T>) -> Result<Vec<Polygon<T>>, OverlayError<T>> {
    let maximal = trace_maximal_rings(graph)?;

    let mut shells: Vec<Shell<T>> = Vec::new();
    let mut holes: Vec<Vec<Coord<T>>> = Vec::new();

    for maximal_ring in maximal {
        for minimal in split_self_touching_ring(maximal_ring) {
            if is_clockwise(&minimal) {
                shells.push(Shell {
                    envelope: ring_envelope(&minimal),
                    ring: LineString::new(minimal),
                    holes: Vec::new(),
                });
            } else {
                holes.push(minimal);
            }
        }
    }

    for hole in holes {
        let idx = find_enclosing_shell(&hole, &shells)
            .ok_or_else(|| OverlayError::ring_assembly_failure("free hole could not be assigned to an enclosing shell"))?;
        shells[idx].holes.push(LineString::new(hole));
    }

    Ok(shells
        .into_iter()
        .map(|shell| Polygon::new(shell.ring, shell.holes))
        .collect())
}

#[allow(dead_code)]
fn ring_area<T: GeoFloat>(ring: &[Coord<T>]) -> T {
    signed_area(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::build_edges;
    use crate::graph::labeller::label_graph;
    use crate::op::OpType;
    use crate::precision::PrecisionModel;
    use geo_types::{polygon, Geometry};

    #[test]
    fn union_of_disjoint_squares_gives_two_shells() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 10.0, y: 10.0), (x: 12.0, y: 10.0), (x: 12.0, y: 12.0), (x: 10.0, y: 12.0), (x: 10.0, y: 10.0),
        ]
        .into();
        let pm = PrecisionModel::Floating;
        let edges = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph = crate::graph::OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        graph.mark_result_area(OpType::Union);
        let polys = build_polygons(&mut graph).unwrap();
        assert_eq!(polys.len(), 2);
        for p in &polys {
            assert_eq!(p.interiors().len(), 0);
        }
    }

    #[test]
    fn difference_of_overlapping_squares_leaves_an_l_shape_with_one_shell() {
        let a: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let b: Geometry<f64> = polygon![
            (x: 2.0, y: 2.0), (x: 6.0, y: 2.0), (x: 6.0, y: 6.0), (x: 2.0, y: 6.0), (x: 2.0, y: 2.0),
        ]
        .into();
        let pm = PrecisionModel::Floating;
        let edges = build_edges(&a, Some(&b), &pm, None).unwrap();
        let mut graph = crate::graph::OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        graph.mark_result_area(OpType::Difference);
        let polys = build_polygons(&mut graph).unwrap();
        assert_eq!(polys.len(), 1);
    }

    #[test]
    fn polygon_with_hole_assigns_hole_to_its_shell() {
        let a: Geometry<f64> = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 10.0, y: 0.0 },
                Coord { x: 10.0, y: 10.0 },
                Coord { x: 0.0, y: 10.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![LineString::new(vec![
                Coord { x: 3.0, y: 3.0 },
                Coord { x: 7.0, y: 3.0 },
                Coord { x: 7.0, y: 7.0 },
                Coord { x: 3.0, y: 7.0 },
                Coord { x: 3.0, y: 3.0 },
            ])],
        )
        .into();
        let pm = PrecisionModel::Floating;
        let edges = build_edges(&a, None, &pm, None).unwrap();
        let mut graph = crate::graph::OverlayGraph::build(edges);
        label_graph(&mut graph, &a, None).unwrap();
        graph.mark_result_area(OpType::Union);
        let polys = build_polygons(&mut graph).unwrap();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
    }
}
