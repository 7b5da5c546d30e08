//! The labelling algorithm (§4.9): fills in the per-input `on` location for
//! every edge that didn't already get one straight from its source
//! dimension, so the result-selection truth table in [`OverlayGraph::mark_result_area`]
//! has a location to test on every side of every edge.
//!
//! Three passes, run in the order the teacher's `OverlayLabeller` runs its
//! own (`computeLabelling` → area propagation → line propagation →
//! `labelCollapsedEdges` → a second area propagation pass to spread the
//! newly-resolved collapse labels), plus a final point-in-polygon fallback
//! for whatever a pure graph walk still can't reach.

use super::label::EdgeSetDim;
use super::OverlayGraph;
use crate::edge::InputIndex;
use crate::error::OverlayError;
use crate::location::{Location, Side};
use crate::locator::locate_point_in_area;
use crate::numeric::GeoFloat;
use geo_types::Geometry;

/// Finds a half-edge in the node star anchored at `anchor` whose location
/// for `index` is already known, returning it along with the location the
/// walk should carry away from it (its right side, if it's an area
/// boundary edge — crossing a boundary edge toggles location — or its
/// single `on` value otherwise, since a non-boundary edge doesn't divide
/// the plane and leaves the current location unchanged).
fn find_propagation_start<T: GeoFloat>(
    graph: &OverlayGraph<T>,
    anchor: usize,
    index: InputIndex,
) -> Option<(usize, Location)> {
    let mut he = anchor;
    loop {
        if graph.dim(he, index) == EdgeSetDim::Boundary {
            let right = graph
                .side_location(he, index, Side::Right)
                .expect("boundary edge always has a right location");
            return Some((he, right));
        }
        he = graph.next(he);
        if he == anchor {
            break;
        }
    }
    let mut he = anchor;
    loop {
        if let Some(loc) = graph.label(he).input(index).on() {
            return Some((he, loc));
        }
        he = graph.next(he);
        if he == anchor {
            break;
        }
    }
    None
}

/// Walks every node's CCW edge star, starting from a half-edge with a known
/// location for `index`, and assigns that location to every unresolved
/// half-edge it passes — toggling at area-boundary edges, carrying through
/// unchanged at everything else. Detects and reports a node where two
/// boundary edges disagree about which side is which.
pub fn label_area_boundaries<T: GeoFloat>(
    graph: &mut OverlayGraph<T>,
    index: InputIndex,
) -> Result<bool, OverlayError<T>> {
    let mut changed = false;
    for anchor in graph.node_anchors() {
        let Some((start, mut curr_loc)) = find_propagation_start(graph, anchor, index) else {
            continue;
        };
        let mut he = graph.next(start);
        while he != start {
            if graph.dim(he, index) == EdgeSetDim::Boundary {
                let left = graph.side_location(he, index, Side::Left);
                if left != Some(curr_loc) {
                    return Err(OverlayError::topology_inconsistency(
                        "area boundary edges disagree about side location at a node",
                        graph.origin_of(he),
                    ));
                }
                curr_loc = graph
                    .side_location(he, index, Side::Right)
                    .expect("boundary edge always has a right location");
            } else {
                match graph.label(he).input(index).on() {
                    Some(loc) => curr_loc = loc,
                    None => {
                        graph.label_mut(he).input_mut(index).set_on(curr_loc);
                        changed = true;
                    }
                }
            }
            he = graph.next(he);
        }
    }
    Ok(changed)
}

/// Runs [`label_area_boundaries`] to a fixed point: a single pass only
/// reaches as far as whichever edges a node's own star can see directly,
/// but a resolved edge at one node can itself become another node's
/// propagation source, so the walk needs to repeat until nothing new is
/// learned — the node-local equivalent of the BFS the teacher runs
/// edge-by-edge.
fn label_area_boundaries_to_fixpoint<T: GeoFloat>(
    graph: &mut OverlayGraph<T>,
    index: InputIndex,
) -> Result<(), OverlayError<T>> {
    let cap = graph.half_edge_count().max(1);
    for _ in 0..cap {
        if !label_area_boundaries(graph, index)? {
            return Ok(());
        }
    }
    Ok(())
}

/// A line doesn't divide the plane: wherever this input touches a node
/// through a line edge, every other edge at that node that this input
/// doesn't otherwise take a side on is outside it.
fn propagate_along_lines_once<T: GeoFloat>(graph: &mut OverlayGraph<T>, index: InputIndex) -> bool {
    let mut changed = false;
    for anchor in graph.node_anchors() {
        let mut has_line = false;
        let mut he = anchor;
        loop {
            if graph.dim(he, index) == EdgeSetDim::Line {
                has_line = true;
                break;
            }
            he = graph.next(he);
            if he == anchor {
                break;
            }
        }
        if !has_line {
            continue;
        }
        let mut he = anchor;
        loop {
            if graph.label(he).input(index).on().is_none() {
                graph.label_mut(he).input_mut(index).set_on(Location::Exterior);
                changed = true;
            }
            he = graph.next(he);
            if he == anchor {
                break;
            }
        }
    }
    changed
}

pub fn propagate_along_lines<T: GeoFloat>(graph: &mut OverlayGraph<T>, index: InputIndex) {
    let cap = graph.half_edge_count().max(1);
    for _ in 0..cap {
        if !propagate_along_lines_once(graph, index) {
            break;
        }
    }
}

/// A collapsed area-boundary edge (both copies of a ring segment cancelled)
/// still came from somewhere: a hole ring that fully collapsed was, at that
/// location, inside the rest of the polygon; a shell ring that collapsed
/// was at the outer edge of nothing. This needs no node walk — the role is
/// a property of the edge alone.
pub fn label_collapsed_edges_from_ring_role<T: GeoFloat>(graph: &mut OverlayGraph<T>, index: InputIndex) {
    for he in (0..graph.half_edge_count()).step_by(2) {
        let input = graph.label(he).input(index);
        if input.dim != EdgeSetDim::Collapse || input.on().is_some() {
            continue;
        }
        let loc = if input.is_hole {
            Location::Interior
        } else if input.is_shell {
            Location::Exterior
        } else {
            continue;
        };
        graph.label_mut(he).input_mut(index).set_on(loc);
    }
}

/// Whatever the graph walk couldn't reach — typically an edge from one
/// input sitting entirely inside or outside the other input's area, with
/// no shared node to propagate a location from — gets a direct
/// point-in-polygon test against that input's original geometry. Both
/// endpoints are tested and must agree on non-exterior for the edge to be
/// called interior, guarding against an edge that actually crosses the
/// other input's boundary under a collapse.
fn point_in_area_fallback<T: GeoFloat>(graph: &mut OverlayGraph<T>, index: InputIndex, geom: &Geometry<T>) {
    for he in (0..graph.half_edge_count()).step_by(2) {
        if graph.label(he).input(index).on().is_some() {
            continue;
        }
        let edge = graph.edge(he);
        let p0 = edge.p0();
        let p1 = edge.p1();
        let loc0 = locate_point_in_area(p0, geom);
        let loc1 = locate_point_in_area(p1, geom);
        let loc = if loc0 != Location::Exterior && loc1 != Location::Exterior {
            Location::Interior
        } else {
            Location::Exterior
        };
        graph.label_mut(he).input_mut(index).set_on(loc);
    }
}

/// Runs the full labelling pipeline for one input, in the teacher's order:
/// area propagation to a fixed point, line propagation, collapse role
/// assignment, a second area-propagation fixed point to carry the newly
/// resolved collapse labels further, then a point-location fallback for
/// anything still unresolved. `geom` is only consulted by the fallback
/// and only matters when `geom` actually has area (a line-only or
/// point-only input leaves every untouched edge exterior, which the
/// earlier passes already guarantee).
fn label_input<T: GeoFloat>(graph: &mut OverlayGraph<T>, index: InputIndex, geom: &Geometry<T>) -> Result<(), OverlayError<T>> {
    label_area_boundaries_to_fixpoint(graph, index)?;
    propagate_along_lines(graph, index);
    label_collapsed_edges_from_ring_role(graph, index);
    label_area_boundaries_to_fixpoint(graph, index)?;
    point_in_area_fallback(graph, index, geom);
    Ok(())
}

/// Labels every edge in the graph with respect to both inputs. `geom_b` is
/// `None` for a unary union, in which case input B is left entirely
/// unlabelled (every edge's B label stays `NotPart`/`None`, which the
/// result-selection truth tables treat as exterior — correct, since a
/// unary union only ever looks at input A).
pub fn label_graph<T: GeoFloat>(
    graph: &mut OverlayGraph<T>,
    geom_a: &Geometry<T>,
    geom_b: Option<&Geometry<T>>,
) -> Result<(), OverlayError<T>> {
    label_input(graph, InputIndex::A, geom_a)?;
    if let Some(geom_b) = geom_b {
        label_input(graph, InputIndex::B, geom_b)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::build_edges;
    use crate::op::OpType;
    use crate::precision::PrecisionModel;
    use geo_types::{polygon, Geometry};

    #[test]
    fn disjoint_squares_label_each_other_exterior() {
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
        let mut graph = OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        graph.mark_result_area(OpType::Union);
        // Every half-edge of A's boundary is exterior with respect to B and
        // vice versa, so union keeps every original boundary edge.
        let kept = (0..graph.half_edge_count()).filter(|&he| graph.in_result_area(he)).count();
        assert_eq!(kept, 8);
    }

    #[test]
    fn overlapping_squares_intersection_keeps_only_shared_part() {
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
        let mut graph = OverlayGraph::build(edges);
        label_graph(&mut graph, &a, Some(&b)).unwrap();
        graph.mark_result_area(OpType::Intersection);
        let kept: Vec<usize> = (0..graph.half_edge_count()).filter(|&he| graph.in_result_area(he)).collect();
        assert_eq!(kept.len(), 4);
        for he in kept {
            let dest = graph.dest_of(he);
            assert!(dest.x >= 2.0 && dest.x <= 4.0);
            assert!(dest.y >= 2.0 && dest.y <= 4.0);
        }
    }
}
