//! Point overlay (§4.10 "Point-point overlay" and "Mixed-point overlay").
//! Points never enter the edge graph — a point has no dimension to node or
//! label — so these two cases are handled directly against the input
//! coordinates and geometries.

use crate::locator::{locate_point_in_area, locate_point_on_line_string, locate_point_on_multi_line_string};
use crate::location::Location;
use crate::numeric::GeoFloat;
use crate::op::OpType;
use crate::precision::PrecisionModel;
use geo_types::{Coord, Geometry};
use std::collections::HashSet;

fn coord_key<T: GeoFloat>(c: Coord<T>) -> (u64, u64) {
    (c.x.to_f64().unwrap_or(0.0).to_bits(), c.y.to_f64().unwrap_or(0.0).to_bits())
}

/// Rounds every point through `pm` and deduplicates by rounded coordinate,
/// preserving first-occurrence order.
fn rounded_distinct<T: GeoFloat>(points: &[Coord<T>], pm: &PrecisionModel<T>) -> Vec<Coord<T>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for &p in points {
        let rounded = pm.round_coord(p);
        if seen.insert(coord_key(rounded)) {
            out.push(rounded);
        }
    }
    out
}

/// Applies `op` as set algebra over two rounded, deduplicated point sets.
pub fn point_point_overlay<T: GeoFloat>(
    a: &[Coord<T>],
    b: &[Coord<T>],
    op: OpType,
    pm: &PrecisionModel<T>,
) -> Vec<Coord<T>> {
    let a = rounded_distinct(a, pm);
    let b = rounded_distinct(b, pm);
    let b_keys: HashSet<(u64, u64)> = b.iter().map(|&p| coord_key(p)).collect();
    let a_keys: HashSet<(u64, u64)> = a.iter().map(|&p| coord_key(p)).collect();

    let mut out = Vec::new();
    match op {
        OpType::Intersection => {
            for p in a {
                if b_keys.contains(&coord_key(p)) {
                    out.push(p);
                }
            }
        }
        OpType::Union => {
            out.extend(a.iter().copied());
            for p in b {
                if !a_keys.contains(&coord_key(p)) {
                    out.push(p);
                }
            }
        }
        OpType::Difference => {
            for p in a {
                if !b_keys.contains(&coord_key(p)) {
                    out.push(p);
                }
            }
        }
        OpType::SymDifference => {
            for p in &a {
                if !b_keys.contains(&coord_key(*p)) {
                    out.push(*p);
                }
            }
            for p in b {
                if !a_keys.contains(&coord_key(p)) {
                    out.push(p);
                }
            }
        }
    }
    out
}

fn locate_against<T: GeoFloat>(p: Coord<T>, geom: &Geometry<T>) -> Location {
    match geom {
        Geometry::LineString(ls) => locate_point_on_line_string(p, ls),
        Geometry::MultiLineString(mls) => locate_point_on_multi_line_string(p, mls),
        Geometry::Line(line) => {
            let ls = geo_types::LineString::new(vec![line.start, line.end]);
            locate_point_on_line_string(p, &ls)
        }
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => locate_point_in_area(p, geom),
        Geometry::GeometryCollection(gc) => {
            let mut best = Location::Exterior;
            for g in &gc.0 {
                match locate_against(p, g) {
                    Location::Interior => return Location::Interior,
                    Location::Boundary => best = Location::Boundary,
                    Location::Exterior => {}
                }
            }
            best
        }
        _ => Location::Exterior,
    }
}

/// Locates each rounded point from the point-only input against the
/// non-point `other` geometry and keeps it or drops it per `op`, treating
/// the point set as whichever side `points_are_a` says it is. A point on
/// `other`'s boundary counts as belonging to `other`.
pub fn mixed_point_overlay<T: GeoFloat>(
    points: &[Coord<T>],
    other: &Geometry<T>,
    op: OpType,
    points_are_a: bool,
    pm: &PrecisionModel<T>,
) -> Vec<Coord<T>> {
    let points = rounded_distinct(points, pm);
    let mut out = Vec::new();
    for p in points {
        let in_other = locate_against(p, other).is_interior_for_result();
        let (a_in, b_in) = if points_are_a { (true, in_other) } else { (in_other, true) };
        if op.is_in_result(Some(bool_to_loc(a_in)), Some(bool_to_loc(b_in))) {
            out.push(p);
        }
    }
    out
}

fn bool_to_loc(in_result: bool) -> Location {
    if in_result {
        Location::Interior
    } else {
        Location::Exterior
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, polygon};

    #[test]
    fn point_point_union_dedupes() {
        let a = vec![coord! {x: 0.0, y: 0.0}, coord! {x: 1.0, y: 1.0}];
        let b = vec![coord! {x: 1.0, y: 1.0}, coord! {x: 2.0, y: 2.0}];
        let pm = PrecisionModel::Floating;
        let mut out = point_point_overlay(&a, &b, OpType::Union, &pm);
        out.sort_by(|p, q| p.x.partial_cmp(&q.x).unwrap());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn point_point_intersection() {
        let a = vec![coord! {x: 0.0, y: 0.0}, coord! {x: 1.0, y: 1.0}];
        let b = vec![coord! {x: 1.0, y: 1.0}];
        let pm = PrecisionModel::Floating;
        let out = point_point_overlay(&a, &b, OpType::Intersection, &pm);
        assert_eq!(out, vec![coord! {x: 1.0, y: 1.0}]);
    }

    #[test]
    fn mixed_point_difference_keeps_points_outside_polygon() {
        let poly: Geometry<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]
        .into();
        let points = vec![coord! {x: 2.0, y: 2.0}, coord! {x: 10.0, y: 10.0}];
        let pm = PrecisionModel::Floating;
        let out = mixed_point_overlay(&points, &poly, OpType::Difference, true, &pm);
        assert_eq!(out, vec![coord! {x: 10.0, y: 10.0}]);
    }
}
