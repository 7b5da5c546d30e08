//! Point-on-geometry locators (the `PointOnGeometryLocator` injection point,
//! §9): ray-crossing point-in-polygon and mod-2-boundary point-on-line
//! tests, used by the labeller's disconnected-edge fallback (§4.9 step 5)
//! and by the mixed-point overlay builder (§4.10).
//!
//! Grounded on the teacher's `coordinate_position::CoordinatePosition`: the
//! same "is_inside flag plus boundary mod-2 counter" shape, specialized to
//! the ring-crossing-number algorithm rather than `Intersects`-based
//! recursion, since overlay already has a robust orientation kernel on hand.

use crate::kernels::{HasKernel, Kernel, Orientation};
use crate::location::Location;
use crate::numeric::GeoFloat;
use crate::precision::Envelope;
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};

fn on_segment<T: GeoFloat>(p: Coord<T>, a: Coord<T>, b: Coord<T>) -> bool {
    if <T as HasKernel>::Ker::orient2d(a, b, p) != Orientation::Collinear {
        return false;
    }
    Envelope::of_points(a, b).intersects_point(p)
}

/// Ray-crossing-number test of `p` against a single ring (closed coordinate
/// sequence). Casts a conceptual ray from `p` in the `+x` direction and
/// counts crossings, using the orientation kernel rather than floating
/// comparisons to classify each crossing, so the parity is exact.
pub fn locate_point_in_ring<T: GeoFloat>(p: Coord<T>, ring: &[Coord<T>]) -> Location {
    if ring.len() < 4 {
        return Location::Exterior;
    }
    let mut crossings = 0usize;
    for i in 0..ring.len() - 1 {
        let p1 = ring[i];
        let p2 = ring[i + 1];
        if on_segment(p, p1, p2) {
            return Location::Boundary;
        }
        if (p1.y > p.y) != (p2.y > p.y) {
            let orient = <T as HasKernel>::Ker::orient2d(p1, p2, p);
            let upward = p1.y < p2.y;
            if (upward && orient == Orientation::CounterClockwise)
                || (!upward && orient == Orientation::Clockwise)
            {
                crossings += 1;
            }
        }
    }
    if crossings % 2 == 1 {
        Location::Interior
    } else {
        Location::Exterior
    }
}

/// Point-in-polygon: exterior ring determines interior/exterior, then every
/// hole can only ever remove area (interior-of-hole = exterior-of-polygon).
pub fn locate_point_in_polygon<T: GeoFloat>(p: Coord<T>, polygon: &Polygon<T>) -> Location {
    match locate_point_in_ring(p, &polygon.exterior().0) {
        Location::Exterior => return Location::Exterior,
        Location::Boundary => return Location::Boundary,
        Location::Interior => {}
    }
    for hole in polygon.interiors() {
        match locate_point_in_ring(p, &hole.0) {
            Location::Interior => return Location::Exterior,
            Location::Boundary => return Location::Boundary,
            Location::Exterior => {}
        }
    }
    Location::Interior
}

pub fn locate_point_in_multi_polygon<T: GeoFloat>(p: Coord<T>, mp: &MultiPolygon<T>) -> Location {
    let mut best = Location::Exterior;
    for poly in &mp.0 {
        match locate_point_in_polygon(p, poly) {
            Location::Interior => return Location::Interior,
            Location::Boundary => best = Location::Boundary,
            Location::Exterior => {}
        }
    }
    best
}

/// Point-on-line: interior if `p` lies on the interior of any component
/// segment or coincides with an interior vertex; boundary if `p` is an
/// endpoint of an odd number of components (the OGC mod-2 boundary rule);
/// otherwise exterior.
pub fn locate_point_on_line_string<T: GeoFloat>(p: Coord<T>, line: &LineString<T>) -> Location {
    locate_point_on_lines(p, std::iter::once(line))
}

pub fn locate_point_on_multi_line_string<T: GeoFloat>(p: Coord<T>, mls: &MultiLineString<T>) -> Location {
    locate_point_on_lines(p, mls.0.iter())
}

fn locate_point_on_lines<'a, T: GeoFloat + 'a>(
    p: Coord<T>,
    lines: impl Iterator<Item = &'a LineString<T>>,
) -> Location {
    let mut is_inside = false;
    let mut boundary_count = 0usize;
    for line in lines {
        if line.0.len() < 2 {
            continue;
        }
        let closed = line.0.first() == line.0.last();
        if !closed {
            if p == line.0[0] || p == *line.0.last().unwrap() {
                boundary_count += 1;
                continue;
            }
        }
        for i in 0..line.0.len() - 1 {
            if on_segment(p, line.0[i], line.0[i + 1]) {
                is_inside = true;
                break;
            }
        }
    }
    if boundary_count % 2 == 1 {
        Location::Boundary
    } else if is_inside {
        Location::Interior
    } else {
        Location::Exterior
    }
}

/// Locates `p` against an arbitrary input geometry, dispatching to the
/// area or line locator depending on what the geometry actually is. Used
/// only for the area case by the labeller; the mixed-point builder also
/// uses the line case directly.
pub fn locate_point_in_area<T: GeoFloat>(p: Coord<T>, geom: &Geometry<T>) -> Location {
    match geom {
        Geometry::Polygon(poly) => locate_point_in_polygon(p, poly),
        Geometry::MultiPolygon(mp) => locate_point_in_multi_polygon(p, mp),
        Geometry::GeometryCollection(gc) => {
            let mut best = Location::Exterior;
            for g in &gc.0 {
                match locate_point_in_area(p, g) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    fn square() -> Vec<Coord<f64>> {
        vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 4.0, y: 0.0},
            coord! {x: 4.0, y: 4.0},
            coord! {x: 0.0, y: 4.0},
            coord! {x: 0.0, y: 0.0},
        ]
    }

    #[test]
    fn interior_point() {
        assert_eq!(locate_point_in_ring(coord! {x: 2.0, y: 2.0}, &square()), Location::Interior);
    }

    #[test]
    fn exterior_point() {
        assert_eq!(locate_point_in_ring(coord! {x: 10.0, y: 10.0}, &square()), Location::Exterior);
    }

    #[test]
    fn boundary_point() {
        assert_eq!(locate_point_in_ring(coord! {x: 0.0, y: 2.0}, &square()), Location::Boundary);
    }

    #[test]
    fn vertex_point_is_boundary() {
        assert_eq!(locate_point_in_ring(coord! {x: 0.0, y: 0.0}, &square()), Location::Boundary);
    }

    #[test]
    fn point_in_hole_is_exterior() {
        let poly = Polygon::new(
            LineString::new(square()),
            vec![LineString::new(vec![
                coord! {x: 1.0, y: 1.0},
                coord! {x: 3.0, y: 1.0},
                coord! {x: 3.0, y: 3.0},
                coord! {x: 1.0, y: 3.0},
                coord! {x: 1.0, y: 1.0},
            ])],
        );
        assert_eq!(locate_point_in_polygon(coord! {x: 2.0, y: 2.0}, &poly), Location::Exterior);
        assert_eq!(locate_point_in_polygon(coord! {x: 0.5, y: 0.5}, &poly), Location::Interior);
    }

    #[test]
    fn line_endpoint_is_boundary_interior_vertex_is_not() {
        let line = LineString::new(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 0.0},
            coord! {x: 2.0, y: 0.0},
        ]);
        assert_eq!(locate_point_on_line_string(coord! {x: 0.0, y: 0.0}, &line), Location::Boundary);
        assert_eq!(locate_point_on_line_string(coord! {x: 1.0, y: 0.0}, &line), Location::Interior);
    }

    #[test]
    fn closed_line_has_no_boundary() {
        let ring = LineString::new(square());
        assert_eq!(locate_point_on_line_string(coord! {x: 0.0, y: 0.0}, &ring), Location::Interior);
    }
}
