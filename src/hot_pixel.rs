//! Hot pixels: the half-open grid squares snap-rounding moves vertices into.
//!
//! A pixel centered on a rounded coordinate `(cx, cy)` at scale `s` occupies,
//! in the scaled integer domain, `[s·cx - 0.5, s·cx + 0.5) × [s·cy - 0.5, s·cy + 0.5)`
//! — open on the top and right so that adjacent pixels tile the plane without
//! overlap or gaps.

use crate::kernels::{HasKernel, Kernel, Orientation};
use crate::numeric::GeoFloat;
use crate::precision::Envelope;
use geo_types::{Coord, Line};

/// A hot pixel, plus whether snap-rounding has promoted it to a required
/// node (as opposed to merely an input vertex that may or may not end up
/// being noded).
#[derive(Debug, Clone, Copy)]
pub struct HotPixel<T: GeoFloat> {
    center: Coord<T>,
    scale: T,
    is_node: bool,
}

impl<T: GeoFloat> HotPixel<T> {
    pub fn new(center: Coord<T>, scale: T) -> Self {
        HotPixel {
            center,
            scale,
            is_node: false,
        }
    }

    pub fn center(&self) -> Coord<T> {
        self.center
    }

    pub fn is_node(&self) -> bool {
        self.is_node
    }

    pub fn mark_as_node(&mut self) {
        self.is_node = true;
    }

    fn half(&self) -> T {
        let two = T::one() + T::one();
        T::one() / (two * self.scale)
    }

    /// `[cx - 1/2s, cx + 1/2s) × [cy - 1/2s, cy + 1/2s)` in original (not
    /// scaled) coordinates.
    fn bounds(&self) -> (T, T, T, T) {
        let h = self.half();
        (self.center.x - h, self.center.x + h, self.center.y - h, self.center.y + h)
    }

    pub fn intersects_point(&self, p: Coord<T>) -> bool {
        let (min_x, max_x, min_y, max_y) = self.bounds();
        p.x >= min_x && p.x < max_x && p.y >= min_y && p.y < max_y
    }

    /// True iff segment `p0 -> p1` passes through the pixel's half-open
    /// region, per the corner-orientation test (axis-aligned segments take a
    /// fast path via the envelope test alone).
    pub fn intersects_segment(&self, p0: Coord<T>, p1: Coord<T>) -> bool {
        let (min_x, max_x, min_y, max_y) = self.bounds();

        let seg_env = Envelope::of_points(p0, p1);
        // Reject using the half-open top/right convention: a segment whose
        // envelope only reaches the excluded boundary cannot intersect.
        if seg_env.max_x() < min_x
            || seg_env.min_x() >= max_x
            || seg_env.max_y() < min_y
            || seg_env.min_y() >= max_y
        {
            return false;
        }

        if p0.x == p1.x || p0.y == p1.y {
            // Axis-aligned: envelope overlap against the half-open box (just
            // checked) is already sufficient.
            return true;
        }

        // Closed (left, bottom) vs. open (right, top) corners, named by
        // which closed sides they sit on.
        let ll = Coord { x: min_x, y: min_y };
        let lr = Coord { x: max_x, y: min_y };
        let ul = Coord { x: min_x, y: max_y };

        let o_ll = <T as HasKernel>::Ker::orient2d(p0, p1, ll);
        let o_lr = <T as HasKernel>::Ker::orient2d(p0, p1, lr);
        let o_ul = <T as HasKernel>::Ker::orient2d(p0, p1, ul);

        // Left side (UL-LL) or bottom side (LL-LR) crossed: orientations of
        // their endpoints differ w.r.t. the oriented segment.
        if o_ul != o_ll || o_ll != o_lr {
            return true;
        }

        // Otherwise the segment's line only touches the pixel, if at all,
        // through one of the closed corners lying exactly on it.
        let on_segment = |c: Coord<T>| {
            let env = Envelope::of_points(p0, p1);
            env.intersects_point(c)
        };
        (o_ll == Orientation::Collinear && on_segment(ll))
            || (o_lr == Orientation::Collinear && on_segment(lr))
            || (o_ul == Orientation::Collinear && on_segment(ul))
    }
}

/// Returns the rounded grid center of the pixel containing `p`, under the
/// half-up convention `round(x) = floor(x*scale + 0.5) / scale`.
pub fn pixel_center_for<T: GeoFloat>(p: Coord<T>, scale: T) -> Coord<T> {
    let half = T::one() / (T::one() + T::one());
    Coord {
        x: (p.x * scale + half).floor() / scale,
        y: (p.y * scale + half).floor() / scale,
    }
}

/// Convenience: test whether `pixel` intersects the (unrounded) segment
/// `line`.
pub fn intersects_line<T: GeoFloat>(pixel: &HotPixel<T>, line: Line<T>) -> bool {
    pixel.intersects_segment(line.start, line.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn pixel_contains_its_own_center() {
        let pixel = HotPixel::new(coord! {x: 1.0, y: 1.0}, 1.0);
        assert!(pixel.intersects_point(coord! {x: 1.0, y: 1.0}));
    }

    #[test]
    fn pixel_excludes_top_right_boundary() {
        let pixel = HotPixel::new(coord! {x: 0.0, y: 0.0}, 1.0);
        // half-extent is 0.5 at scale 1.0
        assert!(!pixel.intersects_point(coord! {x: 0.5, y: 0.0}));
        assert!(!pixel.intersects_point(coord! {x: 0.0, y: 0.5}));
        assert!(pixel.intersects_point(coord! {x: -0.5, y: 0.0}));
        assert!(pixel.intersects_point(coord! {x: 0.0, y: -0.5}));
    }

    #[test]
    fn pixel_center_for_lands_on_the_grid_within_one_ulp() {
        use approx::assert_abs_diff_eq;
        let scale = 4.0_f64;
        let center = pixel_center_for(coord! {x: 1.37, y: -2.61}, scale);
        // centers must land on exact multiples of 1/scale, up to the
        // rounding of the division itself — `abs_diff_eq!` accounts for
        // that last bit of float slop that `assert_eq!` can't.
        assert_abs_diff_eq!((center.x * scale).round() / scale, center.x, epsilon = 1e-12);
        assert_abs_diff_eq!((center.y * scale).round() / scale, center.y, epsilon = 1e-12);
    }

    #[test]
    fn every_point_has_exactly_one_containing_pixel_center() {
        let scale = 4.0_f64;
        let p = coord! {x: 1.37, y: -2.61};
        let center = pixel_center_for(p, scale);
        let pixel = HotPixel::new(center, scale);
        assert!(pixel.intersects_point(p));

        // Neighboring grid centers must not also contain it.
        let step = 1.0 / scale;
        for dx in [-step, 0.0, step] {
            for dy in [-step, 0.0, step] {
                if dx == 0.0 && dy == 0.0 {
                    continue;
                }
                let other = HotPixel::new(coord! {x: center.x + dx, y: center.y + dy}, scale);
                assert!(!other.intersects_point(p));
            }
        }
    }

    #[test]
    fn diagonal_segment_through_pixel_interior_intersects() {
        let pixel = HotPixel::new(coord! {x: 0.0, y: 0.0}, 1.0);
        let hit = pixel.intersects_segment(coord! {x: -1.0, y: -1.0}, coord! {x: 1.0, y: 1.0});
        assert!(hit);
    }

    #[test]
    fn diagonal_segment_missing_pixel_does_not_intersect() {
        let pixel = HotPixel::new(coord! {x: 0.0, y: 0.0}, 1.0);
        let miss = pixel.intersects_segment(coord! {x: 5.0, y: -1.0}, coord! {x: 6.0, y: 1.0});
        assert!(!miss);
    }
}
