//! Axis-aligned envelopes and the precision model.

use crate::numeric::GeoFloat;
use geo_types::Coord;

/// An axis-aligned rectangle `[min_x, max_x] x [min_y, max_y]`.
///
/// Distinct from [`geo_types::Rect`]: a `Rect` cannot represent the empty
/// envelope, but an empty input (or an empty clip region) is a normal
/// intermediate value throughout noding and clipping, so this type tracks
/// emptiness explicitly rather than via a sentinel `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope<T: GeoFloat> {
    min_x: T,
    max_x: T,
    min_y: T,
    max_y: T,
    is_empty: bool,
}

impl<T: GeoFloat> Envelope<T> {
    pub fn empty() -> Self {
        Envelope {
            min_x: T::zero(),
            max_x: T::zero(),
            min_y: T::zero(),
            max_y: T::zero(),
            is_empty: true,
        }
    }

    pub fn of_point(p: Coord<T>) -> Self {
        Envelope {
            min_x: p.x,
            max_x: p.x,
            min_y: p.y,
            max_y: p.y,
            is_empty: false,
        }
    }

    pub fn of_points(a: Coord<T>, b: Coord<T>) -> Self {
        let mut e = Envelope::of_point(a);
        e.expand_to_include(b);
        e
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn min_x(&self) -> T {
        self.min_x
    }
    pub fn max_x(&self) -> T {
        self.max_x
    }
    pub fn min_y(&self) -> T {
        self.min_y
    }
    pub fn max_y(&self) -> T {
        self.max_y
    }

    pub fn width(&self) -> T {
        if self.is_empty {
            T::zero()
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> T {
        if self.is_empty {
            T::zero()
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn expand_to_include(&mut self, p: Coord<T>) {
        if self.is_empty {
            self.min_x = p.x;
            self.max_x = p.x;
            self.min_y = p.y;
            self.max_y = p.y;
            self.is_empty = false;
            return;
        }
        if p.x < self.min_x {
            self.min_x = p.x;
        }
        if p.x > self.max_x {
            self.max_x = p.x;
        }
        if p.y < self.min_y {
            self.min_y = p.y;
        }
        if p.y > self.max_y {
            self.max_y = p.y;
        }
    }

    pub fn expand_to_include_envelope(&mut self, other: &Envelope<T>) {
        if other.is_empty {
            return;
        }
        if self.is_empty {
            *self = *other;
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn expand_by(&self, distance: T) -> Envelope<T> {
        if self.is_empty {
            return *self;
        }
        Envelope {
            min_x: self.min_x - distance,
            max_x: self.max_x + distance,
            min_y: self.min_y - distance,
            max_y: self.max_y + distance,
            is_empty: false,
        }
    }

    /// True iff the two envelopes share at least one point (closed rectangles).
    pub fn intersects(&self, other: &Envelope<T>) -> bool {
        if self.is_empty || other.is_empty {
            return false;
        }
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }

    pub fn disjoint(&self, other: &Envelope<T>) -> bool {
        !self.intersects(other)
    }

    pub fn intersects_point(&self, p: Coord<T>) -> bool {
        if self.is_empty {
            return false;
        }
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// True iff `other` lies entirely within (or on the boundary of) `self`.
    pub fn covers(&self, other: &Envelope<T>) -> bool {
        if self.is_empty || other.is_empty {
            return false;
        }
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn contains(&self, other: &Envelope<T>) -> bool {
        self.covers(other)
    }

    /// The overlap rectangle of `self` and `other`, or the empty envelope if
    /// they don't intersect.
    pub fn intersection(&self, other: &Envelope<T>) -> Envelope<T> {
        if !self.intersects(other) {
            return Envelope::empty();
        }
        Envelope {
            min_x: self.min_x.max(other.min_x),
            max_x: self.max_x.min(other.max_x),
            min_y: self.min_y.max(other.min_y),
            max_y: self.max_y.min(other.max_y),
            is_empty: false,
        }
    }
}

/// A mapping that rounds arbitrary real coordinates to the representable
/// coordinates of the output domain.
///
/// `Floating` performs no rounding at all. `Fixed` snaps every ordinate to
/// the nearest multiple of `1/scale`, using `round(x) = floor(x*scale + 0.5) / scale`
/// — the same half-up convention JTS uses, rather than round-half-to-even.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrecisionModel<T: GeoFloat> {
    Floating,
    Fixed { scale: T },
}

impl<T: GeoFloat> PrecisionModel<T> {
    pub fn fixed(scale: T) -> Self {
        assert!(scale > T::zero(), "precision model scale must be positive");
        PrecisionModel::Fixed { scale }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, PrecisionModel::Floating)
    }

    pub fn scale(&self) -> Option<T> {
        match self {
            PrecisionModel::Floating => None,
            PrecisionModel::Fixed { scale } => Some(*scale),
        }
    }

    /// `round(x) = floor(x * scale + 0.5) / scale`; a no-op under `Floating`.
    pub fn make_precise(&self, x: T) -> T {
        match self {
            PrecisionModel::Floating => x,
            PrecisionModel::Fixed { scale } => {
                let half = T::one() / (T::one() + T::one());
                (x * *scale + half).floor() / *scale
            }
        }
    }

    pub fn round_coord(&self, c: Coord<T>) -> Coord<T> {
        Coord {
            x: self.make_precise(c.x),
            y: self.make_precise(c.y),
        }
    }

    /// An upper bound on the number of significant decimal digits a value
    /// rounded at this scale can carry; used by the robust driver to pick a
    /// "safe" snap-rounding grid that doesn't discard more precision than the
    /// inputs already have.
    pub fn max_significant_digits(&self) -> i32 {
        match self {
            PrecisionModel::Floating => 16,
            PrecisionModel::Fixed { scale } => {
                let log10_scale = scale.to_f64().unwrap_or(1.0).log10().ceil();
                (16.0 - log10_scale).max(1.0) as i32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rounds_half_up() {
        let pm = PrecisionModel::fixed(1.0_f64);
        assert_eq!(pm.make_precise(1.4), 1.0);
        assert_eq!(pm.make_precise(1.5), 2.0);
        assert_eq!(pm.make_precise(-1.5), -1.0);
    }

    #[test]
    fn fixed_rounds_within_tolerance_of_the_grid_point() {
        use approx::assert_relative_eq;
        let pm = PrecisionModel::fixed(3.0_f64);
        // 0.331 is near, but not exactly on, the 1/3 grid point at scale 3 —
        // `assert_eq!` would be the wrong tool here, since the grid point
        // itself (1/3) is not exactly representable in binary floating point.
        assert_relative_eq!(pm.make_precise(0.331), 1.0 / 3.0, max_relative = 1e-9);
    }

    #[test]
    fn fixed_is_idempotent() {
        let pm = PrecisionModel::fixed(10.0_f64);
        let once = pm.make_precise(3.14159);
        let twice = pm.make_precise(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn envelope_disjoint() {
        let a = Envelope::of_points(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let b = Envelope::of_points(Coord { x: 2.0, y: 2.0 }, Coord { x: 3.0, y: 3.0 });
        assert!(a.disjoint(&b));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn envelope_touching_is_not_disjoint() {
        let a = Envelope::of_points(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let b = Envelope::of_points(Coord { x: 1.0, y: 0.0 }, Coord { x: 2.0, y: 1.0 });
        assert!(a.intersects(&b));
    }

    // End-to-end scenarios (§8 "End-to-end scenarios"), precision-reduction
    // half: scenarios 1, 2 and 6 live in `driver`'s own test module.

    #[test]
    fn scenario_3_topology_collapsing_precision_reduction() {
        use wkt::TryFromWkt;
        let input = geo_types::Geometry::<f64>::try_from_wkt_str(
            "POLYGON ((1 1.4, 3.05 1.4, 3 4.1, 6 5, 3.2 4, 3.2 1.4, 7.3 1.4, 7.3 1.2, 1 1.2, 1 1.4))",
        )
        .unwrap();
        let pm = PrecisionModel::fixed(1.0_f64);
        let reduced = crate::driver::reduce_precision(&input, &pm).unwrap();
        assert_eq!(reduced, crate::build::empty_result(Some(2)));
    }

    #[test]
    fn scenario_4_gore_to_hole_under_precision_reduction() {
        use wkt::TryFromWkt;
        let input = geo_types::Geometry::<f64>::try_from_wkt_str(
            "POLYGON ((9 1, 1 1, 1 9, 9 9, 9 5, 5 5.9, 5 4.9, 9 4.9, 9 1))",
        )
        .unwrap();
        let expected = geo_types::Geometry::<f64>::try_from_wkt_str(
            "POLYGON ((9 1, 1 1, 1 9, 9 9, 9 5, 9 1), (9 5, 5 6, 5 5, 9 5))",
        )
        .unwrap();
        let pm = PrecisionModel::fixed(1.0_f64);
        let reduced = crate::driver::reduce_precision(&input, &pm).unwrap();
        assert_eq!(reduced, expected);
    }

    #[test]
    fn scenario_5_multipolygon_narrow_gap_union() {
        use wkt::TryFromWkt;
        let input = geo_types::Geometry::<f64>::try_from_wkt_str(
            "MULTIPOLYGON (((1 9, 5.7 9, 5.7 1, 1 1, 1 9)), ((9 9, 9 1, 6 1, 6 9, 9 9)))",
        )
        .unwrap();
        let expected = geo_types::Geometry::<f64>::try_from_wkt_str(
            "POLYGON ((1 9, 6 9, 9 9, 9 1, 6 1, 1 1, 1 9))",
        )
        .unwrap();
        let pm = PrecisionModel::fixed(1.0_f64);
        let merged = crate::driver::unary_union(&input, Some(pm)).unwrap();
        assert_eq!(merged, expected);
    }
}
