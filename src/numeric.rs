//! The numeric trait bounds shared by every stage of the overlay pipeline.

use crate::kernels::HasKernel;
use geo_types::CoordNum;

/// A trait for scalar types usable as overlay coordinates.
///
/// Overlay is only meaningful over floating point: snap-rounding divides by
/// a `scale` factor and robust orientation needs `NumCast` to `f64`, neither
/// of which makes sense for an integer coordinate domain. `GeoNum` exists
/// (rather than using [`GeoFloat`] everywhere) purely so internal helpers
/// that only need orientation and arithmetic, not rounding, can be written
/// once and reused by both.
pub trait GeoNum: CoordNum + HasKernel {}
impl<T> GeoNum for T where T: CoordNum + HasKernel {}

/// The scalar type bound used by the overlay entry points. `AbsDiffEq` backs
/// the tolerance-based assertions precision-sensitive tests need (exact
/// `assert_eq!` is the wrong tool for a crate whose whole premise is
/// near-coincident vertices); `NextAfter` backs the one-ULP nudge
/// `clip::robust_clip_envelope` applies to its margin so a segment sitting
/// exactly on the nominal envelope boundary is never clipped away by it.
pub trait GeoFloat:
    GeoNum
    + num_traits::Float
    + num_traits::Signed
    + num_traits::Bounded
    + float_next_after::NextAfter
    + approx::AbsDiffEq<Epsilon = Self>
{
}
impl<T> GeoFloat for T where
    T: GeoNum
        + num_traits::Float
        + num_traits::Signed
        + num_traits::Bounded
        + float_next_after::NextAfter
        + approx::AbsDiffEq<Epsilon = Self>
{
}
