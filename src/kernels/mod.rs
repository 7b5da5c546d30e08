//! Robust geometric predicates used throughout the overlay pipeline.
//!
//! Every decision the noder, the graph builder and the labeller make about
//! where a point lies relative to a line ultimately bottoms out in a call to
//! [`Kernel::orient2d`]. Because overlay correctness depends on these three
//! answers (left / right / collinear) agreeing for every permutation of a
//! triangle's vertices, the default kernel defers to the `robust` crate's
//! adaptive-precision predicates rather than a naive determinant.

use geo_types::{Coord, CoordNum};

mod robust_kernel;
pub use robust_kernel::RobustKernel;

/// The result of an [`Kernel::orient2d`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

impl Orientation {
    /// The `-1 / 0 / +1` form used when the spec's wording is followed literally.
    pub fn index(self) -> i8 {
        match self {
            Orientation::CounterClockwise => 1,
            Orientation::Clockwise => -1,
            Orientation::Collinear => 0,
        }
    }
}

/// Provides the orientation predicate for a numeric type.
///
/// A default (non-robust) implementation is given in terms of a single
/// 2x2 determinant; [`RobustKernel`] overrides it with an adaptive-precision
/// evaluation for floating point coordinates.
pub trait Kernel<T: CoordNum> {
    fn orient2d(p: Coord<T>, q: Coord<T>, r: Coord<T>) -> Orientation {
        let det = (q.x - p.x) * (r.y - q.y) - (q.y - p.y) * (r.x - q.x);
        use num_traits::Zero;
        if det > Zero::zero() {
            Orientation::CounterClockwise
        } else if det < Zero::zero() {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }
}

/// Marker trait assigning a [`Kernel`] implementation to a scalar type.
pub trait HasKernel: CoordNum {
    type Ker: Kernel<Self>;
}

impl HasKernel for f64 {
    type Ker = RobustKernel;
}

impl HasKernel for f32 {
    type Ker = RobustKernel;
}
