use super::{Kernel, Orientation};
use geo_types::Coord;
use num_traits::{Float, NumCast};

/// Orientation predicate backed by the `robust` crate's adaptive-precision
/// determinant evaluation: a fast double-precision filter, falling back to
/// double-double arithmetic only when the filter's error bound is exceeded.
#[derive(Default)]
pub struct RobustKernel;

impl<T: Float> Kernel<T> for RobustKernel {
    fn orient2d(p: Coord<T>, q: Coord<T>, r: Coord<T>) -> Orientation {
        let cast = |c: Coord<T>| robust::Coord {
            x: <f64 as NumCast>::from(c.x).unwrap(),
            y: <f64 as NumCast>::from(c.y).unwrap(),
        };

        let det = robust::orient2d(cast(p), cast(q), cast(r));
        if det > 0. {
            Orientation::CounterClockwise
        } else if det < 0. {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }
}
