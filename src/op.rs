//! The boolean operator and its result-inclusion truth tables (§4.9, §6).

use crate::location::Location;

/// Which boolean overlay operation to compute.
///
/// Named and ordered after the teacher's own `bool_ops::OpType`, but using
/// the spec's `SymDifference` rather than the teacher's `Xor` so the name
/// matches the vocabulary used throughout this crate's docs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Intersection,
    Union,
    Difference,
    SymDifference,
}

impl OpType {
    /// Whether the region characterized by locations `(a, b)` for the two
    /// inputs belongs to the result, under this operation's truth table.
    /// `BOUNDARY` is treated as `INTERIOR`; a missing location (the input
    /// has no area/line component there) is treated as `EXTERIOR`.
    pub fn is_in_result(self, a: Option<Location>, b: Option<Location>) -> bool {
        let a_in = a.map(Location::is_interior_for_result).unwrap_or(false);
        let b_in = b.map(Location::is_interior_for_result).unwrap_or(false);
        match self {
            OpType::Intersection => a_in && b_in,
            OpType::Union => a_in || b_in,
            OpType::Difference => a_in && !b_in,
            OpType::SymDifference => a_in != b_in,
        }
    }

    /// The dimension of an empty result, per §4.10: intersection takes the
    /// smaller input dimension, union/symdiff the larger, difference always
    /// takes A's. `None` represents "no input had that dimension" (-1 in the
    /// spec's numbering), which yields an empty heterogeneous collection.
    pub fn empty_result_dimension(self, a_dim: Option<u8>, b_dim: Option<u8>) -> Option<u8> {
        match self {
            OpType::Intersection => match (a_dim, b_dim) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            },
            OpType::Union | OpType::SymDifference => match (a_dim, b_dim) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            },
            OpType::Difference => a_dim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_needs_both_interior() {
        let op = OpType::Intersection;
        assert!(op.is_in_result(Some(Location::Interior), Some(Location::Interior)));
        assert!(!op.is_in_result(Some(Location::Interior), Some(Location::Exterior)));
    }

    #[test]
    fn boundary_counts_as_interior() {
        let op = OpType::Intersection;
        assert!(op.is_in_result(Some(Location::Boundary), Some(Location::Boundary)));
    }

    #[test]
    fn missing_location_counts_as_exterior() {
        let op = OpType::Union;
        assert!(op.is_in_result(Some(Location::Interior), None));
        assert!(!op.is_in_result(None, None));
    }

    #[test]
    fn symdifference_is_exclusive_or() {
        let op = OpType::SymDifference;
        assert!(op.is_in_result(Some(Location::Interior), Some(Location::Exterior)));
        assert!(!op.is_in_result(Some(Location::Interior), Some(Location::Interior)));
    }
}
