//! Per-input topological locations assigned to graph components (§3, §4.9).

use core::fmt;

/// Where a point or edge side lies relative to one input geometry.
///
/// The spec's fourth value, `NONE`, is represented by `Option<Location>`
/// being `None` rather than as a variant here — the same choice this crate's
/// teacher makes for its own location type (an unset discriminant is a
/// distinct, checkable state, not a fourth answer to "which side").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Interior,
    Boundary,
    Exterior,
}

impl Location {
    /// `BOUNDARY` is treated as `INTERIOR` for every overlay truth table
    /// (§4.9, §6).
    pub fn is_interior_for_result(self) -> bool {
        matches!(self, Location::Interior | Location::Boundary)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Location::Interior => 'i',
            Location::Boundary => 'b',
            Location::Exterior => 'e',
        };
        write!(f, "{c}")
    }
}

/// A side of a directed half-edge, or the single "on" position of a
/// non-boundary edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}
