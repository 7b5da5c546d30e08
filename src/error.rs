//! Overlay error taxonomy.
//!
//! Mirrors the kind-based taxonomy of the external interface rather than one
//! variant per internal failure site: callers (in particular the robust
//! driver) branch on kind, not on which component raised it.

use core::fmt;
use geo_types::Coord;

use crate::numeric::GeoFloat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidInputKind {
    NullGeometry,
    MixedDimensionCollection,
    NonPointFedToPointOverlay,
}

/// A `TopologyException`-equivalent: every recoverable-at-the-driver failure
/// kind, plus the always-fatal ones.
#[derive(Debug)]
pub enum OverlayError<T: GeoFloat> {
    /// Invalid input detected before any topology work started.
    InvalidInput {
        kind: InvalidInputKind,
        message: &'static str,
    },
    /// Side-location disagreement found while labelling a boundary edge.
    TopologyInconsistency {
        message: &'static str,
        coordinate: Option<Coord<T>>,
    },
    /// The validating noder found an unnoded interior intersection.
    NodingFailure { coordinate: Coord<T> },
    /// A free hole could not be assigned to a shell, or a maximal ring could
    /// not be decomposed into minimal rings.
    RingAssemblyFailure { message: &'static str },
    /// An internal invariant was violated (should-never-reach-here).
    Unexpected { message: &'static str },
}

impl<T: GeoFloat> OverlayError<T> {
    pub fn noding_failure(coordinate: Coord<T>) -> Self {
        OverlayError::NodingFailure { coordinate }
    }

    pub fn topology_inconsistency(message: &'static str, coordinate: Coord<T>) -> Self {
        OverlayError::TopologyInconsistency {
            message,
            coordinate: Some(coordinate),
        }
    }

    pub fn ring_assembly_failure(message: &'static str) -> Self {
        OverlayError::RingAssemblyFailure { message }
    }

    pub fn unexpected(message: &'static str) -> Self {
        OverlayError::Unexpected { message }
    }

    /// Whether the robust driver should catch this and retry at coarser
    /// precision, rather than always surfacing it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OverlayError::TopologyInconsistency { .. } | OverlayError::NodingFailure { .. }
        )
    }
}

impl<T: GeoFloat> fmt::Display for OverlayError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::InvalidInput { message, .. } => write!(f, "invalid input: {message}"),
            OverlayError::TopologyInconsistency { message, coordinate } => match coordinate {
                Some(c) => write!(f, "topology exception: {message} at ({:?}, {:?})", c.x, c.y),
                None => write!(f, "topology exception: {message}"),
            },
            OverlayError::NodingFailure { coordinate } => {
                write!(
                    f,
                    "noding failure: unnoded intersection at ({:?}, {:?})",
                    coordinate.x, coordinate.y
                )
            }
            OverlayError::RingAssemblyFailure { message } => write!(f, "ring assembly failure: {message}"),
            OverlayError::Unexpected { message } => write!(f, "unexpected internal error: {message}"),
        }
    }
}

impl<T: GeoFloat + fmt::Debug> std::error::Error for OverlayError<T> {}

pub type OverlayResult<T, G> = Result<G, OverlayError<T>>;
