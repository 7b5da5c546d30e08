//! `geo-overlay-ng` computes boolean overlay operations — intersection, union,
//! difference and symmetric difference — on 2-D planar vector geometries
//! under a caller-supplied precision model.
//!
//! # Pipeline
//!
//! The overlay runs in four stages, leaves first:
//!
//! 1. [`edge`] extracts labelled input edges from each input geometry and
//!    hands them to a [`noding::Noder`] — either the validating monotone-chain
//!    noder (floating precision) or the [`noding::snap_rounding`] noder
//!    (fixed precision) — producing a fully noded, merged edge set.
//! 2. [`graph`] assembles a half-edge topology graph over the noded edges and
//!    [`graph::labeller`] propagates interior/exterior locations around every
//!    node.
//! 3. [`build`] extracts polygons (via maximal/minimal edge rings and hole
//!    assignment), lines and isolated points from the fully labelled graph
//!    according to the selected operator's truth table ([`op`]).
//! 4. [`driver`] wraps the whole pipeline in a retry ladder that falls back to
//!    snapping and then snap-rounding noders when floating-precision noding
//!    produces an invalid arrangement.
//!
//! Geometry primitives ([`Coord`], [`Line`], [`LineString`], [`Polygon`], ...)
//! are reexported from [`geo-types`]; this crate does not define its own
//! geometry-tree representation.
//!
//! [`geo-types`]: https://crates.io/crates/geo-types

#[macro_use]
extern crate log;

pub use geo_types::{coord, line_string, point, polygon, Coord, CoordNum, Line, LineString, Point};
pub use geo_types::{Geometry, GeometryCollection, MultiLineString, MultiPoint, MultiPolygon, Polygon, Rect};

pub mod kernels;
pub mod numeric;
pub use numeric::{GeoFloat, GeoNum};

pub mod predicates;
pub mod precision;
pub use precision::PrecisionModel;

pub mod chain;
pub mod kdtree;
pub mod hot_pixel;

pub mod noding;
pub mod clip;
pub mod edge;

pub mod graph;

pub mod build;

pub mod op;
pub use op::OpType;

pub mod error;
pub use error::{OverlayError, OverlayResult};

pub mod driver;
pub use driver::{overlay, overlay_robust, reduce_precision, unary_union};
