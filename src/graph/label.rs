//! Overlay labels (§3 "Overlay label"): per-input dimension and location
//! state shared by both half-edges of a pair.
//!
//! Modeled after the teacher's `geomgraph::TopologyPosition` — an `Area`
//! variant carrying on/left/right, a `LineOrPoint` variant carrying only
//! `on`, both represented with `Option` rather than a `NONE` enum variant —
//! generalized with the extra `Collapse`/`NotPart` dimensions §3 calls for
//! and a `flip` that swaps left/right exactly as the teacher's does.

use crate::edge::{Edge, EdgeDim, InputIndex};
use crate::location::{Location, Side};

/// The topological dimension an edge has with respect to one input, after
/// merging (§3 "Edge").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSetDim {
    /// This edge carries no information from this input at all.
    NotPart,
    /// A 1-dimensional (line) edge of this input.
    Line,
    /// An area-boundary edge of this input whose two copies cancelled
    /// (merged depth delta of zero) — no area interior on either side.
    Collapse,
    /// A surviving area-boundary edge of this input.
    Boundary,
}

/// Per-input label state for one merged edge.
#[derive(Debug, Clone, Copy)]
pub struct InputLabel {
    pub dim: EdgeSetDim,
    on: Option<Location>,
    left: Option<Location>,
    right: Option<Location>,
    pub is_hole: bool,
    pub is_shell: bool,
}

impl InputLabel {
    fn not_part() -> Self {
        InputLabel {
            dim: EdgeSetDim::NotPart,
            on: None,
            left: None,
            right: None,
            is_hole: false,
            is_shell: false,
        }
    }

    fn from_edge_side<T: crate::numeric::GeoFloat>(edge: &Edge<T>, index: InputIndex) -> Self {
        let (dim_opt, depth_delta, is_hole, is_shell) = match index {
            InputIndex::A => (edge.a_dim, edge.a_depth_delta, edge.a_is_hole, edge.a_is_shell),
            InputIndex::B => (edge.b_dim, edge.b_depth_delta, edge.b_is_hole, edge.b_is_shell),
        };
        let Some(dim) = dim_opt else {
            return InputLabel::not_part();
        };
        match dim {
            EdgeDim::Line => InputLabel {
                dim: EdgeSetDim::Line,
                on: Some(Location::Interior),
                left: Some(Location::Interior),
                right: Some(Location::Interior),
                is_hole,
                is_shell,
            },
            EdgeDim::Area => {
                if depth_delta == 0 {
                    InputLabel {
                        dim: EdgeSetDim::Collapse,
                        on: None,
                        left: None,
                        right: None,
                        is_hole,
                        is_shell,
                    }
                } else {
                    // Canonically oriented (depth_delta > 0): the merged
                    // edge's stored direction has the area interior on its
                    // right and exterior on its left (§4.2's derivation: a
                    // canonically-oriented shell is CW, whose own bounded
                    // region sits on the right of travel; a canonically
                    // oriented hole is CCW with the polygon's true interior
                    // likewise on the right). A non-canonical source ring
                    // flips this.
                    let (left, right) = if depth_delta > 0 {
                        (Location::Exterior, Location::Interior)
                    } else {
                        (Location::Interior, Location::Exterior)
                    };
                    InputLabel {
                        dim: EdgeSetDim::Boundary,
                        on: Some(Location::Interior),
                        left: Some(left),
                        right: Some(right),
                        is_hole,
                        is_shell,
                    }
                }
            }
        }
    }

    pub fn on(&self) -> Option<Location> {
        self.on
    }

    pub fn set_on(&mut self, loc: Location) {
        if self.on.is_none() {
            self.on = Some(loc);
        }
        if self.dim != EdgeSetDim::Boundary {
            self.left.get_or_insert(loc);
            self.right.get_or_insert(loc);
        }
    }

    /// The location on `side`, relative to the edge's own stored (forward)
    /// direction. Non-boundary dimensions have no left/right split, so both
    /// sides answer with `on`.
    pub fn side(&self, side: Side) -> Option<Location> {
        if self.dim != EdgeSetDim::Boundary {
            return self.on;
        }
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// The overlay label shared by both half-edges of a merged edge pair.
#[derive(Debug, Clone, Copy)]
pub struct OverlayLabel {
    pub a: InputLabel,
    pub b: InputLabel,
}

impl OverlayLabel {
    pub fn from_edge<T: crate::numeric::GeoFloat>(edge: &Edge<T>) -> Self {
        OverlayLabel {
            a: InputLabel::from_edge_side(edge, InputIndex::A),
            b: InputLabel::from_edge_side(edge, InputIndex::B),
        }
    }

    pub fn input(&self, index: InputIndex) -> &InputLabel {
        match index {
            InputIndex::A => &self.a,
            InputIndex::B => &self.b,
        }
    }

    pub fn input_mut(&mut self, index: InputIndex) -> &mut InputLabel {
        match index {
            InputIndex::A => &mut self.a,
            InputIndex::B => &mut self.b,
        }
    }

    /// The location on `side` as seen by a half-edge traversed in `forward`
    /// direction relative to the edge's own stored direction — reversed
    /// traversal sees left and right swapped, exactly as the teacher's
    /// `TopologyPosition::flip` does for its own area labels.
    pub fn side_for(&self, index: InputIndex, side: Side, forward: bool) -> Option<Location> {
        let side = if forward { side } else { side.flip() };
        self.input(index).side(side)
    }
}
