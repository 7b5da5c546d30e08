//! The overlay graph (C10): a half-edge (DCEL) topology built over the
//! noded, merged edges, with overlay labels and result-marking flags.
//!
//! The half-edges live in a flat arena — parallel vectors indexed by
//! `usize` rather than an owning pointer graph — per §9's design note: this
//! sidesteps the reference cycles a symmetric-pair / shared-label structure
//! would otherwise need, and keeps the angular sort that favors every node
//! cache-local. The same arena-of-indices shape is already used by this
//! crate's [`crate::kdtree::KdTree`].

pub mod label;
pub mod labeller;

use crate::edge::{Edge, EdgeDim, InputIndex};
use crate::location::{Location, Side};
use crate::numeric::GeoFloat;
use crate::op::OpType;
use crate::predicates::orientation_index;
use geo_types::Coord;
use label::{EdgeSetDim, OverlayLabel};
use std::collections::HashMap;

/// Quadrant of the ray from a node to a half-edge's direction point, used to
/// sort outgoing half-edges CCW around their origin. Declaration order (NE,
/// NW, SW, SE) matches increasing angle from the `+x` axis sweeping CCW, the
/// same convention the teacher's `geomgraph::Quadrant` uses for its
/// `EdgeEnd` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Quadrant {
    NE,
    NW,
    SW,
    SE,
}

impl Quadrant {
    fn of<T: GeoFloat>(dx: T, dy: T) -> Quadrant {
        match (dy >= T::zero(), dx >= T::zero()) {
            (true, true) => Quadrant::NE,
            (true, false) => Quadrant::NW,
            (false, false) => Quadrant::SW,
            (false, true) => Quadrant::SE,
        }
    }
}

/// Orders two direction points by the angle their ray from `origin` makes,
/// increasing CCW from the `+x` axis. Ported from the teacher's
/// `EdgeEndKey::compare_direction`.
fn compare_direction<T: GeoFloat>(origin: Coord<T>, a: Coord<T>, b: Coord<T>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    if a == b {
        return Ordering::Equal;
    }
    let qa = Quadrant::of(a.x - origin.x, a.y - origin.y);
    let qb = Quadrant::of(b.x - origin.x, b.y - origin.y);
    if qa != qb {
        return qa.cmp(&qb);
    }
    match orientation_index(origin, b, a) {
        -1 => Ordering::Less,
        1 => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn node_key<T: GeoFloat>(c: Coord<T>) -> (u64, u64) {
    (c.x.to_f64().unwrap_or(0.0).to_bits(), c.y.to_f64().unwrap_or(0.0).to_bits())
}

/// The overlay graph: a half-edge arena plus one anchor half-edge per node.
///
/// Half-edges are allocated in consecutive pairs; half-edge `2k` is the
/// forward traversal of merged edge `k`, `2k+1` its reverse, so the
/// symmetric partner of `he` is always `he ^ 1` and needs no separate
/// lookup table.
pub struct OverlayGraph<T: GeoFloat> {
    edges: Vec<Edge<T>>,
    labels: Vec<OverlayLabel>,
    origin: Vec<Coord<T>>,
    dir_point: Vec<Coord<T>>,
    forward: Vec<bool>,
    next: Vec<usize>,
    in_result_area: Vec<bool>,
    in_result_line: Vec<bool>,
    visited: Vec<bool>,
    node_anchor: HashMap<(u64, u64), usize>,
}

impl<T: GeoFloat> OverlayGraph<T> {
    pub fn build(edges: Vec<Edge<T>>) -> Self {
        let n = edges.len();
        let mut graph = OverlayGraph {
            labels: edges.iter().map(OverlayLabel::from_edge).collect(),
            origin: vec![Coord { x: T::zero(), y: T::zero() }; 2 * n],
            dir_point: vec![Coord { x: T::zero(), y: T::zero() }; 2 * n],
            forward: vec![true; 2 * n],
            next: (0..2 * n).collect(),
            in_result_area: vec![false; 2 * n],
            in_result_line: vec![false; 2 * n],
            visited: vec![false; 2 * n],
            node_anchor: HashMap::new(),
            edges,
        };

        for k in 0..n {
            let coords = &graph.edges[k].coords;
            let last = coords.len() - 1;
            let fwd = 2 * k;
            let rev = 2 * k + 1;
            graph.origin[fwd] = coords[0];
            graph.dir_point[fwd] = coords[1];
            graph.forward[fwd] = true;
            graph.origin[rev] = coords[last];
            graph.dir_point[rev] = coords[last - 1];
            graph.forward[rev] = false;
        }

        for he in 0..2 * n {
            graph.insert_at_origin(he);
        }

        graph
    }

    pub fn half_edge_count(&self) -> usize {
        self.origin.len()
    }

    pub fn sym(&self, he: usize) -> usize {
        he ^ 1
    }

    pub fn edge_index(&self, he: usize) -> usize {
        he / 2
    }

    pub fn edge(&self, he: usize) -> &Edge<T> {
        &self.edges[he / 2]
    }

    pub fn origin_of(&self, he: usize) -> Coord<T> {
        self.origin[he]
    }

    pub fn dest_of(&self, he: usize) -> Coord<T> {
        self.origin[self.sym(he)]
    }

    pub fn is_forward(&self, he: usize) -> bool {
        self.forward[he]
    }

    /// The half-edge's coordinate sequence, origin to destination.
    pub fn coords(&self, he: usize) -> Vec<Coord<T>> {
        let edge = self.edge(he);
        if self.forward[he] {
            edge.coords.clone()
        } else {
            let mut c = edge.coords.clone();
            c.reverse();
            c
        }
    }

    pub fn label(&self, he: usize) -> &OverlayLabel {
        &self.labels[he / 2]
    }

    pub fn label_mut(&mut self, he: usize) -> &mut OverlayLabel {
        &mut self.labels[he / 2]
    }

    pub fn dim(&self, he: usize, index: InputIndex) -> EdgeSetDim {
        self.label(he).input(index).dim
    }

    /// The location on `side` of `he`, for input `index`, accounting for
    /// which direction `he` traverses its underlying edge.
    pub fn side_location(&self, he: usize, index: InputIndex, side: Side) -> Option<Location> {
        self.label(he).side_for(index, side, self.forward[he])
    }

    pub fn next(&self, he: usize) -> usize {
        self.next[he]
    }

    pub fn in_result_area(&self, he: usize) -> bool {
        self.in_result_area[he]
    }

    pub fn set_in_result_area(&mut self, he: usize, v: bool) {
        self.in_result_area[he] = v;
    }

    pub fn in_result_line(&self, he: usize) -> bool {
        self.in_result_line[he]
    }

    pub fn set_in_result_line(&mut self, he: usize, v: bool) {
        self.in_result_line[he] = v;
    }

    pub fn visited(&self, he: usize) -> bool {
        self.visited[he]
    }

    pub fn set_visited(&mut self, he: usize, v: bool) {
        self.visited[he] = v;
    }

    /// One arbitrary outgoing half-edge per distinct node coordinate.
    pub fn node_anchors(&self) -> Vec<usize> {
        self.node_anchor.values().copied().collect()
    }

    pub fn anchor_at(&self, c: Coord<T>) -> Option<usize> {
        self.node_anchor.get(&node_key(c)).copied()
    }

    /// Invokes `visit` for every outgoing half-edge sharing `anchor`'s
    /// origin, once around the CCW ring.
    pub fn for_each_at_node(&self, anchor: usize, mut visit: impl FnMut(usize)) {
        let mut he = anchor;
        loop {
            visit(he);
            he = self.next[he];
            if he == anchor {
                break;
            }
        }
    }

    /// The first outgoing half-edge at `he`'s destination node, scanning CCW
    /// starting just after `sym(he)`'s position in that node's star, for
    /// which `pred` holds. Used by the labeller's node-star propagation walk
    /// and by maximal-ring tracing. Returns `sym(he)` itself if nothing else
    /// in the star satisfies `pred` (a dangling/degree-1 node).
    pub fn next_matching(&self, he: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
        let start = self.sym(he);
        let mut cur = self.next[start];
        while cur != start {
            if pred(cur) {
                return cur;
            }
            cur = self.next[cur];
        }
        start
    }

    fn insert_at_origin(&mut self, he: usize) {
        let key = node_key(self.origin[he]);
        match self.node_anchor.get(&key).copied() {
            None => {
                self.next[he] = he;
                self.node_anchor.insert(key, he);
            }
            Some(anchor) => {
                let origin = self.origin[he];
                let d_he = self.dir_point[he];
                let mut e = anchor;
                loop {
                    let next_e = self.next[e];
                    let d_e = self.dir_point[e];
                    let d_next = self.dir_point[next_e];
                    if Self::falls_between(origin, d_e, d_he, d_next) {
                        self.next[e] = he;
                        self.next[he] = next_e;
                        break;
                    }
                    e = next_e;
                    if e == anchor {
                        // Full lap without a strict slot (every existing
                        // direction compares equal to `he`'s): insert right
                        // after the anchor.
                        self.next[anchor] = he;
                        self.next[he] = e;
                        break;
                    }
                }
            }
        }
    }

    fn falls_between<T2: GeoFloat>(origin: Coord<T2>, d_e: Coord<T2>, d_he: Coord<T2>, d_next: Coord<T2>) -> bool {
        use std::cmp::Ordering;
        let e_lt_he = compare_direction(origin, d_e, d_he) == Ordering::Less;
        let he_lt_next = compare_direction(origin, d_he, d_next) == Ordering::Less;
        if compare_direction(origin, d_e, d_next) == Ordering::Less {
            e_lt_he && he_lt_next
        } else {
            e_lt_he || he_lt_next
        }
    }

    /// §4.9 "Result selection": marks every half-edge whose left side
    /// satisfies `op`'s area truth table; a merged edge whose two sides
    /// *both* qualify (the edge now sits strictly inside the result) has
    /// both its half-edges marked and then immediately cancelled, so it
    /// drops out of ring tracing.
    pub fn mark_result_area(&mut self, op: OpType) {
        for he in 0..self.half_edge_count() {
            let a = self.side_location(he, InputIndex::A, Side::Left);
            let b = self.side_location(he, InputIndex::B, Side::Left);
            self.in_result_area[he] = op.is_in_result(a, b);
        }
        for k in 0..self.edges.len() {
            let (fwd, rev) = (2 * k, 2 * k + 1);
            if self.in_result_area[fwd] && self.in_result_area[rev] {
                self.in_result_area[fwd] = false;
                self.in_result_area[rev] = false;
            }
        }
    }

    /// §4.10 "Line extraction": marks the forward half-edge of every merged
    /// edge whose label evaluates to a result line under `op`'s truth table
    /// (the same table area uses, applied to the `on` location rather than
    /// a left/right split). Only the forward half-edge is ever marked, so
    /// each merged edge contributes its line at most once, in its stored
    /// direction. `collapse_lines` opts in to emitting edges whose only
    /// contribution was a collapsed area-boundary ring (off by default,
    /// matching the non-strict default elsewhere in this crate).
    pub fn mark_result_line(&mut self, op: OpType, collapse_lines: bool) {
        for k in 0..self.edges.len() {
            let fwd = 2 * k;
            if self.in_result_area[fwd] || self.in_result_area[fwd + 1] {
                continue;
            }
            let dim_a = self.dim(fwd, InputIndex::A);
            let dim_b = self.dim(fwd, InputIndex::B);
            if !collapse_lines
                && (dim_a == EdgeSetDim::Collapse || dim_b == EdgeSetDim::Collapse)
                && dim_a != EdgeSetDim::Line
                && dim_b != EdgeSetDim::Line
            {
                continue;
            }
            let loc_a = self.side_location(fwd, InputIndex::A, Side::Left);
            let loc_b = self.side_location(fwd, InputIndex::B, Side::Left);
            if !op.is_in_result(loc_a, loc_b) {
                continue;
            }
            if op != OpType::Intersection {
                if dim_a == EdgeSetDim::Line && loc_b == Some(Location::Interior) {
                    continue;
                }
                if dim_b == EdgeSetDim::Line && loc_a == Some(Location::Interior) {
                    continue;
                }
            }
            self.in_result_line[fwd] = true;
        }
    }

    pub fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    /// `true` if this input's dimension for `he` came from an area source
    /// at all (boundary or collapse).
    pub fn input_has_area(&self, he: usize, index: InputIndex) -> bool {
        let edge_dim = match index {
            InputIndex::A => self.edge(he).a_dim,
            InputIndex::B => self.edge(he).b_dim,
        };
        matches!(
            self.label(he).input(index).dim,
            EdgeSetDim::Boundary | EdgeSetDim::Collapse
        ) || matches!(edge_dim, Some(EdgeDim::Area))
    }
}
