//! 2-D KD-tree with tolerance-based snap insertion.
//!
//! Nodes are stored in a flat arena indexed by `usize` rather than linked via
//! owning pointers, matching the half-edge graph's arena style: cheap to
//! grow, no destructor-ordering concerns, no reference cycles.

use crate::numeric::GeoNum;
use crate::precision::Envelope;
use geo_types::Coord;

struct Node<T: GeoNum> {
    coord: Coord<T>,
    left: Option<usize>,
    right: Option<usize>,
    use_count: usize,
}

/// An alternating x/y discriminant KD-tree. If constructed with a positive
/// `tolerance`, inserting a point within `tolerance` of an existing node
/// returns that node's coordinate (and bumps its use count) instead of
/// creating a new one.
pub struct KdTree<T: GeoNum> {
    nodes: Vec<Node<T>>,
    root: Option<usize>,
    tolerance: T,
}

impl<T: GeoNum> KdTree<T> {
    pub fn new(tolerance: T) -> Self {
        KdTree {
            nodes: Vec::new(),
            root: None,
            tolerance,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts `p`, snapping to a within-tolerance existing node if one
    /// exists. Returns the coordinate actually present in the tree after the
    /// call — either `p` itself (new node) or the snapped-to node's
    /// coordinate.
    pub fn insert(&mut self, p: Coord<T>) -> Coord<T> {
        if self.tolerance > T::zero() {
            if let Some(existing) = self.nearest_within(p, self.tolerance) {
                self.nodes[existing].use_count += 1;
                return self.nodes[existing].coord;
            }
        } else if let Some(existing) = self.find_exact(p) {
            self.nodes[existing].use_count += 1;
            return self.nodes[existing].coord;
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            coord: p,
            left: None,
            right: None,
            use_count: 1,
        });

        match self.root {
            None => self.root = Some(id),
            Some(root) => insert_into(&mut self.nodes, root, id, 0),
        }
        p
    }

    fn find_exact(&self, p: Coord<T>) -> Option<usize> {
        let mut current = self.root;
        let mut depth = 0;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            if node.coord == p {
                return Some(idx);
            }
            current = if discriminant(p, depth) < discriminant(node.coord, depth) {
                node.left
            } else {
                node.right
            };
            depth += 1;
        }
        None
    }

    /// Smallest-coordinate tie-break: among nodes within `tolerance`, returns
    /// the one that compares smallest in (x, then y) order, matching the
    /// deterministic snap target regardless of insertion order.
    fn nearest_within(&self, p: Coord<T>, tolerance: T) -> Option<usize> {
        let search_env = Envelope::of_point(p).expand_by(tolerance);
        let mut best: Option<usize> = None;
        self.range_query(self.root, 0, &search_env, &mut |idx| {
            let node = &self.nodes[idx];
            if within_tolerance(node.coord, p, tolerance) {
                match best {
                    None => best = Some(idx),
                    Some(cur) if coord_less(node.coord, self.nodes[cur].coord) => best = Some(idx),
                    _ => {}
                }
            }
        });
        best
    }

    fn range_query(&self, node: Option<usize>, depth: usize, env: &Envelope<T>, visit: &mut impl FnMut(usize)) {
        let Some(idx) = node else { return };
        let n = &self.nodes[idx];
        if env.intersects_point(n.coord) {
            visit(idx);
        }

        let disc = discriminant(n.coord, depth);
        let (lo, hi) = if depth % 2 == 0 {
            (env.min_x(), env.max_x())
        } else {
            (env.min_y(), env.max_y())
        };

        if lo <= disc {
            self.range_query(n.left, depth + 1, env, visit);
        }
        if hi >= disc {
            self.range_query(n.right, depth + 1, env, visit);
        }
    }

    /// All stored points whose envelope intersects `env`, in tree order.
    pub fn query(&self, env: &Envelope<T>) -> Vec<Coord<T>> {
        let mut out = Vec::new();
        self.range_query(self.root, 0, env, &mut |idx| out.push(self.nodes[idx].coord));
        out
    }
}

fn discriminant<T: GeoNum>(c: Coord<T>, depth: usize) -> T {
    if depth % 2 == 0 {
        c.x
    } else {
        c.y
    }
}

fn coord_less<T: GeoNum>(a: Coord<T>, b: Coord<T>) -> bool {
    a.x < b.x || (a.x == b.x && a.y < b.y)
}

fn within_tolerance<T: GeoNum>(a: Coord<T>, b: Coord<T>, tolerance: T) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt() <= tolerance
}

fn insert_into<T: GeoNum>(nodes: &mut [Node<T>], mut current: usize, new_id: usize, mut depth: usize) {
    loop {
        let disc_current = discriminant(nodes[current].coord, depth);
        let disc_new = discriminant(nodes[new_id].coord, depth);
        let go_left = disc_new < disc_current;
        let next = if go_left { nodes[current].left } else { nodes[current].right };
        match next {
            Some(child) => {
                current = child;
                depth += 1;
            }
            None => {
                if go_left {
                    nodes[current].left = Some(new_id);
                } else {
                    nodes[current].right = Some(new_id);
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn exact_duplicate_reuses_node() {
        let mut tree = KdTree::new(0.0_f64);
        let a = tree.insert(coord! {x: 1.0, y: 2.0});
        let b = tree.insert(coord! {x: 1.0, y: 2.0});
        assert_eq!(a, b);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn within_tolerance_snaps_to_existing() {
        let mut tree = KdTree::new(0.5_f64);
        let first = tree.insert(coord! {x: 0.0, y: 0.0});
        let snapped = tree.insert(coord! {x: 0.2, y: 0.0});
        assert_eq!(first, snapped);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn beyond_tolerance_creates_new_node() {
        let mut tree = KdTree::new(0.1_f64);
        tree.insert(coord! {x: 0.0, y: 0.0});
        tree.insert(coord! {x: 5.0, y: 5.0});
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn snap_invariant_over_a_sequence() {
        let points = vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 0.05, y: 0.0},
            coord! {x: 10.0, y: 10.0},
            coord! {x: 0.02, y: 0.01},
        ];
        let tol = 0.1_f64;
        let mut tree = KdTree::new(tol);
        let mut seen: Vec<Coord<f64>> = Vec::new();
        for p in points {
            let snapped = tree.insert(p);
            let ok = snapped == p
                || seen
                    .iter()
                    .any(|&s| within_tolerance(s, p, tol) && snapped == s);
            assert!(ok, "snap invariant violated for {:?} -> {:?}", p, snapped);
            seen.push(p);
        }
    }

    #[test]
    fn query_returns_points_in_envelope() {
        let mut tree = KdTree::new(0.0_f64);
        tree.insert(coord! {x: 0.0, y: 0.0});
        tree.insert(coord! {x: 5.0, y: 5.0});
        tree.insert(coord! {x: 10.0, y: 10.0});
        let env = Envelope::of_points(coord! {x: -1.0, y: -1.0}, coord! {x: 6.0, y: 6.0});
        let hits = tree.query(&env);
        assert_eq!(hits.len(), 2);
    }
}
