//! Monotone-chain index over a coordinate sequence.
//!
//! A chain is a maximal run of segments whose x- and y-projections are each
//! monotone, so its envelope (computed once from its two endpoints) bounds
//! every point of every segment in the run. `select`/`computeOverlaps` use
//! that fact to prune recursive binary search without ever materializing the
//! segments of a subchain.

use crate::numeric::GeoNum;
use crate::precision::Envelope;
use geo_types::{Coord, Line, LineString};

/// One maximal monotone run within a [`MonotoneChainIndex`], as a half-open
/// range `[start, end]` of vertex indices into the shared coordinate slice.
#[derive(Debug, Clone, Copy)]
struct Chain<T: GeoNum> {
    start: usize,
    end: usize,
    envelope: Envelope<T>,
}

/// Partitions a coordinate sequence into monotone chains and answers
/// envelope-pruned queries over them without allocating per-query.
pub struct MonotoneChainIndex<T: GeoNum> {
    coords: Vec<Coord<T>>,
    chains: Vec<Chain<T>>,
    overall_envelope: Envelope<T>,
}

impl<T: GeoNum> MonotoneChainIndex<T> {
    pub fn new(coords: Vec<Coord<T>>) -> Self {
        let chains = build_chains(&coords);
        let mut overall_envelope = Envelope::empty();
        for c in &coords {
            overall_envelope.expand_to_include(*c);
        }
        MonotoneChainIndex {
            coords,
            chains,
            overall_envelope,
        }
    }

    pub fn from_line_string(line_string: &LineString<T>) -> Self {
        Self::new(line_string.0.clone())
    }

    pub fn coords(&self) -> &[Coord<T>] {
        &self.coords
    }

    pub fn envelope(&self) -> Envelope<T> {
        self.overall_envelope
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn segment(&self, chain_index: usize, seg_offset: usize) -> Line<T> {
        let chain = &self.chains[chain_index];
        let i = chain.start + seg_offset;
        Line::new(self.coords[i], self.coords[i + 1])
    }

    /// Invokes `action(chain_index, segment_offset)` for every single segment
    /// whose chain overlaps `search_env`; branches disjoint from `search_env`
    /// are pruned without descending.
    pub fn select(&self, search_env: &Envelope<T>, mut action: impl FnMut(usize, usize)) {
        for (ci, chain) in self.chains.iter().enumerate() {
            if chain.envelope.intersects(search_env) {
                select_chain(&self.coords, chain.start, chain.end, search_env, ci, &mut action);
            }
        }
    }

    /// Invokes `action(self_chain, self_seg, other_chain, other_seg)` for every
    /// pair of single segments (one from `self`, one from `other`) whose
    /// subchain envelopes are within `tolerance` of each other. If `self` and
    /// `other` are the same index (by pointer identity), a pair is never
    /// reported against itself.
    pub fn compute_overlaps(
        &self,
        other: &MonotoneChainIndex<T>,
        tolerance: T,
        mut action: impl FnMut(usize, usize, usize, usize),
    ) {
        let same = std::ptr::eq(self, other);
        for (ai, a) in self.chains.iter().enumerate() {
            for (bi, b) in other.chains.iter().enumerate() {
                if same && ai == bi {
                    continue;
                }
                if envelopes_within(&a.envelope, &b.envelope, tolerance) {
                    compute_overlaps_chain(
                        &self.coords,
                        a.start,
                        a.end,
                        ai,
                        &other.coords,
                        b.start,
                        b.end,
                        bi,
                        tolerance,
                        &mut action,
                    );
                }
            }
        }
    }
}

fn envelopes_within<T: GeoNum>(a: &Envelope<T>, b: &Envelope<T>, tolerance: T) -> bool {
    a.expand_by(tolerance).intersects(b)
}

fn sub_envelope<T: GeoNum>(coords: &[Coord<T>], start: usize, end: usize) -> Envelope<T> {
    Envelope::of_points(coords[start], coords[end])
}

fn select_chain<T: GeoNum>(
    coords: &[Coord<T>],
    start: usize,
    end: usize,
    search_env: &Envelope<T>,
    chain_index: usize,
    action: &mut impl FnMut(usize, usize),
) {
    if end - start == 1 {
        action(chain_index, start);
        return;
    }
    let mid = start + (end - start) / 2;
    if sub_envelope(coords, start, mid).intersects(search_env) {
        select_chain(coords, start, mid, search_env, chain_index, action);
    }
    if sub_envelope(coords, mid, end).intersects(search_env) {
        select_chain(coords, mid, end, search_env, chain_index, action);
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_overlaps_chain<T: GeoNum>(
    a_coords: &[Coord<T>],
    a_start: usize,
    a_end: usize,
    a_index: usize,
    b_coords: &[Coord<T>],
    b_start: usize,
    b_end: usize,
    b_index: usize,
    tolerance: T,
    action: &mut impl FnMut(usize, usize, usize, usize),
) {
    if a_end - a_start == 1 && b_end - b_start == 1 {
        action(a_index, a_start, b_index, b_start);
        return;
    }

    if a_end - a_start == 1 {
        let b_mid = b_start + (b_end - b_start) / 2;
        let a_env = sub_envelope(a_coords, a_start, a_end);
        if envelopes_within(&a_env, &sub_envelope(b_coords, b_start, b_mid), tolerance) {
            compute_overlaps_chain(
                a_coords, a_start, a_end, a_index, b_coords, b_start, b_mid, b_index, tolerance, action,
            );
        }
        if envelopes_within(&a_env, &sub_envelope(b_coords, b_mid, b_end), tolerance) {
            compute_overlaps_chain(
                a_coords, a_start, a_end, a_index, b_coords, b_mid, b_end, b_index, tolerance, action,
            );
        }
        return;
    }

    if b_end - b_start == 1 {
        let a_mid = a_start + (a_end - a_start) / 2;
        let b_env = sub_envelope(b_coords, b_start, b_end);
        if envelopes_within(&sub_envelope(a_coords, a_start, a_mid), &b_env, tolerance) {
            compute_overlaps_chain(
                a_coords, a_start, a_mid, a_index, b_coords, b_start, b_end, b_index, tolerance, action,
            );
        }
        if envelopes_within(&sub_envelope(a_coords, a_mid, a_end), &b_env, tolerance) {
            compute_overlaps_chain(
                a_coords, a_mid, a_end, a_index, b_coords, b_start, b_end, b_index, tolerance, action,
            );
        }
        return;
    }

    let a_mid = a_start + (a_end - a_start) / 2;
    let b_mid = b_start + (b_end - b_start) / 2;
    for &(as_, ae_) in &[(a_start, a_mid), (a_mid, a_end)] {
        for &(bs_, be_) in &[(b_start, b_mid), (b_mid, b_end)] {
            if envelopes_within(&sub_envelope(a_coords, as_, ae_), &sub_envelope(b_coords, bs_, be_), tolerance) {
                compute_overlaps_chain(
                    a_coords, as_, ae_, a_index, b_coords, bs_, be_, b_index, tolerance, action,
                );
            }
        }
    }
}

/// Splits `coords` into maximal runs whose x- and y-projections are each
/// monotone (non-increasing or non-decreasing throughout the run).
fn build_chains<T: GeoNum>(coords: &[Coord<T>]) -> Vec<Chain<T>> {
    let mut chains = Vec::new();
    if coords.len() < 2 {
        return chains;
    }

    let mut start = 0;
    while start < coords.len() - 1 {
        let end = find_chain_end(coords, start);
        chains.push(Chain {
            start,
            end,
            envelope: Envelope::of_points(coords[start], coords[end]),
        });
        start = end;
    }
    chains
}

fn find_chain_end<T: GeoNum>(coords: &[Coord<T>], start: usize) -> usize {
    let mut last = start + 1;
    if last >= coords.len() {
        return last;
    }

    let mut x_dir = direction(coords[start].x, coords[last].x);
    let mut y_dir = direction(coords[start].y, coords[last].y);

    while last + 1 < coords.len() {
        let next_x_dir = direction(coords[last].x, coords[last + 1].x);
        let next_y_dir = direction(coords[last].y, coords[last + 1].y);

        if (x_dir != 0 && next_x_dir != 0 && next_x_dir != x_dir)
            || (y_dir != 0 && next_y_dir != 0 && next_y_dir != y_dir)
        {
            break;
        }

        if x_dir == 0 {
            x_dir = next_x_dir;
        }
        if y_dir == 0 {
            y_dir = next_y_dir;
        }
        last += 1;
    }
    last
}

fn direction<T: GeoNum>(a: T, b: T) -> i8 {
    if b > a {
        1
    } else if b < a {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    fn idx(coords: Vec<Coord<f64>>) -> MonotoneChainIndex<f64> {
        MonotoneChainIndex::new(coords)
    }

    #[test]
    fn straight_line_is_a_single_chain() {
        let i = idx(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 1.0},
            coord! {x: 2.0, y: 2.0},
        ]);
        assert_eq!(i.chain_count(), 1);
    }

    #[test]
    fn zigzag_splits_into_multiple_chains() {
        let i = idx(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 1.0},
            coord! {x: 2.0, y: 0.0},
            coord! {x: 3.0, y: 1.0},
        ]);
        assert_eq!(i.chain_count(), 3);
    }

    #[test]
    fn select_finds_segments_in_envelope() {
        let i = idx(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 1.0},
            coord! {x: 2.0, y: 0.0},
        ]);
        let search = Envelope::of_points(coord! {x: 1.5, y: -1.0}, coord! {x: 2.5, y: 1.0});
        let mut hits = 0;
        i.select(&search, |_, _| hits += 1);
        assert_eq!(hits, 1);
    }

    #[test]
    fn compute_overlaps_excludes_self_pairs() {
        let i = idx(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 1.0},
            coord! {x: 2.0, y: 0.0},
        ]);
        let mut pairs = Vec::new();
        i.compute_overlaps(&i, 0.0, |a, ai, b, bi| pairs.push((a, ai, b, bi)));
        for (a, ai, b, bi) in &pairs {
            assert!(!(a == b && ai == bi), "self pair was not eliminated");
        }
    }

    #[test]
    fn compute_overlaps_finds_crossing_segments() {
        let a = idx(vec![coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0}]);
        let b = idx(vec![coord! {x: 0.0, y: 5.0}, coord! {x: 5.0, y: 0.0}]);
        let mut pairs = Vec::new();
        a.compute_overlaps(&b, 0.0, |ac, ai, bc, bi| pairs.push((ac, ai, bc, bi)));
        assert_eq!(pairs.len(), 1);
    }
}
