//! Snap-rounding noder (C6): the fixed-precision noding path.
//!
//! 1. Detect full-precision intersections with the monotone-chain noder and
//!    seed a hot pixel per intersection (marked node) and per input vertex
//!    (not yet a node).
//! 2. Round every segment string to the grid, dropping collapsed segments.
//! 3. For each rounded segment, query the hot-pixel index (expanded by
//!    `1/scale`) against the *original* unrounded segment and insert any
//!    intersecting not-yet-node pixel as a node, promoting it.
//! 4. Revisit interior vertices of the rounded strings and add nodes for any
//!    pixel promoted in step 3.

use super::{remove_repeated_points, McIndexNoder, Noder, SegmentString};
use crate::hot_pixel::HotPixel;
use crate::kdtree::KdTree;
use crate::numeric::GeoFloat;
use crate::precision::{Envelope, PrecisionModel};
use geo_types::Coord;

pub struct SnapRoundingNoder<T: GeoFloat> {
    scale: T,
}

impl<T: GeoFloat> SnapRoundingNoder<T> {
    pub fn new(scale: T) -> Self {
        SnapRoundingNoder { scale }
    }

    fn near_vertex_tolerance(&self) -> T {
        let hundred = (0..100).fold(T::zero(), |acc, _| acc + T::one());
        T::one() / (self.scale * hundred)
    }
}

impl<T: GeoFloat, C: Clone> Noder<T, C> for SnapRoundingNoder<T> {
    fn compute_nodes(&mut self, input: Vec<SegmentString<T, C>>) -> Vec<SegmentString<T, C>> {
        let pm = PrecisionModel::fixed(self.scale);

        // Step 1: full-precision intersections via the plain MC noder, plus
        // a near-vertex heuristic folded into the same pass.
        let noded = McIndexNoder.compute_nodes(input.clone());
        let near_tol = self.near_vertex_tolerance();

        // Step 2: seed hot pixels. Pixels keyed by rounded center in a
        // KD-tree so later steps can query by envelope.
        let mut pixel_tree: KdTree<T> = KdTree::new(T::zero());
        let mut pixels: Vec<HotPixel<T>> = Vec::new();
        let mut pixel_index_by_center: std::collections::HashMap<(i64, i64), usize> = std::collections::HashMap::new();

        let mut seed = |coord: Coord<T>, as_node: bool, scale: T, pixels: &mut Vec<HotPixel<T>>, pixel_tree: &mut KdTree<T>, index: &mut std::collections::HashMap<(i64, i64), usize>| {
            let center = crate::hot_pixel::pixel_center_for(coord, scale);
            let key = grid_key(center, scale);
            match index.get(&key) {
                Some(&i) => {
                    if as_node {
                        pixels[i].mark_as_node();
                    }
                }
                None => {
                    let mut pixel = HotPixel::new(center, scale);
                    if as_node {
                        pixel.mark_as_node();
                    }
                    let i = pixels.len();
                    pixels.push(pixel);
                    pixel_tree.insert(center);
                    index.insert(key, i);
                }
            }
        };

        // Input vertices: not-a-node pixels (may be promoted later).
        for s in &input {
            for &c in &s.coords {
                seed(c, false, self.scale, &mut pixels, &mut pixel_tree, &mut pixel_index_by_center);
            }
        }

        // Intersections detected at full precision, plus near-vertex cases:
        // any noded interior vertex not equal to either endpoint of its
        // original segment is by construction an intersection-or-near-vertex
        // node.
        for (orig, noded_s) in input.iter().zip(noded.iter()) {
            let orig_set: std::collections::HashSet<(u64, u64)> =
                orig.coords.iter().map(|c| bitkey(*c)).collect();
            for &c in &noded_s.coords {
                if !orig_set.contains(&bitkey(c)) {
                    seed(c, true, self.scale, &mut pixels, &mut pixel_tree, &mut pixel_index_by_center);
                }
            }
        }
        apply_near_vertex_heuristic(&input, near_tol, &mut pixels, &mut pixel_tree, &mut pixel_index_by_center, self.scale);

        // Step 3: snap each input string's rounded segments to hot pixels,
        // promoting any pixel the *original* unrounded segment passes
        // through to a node.
        for s in &input {
            snap_string(s, &pm, &mut pixels, &pixel_index_by_center, &pixel_tree, self.scale);
        }

        // Step 4: vertex-node pass. A pixel can be promoted to a node while
        // processing a *later* string than one that already grazed it
        // (step 3's endpoint-touch heuristic skips a non-node pixel, so an
        // earlier string can miss a node that only became a node afterward).
        // Re-snap every string now that promotion has settled so each one
        // picks up every pixel presently marked as a node.
        let rounded: Vec<(Vec<Coord<T>>, C)> = input
            .iter()
            .map(|s| {
                let out = snap_string(s, &pm, &mut pixels, &pixel_index_by_center, &pixel_tree, self.scale);
                (out, s.context.clone())
            })
            .collect();

        rounded
            .into_iter()
            .filter(|(coords, _)| coords.len() >= 2)
            .map(|(coords, ctx)| SegmentString::new(remove_repeated_points(&coords), ctx))
            .collect()
    }
}

fn bitkey<T: GeoFloat>(c: Coord<T>) -> (u64, u64) {
    (c.x.to_f64().unwrap_or(0.0).to_bits(), c.y.to_f64().unwrap_or(0.0).to_bits())
}

fn grid_key<T: GeoFloat>(c: Coord<T>, scale: T) -> (i64, i64) {
    let x = (c.x * scale).round().to_f64().unwrap_or(0.0) as i64;
    let y = (c.y * scale).round().to_f64().unwrap_or(0.0) as i64;
    (x, y)
}

fn apply_near_vertex_heuristic<T: GeoFloat, C: Clone>(
    input: &[SegmentString<T, C>],
    tol: T,
    pixels: &mut Vec<HotPixel<T>>,
    pixel_tree: &mut KdTree<T>,
    index: &mut std::collections::HashMap<(i64, i64), usize>,
    scale: T,
) {
    // For every vertex, check whether it lies within `tol` of the interior
    // of some other (non-adjacent) segment; if so, seed/mark a node there.
    for (si, s) in input.iter().enumerate() {
        for &v in &s.coords {
            for (sj, other) in input.iter().enumerate() {
                for k in 0..other.segment_count() {
                    let seg = other.segment(k);
                    if seg.start == v || seg.end == v {
                        continue;
                    }
                    if si == sj && is_adjacent_vertex(s, v, seg) {
                        continue;
                    }
                    if point_segment_distance(v, seg) <= tol {
                        let center = crate::hot_pixel::pixel_center_for(v, scale);
                        let key = grid_key(center, scale);
                        match index.get(&key) {
                            Some(&i) => pixels[i].mark_as_node(),
                            None => {
                                let mut pixel = HotPixel::new(center, scale);
                                pixel.mark_as_node();
                                let i = pixels.len();
                                pixels.push(pixel);
                                pixel_tree.insert(center);
                                index.insert(key, i);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn is_adjacent_vertex<T: GeoFloat, C>(s: &SegmentString<T, C>, v: Coord<T>, seg: geo_types::Line<T>) -> bool {
    s.coords.iter().any(|&c| c == v) && (seg.start == v || seg.end == v)
}

fn point_segment_distance<T: GeoFloat>(p: Coord<T>, seg: geo_types::Line<T>) -> T {
    let dx = seg.end.x - seg.start.x;
    let dy = seg.end.y - seg.start.y;
    let len2 = dx * dx + dy * dy;
    if len2 == T::zero() {
        let ddx = p.x - seg.start.x;
        let ddy = p.y - seg.start.y;
        return (ddx * ddx + ddy * ddy).sqrt();
    }
    let t = ((p.x - seg.start.x) * dx + (p.y - seg.start.y) * dy) / len2;
    let t = t.max(T::zero()).min(T::one());
    let projx = seg.start.x + t * dx;
    let projy = seg.start.y + t * dy;
    let ddx = p.x - projx;
    let ddy = p.y - projy;
    (ddx * ddx + ddy * ddy).sqrt()
}

/// Rounds `s`'s segments and, for each, finds every hot pixel the *original*
/// unrounded segment passes through, inserting each one as an interior node
/// and (§4.5 step 3) promoting it to a node in the shared `pixels` table —
/// so a pixel only grazed here still forces every other string through it to
/// treat it as a node on a later (step 4) pass.
fn snap_string<T: GeoFloat, C: Clone>(
    s: &SegmentString<T, C>,
    pm: &PrecisionModel<T>,
    pixels: &mut [HotPixel<T>],
    pixel_index: &std::collections::HashMap<(i64, i64), usize>,
    pixel_tree: &KdTree<T>,
    scale: T,
) -> Vec<Coord<T>> {
    let mut out: Vec<Coord<T>> = Vec::new();
    let inv_scale = T::one() / scale;

    for i in 0..s.segment_count() {
        let orig_seg = s.segment(i);
        let r0 = pm.round_coord(orig_seg.start);
        let r1 = pm.round_coord(orig_seg.end);

        if out.is_empty() {
            out.push(r0);
        }
        if r0 == r1 {
            // collapsed segment: drop it, keep going (duplicate removal
            // happens at the end too).
            continue;
        }

        let search_env = Envelope::of_points(orig_seg.start, orig_seg.end).expand_by(inv_scale);
        let candidate_centers = pixel_tree.query(&search_env);

        let mut inserted: Vec<(T, Coord<T>)> = Vec::new();
        for center in candidate_centers {
            let key = grid_key(center, scale);
            let Some(&idx) = pixel_index.get(&key) else {
                continue;
            };
            let pixel = pixels[idx];
            let touches_original_endpoint =
                pixel.intersects_point(orig_seg.start) || pixel.intersects_point(orig_seg.end);
            if !pixel.is_node() && touches_original_endpoint {
                continue;
            }
            if pixel.intersects_segment(orig_seg.start, orig_seg.end) {
                pixels[idx].mark_as_node();
                let dist = crate::predicates::edge_distance(pixel.center(), orig_seg);
                inserted.push((dist, pixel.center()));
            }
        }
        inserted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        for (_, c) in inserted {
            if out.last() != Some(&c) {
                out.push(c);
            }
        }
        if out.last() != Some(&r1) {
            out.push(r1);
        }
    }
    out
}
