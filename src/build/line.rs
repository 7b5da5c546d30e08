//! Line extraction (§4.10 "Line extraction"). Implements strategy (a) from
//! the two offered by the specification: each noded, marked result edge is
//! emitted directly as its own `LineString`, preserving the node positions
//! the noder produced rather than stitching degree-2 chains into longer
//! runs.

use crate::graph::OverlayGraph;
use crate::numeric::GeoFloat;
use geo_types::LineString;

pub fn extract_lines<T: GeoFloat>(graph: &OverlayGraph<T>) -> Vec<LineString<T>> {
    let mut out = Vec::new();
    for k in 0..graph.edges().len() {
        let fwd = 2 * k;
        if graph.in_result_line(fwd) {
            out.push(LineString::new(graph.coords(fwd)));
        }
    }
    out
}
