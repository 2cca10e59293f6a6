use crate::kinds::NodeHit;
use crate::model::{NodeId, Vec2};
use crate::Graph;

/// Topmost node under a graph-space point, with the region that was hit.
pub fn pick_impl(g: &Graph, p: Vec2, min_content_height: f32) -> Option<(NodeId, NodeHit)> {
    // Reverse z-order: last drawn wins
    for n in g.nodes.iter().rev() {
        let Some(kind) = g.registry.get(&n.kind) else { continue };
        if let Some(hit) = kind.hit_test(n, n.to_local(p), min_content_height) {
            return Some((n.id, hit));
        }
    }
    None
}

/// Nodes whose bounds intersect a graph-space rectangle, in z-order.
pub fn nodes_in_rect(g: &Graph, r: crate::model::Rect) -> Vec<NodeId> {
    g.nodes
        .iter()
        .filter(|n| {
            let b = n.bounds();
            b.x <= r.x + r.w && b.x + b.w >= r.x && b.y <= r.y + r.h && b.y + b.h >= r.y
        })
        .map(|n| n.id)
        .collect()
}
