//! Node kinds and the tag -> kind registry.
//!
//! A kind supplies defaults (size, properties, ports), drawing, hit testing and
//! any serialized fields beyond the generic ones. The graph and the overlay
//! look kinds up by the node's `kind` tag.

mod generator;
mod image;
mod prompt;

pub use generator::GeneratorKind;
pub use image::{ImageSourceKind, SourceMode};
pub use prompt::PromptKind;

use crate::model::{GraphNode, Port, Rect, Vec2};
use crate::render::DrawContext;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const PROMPT: &str = "prompt";
pub const IMAGE_SOURCE: &str = "image_source";
pub const GENERATOR: &str = "generator";

// Node-local layout, graph units
pub const TITLE_HEIGHT: f32 = 24.0;
pub const SLOT_HEIGHT: f32 = 20.0;
pub const PADDING: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeHit {
    Title,
    Content,
    Input(usize),
    Output(usize),
    Body,
}

pub trait NodeKind {
    fn tag(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn default_size(&self) -> Vec2;
    fn min_size(&self) -> Vec2 {
        Vec2::new(120.0, TITLE_HEIGHT + SLOT_HEIGHT)
    }
    fn default_properties(&self) -> Map<String, Value> {
        Map::new()
    }
    fn inputs(&self) -> Vec<Port> {
        Vec::new()
    }
    fn outputs(&self) -> Vec<Port> {
        Vec::new()
    }
    /// Property holding editable text, for kinds that take the overlay.
    fn text_property(&self) -> Option<&'static str> {
        None
    }
    fn draw(&self, node: &GraphNode, cx: &mut DrawContext<'_>);

    /// `local` is relative to the node's top-left corner.
    fn hit_test(&self, node: &GraphNode, local: Vec2, min_content_height: f32) -> Option<NodeHit> {
        default_hit_test(node, local, min_content_height)
    }

    /// Extra top-level fields written next to the generic ones.
    fn serialize(&self, _node: &GraphNode, _out: &mut Map<String, Value>) {}

    /// Restore kind-specific state from a serialized node object.
    fn deserialize(&self, _node: &mut GraphNode, _src: &Map<String, Value>) {}
}

pub struct KindRegistry {
    kinds: HashMap<&'static str, Box<dyn NodeKind>>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl KindRegistry {
    pub fn empty() -> Self {
        KindRegistry { kinds: HashMap::new() }
    }

    pub fn with_builtin() -> Self {
        let mut r = Self::empty();
        r.register(Box::new(PromptKind));
        r.register(Box::new(ImageSourceKind));
        r.register(Box::new(GeneratorKind));
        r
    }

    /// Replaces any kind already registered under the same tag.
    pub fn register(&mut self, kind: Box<dyn NodeKind>) {
        self.kinds.insert(kind.tag(), kind);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn NodeKind> {
        self.kinds.get(tag).map(|k| k.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// Fresh node of `kind` with id 0; the graph assigns the real id.
    pub(crate) fn instantiate(&self, tag: &str, pos: Vec2) -> Option<GraphNode> {
        let kind = self.get(tag)?;
        Some(GraphNode {
            id: 0,
            kind: kind.tag().to_string(),
            pos,
            size: kind.default_size(),
            properties: kind.default_properties(),
            inputs: kind.inputs(),
            outputs: kind.outputs(),
        })
    }
}

fn slot_rows(node: &GraphNode) -> usize {
    node.inputs.len().max(node.outputs.len())
}

pub fn input_slot_pos(node: &GraphNode, slot: usize) -> Vec2 {
    Vec2::new(
        node.pos.x,
        node.pos.y + TITLE_HEIGHT + SLOT_HEIGHT * (slot as f32 + 0.5),
    )
}

pub fn output_slot_pos(node: &GraphNode, slot: usize) -> Vec2 {
    Vec2::new(
        node.pos.x + node.size.x,
        node.pos.y + TITLE_HEIGHT + SLOT_HEIGHT * (slot as f32 + 0.5),
    )
}

/// Node-local content region under title and slot rows, or `None` when it is
/// too small to draw into.
pub fn content_bounds(node: &GraphNode, min_height: f32) -> Option<Rect> {
    let y = TITLE_HEIGHT + slot_rows(node) as f32 * SLOT_HEIGHT + PADDING;
    let w = node.size.x - 2.0 * PADDING;
    let h = node.size.y - y - PADDING;
    if w <= 0.0 || h < min_height || !w.is_finite() || !h.is_finite() {
        return None;
    }
    Some(Rect::new(PADDING, y, w, h))
}

pub fn default_hit_test(node: &GraphNode, local: Vec2, min_content_height: f32) -> Option<NodeHit> {
    let size = node.size;
    if local.x < -PADDING || local.y < 0.0 || local.x > size.x + PADDING || local.y > size.y {
        return None;
    }
    const SLOT_REACH: f32 = 10.0;
    for i in 0..node.inputs.len() {
        let c = input_slot_pos(node, i).sub(node.pos);
        if (local.x - c.x).abs() <= SLOT_REACH && (local.y - c.y).abs() <= SLOT_HEIGHT * 0.5 {
            return Some(NodeHit::Input(i));
        }
    }
    for i in 0..node.outputs.len() {
        let c = output_slot_pos(node, i).sub(node.pos);
        if (local.x - c.x).abs() <= SLOT_REACH && (local.y - c.y).abs() <= SLOT_HEIGHT * 0.5 {
            return Some(NodeHit::Output(i));
        }
    }
    if local.x < 0.0 || local.x > size.x {
        return None;
    }
    if local.y <= TITLE_HEIGHT {
        return Some(NodeHit::Title);
    }
    if let Some(content) = content_bounds(node, min_content_height) {
        if content.contains(local) {
            return Some(NodeHit::Content);
        }
    }
    Some(NodeHit::Body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_kinds_registered() {
        let r = KindRegistry::with_builtin();
        for tag in [PROMPT, IMAGE_SOURCE, GENERATOR] {
            assert!(r.contains(tag), "missing {tag}");
        }
        assert!(r.get("nope").is_none());
    }

    #[test]
    fn content_bounds_shrink_to_none() {
        let r = KindRegistry::with_builtin();
        let mut n = r.instantiate(PROMPT, Vec2::ZERO).unwrap();
        let c = content_bounds(&n, 24.0).unwrap();
        assert_eq!(c.x, PADDING);
        assert_eq!(c.y, TITLE_HEIGHT + SLOT_HEIGHT + PADDING);
        n.size = Vec2::new(200.0, 70.0);
        assert!(content_bounds(&n, 24.0).is_none());
    }

    #[test]
    fn hit_regions() {
        let r = KindRegistry::with_builtin();
        let n = r.instantiate(PROMPT, Vec2::new(100.0, 100.0)).unwrap();
        let kind = r.get(PROMPT).unwrap();
        assert_eq!(kind.hit_test(&n, Vec2::new(50.0, 5.0), 24.0), Some(NodeHit::Title));
        assert_eq!(kind.hit_test(&n, Vec2::new(50.0, 80.0), 24.0), Some(NodeHit::Content));
        let out = output_slot_pos(&n, 0).sub(n.pos);
        assert_eq!(kind.hit_test(&n, out, 24.0), Some(NodeHit::Output(0)));
        assert_eq!(kind.hit_test(&n, Vec2::new(-50.0, 5.0), 24.0), None);
    }
}
