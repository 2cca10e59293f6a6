pub mod clipboard;
pub mod config;
pub mod editor;
pub mod error;
pub mod kinds;
pub mod model;
pub mod overlay;
pub mod render;
pub mod selection;
pub mod upload;
pub mod geometry {
    pub mod limits;
    pub mod tolerance;
    pub mod viewport;
}
pub mod algorithms {
    pub mod picking;
    pub mod text_layout;
}
mod json;

pub use clipboard::{ClipboardData, ClipboardItem, ClipboardPayload, ClipboardSource, Ingested, Ingestor, PasteEvent};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{Error, UploadError};
pub use geometry::viewport::{Surface, Viewport};
pub use json::{looks_like_node, looks_like_workflow, FORMAT_VERSION};
pub use kinds::{KindRegistry, NodeKind};
pub use model::{GraphLink, GraphNode, LinkId, NodeId, Port, PortRef, PortType, Rect, Vec2};
pub use overlay::{KeyInput, OverlayState, OverlayWidget};
pub use upload::{UploadFile, UploadResponse, Uploader};

use serde_json::Value;

/// Nodes and links of one workflow.
///
/// Node order is z-order (last drawn on top) and is preserved by every
/// mutation. Ids are never reused while the graph lives: fresh ids continue
/// past the largest id ever seen.
pub struct Graph {
    pub(crate) registry: KindRegistry,
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) links: Vec<GraphLink>,
    pub(crate) last_node_id: NodeId,
    pub(crate) last_link_id: LinkId,
    pub(crate) version: u64,
    pub(crate) generation: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Graph {
        Self::with_registry(KindRegistry::with_builtin())
    }

    pub fn with_registry(registry: KindRegistry) -> Graph {
        Graph {
            registry,
            nodes: Vec::new(),
            links: Vec::new(),
            last_node_id: 0,
            last_link_id: 0,
            version: 1,
            generation: 0,
        }
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Monotonic mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    /// Counts wholesale replacements. A node id is only meaningful together
    /// with the generation it was observed in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // Nodes
    pub fn add_node(&mut self, kind: &str, pos: Vec2) -> Result<NodeId, Error> {
        if !pos.is_finite() {
            return Err(Error::MalformedGraph("node position must be finite".into()));
        }
        let node = self
            .registry
            .instantiate(kind, pos)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;
        self.insert(node)
    }

    /// Insert a copy of a serialized node under a fresh id.
    pub fn add_serialized_node(&mut self, v: &Value) -> Result<NodeId, Error> {
        let (_, node) = json::node_from_value(&self.registry, v)?;
        self.insert(node)
    }

    fn insert(&mut self, mut node: GraphNode) -> Result<NodeId, Error> {
        let id = self.next_node_id()?;
        self.last_node_id = id;
        node.id = id;
        self.nodes.push(node);
        self.bump();
        Ok(id)
    }

    /// Insert every node or none: fails up front when the id space cannot
    /// hold them all.
    pub(crate) fn insert_all(&mut self, nodes: Vec<GraphNode>) -> Result<Vec<NodeId>, Error> {
        let room = u32::try_from(nodes.len())
            .ok()
            .and_then(|n| self.last_node_id.checked_add(n));
        if room.is_none() {
            return Err(Error::MalformedGraph("node ids exhausted".into()));
        }
        nodes.into_iter().map(|n| self.insert(n)).collect()
    }

    fn next_node_id(&self) -> Result<NodeId, Error> {
        self.last_node_id
            .checked_add(1)
            .ok_or_else(|| Error::MalformedGraph("node ids exhausted".into()))
    }

    /// Removes the node and every link touching it. Unknown ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        self.nodes.remove(idx);
        self.links.retain(|l| !l.touches(id));
        self.bump();
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn move_node(&mut self, id: NodeId, pos: Vec2) -> bool {
        if !pos.is_finite() {
            return false;
        }
        let Some(n) = self.node_mut(id) else { return false };
        n.pos = pos;
        self.bump();
        true
    }

    /// Resize, clamped to the kind's minimum size.
    pub fn resize_node(&mut self, id: NodeId, size: Vec2) -> bool {
        if !size.is_finite() {
            return false;
        }
        let Some(idx) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        let min = self
            .registry
            .get(&self.nodes[idx].kind)
            .map(|k| k.min_size())
            .unwrap_or(Vec2::ZERO);
        self.nodes[idx].size = Vec2::new(size.x.max(min.x), size.y.max(min.y));
        self.bump();
        true
    }

    pub fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> bool {
        let Some(n) = self.node_mut(id) else { return false };
        n.properties.insert(key.to_string(), value);
        self.bump();
        true
    }

    /// Store editable text: the kind's text property and the first output value.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), Error> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(Error::NodeNotFound(id))?;
        let key = self
            .registry
            .get(&self.nodes[idx].kind)
            .and_then(|k| k.text_property())
            .ok_or(Error::NotEditable(id))?;
        let node = &mut self.nodes[idx];
        node.properties.insert(key.to_string(), Value::String(text.to_string()));
        if let Some(out) = node.outputs.first_mut() {
            out.value = Some(Value::String(text.to_string()));
        }
        self.bump();
        Ok(())
    }

    /// Text of an editable node, `None` for kinds without a text property.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        let key = self.registry.get(&node.kind)?.text_property()?;
        Some(node.str_property(key).unwrap_or_default())
    }

    // Links
    pub fn add_link(&mut self, from: PortRef, to: PortRef) -> Result<LinkId, Error> {
        let ty = json::check_link(&self.nodes, from, to).map_err(|r| Error::invalid_link(from, to, r))?;
        let id = self
            .last_link_id
            .checked_add(1)
            .ok_or_else(|| Error::MalformedGraph("link ids exhausted".into()))?;
        // an input holds a single link
        self.links.retain(|l| l.to != to);
        self.last_link_id = id;
        self.links.push(GraphLink { id, from, to, ty });
        self.bump();
        Ok(id)
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        if self.links.len() == before {
            return false;
        }
        self.bump();
        true
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn links_of(&self, node: NodeId) -> impl Iterator<Item = &GraphLink> {
        self.links.iter().filter(move |l| l.touches(node))
    }

    // Serialization
    pub fn to_json(&self) -> Value {
        json::to_json_impl(self)
    }

    pub fn serialize_node(&self, id: NodeId) -> Option<Value> {
        self.node(id).map(|n| json::node_to_value(&self.registry, n))
    }

    /// Serialized nodes in z-order; unknown ids are skipped.
    pub fn serialize_nodes(&self, ids: &[NodeId]) -> Value {
        Value::Array(
            self.nodes
                .iter()
                .filter(|n| ids.contains(&n.id))
                .map(|n| json::node_to_value(&self.registry, n))
                .collect(),
        )
    }

    /// Replace nodes and links wholesale. The document is fully validated
    /// first; on error the graph is left exactly as it was.
    pub fn configure(&mut self, v: &Value) -> Result<(), Error> {
        let wf = json::parse_workflow(&self.registry, v)?;
        self.install(wf);
        Ok(())
    }

    pub(crate) fn install(&mut self, wf: json::Workflow) {
        self.nodes = wf.nodes;
        self.links = wf.links;
        self.last_node_id = self.last_node_id.max(wf.last_node_id);
        self.last_link_id = self.last_link_id.max(wf.last_link_id);
        self.generation += 1;
        self.bump();
    }
}
