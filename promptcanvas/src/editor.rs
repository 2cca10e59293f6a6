//! Editing session: graph, viewport, surface, selection, overlay and
//! configuration behind one value.
//!
//! Hosts keep the editor in an `Rc<RefCell<Editor>>` and must not hold a
//! borrow across an `.await`; see [`crate::clipboard::Ingestor`].

use crate::config::EditorConfig;
use crate::error::Error;
use crate::geometry::limits;
use crate::geometry::viewport::{Surface, Viewport};
use crate::kinds::ImageSourceKind;
use crate::kinds::{NodeHit, IMAGE_SOURCE};
use crate::model::{LinkId, NodeId, PortRef, Rect, Vec2};
use crate::overlay::{ExitReason, KeyInput, Overlay, OverlayWidget};
use crate::render::{self, DrawList, TextMeasure};
use crate::selection::{selection_text, ClipboardSink, Selection};
use crate::{algorithms::picking, json, Graph};
use log::{debug, info};
use serde_json::Value;

pub struct Editor {
    graph: Graph,
    viewport: Viewport,
    surface: Surface,
    selection: Selection,
    overlay: Overlay,
    config: EditorConfig,
    dirty: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Editor {
        Self::with_graph(Graph::new(), config)
    }

    pub fn with_graph(graph: Graph, config: EditorConfig) -> Editor {
        Editor {
            graph,
            viewport: Viewport::default(),
            surface: Surface::default(),
            selection: Selection::default(),
            overlay: Overlay::default(),
            config,
            dirty: true,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Direct graph access. Overlay and selection catch up on the next
    /// [`Editor::draw`].
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.dirty = true;
        &mut self.graph
    }

    // Viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replaces the viewport; on error the previous one is kept.
    pub fn set_viewport(&mut self, scale: f32, offset: Vec2) -> Result<(), Error> {
        self.viewport = Viewport::new(scale, offset)?;
        self.dirty = true;
        Ok(())
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
        self.dirty = true;
    }

    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        self.viewport
            .zoom_at(anchor, factor, self.config.min_scale, self.config.max_scale);
        self.dirty = true;
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
        self.dirty = true;
    }

    /// Graph-space point under the middle of the surface.
    pub fn visible_center(&self) -> Vec2 {
        self.viewport.visible_center(&self.surface)
    }

    // Nodes and links
    pub fn add_node(&mut self, kind: &str, pos: Vec2) -> Result<NodeId, Error> {
        let id = self.graph.add_node(kind, pos)?;
        self.dirty = true;
        Ok(id)
    }

    /// New node of `kind` whose center sits on the visible center.
    pub fn create_centered(&mut self, kind: &str) -> Result<NodeId, Error> {
        let size = self
            .graph
            .registry()
            .get(kind)
            .map(|k| k.default_size())
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;
        let pos = self.visible_center().sub(size.scale(0.5));
        self.add_node(kind, pos)
    }

    /// Ends any edit on the node, then removes it with its links.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if self.overlay.active() == Some(id) {
            self.overlay.finish(&mut self.graph, ExitReason::Removed);
        }
        self.selection.remove(id);
        let removed = self.graph.remove_node(id);
        self.dirty |= removed;
        removed
    }

    pub fn add_link(&mut self, from: PortRef, to: PortRef) -> Result<LinkId, Error> {
        let id = self.graph.add_link(from, to)?;
        self.dirty = true;
        Ok(id)
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let removed = self.graph.remove_link(id);
        self.dirty |= removed;
        removed
    }

    /// Store an upload result on an image-source node. `false` when the node
    /// is gone or is not an image source.
    pub fn set_image_url(&mut self, id: NodeId, url: &str) -> bool {
        let Some(node) = self.graph.node_mut(id).filter(|n| n.kind == IMAGE_SOURCE) else {
            debug!("editor: node {id} gone, dropping url");
            return false;
        };
        ImageSourceKind::set_url(node, url);
        self.graph.bump();
        self.dirty = true;
        true
    }

    /// Replace the whole graph. Validation runs before anything changes; a
    /// pending edit is committed into the old graph and then discarded.
    pub fn configure(&mut self, v: &Value) -> Result<(), Error> {
        let wf = json::parse_workflow(self.graph.registry(), v)?;
        self.overlay.finish(&mut self.graph, ExitReason::Replaced);
        info!("editor: workflow replaced ({} nodes, {} links)", wf.nodes.len(), wf.links.len());
        self.graph.install(wf);
        self.selection.clear();
        self.dirty = true;
        Ok(())
    }

    /// Insert copies of serialized nodes, shifted by the paste offset. Every
    /// node is parsed before any is inserted.
    pub fn paste_nodes(&mut self, values: &[Value]) -> Result<Vec<NodeId>, Error> {
        if values.len() > limits::MAX_NODES {
            return Err(Error::MalformedGraph(format!("nodes>{}", limits::MAX_NODES)));
        }
        let offset = Vec2::from(self.config.paste_offset).scale(1.0 / self.viewport.scale());
        let mut parsed = Vec::with_capacity(values.len());
        for v in values {
            let (_, mut node) = json::node_from_value(self.graph.registry(), v)?;
            node.pos = node.pos.add(offset);
            parsed.push(node);
        }
        let ids = self.graph.insert_all(parsed)?;
        self.dirty = true;
        Ok(ids)
    }

    // Selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, id: NodeId, additive: bool) -> bool {
        if self.graph.node(id).is_none() {
            return false;
        }
        if additive {
            self.selection.insert(id);
        } else {
            for other in self.selection.ids().into_iter().filter(|o| *o != id) {
                self.deselect(other);
            }
            self.selection.set_only(id);
        }
        self.dirty = true;
        true
    }

    pub fn select_all(&mut self, ids: &[NodeId]) {
        self.clear_selection();
        for id in ids {
            self.select(*id, true);
        }
    }

    /// Rubber-band selection between two screen points. Returns how many
    /// nodes were touched.
    pub fn select_in_rect(&mut self, a: Vec2, b: Vec2, additive: bool) -> usize {
        let (p, q) = (self.viewport.screen_to_graph(a), self.viewport.screen_to_graph(b));
        let r = Rect::new(p.x.min(q.x), p.y.min(q.y), (p.x - q.x).abs(), (p.y - q.y).abs());
        let hits = picking::nodes_in_rect(&self.graph, r);
        if !additive {
            self.clear_selection();
        }
        for id in &hits {
            self.selection.insert(*id);
        }
        self.dirty = true;
        hits.len()
    }

    /// Deselecting an editing node commits its edit.
    pub fn deselect(&mut self, id: NodeId) -> bool {
        if self.overlay.active() == Some(id) {
            self.overlay.finish(&mut self.graph, ExitReason::Deselected);
        }
        let removed = self.selection.remove(id);
        self.dirty |= removed;
        removed
    }

    pub fn clear_selection(&mut self) {
        for id in self.selection.ids() {
            self.deselect(id);
        }
    }

    /// Number of nodes removed.
    pub fn delete_selection(&mut self) -> usize {
        self.selection
            .ids()
            .into_iter()
            .filter(|id| self.remove_node(*id))
            .count()
    }

    // Input
    /// Pointer pressed at a surface-relative screen point. Selects the node
    /// under it and starts editing when the content region of an editable
    /// node was hit. Pressing anywhere else blurs the active widget.
    pub fn pointer_down(&mut self, screen: Vec2) -> Option<(NodeId, NodeHit)> {
        let p = self.viewport.screen_to_graph(screen);
        let hit = picking::pick_impl(&self.graph, p, self.config.min_content_height);
        let keeps_focus = matches!(hit, Some((id, NodeHit::Content)) if self.overlay.active() == Some(id));
        if !keeps_focus {
            self.widget_blur();
        }
        match hit {
            Some((id, region)) => {
                if !self.selection.contains(id) {
                    self.select(id, false);
                }
                if region == NodeHit::Content && self.graph.text(id).is_some() {
                    if let Err(e) = self.begin_edit(id) {
                        debug!("editor: cannot edit node {id}: {e}");
                    }
                }
            }
            None => self.clear_selection(),
        }
        self.dirty = true;
        hit
    }

    /// `true` when the key was consumed by the active widget.
    pub fn key_down(&mut self, key: &KeyInput) -> bool {
        let exited = self.overlay.key(&mut self.graph, key).is_some();
        self.dirty |= exited;
        exited
    }

    pub fn begin_edit(&mut self, id: NodeId) -> Result<bool, Error> {
        let started = self
            .overlay
            .begin(&mut self.graph, id, &self.viewport, &self.surface, &self.config)?;
        self.dirty |= started;
        Ok(started)
    }

    pub fn widget(&self) -> Option<&OverlayWidget> {
        self.overlay.widget()
    }

    pub fn widget_input(&mut self, value: &str) -> bool {
        let changed = self.overlay.input(value);
        self.dirty |= changed;
        changed
    }

    pub fn widget_blur(&mut self) -> Option<NodeId> {
        let id = self.overlay.finish(&mut self.graph, ExitReason::Blur);
        self.dirty |= id.is_some();
        id
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.overlay.active()
    }

    // Serialization
    /// Serialized node, with the live widget text if it is being edited.
    pub fn serialized_node(&self, id: NodeId) -> Option<Value> {
        let mut v = self.graph.serialize_node(id)?;
        if let Some(live) = self.overlay.live_text(id) {
            let key = self
                .graph
                .node(id)
                .and_then(|n| self.graph.registry().get(&n.kind))
                .and_then(|k| k.text_property());
            if let (Some(key), Value::Object(obj)) = (key, &mut v) {
                let live = Value::String(live.to_string());
                if obj.contains_key(key) {
                    obj.insert(key.to_string(), live.clone());
                }
                if let Some(Value::Object(props)) = obj.get_mut("properties") {
                    props.insert(key.to_string(), live.clone());
                }
                if let Some(out) = obj
                    .get_mut("outputs")
                    .and_then(Value::as_array_mut)
                    .and_then(|outs| outs.first_mut())
                    .and_then(Value::as_object_mut)
                {
                    out.insert("value".into(), live);
                }
            }
        }
        Some(v)
    }

    /// Selected nodes serialized in z-order.
    pub fn serialized_selection(&self) -> Vec<Value> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| self.selection.contains(n.id))
            .filter_map(|n| self.serialized_node(n.id))
            .collect()
    }

    /// Writes the selection to `sink`; `false` when nothing was selected.
    pub fn copy_selection(&self, sink: &mut dyn ClipboardSink) -> Result<bool, Error> {
        let Some(text) = selection_text(self.serialized_selection())? else {
            return Ok(false);
        };
        debug!("editor: copied {} node(s)", self.selection.len());
        sink.write_text(text)?;
        Ok(true)
    }

    /// Copy, then remove the copied nodes.
    pub fn cut_selection(&mut self, sink: &mut dyn ClipboardSink) -> Result<bool, Error> {
        if !self.copy_selection(sink)? {
            return Ok(false);
        }
        self.delete_selection();
        Ok(true)
    }

    // Frame
    /// Reconcile overlay and selection with the graph, then build the frame.
    pub fn draw(&mut self, measure: &dyn TextMeasure) -> DrawList {
        self.overlay
            .sync(&mut self.graph, &self.viewport, &self.surface, &self.config);
        self.selection.retain_live(&self.graph);
        self.dirty = false;
        render::draw_graph(&self.graph, &self.selection, &self.overlay, measure, &self.config)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::PROMPT;
    use crate::render::MonospaceMeasure;

    fn editor() -> Editor {
        let mut ed = Editor::default();
        ed.set_surface(Surface::sized(800.0, 600.0));
        ed
    }

    #[test]
    fn centered_node_sits_on_visible_center() {
        let mut ed = editor();
        let id = ed.create_centered(IMAGE_SOURCE).unwrap();
        assert_eq!(ed.graph().node(id).unwrap().bounds().center(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn pointer_on_content_starts_editing() {
        let mut ed = editor();
        let id = ed.add_node(PROMPT, Vec2::new(100.0, 100.0)).unwrap();
        // prompt content region starts at (8, 52) node-local
        let hit = ed.pointer_down(Vec2::new(150.0, 170.0));
        assert_eq!(hit, Some((id, NodeHit::Content)));
        assert_eq!(ed.editing(), Some(id));
        assert!(ed.selection().contains(id));

        ed.widget_input("draft");
        ed.pointer_down(Vec2::new(700.0, 500.0));
        assert_eq!(ed.editing(), None);
        assert_eq!(ed.graph().text(id), Some("draft"));
        assert!(ed.selection().is_empty());
    }

    #[test]
    fn copy_uses_live_widget_text() {
        let mut ed = editor();
        let id = ed.add_node(PROMPT, Vec2::ZERO).unwrap();
        ed.select(id, false);
        ed.begin_edit(id).unwrap();
        ed.widget_input("typed");
        let mut out = String::new();
        assert!(ed.copy_selection(&mut out).unwrap());
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["text"], "typed");
        assert_eq!(v["properties"]["text"], "typed");
        assert_eq!(ed.graph().text(id), Some(""));
    }

    #[test]
    fn rubber_band_selects_touched_nodes() {
        let mut ed = editor();
        let a = ed.add_node(PROMPT, Vec2::new(0.0, 0.0)).unwrap();
        let b = ed.add_node(PROMPT, Vec2::new(400.0, 0.0)).unwrap();
        ed.add_node(PROMPT, Vec2::new(0.0, 400.0)).unwrap();
        ed.set_viewport(0.5, Vec2::ZERO).unwrap();
        // screen (0,0)-(250,50) covers graph (0,0)-(500,100)
        assert_eq!(ed.select_in_rect(Vec2::new(250.0, 50.0), Vec2::ZERO, false), 2);
        assert_eq!(ed.selection().ids(), vec![a, b]);
    }

    #[test]
    fn draw_drops_removed_nodes_from_selection() {
        let mut ed = editor();
        let id = ed.add_node(PROMPT, Vec2::ZERO).unwrap();
        ed.select(id, false);
        ed.graph_mut().remove_node(id);
        ed.draw(&MonospaceMeasure::default());
        assert!(ed.selection().is_empty());
        assert!(!ed.is_dirty());
    }
}
