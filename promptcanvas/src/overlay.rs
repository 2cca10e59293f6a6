//! Floating text-input overlay for editable nodes.
//!
//! A node is either `Idle` (its text is drawn on the canvas) or `Editing`
//! (a retained-mode widget positioned over its content region owns the text).
//! The overlay holds at most one edit session, so at most one node is ever
//! editing. Every way out of `Editing` goes through [`Overlay::finish`].

use crate::config::EditorConfig;
use crate::error::Error;
use crate::geometry::viewport::{Surface, Viewport};
use crate::kinds::content_bounds;
use crate::model::{GraphNode, NodeId, Rect};
use crate::Graph;
use log::debug;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    #[default]
    Idle,
    Editing,
}

/// What the host should show: a text input at `rect` (page pixels).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayWidget {
    pub node: NodeId,
    pub rect: Rect,
    pub font_size: f32,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Blur,
    Confirm,
    Cancel,
    Deselected,
    Removed,
    /// Another node started editing.
    Superseded,
    /// The whole graph was replaced.
    Replaced,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: &str) -> Self {
        KeyInput { key: key.to_string(), ..Default::default() }
    }
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
    /// Ctrl/Cmd+Enter; a bare Enter is a newline in the widget.
    pub fn is_confirm(&self) -> bool {
        self.key == "Enter" && (self.ctrl || self.meta)
    }
    pub fn is_cancel(&self) -> bool {
        self.key == "Escape"
    }
}

struct EditSession {
    widget: OverlayWidget,
    /// Text when editing began; restored on cancel.
    original: String,
}

#[derive(Default)]
pub struct Overlay {
    session: Option<EditSession>,
}

/// Page-space rectangle of a node's content region, or `None` if degenerate.
pub fn place_widget(node: &GraphNode, viewport: &Viewport, surface: &Surface, config: &EditorConfig) -> Option<Rect> {
    let content = content_bounds(node, config.min_content_height)?;
    let screen = viewport.graph_rect_to_screen(content.translate(node.pos));
    let origin = surface.to_page(screen.origin());
    Some(Rect::new(origin.x, origin.y, screen.w, screen.h))
}

impl Overlay {
    pub fn state(&self, node: NodeId) -> OverlayState {
        match &self.session {
            Some(s) if s.widget.node == node => OverlayState::Editing,
            _ => OverlayState::Idle,
        }
    }

    pub fn active(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.widget.node)
    }

    pub fn widget(&self) -> Option<&OverlayWidget> {
        self.session.as_ref().map(|s| &s.widget)
    }

    pub fn live_text(&self, node: NodeId) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| s.widget.node == node)
            .map(|s| s.widget.value.as_str())
    }

    /// `Idle -> Editing`. Commits any other node first. Returns `false` when
    /// the node is already editing or its content region is too small.
    pub fn begin(
        &mut self,
        graph: &mut Graph,
        node: NodeId,
        viewport: &Viewport,
        surface: &Surface,
        config: &EditorConfig,
    ) -> Result<bool, Error> {
        if self.active() == Some(node) {
            return Ok(false);
        }
        let n = graph.node(node).ok_or(Error::NodeNotFound(node))?;
        let text = graph.text(node).ok_or(Error::NotEditable(node))?.to_string();
        let Some(rect) = place_widget(n, viewport, surface, config) else {
            debug!("overlay: node {node} content region too small to edit");
            return Ok(false);
        };
        self.finish(graph, ExitReason::Superseded);
        debug!("overlay: node {node} editing");
        self.session = Some(EditSession {
            widget: OverlayWidget {
                node,
                rect,
                font_size: config.font_size * viewport.scale(),
                value: text.clone(),
            },
            original: text,
        });
        Ok(true)
    }

    /// Widget value changed.
    pub fn input(&mut self, value: &str) -> bool {
        let Some(s) = self.session.as_mut() else { return false };
        s.widget.value = value.to_string();
        true
    }

    /// Returns the exit taken, if the key ended the session.
    pub fn key(&mut self, graph: &mut Graph, key: &KeyInput) -> Option<ExitReason> {
        self.session.as_ref()?;
        let reason = if key.is_confirm() {
            ExitReason::Confirm
        } else if key.is_cancel() {
            ExitReason::Cancel
        } else {
            return None;
        };
        self.finish(graph, reason);
        Some(reason)
    }

    /// The single exit from `Editing`. Cancel first restores the pre-edit
    /// value; then the widget value is written to the node (if it still
    /// exists) and the widget is destroyed.
    pub fn finish(&mut self, graph: &mut Graph, reason: ExitReason) -> Option<NodeId> {
        let mut s = self.session.take()?;
        let id = s.widget.node;
        if reason == ExitReason::Cancel {
            s.widget.value = std::mem::take(&mut s.original);
        }
        match graph.text(id).map(|current| current == s.widget.value) {
            Some(false) => {
                if let Err(e) = graph.set_text(id, &s.widget.value) {
                    log::warn!("overlay: could not store text for node {id}: {e}");
                }
            }
            Some(true) => {}
            None => debug!("overlay: node {id} gone, dropping widget"),
        }
        debug!("overlay: node {id} idle ({reason:?})");
        Some(id)
    }

    /// Per-frame placement. Ends the session if its node disappeared or its
    /// content region became degenerate.
    pub fn sync(&mut self, graph: &mut Graph, viewport: &Viewport, surface: &Surface, config: &EditorConfig) {
        let Some(id) = self.active() else { return };
        let placed = graph.node(id).map(|n| place_widget(n, viewport, surface, config));
        match placed {
            None => {
                self.finish(graph, ExitReason::Removed);
            }
            Some(None) => {
                self.finish(graph, ExitReason::Blur);
            }
            Some(Some(rect)) => {
                if let Some(s) = self.session.as_mut() {
                    s.widget.rect = rect;
                    s.widget.font_size = config.font_size * viewport.scale();
                }
            }
        }
    }
}
