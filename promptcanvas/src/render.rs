//! Immediate-mode drawing.
//!
//! Each frame the editor produces a fresh [`DrawList`] in graph space. A host
//! replays it onto its 2D context after applying the viewport transform.
//! Text metrics come from the host through [`TextMeasure`].

use crate::config::EditorConfig;
use crate::kinds;
use crate::model::{Color, GraphNode, Rect, Vec2};
use crate::overlay::{Overlay, OverlayState};
use crate::selection::Selection;
use crate::Graph;
use serde::Serialize;

pub mod palette {
    use crate::model::Color;

    pub const BACKGROUND: Color = Color::rgb(0x1e, 0x1f, 0x24);
    pub const NODE_BODY: Color = Color::rgb(0x35, 0x37, 0x3d);
    pub const NODE_TITLE: Color = Color::rgb(0x2a, 0x2b, 0x30);
    pub const NODE_BORDER: Color = Color::rgb(0x55, 0x58, 0x60);
    pub const SELECTED_BORDER: Color = Color::rgb(0xf0, 0xf0, 0xf0);
    pub const CONTENT_BG: Color = Color::rgb(0x22, 0x23, 0x28);
    pub const CONTENT_BORDER: Color = Color::rgb(0x48, 0x4a, 0x52);
    pub const EDITING_BORDER: Color = Color::rgb(0x4a, 0x9e, 0xff);
    pub const TEXT: Color = Color::rgb(0xdd, 0xdd, 0xdd);
    pub const TEXT_MUTED: Color = Color::rgb(0x8a, 0x8c, 0x94);
    pub const COUNT_NORMAL: Color = Color::rgb(0x8a, 0x8c, 0x94);
    pub const COUNT_WARNING: Color = Color::rgb(0xe0, 0xa8, 0x3a);
    pub const COUNT_DANGER: Color = Color::rgb(0xe0, 0x4f, 0x4f);
    pub const LINK_TEXT: Color = Color::rgb(0x8f, 0xd1, 0x6a);
    pub const LINK_IMAGE: Color = Color::rgb(0x64, 0xb5, 0xf6);
    pub const LINK_ANY: Color = Color::rgb(0xb0, 0xb0, 0xb0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Right,
    Center,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color, radius: f32 },
    StrokeRect { rect: Rect, color: Color, width: f32, radius: f32 },
    Line { from: Vec2, to: Vec2, color: Color, width: f32 },
    Circle { center: Vec2, radius: f32, color: Color },
    Text { pos: Vec2, text: String, size: f32, color: Color, align: TextAlign },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Width of a run of text at a given font size, in the same units as the size.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed advance per character; good enough for tests and headless hosts.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
    pub advance_em: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        MonospaceMeasure { advance_em: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance_em
    }
}

/// Everything a [`crate::kinds::NodeKind`] needs to draw one node.
pub struct DrawContext<'a> {
    pub list: &'a mut DrawList,
    pub measure: &'a dyn TextMeasure,
    pub config: &'a EditorConfig,
    pub selected: bool,
    pub overlay: OverlayState,
    /// Live widget text while the node is editing.
    pub live_text: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountTier {
    Normal,
    Warning,
    Danger,
}

impl CountTier {
    pub fn for_len(len: usize, config: &EditorConfig) -> CountTier {
        if len >= config.count_danger {
            CountTier::Danger
        } else if len >= config.count_warning {
            CountTier::Warning
        } else {
            CountTier::Normal
        }
    }

    pub fn color(self) -> Color {
        match self {
            CountTier::Normal => palette::COUNT_NORMAL,
            CountTier::Warning => palette::COUNT_WARNING,
            CountTier::Danger => palette::COUNT_DANGER,
        }
    }
}

/// Shared node chrome: body, title bar, title text, border and slots.
pub fn draw_chrome(node: &GraphNode, title: &str, cx: &mut DrawContext<'_>) {
    let b = node.bounds();
    cx.list.push(DrawCommand::FillRect { rect: b, color: palette::NODE_BODY, radius: 4.0 });
    cx.list.push(DrawCommand::FillRect {
        rect: Rect::new(b.x, b.y, b.w, kinds::TITLE_HEIGHT),
        color: palette::NODE_TITLE,
        radius: 4.0,
    });
    cx.list.push(DrawCommand::Text {
        pos: Vec2::new(b.x + kinds::PADDING, b.y + kinds::TITLE_HEIGHT * 0.5),
        text: title.to_string(),
        size: cx.config.font_size,
        color: palette::TEXT,
        align: TextAlign::Left,
    });
    let (border, width) = if cx.selected {
        (palette::SELECTED_BORDER, 2.0)
    } else {
        (palette::NODE_BORDER, 1.0)
    };
    cx.list.push(DrawCommand::StrokeRect { rect: b, color: border, width, radius: 4.0 });
    for (i, port) in node.inputs.iter().enumerate() {
        let c = kinds::input_slot_pos(node, i);
        cx.list.push(DrawCommand::Circle { center: c, radius: 4.0, color: link_color(port.ty) });
        cx.list.push(DrawCommand::Text {
            pos: Vec2::new(c.x + kinds::PADDING, c.y),
            text: port.name.clone(),
            size: cx.config.font_size * 0.85,
            color: palette::TEXT_MUTED,
            align: TextAlign::Left,
        });
    }
    for (i, port) in node.outputs.iter().enumerate() {
        let c = kinds::output_slot_pos(node, i);
        cx.list.push(DrawCommand::Circle { center: c, radius: 4.0, color: link_color(port.ty) });
        cx.list.push(DrawCommand::Text {
            pos: Vec2::new(c.x - kinds::PADDING, c.y),
            text: port.name.clone(),
            size: cx.config.font_size * 0.85,
            color: palette::TEXT_MUTED,
            align: TextAlign::Right,
        });
    }
}

pub fn link_color(ty: crate::model::PortType) -> Color {
    match ty {
        crate::model::PortType::Text => palette::LINK_TEXT,
        crate::model::PortType::Image => palette::LINK_IMAGE,
        crate::model::PortType::Any => palette::LINK_ANY,
    }
}

/// Draw links first, then nodes in z-order.
pub fn draw_graph(
    graph: &Graph,
    selection: &Selection,
    overlay: &Overlay,
    measure: &dyn TextMeasure,
    config: &EditorConfig,
) -> DrawList {
    let mut list = DrawList::default();
    for link in graph.links() {
        let (Some(a), Some(b)) = (graph.node(link.from.node), graph.node(link.to.node)) else {
            continue;
        };
        list.push(DrawCommand::Line {
            from: kinds::output_slot_pos(a, link.from.slot),
            to: kinds::input_slot_pos(b, link.to.slot),
            color: link_color(link.ty),
            width: 2.0,
        });
    }
    for node in graph.nodes() {
        let Some(kind) = graph.registry().get(&node.kind) else {
            log::warn!("no kind registered for '{}', node {} not drawn", node.kind, node.id);
            continue;
        };
        let mut cx = DrawContext {
            list: &mut list,
            measure,
            config,
            selected: selection.contains(node.id),
            overlay: overlay.state(node.id),
            live_text: overlay.live_text(node.id),
        };
        kind.draw(node, &mut cx);
    }
    list
}
