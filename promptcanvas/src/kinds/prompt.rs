use super::{content_bounds, NodeKind, PROMPT};
use crate::algorithms::text_layout::layout_text_box;
use crate::model::{GraphNode, Port, PortType, Vec2};
use crate::overlay::OverlayState;
use crate::render::{draw_chrome, palette, CountTier, DrawCommand, DrawContext, TextAlign};
use serde_json::{Map, Value};

pub const TEXT: &str = "text";
const INNER_PAD: f32 = 6.0;

/// Free-form prompt text, edited in place through the overlay widget.
pub struct PromptKind;

impl NodeKind for PromptKind {
    fn tag(&self) -> &'static str {
        PROMPT
    }
    fn title(&self) -> &'static str {
        "Prompt"
    }
    fn default_size(&self) -> Vec2 {
        Vec2::new(300.0, 160.0)
    }
    fn min_size(&self) -> Vec2 {
        Vec2::new(160.0, 60.0)
    }
    fn default_properties(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(TEXT.into(), Value::String(String::new()));
        m
    }
    fn outputs(&self) -> Vec<Port> {
        // output value mirrors the text property
        vec![Port {
            value: Some(Value::String(String::new())),
            ..Port::new("prompt", PortType::Text)
        }]
    }
    fn text_property(&self) -> Option<&'static str> {
        Some(TEXT)
    }

    fn draw(&self, node: &GraphNode, cx: &mut DrawContext<'_>) {
        draw_chrome(node, self.title(), cx);
        let Some(content) = content_bounds(node, cx.config.min_content_height) else {
            return;
        };
        let area = content.translate(node.pos);
        let editing = cx.overlay == OverlayState::Editing;
        cx.list.push(DrawCommand::FillRect { rect: area, color: palette::CONTENT_BG, radius: 3.0 });
        let (border, width) = if editing {
            (palette::EDITING_BORDER, 2.0)
        } else {
            (palette::CONTENT_BORDER, 1.0)
        };
        cx.list.push(DrawCommand::StrokeRect { rect: area, color: border, width, radius: 3.0 });

        let stored = node.str_property(TEXT).unwrap_or_default();
        let text = if editing { cx.live_text.unwrap_or(stored) } else { stored };

        let count_size = cx.config.font_size * 0.85;
        let count_row = count_size + INNER_PAD;
        if !editing {
            let inner = area.inset(INNER_PAD);
            let fitted = layout_text_box(
                text,
                inner.w,
                inner.h - count_row,
                cx.config.font_size,
                cx.config.line_px(),
                cx.measure,
            );
            let line_px = cx.config.line_px();
            for (i, line) in fitted.lines.into_iter().enumerate() {
                cx.list.push(DrawCommand::Text {
                    pos: Vec2::new(inner.x, inner.y + line_px * (i as f32 + 0.5)),
                    text: line,
                    size: cx.config.font_size,
                    color: palette::TEXT,
                    align: TextAlign::Left,
                });
            }
        }

        let len = text.chars().count();
        cx.list.push(DrawCommand::Text {
            pos: Vec2::new(area.x + area.w - INNER_PAD, area.y + area.h - count_row * 0.5),
            text: len.to_string(),
            size: count_size,
            color: CountTier::for_len(len, cx.config).color(),
            align: TextAlign::Right,
        });
    }

    fn serialize(&self, node: &GraphNode, out: &mut Map<String, Value>) {
        let text = node.str_property(TEXT).unwrap_or_default();
        out.insert(TEXT.into(), Value::String(text.to_string()));
    }

    fn deserialize(&self, node: &mut GraphNode, src: &Map<String, Value>) {
        let text = src
            .get(TEXT)
            .and_then(Value::as_str)
            .or_else(|| node.str_property(TEXT))
            .unwrap_or_default()
            .to_string();
        if let Some(out) = node.outputs.first_mut() {
            out.value = Some(Value::String(text.clone()));
        }
        node.properties.insert(TEXT.into(), Value::String(text));
    }
}
