use super::{content_bounds, NodeKind, GENERATOR};
use crate::model::{GraphNode, Port, PortType, Vec2};
use crate::render::{draw_chrome, palette, DrawCommand, DrawContext, TextAlign};
use serde_json::{json, Map, Value};

/// Remote image generator. Only its authoring surface lives here.
pub struct GeneratorKind;

impl NodeKind for GeneratorKind {
    fn tag(&self) -> &'static str {
        GENERATOR
    }
    fn title(&self) -> &'static str {
        "Generator"
    }
    fn default_size(&self) -> Vec2 {
        Vec2::new(280.0, 140.0)
    }
    fn default_properties(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("model".into(), json!("default"));
        m.insert("width".into(), json!(1024));
        m.insert("height".into(), json!(1024));
        m
    }
    fn inputs(&self) -> Vec<Port> {
        vec![Port::new("prompt", PortType::Text), Port::new("image", PortType::Image)]
    }
    fn outputs(&self) -> Vec<Port> {
        vec![Port::new("image", PortType::Image)]
    }

    fn draw(&self, node: &GraphNode, cx: &mut DrawContext<'_>) {
        draw_chrome(node, self.title(), cx);
        let Some(content) = content_bounds(node, cx.config.min_content_height) else {
            return;
        };
        let area = content.translate(node.pos);
        let model = node.str_property("model").unwrap_or("default");
        let dims = match (
            node.properties.get("width").and_then(Value::as_u64),
            node.properties.get("height").and_then(Value::as_u64),
        ) {
            (Some(w), Some(h)) => format!("{model} \u{b7} {w}\u{d7}{h}"),
            _ => model.to_string(),
        };
        cx.list.push(DrawCommand::Text {
            pos: Vec2::new(area.x, area.y + cx.config.line_px() * 0.5),
            text: dims,
            size: cx.config.font_size * 0.85,
            color: palette::TEXT_MUTED,
            align: TextAlign::Left,
        });
    }
}
