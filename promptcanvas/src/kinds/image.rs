use super::{content_bounds, NodeKind, IMAGE_SOURCE};
use crate::algorithms::text_layout::layout_text_box;
use crate::model::{GraphNode, Port, PortType, Vec2};
use crate::render::{draw_chrome, palette, DrawCommand, DrawContext, TextAlign};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const URL: &str = "url";
pub const SOURCE_MODE: &str = "source_mode";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Upload,
    Url,
}

impl SourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceMode::Upload => "upload",
            SourceMode::Url => "url",
        }
    }
}

/// An image referenced by URL, either uploaded from a paste or linked directly.
pub struct ImageSourceKind;

impl ImageSourceKind {
    pub fn url(node: &GraphNode) -> Option<&str> {
        node.str_property(URL)
    }

    pub fn source_mode(node: &GraphNode) -> Option<SourceMode> {
        match node.str_property(SOURCE_MODE)? {
            "upload" => Some(SourceMode::Upload),
            "url" => Some(SourceMode::Url),
            _ => None,
        }
    }

    pub fn set_url(node: &mut GraphNode, url: &str) {
        node.properties.insert(URL.into(), Value::String(url.to_string()));
        node.properties
            .insert(SOURCE_MODE.into(), Value::String(SourceMode::Url.as_str().into()));
        if let Some(out) = node.outputs.first_mut() {
            out.value = Some(Value::String(url.to_string()));
        }
    }
}

impl NodeKind for ImageSourceKind {
    fn tag(&self) -> &'static str {
        IMAGE_SOURCE
    }
    fn title(&self) -> &'static str {
        "Image"
    }
    fn default_size(&self) -> Vec2 {
        Vec2::new(256.0, 256.0)
    }
    fn default_properties(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(URL.into(), Value::Null);
        m.insert(SOURCE_MODE.into(), Value::String(SourceMode::Upload.as_str().into()));
        m
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
        cx.list.push(DrawCommand::FillRect { rect: area, color: palette::CONTENT_BG, radius: 3.0 });
        match Self::url(node) {
            Some(url) => {
                let inner = area.inset(6.0);
                let fitted = layout_text_box(
                    url,
                    inner.w,
                    inner.h,
                    cx.config.font_size * 0.85,
                    cx.config.line_px(),
                    cx.measure,
                );
                for (i, line) in fitted.lines.into_iter().enumerate() {
                    cx.list.push(DrawCommand::Text {
                        pos: Vec2::new(inner.x, inner.y + cx.config.line_px() * (i as f32 + 0.5)),
                        text: line,
                        size: cx.config.font_size * 0.85,
                        color: palette::TEXT_MUTED,
                        align: TextAlign::Left,
                    });
                }
            }
            None => cx.list.push(DrawCommand::Text {
                pos: area.center(),
                text: "no image".into(),
                size: cx.config.font_size,
                color: palette::TEXT_MUTED,
                align: TextAlign::Center,
            }),
        }
    }

    fn deserialize(&self, node: &mut GraphNode, _src: &Map<String, Value>) {
        if let Some(url) = Self::url(node).map(str::to_string) {
            if let Some(out) = node.outputs.first_mut() {
                out.value = Some(Value::String(url));
            }
        }
    }
}
