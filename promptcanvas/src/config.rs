use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Session tunables. Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Screen-space delta applied to pasted serialized nodes.
    pub paste_offset: [f32; 2],
    /// Content regions shorter than this are neither drawn nor editable.
    pub min_content_height: f32,
    pub count_warning: usize,
    pub count_danger: usize,
    pub font_size: f32,
    pub line_height: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Lowercase, without the dot.
    pub image_extensions: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            paste_offset: [10.0, 10.0],
            min_content_height: 24.0,
            count_warning: 500,
            count_danger: 1000,
            font_size: 14.0,
            line_height: 1.3,
            min_scale: 0.1,
            max_scale: 10.0,
            image_extensions: ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "avif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let cfg: EditorConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.count_danger < self.count_warning {
            return Err(Error::Config("count_danger must not be below count_warning".into()));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale.is_finite()) {
            return Err(Error::Config(format!(
                "zoom range [{}, {}] is not usable",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.font_size > 0.0 && self.font_size.is_finite() && self.line_height > 0.0) {
            return Err(Error::Config("font metrics must be positive".into()));
        }
        Ok(())
    }

    pub fn line_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    pub fn is_image_extension(&self, ext: &str) -> bool {
        self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
