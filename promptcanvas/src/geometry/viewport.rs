//! Screen <-> graph space conversion.
//!
//! Screen points are pixels relative to the rendering surface's bounding box.
//! Nothing here is cached: callers recompute on every placement and redraw.

use super::tolerance::{clamp, EPS_SCALE};
use crate::error::Error;
use crate::model::{Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    scale: f32,
    offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(scale: f32, offset: Vec2) -> Result<Self, Error> {
        if !scale.is_finite() || scale < EPS_SCALE {
            return Err(Error::InvalidViewport(format!("scale must be finite and > 0, got {scale}")));
        }
        if !offset.is_finite() {
            return Err(Error::InvalidViewport("offset must be finite".into()));
        }
        Ok(Viewport { scale, offset })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn screen_to_graph(&self, p: Vec2) -> Vec2 {
        p.sub(self.offset).scale(1.0 / self.scale)
    }

    pub fn graph_to_screen(&self, p: Vec2) -> Vec2 {
        p.scale(self.scale).add(self.offset)
    }

    pub fn graph_rect_to_screen(&self, r: Rect) -> Rect {
        let o = self.graph_to_screen(r.origin());
        Rect::new(o.x, o.y, r.w * self.scale, r.h * self.scale)
    }

    /// Center of the visible area in graph space.
    pub fn visible_center(&self, surface: &Surface) -> Vec2 {
        self.screen_to_graph(surface.size.scale(0.5))
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.offset = self.offset.add(delta);
        }
    }

    /// Zoom by `factor` keeping `anchor` (screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32, min_scale: f32, max_scale: f32) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return;
        }
        let before = self.screen_to_graph(anchor);
        self.scale = clamp(self.scale * factor, min_scale.max(EPS_SCALE), max_scale);
        // keep `before` under the anchor
        self.offset = anchor.sub(before.scale(self.scale));
    }
}

/// The rendering surface's bounding box on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Surface {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Surface { origin, size }
    }

    pub fn sized(w: f32, h: f32) -> Self {
        Surface {
            origin: Vec2::ZERO,
            size: Vec2::new(w, h),
        }
    }

    /// Surface-relative point to absolute page point.
    pub fn to_page(&self, p: Vec2) -> Vec2 {
        p.add(self.origin)
    }
}
