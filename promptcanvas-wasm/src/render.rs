//! Replays a core draw list on a 2D canvas context.

use promptcanvas::render::{palette, DrawCommand, DrawList, TextAlign, TextMeasure};
use promptcanvas::{Rect, Surface, Viewport};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const FONT_FAMILY: &str = "system-ui, sans-serif";

fn font(size: f32) -> String {
    format!("{size}px {FONT_FAMILY}")
}

/// Text widths from the canvas' own font metrics.
pub struct CanvasMeasure<'a> {
    pub ctx: &'a CanvasRenderingContext2d,
}

impl TextMeasure for CanvasMeasure<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.ctx.set_font(&font(font_size));
        match self.ctx.measure_text(text) {
            Ok(m) => m.width() as f32,
            // rough average advance
            Err(_) => text.chars().count() as f32 * font_size * 0.55,
        }
    }
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f32) -> Result<(), JsValue> {
    let rad = radius.min(r.w * 0.5).min(r.h * 0.5).max(0.0) as f64;
    let (x, y, w, h) = (r.x as f64, r.y as f64, r.w as f64, r.h as f64);
    ctx.begin_path();
    if rad <= 0.0 {
        ctx.rect(x, y, w, h);
        return Ok(());
    }
    ctx.move_to(x + rad, y);
    ctx.arc_to(x + w, y, x + w, y + h, rad)?;
    ctx.arc_to(x + w, y + h, x, y + h, rad)?;
    ctx.arc_to(x, y + h, x, y, rad)?;
    ctx.arc_to(x, y, x + w, y, rad)?;
    ctx.close_path();
    Ok(())
}

/// Paints the background and draws `list` (graph space) under the viewport transform.
pub fn replay(
    ctx: &CanvasRenderingContext2d,
    list: &DrawList,
    viewport: &Viewport,
    surface: &Surface,
) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(&palette::BACKGROUND.css());
    ctx.fill_rect(0.0, 0.0, surface.size.x as f64, surface.size.y as f64);
    let s = viewport.scale() as f64;
    let o = viewport.offset();
    ctx.set_transform(s, 0.0, 0.0, s, o.x as f64, o.y as f64)?;
    ctx.set_text_baseline("middle");
    let res = list.commands.iter().try_for_each(|cmd| draw_command(ctx, cmd));
    ctx.restore();
    res
}

fn draw_command(ctx: &CanvasRenderingContext2d, cmd: &DrawCommand) -> Result<(), JsValue> {
    match cmd {
        DrawCommand::FillRect { rect, color, radius } => {
            rounded_rect(ctx, rect, *radius)?;
            ctx.set_fill_style_str(&color.css());
            ctx.fill();
        }
        DrawCommand::StrokeRect { rect, color, width, radius } => {
            rounded_rect(ctx, rect, *radius)?;
            ctx.set_stroke_style_str(&color.css());
            ctx.set_line_width(*width as f64);
            ctx.stroke();
        }
        DrawCommand::Line { from, to, color, width } => {
            // horizontal bezier between slots
            let dx = ((to.x - from.x).abs() * 0.5).max(40.0) as f64;
            ctx.begin_path();
            ctx.move_to(from.x as f64, from.y as f64);
            ctx.bezier_curve_to(
                from.x as f64 + dx,
                from.y as f64,
                to.x as f64 - dx,
                to.y as f64,
                to.x as f64,
                to.y as f64,
            );
            ctx.set_stroke_style_str(&color.css());
            ctx.set_line_width(*width as f64);
            ctx.stroke();
        }
        DrawCommand::Circle { center, radius, color } => {
            ctx.begin_path();
            ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, std::f64::consts::TAU)?;
            ctx.set_fill_style_str(&color.css());
            ctx.fill();
        }
        DrawCommand::Text { pos, text, size, color, align } => {
            ctx.set_font(&font(*size));
            ctx.set_fill_style_str(&color.css());
            ctx.set_text_align(match align {
                TextAlign::Left => "left",
                TextAlign::Center => "center",
                TextAlign::Right => "right",
            });
            ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
        }
    }
    Ok(())
}
