// Shared numeric tolerances

pub const EPS_POS: f32 = 1e-3;            // point coincidence threshold (px)
pub const EPS_SCALE: f32 = 1e-6;          // smallest usable zoom factor

#[inline] pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 { x.max(lo).min(hi) }
#[inline] pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }
