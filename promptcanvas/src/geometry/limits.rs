// Centralized ingestion limits to harden against untrusted input (pasted or loaded JSON)

// Workflow size caps
pub const MAX_NODES: usize = 10_000;
pub const MAX_LINKS: usize = 20_000;

// Properties of a single node, serialized
pub const MAX_PROPERTY_KEYS: usize = 256;

// Numeric bounds
pub const COORD_MIN: f32 = -10_000_000.0;
pub const COORD_MAX: f32 = 10_000_000.0;
pub const SIZE_MAX: f32 = 100_000.0;

#[inline]
pub fn in_coord_bounds(x: f32) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_size_bounds(w: f32) -> bool { w.is_finite() && w > 0.0 && w <= SIZE_MAX }
