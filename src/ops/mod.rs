// ============================================================================
// OPS: pixel operations built on PixelBuffer primitives
// ============================================================================

pub mod shapes;
pub mod transform;
