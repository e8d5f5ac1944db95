//! Per-frame clustered/tiled light culling.
//!
//! Turns the frame's light set into three compact index structures the
//! shading pass reads instead of walking every light per shaded point:
//! a depth-sorted light index buffer, a per-Z-bin index range LUT, and a
//! per-screen-tile light bitmask. Pure CPU work; the renderer crate owns
//! the GPU upload.

mod frame;
mod snapshot;
mod tiles;
mod zbin;

pub use frame::{ClusterOutput, CullingFrame};
pub use snapshot::{CameraFrame, CullableLight, SortedLight};
pub use tiles::TileGrid;
pub use zbin::ZBin;

/// Capacity of the per-frame light snapshot; lights past this are dropped.
pub const MAX_LIGHTS: usize = 256;

/// Number of equal-width slices of the normalized depth range [0,1].
pub const NUM_Z_BINS: usize = 16;

/// Screen tile edge length in pixels.
pub const TILE_SIZE: u32 = 8;

/// 32-bit words per tile bitmask, one bit per sorted-array position.
pub const WORDS_PER_TILE: usize = MAX_LIGHTS.div_ceil(32);

// These constants are baked into the shading-pass shaders as well; the two
// sides must agree at compile time, they are never discovered at runtime.
