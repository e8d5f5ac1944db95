use glam::{Vec2, Vec3};

use crate::snapshot::{CameraFrame, SortedLight};
use crate::{TILE_SIZE, WORDS_PER_TILE};

/// Screen rectangles thinner than this never cover a tile meaningfully.
const DEGENERATE_EPSILON: f32 = 1e-4;

/// Fixed-size screen tiling for one canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles_x: width.div_ceil(TILE_SIZE),
            tiles_y: height.div_ceil(TILE_SIZE),
        }
    }

    /// Length in u32 words of the whole tile bitmask buffer.
    pub fn word_count(&self) -> usize {
        (self.tiles_x * self.tiles_y) as usize * WORDS_PER_TILE
    }

    /// Words per row of tiles.
    pub fn tile_stride(&self) -> usize {
        self.tiles_x as usize * WORDS_PER_TILE
    }

    pub fn word_index(&self, tile_x: u32, tile_y: u32, word: usize) -> usize {
        tile_y as usize * self.tile_stride() + tile_x as usize * WORDS_PER_TILE + word
    }
}

/// Pixel-space AABB, already clamped to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

/// Screen-space bounding rectangle of the light's influence cube, or
/// `None` when the light cannot touch any tile: degenerate extent, fully
/// off screen, or entirely outside the [near, far] depth band. A `None`
/// here only skips tile binning; the light keeps its sorted slot and its
/// Z-bin membership.
pub(crate) fn project_light_rect(
    light: &SortedLight,
    camera: &CameraFrame,
    grid: &TileGrid,
) -> Option<ScreenRect> {
    let depth = -light.view_position.z;
    if depth + light.range < camera.near || depth - light.range > camera.far {
        return None;
    }

    let mut ndc_min = Vec2::splat(f32::MAX);
    let mut ndc_max = Vec2::splat(f32::MIN);
    for c in 0..8u32 {
        let offset = Vec3::new(
            if c & 1 != 0 { 1.0 } else { -1.0 },
            if c & 2 != 0 { 1.0 } else { -1.0 },
            if c & 4 != 0 { 1.0 } else { -1.0 },
        ) * light.range;
        let mut corner = light.view_position + offset;
        // Corners crossing behind the eye would flip under the perspective
        // divide; clamp them onto the near plane first.
        corner.z = corner.z.min(-camera.near);

        let clip = camera.projection * corner.extend(1.0);
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        ndc_min = ndc_min.min(ndc);
        ndc_max = ndc_max.max(ndc);
    }

    let extent = Vec2::new(grid.width as f32 - 1.0, grid.height as f32 - 1.0);
    let min_x = (ndc_min.x * 0.5 + 0.5) * extent.x;
    let max_x = (ndc_max.x * 0.5 + 0.5) * extent.x;
    // NDC Y points up, pixel rows grow down: negate and swap.
    let min_y = (-ndc_max.y * 0.5 + 0.5) * extent.y;
    let max_y = (-ndc_min.y * 0.5 + 0.5) * extent.y;

    if max_x - min_x < DEGENERATE_EPSILON || max_y - min_y < DEGENERATE_EPSILON {
        return None;
    }
    if min_x > grid.width as f32 || min_y > grid.height as f32 || max_x < 0.0 || max_y < 0.0 {
        return None;
    }

    Some(ScreenRect {
        min: Vec2::new(min_x.max(0.0), min_y.max(0.0)),
        max: Vec2::new(
            max_x.min(grid.width as f32),
            max_y.min(grid.height as f32),
        ),
    })
}

/// ORs `sorted_position`'s bit into every tile the rect overlaps. OR, not
/// assignment: tiles accumulate bits from many lights.
pub(crate) fn rasterize_rect(
    words: &mut [u32],
    grid: &TileGrid,
    rect: &ScreenRect,
    sorted_position: usize,
) {
    let tile_size = TILE_SIZE as f32;
    let first_tile_x = (rect.min.x / tile_size) as u32;
    let last_tile_x = ((rect.max.x / tile_size) as u32).min(grid.tiles_x - 1);
    let first_tile_y = (rect.min.y / tile_size) as u32;
    let last_tile_y = ((rect.max.y / tile_size) as u32).min(grid.tiles_y - 1);

    let word = sorted_position / 32;
    let bit = 1u32 << (sorted_position % 32);
    for tile_y in first_tile_y..=last_tile_y {
        for tile_x in first_tile_x..=last_tile_x {
            words[grid.word_index(tile_x, tile_y, word)] |= bit;
        }
    }
}
