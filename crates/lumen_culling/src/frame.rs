use rayon::prelude::*;

use crate::snapshot::{self, CameraFrame, CullableLight, SortedLight};
use crate::tiles::{self, ScreenRect, TileGrid};
use crate::zbin::{self, ZBin};
use crate::NUM_Z_BINS;

/// The three buffers the shading pass consumes, plus their shape.
/// Single writer per frame: rebuilt by [`CullingFrame::cull`], then handed
/// off; never mutated incrementally.
pub struct ClusterOutput {
    sorted_indices: Vec<u32>,
    z_bins: [ZBin; NUM_Z_BINS],
    tile_words: Vec<u32>,
    grid: TileGrid,
}

impl ClusterOutput {
    /// Sorted-array position -> `global_index`, length = light count.
    pub fn sorted_light_indices(&self) -> &[u32] {
        &self.sorted_indices
    }

    pub fn light_count(&self) -> usize {
        self.sorted_indices.len()
    }

    pub fn z_bins(&self) -> &[ZBin; NUM_Z_BINS] {
        &self.z_bins
    }

    /// Packed Z-bin LUT in upload order.
    pub fn z_bin_lut(&self) -> [u32; NUM_Z_BINS] {
        self.z_bins.map(|bin| bin.pack())
    }

    /// Tile bitmask words, `tiles_x * tiles_y * WORDS_PER_TILE` long.
    pub fn tile_words(&self) -> &[u32] {
        &self.tile_words
    }

    pub fn grid(&self) -> TileGrid {
        self.grid
    }

    /// Whether the light at `sorted_position` was binned into the given
    /// tile. Convenience for tests and debug overlays.
    pub fn tile_contains(&self, tile_x: u32, tile_y: u32, sorted_position: usize) -> bool {
        let word = self.grid.word_index(tile_x, tile_y, sorted_position / 32);
        self.tile_words[word] & (1 << (sorted_position % 32)) != 0
    }
}

/// One frame's culling state. The scratch buffers are reused across frames
/// (capacity-bounded, rebuilt every call); nothing else persists.
pub struct CullingFrame {
    sorted: Vec<SortedLight>,
    rects: Vec<Option<ScreenRect>>,
    output: ClusterOutput,
}

impl CullingFrame {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            sorted: Vec::with_capacity(crate::MAX_LIGHTS),
            rects: Vec::with_capacity(crate::MAX_LIGHTS),
            output: ClusterOutput {
                sorted_indices: Vec::with_capacity(crate::MAX_LIGHTS),
                z_bins: [ZBin::EMPTY; NUM_Z_BINS],
                tile_words: Vec::new(),
                grid: TileGrid::new(canvas_width, canvas_height),
            },
        }
    }

    /// Re-derives the tile grid; takes effect on the next [`cull`].
    pub fn resize_canvas(&mut self, canvas_width: u32, canvas_height: u32) {
        self.output.grid = TileGrid::new(canvas_width, canvas_height);
    }

    /// Runs the whole per-frame pass: snapshot, depth sort, Z binning,
    /// index emission, screen-tile binning. `lights` is the scene store's
    /// frame-coherent light list in store iteration order.
    pub fn cull(&mut self, lights: &[CullableLight], camera: &CameraFrame) -> &ClusterOutput {
        snapshot::collect_lights(&mut self.sorted, lights, camera);
        snapshot::sort_by_depth(&mut self.sorted);

        zbin::build_z_bins(&mut self.output.z_bins, &self.sorted);

        self.output.sorted_indices.clear();
        self.output
            .sorted_indices
            .extend(self.sorted.iter().map(|light| light.global_index));

        let grid = self.output.grid;
        self.output.tile_words.clear();
        self.output.tile_words.resize(grid.word_count(), 0);
        if !self.output.tile_words.is_empty() {
            // Per-light projection has no light-to-light dependency, so it
            // fans out across the compute pool; the bit ORs stay on this
            // thread so the output is identical to a serial pass.
            let camera = *camera;
            self.sorted
                .par_iter()
                .map(|light| tiles::project_light_rect(light, &camera, &grid))
                .collect_into_vec(&mut self.rects);
            for (sorted_position, rect) in self.rects.iter().enumerate() {
                if let Some(rect) = rect {
                    tiles::rasterize_rect(&mut self.output.tile_words, &grid, rect, sorted_position);
                }
            }
        }

        log::trace!(
            "culled {} lights into {}x{} tiles",
            self.sorted.len(),
            grid.tiles_x,
            grid.tiles_y
        );
        &self.output
    }

    pub fn output(&self) -> &ClusterOutput {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_LIGHTS, NUM_Z_BINS};
    use glam::{Mat4, Vec3};

    /// Camera at the origin looking down -Z, near 0.1, far 100, 64x64
    /// canvas: small enough to check bins and tiles by hand.
    fn scenario_camera() -> CameraFrame {
        CameraFrame {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(90.0f32.to_radians(), 1.0, 0.1, 100.0),
            near: 0.1,
            far: 100.0,
        }
    }

    fn light(global_index: u32, position: Vec3, range: f32) -> CullableLight {
        CullableLight {
            global_index,
            world_position: position,
            range,
            enabled: true,
        }
    }

    #[test]
    fn empty_light_set_produces_empty_outputs() {
        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(&[], &scenario_camera());

        assert_eq!(output.light_count(), 0);
        assert!(output.sorted_light_indices().is_empty());
        for bin in output.z_bins() {
            assert!(bin.is_empty());
        }
        assert!(output.tile_words().iter().all(|&w| w == 0));
        assert_eq!(output.tile_words().len(), output.grid().word_count());
    }

    #[test]
    fn single_light_scenario_end_to_end() {
        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(
            &[light(42, Vec3::new(0.0, 0.0, -10.0), 2.0)],
            &scenario_camera(),
        );

        // Sorted buffer maps position 0 back to the stable identity.
        assert_eq!(output.sorted_light_indices(), &[42]);

        // projected_z ~= (10 - 0.1) / 99.9 ~= 0.0992 -> bin 1 of 16.
        assert_eq!(output.z_bins()[1].min_index, 0);
        assert_eq!(output.z_bins()[1].max_index, 0);
        assert_eq!(output.z_bin_lut()[1], 0);
        for (i, bin) in output.z_bins().iter().enumerate() {
            if i != 1 {
                assert!(bin.is_empty(), "bin {i}");
            }
        }

        // The screen AABB is centered on the canvas: corners at ±2 around
        // depth 10 under a 90-degree projection give NDC ±0.25, which is
        // tiles 2..=4 on both axes of the 8x8 grid.
        for tile_y in 0..8 {
            for tile_x in 0..8 {
                let expected = (2..=4).contains(&tile_x) && (2..=4).contains(&tile_y);
                assert_eq!(
                    output.tile_contains(tile_x, tile_y, 0),
                    expected,
                    "tile ({tile_x},{tile_y})"
                );
            }
        }
    }

    #[test]
    fn sorted_positions_index_the_emitted_buffer() {
        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(
            &[
                light(7, Vec3::new(0.0, 0.0, -50.0), 1.0),
                light(9, Vec3::new(0.0, 0.0, -5.0), 1.0),
                light(3, Vec3::new(0.0, 0.0, -20.0), 1.0),
            ],
            &scenario_camera(),
        );

        // Ascending depth: 5, 20, 50.
        assert_eq!(output.sorted_light_indices(), &[9, 3, 7]);
    }

    #[test]
    fn capacity_overflow_is_clamped_not_fatal() {
        let lights: Vec<_> = (0..MAX_LIGHTS as u32 + 32)
            .map(|i| light(i, Vec3::new(0.0, 0.0, -2.0 - (i as f32) * 0.2), 1.0))
            .collect();

        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(&lights, &scenario_camera());

        assert_eq!(output.light_count(), MAX_LIGHTS);
    }

    #[test]
    fn degenerate_light_keeps_depth_structures() {
        // Off to the side far enough that its rect never intersects the
        // viewport, but at a depth that still lands in a Z bin.
        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(
            &[
                light(0, Vec3::new(0.0, 0.0, -10.0), 2.0),
                light(1, Vec3::new(500.0, 0.0, -10.0), 2.0),
            ],
            &scenario_camera(),
        );

        // Both occupy sorted slots and share bin 1...
        assert_eq!(output.light_count(), 2);
        assert_eq!(output.z_bins()[1].min_index, 0);
        assert_eq!(output.z_bins()[1].max_index, 1);

        // ...but only the on-screen one owns any tile bits.
        let off_screen_position = output
            .sorted_light_indices()
            .iter()
            .position(|&g| g == 1)
            .unwrap();
        let grid = output.grid();
        for tile_y in 0..grid.tiles_y {
            for tile_x in 0..grid.tiles_x {
                assert!(!output.tile_contains(tile_x, tile_y, off_screen_position));
            }
        }
    }

    #[test]
    fn scratch_reuse_does_not_leak_previous_frame() {
        let mut frame = CullingFrame::new(64, 64);
        frame.cull(
            &[
                light(0, Vec3::new(0.0, 0.0, -10.0), 2.0),
                light(1, Vec3::new(1.0, 1.0, -30.0), 4.0),
            ],
            &scenario_camera(),
        );

        let output = frame.cull(&[], &scenario_camera());
        assert_eq!(output.light_count(), 0);
        for bin in output.z_bins() {
            assert!(bin.is_empty());
        }
        assert!(output.tile_words().iter().all(|&w| w == 0));
    }

    #[test]
    fn resize_rebuilds_the_tile_grid() {
        let mut frame = CullingFrame::new(64, 64);
        frame.cull(&[], &scenario_camera());
        assert_eq!(frame.output().grid().tiles_x, 8);

        frame.resize_canvas(128, 40);
        let output = frame.cull(&[], &scenario_camera());
        assert_eq!((output.grid().tiles_x, output.grid().tiles_y), (16, 5));
        assert_eq!(output.tile_words().len(), output.grid().word_count());
    }

    #[test]
    fn z_bin_coverage_property_holds_end_to_end() {
        let lights = [
            light(0, Vec3::new(0.0, 0.0, -3.0), 1.0),
            light(1, Vec3::new(2.0, 1.0, -15.0), 8.0),
            light(2, Vec3::new(-4.0, 0.0, -40.0), 30.0),
            light(3, Vec3::new(0.0, 3.0, -90.0), 5.0),
        ];
        let camera = scenario_camera();
        let mut frame = CullingFrame::new(64, 64);
        let output = frame.cull(&lights, &camera);

        // Recompute each light's normalized extent independently and
        // check every overlapping bin covers its sorted position.
        let bin_size = 1.0 / NUM_Z_BINS as f32;
        for (position, &global) in output.sorted_light_indices().iter().enumerate() {
            let source = lights.iter().find(|l| l.global_index == global).unwrap();
            let depth = -camera.view.transform_point3(source.world_position).z;
            let z_min = (depth - source.range - camera.near) / (camera.far - camera.near);
            let z_max = (depth + source.range - camera.near) / (camera.far - camera.near);

            for (bin_index, bin) in output.z_bins().iter().enumerate() {
                let bin_min = bin_size * bin_index as f32;
                let bin_max = bin_min + bin_size;
                if z_min <= bin_max && z_max >= bin_min {
                    assert!(
                        bin.min_index as usize <= position
                            && position <= bin.max_index as usize,
                        "light {global} missing from bin {bin_index}"
                    );
                }
            }
        }
    }
}
