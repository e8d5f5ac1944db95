use flecs_ecs::core::WorldGet;
use glam::Vec3;
use lumen_core::{
    App,
    camera::{Camera, Canvas},
    transform::{GlobalTransform, Transform},
};
use lumen_culling::MAX_LIGHTS;
use lumen_renderer::{ClusterLighting, RenderPlugin};
use lumen_scene::{LightComponent, ScenePlugin};

/// More than the snapshot capacity, so a run always exercises the
/// truncation warning path.
const NUM_LIGHTS: u32 = 300;
const NUM_FRAMES: u32 = 8;

/// xorshift32; deterministic so every run bins the same field.
struct Rng(u32);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x >> 8) as f32 / (1 << 24) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

fn main() {
    env_logger::init();

    let mut app = App::new();
    app.world.set(Canvas {
        width: 1280,
        height: 720,
    });

    app.add_plugin(ScenePlugin);
    app.add_plugin(RenderPlugin);

    spawn_camera(&app);
    spawn_light_field(&app, NUM_LIGHTS);

    for _ in 0..NUM_FRAMES {
        app.update();
    }

    report_stats(&app);
}

fn spawn_camera(app: &App) {
    app.world.get::<&Canvas>(|canvas| {
        app.world
            .entity()
            .set(Transform::from_xyz(-4.0, 2.0, 0.3).looking_at(Vec3::ZERO, Vec3::Y))
            .set(GlobalTransform::default())
            .set(Camera {
                fov: 60.0f32.to_radians(),
                aspect_ratio: canvas.aspect_ratio(),
                ..Default::default()
            });
    });
}

/// Scatters omni and spot lights through a fixed bounding box around the
/// camera; deterministic so runs are comparable.
fn spawn_light_field(app: &App, count: u32) {
    let mut rng = Rng(0x9E37_79B9);
    let bounds_min = Vec3::new(-14.0, -1.0, -14.0);
    let bounds_max = Vec3::new(14.0, 9.0, 14.0);

    for i in 0..count {
        let position = Vec3::new(
            rng.range(bounds_min.x, bounds_max.x),
            rng.range(bounds_min.y, bounds_max.y),
            rng.range(bounds_min.z, bounds_max.z),
        );
        let color = Vec3::new(
            rng.range(0.0, 1.0),
            rng.range(0.0, 1.0),
            rng.range(0.0, 1.0),
        );
        let intensity = rng.range(1.0, 100.0);
        let range = rng.range(0.5, 8.0);

        let light = if rng.next_f32() < 0.5 {
            LightComponent::omni(i, color, intensity, range)
        } else {
            let inner = rng.range(0.1, 0.8);
            let outer = rng.range(inner, 1.4);
            LightComponent::spot(i, color, intensity, range, -Vec3::Y, inner, outer)
        };

        app.world
            .entity()
            .set(Transform::from_xyz(position.x, position.y, position.z))
            .set(GlobalTransform::default())
            .set(light);
    }

    log::info!("spawned {count} lights (snapshot capacity {MAX_LIGHTS})");
}

fn report_stats(app: &App) {
    app.world.get::<&ClusterLighting>(|culling| {
        let output = culling.frame.output();
        let grid = output.grid();

        let occupied_bins = output.z_bins().iter().filter(|bin| !bin.is_empty()).count();
        let mut occupied_tiles = 0u32;
        for tile_y in 0..grid.tiles_y {
            for tile_x in 0..grid.tiles_x {
                let base = grid.word_index(tile_x, tile_y, 0);
                let words = &output.tile_words()[base..base + lumen_culling::WORDS_PER_TILE];
                if words.iter().any(|&w| w != 0) {
                    occupied_tiles += 1;
                }
            }
        }

        log::info!(
            "culled {} lights | {occupied_bins}/{} z-bins occupied | {occupied_tiles}/{} tiles lit",
            output.light_count(),
            lumen_culling::NUM_Z_BINS,
            grid.tiles_x * grid.tiles_y,
        );
    });
}
