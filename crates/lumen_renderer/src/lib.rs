use bytemuck::Zeroable;
use flecs_ecs::prelude::*;
use lumen_core::{
    App, Plugin,
    camera::{Camera, Canvas},
    pipeline::{PhaseCull, PhaseRender3D},
    transform::GlobalTransform,
};
use lumen_culling::{CameraFrame, CullableLight, CullingFrame, MAX_LIGHTS};
use lumen_scene::LightComponent;

mod cluster;
mod context;

pub use cluster::{ClusterResources, CullingParams, GpuLight};
pub use context::{RenderContext, RenderInitError};

/// Per-frame clustered light culling state. Singleton; present with or
/// without a GPU so the culler stays testable headless.
#[derive(Component)]
pub struct ClusterLighting {
    pub frame: CullingFrame,
    snapshot: Vec<CullableLight>,
}

impl ClusterLighting {
    pub fn new(canvas: &Canvas) -> Self {
        Self {
            frame: CullingFrame::new(canvas.width, canvas.height),
            snapshot: Vec::with_capacity(MAX_LIGHTS),
        }
    }

    fn sync_canvas(&mut self, canvas: &Canvas) {
        let grid = self.frame.output().grid();
        if grid.width != canvas.width || grid.height != canvas.height {
            self.frame.resize_canvas(canvas.width, canvas.height);
        }
    }
}

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.world
            .component::<ClusterLighting>()
            .add_trait::<flecs::Singleton>();
        app.world
            .component::<RenderContext>()
            .add_trait::<flecs::Singleton>();
        app.world
            .component::<ClusterResources>()
            .add_trait::<flecs::Singleton>();

        register_startup(app);
        register_culling(app);
        register_upload(app);
    }
}

fn register_startup(app: &mut App) {
    app.world
        .system_named::<&Canvas>("init cluster renderer")
        .kind(flecs::pipeline::OnStart)
        .each_entity(|entity, canvas| {
            let world = entity.world();
            world.set(ClusterLighting::new(canvas));

            match RenderContext::new_headless() {
                Ok(context) => {
                    let grid = lumen_culling::TileGrid::new(canvas.width, canvas.height);
                    world.set(ClusterResources::new(&context.device, grid));
                    world.set(context);
                    log::info!(
                        "cluster renderer online ({}x{})",
                        canvas.width,
                        canvas.height
                    );
                }
                Err(e) => {
                    // CPU culling still runs; only the upload is off.
                    log::warn!("no GPU device, cluster upload disabled: {e}");
                }
            }
        });
}

/// Snapshot -> sort -> Z bins -> sorted indices -> tile bitmasks, once per
/// frame on the prepare thread.
fn register_culling(app: &mut App) {
    let light_query = app.world.query::<&LightComponent>().set_cached().build();

    app.world
        .system::<(&Camera, &GlobalTransform, &Canvas, &mut ClusterLighting)>()
        .named("Cluster Culling")
        .kind(PhaseCull)
        .each(move |(camera, cam_transform, canvas, culling)| {
            culling.sync_canvas(canvas);

            let snapshot = &mut culling.snapshot;
            snapshot.clear();
            light_query.each(|light| {
                if !light.is_cullable() {
                    return;
                }
                snapshot.push(CullableLight {
                    global_index: light.global_index,
                    world_position: light.position,
                    range: light.range,
                    enabled: light.enabled,
                });
            });

            let frame_camera = CameraFrame {
                view: camera.compute_view_matrix(cam_transform),
                projection: camera.compute_projection_matrix(),
                near: camera.near,
                far: camera.far,
            };
            culling.frame.cull(&culling.snapshot, &frame_camera);
        });
}

fn register_upload(app: &mut App) {
    let light_query = app.world.query::<&LightComponent>().set_cached().build();

    app.world
        .system::<(&ClusterLighting, &RenderContext, &mut ClusterResources)>()
        .named("Upload Cluster Buffers")
        .kind(PhaseRender3D)
        .each(move |(culling, context, resources)| {
            let output = culling.frame.output();
            if !resources.matches(output.grid()) {
                *resources = ClusterResources::new(&context.device, output.grid());
            }
            resources.upload(&context.queue, output);

            let mut params = vec![GpuLight::zeroed(); MAX_LIGHTS];
            light_query.each(|light| {
                let slot = light.global_index as usize;
                if slot < params.len() {
                    params[slot] = GpuLight::from_component(light);
                }
            });
            resources.upload_light_params(&context.queue, &params);
        });
}
