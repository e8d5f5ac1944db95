use flecs_ecs::prelude::*;
use lumen_core::{App, Plugin, transform::GlobalTransform};

pub mod light;

pub use light::{LightComponent, LightKind};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        register_light_sync(&app.world);
    }
}

/// Lights cache their world position so the culler and the GPU light
/// buffer read one field instead of re-deriving it from the matrix.
/// Runs after transform propagation (same phase, registered later).
pub fn register_light_sync(world: &World) {
    world
        .system_named::<(&GlobalTransform, &mut LightComponent)>("light position sync")
        .kind(flecs::pipeline::PostUpdate)
        .each(|(global, light)| {
            light.position = global.position();
        });
}
