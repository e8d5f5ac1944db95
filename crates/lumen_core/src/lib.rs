pub use flecs_ecs::prelude::*;

pub mod camera;
pub mod pipeline;
pub mod transform;

use crate::camera::Canvas;
use crate::transform::{GlobalTransform, Transform};

/// The Plugin Trait
/// Every module (Scene, Culling, Renderer) must implement this.
pub trait Plugin {
    fn build(&self, app: &mut App);
}

/// The Engine Application
/// Holds the ECS World and orchestrates the loop.
pub struct App {
    pub world: World,
}

impl App {
    pub fn new() -> Self {
        let mut world = World::new();
        pipeline::define_pipeline_stages(&mut world);

        world
            .component::<Canvas>()
            .add_trait::<flecs::Singleton>()
            .set(Canvas::default());

        let app = Self { world };
        app.register_transform_propagation();
        app
    }

    pub fn add_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        plugin.build(self);
        self
    }

    /// Processes ONE frame. The caller decides when to run; there is no
    /// run() that takes over the thread.
    pub fn update(&mut self) {
        self.world.progress();
    }

    fn register_transform_propagation(&self) {
        // Flat propagation: every light/camera here lives at the root, so
        // the world matrix is just the local one.
        self.world
            .system_named::<(&Transform, &mut GlobalTransform)>("transform propagation")
            .kind(flecs::pipeline::PostUpdate)
            .each(|(transform, global)| {
                global.0 = transform.compute_matrix();
            });
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
