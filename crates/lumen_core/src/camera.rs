use flecs_ecs::macros::Component;
use glam::Mat4;

use crate::transform::GlobalTransform;

#[derive(Component, Clone, Debug)]
pub struct Camera {
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 45.0f32.to_radians(),
            aspect_ratio: 16.0 / 9.0, // Standard monitor
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Computes the "Projection Matrix" (View -> Clip)
    pub fn compute_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Computes the View Matrix (World -> View) from the camera's world
    /// transform. The camera looks down its local -Z.
    pub fn compute_view_matrix(&self, global: &GlobalTransform) -> Mat4 {
        let eye = global.position();
        let forward = -global.0.z_axis.truncate();
        let up = global.0.y_axis.truncate();
        Mat4::look_at_rh(eye, eye + forward, up)
    }
}

/// Render-target size in pixels. Singleton; resizing it is the canvas
/// resize event for everything downstream.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Canvas {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
