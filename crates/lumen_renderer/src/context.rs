use flecs_ecs::macros::Component;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderInitError {
    #[error("adapter request failed: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// The GPU connection. Headless: culling runs against offscreen shading,
/// no surface or swapchain is involved.
#[derive(Component)]
pub struct RenderContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl RenderContext {
    pub fn new_headless() -> Result<Self, RenderInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        // We use 'pollster' to block on these async functions inside the
        // sync startup path.
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;

        Ok(Self { device, queue })
    }
}
