use bytemuck::{Pod, Zeroable};
use flecs_ecs::macros::Component;
use lumen_culling::{ClusterOutput, MAX_LIGHTS, NUM_Z_BINS, TILE_SIZE, TileGrid};
use lumen_scene::{LightComponent, LightKind};

/// Sizing constants the shading pass needs alongside the index buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CullingParams {
    pub canvas_size: [f32; 2],
    pub tile_counts: [u32; 2],
    pub tile_stride: u32,
    pub light_count: u32,
    pub z_bin_count: u32,
    pub tile_size: u32,
}

impl CullingParams {
    fn from_output(output: &ClusterOutput) -> Self {
        let grid = output.grid();
        Self {
            canvas_size: [grid.width as f32, grid.height as f32],
            tile_counts: [grid.tiles_x, grid.tiles_y],
            tile_stride: grid.tile_stride() as u32,
            light_count: output.light_count() as u32,
            z_bin_count: NUM_Z_BINS as u32,
            tile_size: TILE_SIZE,
        }
    }
}

/// Full light parameters, addressed by `global_index`. The shading pass
/// dereferences the sorted-index buffer into this array.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub range: f32,
    pub color: [f32; 3],
    pub intensity: f32,
    pub direction: [f32; 3],
    /// 0 = directional, 1 = omni, 2 = spot
    pub kind: u32,
    pub inner_cone_cos: f32,
    pub outer_cone_cos: f32,
    pub _padding: [f32; 2],
}

impl GpuLight {
    pub fn from_component(light: &LightComponent) -> Self {
        Self {
            position: light.position.to_array(),
            range: light.range,
            color: light.color.to_array(),
            intensity: light.intensity,
            direction: light.direction.to_array(),
            kind: match light.kind {
                LightKind::Directional => 0,
                LightKind::Omni => 1,
                LightKind::Spot => 2,
            },
            inner_cone_cos: light.inner_cone_angle.cos(),
            outer_cone_cos: light.outer_cone_angle.cos(),
            _padding: [0.0; 2],
        }
    }
}

/// Device-resident cluster buffers. Created once per canvas size; the
/// tile buffer length depends on the grid, so a resize rebuilds the set.
#[derive(Component)]
pub struct ClusterResources {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    sorted_light_buffer: wgpu::Buffer,
    z_bin_buffer: wgpu::Buffer,
    tile_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    light_param_buffer: wgpu::Buffer,
    grid: TileGrid,
}

impl ClusterResources {
    pub fn new(device: &wgpu::Device, grid: TileGrid) -> Self {
        let u32_size = std::mem::size_of::<u32>() as u64;

        let sorted_light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sorted Light Buffer"),
            size: u32_size * MAX_LIGHTS as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let z_bin_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light LUT Buffer"),
            size: u32_size * NUM_Z_BINS as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let tile_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Tile Buffer"),
            size: (u32_size * grid.word_count() as u64).max(u32_size),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Culling Params Buffer"),
            size: std::mem::size_of::<CullingParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_param_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Parameter Buffer"),
            size: std::mem::size_of::<GpuLight>() as u64 * MAX_LIGHTS as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cluster Bind Group Layout"),
            entries: &[
                // --- BINDING 0: Culling Params (Uniform) ---
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // --- BINDING 1..4: the culling outputs ---
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sorted_light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: z_bin_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: tile_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: light_param_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            sorted_light_buffer,
            z_bin_buffer,
            tile_buffer,
            params_buffer,
            light_param_buffer,
            grid,
        }
    }

    pub fn matches(&self, grid: TileGrid) -> bool {
        self.grid == grid
    }

    /// Copies one frame's culling outputs into the device buffers. The
    /// caller guarantees `output.grid()` matches the grid these buffers
    /// were created for.
    pub fn upload(&self, queue: &wgpu::Queue, output: &ClusterOutput) {
        if !output.sorted_light_indices().is_empty() {
            queue.write_buffer(
                &self.sorted_light_buffer,
                0,
                bytemuck::cast_slice(output.sorted_light_indices()),
            );
        }
        queue.write_buffer(&self.z_bin_buffer, 0, bytemuck::cast_slice(&output.z_bin_lut()));
        if !output.tile_words().is_empty() {
            queue.write_buffer(&self.tile_buffer, 0, bytemuck::cast_slice(output.tile_words()));
        }
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&CullingParams::from_output(output)),
        );
    }

    /// Uploads the `global_index`-addressed light parameter array.
    pub fn upload_light_params(&self, queue: &wgpu::Queue, lights: &[GpuLight]) {
        debug_assert!(lights.len() <= MAX_LIGHTS);
        if !lights.is_empty() {
            queue.write_buffer(&self.light_param_buffer, 0, bytemuck::cast_slice(lights));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn culling_params_are_gpu_aligned() {
        assert_eq!(std::mem::size_of::<CullingParams>() % 16, 0);
    }

    #[test]
    fn gpu_light_is_a_whole_number_of_vec4s() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 64);
    }

    #[test]
    fn gpu_light_carries_component_fields() {
        let light = LightComponent::spot(
            5,
            Vec3::new(1.0, 0.5, 0.25),
            40.0,
            12.0,
            -Vec3::Z,
            0.2,
            0.6,
        );
        let gpu = GpuLight::from_component(&light);
        assert_eq!(gpu.kind, 2);
        assert_eq!(gpu.range, 12.0);
        assert!((gpu.outer_cone_cos - 0.6f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn words_per_tile_matches_light_capacity() {
        // One bit per possible sorted position.
        assert_eq!(lumen_culling::WORDS_PER_TILE * 32, MAX_LIGHTS);
    }
}
