use glam::{Mat4, Vec3};

use crate::MAX_LIGHTS;

/// Frame-coherent camera state, captured once before culling starts.
#[derive(Clone, Copy, Debug)]
pub struct CameraFrame {
    pub view: Mat4,
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
}

/// One light as the scene store exposes it to the culler.
#[derive(Clone, Copy, Debug)]
pub struct CullableLight {
    /// Stable identity: slot in the light-parameter buffer the shading
    /// pass fetches full light data from.
    pub global_index: u32,
    pub world_position: Vec3,
    pub range: f32,
    pub enabled: bool,
}

/// Snapshot entry, rebuilt every frame; lives only for one frame's
/// computation and is indexed by *position* after sorting.
#[derive(Clone, Copy, Debug)]
pub struct SortedLight {
    pub global_index: u32,
    pub view_position: Vec3,
    pub range: f32,
    /// Light center depth, normalized to [0,1] over [near, far].
    pub projected_z: f32,
    /// Depth of the near extent (`depth - range`), same normalization.
    /// Invariant: `projected_z_min <= projected_z <= projected_z_max`.
    pub projected_z_min: f32,
    pub projected_z_max: f32,
}

/// Fills `sorted` with the enabled lights, view-transformed and depth
/// normalized, in store iteration order. Everything past `MAX_LIGHTS`
/// is dropped with a warning.
pub(crate) fn collect_lights(
    sorted: &mut Vec<SortedLight>,
    lights: &[CullableLight],
    camera: &CameraFrame,
) {
    sorted.clear();
    let depth_range = camera.far - camera.near;
    for light in lights {
        if !light.enabled {
            continue;
        }
        if sorted.len() == MAX_LIGHTS {
            log::warn!("light snapshot full, truncating at {MAX_LIGHTS} lights");
            break;
        }

        let view_position = camera.view.transform_point3(light.world_position);
        // Right-handed view space looks down -Z, so depth along the view
        // ray is -z. The range extents are 1-D depth shifts, not
        // re-transforms of a 3-D point.
        let depth = -view_position.z;
        let project = |d: f32| (d - camera.near) / depth_range;

        sorted.push(SortedLight {
            global_index: light.global_index,
            view_position,
            range: light.range,
            projected_z: project(depth),
            projected_z_min: project(depth - light.range),
            projected_z_max: project(depth + light.range),
        });
    }
}

/// Ascending by projected depth. Unstable: equal keys may land in any
/// order. `total_cmp` keeps the comparator a total order even for NaN.
pub(crate) fn sort_by_depth(sorted: &mut [SortedLight]) {
    sorted.sort_unstable_by(|a, b| a.projected_z.total_cmp(&b.projected_z));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at_origin() -> CameraFrame {
        CameraFrame {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(90.0f32.to_radians(), 1.0, 0.1, 100.0),
            near: 0.1,
            far: 100.0,
        }
    }

    fn light(global_index: u32, z: f32, range: f32) -> CullableLight {
        CullableLight {
            global_index,
            world_position: Vec3::new(0.0, 0.0, z),
            range,
            enabled: true,
        }
    }

    #[test]
    fn disabled_lights_do_not_occupy_slots() {
        let mut disabled = light(7, -10.0, 2.0);
        disabled.enabled = false;
        let lights = [light(3, -10.0, 2.0), disabled, light(4, -20.0, 2.0)];

        let mut sorted = Vec::new();
        collect_lights(&mut sorted, &lights, &camera_at_origin());

        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].global_index, 3);
        assert_eq!(sorted[1].global_index, 4);
    }

    #[test]
    fn projected_depth_matches_normalization() {
        // Light at view depth 10 with near=0.1, far=100:
        // (10 - 0.1) / 99.9 = 0.09910
        let lights = [light(0, -10.0, 2.0)];
        let mut sorted = Vec::new();
        collect_lights(&mut sorted, &lights, &camera_at_origin());

        let entry = &sorted[0];
        assert!((entry.projected_z - 0.0991).abs() < 1e-3);
        assert!((entry.projected_z_min - (8.0 - 0.1) / 99.9).abs() < 1e-6);
        assert!((entry.projected_z_max - (12.0 - 0.1) / 99.9).abs() < 1e-6);
        assert!(entry.projected_z_min <= entry.projected_z);
        assert!(entry.projected_z <= entry.projected_z_max);
    }

    #[test]
    fn snapshot_truncates_at_capacity() {
        let lights: Vec<_> = (0..MAX_LIGHTS as u32 + 16)
            .map(|i| light(i, -1.0 - i as f32 * 0.1, 1.0))
            .collect();

        let mut sorted = Vec::new();
        collect_lights(&mut sorted, &lights, &camera_at_origin());

        assert_eq!(sorted.len(), MAX_LIGHTS);
        // Acceptance follows store order, so the overflow lights are the
        // ones at the tail.
        assert_eq!(sorted.last().unwrap().global_index, MAX_LIGHTS as u32 - 1);
    }

    #[test]
    fn sort_orders_by_projected_depth() {
        let lights = [
            light(0, -30.0, 1.0),
            light(1, -5.0, 1.0),
            light(2, -80.0, 1.0),
            light(3, -5.0, 2.0),
        ];
        let mut sorted = Vec::new();
        collect_lights(&mut sorted, &lights, &camera_at_origin());
        sort_by_depth(&mut sorted);

        for pair in sorted.windows(2) {
            assert!(pair[0].projected_z <= pair[1].projected_z);
        }
        assert_eq!(sorted[0].global_index, 1);
        assert_eq!(sorted[3].global_index, 2);
    }

    #[test]
    fn view_matrix_is_applied() {
        // Camera shifted +5 on X: a light at the origin sits at -5 in
        // view space.
        let camera = CameraFrame {
            view: Mat4::from_translation(Vec3::new(-5.0, 0.0, 0.0)),
            ..camera_at_origin()
        };
        let lights = [light(0, 0.0, 1.0)];
        let mut sorted = Vec::new();
        collect_lights(&mut sorted, &lights, &camera);

        assert!((sorted[0].view_position.x - (-5.0)).abs() < 1e-6);
    }
}
