use flecs_ecs::macros::Component;
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LightKind {
    Directional,
    #[default]
    Omni,
    Spot,
}

/// A scene light. `position` is world space, synced from the entity's
/// `GlobalTransform` once per frame; edit the `Transform` to move a light.
#[derive(Component, Clone, Debug)]
pub struct LightComponent {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// Influence radius in world units; must be > 0 for a cullable light.
    pub range: f32,
    pub direction: Vec3,
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
    pub enabled: bool,
    /// Stable slot in the light-parameter buffer, assigned at spawn.
    pub global_index: u32,
    pub position: Vec3,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            kind: LightKind::Omni,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            direction: -Vec3::Y,
            inner_cone_angle: 0.0,
            outer_cone_angle: std::f32::consts::FRAC_PI_4,
            enabled: true,
            global_index: 0,
            position: Vec3::ZERO,
        }
    }
}

impl LightComponent {
    pub fn omni(global_index: u32, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            global_index,
            color,
            intensity,
            range,
            ..Default::default()
        }
    }

    pub fn spot(
        global_index: u32,
        color: Vec3,
        intensity: f32,
        range: f32,
        direction: Vec3,
        inner_cone_angle: f32,
        outer_cone_angle: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot,
            global_index,
            color,
            intensity,
            range,
            direction,
            inner_cone_angle,
            outer_cone_angle,
            ..Default::default()
        }
    }

    pub fn directional(global_index: u32, color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            global_index,
            color,
            intensity,
            range: 0.0,
            direction,
            ..Default::default()
        }
    }

    /// Only positional lights with a positive influence radius go through
    /// the clustered culler; directional lights are applied globally.
    pub fn is_cullable(&self) -> bool {
        matches!(self.kind, LightKind::Omni | LightKind::Spot) && self.range > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_lights_are_not_cullable() {
        let light = LightComponent::directional(0, Vec3::ONE, 5.0, -Vec3::Y);
        assert!(!light.is_cullable());
    }

    #[test]
    fn zero_range_omni_is_not_cullable() {
        let mut light = LightComponent::omni(0, Vec3::ONE, 5.0, 4.0);
        assert!(light.is_cullable());
        light.range = 0.0;
        assert!(!light.is_cullable());
    }
}
