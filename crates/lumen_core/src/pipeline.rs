use flecs_ecs::prelude::*;

/// Frame-constant preparation (light culling runs here, before any draw).
#[derive(Component)]
pub struct PhaseCull;

#[derive(Component)]
pub struct PhaseRender3D;

#[derive(Component)]
pub struct PhasePresent;

pub fn define_pipeline_stages(world: &mut World) {
    world
        .component::<PhaseCull>()
        .add(flecs::Phase)
        .depends_on(flecs::pipeline::OnStore);
    world
        .component::<PhaseRender3D>()
        .add(flecs::Phase)
        .depends_on(PhaseCull);
    world
        .component::<PhasePresent>()
        .add(flecs::Phase)
        .depends_on(PhaseRender3D);
}
