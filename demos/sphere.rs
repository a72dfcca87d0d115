use bevy::{
    pbr::wireframe::{Wireframe, WireframeConfig},
    prelude::*,
};
use bevy_isosurface::{
    Algorithm, IsosurfacePlugin, Volume,
    field::sphere,
    types::{Bounds, Point, Vector},
};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            // #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
            IsosurfacePlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: true,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    const RESOLUTION: f32 = 16.0;

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(RESOLUTION * -1.2, RESOLUTION * 1.4, RESOLUTION * -1.2)
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Volume::new(sphere(RESOLUTION / 4.0))
            .with_bounds(Bounds::centered(Point::origin(), Vector::repeat(RESOLUTION)))
            .with_algorithm(Algorithm::SurfaceNets),
        Wireframe,
    ));
}
