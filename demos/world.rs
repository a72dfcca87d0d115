use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_isosurface::{
    Algorithm, IsosurfacePlugin, Volume,
    scene::{DEMO_BOUNDS, demo_world},
};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

const DIGITS: [KeyCode; 8] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
];

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            IsosurfacePlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, select_algorithm)
        .run();
}

fn setup(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 400.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0., 40., 70.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    // The world is modelled z-up; stand it on the grid.
    commands.spawn((
        Volume::new(demo_world()).with_bounds(DEMO_BOUNDS),
        MeshMaterial3d(materials.add(Color::srgb(0.8, 0.7, 0.6))),
        Transform::from_rotation(Quat::from_rotation_x(-90.0_f32.to_radians()))
            .with_translation(Vec3::Y * 16.0),
    ));

    info!("press 1-8 to switch algorithm");
}

fn select_algorithm(keys: Res<ButtonInput<KeyCode>>, mut volumes: Query<&mut Volume>) {
    let Some(digit) = DIGITS.iter().position(|key| keys.just_pressed(*key)) else {
        return;
    };
    let Some(algorithm) = Algorithm::from_digit(digit as u32 + 1) else {
        return;
    };

    info!("switching to {algorithm}");
    for mut volume in &mut volumes {
        volume.algorithm = algorithm;
    }
}
