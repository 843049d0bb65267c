//! Render/UI thread: a Bevy window drawing the front buffer
//!
//! Controls:
//! - Space: pause / resume physics
//! - Up / Down: speed up / slow down body 2 by 5% (an edit, pauses physics)
//! - U / R: undo / redo edits
//! - Escape: quit

use std::sync::Arc;

use bevy::log::LogPlugin;
use bevy::math::primitives::{Cuboid, Sphere};
use bevy::prelude::*;

use crate::simulation::controller::SimulationController;
use crate::simulation::exchange::{BufferBox, FrontBuffer};

/// World units per AU
const SCALE3D: f32 = 50.0;

/// World units per unit of display radius
const RADIUS_SCALE: f32 = 2.0;

/// Distance of the camera from the origin along +Z
const CAMERA_DISTANCE: f32 = 180.0;

/// Velocity change per key press on body 2
const NUDGE: f64 = 0.05;

/// Handles shared with the physics thread
#[derive(Resource)]
struct SimLink {
    buffers: Arc<BufferBox>,
    controller: Arc<SimulationController>,
}

/// Tags each sphere with its body index and the radius its mesh was built with
#[derive(Component)]
struct BodyMarker {
    index: usize,
    base_radius: f32,
}

/// Blocks until the window is closed, then asks the physics thread to stop
pub fn run_viewer(buffers: Arc<BufferBox>, controller: Arc<SimulationController>) {
    tracing::info!("starting Bevy viewer");

    App::new()
        .insert_resource(SimLink {
            buffers,
            controller: Arc::clone(&controller),
        })
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "pnsim".into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .disable::<LogPlugin>(),
        )
        .add_systems(Startup, setup_3d)
        .add_systems(Update, (keyboard_controls, sync_transforms_3d, update_title).chain())
        .run();

    controller.request_shutdown();
}

fn setup_3d(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    link: Res<SimLink>,
) {
    commands.spawn(Camera3dBundle {
        camera: Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.0, 0.0, 0.0)),
            ..Default::default()
        },
        transform: Transform::from_xyz(0.0, 40.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        ..Default::default()
    });

    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 1500.0,
            range: 1000.0,
            ..Default::default()
        },
        transform: Transform::from_xyz(0.0, 60.0, CAMERA_DISTANCE),
        ..Default::default()
    });

    spawn_axes(&mut commands, &mut meshes, &mut materials);

    let front = link.buffers.read_front_buffer();
    let colors = [Color::srgb(1.0, 0.85, 0.3), Color::srgb(0.3, 0.55, 1.0)];

    for (i, b) in front.bodies.iter().enumerate() {
        let base_radius = b.radius() as f32 * RADIUS_SCALE;
        commands.spawn((
            PbrBundle {
                mesh: meshes.add(Sphere::new(base_radius).mesh()),
                material: materials.add(StandardMaterial {
                    base_color: colors[i],
                    unlit: true,
                    ..Default::default()
                }),
                transform: Transform::from_translation(to_world(&front, i)),
                ..Default::default()
            },
            BodyMarker { index: i, base_radius },
        ));
    }
}

fn to_world(front: &FrontBuffer, i: usize) -> Vec3 {
    let x = front.bodies[i].x;
    Vec3::new(x.x as f32, x.y as f32, x.z as f32) * SCALE3D
}

fn keyboard_controls(keys: Res<ButtonInput<KeyCode>>, link: Res<SimLink>, mut exit: EventWriter<AppExit>) {
    let SimLink { buffers, controller } = &*link;

    if keys.just_pressed(KeyCode::Escape) {
        exit.send(AppExit::Success);
        return;
    }
    if keys.just_pressed(KeyCode::Space) {
        controller.toggle_pause();
    }

    let factor = if keys.just_pressed(KeyCode::ArrowUp) {
        Some(1.0 + NUDGE)
    } else if keys.just_pressed(KeyCode::ArrowDown) {
        Some(1.0 - NUDGE)
    } else {
        None
    };
    if let Some(factor) = factor {
        // Edits apply to a paused simulation
        controller.pause();
        let s = buffers.read_back_buffer();
        let edit = buffers.apply_edit([s.pos1(), s.pos2()], [s.vel1(), s.vel2() * factor], [s.m1, s.m2]);
        if edit.is_ok() {
            controller.clear_crash();
        }
    }

    let restored = if keys.just_pressed(KeyCode::KeyU) {
        buffers.undo()
    } else if keys.just_pressed(KeyCode::KeyR) {
        buffers.redo()
    } else {
        false
    };
    if restored {
        controller.pause();
        controller.clear_crash();
    }
}

fn sync_transforms_3d(link: Res<SimLink>, mut query: Query<(&BodyMarker, &mut Transform)>) {
    let front = link.buffers.read_front_buffer();

    for (marker, mut transform) in &mut query {
        if let Some(b) = front.bodies.get(marker.index) {
            transform.translation = to_world(&front, marker.index);
            // display radius follows mass edits
            let radius = b.radius() as f32 * RADIUS_SCALE;
            transform.scale = Vec3::splat(radius / marker.base_radius);
        }
    }
}

fn update_title(link: Res<SimLink>, mut windows: Query<&mut Window>) {
    let controller = &link.controller;
    let t = link.buffers.read_front_buffer().physics_time;

    let title = if controller.is_crashed() {
        format!("pnsim - CRASHED at t = {t:.3} yr (edit or undo to recover)")
    } else if controller.is_paused() {
        format!("pnsim - paused at t = {t:.3} yr")
    } else {
        format!("pnsim - t = {t:.3} yr")
    };

    for mut window in &mut windows {
        if window.title != title {
            window.title = title.clone();
        }
    }
}

fn spawn_axes(commands: &mut Commands, meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) {
    let axis_len = 4.0 * SCALE3D;
    let axis_thickness = 0.005 * SCALE3D;

    let axes = [
        (Cuboid::new(axis_len, axis_thickness, axis_thickness), Color::srgb(1.0, 0.0, 0.0)),
        (Cuboid::new(axis_thickness, axis_len, axis_thickness), Color::srgb(0.0, 1.0, 0.0)),
        (Cuboid::new(axis_thickness, axis_thickness, axis_len), Color::srgb(0.0, 0.0, 1.0)),
    ];

    for (cuboid, color) in axes {
        commands.spawn(PbrBundle {
            mesh: meshes.add(cuboid.mesh()),
            material: materials.add(StandardMaterial {
                base_color: color,
                unlit: true,
                ..Default::default()
            }),
            transform: Transform::from_xyz(0.0, 0.0, 0.0),
            ..Default::default()
        });
    }
}
