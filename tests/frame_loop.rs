use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use orbit_scene::camera::compute_camera;
use orbit_scene::render::uniforms;
use orbit_scene::{AppConfig, BackendCall, Color, HeadlessBackend, ShaderHandle, UniformLocation};
use tempfile::TempDir;

fn shipped_shader(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
}

fn shipped_config() -> AppConfig {
    AppConfig {
        vertex_shader: shipped_shader("lighting.vert.wgsl"),
        fragment_shader: shipped_shader("lighting.frag.wgsl"),
        ..AppConfig::default()
    }
}

/// Splits the recorded calls into one slice per frame.
fn frames(calls: &[BackendCall]) -> Vec<&[BackendCall]> {
    let mut frames = Vec::new();
    let mut start = None;
    for (index, call) in calls.iter().enumerate() {
        match call {
            BackendCall::BeginFrame => start = Some(index),
            BackendCall::EndFrame => {
                if let Some(begin) = start.take() {
                    frames.push(&calls[begin..=index]);
                }
            }
            _ => {}
        }
    }
    frames
}

#[test]
fn uniforms_and_camera_precede_every_draw() {
    let mut backend = HeadlessBackend::with_frame_budget(5);
    let report = orbit_scene::run(&mut backend, &shipped_config());
    assert_eq!(report.frames, 5);

    let frames = frames(backend.calls());
    assert_eq!(frames.len(), 5);
    for frame in frames {
        let first_draw = frame
            .iter()
            .position(|call| matches!(call, BackendCall::DrawCube { .. }))
            .expect("frame draws cubes");
        let last_uniform = frame
            .iter()
            .rposition(|call| matches!(call, BackendCall::SetUniform { .. }))
            .expect("frame uploads uniforms");
        let begin_3d = frame
            .iter()
            .position(|call| matches!(call, BackendCall::BeginMode3d(_)))
            .expect("frame enters 3D mode");
        let end_3d = frame
            .iter()
            .position(|call| *call == BackendCall::EndMode3d)
            .expect("frame leaves 3D mode");
        let text = frame
            .iter()
            .position(|call| matches!(call, BackendCall::DrawText { .. }))
            .expect("frame draws the overlay");

        assert!(last_uniform < first_draw);
        assert!(begin_3d < first_draw);
        assert!(end_3d < text, "overlay is drawn outside 3D mode");
        assert_eq!(frame[1], BackendCall::Clear(Color::BLUE));
    }
}

#[test]
fn light_and_view_uniforms_are_rewritten_before_each_frame_draws() {
    let mut backend = HeadlessBackend::with_frame_budget(4);
    orbit_scene::run(&mut backend, &shipped_config());

    let expected: Vec<(&str, UniformLocation)> = [
        "viewPos",
        "lights[0].enabled",
        "lights[0].type",
        "lights[0].position",
        "lights[0].target",
        "lights[0].color",
    ]
    .into_iter()
    .map(|name| (name, uniforms::lookup(name).expect("known uniform")))
    .collect();

    let frames = frames(backend.calls());
    assert_eq!(frames.len(), 4);
    for (index, frame) in frames.into_iter().enumerate() {
        let first_draw = frame
            .iter()
            .position(|call| matches!(call, BackendCall::DrawCube { .. }))
            .expect("frame draws cubes");
        let written: Vec<UniformLocation> = frame[..first_draw]
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetUniform { location, .. } => Some(*location),
                _ => None,
            })
            .collect();
        for (name, location) in &expected {
            assert!(
                written.contains(location),
                "frame {index} draws before writing {name}"
            );
        }
    }
}

#[test]
fn cubes_are_drawn_slab_first() {
    let mut backend = HeadlessBackend::with_frame_budget(1);
    orbit_scene::run(&mut backend, &shipped_config());
    let cubes: Vec<_> = backend
        .calls()
        .iter()
        .filter_map(|call| match call {
            BackendCall::DrawCube {
                center,
                size,
                color,
            } => Some((*center, *size, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        cubes,
        vec![
            (Vec3::ZERO, Vec3::new(4.0, 1.0, 4.0), Color::RED),
            (Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0), Color::BLACK),
        ]
    );
}

#[test]
fn shipped_shaders_receive_every_uniform() {
    let mut backend = HeadlessBackend::with_frame_budget(30).with_frame_delta(1.0 / 30.0);
    let report = orbit_scene::run(&mut backend, &shipped_config());

    let handle = backend
        .calls()
        .iter()
        .find_map(|call| match call {
            BackendCall::LoadShader { handle, .. } => Some(*handle),
            _ => None,
        })
        .expect("shader was loaded");
    assert!(!handle.is_default());

    let values = *backend.uniforms(handle).expect("program exists").values();
    let expected_view = compute_camera(report.angle).position.to_array();
    for (got, want) in values.view_pos.iter().zip(expected_view) {
        assert!((got - want).abs() < 1e-5);
    }
    assert_eq!(values.ambient, [0.1, 0.1, 0.1, 1.0]);

    let light = values.lights[0];
    assert_eq!(light.enabled, 1);
    assert_eq!(light.kind, 1);
    assert_eq!(light.position, [-5.0, 2.0, -5.0]);
    assert_eq!(light.target, [0.0, 0.0, 0.0]);
    assert_eq!(light.color, Color::YELLOW.to_normalized());
    assert_eq!(values.lights[1].enabled, 0);
}

#[test]
fn missing_shader_files_fall_back_to_default_program() {
    let dir = TempDir::new().expect("temp dir");
    let config = AppConfig {
        vertex_shader: dir.path().join("missing.vert.wgsl"),
        fragment_shader: dir.path().join("missing.frag.wgsl"),
        ..AppConfig::default()
    };
    let mut backend = HeadlessBackend::with_frame_budget(2);
    let report = orbit_scene::run(&mut backend, &config);

    assert_eq!(report.frames, 2);
    assert!(backend
        .calls()
        .iter()
        .any(|call| *call == BackendCall::BeginShaderMode(ShaderHandle::DEFAULT)));
    let cube_count = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::DrawCube { .. }))
        .count();
    assert_eq!(cube_count, 4);
}

#[test]
fn shaders_without_lights_still_track_the_camera() {
    let dir = TempDir::new().expect("temp dir");
    let vertex = dir.path().join("plain.vert.wgsl");
    let fragment = dir.path().join("plain.frag.wgsl");
    fs::write(&vertex, "struct Lighting { viewPos: vec3<f32>, }").expect("write vertex");
    fs::write(&fragment, "// unlit").expect("write fragment");

    let config = AppConfig {
        vertex_shader: vertex,
        fragment_shader: fragment,
        ..AppConfig::default()
    };
    let mut backend = HeadlessBackend::with_frame_budget(1);
    let report = orbit_scene::run(&mut backend, &config);

    let handle = ShaderHandle(1);
    let values = *backend.uniforms(handle).expect("program exists").values();
    assert_eq!(values.view_pos, report.camera.position.to_array());
    assert_eq!(values.ambient, [0.0; 4]);
    assert_eq!(values.lights[0].enabled, 0);
}
