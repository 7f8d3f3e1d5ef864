use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn headless_run_prints_final_camera() {
    let mut cmd = Command::cargo_bin("orbit-scene").expect("binary exists");
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("ORBIT_SCENE_HEADLESS", "1")
        .env("ORBIT_SCENE_FRAMES", "60");
    cmd.assert()
        .success()
        .stdout(contains("Rendered 60 frame(s)"))
        .stdout(contains("Final orbit angle: 3.1416 rad"))
        .stdout(contains("Final camera position=(-10.00, 10.00,"));
}

#[test]
fn missing_shader_directory_is_not_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let mut cmd = Command::cargo_bin("orbit-scene").expect("binary exists");
    cmd.env("ORBIT_SCENE_HEADLESS", "true")
        .env("ORBIT_SCENE_FRAMES", "3")
        .env("ORBIT_SCENE_SHADER_DIR", dir.path());
    cmd.assert()
        .success()
        .stdout(contains("Rendered 3 frame(s)"));
}

#[test]
fn invalid_frame_count_is_rejected() {
    let mut cmd = Command::cargo_bin("orbit-scene").expect("binary exists");
    cmd.env("ORBIT_SCENE_HEADLESS", "1")
        .env("ORBIT_SCENE_FRAMES", "many");
    cmd.assert()
        .failure()
        .stderr(contains("ORBIT_SCENE_FRAMES"));
}
