use log::info;

use crate::backend::Backend;
use crate::camera::Camera;
use crate::color::Color;
use crate::config::AppConfig;
use crate::scene::Scene;

const BACKGROUND: Color = Color::BLUE;
const OVERLAY_TEXT: &str = "HELLO WORLD";
const OVERLAY_POSITION: (i32, i32) = (100, 100);
const OVERLAY_SIZE: i32 = 50;
const OVERLAY_COLOR: Color = Color::RAYWHITE;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frames: u64,
    pub angle: f32,
    pub camera: Camera,
}

/// Runs frames until the backend asks to close.
pub fn run<B>(backend: &mut B, config: &AppConfig) -> FrameReport
where
    B: Backend,
{
    let mut scene = Scene::awake(backend, &config.vertex_shader, &config.fragment_shader);
    let mut frames = 0;
    while !backend.should_close() {
        render_frame(backend, &mut scene);
        frames += 1;
    }
    info!(
        "stopped after {frames} frame(s) at orbit angle {:.4}",
        scene.angle()
    );
    FrameReport {
        frames,
        angle: scene.angle(),
        camera: *scene.camera(),
    }
}

/// One iteration of the main loop.
pub fn render_frame<B>(backend: &mut B, scene: &mut Scene)
where
    B: Backend,
{
    backend.begin_frame();
    backend.clear(BACKGROUND);
    let delta = backend.frame_delta_seconds();
    scene.update(backend, delta);
    let (x, y) = OVERLAY_POSITION;
    backend.draw_text(OVERLAY_TEXT, x, y, OVERLAY_SIZE, OVERLAY_COLOR);
    backend.end_frame();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{BackendCall, HeadlessBackend};

    #[test]
    fn run_stops_when_backend_closes() {
        let mut backend = HeadlessBackend::with_frame_budget(3).with_frame_delta(0.5);
        let report = run(&mut backend, &AppConfig::default());
        assert_eq!(report.frames, 3);
        assert!((report.angle - 1.5 * std::f32::consts::PI).abs() < 1e-5);
        assert_eq!(report.camera, crate::camera::compute_camera(report.angle));
    }

    #[test]
    fn frame_is_bracketed_and_overlaid() {
        let mut backend = HeadlessBackend::with_frame_budget(1);
        run(&mut backend, &AppConfig::default());
        let calls = backend.calls();
        let begin = calls
            .iter()
            .position(|call| *call == BackendCall::BeginFrame)
            .unwrap();
        assert_eq!(calls[begin + 1], BackendCall::Clear(Color::BLUE));
        assert_eq!(calls.last(), Some(&BackendCall::EndFrame));
        assert_eq!(
            calls[calls.len() - 2],
            BackendCall::DrawText {
                text: "HELLO WORLD".to_string(),
                x: 100,
                y: 100,
                size: 50,
                color: Color::RAYWHITE,
            }
        );
    }
}
