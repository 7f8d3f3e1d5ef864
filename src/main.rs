use anyhow::{Context, Result};
use log::info;

use orbit_scene::{AppConfig, FrameReport, HeadlessBackend, NativeBackend, WindowInitError};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = AppConfig::from_env().context("invalid environment configuration")?;

    let report = if config.headless {
        run_headless(&config)
    } else {
        match NativeBackend::new(&config) {
            Ok(mut backend) => orbit_scene::run(&mut backend, &config),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to headless mode (set DISPLAY or install X11/Wayland libs to enable rendering)."
                    );
                    run_headless(&config)
                } else {
                    return Err(err);
                }
            }
        }
    };

    print_report(&report);
    Ok(())
}

fn run_headless(config: &AppConfig) -> FrameReport {
    info!(
        "running {} headless frame(s) at {:.4}s each",
        config.headless_frames, config.headless_frame_delta
    );
    let mut backend = HeadlessBackend::with_frame_budget(config.headless_frames)
        .with_frame_delta(config.headless_frame_delta)
        .with_recording(false);
    orbit_scene::run(&mut backend, config)
}

fn print_report(report: &FrameReport) {
    let position = report.camera.position;
    println!("Rendered {} frame(s)", report.frames);
    println!("Final orbit angle: {:.4} rad", report.angle);
    println!(
        "Final camera position=({:.2}, {:.2}, {:.2})",
        position.x, position.y, position.z
    );
}
