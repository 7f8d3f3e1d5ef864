//! Display-less backend that records every call it receives.
//!
//! Used when no window can be opened and as the observable stand-in for the
//! GPU backend in tests. Uniform writes go into a CPU [`UniformBlock`] per
//! program so their effect can be inspected afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use log::{debug, warn};

use crate::backend::{
    DrawBackend, ShaderBackend, ShaderHandle, UniformLocation, UniformValue, WindowBackend,
};
use crate::camera::Camera;
use crate::color::Color;
use crate::render::uniforms::{self, UniformBlock};

const DEFAULT_FRAME_DELTA: f32 = 1.0 / 60.0;

/// One call observed by the [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    BeginFrame,
    EndFrame,
    Clear(Color),
    LoadShader {
        vertex: PathBuf,
        fragment: PathBuf,
        handle: ShaderHandle,
    },
    SetUniform {
        shader: ShaderHandle,
        location: UniformLocation,
        value: UniformValue,
    },
    BeginMode3d(Camera),
    EndMode3d,
    BeginShaderMode(ShaderHandle),
    EndShaderMode,
    DrawCube {
        center: Vec3,
        size: Vec3,
        color: Color,
    },
    DrawText {
        text: String,
        x: i32,
        y: i32,
        size: i32,
        color: Color,
    },
}

#[derive(Debug)]
struct HeadlessProgram {
    source: String,
    uniforms: UniformBlock,
}

/// Backend that runs a fixed number of frames at a fixed frame delta.
#[derive(Debug)]
pub struct HeadlessBackend {
    frame_budget: Option<u64>,
    frames_completed: u64,
    frame_delta: f32,
    programs: Vec<HeadlessProgram>,
    recording: bool,
    calls: Vec<BackendCall>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Backend that never asks to close on its own.
    pub fn new() -> Self {
        Self {
            frame_budget: None,
            frames_completed: 0,
            frame_delta: DEFAULT_FRAME_DELTA,
            programs: Vec::new(),
            recording: true,
            calls: Vec::new(),
        }
    }

    /// Backend that reports `should_close` once `frames` frames have ended.
    pub fn with_frame_budget(frames: u64) -> Self {
        Self {
            frame_budget: Some(frames),
            ..Self::new()
        }
    }

    pub fn with_frame_delta(mut self, delta: f32) -> Self {
        self.frame_delta = delta;
        self
    }

    /// Turns the call log on or off. Uniform storage and frame counting keep
    /// working either way.
    pub fn with_recording(mut self, recording: bool) -> Self {
        self.recording = recording;
        self
    }

    /// Adds a program compiled from `source` without touching the file
    /// system.
    pub fn register_shader(&mut self, source: impl Into<String>) -> ShaderHandle {
        self.programs.push(HeadlessProgram {
            source: source.into(),
            uniforms: UniformBlock::new(),
        });
        ShaderHandle(self.programs.len() as u32)
    }

    /// Uniform storage of a loaded program; `None` for the default program.
    pub fn uniforms(&self, shader: ShaderHandle) -> Option<&UniformBlock> {
        self.program(shader).map(|program| &program.uniforms)
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, call: BackendCall) {
        if self.recording {
            self.calls.push(call);
        }
    }

    fn program(&self, shader: ShaderHandle) -> Option<&HeadlessProgram> {
        let index = usize::try_from(shader.0).ok()?.checked_sub(1)?;
        self.programs.get(index)
    }

    fn program_mut(&mut self, shader: ShaderHandle) -> Option<&mut HeadlessProgram> {
        let index = usize::try_from(shader.0).ok()?.checked_sub(1)?;
        self.programs.get_mut(index)
    }
}

impl WindowBackend for HeadlessBackend {
    fn should_close(&mut self) -> bool {
        self.frame_budget
            .is_some_and(|budget| self.frames_completed >= budget)
    }

    fn begin_frame(&mut self) {
        self.record(BackendCall::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.record(BackendCall::EndFrame);
        self.frames_completed += 1;
    }

    fn clear(&mut self, color: Color) {
        self.record(BackendCall::Clear(color));
    }

    fn frame_delta_seconds(&self) -> f32 {
        self.frame_delta
    }
}

impl ShaderBackend for HeadlessBackend {
    fn load_shader(&mut self, vertex: &Path, fragment: &Path) -> ShaderHandle {
        let handle = match (fs::read_to_string(vertex), fs::read_to_string(fragment)) {
            (Ok(vertex_source), Ok(fragment_source)) => {
                self.register_shader(vertex_source + "\n" + &fragment_source)
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("failed to read shader stage: {err}");
                ShaderHandle::DEFAULT
            }
        };
        self.record(BackendCall::LoadShader {
            vertex: vertex.to_path_buf(),
            fragment: fragment.to_path_buf(),
            handle,
        });
        handle
    }

    fn uniform_location(&self, shader: ShaderHandle, name: &str) -> UniformLocation {
        self.program(shader)
            .filter(|program| uniforms::source_declares(&program.source, name))
            .and_then(|_| uniforms::lookup(name))
            .unwrap_or(UniformLocation::INVALID)
    }

    fn set_uniform(&mut self, shader: ShaderHandle, location: UniformLocation, value: UniformValue) {
        self.record(BackendCall::SetUniform {
            shader,
            location,
            value,
        });
        let written = self
            .program_mut(shader)
            .is_some_and(|program| program.uniforms.write(location, value));
        if !written {
            debug!("dropped uniform write to {location:?} of program {}", shader.0);
        }
    }
}

impl DrawBackend for HeadlessBackend {
    fn begin_mode_3d(&mut self, camera: &Camera) {
        self.record(BackendCall::BeginMode3d(*camera));
    }

    fn end_mode_3d(&mut self) {
        self.record(BackendCall::EndMode3d);
    }

    fn begin_shader_mode(&mut self, shader: ShaderHandle) {
        self.record(BackendCall::BeginShaderMode(shader));
    }

    fn end_shader_mode(&mut self) {
        self.record(BackendCall::EndShaderMode);
    }

    fn draw_cube(&mut self, center: Vec3, width: f32, height: f32, depth: f32, color: Color) {
        self.record(BackendCall::DrawCube {
            center,
            size: Vec3::new(width, height, depth),
            color,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color) {
        self.record(BackendCall::DrawText {
            text: text.to_string(),
            x,
            y,
            size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_after_frame_budget() {
        let mut backend = HeadlessBackend::with_frame_budget(2);
        assert!(!backend.should_close());
        backend.begin_frame();
        backend.end_frame();
        assert!(!backend.should_close());
        backend.begin_frame();
        backend.end_frame();
        assert!(backend.should_close());
        assert_eq!(backend.frames_completed(), 2);
    }

    #[test]
    fn disabled_recording_keeps_uniforms_and_frame_count() {
        let mut backend = HeadlessBackend::with_frame_budget(3).with_recording(false);
        let handle = backend.register_shader("struct Lighting { viewPos: vec3<f32> }");
        let location = backend.uniform_location(handle, "viewPos");
        while !backend.should_close() {
            backend.begin_frame();
            backend.set_uniform(handle, location, UniformValue::Vec3([1.0, 2.0, 3.0]));
            backend.draw_cube(Vec3::ZERO, 1.0, 1.0, 1.0, Color::RED);
            backend.end_frame();
        }

        assert!(backend.calls().is_empty());
        assert_eq!(backend.frames_completed(), 3);
        assert_eq!(
            backend.uniforms(handle).unwrap().values().view_pos,
            [1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn unbounded_backend_never_closes() {
        let mut backend = HeadlessBackend::new();
        for _ in 0..10 {
            backend.end_frame();
        }
        assert!(!backend.should_close());
    }

    #[test]
    fn missing_files_yield_default_program() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.load_shader(
            Path::new("does/not/exist.vert.wgsl"),
            Path::new("does/not/exist.frag.wgsl"),
        );
        assert!(handle.is_default());
        assert_eq!(
            backend.uniform_location(handle, "viewPos"),
            UniformLocation::INVALID
        );
        assert!(backend.uniforms(handle).is_none());
    }

    #[test]
    fn lookups_require_declaration_in_source() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.register_shader("struct Lighting { viewPos: vec3<f32> }");
        assert!(backend.uniform_location(handle, "viewPos").is_valid());
        assert!(!backend.uniform_location(handle, "ambient").is_valid());
    }

    #[test]
    fn writes_to_default_program_are_recorded_but_dropped() {
        let mut backend = HeadlessBackend::new();
        backend.set_uniform(
            ShaderHandle::DEFAULT,
            UniformLocation(0),
            UniformValue::Vec3([1.0; 3]),
        );
        assert_eq!(backend.calls().len(), 1);
        assert!(backend.uniforms(ShaderHandle::DEFAULT).is_none());
    }
}
