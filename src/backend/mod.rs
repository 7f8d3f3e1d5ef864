//! Collaborator interfaces consumed by the scene.
//!
//! The scene never talks to a window system or GPU directly. It drives three
//! small traits instead, so the same per-frame logic runs against the wgpu
//! renderer in [`crate::render::native`] or against the
//! [`headless::HeadlessBackend`] used for tests and display-less machines.

pub mod headless;

use std::path::Path;

use glam::Vec3;

use crate::camera::Camera;
use crate::color::Color;

/// Opaque identifier of a shader program owned by a backend.
///
/// Handle `0` is the backend's built-in default program, returned whenever a
/// custom program could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

impl ShaderHandle {
    pub const DEFAULT: Self = Self(0);

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

impl Default for ShaderHandle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Backend-assigned slot of a uniform inside a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    pub const INVALID: Self = Self(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for UniformLocation {
    fn default() -> Self {
        Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
}

/// Value written into a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Int(_) => UniformKind::Int,
            Self::Float(_) => UniformKind::Float,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
        }
    }

    /// Native-endian bytes as they are laid out in a uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Int(value) => bytemuck::bytes_of(value),
            Self::Float(value) => bytemuck::bytes_of(value),
            Self::Vec3(value) => bytemuck::bytes_of(value),
            Self::Vec4(value) => bytemuck::bytes_of(value),
        }
    }
}

/// Window surface, frame bracketing and frame clock.
pub trait WindowBackend {
    /// Processes pending window events and reports whether the user asked to
    /// close the window.
    fn should_close(&mut self) -> bool;
    fn begin_frame(&mut self);
    fn end_frame(&mut self);
    fn clear(&mut self, color: Color);
    /// Seconds elapsed during the previous frame.
    fn frame_delta_seconds(&self) -> f32;
}

/// Shader program loading and uniform upload.
///
/// None of these operations fail loudly. A program that cannot be loaded
/// comes back as [`ShaderHandle::DEFAULT`], unknown uniform names resolve to
/// [`UniformLocation::INVALID`], and writes to invalid locations are dropped.
pub trait ShaderBackend {
    fn load_shader(&mut self, vertex: &Path, fragment: &Path) -> ShaderHandle;
    fn uniform_location(&self, shader: ShaderHandle, name: &str) -> UniformLocation;
    fn set_uniform(&mut self, shader: ShaderHandle, location: UniformLocation, value: UniformValue);
}

/// Immediate-mode draw calls.
pub trait DrawBackend {
    fn begin_mode_3d(&mut self, camera: &Camera);
    fn end_mode_3d(&mut self);
    fn begin_shader_mode(&mut self, shader: ShaderHandle);
    fn end_shader_mode(&mut self);
    fn draw_cube(&mut self, center: Vec3, width: f32, height: f32, depth: f32, color: Color);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: i32, color: Color);

    /// Runs `draw` inside a 3D block seen through `camera` and shaded by
    /// `shader`, closing both modes afterwards.
    fn draw_scene<F>(&mut self, camera: &Camera, shader: ShaderHandle, draw: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.begin_mode_3d(camera);
        self.begin_shader_mode(shader);
        draw(self);
        self.end_shader_mode();
        self.end_mode_3d();
    }
}

/// Everything the frame loop needs from a platform.
pub trait Backend: WindowBackend + ShaderBackend + DrawBackend {}

impl<T> Backend for T where T: WindowBackend + ShaderBackend + DrawBackend + ?Sized {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_location_is_negative() {
        assert!(!UniformLocation::INVALID.is_valid());
        assert!(UniformLocation(0).is_valid());
        assert_eq!(UniformLocation::default(), UniformLocation::INVALID);
    }

    #[test]
    fn uniform_bytes_match_value_width() {
        assert_eq!(UniformValue::Int(1).as_bytes().len(), 4);
        assert_eq!(UniformValue::Vec3([1.0, 2.0, 3.0]).as_bytes().len(), 12);
        assert_eq!(UniformValue::Vec4([0.0; 4]).as_bytes().len(), 16);
        assert_eq!(UniformValue::Vec3([0.0; 3]).kind(), UniformKind::Vec3);
    }
}
