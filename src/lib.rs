//! A small lit 3D scene: two stacked cubes under one point light, seen from a
//! camera orbiting the origin, with a text overlay on top.
//!
//! Frame logic only talks to the [`backend`] traits, so the same scene runs
//! against the wgpu window in [`render::native`] or the recording
//! [`backend::headless::HeadlessBackend`] used by tests and CI.

pub mod app;
pub mod backend;
pub mod camera;
pub mod color;
pub mod config;
pub mod light;
pub mod render;
pub mod scene;
pub mod shader;

pub use app::{run, FrameReport};
pub use backend::headless::{BackendCall, HeadlessBackend};
pub use backend::{
    Backend, DrawBackend, ShaderBackend, ShaderHandle, UniformKind, UniformLocation, UniformValue,
    WindowBackend,
};
pub use camera::{Camera, Projection};
pub use color::Color;
pub use config::{AppConfig, ConfigError};
pub use light::{Light, LightKind};
pub use render::{NativeBackend, WindowInitError};
pub use scene::Scene;
pub use shader::{SemanticLocation, Shader};
