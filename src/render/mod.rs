//! GPU-side pieces: the wgpu backend and the data it uploads.

pub(crate) mod common;
pub mod font;
pub mod native;
pub mod uniforms;

pub use native::{NativeBackend, WindowInitError};
pub use uniforms::{LightUniform, LightingUniforms, UniformBlock, MAX_LIGHTS};
