use std::path::Path;

use log::{info, warn};

use crate::backend::{ShaderBackend, ShaderHandle, UniformLocation, UniformValue};

/// Well-known uniform roles a program can bind a location to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticLocation {
    /// Camera position in world space (`viewPos`).
    VectorView,
    /// Constant ambient light color (`ambient`).
    ColorAmbient,
}

impl SemanticLocation {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            Self::VectorView => 0,
            Self::ColorAmbient => 1,
        }
    }
}

/// A backend-owned program plus the locations the scene has resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    handle: ShaderHandle,
    locations: [UniformLocation; SemanticLocation::COUNT],
}

impl Shader {
    /// Loads a program from its vertex and fragment stage files. Failure is
    /// not an error: the backend's default program is used instead.
    pub fn load<B>(backend: &mut B, vertex: &Path, fragment: &Path) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        let handle = backend.load_shader(vertex, fragment);
        if handle.is_default() {
            warn!(
                "shader {} + {} unavailable; using the default program",
                vertex.display(),
                fragment.display()
            );
        } else {
            info!(
                "loaded shader {} + {} as program {}",
                vertex.display(),
                fragment.display(),
                handle.0
            );
        }
        Self::from_handle(handle)
    }

    pub fn from_handle(handle: ShaderHandle) -> Self {
        Self {
            handle,
            locations: [UniformLocation::INVALID; SemanticLocation::COUNT],
        }
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    pub fn location(&self, semantic: SemanticLocation) -> UniformLocation {
        self.locations[semantic.index()]
    }

    pub fn set_location(&mut self, semantic: SemanticLocation, location: UniformLocation) {
        self.locations[semantic.index()] = location;
    }

    /// Looks up `name` and records it under `semantic`.
    pub fn bind_location<B>(
        &mut self,
        backend: &B,
        semantic: SemanticLocation,
        name: &str,
    ) -> UniformLocation
    where
        B: ShaderBackend + ?Sized,
    {
        let location = self.locate(backend, name);
        self.set_location(semantic, location);
        location
    }

    pub fn locate<B>(&self, backend: &B, name: &str) -> UniformLocation
    where
        B: ShaderBackend + ?Sized,
    {
        backend.uniform_location(self.handle, name)
    }

    pub fn set_value<B>(&self, backend: &mut B, location: UniformLocation, value: UniformValue)
    where
        B: ShaderBackend + ?Sized,
    {
        backend.set_uniform(self.handle, location, value);
    }
}
