use std::path::Path;

use glam::Vec3;

use crate::backend::{DrawBackend, ShaderBackend};
use crate::camera::{self, Camera};
use crate::color::Color;
use crate::light::Light;
use crate::shader::{SemanticLocation, Shader};

/// Slab the cube rests in, as (width, height, depth).
const SLAB_SIZE: Vec3 = Vec3::new(4.0, 1.0, 4.0);
const CUBE_SIZE: Vec3 = Vec3::new(2.0, 2.0, 2.0);

/// The lit scene: one shader, one light and the orbiting camera state.
#[derive(Debug, Clone)]
pub struct Scene {
    shader: Shader,
    light: Light,
    angle: f32,
    camera: Camera,
}

impl Scene {
    /// Loads the lighting program and binds the view position, ambient term
    /// and scene light to it.
    pub fn awake<B>(backend: &mut B, vertex: &Path, fragment: &Path) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        let shader = Shader::load(backend, vertex, fragment);
        Self::with_shader(backend, shader)
    }

    /// Same as [`Scene::awake`] for a program the caller already loaded.
    pub fn with_shader<B>(backend: &mut B, mut shader: Shader) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        shader.bind_location(&*backend, SemanticLocation::VectorView, "viewPos");
        let light = Light::initialize(&mut shader, backend);
        Self {
            shader,
            light,
            angle: 0.0,
            camera: camera::compute_camera(0.0),
        }
    }

    /// Advances the orbit by `delta` seconds, refreshes every uniform and
    /// draws the shaded geometry.
    pub fn update<B>(&mut self, backend: &mut B, delta: f32)
    where
        B: ShaderBackend + DrawBackend,
    {
        self.angle = camera::advance(self.angle, delta);
        self.camera = camera::compute_camera(self.angle);

        self.light.push_to_shader(&self.shader, backend);
        camera::push_view_uniform(&self.camera, &self.shader, backend);

        backend.draw_scene(&self.camera, self.shader.handle(), |backend| {
            backend.draw_cube(Vec3::ZERO, SLAB_SIZE.x, SLAB_SIZE.y, SLAB_SIZE.z, Color::RED);
            backend.draw_cube(Vec3::ZERO, CUBE_SIZE.x, CUBE_SIZE.y, CUBE_SIZE.z, Color::BLACK);
        });
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }
}
