use glam::Vec3;
use log::warn;

use crate::backend::{ShaderBackend, UniformLocation, UniformValue};
use crate::color::Color;
use crate::render::uniforms::MAX_LIGHTS;
use crate::shader::{SemanticLocation, Shader};

/// Constant ambient term applied once at startup.
pub const AMBIENT: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

const SCENE_LIGHT_POSITION: Vec3 = Vec3::new(-5.0, 2.0, -5.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
}

impl LightKind {
    /// Discriminant the lighting shader switches on.
    pub fn shader_id(self) -> i32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
        }
    }
}

/// Uniform slots a light writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightLocations {
    pub enabled: UniformLocation,
    pub kind: UniformLocation,
    pub position: UniformLocation,
    pub target: UniformLocation,
    pub color: UniformLocation,
}

impl LightLocations {
    fn resolve<B>(shader: &Shader, backend: &B, slot: usize) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        if slot >= MAX_LIGHTS {
            warn!("light slot {slot} exceeds the {MAX_LIGHTS} supported lights; it will not be shaded");
            return Self::default();
        }
        let field = |name: &str| shader.locate(backend, &format!("lights[{slot}].{name}"));
        Self {
            enabled: field("enabled"),
            kind: field("type"),
            position: field("position"),
            target: field("target"),
            color: field("color"),
        }
    }
}

/// A light bound to one slot of a lighting shader.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub target: Vec3,
    pub color: Color,
    pub enabled: bool,
    locations: LightLocations,
}

impl Light {
    /// Sets up the scene's single yellow point light in slot 0 and the
    /// constant ambient term.
    pub fn initialize<B>(shader: &mut Shader, backend: &mut B) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        let ambient = shader.bind_location(&*backend, SemanticLocation::ColorAmbient, "ambient");
        shader.set_value(backend, ambient, UniformValue::Vec4(AMBIENT));
        Self::create(
            LightKind::Point,
            SCENE_LIGHT_POSITION,
            Vec3::ZERO,
            Color::YELLOW,
            0,
            shader,
            backend,
        )
    }

    /// Binds a light to `slot` of `shader` and uploads its initial values.
    pub fn create<B>(
        kind: LightKind,
        position: Vec3,
        target: Vec3,
        color: Color,
        slot: usize,
        shader: &Shader,
        backend: &mut B,
    ) -> Self
    where
        B: ShaderBackend + ?Sized,
    {
        let light = Self {
            kind,
            position,
            target,
            color,
            enabled: true,
            locations: LightLocations::resolve(shader, &*backend, slot),
        };
        light.push_to_shader(shader, backend);
        light
    }

    pub fn locations(&self) -> &LightLocations {
        &self.locations
    }

    /// Re-uploads every field of the light. There is no dirty tracking.
    pub fn push_to_shader<B>(&self, shader: &Shader, backend: &mut B)
    where
        B: ShaderBackend + ?Sized,
    {
        let locations = &self.locations;
        shader.set_value(backend, locations.enabled, UniformValue::Int(i32::from(self.enabled)));
        shader.set_value(backend, locations.kind, UniformValue::Int(self.kind.shader_id()));
        shader.set_value(backend, locations.position, UniformValue::Vec3(self.position.to_array()));
        shader.set_value(backend, locations.target, UniformValue::Vec3(self.target.to_array()));
        shader.set_value(backend, locations.color, UniformValue::Vec4(self.color.to_normalized()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;

    fn loaded_shader(backend: &mut HeadlessBackend) -> Shader {
        let handle = backend.register_shader("lights ambient viewPos");
        Shader::from_handle(handle)
    }

    #[test]
    fn initialize_binds_scene_light_and_ambient() {
        let mut backend = HeadlessBackend::new();
        let mut shader = loaded_shader(&mut backend);
        let light = Light::initialize(&mut shader, &mut backend);

        assert_eq!(light.kind, LightKind::Point);
        assert_eq!(light.position, Vec3::new(-5.0, 2.0, -5.0));
        assert_eq!(light.target, Vec3::ZERO);
        assert_eq!(light.color, Color::YELLOW);
        assert!(light.enabled);
        assert!(shader.location(SemanticLocation::ColorAmbient).is_valid());

        let values = backend.uniforms(shader.handle()).unwrap().values();
        assert_eq!(values.ambient, AMBIENT);
        assert_eq!(values.lights[0].position, [-5.0, 2.0, -5.0]);
        assert_eq!(values.lights[0].enabled, 1);
        assert_eq!(values.lights[0].kind, 1);
        assert_eq!(values.lights[0].color, Color::YELLOW.to_normalized());
    }

    #[test]
    fn push_rewrites_every_field() {
        let mut backend = HeadlessBackend::new();
        let mut shader = loaded_shader(&mut backend);
        let light = Light::initialize(&mut shader, &mut backend);
        backend.take_calls();

        light.push_to_shader(&shader, &mut backend);
        light.push_to_shader(&shader, &mut backend);
        assert_eq!(backend.take_calls().len(), 10);
    }

    #[test]
    fn directional_light_fills_its_own_slot() {
        let mut backend = HeadlessBackend::new();
        let shader = loaded_shader(&mut backend);
        Light::create(
            LightKind::Directional,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::ZERO,
            Color::WHITE,
            1,
            &shader,
            &mut backend,
        );

        let values = backend.uniforms(shader.handle()).unwrap().values();
        assert_eq!(values.lights[1].kind, 0);
        assert_eq!(values.lights[1].enabled, 1);
        assert_eq!(values.lights[1].position, [0.0, 10.0, 0.0]);
        assert_eq!(values.lights[0].enabled, 0);
    }

    #[test]
    fn light_beyond_last_slot_is_unbound() {
        let mut backend = HeadlessBackend::new();
        let shader = loaded_shader(&mut backend);
        let light = Light::create(
            LightKind::Directional,
            Vec3::Y,
            Vec3::ZERO,
            Color::WHITE,
            MAX_LIGHTS,
            &shader,
            &mut backend,
        );
        assert_eq!(*light.locations(), LightLocations::default());
        assert_eq!(
            backend.uniforms(shader.handle()).unwrap(),
            &crate::render::uniforms::UniformBlock::new()
        );
    }

    #[test]
    fn missing_shader_leaves_locations_invalid() {
        let mut backend = HeadlessBackend::new();
        let mut shader = Shader::from_handle(crate::backend::ShaderHandle::DEFAULT);
        let light = Light::initialize(&mut shader, &mut backend);
        assert!(!light.locations().position.is_valid());
        assert!(!shader.location(SemanticLocation::ColorAmbient).is_valid());
    }
}
