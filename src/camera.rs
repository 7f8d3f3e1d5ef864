use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::backend::{ShaderBackend, UniformValue};
use crate::shader::{SemanticLocation, Shader};

/// Distance of the camera from the vertical axis.
pub const ORBIT_RADIUS: f32 = 10.0;
/// Fixed height of the camera above the ground plane.
pub const ORBIT_HEIGHT: f32 = 10.0;
/// Vertical field of view, in degrees.
pub const ORBIT_FOVY: f32 = 45.0;

const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// 3D camera handed to the renderer for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees, or the visible height for
    /// orthographic cameras.
    pub fovy: f32,
    pub projection: Projection,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Combined view-projection matrix for a viewport with the given aspect
    /// ratio, in wgpu clip space (depth `0..1`).
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let aspect = aspect.max(0.01);
        let projection = match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fovy.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
            }
            Projection::Orthographic => {
                let top = self.fovy / 2.0;
                let right = top * aspect;
                Mat4::orthographic_rh(-right, right, -top, top, NEAR_PLANE, FAR_PLANE)
            }
        };
        projection * self.view()
    }
}

/// Moves the orbit angle forward by half a turn per second of `delta`.
pub fn advance(angle: f32, delta: f32) -> f32 {
    angle + PI * delta
}

/// Camera on the orbit circle at `angle`, looking at the origin.
pub fn compute_camera(angle: f32) -> Camera {
    Camera {
        position: Vec3::new(
            angle.cos() * ORBIT_RADIUS,
            ORBIT_HEIGHT,
            angle.sin() * ORBIT_RADIUS,
        ),
        target: Vec3::ZERO,
        up: Vec3::Y,
        fovy: ORBIT_FOVY,
        projection: Projection::Perspective,
    }
}

/// Uploads the camera position into the shader's view-position slot.
pub fn push_view_uniform<B>(camera: &Camera, shader: &Shader, backend: &mut B)
where
    B: ShaderBackend + ?Sized,
{
    backend.set_uniform(
        shader.handle(),
        shader.location(SemanticLocation::VectorView),
        UniformValue::Vec3(camera.position.to_array()),
    );
}
