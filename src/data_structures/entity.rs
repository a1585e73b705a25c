//! Simple transform holders animated by the scene every tick.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

/// A placed object: position, Euler angles in degrees and a spin rate.
///
/// Only the Z angle is animated. `update` advances it by `spin * dt` and
/// recomputes the cached model matrix as `T(position) * Rz(eulers.z)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub position: Vector3<f32>,
    pub eulers: Vector3<f32>,
    /// Degrees per second around Z.
    pub spin: f32,
    model: Matrix4<f32>,
}

impl Entity {
    pub fn new(position: impl Into<Vector3<f32>>, theta: f32, spin: f32) -> Self {
        let mut entity = Self {
            position: position.into(),
            eulers: Vector3::new(0.0, 0.0, theta),
            spin,
            model: Matrix4::identity(),
        };
        entity.update(0.0);
        entity
    }

    /// A static entity that never rotates.
    pub fn fixed(position: impl Into<Vector3<f32>>) -> Self {
        Self::new(position, 0.0, 0.0)
    }

    /// Advance the rotation by `dt` seconds and rebuild the model matrix.
    pub fn update(&mut self, dt: f32) {
        self.eulers.z = (self.eulers.z + self.spin * dt) % 360.0;
        self.model =
            Matrix4::from_translation(self.position) * Matrix4::from_angle_z(Deg(self.eulers.z));
    }

    pub fn model(&self) -> &Matrix4<f32> {
        &self.model
    }
}
