//! First-person camera, projection and the per-frame uniform.
//!
//! The world is Z-up. Yaw turns around Z, pitch tilts towards +Z, both in
//! degrees. With yaw and pitch at zero the camera looks along +X.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};

/// cgmath builds OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const FOVY: Deg<f32> = Deg(60.0);
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    /// `y` is pitch, `z` is yaw, both in degrees. `x` is unused.
    pub eulers: Vector3<f32>,
    forwards: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    view: Matrix4<f32>,
}

impl Camera {
    pub fn new(position: impl Into<Point3<f32>>, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position: position.into(),
            eulers: Vector3::new(0.0, pitch, yaw),
            forwards: Vector3::unit_x(),
            right: -Vector3::unit_y(),
            up: Vector3::unit_z(),
            view: Matrix4::identity(),
        };
        camera.update();
        camera
    }

    pub fn yaw(&self) -> f32 {
        self.eulers.z
    }

    pub fn pitch(&self) -> f32 {
        self.eulers.y
    }

    /// Turn by pointer motion. Yaw wraps at 360, pitch is clamped to +-90.
    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.eulers.z = (self.eulers.z - dx * sensitivity) % 360.0;
        self.eulers.y = (self.eulers.y - dy * sensitivity).clamp(-90.0, 90.0);
    }

    /// Move along the current right and forwards vectors.
    pub fn translate(&mut self, right: f32, forwards: f32) {
        self.position += self.right * right + self.forwards * forwards;
    }

    /// Recompute the basis vectors and the view matrix from position and eulers.
    pub fn update(&mut self) {
        let (sin_yaw, cos_yaw) = Rad::from(Deg(self.eulers.z)).0.sin_cos();
        let (sin_pitch, cos_pitch) = Rad::from(Deg(self.eulers.y)).0.sin_cos();
        self.forwards = Vector3::new(cos_yaw * cos_pitch, sin_yaw * cos_pitch, sin_pitch);
        self.right = self.forwards.cross(Vector3::unit_z());
        // Straight up or down the cross product vanishes; derive right from yaw alone.
        if self.right.magnitude2() > f32::EPSILON {
            self.right = self.right.normalize();
        } else {
            self.right = Vector3::new(sin_yaw, -cos_yaw, 0.0);
        }
        self.up = self.right.cross(self.forwards);
        self.view = Matrix4::look_at_rh(self.position, self.position + self.forwards, self.up);
    }

    pub fn forwards(&self) -> Vector3<f32> {
        self.forwards
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }
}

/// Perspective projection with a fixed FOV and clip planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// 60 degree vertical FOV, near 0.1, far 100.
    pub fn standard(width: u32, height: u32) -> Self {
        Self::new(width, height, FOVY, ZNEAR, ZFAR)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// View and projection matrices as uploaded to binding 0 (128 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl FrameUniform {
    pub fn new() -> Self {
        Self {
            view: Matrix4::<f32>::identity().into(),
            projection: Matrix4::<f32>::identity().into(),
        }
    }

    pub fn update(&mut self, camera: &Camera, projection: &Projection) {
        self.view = camera.view().into();
        self.projection = projection.calc_matrix().into();
    }
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self::new()
    }
}
