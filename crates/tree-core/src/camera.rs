//! Fixed viewing camera shared by the renderer and the photo focus controller.

use crate::constants::{camera_eye, camera_target, CAMERA_FOVY};
use glam::{Mat4, Vec3};

/// Right-handed camera with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: camera_eye(),
            target: camera_target(),
            up: Vec3::Y,
            aspect: 16.0 / 9.0,
            fovy_radians: CAMERA_FOVY,
            znear: 0.1,
            zfar: 200.0,
        }
    }
}

impl Camera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit viewing direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// World-space point `distance` units in front of the eye.
    pub fn point_ahead(&self, distance: f32) -> Vec3 {
        self.eye + self.forward() * distance
    }

    /// Ignores non-positive or non-finite aspect ratios.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }
}
