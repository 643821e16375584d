//! Brings the featured photo in front of the camera while the tree keeps
//! turning underneath it.

use crate::camera::Camera;
use crate::constants::*;
use crate::math::{damp, damp_quat, damp_vec3};
use crate::photos::{Photo, PhotoId};
use glam::{Mat3, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusParams {
    pub distance: f32,
    pub scale: f32,
    pub approach_rate: f32,
    pub lock_ratio: f32,
    pub unlock_ratio: f32,
}

impl Default for FocusParams {
    fn default() -> Self {
        Self {
            distance: FOCUS_DISTANCE,
            scale: FOCUS_SCALE,
            approach_rate: FOCUS_APPROACH_RATE,
            lock_ratio: FOCUS_LOCK_RATIO,
            unlock_ratio: FOCUS_UNLOCK_RATIO,
        }
    }
}

/// World rotation whose +Z axis points from `position` toward `eye`.
pub fn face_towards(position: Vec3, eye: Vec3) -> Quat {
    let forward = (eye - position).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-8 {
        return Quat::from_rotation_arc(Vec3::Z, forward);
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

#[derive(Clone, Debug, Default)]
pub struct FocusController {
    params: FocusParams,
    photo: Option<PhotoId>,
    locked: bool,
}

impl FocusController {
    pub fn new(params: FocusParams) -> Self {
        Self {
            params,
            photo: None,
            locked: false,
        }
    }

    pub fn params(&self) -> &FocusParams {
        &self.params
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn photo(&self) -> Option<&PhotoId> {
        self.photo.as_ref()
    }

    pub fn release(&mut self) {
        self.photo = None;
        self.locked = false;
    }

    /// Where the featured photo should sit, in the parent's local space,
    /// for the parent rotation of this frame.
    pub fn local_target(&self, camera: &Camera, parent: Quat) -> Vec3 {
        parent.inverse() * camera.point_ahead(self.params.distance)
    }

    pub fn update(&mut self, photo: &mut Photo, parent: Quat, camera: &Camera, dt: f32) {
        if self.photo.as_ref() != Some(&photo.id) {
            self.photo = Some(photo.id.clone());
            self.locked = false;
        }
        let p = &self.params;

        photo.current_scale = damp(photo.current_scale, p.scale, p.approach_rate, dt);
        if !self.locked && photo.current_scale >= p.scale * p.lock_ratio {
            self.locked = true;
            log::debug!("[scene] focus locked on {}", photo.id);
        } else if self.locked && photo.current_scale < p.scale * p.unlock_ratio {
            self.locked = false;
        }

        let target = self.local_target(camera, parent);
        if self.locked {
            photo.position = target;
        } else {
            photo.position = damp_vec3(photo.position, target, p.approach_rate, dt);
        }
        let facing = parent.inverse() * face_towards(parent * photo.position, camera.eye);
        if self.locked {
            photo.rotation = facing;
        } else {
            photo.rotation = damp_quat(photo.rotation, facing, p.approach_rate, dt);
        }
    }
}
