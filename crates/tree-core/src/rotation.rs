//! Parent rotation for the whole composite scene.
//!
//! Two modes, picked per frame by whether a hand pose is supplied:
//!
//! - drag: pointer motion feeds an angular velocity that is integrated and
//!   decays every frame; an idle drift keeps the tree turning when nothing
//!   else is moving it.
//! - hand: yaw and tilt are smoothed straight toward the pose-derived
//!   targets. Entering this mode throws away any residual drag momentum.

use crate::constants::*;
use crate::frame::FrameContext;
use crate::gesture::HandPose;
use crate::math::damp;
use glam::{EulerRot, Mat4, Quat};
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationParams {
    pub drag_gain: f32,
    pub amplification: f32,
    pub velocity_decay: f32,
    pub velocity_epsilon: f32,
    pub idle_drift: f32,
    pub tilt_relax_rate: f32,
    pub hand_smoothing_rate: f32,
    pub hand_max_tilt: f32,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            drag_gain: DRAG_GAIN,
            amplification: DRAG_AMPLIFICATION,
            velocity_decay: VELOCITY_DECAY,
            velocity_epsilon: VELOCITY_EPSILON,
            idle_drift: IDLE_DRIFT,
            tilt_relax_rate: TILT_RELAX_RATE,
            hand_smoothing_rate: HAND_SMOOTHING_RATE,
            hand_max_tilt: HAND_MAX_TILT,
        }
    }
}

/// `angle` shifted by whole turns to sit within half a turn of `around`.
fn nearest_turn(angle: f32, around: f32) -> f32 {
    angle + TAU * ((around - angle) / TAU).round()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationMode {
    Drag,
    Hand,
}

#[derive(Clone, Debug)]
pub struct RotationController {
    params: RotationParams,
    rotation_x: f32,
    rotation_y: f32,
    velocity: f32,
    dragging: bool,
    last_x: f32,
    idle_drift: bool,
    mode: RotationMode,
}

impl Default for RotationController {
    fn default() -> Self {
        Self::new(RotationParams::default())
    }
}

impl RotationController {
    pub fn new(params: RotationParams) -> Self {
        Self {
            params,
            rotation_x: 0.0,
            rotation_y: 0.0,
            velocity: 0.0,
            dragging: false,
            last_x: 0.0,
            idle_drift: true,
            mode: RotationMode::Drag,
        }
    }

    pub fn pointer_down(&mut self, x: f32) {
        self.dragging = true;
        self.last_x = x;
    }

    pub fn pointer_move(&mut self, x: f32, viewport_width: f32) {
        if !self.dragging || viewport_width <= 0.0 {
            return;
        }
        let dx = x - self.last_x;
        self.last_x = x;
        self.velocity += dx / viewport_width * self.params.drag_gain;
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn set_idle_drift(&mut self, enabled: bool) {
        self.idle_drift = enabled;
    }

    pub fn update(&mut self, ctx: &FrameContext, hand: Option<HandPose>) {
        let dt = ctx.dt;
        match hand {
            Some(pose) => {
                if self.mode != RotationMode::Hand {
                    log::debug!("[rotation] hand mode");
                }
                self.mode = RotationMode::Hand;
                self.velocity = 0.0;
                let rate = self.params.hand_smoothing_rate;
                let yaw = nearest_turn((pose.x - 0.5) * TAU, self.rotation_y);
                let max_tilt = self.params.hand_max_tilt;
                let tilt = ((pose.y - 0.5) * 2.0 * max_tilt).clamp(-max_tilt, max_tilt);
                self.rotation_y = damp(self.rotation_y, yaw, rate, dt);
                self.rotation_x = damp(self.rotation_x, tilt, rate, dt);
            }
            None => {
                self.mode = RotationMode::Drag;
                self.rotation_y += self.velocity * dt * self.params.amplification;
                self.velocity *= self.params.velocity_decay;
                if !self.dragging
                    && self.idle_drift
                    && self.velocity.abs() < self.params.velocity_epsilon
                {
                    self.rotation_y += self.params.idle_drift * dt;
                }
                self.rotation_x = damp(self.rotation_x, 0.0, self.params.tilt_relax_rate, dt);
            }
        }
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn rotation_x(&self) -> f32 {
        self.rotation_x
    }

    /// Parent rotation shared by every family and the photos.
    pub fn transform(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation_x, self.rotation_y, 0.0)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_quat(self.transform())
    }
}
