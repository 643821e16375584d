//! The ribbon curve: a spiral that narrows and rises around the tree.
//!
//! It is sampled both by the ribbon particles and by the photo slots, so
//! everything that hangs "on the ribbon" agrees on the same shape.

use crate::constants::{
    RIBBON_BASE_RADIUS, RIBBON_BASE_Y, RIBBON_TOP_RADIUS, RIBBON_TOP_Y, RIBBON_TURNS,
};
use glam::Vec3;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RibbonCurve {
    pub turns: f32,
    pub base_radius: f32,
    pub top_radius: f32,
    pub base_y: f32,
    pub top_y: f32,
}

impl Default for RibbonCurve {
    fn default() -> Self {
        Self {
            turns: RIBBON_TURNS,
            base_radius: RIBBON_BASE_RADIUS,
            top_radius: RIBBON_TOP_RADIUS,
            base_y: RIBBON_BASE_Y,
            top_y: RIBBON_TOP_Y,
        }
    }
}

impl RibbonCurve {
    /// Point on the curve for `u` in \[0, 1\] (clamped).
    pub fn point(&self, u: f32) -> Vec3 {
        let u = u.clamp(0.0, 1.0);
        let angle = u * self.turns * TAU;
        let radius = self.radius_at(u);
        let y = self.base_y + (self.top_y - self.base_y) * u;
        Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
    }

    /// Unit tangent at `u`, in the direction of increasing `u`.
    pub fn tangent(&self, u: f32) -> Vec3 {
        let u = u.clamp(0.0, 1.0);
        let angle = u * self.turns * TAU;
        let radius = self.radius_at(u);
        let d_angle = self.turns * TAU;
        let d_radius = self.top_radius - self.base_radius;
        let d_y = self.top_y - self.base_y;
        let (s, c) = angle.sin_cos();
        let d = Vec3::new(
            d_radius * c - radius * s * d_angle,
            d_y,
            d_radius * s + radius * c * d_angle,
        );
        d.normalize_or_zero()
    }

    #[inline]
    pub fn radius_at(&self, u: f32) -> f32 {
        self.base_radius + (self.top_radius - self.base_radius) * u.clamp(0.0, 1.0)
    }
}
