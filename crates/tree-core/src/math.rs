//! Small easing and smoothing helpers shared by every animated component.

use glam::{Quat, Vec3};

/// Symmetric cubic ease: slow start, fast middle, slow end.
///
/// `ease(0) == 0`, `ease(1) == 1`; input is clamped to \[0, 1\].
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let k = -2.0 * t + 2.0;
        1.0 - k * k * k / 2.0
    }
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Frame-rate independent blend factor for exponential smoothing at `rate` per second.
#[inline]
pub fn damp_factor(rate: f32, dt: f32) -> f32 {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    1.0 - (-rate * dt).exp()
}

#[inline]
pub fn damp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * damp_factor(rate, dt)
}

#[inline]
pub fn damp_vec3(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    current.lerp(target, damp_factor(rate, dt))
}

#[inline]
pub fn damp_quat(current: Quat, target: Quat, rate: f32, dt: f32) -> Quat {
    current.slerp(target, damp_factor(rate, dt))
}

/// Modulo that always lands in `[0, m)` for positive `m`.
#[inline]
pub fn wrap(value: f32, m: f32) -> f32 {
    value.rem_euclid(m)
}
