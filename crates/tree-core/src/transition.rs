//! Chaos ↔ formed interpolation shared by every particle family.

use crate::error::SceneError;
use crate::layout::PositionSet;
use crate::math::{damp_factor, ease_in_out_cubic};

/// Smoothed scalar in \[0, 1\] chasing a binary target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    value: f32,
    target: f32,
    rate: f32,
}

impl Progress {
    pub fn new(rate: f32) -> Self {
        Self {
            value: 0.0,
            target: 0.0,
            rate: rate.max(0.0),
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Eased value used for blending.
    #[inline]
    pub fn eased(&self) -> f32 {
        ease_in_out_cubic(self.value)
    }

    pub fn set_formed(&mut self, formed: bool) {
        self.target = if formed { 1.0 } else { 0.0 };
    }

    /// Jump straight to `value`; only meant for initialisation.
    pub fn snap(&mut self, value: f32) {
        let v = value.clamp(0.0, 1.0);
        self.value = v;
        self.target = v.round();
    }

    /// Exponential approach toward the target; never overshoots and always
    /// stays inside \[0, 1\], whatever `dt` is.
    pub fn step(&mut self, dt: f32) -> f32 {
        let alpha = damp_factor(self.rate, dt);
        self.value += (self.target - self.value) * alpha;
        self.value = self.value.clamp(0.0, 1.0);
        self.value
    }
}

/// Fixed-size chaos/target/current position buffers for one family.
#[derive(Clone, Debug)]
pub struct ParticleBuffers {
    chaos: Vec<f32>,
    target: Vec<f32>,
    current: Vec<f32>,
}

impl ParticleBuffers {
    pub fn new(family: &'static str, set: PositionSet) -> Result<Self, SceneError> {
        let PositionSet { chaos, target } = set;
        if chaos.len() != target.len() || chaos.len() % 3 != 0 {
            return Err(SceneError::BufferMismatch {
                family,
                chaos: chaos.len(),
                target: target.len(),
            });
        }
        let current = chaos.clone();
        Ok(Self {
            chaos,
            target,
            current,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.target.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    #[inline]
    pub fn chaos(&self) -> &[f32] {
        &self.chaos
    }

    #[inline]
    pub fn target(&self) -> &[f32] {
        &self.target
    }

    #[inline]
    pub fn current(&self) -> &[f32] {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [f32] {
        &mut self.current
    }

    /// `current = chaos * (1 - eased) + target * eased`, component-wise.
    /// Both endpoints are reproduced exactly.
    pub fn blend(&mut self, eased: f32) {
        for ((out, &a), &b) in self
            .current
            .iter_mut()
            .zip(self.chaos.iter())
            .zip(self.target.iter())
        {
            *out = a * (1.0 - eased) + b * eased;
        }
    }

    /// Blend a single particle; used by families that branch per particle.
    #[inline]
    pub fn blend_one(&mut self, index: usize, eased: f32) -> [f32; 3] {
        let base = index * 3;
        let mut out = [0.0; 3];
        for (k, o) in out.iter_mut().enumerate() {
            let a = self.chaos[base + k];
            let b = self.target[base + k];
            *o = a * (1.0 - eased) + b * eased;
        }
        self.current[base..base + 3].copy_from_slice(&out);
        out
    }
}
