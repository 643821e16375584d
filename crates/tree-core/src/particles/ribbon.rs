//! Ribbon and snow share one buffer and one update pass; each particle's
//! `ParticleKind` picks its update rule.

use super::{Extras, FamilyAttributes, ParticleFamily};
use crate::constants::{
    EFFECT_THRESHOLD, RIBBON_BOB_AMPLITUDE, RIBBON_BREATH_AMPLITUDE, SNOW_HEIGHT,
};
use crate::curve::RibbonCurve;
use crate::error::SceneError;
use crate::frame::FrameContext;
use crate::layout::{ribbon_and_snow, ParticleKind};
use crate::math::{smoothstep, wrap};
use crate::transition::{ParticleBuffers, Progress};
use rand::Rng;

pub struct RibbonSnow {
    buffers: ParticleBuffers,
    extras: Extras,
    kinds: Vec<ParticleKind>,
    fall_speeds: Vec<f32>,
    phases: Vec<f32>,
    progress: Progress,
}

/// Looping fall height for a flake seeded at `target_y`.
///
/// Always lands in `[-SNOW_HEIGHT / 2, SNOW_HEIGHT / 2)`.
#[inline]
pub fn snow_height(target_y: f32, time: f32, fall_speed: f32) -> f32 {
    let half = SNOW_HEIGHT * 0.5;
    wrap(target_y - time * fall_speed + half, SNOW_HEIGHT) - half
}

/// Flakes fade in as the scene assembles.
#[inline]
pub fn snow_opacity(progress: f32) -> f32 {
    smoothstep(0.1, 0.6, progress)
}

impl RibbonSnow {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        ribbon_count: usize,
        snow_count: usize,
        curve: &RibbonCurve,
        rate: f32,
    ) -> Result<Self, SceneError> {
        let layout = ribbon_and_snow(rng, ribbon_count, snow_count, curve);
        let buffers = ParticleBuffers::new("ribbon", layout.positions)?;
        let mut extras = Extras::with_capacity(layout.kinds.len());
        for kind in &layout.kinds {
            match kind {
                ParticleKind::Ribbon => {
                    let shade = rng.gen_range(0.85..1.0);
                    extras.push([0.95 * shade, 0.12 * shade, 0.16 * shade], 0.11, 1.0);
                }
                ParticleKind::Snow => {
                    extras.push([0.92, 0.95, 1.0], rng.gen_range(0.07..0.15), 0.0);
                }
            }
        }
        Ok(Self {
            buffers,
            extras,
            kinds: layout.kinds,
            fall_speeds: layout.fall_speeds,
            phases: layout.phases,
            progress: Progress::new(rate),
        })
    }

    pub fn kinds(&self) -> &[ParticleKind] {
        &self.kinds
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }
}

impl ParticleFamily for RibbonSnow {
    fn name(&self) -> &'static str {
        "ribbon"
    }

    fn len(&self) -> usize {
        self.buffers.len()
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn set_formed(&mut self, formed: bool) {
        self.progress.set_formed(formed);
    }

    fn snap(&mut self, formed: bool) {
        self.progress.snap(if formed { 1.0 } else { 0.0 });
        self.buffers.blend(self.progress.eased());
    }

    fn update(&mut self, ctx: &FrameContext) {
        let p = self.progress.step(ctx.dt);
        if self.buffers.is_empty() {
            return;
        }
        let eased = self.progress.eased();
        let effect = smoothstep(EFFECT_THRESHOLD, 1.0, p);
        let breath = 1.0 + RIBBON_BREATH_AMPLITUDE * (ctx.time * 1.5).sin() * effect;
        let opacity = snow_opacity(p);

        for i in 0..self.kinds.len() {
            let base = i * 3;
            match self.kinds[i] {
                ParticleKind::Ribbon => {
                    let [x, y, z] = self.buffers.blend_one(i, eased);
                    if effect > 0.0 {
                        let bob = (ctx.time * 0.8 + self.phases[i]).sin()
                            * RIBBON_BOB_AMPLITUDE
                            * effect;
                        let out = &mut self.buffers.current_mut()[base..base + 3];
                        out[0] = x * breath;
                        out[1] = y + bob;
                        out[2] = z * breath;
                    }
                }
                ParticleKind::Snow => {
                    let target_y = self.buffers.target()[base + 1];
                    let [x, _, z] = self.buffers.blend_one(i, eased);
                    let y = snow_height(target_y, ctx.time, self.fall_speeds[i]);
                    let sway = (ctx.time * 0.6 + self.phases[i]).sin() * 0.15 * opacity;
                    let out = &mut self.buffers.current_mut()[base..base + 3];
                    out[0] = x + sway;
                    out[1] = y;
                    out[2] = z;
                    self.extras.intensities[i] = opacity;
                }
            }
        }
    }

    fn attributes(&self) -> FamilyAttributes<'_> {
        FamilyAttributes {
            positions: self.buffers.current(),
            colors: &self.extras.colors,
            sizes: &self.extras.sizes,
            intensities: &self.extras.intensities,
        }
    }
}
