use super::{Extras, FamilyAttributes, ParticleFamily};
use crate::constants::{HALO_BOB_AMPLITUDE, HALO_SPIN};
use crate::error::SceneError;
use crate::frame::FrameContext;
use crate::layout::halo_positions;
use crate::transition::{ParticleBuffers, Progress};
use rand::Rng;
use std::f32::consts::TAU;

/// Ring of glints orbiting the tree. Spins only as fast as it is formed.
pub struct Halo {
    buffers: ParticleBuffers,
    extras: Extras,
    phases: Vec<f32>,
    progress: Progress,
    angle: f32,
}

impl Halo {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, count: usize, rate: f32) -> Result<Self, SceneError> {
        let layout = halo_positions(rng, count);
        let buffers = ParticleBuffers::new("halo", layout.positions)?;
        let mut extras = Extras::with_capacity(count);
        for _ in 0..count {
            let warm = rng.gen_range(0.0..1.0);
            extras.push(
                [1.0, 0.85 + 0.1 * warm, 0.55 + 0.35 * warm],
                rng.gen_range(0.05..0.1),
                rng.gen_range(0.5..1.0),
            );
        }
        Ok(Self {
            buffers,
            extras,
            phases: layout.phases,
            progress: Progress::new(rate),
            angle: 0.0,
        })
    }

    /// Accumulated spin about the vertical axis, radians in `[0, TAU)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }
}

impl ParticleFamily for Halo {
    fn name(&self) -> &'static str {
        "halo"
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
        self.angle = (self.angle + HALO_SPIN * p * ctx.dt).rem_euclid(TAU);
        if self.buffers.is_empty() {
            return;
        }
        let eased = self.progress.eased();
        let keep = 1.0 - eased;

        // Only the formed ring spins; the chaos share is never rotated.
        let (s, c) = self.angle.sin_cos();
        let bob_amp = HALO_BOB_AMPLITUDE * p;
        for i in 0..self.phases.len() {
            let base = i * 3;
            let chaos = &self.buffers.chaos()[base..base + 3];
            let (cx, cy, cz) = (chaos[0], chaos[1], chaos[2]);
            let target = &self.buffers.target()[base..base + 3];
            let (tx, ty, tz) = (target[0], target[1], target[2]);
            let bob = (ctx.time * 1.2 + self.phases[i]).sin() * bob_amp;
            let out = &mut self.buffers.current_mut()[base..base + 3];
            out[0] = cx * keep + (tx * c - tz * s) * eased;
            out[1] = cy * keep + ty * eased + bob;
            out[2] = cz * keep + (tx * s + tz * c) * eased;
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
