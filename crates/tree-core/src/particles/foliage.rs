use super::{Extras, FamilyAttributes, ParticleFamily};
use crate::constants::{EFFECT_THRESHOLD, FOLIAGE_WIND_AMPLITUDE, FOLIAGE_WIND_SPEED};
use crate::error::SceneError;
use crate::frame::FrameContext;
use crate::layout::{foliage_positions, TreeShape};
use crate::math::smoothstep;
use crate::transition::{ParticleBuffers, Progress};
use rand::Rng;

pub struct Foliage {
    buffers: ParticleBuffers,
    extras: Extras,
    progress: Progress,
}

impl Foliage {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        shape: &TreeShape,
        rate: f32,
    ) -> Result<Self, SceneError> {
        let buffers = ParticleBuffers::new("foliage", foliage_positions(rng, count, shape))?;
        let mut extras = Extras::with_capacity(count);
        for _ in 0..count {
            let color = if rng.gen::<f32>() < 0.04 {
                // frosted needle tips
                [0.75, 0.85, 0.8]
            } else {
                let g = rng.gen_range(0.3..0.55);
                [g * 0.2, g, g * 0.35]
            };
            extras.push(color, rng.gen_range(0.1..0.2), 1.0);
        }
        Ok(Self {
            buffers,
            extras,
            progress: Progress::new(rate),
        })
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }
}

impl ParticleFamily for Foliage {
    fn name(&self) -> &'static str {
        "foliage"
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
        self.buffers.blend(self.progress.eased());

        let wind = smoothstep(EFFECT_THRESHOLD, 1.0, p);
        if wind <= 0.0 {
            return;
        }
        let amp = FOLIAGE_WIND_AMPLITUDE * wind;
        let t = ctx.time * FOLIAGE_WIND_SPEED;
        for xyz in self.buffers.current_mut().chunks_exact_mut(3) {
            let y = xyz[1];
            xyz[0] += (t + y * 0.45).sin() * amp;
            xyz[2] += (t * 0.7 + y * 0.3).cos() * amp * 0.5;
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
