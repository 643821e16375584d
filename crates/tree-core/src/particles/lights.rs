use super::{Extras, FamilyAttributes, ParticleFamily};
use crate::constants::LIGHT_BLINK_SPEED;
use crate::error::SceneError;
use crate::frame::FrameContext;
use crate::layout::{light_positions, TreeShape};
use crate::transition::{ParticleBuffers, Progress};
use rand::Rng;

const WARM_PALETTE: [[f32; 3]; 4] = [
    [1.0, 0.82, 0.45],
    [1.0, 0.62, 0.3],
    [1.0, 0.93, 0.75],
    [0.95, 0.4, 0.35],
];

pub struct FairyLights {
    buffers: ParticleBuffers,
    extras: Extras,
    phases: Vec<f32>,
    progress: Progress,
}

/// Blink brightness for one light; dimmed to half while mostly scattered.
#[inline]
pub fn blink_brightness(time: f32, phase: f32, progress: f32) -> f32 {
    let b = 0.6 + 0.4 * (time * LIGHT_BLINK_SPEED + phase).sin();
    if progress < 0.5 {
        b * 0.5
    } else {
        b
    }
}

impl FairyLights {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        shape: &TreeShape,
        rate: f32,
    ) -> Result<Self, SceneError> {
        let layout = light_positions(rng, count, shape);
        let buffers = ParticleBuffers::new("lights", layout.positions)?;
        let mut extras = Extras::with_capacity(count);
        for _ in 0..count {
            let color = WARM_PALETTE[rng.gen_range(0..WARM_PALETTE.len())];
            extras.push(color, rng.gen_range(0.18..0.28), 0.0);
        }
        Ok(Self {
            buffers,
            extras,
            phases: layout.phases,
            progress: Progress::new(rate),
        })
    }

    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }
}

impl ParticleFamily for FairyLights {
    fn name(&self) -> &'static str {
        "lights"
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
        for (brightness, &phase) in self.extras.intensities.iter_mut().zip(&self.phases) {
            *brightness = blink_brightness(ctx.time, phase, p);
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
