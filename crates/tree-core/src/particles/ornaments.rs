use super::{FamilyAttributes, ParticleFamily};
use crate::constants::{PROGRESS_RATE_MAX, PROGRESS_RATE_MIN};
use crate::error::SceneError;
use crate::frame::FrameContext;
use crate::layout::{ornaments, Ornament, OrnamentKind, PositionSet, TreeShape};
use crate::transition::{ParticleBuffers, Progress};
use glam::{Quat, Vec3};
use rand::Rng;

/// Instanced ornaments. Unlike the point families each instance settles at
/// its own pace (`rate * kind speed`, kept inside the shared rate band) and
/// carries an orientation.
pub struct Ornaments {
    instances: Vec<Ornament>,
    buffers: ParticleBuffers,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    intensities: Vec<f32>,
    rotations: Vec<Quat>,
    instance_progress: Vec<Progress>,
    progress: Progress,
}

fn shine(kind: OrnamentKind) -> f32 {
    match kind {
        OrnamentKind::MetallicBall => 1.0,
        OrnamentKind::Box => 0.8,
        OrnamentKind::VelvetBall => 0.55,
    }
}

/// Formed orientation: front face pointing away from the trunk.
fn outward(target: Vec3) -> Quat {
    Quat::from_rotation_y(target.x.atan2(target.z))
}

impl Ornaments {
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        shape: &TreeShape,
        rate: f32,
    ) -> Result<Self, SceneError> {
        let instances = ornaments(rng, count, shape);
        let mut set = PositionSet::with_capacity(count);
        let mut colors = Vec::with_capacity(count * 3);
        let mut sizes = Vec::with_capacity(count);
        let mut intensities = Vec::with_capacity(count);
        let mut instance_progress = Vec::with_capacity(count);
        for o in &instances {
            set.push(o.chaos, o.target);
            colors.extend_from_slice(&o.color.to_array());
            sizes.push(o.scale);
            intensities.push(shine(o.kind));
            let own = (rate * o.speed).clamp(PROGRESS_RATE_MIN, PROGRESS_RATE_MAX);
            instance_progress.push(Progress::new(own));
        }
        let rotations = instances.iter().map(|o| o.base_rotation).collect();
        Ok(Self {
            buffers: ParticleBuffers::new("ornaments", set)?,
            instances,
            colors,
            sizes,
            intensities,
            rotations,
            instance_progress,
            progress: Progress::new(rate),
        })
    }

    pub fn instances(&self) -> &[Ornament] {
        &self.instances
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.buffers
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    pub fn instance_progress(&self, index: usize) -> Option<f32> {
        self.instance_progress.get(index).map(Progress::value)
    }

    pub fn instance_rate(&self, index: usize) -> Option<f32> {
        self.instance_progress.get(index).map(Progress::rate)
    }
}

impl ParticleFamily for Ornaments {
    fn name(&self) -> &'static str {
        "ornaments"
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn set_formed(&mut self, formed: bool) {
        self.progress.set_formed(formed);
        for p in &mut self.instance_progress {
            p.set_formed(formed);
        }
    }

    fn snap(&mut self, formed: bool) {
        let v = if formed { 1.0 } else { 0.0 };
        self.progress.snap(v);
        for (i, p) in self.instance_progress.iter_mut().enumerate() {
            p.snap(v);
            self.buffers.blend_one(i, p.eased());
        }
        for (rot, o) in self.rotations.iter_mut().zip(&self.instances) {
            *rot = if formed {
                outward(o.target)
            } else {
                o.base_rotation
            };
        }
    }

    fn update(&mut self, ctx: &FrameContext) {
        self.progress.step(ctx.dt);
        for (i, o) in self.instances.iter().enumerate() {
            let p = &mut self.instance_progress[i];
            p.step(ctx.dt);
            let eased = p.eased();
            self.buffers.blend_one(i, eased);

            // Scattered ornaments tumble slowly; formed ones face outward.
            let spin = ctx.time * 0.4 * o.speed;
            let tumbling = o.base_rotation * Quat::from_rotation_y(spin);
            self.rotations[i] = tumbling.slerp(outward(o.target), eased);
        }
    }

    fn attributes(&self) -> FamilyAttributes<'_> {
        FamilyAttributes {
            positions: self.buffers.current(),
            colors: &self.colors,
            sizes: &self.sizes,
            intensities: &self.intensities,
        }
    }
}
