//! Particle families: fixed-size point clouds that blend between a chaos
//! layout and a formed layout under one progress scalar each.

pub mod foliage;
pub mod halo;
pub mod lights;
pub mod ornaments;
pub mod ribbon;

pub use foliage::Foliage;
pub use halo::Halo;
pub use lights::FairyLights;
pub use ornaments::Ornaments;
pub use ribbon::RibbonSnow;

use crate::frame::FrameContext;
use crate::transition::Progress;

/// Borrowed per-particle buffers ready for upload.
///
/// `positions` and `colors` are `len * 3` long, `sizes` and `intensities`
/// are `len` long.
#[derive(Clone, Copy, Debug)]
pub struct FamilyAttributes<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    pub sizes: &'a [f32],
    pub intensities: &'a [f32],
}

impl FamilyAttributes<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

pub trait ParticleFamily {
    fn name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn progress(&self) -> &Progress;
    fn set_formed(&mut self, formed: bool);
    /// Jump straight to chaos (0) or formed (1); initialisation only.
    fn snap(&mut self, formed: bool);
    fn update(&mut self, ctx: &FrameContext);
    fn attributes(&self) -> FamilyAttributes<'_>;
}

/// Secondary attributes every family hands to the renderer.
#[derive(Clone, Debug, Default)]
pub(crate) struct Extras {
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
    pub intensities: Vec<f32>,
}

impl Extras {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            colors: Vec::with_capacity(count * 3),
            sizes: Vec::with_capacity(count),
            intensities: Vec::with_capacity(count),
        }
    }

    #[inline]
    pub fn push(&mut self, color: [f32; 3], size: f32, intensity: f32) {
        self.colors.extend_from_slice(&color);
        self.sizes.push(size);
        self.intensities.push(intensity);
    }
}
