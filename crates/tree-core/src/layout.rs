//! Position generators for every particle family and for the photo slots.
//!
//! All functions are pure apart from the RNG they are handed: the shapes are
//! fixed, the scatter is random. Callers seed a `StdRng` when they need
//! reproducible layouts (tests do).

use crate::constants::*;
use crate::curve::RibbonCurve;
use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

/// Cone the foliage, lights and ornaments are wrapped around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeShape {
    pub height: f32,
    pub radius: f32,
    pub base_y: f32,
}

impl Default for TreeShape {
    fn default() -> Self {
        Self {
            height: TREE_HEIGHT,
            radius: TREE_RADIUS,
            base_y: TREE_BASE_Y,
        }
    }
}

impl TreeShape {
    /// Cone radius at normalised height `t` (0 = base, 1 = tip).
    #[inline]
    pub fn radius_at(&self, t: f32) -> f32 {
        self.radius * (1.0 - t.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn y_at(&self, t: f32) -> f32 {
        self.base_y + self.height * t
    }
}

/// Paired chaos/target buffers, flat `xyz` triples.
#[derive(Clone, Debug, Default)]
pub struct PositionSet {
    pub chaos: Vec<f32>,
    pub target: Vec<f32>,
}

impl PositionSet {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            chaos: Vec::with_capacity(count * 3),
            target: Vec::with_capacity(count * 3),
        }
    }

    #[inline]
    pub fn push(&mut self, chaos: Vec3, target: Vec3) {
        self.chaos.extend_from_slice(&chaos.to_array());
        self.target.extend_from_slice(&target.to_array());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.target.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Uniform sample over the solid sphere (not its surface).
///
/// The radius uses the cube root of a uniform variate so that density is
/// constant per unit volume.
pub fn sample_sphere_volume<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = radius * rng.gen::<f32>().cbrt();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3::new(
        r * sin_phi * theta.cos(),
        r * cos_phi,
        r * sin_phi * theta.sin(),
    )
}

// ---------------- Foliage ----------------

pub fn foliage_positions<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    shape: &TreeShape,
) -> PositionSet {
    let mut set = PositionSet::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let angle = t * FOLIAGE_WINDINGS * TAU + rng.gen_range(0.0..0.35);
        // Deeper pushes near the base fill the cone's volume instead of a shell
        let depth = rng.gen::<f32>() * FOLIAGE_DEPTH * shape.radius * (1.0 - t);
        let r = (shape.radius_at(t) - depth).max(0.0);
        let y = shape.y_at(t) + rng.gen_range(-0.08..0.08);
        let target = Vec3::new(angle.cos() * r, y, angle.sin() * r);
        set.push(sample_sphere_volume(rng, CHAOS_RADIUS), target);
    }
    set
}

// ---------------- Ornaments ----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrnamentKind {
    Box,
    MetallicBall,
    VelvetBall,
}

impl OrnamentKind {
    /// Weighted bucket: top 15% of rolls are gift boxes, the next 40% velvet.
    pub fn from_roll(roll: f32) -> Self {
        if roll > ORNAMENT_BOX_CUTOFF {
            OrnamentKind::Box
        } else if roll > ORNAMENT_VELVET_CUTOFF {
            OrnamentKind::VelvetBall
        } else {
            OrnamentKind::MetallicBall
        }
    }

    /// Heavier ornaments settle more slowly.
    pub fn speed(self) -> f32 {
        match self {
            OrnamentKind::Box => 0.88,
            OrnamentKind::VelvetBall => 0.94,
            OrnamentKind::MetallicBall => 1.0,
        }
    }

    fn base_scale(self) -> f32 {
        match self {
            OrnamentKind::Box => 0.42,
            OrnamentKind::VelvetBall => 0.3,
            OrnamentKind::MetallicBall => 0.34,
        }
    }

    fn palette(self) -> &'static [[f32; 3]] {
        match self {
            OrnamentKind::Box => &[[0.8, 0.1, 0.12], [0.95, 0.78, 0.3], [0.1, 0.45, 0.25]],
            OrnamentKind::VelvetBall => &[[0.55, 0.04, 0.1], [0.35, 0.08, 0.4]],
            OrnamentKind::MetallicBall => &[[1.0, 0.84, 0.45], [0.85, 0.87, 0.92]],
        }
    }
}

/// Immutable once generated.
#[derive(Clone, Debug)]
pub struct Ornament {
    pub kind: OrnamentKind,
    pub color: Vec3,
    pub chaos: Vec3,
    pub target: Vec3,
    pub speed: f32,
    pub scale: f32,
    pub base_rotation: Quat,
}

pub fn ornaments<R: Rng + ?Sized>(rng: &mut R, count: usize, shape: &TreeShape) -> Vec<Ornament> {
    (0..count)
        .map(|_| {
            let kind = OrnamentKind::from_roll(rng.gen());
            let t = rng.gen_range(0.05..0.92);
            let angle = rng.gen::<f32>() * TAU;
            let r = shape.radius_at(t) + ORNAMENT_SURFACE_OFFSET;
            let target = Vec3::new(angle.cos() * r, shape.y_at(t), angle.sin() * r);
            let palette = kind.palette();
            let color = Vec3::from(palette[rng.gen_range(0..palette.len())]);
            let base_rotation = Quat::from_euler(
                EulerRot::XYZ,
                rng.gen::<f32>() * TAU,
                rng.gen::<f32>() * TAU,
                rng.gen::<f32>() * TAU,
            );
            Ornament {
                kind,
                color,
                chaos: sample_sphere_volume(rng, CHAOS_RADIUS),
                target,
                speed: kind.speed(),
                scale: kind.base_scale() * rng.gen_range(0.8..1.2),
                base_rotation,
            }
        })
        .collect()
}

// ---------------- Fairy lights ----------------

pub struct LightLayout {
    pub positions: PositionSet,
    pub phases: Vec<f32>,
}

pub fn light_positions<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    shape: &TreeShape,
) -> LightLayout {
    let mut positions = PositionSet::with_capacity(count);
    let mut phases = Vec::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let angle = t * LIGHT_WINDINGS * TAU;
        let offset = rng.gen_range(-1.0..1.0) * LIGHT_RADIAL_SPREAD;
        let r = (shape.radius_at(t) + offset).max(0.0);
        let target = Vec3::new(angle.cos() * r, shape.y_at(t), angle.sin() * r);
        positions.push(sample_sphere_volume(rng, CHAOS_RADIUS), target);
        phases.push(rng.gen::<f32>() * TAU);
    }
    LightLayout { positions, phases }
}

// ---------------- Ribbon + snow ----------------

/// Per-particle discriminant for the shared ribbon buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ParticleKind {
    Ribbon = 0,
    Snow = 1,
}

pub struct RibbonLayout {
    pub positions: PositionSet,
    pub kinds: Vec<ParticleKind>,
    pub fall_speeds: Vec<f32>,
    pub phases: Vec<f32>,
}

/// Ribbon particles first, then the snow population, in one buffer.
pub fn ribbon_and_snow<R: Rng + ?Sized>(
    rng: &mut R,
    ribbon_count: usize,
    snow_count: usize,
    curve: &RibbonCurve,
) -> RibbonLayout {
    let total = ribbon_count + snow_count;
    let mut layout = RibbonLayout {
        positions: PositionSet::with_capacity(total),
        kinds: Vec::with_capacity(total),
        fall_speeds: Vec::with_capacity(total),
        phases: Vec::with_capacity(total),
    };
    for i in 0..ribbon_count {
        let u = i as f32 / ribbon_count as f32;
        let jitter = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        ) * RIBBON_THICKNESS;
        layout
            .positions
            .push(sample_sphere_volume(rng, CHAOS_RADIUS), curve.point(u) + jitter);
        layout.kinds.push(ParticleKind::Ribbon);
        layout.fall_speeds.push(0.0);
        layout.phases.push(u * TAU);
    }
    let half = SNOW_HEIGHT * 0.5;
    for _ in 0..snow_count {
        let angle = rng.gen::<f32>() * TAU;
        let r = SNOW_RADIUS * rng.gen::<f32>().sqrt();
        let y = rng.gen_range(-half..half);
        let target = Vec3::new(angle.cos() * r, y, angle.sin() * r);
        layout
            .positions
            .push(sample_sphere_volume(rng, CHAOS_RADIUS), target);
        layout.kinds.push(ParticleKind::Snow);
        layout
            .fall_speeds
            .push(rng.gen_range(SNOW_FALL_MIN..SNOW_FALL_MAX));
        layout.phases.push(rng.gen::<f32>() * TAU);
    }
    layout
}

// ---------------- Halo ----------------

pub struct HaloLayout {
    pub positions: PositionSet,
    pub phases: Vec<f32>,
}

pub fn halo_positions<R: Rng + ?Sized>(rng: &mut R, count: usize) -> HaloLayout {
    let mut positions = PositionSet::with_capacity(count);
    let mut phases = Vec::with_capacity(count);
    for _ in 0..count {
        let angle = rng.gen::<f32>() * TAU;
        let r = HALO_RADIUS + rng.gen_range(-0.5..0.5) * HALO_WIDTH;
        let y = HALO_Y + rng.gen_range(-0.3..0.3);
        let target = Vec3::new(angle.cos() * r, y, angle.sin() * r);
        positions.push(sample_sphere_volume(rng, CHAOS_RADIUS), target);
        phases.push(rng.gen::<f32>() * TAU);
    }
    HaloLayout { positions, phases }
}

// ---------------- Photo slots ----------------

/// Curve parameter for the `index`-th of `count` photos.
///
/// Photos spread over the interior of the ribbon so the first and last are
/// inset from its ends; a lone photo sits at the midpoint.
pub fn photo_curve_parameter(index: usize, count: usize) -> f32 {
    if count <= 1 {
        return 0.5;
    }
    PHOTO_CURVE_START + (index as f32 / (count - 1) as f32) * PHOTO_CURVE_SPAN
}

#[derive(Clone, Copy, Debug)]
pub struct PhotoPlacement {
    pub curve_u: f32,
    pub chaos: Vec3,
    pub target: Vec3,
    pub rotation: Quat,
}

pub fn place_photo<R: Rng + ?Sized>(
    rng: &mut R,
    curve: &RibbonCurve,
    index: usize,
    count: usize,
) -> PhotoPlacement {
    let u = photo_curve_parameter(index, count);
    let anchor = curve.point(u);
    let target = anchor - Vec3::Y * PHOTO_DROP;

    // Face away from the trunk
    let yaw = anchor.x.atan2(anchor.z);
    let facing = Quat::from_rotation_y(yaw);

    // Tilt along the ribbon's local slope so the photo appears to hang from it
    let tangent = curve.tangent(u);
    let local_x = facing * Vec3::X;
    let run = tangent.dot(local_x);
    let hang = if run.abs() > 1e-4 {
        (tangent.y / run).atan()
    } else {
        0.0
    };
    let roll = hang + rng.gen_range(-PHOTO_JITTER..PHOTO_JITTER);
    let pitch = rng.gen_range(-PHOTO_JITTER..PHOTO_JITTER) * 0.5;
    let rotation = facing * Quat::from_rotation_z(roll) * Quat::from_rotation_x(pitch);

    PhotoPlacement {
        curve_u: u,
        chaos: sample_sphere_volume(rng, CHAOS_RADIUS * 0.6),
        target,
        rotation,
    }
}
