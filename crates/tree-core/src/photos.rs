//! Photo arena. Photos are stored densely in insertion order with an id
//! lookup; layout targets are recomputed for all of them whenever membership
//! changes, and the displayed transform is animated toward those targets.

use crate::constants::{PHOTO_MOVE_RATE, PHOTO_SCALE, PHOTO_SCALE_RATE};
use crate::curve::RibbonCurve;
use crate::error::SceneError;
use crate::layout::place_photo;
use crate::math::{damp, damp_quat, damp_vec3};
use fnv::FnvHashMap;
use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;

/// Store key; stable across sessions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub String);

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id from a wall-clock timestamp plus random suffix.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, created_at_ms: u64) -> Self {
        Self(format!("photo-{created_at_ms}-{:08x}", rng.gen::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Decoded RGBA8 pixels for one photo, ready for texture upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoPixels {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PhotoPixels {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SceneError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(rgba.len()) {
            return Err(SceneError::InvalidPixels {
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Largest size with the same aspect that fits inside `max_side` on both
/// axes; images already small enough are left alone.
pub fn texture_extent(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side || longest == 0 {
        return (width, height);
    }
    let scale = max_side as f64 / longest as f64;
    let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max_side);
    (fit(width), fit(height))
}

#[derive(Clone, Debug)]
pub struct Photo {
    pub id: PhotoId,
    /// Data URL on the web, file path on native.
    pub image: String,
    /// Width over height, always positive.
    pub aspect_ratio: f32,
    pub curve_u: f32,
    pub chaos: Vec3,
    pub chaos_rotation: Quat,
    pub target: Vec3,
    pub target_rotation: Quat,
    /// Display height when formed.
    pub scale: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub current_scale: f32,
}

impl Photo {
    pub fn new(id: PhotoId, image: String, aspect_ratio: f32) -> Result<Self, SceneError> {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(SceneError::InvalidAspect(aspect_ratio));
        }
        Ok(Self {
            id,
            image,
            aspect_ratio,
            curve_u: 0.5,
            chaos: Vec3::ZERO,
            chaos_rotation: Quat::IDENTITY,
            target: Vec3::ZERO,
            target_rotation: Quat::IDENTITY,
            scale: PHOTO_SCALE,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            current_scale: 0.0,
        })
    }

    /// Local model matrix (inside the rotating parent); the quad is scaled
    /// to the image's aspect.
    pub fn model_matrix(&self) -> Mat4 {
        let s = self.current_scale;
        Mat4::from_scale_rotation_translation(
            Vec3::new(s * self.aspect_ratio, s, s),
            self.rotation,
            self.position,
        )
    }

    /// Ease the displayed transform toward the layout slot, or toward zero
    /// scale when `hidden`.
    pub fn animate(&mut self, formed: bool, hidden: bool, dt: f32) {
        let (pos, rot) = if formed {
            (self.target, self.target_rotation)
        } else {
            (self.chaos, self.chaos_rotation)
        };
        let scale = if hidden { 0.0 } else { self.scale };
        self.position = damp_vec3(self.position, pos, PHOTO_MOVE_RATE, dt);
        self.rotation = damp_quat(self.rotation, rot, PHOTO_MOVE_RATE, dt);
        self.current_scale = damp(self.current_scale, scale, PHOTO_SCALE_RATE, dt).max(0.0);
    }
}

#[derive(Clone, Debug, Default)]
pub struct PhotoCollection {
    photos: Vec<Photo>,
    index: FnvHashMap<PhotoId, usize>,
}

impl PhotoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &PhotoId) -> Option<&Photo> {
        self.index.get(id).map(|&i| &self.photos[i])
    }

    pub fn get_mut(&mut self, id: &PhotoId) -> Option<&mut Photo> {
        match self.index.get(id) {
            Some(&i) => self.photos.get_mut(i),
            None => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Photo> {
        self.photos.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Photo> {
        self.photos.iter_mut()
    }

    /// Ids in layout order.
    pub fn ids(&self) -> Vec<PhotoId> {
        self.photos.iter().map(|p| p.id.clone()).collect()
    }

    /// Appends; returns `false` (and drops `photo`) if the id is taken.
    pub fn insert(&mut self, mut photo: Photo) -> bool {
        if self.index.contains_key(&photo.id) {
            return false;
        }
        photo.current_scale = 0.0;
        self.index.insert(photo.id.clone(), self.photos.len());
        self.photos.push(photo);
        true
    }

    pub fn remove(&mut self, id: &PhotoId) -> Option<Photo> {
        let i = self.index.remove(id)?;
        let photo = self.photos.remove(i);
        for (j, p) in self.photos.iter().enumerate().skip(i) {
            self.index.insert(p.id.clone(), j);
        }
        Some(photo)
    }

    /// Recompute chaos and target slots for every photo from its rank.
    ///
    /// Newly inserted photos (scale still zero) start from their chaos slot.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R, curve: &RibbonCurve) {
        let n = self.photos.len();
        for (i, photo) in self.photos.iter_mut().enumerate() {
            let slot = place_photo(rng, curve, i, n);
            photo.curve_u = slot.curve_u;
            photo.chaos = slot.chaos;
            photo.target = slot.target;
            photo.target_rotation = slot.rotation;
            photo.chaos_rotation = Quat::from_euler(
                EulerRot::XYZ,
                rng.gen_range(-0.6..0.6),
                rng.gen::<f32>() * TAU,
                rng.gen_range(-0.6..0.6),
            );
            if photo.current_scale == 0.0 {
                photo.position = photo.chaos;
                photo.rotation = photo.chaos_rotation;
            }
        }
        log::debug!("[scene] regenerated {n} photo slots");
    }
}
