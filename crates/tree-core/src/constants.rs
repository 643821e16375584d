use glam::Vec3;

// Shared scene tuning constants used by both web and native frontends.

// Tree silhouette
pub const TREE_HEIGHT: f32 = 14.0; // base to tip
pub const TREE_RADIUS: f32 = 5.2; // cone radius at the base
pub const TREE_BASE_Y: f32 = -7.0; // world-space y of the cone base
pub const CHAOS_RADIUS: f32 = 18.0; // solid sphere the scattered state fills

// Particle counts
pub const FOLIAGE_COUNT: usize = 24_000;
pub const ORNAMENT_COUNT: usize = 420;
pub const LIGHT_COUNT: usize = 1_400;
pub const RIBBON_COUNT: usize = 5_000;
pub const SNOW_COUNT: usize = 2_400;
pub const HALO_COUNT: usize = 3_000;

// Progress smoothing rates (per second)
pub const FOLIAGE_RATE: f32 = 0.8;
pub const ORNAMENT_RATE: f32 = 0.7;
pub const LIGHT_RATE: f32 = 0.75;
pub const RIBBON_RATE: f32 = 0.6;
pub const HALO_RATE: f32 = 0.65;
// Band every per-family and per-ornament rate stays inside
pub const PROGRESS_RATE_MIN: f32 = 0.6;
pub const PROGRESS_RATE_MAX: f32 = 0.8;

// Post-blend effects fade in above this progress
pub const EFFECT_THRESHOLD: f32 = 0.9;

// Foliage
pub const FOLIAGE_WINDINGS: f32 = 90.0; // spiral turns from base to tip
pub const FOLIAGE_DEPTH: f32 = 0.85; // max inward push as a fraction of cone radius
pub const FOLIAGE_WIND_AMPLITUDE: f32 = 0.08;
pub const FOLIAGE_WIND_SPEED: f32 = 1.3;

// Ornaments
pub const ORNAMENT_SURFACE_OFFSET: f32 = 0.35; // sits just outside the foliage shell
pub const ORNAMENT_BOX_CUTOFF: f32 = 0.85; // roll above -> box
pub const ORNAMENT_VELVET_CUTOFF: f32 = 0.45; // roll above (and not box) -> velvet

// Fairy lights
pub const LIGHT_WINDINGS: f32 = 24.0;
pub const LIGHT_RADIAL_SPREAD: f32 = 0.6; // signed offset around the shell
pub const LIGHT_BLINK_SPEED: f32 = 2.0;

// Ribbon curve
pub const RIBBON_TURNS: f32 = 5.0;
pub const RIBBON_BASE_RADIUS: f32 = 6.4;
pub const RIBBON_TOP_RADIUS: f32 = 0.9;
pub const RIBBON_BASE_Y: f32 = -6.5;
pub const RIBBON_TOP_Y: f32 = 6.2;
pub const RIBBON_THICKNESS: f32 = 0.12; // positional jitter
pub const RIBBON_BREATH_AMPLITUDE: f32 = 0.035;
pub const RIBBON_BOB_AMPLITUDE: f32 = 0.12;

// Snow
pub const SNOW_RADIUS: f32 = 14.0;
pub const SNOW_HEIGHT: f32 = 30.0; // full wrap range
pub const SNOW_FALL_MIN: f32 = 0.6;
pub const SNOW_FALL_MAX: f32 = 1.8;

// Halo
pub const HALO_RADIUS: f32 = 8.5;
pub const HALO_WIDTH: f32 = 1.6;
pub const HALO_Y: f32 = 1.5;
pub const HALO_SPIN: f32 = 0.25; // rad/s at full progress
pub const HALO_BOB_AMPLITUDE: f32 = 0.25;

// Photos
pub const PHOTO_CURVE_START: f32 = 0.15; // photos use the interior 70% of the ribbon
pub const PHOTO_CURVE_SPAN: f32 = 0.7;
pub const PHOTO_DROP: f32 = 0.55; // hang below the ribbon
pub const PHOTO_SCALE: f32 = 1.1; // formed display height
pub const PHOTO_JITTER: f32 = 0.12; // radians of rotational jitter
pub const PHOTO_MOVE_RATE: f32 = 3.0;
pub const PHOTO_SCALE_RATE: f32 = 4.0;
pub const PHOTO_TEXTURE_MAX_SIDE: u32 = 1024; // decoded photos are downscaled to fit

// Focus
pub const FOCUS_DISTANCE: f32 = 9.0; // in front of the camera
pub const FOCUS_SCALE: f32 = 4.5;
pub const FOCUS_APPROACH_RATE: f32 = 9.0;
pub const FOCUS_LOCK_RATIO: f32 = 0.9;
pub const FOCUS_UNLOCK_RATIO: f32 = 0.8;

// Rotation
pub const DRAG_GAIN: f32 = 4.0;
pub const DRAG_AMPLIFICATION: f32 = 1.0;
pub const VELOCITY_DECAY: f32 = 0.95; // per frame
pub const VELOCITY_EPSILON: f32 = 0.001;
pub const IDLE_DRIFT: f32 = 0.08; // rad/s
pub const TILT_RELAX_RATE: f32 = 3.0;
pub const HAND_SMOOTHING_RATE: f32 = 5.0;
pub const HAND_MAX_TILT: f32 = 0.5; // radians either way

// Gestures
pub const GESTURE_DEBOUNCE_MS: u64 = 150;
pub const FIST_THRESHOLD: f32 = 0.17; // mean tip-to-wrist below -> fist
pub const OPEN_THRESHOLD: f32 = 0.3; // mean tip-to-wrist above -> open
pub const POINT_EXTEND_THRESHOLD: f32 = 0.27; // index tip-to-wrist above
pub const POINT_CURL_THRESHOLD: f32 = 0.19; // other tips below

// State
pub const HISTORY_CAPACITY: usize = 5;

// Frame
pub const MAX_FRAME_DT: f32 = 0.25; // seconds; longer stalls are clamped

// Camera
pub const CAMERA_EYE: [f32; 3] = [0.0, 1.0, 28.0];
pub const CAMERA_TARGET: [f32; 3] = [0.0, 0.0, 0.0];
pub const CAMERA_FOVY: f32 = std::f32::consts::FRAC_PI_4;

#[inline]
pub fn camera_eye() -> Vec3 {
    Vec3::from(CAMERA_EYE)
}

#[inline]
pub fn camera_target() -> Vec3 {
    Vec3::from(CAMERA_TARGET)
}
