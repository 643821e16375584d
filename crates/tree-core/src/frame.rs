use crate::constants::MAX_FRAME_DT;
use glam::Vec2;

/// Read-only per-frame inputs handed to every update.
///
/// Front-ends build one of these per rendered frame instead of letting
/// components query window/device state themselves.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Seconds since the previous frame, clamped to \[0, `MAX_FRAME_DT`\].
    pub dt: f32,
    /// Seconds since the scene started.
    pub time: f32,
    pub pixel_ratio: f32,
    /// Backing-store size in physical pixels.
    pub viewport: Vec2,
}

impl FrameContext {
    pub fn new(dt: f32, time: f32, pixel_ratio: f32, viewport: Vec2) -> Self {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        Self {
            dt,
            time,
            pixel_ratio: pixel_ratio.max(0.1),
            viewport: viewport.max(Vec2::ONE),
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 0.0, 1.0, Vec2::new(1280.0, 720.0))
    }
}

/// Tracks elapsed time between frames for the front-end loops.
#[derive(Clone, Debug)]
pub struct FrameClock {
    start: instant::Instant,
    last: instant::Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = instant::Instant::now();
        Self { start: now, last: now }
    }

    /// Returns `(dt, time)` in seconds and advances the clock.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = instant::Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        (dt, (now - self.start).as_secs_f32())
    }

    pub fn elapsed(&self) -> std::time::Duration {
        instant::Instant::now() - self.start
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
