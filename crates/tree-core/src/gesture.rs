//! Discrete gestures and the continuous hand pose from 21 hand landmarks.

use crate::constants::*;
use glam::Vec3;
use std::time::Duration;

pub const LANDMARK_COUNT: usize = 21;
pub const WRIST: usize = 0;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;
pub const PALM_CENTRE: usize = 9;

/// One detected hand in normalised image space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarks(pub [Vec3; LANDMARK_COUNT]);

impl HandLandmarks {
    /// Builds from a flat `x, y, z` list; `None` unless exactly 21 points.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() != LANDMARK_COUNT * 3 {
            return None;
        }
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (p, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *p = Vec3::new(xyz[0], xyz[1], xyz[2]);
        }
        Some(Self(points))
    }

    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        self.0[index]
    }

    /// Wrist distance to the index, middle, ring and pinky tips.
    pub fn tip_distances(&self) -> [f32; 4] {
        let wrist = self.0[WRIST];
        [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP].map(|i| self.0[i].distance(wrist))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Gesture {
    #[default]
    None,
    Fist,
    Open,
    Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureThresholds {
    pub fist: f32,
    pub open: f32,
    pub point_extend: f32,
    pub point_curl: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            fist: FIST_THRESHOLD,
            open: OPEN_THRESHOLD,
            point_extend: POINT_EXTEND_THRESHOLD,
            point_curl: POINT_CURL_THRESHOLD,
        }
    }
}

/// Priority: fist, then point, then open.
pub fn classify(hand: &HandLandmarks, t: &GestureThresholds) -> Gesture {
    let d = hand.tip_distances();
    let mean = d.iter().sum::<f32>() / 4.0;
    if mean < t.fist {
        return Gesture::Fist;
    }
    if d[0] > t.point_extend && d[1..].iter().all(|&x| x < t.point_curl) {
        return Gesture::Point;
    }
    if mean > t.open {
        return Gesture::Open;
    }
    Gesture::None
}

/// Emits a gesture only when it changed and the interval since the last
/// emission has passed.
#[derive(Clone, Debug)]
pub struct GestureDebouncer {
    interval: Duration,
    last: Option<(Gesture, Duration)>,
}

impl Default for GestureDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(GESTURE_DEBOUNCE_MS))
    }
}

impl GestureDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn last_emitted(&self) -> Option<Gesture> {
        self.last.map(|(g, _)| g)
    }

    pub fn accept(&mut self, gesture: Gesture, now: Duration) -> Option<Gesture> {
        match self.last {
            Some((prev, _)) if prev == gesture => None,
            Some((_, at)) if now.saturating_sub(at) < self.interval => None,
            _ => {
                self.last = Some((gesture, now));
                Some(gesture)
            }
        }
    }
}

/// Normalised palm position with `x` mirrored for a selfie camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    pub x: f32,
    pub y: f32,
}

impl HandPose {
    pub fn from_landmarks(hand: &HandLandmarks) -> Self {
        let palm = hand.point(PALM_CENTRE);
        Self {
            x: 1.0 - palm.x,
            y: palm.y,
        }
    }
}

/// Result of one landmark sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureOutput {
    /// Debounced gesture, if one should be delivered.
    pub gesture: Option<Gesture>,
    /// `None` means tracking is inactive this frame.
    pub pose: Option<HandPose>,
}

#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
    debouncer: GestureDebouncer,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds, debounce: Duration) -> Self {
        Self {
            thresholds,
            debouncer: GestureDebouncer::new(debounce),
        }
    }

    pub fn process(&mut self, hand: Option<&HandLandmarks>, now: Duration) -> GestureOutput {
        let Some(hand) = hand else {
            return GestureOutput::default();
        };
        let raw = classify(hand, &self.thresholds);
        let gesture = self.debouncer.accept(raw, now);
        if let Some(g) = gesture {
            log::debug!("[gesture] {g:?}");
        }
        GestureOutput {
            gesture,
            pose: Some(HandPose::from_landmarks(hand)),
        }
    }
}

/// Synthetic hands for the three gestures, used by the native front-end and
/// tests. Palm centre sits at `(palm_x, palm_y)` in image space.
pub mod synthetic {
    use super::*;

    fn hand(palm_x: f32, palm_y: f32, tips: [f32; 4]) -> HandLandmarks {
        let wrist = Vec3::new(palm_x, palm_y + 0.1, 0.0);
        let mut points = [wrist; LANDMARK_COUNT];
        points[PALM_CENTRE] = Vec3::new(palm_x, palm_y, 0.0);
        for (tip, len) in [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP].into_iter().zip(tips) {
            points[tip] = wrist - Vec3::Y * len;
        }
        HandLandmarks(points)
    }

    pub fn fist(palm_x: f32, palm_y: f32) -> HandLandmarks {
        hand(palm_x, palm_y, [0.1, 0.1, 0.1, 0.1])
    }

    pub fn open(palm_x: f32, palm_y: f32) -> HandLandmarks {
        hand(palm_x, palm_y, [0.38, 0.42, 0.4, 0.34])
    }

    pub fn point(palm_x: f32, palm_y: f32) -> HandLandmarks {
        hand(palm_x, palm_y, [0.36, 0.12, 0.12, 0.11])
    }

    /// Between the fist and open thresholds with no pointing finger.
    pub fn relaxed(palm_x: f32, palm_y: f32) -> HandLandmarks {
        hand(palm_x, palm_y, [0.24, 0.24, 0.22, 0.2])
    }
}
