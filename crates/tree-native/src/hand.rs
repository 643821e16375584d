//! Keyboard/mouse stand-in for a camera hand tracker.
//!
//! Holding F, O or P shows a fist, open palm or pointing hand under the
//! cursor. H toggles a relaxed hand that only steers rotation.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tree_core::gesture::{synthetic, HandLandmarks};
use tree_core::tracker::LandmarkDetector;
use tree_core::TrackingError;
use winit::keyboard::KeyCode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandShape {
    #[default]
    Relaxed,
    Fist,
    Open,
    Point,
}

impl HandShape {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyF => Some(Self::Fist),
            KeyCode::KeyO => Some(Self::Open),
            KeyCode::KeyP => Some(Self::Point),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct HandInput {
    /// Cursor in normalised window coordinates, origin top-left.
    pub cursor: [f32; 2],
    pub held: Option<HandShape>,
    pub resting: bool,
}

impl HandInput {
    pub fn landmarks(&self) -> Option<HandLandmarks> {
        let shape = match (self.held, self.resting) {
            (Some(shape), _) => shape,
            (None, true) => HandShape::Relaxed,
            (None, false) => return None,
        };
        // Camera images are mirrored, so place the palm opposite the cursor.
        let (x, y) = (1.0 - self.cursor[0], self.cursor[1]);
        Some(match shape {
            HandShape::Relaxed => synthetic::relaxed(x, y),
            HandShape::Fist => synthetic::fist(x, y),
            HandShape::Open => synthetic::open(x, y),
            HandShape::Point => synthetic::point(x, y),
        })
    }
}

pub struct SyntheticHand {
    input: Rc<RefCell<HandInput>>,
}

impl SyntheticHand {
    pub fn new(input: Rc<RefCell<HandInput>>) -> Result<Self, TrackingError> {
        log::info!("[gesture] synthetic hand: hold F/O/P for fist/open/point, H toggles");
        Ok(Self { input })
    }
}

impl LandmarkDetector for SyntheticHand {
    fn detect(&mut self, _now: Duration) -> Result<Option<HandLandmarks>, TrackingError> {
        Ok(self.input.borrow().landmarks())
    }

    fn stop(&mut self) {
        *self.input.borrow_mut() = HandInput::default();
    }
}
