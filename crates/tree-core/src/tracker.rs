//! Gesture loop: pulls landmarks from a detector at its own cadence and hands
//! the results to the frame loop through latest-value cells.

use crate::error::TrackingError;
use crate::gesture::{Gesture, GestureClassifier, HandLandmarks, HandPose};
use crate::handoff::{HandlerCell, Latest};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Black-box hand landmark source. Constructing an implementation is its
/// initialisation; it may fail, in which case the loop stays inactive.
pub trait LandmarkDetector {
    /// Landmarks for the first detected hand, or `None` when no hand is
    /// visible.
    fn detect(&mut self, now: Duration) -> Result<Option<HandLandmarks>, TrackingError>;

    /// Release the camera and any model resources. Called at most once.
    fn stop(&mut self);
}

/// Passive status for the UI indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerStatus {
    /// Initialisation failed or permission was denied; drag only.
    Inactive,
    Searching,
    HandDetected,
    Stopped,
}

impl TrackerStatus {
    pub fn label(self) -> &'static str {
        match self {
            TrackerStatus::Inactive => "hand tracking off",
            TrackerStatus::Searching => "show your hand",
            TrackerStatus::HandDetected => "hand detected",
            TrackerStatus::Stopped => "hand tracking stopped",
        }
    }
}

/// Cloneable stop request; takes effect at the next tick boundary, so it is
/// safe to fire while a detection is in flight.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

pub struct GestureLoop {
    detector: Option<Box<dyn LandmarkDetector>>,
    classifier: GestureClassifier,
    gestures: HandlerCell<Gesture>,
    pose: Latest<HandPose>,
    stop: StopHandle,
    status: TrackerStatus,
}

impl GestureLoop {
    pub fn new(
        detector: Box<dyn LandmarkDetector>,
        gestures: HandlerCell<Gesture>,
        pose: Latest<HandPose>,
    ) -> Self {
        log::info!("[gesture] hand tracking started");
        Self {
            detector: Some(detector),
            classifier: GestureClassifier::default(),
            gestures,
            pose,
            stop: StopHandle::default(),
            status: TrackerStatus::Searching,
        }
    }

    /// A loop that never produces anything.
    pub fn inactive(pose: Latest<HandPose>) -> Self {
        pose.clear();
        Self {
            detector: None,
            classifier: GestureClassifier::default(),
            gestures: HandlerCell::new(),
            pose,
            stop: StopHandle::default(),
            status: TrackerStatus::Inactive,
        }
    }

    /// Wraps a detector initialisation result; failures are logged and yield
    /// an inactive loop.
    pub fn from_init<D: LandmarkDetector + 'static>(
        init: Result<D, TrackingError>,
        gestures: HandlerCell<Gesture>,
        pose: Latest<HandPose>,
    ) -> Self {
        match init {
            Ok(detector) => Self::new(Box::new(detector), gestures, pose),
            Err(e) => {
                log::warn!("[gesture] {e}; continuing with drag only");
                Self::inactive(pose)
            }
        }
    }

    pub fn with_classifier(mut self, classifier: GestureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Adopt a stop handle created before this loop existed, e.g. one a page
    /// teardown listener already holds while the detector is still starting.
    /// A request already made releases the detector at once.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        if self.stop.is_stopped() {
            self.release();
        }
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    pub fn stop(&mut self) {
        self.stop.stop();
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.stop();
            self.pose.clear();
            self.status = TrackerStatus::Stopped;
            log::info!("[gesture] hand tracking stopped");
        }
    }

    /// One detection step. Returns the status after the step.
    pub fn tick(&mut self, now: Duration) -> TrackerStatus {
        if self.stop.is_stopped() {
            self.release();
            return self.status;
        }
        let Some(detector) = self.detector.as_mut() else {
            return self.status;
        };
        let result = detector.detect(now);

        // A stop requested during detection wins over its result.
        if self.stop.is_stopped() {
            self.release();
            return self.status;
        }

        match result {
            Ok(hand) => {
                let out = self.classifier.process(hand.as_ref(), now);
                self.pose.replace(out.pose);
                if let Some(g) = out.gesture {
                    self.gestures.call(g);
                }
                self.status = if out.pose.is_some() {
                    TrackerStatus::HandDetected
                } else {
                    TrackerStatus::Searching
                };
            }
            Err(e) => log::warn!("[gesture] {e}"),
        }
        self.status
    }
}

impl Drop for GestureLoop {
    fn drop(&mut self) {
        self.release();
    }
}
