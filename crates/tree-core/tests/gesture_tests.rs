// Host-side tests for gesture classification, debouncing and the gesture loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tree_core::gesture::synthetic;
use tree_core::gesture::*;
use tree_core::handoff::{HandlerCell, Latest};
use tree_core::tracker::*;
use tree_core::TrackingError;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn classify_synthetic_hands() {
    let t = GestureThresholds::default();
    assert_eq!(classify(&synthetic::fist(0.5, 0.5), &t), Gesture::Fist);
    assert_eq!(classify(&synthetic::open(0.5, 0.5), &t), Gesture::Open);
    assert_eq!(classify(&synthetic::point(0.5, 0.5), &t), Gesture::Point);
    assert_eq!(classify(&synthetic::relaxed(0.5, 0.5), &t), Gesture::None);
}

#[test]
fn fist_wins_over_point() {
    // An extended index finger still reads as a fist when the mean is tiny.
    let t = GestureThresholds {
        fist: 0.2,
        open: 0.3,
        point_extend: 0.27,
        point_curl: 0.19,
    };
    let hand = synthetic::point(0.5, 0.5);
    assert_eq!(classify(&hand, &t), Gesture::Fist);
}

#[test]
fn point_wins_over_open() {
    // All tips far out except three curled ones can still average above open.
    let t = GestureThresholds {
        fist: 0.05,
        open: 0.1,
        point_extend: 0.27,
        point_curl: 0.19,
    };
    assert_eq!(classify(&synthetic::point(0.5, 0.5), &t), Gesture::Point);
}

#[test]
fn landmarks_from_flat_requires_21_points() {
    assert!(HandLandmarks::from_flat(&[0.0; 60]).is_none());
    let hand = HandLandmarks::from_flat(&[0.25; 63]).expect("21 points");
    assert_eq!(hand.point(PALM_CENTRE).x, 0.25);
}

#[test]
fn debounce_suppresses_changes_inside_the_interval() {
    let mut d = GestureDebouncer::default();
    assert_eq!(d.accept(Gesture::Fist, ms(0)), Some(Gesture::Fist));
    assert_eq!(d.accept(Gesture::Open, ms(100)), None, "too soon");
    assert_eq!(d.accept(Gesture::Open, ms(149)), None, "still too soon");
    assert_eq!(d.accept(Gesture::Open, ms(150)), Some(Gesture::Open));
    assert_eq!(d.accept(Gesture::Open, ms(900)), None, "unchanged");
    assert_eq!(d.last_emitted(), Some(Gesture::Open));
}

#[test]
fn debounce_allows_at_most_one_emission_per_interval() {
    let mut d = GestureDebouncer::default();
    let sequence = [Gesture::Fist, Gesture::Open, Gesture::Point, Gesture::Fist];
    let mut emitted = Vec::new();
    for (i, g) in sequence.iter().cycle().take(200).enumerate() {
        let now = ms(i as u64 * 16);
        if d.accept(*g, now).is_some() {
            emitted.push(now);
        }
    }
    for pair in emitted.windows(2) {
        assert!(pair[1] - pair[0] >= ms(150));
    }
}

#[test]
fn classifier_reports_mirrored_pose_every_sample() {
    let mut c = GestureClassifier::default();
    let hand = synthetic::fist(0.3, 0.4);
    let out = c.process(Some(&hand), ms(0));
    assert_eq!(out.gesture, Some(Gesture::Fist));
    let pose = out.pose.expect("pose");
    assert!((pose.x - 0.7).abs() < 1e-6);
    assert!((pose.y - 0.4).abs() < 1e-6);

    // Same gesture again: no emission, pose still delivered.
    let out = c.process(Some(&hand), ms(20));
    assert_eq!(out.gesture, None);
    assert!(out.pose.is_some());

    let out = c.process(None, ms(40));
    assert_eq!(out, GestureOutput::default());
}

struct ScriptedDetector {
    frames: VecDeque<Result<Option<HandLandmarks>, TrackingError>>,
    stops: Rc<Cell<u32>>,
    stop_during_detect: Rc<RefCell<Option<StopHandle>>>,
}

impl LandmarkDetector for ScriptedDetector {
    fn detect(&mut self, _now: Duration) -> Result<Option<HandLandmarks>, TrackingError> {
        if let Some(handle) = self.stop_during_detect.borrow().as_ref() {
            handle.stop();
        }
        self.frames.pop_front().unwrap_or(Ok(None))
    }

    fn stop(&mut self) {
        self.stops.set(self.stops.get() + 1);
    }
}

fn scripted(
    frames: Vec<Result<Option<HandLandmarks>, TrackingError>>,
) -> (ScriptedDetector, Rc<Cell<u32>>, Rc<RefCell<Option<StopHandle>>>) {
    let stops = Rc::new(Cell::new(0));
    let hook = Rc::new(RefCell::new(None));
    (
        ScriptedDetector {
            frames: frames.into(),
            stops: Rc::clone(&stops),
            stop_during_detect: Rc::clone(&hook),
        },
        stops,
        hook,
    )
}

#[test]
fn gesture_loop_delivers_gestures_and_pose() {
    let (det, stops, _) = scripted(vec![
        Ok(Some(synthetic::open(0.2, 0.6))),
        Err(TrackingError::Inference("glitch".into())),
        Ok(None),
    ]);
    let received = Rc::new(RefCell::new(Vec::new()));
    let handlers = HandlerCell::new();
    let sink = Rc::clone(&received);
    handlers.register(move |g| sink.borrow_mut().push(g));
    let pose = Latest::new();
    let mut gl = GestureLoop::new(Box::new(det), handlers, pose.clone());

    assert_eq!(gl.tick(ms(0)), TrackerStatus::HandDetected);
    assert_eq!(*received.borrow(), vec![Gesture::Open]);
    assert!(pose.get().is_some());

    // Inference failure: logged, nothing changes, next tick retries.
    assert_eq!(gl.tick(ms(33)), TrackerStatus::HandDetected);
    assert!(pose.get().is_some());

    assert_eq!(gl.tick(ms(66)), TrackerStatus::Searching);
    assert!(pose.get().is_none(), "no hand clears the pose");

    gl.stop();
    gl.stop();
    assert_eq!(gl.tick(ms(99)), TrackerStatus::Stopped);
    drop(gl);
    assert_eq!(stops.get(), 1, "camera released exactly once");
}

#[test]
fn stop_during_detection_discards_the_result() {
    let (det, stops, hook) = scripted(vec![Ok(Some(synthetic::fist(0.5, 0.5)))]);
    let handlers = HandlerCell::new();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    handlers.register(move |_| h.set(h.get() + 1));
    let pose = Latest::new();
    let mut gl = GestureLoop::new(Box::new(det), handlers, pose.clone());
    *hook.borrow_mut() = Some(gl.stop_handle());

    assert_eq!(gl.tick(ms(0)), TrackerStatus::Stopped);
    assert_eq!(hits.get(), 0);
    assert!(pose.get().is_none());
    assert_eq!(stops.get(), 1);
}

#[test]
fn failed_init_gives_an_inactive_loop() {
    let init: Result<ScriptedDetector, TrackingError> =
        Err(TrackingError::Camera("permission denied".into()));
    let pose = Latest::new();
    let mut gl = GestureLoop::from_init(init, HandlerCell::new(), pose.clone());
    for i in 0..5 {
        assert_eq!(gl.tick(ms(i * 33)), TrackerStatus::Inactive);
    }
    assert!(pose.get().is_none());
}

#[test]
fn stop_before_init_finishes_releases_the_detector() {
    let stop = StopHandle::default();
    let pose = Latest::new();
    let mut placeholder = GestureLoop::inactive(pose.clone()).with_stop_handle(stop.clone());
    // Page teardown while the detector is still starting.
    placeholder.stop();
    assert!(stop.is_stopped());

    let (det, stops, _) = scripted(vec![Ok(Some(synthetic::fist(0.5, 0.5)))]);
    let hits = Rc::new(Cell::new(0));
    let handlers = HandlerCell::new();
    let h = Rc::clone(&hits);
    handlers.register(move |_| h.set(h.get() + 1));
    let mut gl = GestureLoop::from_init(Ok(det), handlers, pose.clone()).with_stop_handle(stop);
    assert_eq!(stops.get(), 1, "camera released as soon as it opened");
    assert_eq!(gl.status(), TrackerStatus::Stopped);

    assert_eq!(gl.tick(ms(0)), TrackerStatus::Stopped);
    assert_eq!(hits.get(), 0);
    assert!(pose.get().is_none());
    drop(gl);
    assert_eq!(stops.get(), 1);
}

#[test]
fn shared_stop_handle_reaches_a_running_loop() {
    let stop = StopHandle::default();
    let (det, stops, _) = scripted(vec![Ok(Some(synthetic::open(0.5, 0.5)))]);
    let mut gl = GestureLoop::new(Box::new(det), HandlerCell::new(), Latest::new())
        .with_stop_handle(stop.clone());
    assert_eq!(gl.tick(ms(0)), TrackerStatus::HandDetected);
    stop.stop();
    assert_eq!(gl.tick(ms(33)), TrackerStatus::Stopped);
    assert_eq!(stops.get(), 1);
}

#[test]
fn handler_registered_later_is_used_on_next_tick() {
    let (det, _, _) = scripted(vec![
        Ok(Some(synthetic::fist(0.5, 0.5))),
        Ok(Some(synthetic::open(0.5, 0.5))),
    ]);
    let handlers: HandlerCell<Gesture> = HandlerCell::new();
    let mut gl = GestureLoop::new(Box::new(det), handlers.clone(), Latest::new());
    gl.tick(ms(0));

    let got = Rc::new(Cell::new(Gesture::None));
    let g = Rc::clone(&got);
    handlers.register(move |gesture| g.set(gesture));
    gl.tick(ms(500));
    assert_eq!(got.get(), Gesture::Open);
}
