//! Bridge to the hand-landmarker script (`js/hands.js`), which installs
//! `globalThis.photoTreeHands` before the wasm module starts.

use std::time::Duration;
use tree_core::gesture::HandLandmarks;
use tree_core::tracker::LandmarkDetector;
use tree_core::TrackingError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// Opens the camera into `video_id` and loads the model. Rejects with
    /// `{ kind: "camera" | "model", message }`.
    #[wasm_bindgen(js_namespace = photoTreeHands, js_name = start, catch)]
    fn hands_start(video_id: &str) -> Result<js_sys::Promise, JsValue>;

    /// Flat `[x, y, z] * 21` for the first hand, or null.
    #[wasm_bindgen(js_namespace = photoTreeHands, js_name = detect, catch)]
    fn hands_detect(timestamp_ms: f64) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = photoTreeHands, js_name = stop)]
    fn hands_stop();
}

fn describe(err: &JsValue) -> (String, String) {
    let field = |name: &str| {
        js_sys::Reflect::get(err, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_string())
    };
    let kind = field("kind").unwrap_or_default();
    let message = field("message")
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    (kind, message)
}

pub struct WebHandDetector;

impl WebHandDetector {
    pub async fn start(video_id: &str) -> Result<Self, TrackingError> {
        let promise = hands_start(video_id).map_err(|e| TrackingError::Init(describe(&e).1))?;
        match JsFuture::from(promise).await {
            Ok(_) => Ok(Self),
            Err(e) => match describe(&e) {
                (kind, message) if kind == "camera" => Err(TrackingError::Camera(message)),
                (_, message) => Err(TrackingError::Init(message)),
            },
        }
    }
}

impl LandmarkDetector for WebHandDetector {
    fn detect(&mut self, now: Duration) -> Result<Option<HandLandmarks>, TrackingError> {
        let value = hands_detect(now.as_secs_f64() * 1000.0)
            .map_err(|e| TrackingError::Inference(describe(&e).1))?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        let flat = value
            .dyn_into::<js_sys::Float32Array>()
            .map_err(|_| TrackingError::Inference("landmarks are not a Float32Array".into()))?
            .to_vec();
        HandLandmarks::from_flat(&flat)
            .map(Some)
            .ok_or_else(|| {
                TrackingError::Inference(format!("expected 63 values, got {}", flat.len()))
            })
    }

    fn stop(&mut self) {
        hands_stop();
    }
}
