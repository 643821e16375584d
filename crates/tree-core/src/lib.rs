//! Core of the photo tree: particle choreography, gesture classification,
//! scene state and (with the `gpu` feature) the shared wgpu renderer.

pub mod camera;
pub mod constants;
pub mod curve;
pub mod error;
pub mod focus;
pub mod frame;
pub mod gesture;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod handoff;
pub mod layout;
pub mod math;
pub mod particles;
pub mod photos;
pub mod rotation;
pub mod scene;
pub mod state;
pub mod store;
pub mod tracker;
pub mod transition;

pub static PARTICLES_WGSL: &str = include_str!("../shaders/particles.wgsl");
pub static QUADS_WGSL: &str = include_str!("../shaders/quads.wgsl");

pub use camera::Camera;
pub use error::{SceneError, StoreError, TrackingError};
pub use frame::{FrameClock, FrameContext};
pub use gesture::{Gesture, GestureClassifier, HandLandmarks, HandPose};
pub use handoff::{HandlerCell, Latest};
pub use particles::ParticleFamily;
pub use photos::{texture_extent, Photo, PhotoCollection, PhotoId, PhotoPixels};
pub use rotation::RotationController;
pub use scene::{NewPhoto, Scene, SceneParams, UploadReport};
pub use state::{AppState, StateMachine};
pub use store::{MemoryStore, PhotoStore, StoredPhoto};
pub use tracker::{GestureLoop, LandmarkDetector, StopHandle, TrackerStatus};
