use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("family `{family}` has mismatched buffers: chaos={chaos} target={target}")]
    BufferMismatch {
        family: &'static str,
        chaos: usize,
        target: usize,
    },
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f32),
    #[error("pixel buffer of {len} bytes does not match a {width}x{height} RGBA image")]
    InvalidPixels { width: u32, height: u32, len: usize },
    #[error("unknown photo `{0}`")]
    UnknownPhoto(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record `{0}` not found")]
    NotFound(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("write failed: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("hand landmarker failed to initialise: {0}")]
    Init(String),
    #[error("camera unavailable: {0}")]
    Camera(String),
    #[error("inference failed: {0}")]
    Inference(String),
}
