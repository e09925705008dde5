pub mod capture;
pub mod db;
pub mod engine;
pub mod mock;
pub mod replay;
pub mod selection;
pub mod sequence;
mod service;

pub use capture::{
    CaptureOutcome, CaptureSession, CapturedMovement, PointerEvent, PointerEventSource,
    WindowInfo, WindowInfoProvider,
};
pub use db::{
    load_gestures, save_gestures, ConfigError, GestureConfig, GestureConfigBuilder,
    GesturePattern, LoadReport, SharedGestureConfig,
};
pub use engine::{Algorithm, Point, Stroke, StrokeTracker, DELTA_MIN};
pub use selection::{resolve, MatchedSequence, Resolution};
pub use sequence::{StrokeSequence, MAX_STROKES};
pub use service::{ConfigReloader, GestureOutcome, GestureService};
