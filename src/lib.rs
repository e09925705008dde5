pub mod actions;
pub mod common;
pub mod logging;
pub mod mouse_gestures;
pub mod settings;
