use crate::actions::window::WindowId;
use crate::mouse_gestures::engine::{Algorithm, Point, StrokeTracker, DELTA_MIN};
use crate::settings::Modifier;
use serde::{Deserialize, Serialize};

/// Button used for gestures unless configured otherwise (right button).
pub const DEFAULT_BUTTON: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Press { x: i32, y: i32, button: u8 },
    Motion { x: i32, y: i32 },
    Release { x: i32, y: i32, button: u8 },
}

impl PointerEvent {
    pub fn point(&self) -> Point {
        match *self {
            PointerEvent::Press { x, y, .. }
            | PointerEvent::Motion { x, y }
            | PointerEvent::Release { x, y, .. } => Point::new(x, y),
        }
    }
}

/// Blocking source of grabbed pointer events.
pub trait PointerEventSource {
    /// Returns `None` once the source is closed.
    fn next_event(&mut self) -> Option<PointerEvent>;

    /// Ask the platform to deliver `button` while `modifier` is held.
    ///
    /// Sources fed by an already filtered stream keep the default.
    fn grab(&mut self, button: u8, modifier: Modifier) -> anyhow::Result<()> {
        tracing::debug!(button, %modifier, "pointer grab not needed");
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    #[serde(default)]
    pub id: Option<WindowId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub class: String,
}

pub trait WindowInfoProvider: Send + Sync {
    fn focused_window_info(&self) -> anyhow::Result<WindowInfo>;
}

pub trait ClickEmulator: Send + Sync {
    fn emulate_click(&self, button: u8, at: Point) -> anyhow::Result<()>;
}

/// Result of one press/drag/release cycle that drew strokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMovement {
    pub basic_movements: String,
    pub advanced_movements: String,
    pub window_title: String,
    pub window_class: String,
    pub window_id: Option<WindowId>,
    pub release_point: Point,
}

impl CapturedMovement {
    pub fn window(&self) -> WindowInfo {
        WindowInfo {
            id: self.window_id,
            title: self.window_title.clone(),
            class: self.window_class.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Event did not apply to the current state.
    Ignored,
    Started,
    Tracking,
    /// Release without strokes: replay the click the grab swallowed.
    PassThroughClick { button: u8, at: Point },
    Captured(CapturedMovement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PressInfo {
    button: u8,
    at: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Capturing(PressInfo),
}

/// Press/motion/release state machine feeding both stroke trackers.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    button: u8,
    state: SessionState,
    accurate: StrokeTracker,
    fuzzy: StrokeTracker,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(DEFAULT_BUTTON, DELTA_MIN)
    }
}

impl CaptureSession {
    pub fn new(button: u8, delta_min: i32) -> Self {
        Self {
            button,
            state: SessionState::Idle,
            accurate: StrokeTracker::new(Algorithm::Accurate, delta_min),
            fuzzy: StrokeTracker::new(Algorithm::Fuzzy, delta_min),
        }
    }

    pub fn button(&self) -> u8 {
        self.button
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, SessionState::Capturing(_))
    }

    pub fn accurate(&self) -> &StrokeTracker {
        &self.accurate
    }

    pub fn fuzzy(&self) -> &StrokeTracker {
        &self.fuzzy
    }

    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        window_info: &dyn WindowInfoProvider,
    ) -> CaptureOutcome {
        match event {
            PointerEvent::Press { x, y, button } => self.press(Point::new(x, y), button),
            PointerEvent::Motion { x, y } => self.motion(Point::new(x, y)),
            PointerEvent::Release { x, y, button } => {
                self.release(Point::new(x, y), button, window_info)
            }
        }
    }

    pub fn press(&mut self, at: Point, button: u8) -> CaptureOutcome {
        if button != self.button {
            return CaptureOutcome::Ignored;
        }
        if self.is_capturing() {
            tracing::debug!(button, "press while capturing ignored");
            return CaptureOutcome::Ignored;
        }

        self.accurate.reset(at);
        self.fuzzy.reset(at);
        self.state = SessionState::Capturing(PressInfo { button, at });
        tracing::debug!(x = at.x, y = at.y, "gesture capture started");
        CaptureOutcome::Started
    }

    pub fn motion(&mut self, at: Point) -> CaptureOutcome {
        if !self.is_capturing() {
            return CaptureOutcome::Ignored;
        }
        self.accurate.feed_point(at);
        self.fuzzy.feed_point(at);
        CaptureOutcome::Tracking
    }

    pub fn release(
        &mut self,
        at: Point,
        button: u8,
        window_info: &dyn WindowInfoProvider,
    ) -> CaptureOutcome {
        let press = match self.state {
            SessionState::Capturing(press) if press.button == button => press,
            _ => return CaptureOutcome::Ignored,
        };

        // the last stretch of a quick flick may never have produced a motion event
        self.accurate.feed_point(at);
        self.fuzzy.feed_point(at);
        self.state = SessionState::Idle;

        let advanced_movements = self.accurate.tokens_string();
        let basic_movements = self.fuzzy.tokens_string();

        if advanced_movements.is_empty() && basic_movements.is_empty() {
            tracing::debug!("no strokes captured, passing click through");
            return CaptureOutcome::PassThroughClick {
                button: press.button,
                at,
            };
        }

        let window = match window_info.focused_window_info() {
            Ok(window) => window,
            Err(err) => {
                tracing::warn!(?err, "failed to query focused window");
                WindowInfo::default()
            }
        };

        tracing::debug!(
            advanced = %advanced_movements,
            basic = %basic_movements,
            title = %window.title,
            class = %window.class,
            "gesture captured"
        );

        CaptureOutcome::Captured(CapturedMovement {
            basic_movements,
            advanced_movements,
            window_title: window.title,
            window_class: window.class,
            window_id: window.id,
            release_point: at,
        })
    }
}
