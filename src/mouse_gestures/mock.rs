//! In-memory collaborators for driving the gesture service without a display.

use crate::actions::keys::{KeyEmulator, KeyError, KeySym};
use crate::actions::shell::ProcessRunner;
use crate::actions::window::{WindowId, WindowOp, WindowOpExecutor};
use crate::actions::ActionBackends;
use crate::mouse_gestures::capture::{ClickEmulator, WindowInfo, WindowInfoProvider};
use crate::mouse_gestures::engine::Point;
use anyhow::anyhow;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    KeyDown(KeySym),
    KeyUp(KeySym),
    Window(WindowOp, WindowId),
    Run(String),
    Click { button: u8, at: Point },
}

#[derive(Default)]
struct RecordingState {
    calls: Mutex<Vec<BackendCall>>,
    window: Mutex<WindowInfo>,
    unmapped: Mutex<HashSet<KeySym>>,
    failing_commands: Mutex<bool>,
}

/// Records every call made through any action backend.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<RecordingState>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: WindowInfo) -> Self {
        let backend = Self::default();
        backend.set_window(window);
        backend
    }

    pub fn backends(&self) -> ActionBackends {
        ActionBackends {
            keys: Arc::new(self.clone()),
            windows: Arc::new(self.clone()),
            processes: Arc::new(self.clone()),
            clicks: Arc::new(self.clone()),
        }
    }

    pub fn set_window(&self, window: WindowInfo) {
        if let Ok(mut guard) = self.state.window.lock() {
            *guard = window;
        }
    }

    /// Make the key emulator report `sym` as having no key code.
    pub fn unmap_key(&self, sym: KeySym) {
        if let Ok(mut guard) = self.state.unmapped.lock() {
            guard.insert(sym);
        }
    }

    pub fn fail_commands(&self, fail: bool) {
        if let Ok(mut guard) = self.state.failing_commands.lock() {
            *guard = fail;
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state
            .calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.state.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: BackendCall) -> anyhow::Result<()> {
        let mut calls = self.state.calls.lock().map_err(|_| anyhow!("lock"))?;
        calls.push(call);
        Ok(())
    }
}

impl KeyEmulator for RecordingBackend {
    fn press_key(&self, sym: KeySym) -> Result<(), KeyError> {
        let unmapped = self
            .state
            .unmapped
            .lock()
            .map(|set| set.contains(&sym))
            .unwrap_or(false);
        if unmapped {
            return Err(KeyError::Unmapped(sym));
        }
        self.record(BackendCall::KeyDown(sym))
            .map_err(|err| KeyError::Backend(err.to_string()))
    }

    fn release_key(&self, sym: KeySym) -> Result<(), KeyError> {
        self.record(BackendCall::KeyUp(sym))
            .map_err(|err| KeyError::Backend(err.to_string()))
    }
}

impl WindowOpExecutor for RecordingBackend {
    fn iconify(&self, window: WindowId) -> anyhow::Result<()> {
        self.record(BackendCall::Window(WindowOp::Iconify, window))
    }

    fn raise(&self, window: WindowId) -> anyhow::Result<()> {
        self.record(BackendCall::Window(WindowOp::Raise, window))
    }

    fn lower(&self, window: WindowId) -> anyhow::Result<()> {
        self.record(BackendCall::Window(WindowOp::Lower, window))
    }

    fn maximize(&self, window: WindowId) -> anyhow::Result<()> {
        self.record(BackendCall::Window(WindowOp::Maximize, window))
    }

    fn kill(&self, window: WindowId) -> anyhow::Result<()> {
        self.record(BackendCall::Window(WindowOp::Kill, window))
    }
}

impl ProcessRunner for RecordingBackend {
    fn run(&self, command_line: &str) -> anyhow::Result<()> {
        let failing = self
            .state
            .failing_commands
            .lock()
            .map(|flag| *flag)
            .unwrap_or(false);
        if failing {
            return Err(anyhow!("cannot spawn `{command_line}`"));
        }
        self.record(BackendCall::Run(command_line.to_string()))
    }
}

impl ClickEmulator for RecordingBackend {
    fn emulate_click(&self, button: u8, at: Point) -> anyhow::Result<()> {
        self.record(BackendCall::Click { button, at })
    }
}

impl WindowInfoProvider for RecordingBackend {
    fn focused_window_info(&self) -> anyhow::Result<WindowInfo> {
        let window = self.state.window.lock().map_err(|_| anyhow!("lock"))?;
        Ok(window.clone())
    }
}

/// Window provider that always fails, as when nothing has focus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocusedWindow;

impl WindowInfoProvider for NoFocusedWindow {
    fn focused_window_info(&self) -> anyhow::Result<WindowInfo> {
        Err(anyhow!("no window has focus"))
    }
}
