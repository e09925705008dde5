//! Line-oriented event feed used by the `mygestures` binary.
//!
//! Each line is one JSON object:
//!
//! ```text
//! {"type":"focus","title":"Mozilla Firefox","class":"firefox","id":42}
//! {"type":"press","x":100,"y":100,"button":3}
//! {"type":"motion","x":40,"y":100}
//! {"type":"release","x":40,"y":100,"button":3}
//! ```

use crate::actions::keys::{KeyEmulator, KeyError, KeySym};
use crate::actions::shell::{ProcessRunner, ShellRunner};
use crate::actions::window::{WindowId, WindowOpExecutor};
use crate::actions::ActionBackends;
use crate::mouse_gestures::capture::{
    ClickEmulator, PointerEvent, PointerEventSource, WindowInfo, WindowInfoProvider,
};
use crate::mouse_gestures::engine::Point;
use anyhow::anyhow;
use serde::Deserialize;
use std::io::BufRead;
use std::sync::{Arc, Mutex};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayLine {
    Press { x: i32, y: i32, button: u8 },
    Motion { x: i32, y: i32 },
    Release { x: i32, y: i32, button: u8 },
    Focus(WindowInfo),
}

/// Window reported by the most recent `focus` line.
#[derive(Clone, Default)]
pub struct FocusTracker {
    current: Arc<Mutex<WindowInfo>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, window: WindowInfo) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = window;
        }
    }
}

impl WindowInfoProvider for FocusTracker {
    fn focused_window_info(&self) -> anyhow::Result<WindowInfo> {
        let guard = self.current.lock().map_err(|_| anyhow!("lock"))?;
        Ok(guard.clone())
    }
}

pub struct JsonLinesSource<R> {
    reader: R,
    focus: FocusTracker,
    line_no: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, focus: FocusTracker) -> Self {
        Self {
            reader,
            focus,
            line_no: 0,
        }
    }
}

impl<R: BufRead> PointerEventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Option<PointerEvent> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(?err, "failed to read event line");
                    return None;
                }
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<ReplayLine>(trimmed) {
                Ok(ReplayLine::Press { x, y, button }) => {
                    return Some(PointerEvent::Press { x, y, button })
                }
                Ok(ReplayLine::Motion { x, y }) => return Some(PointerEvent::Motion { x, y }),
                Ok(ReplayLine::Release { x, y, button }) => {
                    return Some(PointerEvent::Release { x, y, button })
                }
                Ok(ReplayLine::Focus(window)) => self.focus.set(window),
                Err(err) => tracing::warn!(line = self.line_no, %err, "skipping malformed event"),
            }
        }
    }
}

/// Backend that only reports what it would do, except for commands when
/// `run_commands` is set.
#[derive(Clone, Default)]
pub struct LoggingBackend {
    run_commands: bool,
}

impl LoggingBackend {
    pub fn new(run_commands: bool) -> Self {
        Self { run_commands }
    }

    pub fn backends(&self) -> ActionBackends {
        ActionBackends {
            keys: Arc::new(self.clone()),
            windows: Arc::new(self.clone()),
            processes: Arc::new(self.clone()),
            clicks: Arc::new(self.clone()),
        }
    }
}

impl KeyEmulator for LoggingBackend {
    fn press_key(&self, sym: KeySym) -> Result<(), KeyError> {
        tracing::info!(keysym = format_args!("{:#x}", sym.0), "key down");
        Ok(())
    }

    fn release_key(&self, sym: KeySym) -> Result<(), KeyError> {
        tracing::info!(keysym = format_args!("{:#x}", sym.0), "key up");
        Ok(())
    }
}

impl WindowOpExecutor for LoggingBackend {
    fn iconify(&self, window: WindowId) -> anyhow::Result<()> {
        tracing::info!(window = window.0, "iconify");
        Ok(())
    }

    fn raise(&self, window: WindowId) -> anyhow::Result<()> {
        tracing::info!(window = window.0, "raise");
        Ok(())
    }

    fn lower(&self, window: WindowId) -> anyhow::Result<()> {
        tracing::info!(window = window.0, "lower");
        Ok(())
    }

    fn maximize(&self, window: WindowId) -> anyhow::Result<()> {
        tracing::info!(window = window.0, "maximize");
        Ok(())
    }

    fn kill(&self, window: WindowId) -> anyhow::Result<()> {
        tracing::info!(window = window.0, "kill");
        Ok(())
    }
}

impl ProcessRunner for LoggingBackend {
    fn run(&self, command_line: &str) -> anyhow::Result<()> {
        if self.run_commands {
            return ShellRunner.run(command_line);
        }
        tracing::info!(command = %command_line, "would run command");
        Ok(())
    }
}

impl ClickEmulator for LoggingBackend {
    fn emulate_click(&self, button: u8, at: Point) -> anyhow::Result<()> {
        tracing::info!(button, x = at.x, y = at.y, "click");
        Ok(())
    }
}
