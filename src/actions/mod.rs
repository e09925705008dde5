pub mod keys;
pub mod shell;
pub mod window;

use crate::mouse_gestures::capture::{ClickEmulator, WindowInfo};
use crate::mouse_gestures::engine::Point;
use keys::{KeyCombination, KeyEmulator, KeyError};
use shell::ProcessRunner;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use window::{WindowOp, WindowOpExecutor};

/// One step bound to a gesture, resolved at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendKeys(KeyCombination),
    Window(WindowOp),
    Exec(String),
    Click { button: u8 },
    /// Reload the gesture configuration once the current list finished.
    Reconfigure,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SendKeys(_) => ActionKind::Keypress,
            Action::Window(WindowOp::Iconify) => ActionKind::Iconify,
            Action::Window(WindowOp::Raise) => ActionKind::Raise,
            Action::Window(WindowOp::Lower) => ActionKind::Lower,
            Action::Window(WindowOp::Maximize) => ActionKind::Maximize,
            Action::Window(WindowOp::Kill) => ActionKind::Kill,
            Action::Exec(_) => ActionKind::Exec,
            Action::Click { .. } => ActionKind::Click,
            Action::Reconfigure => ActionKind::Reconfigure,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SendKeys(keys) => write!(f, "keypress {keys}"),
            Action::Window(op) => write!(f, "{op}"),
            Action::Exec(cmd) => write!(f, "exec {cmd}"),
            Action::Click { button } => write!(f, "click {button}"),
            Action::Reconfigure => f.write_str("reconfigure"),
        }
    }
}

/// Tag naming an action kind in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Keypress,
    Exec,
    Iconify,
    Raise,
    Lower,
    Maximize,
    Kill,
    Click,
    Reconfigure,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Keypress => "keypress",
            ActionKind::Exec => "exec",
            ActionKind::Iconify => "iconify",
            ActionKind::Raise => "raise",
            ActionKind::Lower => "lower",
            ActionKind::Maximize => "maximize",
            ActionKind::Kill => "kill",
            ActionKind::Click => "click",
            ActionKind::Reconfigure => "reconfigure",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keypress" | "keys" | "send_keys" => Ok(ActionKind::Keypress),
            "exec" | "execute" => Ok(ActionKind::Exec),
            "iconify" | "minimize" => Ok(ActionKind::Iconify),
            "raise" => Ok(ActionKind::Raise),
            "lower" => Ok(ActionKind::Lower),
            "maximize" => Ok(ActionKind::Maximize),
            "kill" => Ok(ActionKind::Kill),
            "click" => Ok(ActionKind::Click),
            "reconfigure" | "reload" => Ok(ActionKind::Reconfigure),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("could not send `{keys}`: {source}")]
    KeyLookup {
        keys: String,
        #[source]
        source: KeyError,
    },
    #[error("{kind} handler received `{action}`")]
    KindMismatch { kind: ActionKind, action: String },
    #[error("{kind} action failed: {message}")]
    Backend { kind: ActionKind, message: String },
}

impl DispatchError {
    /// Fatal errors abort the rest of the gesture's action list.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DispatchError::Backend { .. })
    }
}

/// Platform collaborators the dispatcher delegates to.
#[derive(Clone)]
pub struct ActionBackends {
    pub keys: Arc<dyn KeyEmulator>,
    pub windows: Arc<dyn WindowOpExecutor>,
    pub processes: Arc<dyn ProcessRunner>,
    pub clicks: Arc<dyn ClickEmulator>,
}

/// Where the gesture finished.
#[derive(Debug, Clone)]
pub struct DispatchContext<'a> {
    pub window: &'a WindowInfo,
    pub pointer: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub executed: usize,
    pub failed: usize,
    pub reload_requested: bool,
}

type ActionHandler =
    fn(&ActionDispatcher, &Action, &DispatchContext<'_>, &mut DispatchReport) -> Result<(), DispatchError>;

fn handler_for(kind: ActionKind) -> ActionHandler {
    match kind {
        ActionKind::Keypress => ActionDispatcher::send_keys,
        ActionKind::Exec => ActionDispatcher::exec,
        ActionKind::Iconify
        | ActionKind::Raise
        | ActionKind::Lower
        | ActionKind::Maximize
        | ActionKind::Kill => ActionDispatcher::window_op,
        ActionKind::Click => ActionDispatcher::click,
        ActionKind::Reconfigure => ActionDispatcher::reconfigure,
    }
}

pub struct ActionDispatcher {
    backends: ActionBackends,
}

impl ActionDispatcher {
    pub fn new(backends: ActionBackends) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &ActionBackends {
        &self.backends
    }

    /// Execute `actions` in order.
    ///
    /// Non-fatal failures are logged and counted; the first fatal one stops
    /// the list and is returned.
    pub fn dispatch(
        &self,
        actions: &[Action],
        ctx: &DispatchContext<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        let mut report = DispatchReport::default();
        for action in actions {
            let handler = handler_for(action.kind());
            match handler(self, action, ctx, &mut report) {
                Ok(()) => report.executed += 1,
                Err(err) if err.is_fatal() => {
                    tracing::error!(%action, %err, "aborting gesture actions");
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(%action, %err, "gesture action failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    fn send_keys(
        &self,
        action: &Action,
        _ctx: &DispatchContext<'_>,
        _report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        let Action::SendKeys(combo) = action else {
            return Err(mismatch(ActionKind::Keypress, action));
        };
        tracing::debug!(keys = %combo, "sending key combination");
        combo
            .send(self.backends.keys.as_ref())
            .map_err(|source| match source {
                KeyError::Unmapped(_) => DispatchError::KeyLookup {
                    keys: combo.to_string(),
                    source,
                },
                KeyError::Backend(message) => DispatchError::Backend {
                    kind: ActionKind::Keypress,
                    message,
                },
            })
    }

    fn exec(
        &self,
        action: &Action,
        _ctx: &DispatchContext<'_>,
        _report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        let Action::Exec(command) = action else {
            return Err(mismatch(ActionKind::Exec, action));
        };
        tracing::debug!(command = %command, "running command");
        self.backends
            .processes
            .run(command)
            .map_err(|err| backend(ActionKind::Exec, err))
    }

    fn window_op(
        &self,
        action: &Action,
        ctx: &DispatchContext<'_>,
        _report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        let Action::Window(op) = action else {
            return Err(mismatch(action.kind(), action));
        };
        let kind = action.kind();
        let Some(window) = ctx.window.id else {
            return Err(DispatchError::Backend {
                kind,
                message: "no focused window".to_string(),
            });
        };
        tracing::debug!(%op, window = window.0, "window operation");
        self.backends
            .windows
            .apply(*op, window)
            .map_err(|err| backend(kind, err))
    }

    fn click(
        &self,
        action: &Action,
        ctx: &DispatchContext<'_>,
        _report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        let Action::Click { button } = action else {
            return Err(mismatch(ActionKind::Click, action));
        };
        self.backends
            .clicks
            .emulate_click(*button, ctx.pointer)
            .map_err(|err| backend(ActionKind::Click, err))
    }

    fn reconfigure(
        &self,
        action: &Action,
        _ctx: &DispatchContext<'_>,
        report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        if !matches!(action, Action::Reconfigure) {
            return Err(mismatch(ActionKind::Reconfigure, action));
        }
        report.reload_requested = true;
        Ok(())
    }
}

fn mismatch(kind: ActionKind, action: &Action) -> DispatchError {
    DispatchError::KindMismatch {
        kind,
        action: action.to_string(),
    }
}

fn backend(kind: ActionKind, err: anyhow::Error) -> DispatchError {
    DispatchError::Backend {
        kind,
        message: format!("{err:#}"),
    }
}
