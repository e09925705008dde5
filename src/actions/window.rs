use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque platform window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowOp {
    Iconify,
    Raise,
    Lower,
    Maximize,
    Kill,
}

impl WindowOp {
    pub fn name(self) -> &'static str {
        match self {
            WindowOp::Iconify => "iconify",
            WindowOp::Raise => "raise",
            WindowOp::Lower => "lower",
            WindowOp::Maximize => "maximize",
            WindowOp::Kill => "kill",
        }
    }
}

impl fmt::Display for WindowOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Window-manager helper acting on one window.
pub trait WindowOpExecutor: Send + Sync {
    fn iconify(&self, window: WindowId) -> anyhow::Result<()>;
    fn raise(&self, window: WindowId) -> anyhow::Result<()>;
    fn lower(&self, window: WindowId) -> anyhow::Result<()>;
    fn maximize(&self, window: WindowId) -> anyhow::Result<()>;
    fn kill(&self, window: WindowId) -> anyhow::Result<()>;

    fn apply(&self, op: WindowOp, window: WindowId) -> anyhow::Result<()> {
        match op {
            WindowOp::Iconify => self.iconify(window),
            WindowOp::Raise => self.raise(window),
            WindowOp::Lower => self.lower(window),
            WindowOp::Maximize => self.maximize(window),
            WindowOp::Kill => self.kill(window),
        }
    }
}
