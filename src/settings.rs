use crate::mouse_gestures::capture::DEFAULT_BUTTON;
use crate::mouse_gestures::db::{ConfigError, GESTURES_FILE};
use crate::mouse_gestures::engine::DELTA_MIN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const SETTINGS_FILE: &str = "settings.json";

/// What to do with a drawn movement no gesture claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchBehavior {
    #[default]
    DoNothing,
    PassThroughClick,
}

/// Modifier that must be held together with the gesture button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Any,
    Shift,
    Ctrl,
    Alt,
    Win,
    Scroll,
    Num,
    Caps,
}

impl FromStr for Modifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "anymodifier" => Ok(Modifier::Any),
            "shift" | "shiftmask" => Ok(Modifier::Shift),
            "ctrl" | "control" | "controlmask" => Ok(Modifier::Ctrl),
            "alt" | "mod1" | "mod1mask" => Ok(Modifier::Alt),
            "win" | "super" | "mod4" | "mod4mask" => Ok(Modifier::Win),
            "scroll" | "scrolllock" | "mod5" | "mod5mask" => Ok(Modifier::Scroll),
            "num" | "numlock" | "mod2" | "mod2mask" => Ok(Modifier::Num),
            "caps" | "capslock" | "lock" | "lockmask" => Ok(Modifier::Caps),
            _ => Err(ConfigError::UnknownModifier(s.to_string())),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modifier::Any => "AnyModifier",
            Modifier::Shift => "Shift",
            Modifier::Ctrl => "Control",
            Modifier::Alt => "Alt",
            Modifier::Win => "Super",
            Modifier::Scroll => "ScrollLock",
            Modifier::Num => "NumLock",
            Modifier::Caps => "CapsLock",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Gesture file, relative paths resolve against the settings directory.
    #[serde(default = "default_gestures_file")]
    pub gestures_file: String,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_button")]
    pub button: u8,
    #[serde(default = "default_modifier")]
    pub modifier: String,
    #[serde(default = "default_delta_min")]
    pub delta_min: i32,
    #[serde(default)]
    pub no_match_behavior: NoMatchBehavior,
    /// Log matched gestures instead of running their actions.
    #[serde(default)]
    pub practice_mode: bool,
    #[serde(default = "default_watch_config")]
    pub watch_config: bool,
}

fn default_gestures_file() -> String {
    GESTURES_FILE.to_string()
}

fn default_button() -> u8 {
    DEFAULT_BUTTON
}

fn default_modifier() -> String {
    "AnyModifier".into()
}

fn default_delta_min() -> i32 {
    DELTA_MIN
}

fn default_watch_config() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gestures_file: default_gestures_file(),
            debug_logging: false,
            log_file: None,
            button: default_button(),
            modifier: default_modifier(),
            delta_min: default_delta_min(),
            no_match_behavior: NoMatchBehavior::default(),
            practice_mode: false,
            watch_config: default_watch_config(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn grab_modifier(&self) -> Result<Modifier, ConfigError> {
        self.modifier.parse()
    }

    /// Stroke threshold, falling back to the default for non-positive values.
    pub fn stroke_threshold(&self) -> i32 {
        if self.delta_min > 0 {
            self.delta_min
        } else {
            tracing::warn!(delta_min = self.delta_min, "invalid stroke threshold; using default");
            DELTA_MIN
        }
    }

    pub fn gestures_path(&self, settings_path: &Path) -> PathBuf {
        let file = Path::new(&self.gestures_file);
        if file.is_absolute() {
            return file.to_path_buf();
        }
        match settings_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}
