use crate::actions::keys::{KeyCombination, UnknownKey};
use crate::actions::shell::validate_command;
use crate::actions::window::WindowOp;
use crate::actions::{Action, ActionKind};
use arc_swap::ArcSwap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const GESTURES_FILE: &str = "mygestures.json";
pub const SCHEMA_VERSION: u32 = 1;
/// Longest accepted action value (key combination, command line, ...).
pub const MAX_ACTION_VALUE_LEN: usize = 4096;

pub const DEFAULT_GESTURES: &str = include_str!("default_gestures.json");

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("{owner}: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("movement `{0}` is defined more than once")]
    DuplicateMovement(String),
    #[error("gesture `{gesture}` references unknown movement `{movement}`")]
    UnknownMovement { gesture: String, movement: String },
    #[error("gesture `{0}` has neither a movement nor a pattern")]
    MissingMovement(String),
    #[error("no context with id {0}")]
    UnknownContext(usize),
    #[error("gesture `{gesture}`: unknown action kind `{kind}`")]
    UnknownActionKind { gesture: String, kind: String },
    #[error("gesture `{gesture}`: {kind} action needs a value")]
    MissingParameter { gesture: String, kind: ActionKind },
    #[error("gesture `{gesture}`: invalid {kind} value: {reason}")]
    InvalidParameter {
        gesture: String,
        kind: ActionKind,
        reason: String,
    },
    #[error("gesture `{gesture}`: {kind} value is longer than {max} bytes")]
    ParameterTooLong {
        gesture: String,
        kind: ActionKind,
        max: usize,
    },
    #[error("gesture `{gesture}`: unknown key `{key}`")]
    UnknownKey { gesture: String, key: String },
    #[error("gesture `{gesture}`: empty key combination")]
    EmptyKeyCombination { gesture: String },
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("unsupported gesture schema version {0}")]
    UnsupportedSchema(u32),
}

// On-disk model

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovementEntry {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionEntry {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ActionEntry {
    pub fn new(kind: &str, value: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GestureEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub abort: bool,
    #[serde(default)]
    pub gestures: Vec<GestureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GestureFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub movements: Vec<MovementEntry>,
    #[serde(default)]
    pub contexts: Vec<ContextEntry>,
}

impl Default for GestureFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            movements: Vec::new(),
            contexts: Vec::new(),
        }
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// Compiled graph

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub usize);

#[derive(Debug, Clone)]
pub struct Movement {
    pub name: String,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct Gesture {
    pub name: String,
    pub context: ContextId,
    pub movement: Arc<Movement>,
    pub actions: Vec<Action>,
}

impl Gesture {
    pub fn matches(&self, strokes: &str) -> bool {
        self.movement.pattern.is_match(strokes)
    }
}

#[derive(Debug, Clone)]
pub struct Context {
    pub name: String,
    pub title: Option<Regex>,
    pub class: Option<Regex>,
    /// Stop resolving here even when no gesture of this context matched.
    pub abort: bool,
    pub gestures: Vec<Gesture>,
}

impl Context {
    /// A context without any window pattern applies to every window.
    pub fn is_global(&self) -> bool {
        self.title.is_none() && self.class.is_none()
    }

    pub fn matches_window(&self, title: &str, class: &str) -> bool {
        let title_ok = self.title.as_ref().map_or(true, |re| re.is_match(title));
        let class_ok = self.class.as_ref().map_or(true, |re| re.is_match(class));
        title_ok && class_ok
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureConfig {
    movements: Vec<Arc<Movement>>,
    contexts: Vec<Context>,
}

impl GestureConfig {
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.0)
    }

    pub fn context_by_name(&self, name: &str) -> Option<ContextId> {
        self.contexts
            .iter()
            .position(|ctx| ctx.name == name)
            .map(ContextId)
    }

    pub fn movement(&self, name: &str) -> Option<&Arc<Movement>> {
        self.movements.iter().find(|m| m.name == name)
    }

    pub fn gesture_count(&self) -> usize {
        self.contexts.iter().map(|ctx| ctx.gestures.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

pub type SharedGestureConfig = Arc<ArcSwap<GestureConfig>>;

pub fn shared_config(config: GestureConfig) -> SharedGestureConfig {
    Arc::new(ArcSwap::from_pointee(config))
}

/// How a gesture names its stroke pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GesturePattern {
    Movement(String),
    Expression(String),
}

/// A compiled graph plus every item that had to be dropped on the way.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub config: GestureConfig,
    pub errors: Vec<ConfigError>,
}

/// Incrementally builds a [`GestureConfig`].
///
/// Every rejected item is logged and kept in the report; the item itself is
/// dropped while the builder stays usable.
#[derive(Debug, Default)]
pub struct GestureConfigBuilder {
    movements: Vec<Arc<Movement>>,
    contexts: Vec<Context>,
    errors: Vec<ConfigError>,
}

impl GestureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_movement(&mut self, name: &str, expression: &str) -> Result<(), ConfigError> {
        if self.movements.iter().any(|m| m.name == name) {
            return Err(self.reject(ConfigError::DuplicateMovement(name.to_string())));
        }
        let pattern = compile(&format!("movement `{name}`"), expression)
            .map_err(|err| self.reject(err))?;
        self.movements.push(Arc::new(Movement {
            name: name.to_string(),
            pattern,
        }));
        Ok(())
    }

    pub fn define_context(
        &mut self,
        name: &str,
        title: Option<&str>,
        class: Option<&str>,
        abort: bool,
    ) -> Result<ContextId, ConfigError> {
        let owner = format!("context `{name}`");
        let title = compile_optional(&owner, title).map_err(|err| self.reject(err))?;
        let class = compile_optional(&owner, class).map_err(|err| self.reject(err))?;
        let id = ContextId(self.contexts.len());
        self.contexts.push(Context {
            name: name.to_string(),
            title,
            class,
            abort,
            gestures: Vec::new(),
        });
        Ok(id)
    }

    /// Add a gesture to `context`. Actions that fail to load are dropped
    /// individually; the gesture keeps the rest.
    pub fn define_gesture(
        &mut self,
        context: ContextId,
        name: &str,
        pattern: GesturePattern,
        actions: &[ActionEntry],
    ) -> Result<(), ConfigError> {
        if context.0 >= self.contexts.len() {
            return Err(self.reject(ConfigError::UnknownContext(context.0)));
        }

        let movement = match pattern {
            GesturePattern::Movement(movement) => {
                match self.movements.iter().find(|m| m.name == movement) {
                    Some(found) => Arc::clone(found),
                    None => {
                        return Err(self.reject(ConfigError::UnknownMovement {
                            gesture: name.to_string(),
                            movement,
                        }))
                    }
                }
            }
            GesturePattern::Expression(expression) => {
                let pattern = compile(&format!("gesture `{name}`"), &expression)
                    .map_err(|err| self.reject(err))?;
                Arc::new(Movement {
                    name: name.to_string(),
                    pattern,
                })
            }
        };

        let mut compiled = Vec::with_capacity(actions.len());
        for entry in actions {
            match parse_action(name, entry) {
                Ok(action) => compiled.push(action),
                Err(err) => {
                    self.reject(err);
                }
            }
        }
        if compiled.is_empty() && !actions.is_empty() {
            tracing::warn!(gesture = name, "gesture has no usable actions left");
        }

        self.contexts[context.0].gestures.push(Gesture {
            name: name.to_string(),
            context,
            movement,
            actions: compiled,
        });
        Ok(())
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn build(self) -> GestureConfig {
        self.finish().config
    }

    pub fn finish(self) -> LoadReport {
        LoadReport {
            config: GestureConfig {
                movements: self.movements,
                contexts: self.contexts,
            },
            errors: self.errors,
        }
    }

    fn reject(&mut self, err: ConfigError) -> ConfigError {
        tracing::warn!(%err, "dropping gesture configuration item");
        self.errors.push(err.clone());
        err
    }
}

fn compile(owner: &str, expression: &str) -> Result<Regex, ConfigError> {
    Regex::new(expression).map_err(|source| ConfigError::InvalidPattern {
        owner: owner.to_string(),
        pattern: expression.to_string(),
        source,
    })
}

fn compile_optional(owner: &str, expression: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match expression.map(str::trim).filter(|e| !e.is_empty()) {
        Some(expression) => compile(owner, expression).map(Some),
        None => Ok(None),
    }
}

/// Turn a configured action into its resolved form.
pub fn parse_action(gesture: &str, entry: &ActionEntry) -> Result<Action, ConfigError> {
    let kind: ActionKind = entry
        .kind
        .parse()
        .map_err(|kind| ConfigError::UnknownActionKind {
            gesture: gesture.to_string(),
            kind,
        })?;

    let value = entry.value.as_deref().map(str::trim).filter(|v| !v.is_empty());
    if value.is_some_and(|v| v.len() > MAX_ACTION_VALUE_LEN) {
        return Err(ConfigError::ParameterTooLong {
            gesture: gesture.to_string(),
            kind,
            max: MAX_ACTION_VALUE_LEN,
        });
    }
    let required = || {
        value.ok_or_else(|| ConfigError::MissingParameter {
            gesture: gesture.to_string(),
            kind,
        })
    };

    match kind {
        ActionKind::Iconify => Ok(Action::Window(WindowOp::Iconify)),
        ActionKind::Raise => Ok(Action::Window(WindowOp::Raise)),
        ActionKind::Lower => Ok(Action::Window(WindowOp::Lower)),
        ActionKind::Maximize => Ok(Action::Window(WindowOp::Maximize)),
        ActionKind::Kill => Ok(Action::Window(WindowOp::Kill)),
        ActionKind::Keypress => {
            let combo = KeyCombination::parse(required()?).map_err(|UnknownKey(key)| {
                ConfigError::UnknownKey {
                    gesture: gesture.to_string(),
                    key,
                }
            })?;
            if combo.is_empty() {
                return Err(ConfigError::EmptyKeyCombination {
                    gesture: gesture.to_string(),
                });
            }
            Ok(Action::SendKeys(combo))
        }
        ActionKind::Exec => {
            let command = required()?;
            validate_command(command).map_err(|reason| ConfigError::InvalidParameter {
                gesture: gesture.to_string(),
                kind,
                reason,
            })?;
            Ok(Action::Exec(command.to_string()))
        }
        ActionKind::Click => {
            let button = match value {
                Some(v) => v.parse::<u8>().ok().filter(|b| *b > 0).ok_or_else(|| {
                    ConfigError::InvalidParameter {
                        gesture: gesture.to_string(),
                        kind,
                        reason: format!("`{v}` is not a button number"),
                    }
                })?,
                None => 1,
            };
            Ok(Action::Click { button })
        }
        ActionKind::Reconfigure => Ok(Action::Reconfigure),
    }
}

/// Compile a parsed gesture file, dropping whatever does not load.
pub fn compile_gestures(file: &GestureFile) -> LoadReport {
    let mut builder = GestureConfigBuilder::new();

    for movement in &file.movements {
        let _ = builder.define_movement(&movement.name, &movement.expression);
    }

    for context in &file.contexts {
        let Ok(id) = builder.define_context(
            &context.name,
            context.title.as_deref(),
            context.class.as_deref(),
            context.abort,
        ) else {
            continue;
        };

        for gesture in &context.gestures {
            let pattern = match (&gesture.movement, &gesture.pattern) {
                (Some(movement), _) => GesturePattern::Movement(movement.clone()),
                (None, Some(expression)) => GesturePattern::Expression(expression.clone()),
                (None, None) => {
                    builder.reject(ConfigError::MissingMovement(gesture.name.clone()));
                    continue;
                }
            };
            let _ = builder.define_gesture(id, &gesture.name, pattern, &gesture.actions);
        }
    }

    builder.finish()
}

pub fn read_gesture_file<P: AsRef<Path>>(path: P) -> anyhow::Result<GestureFile> {
    let content = match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };
    if content.trim().is_empty() {
        return Ok(GestureFile::default());
    }
    let file: GestureFile = serde_json::from_str(&content)?;
    if file.schema_version != SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedSchema(file.schema_version).into());
    }
    Ok(file)
}

pub fn load_gestures<P: AsRef<Path>>(path: P) -> anyhow::Result<LoadReport> {
    let file = read_gesture_file(path)?;
    Ok(compile_gestures(&file))
}

pub fn save_gestures<P: AsRef<Path>>(path: P, file: &GestureFile) -> anyhow::Result<()> {
    let mut file = file.clone();
    file.schema_version = SCHEMA_VERSION;
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}
