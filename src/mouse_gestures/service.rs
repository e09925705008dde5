use crate::actions::{ActionBackends, ActionDispatcher, DispatchContext, DispatchReport};
use crate::common::json_watch::{watch_json, JsonWatcher};
use crate::mouse_gestures::capture::{
    CaptureOutcome, CaptureSession, CapturedMovement, PointerEvent, PointerEventSource,
    WindowInfoProvider,
};
use crate::mouse_gestures::db::{load_gestures, ConfigError, GestureConfig, SharedGestureConfig};
use crate::mouse_gestures::engine::Point;
use crate::mouse_gestures::selection::{resolve, MatchedSequence, Resolution};
use crate::settings::{Modifier, NoMatchBehavior, Settings};
use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reloads the gesture file into a shared configuration.
///
/// The new graph is compiled completely before it replaces the old one;
/// a file that fails to parse leaves the running configuration untouched.
#[derive(Clone)]
pub struct ConfigReloader {
    path: PathBuf,
    shared: SharedGestureConfig,
}

impl ConfigReloader {
    pub fn new(path: impl Into<PathBuf>, shared: SharedGestureConfig) -> Self {
        Self {
            path: path.into(),
            shared,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the items that were dropped while compiling.
    ///
    /// A file that is missing, unreadable or malformed leaves the running
    /// graph in place.
    pub fn reload(&self) -> anyhow::Result<Vec<ConfigError>> {
        std::fs::metadata(&self.path)
            .with_context(|| format!("reload {}", self.path.display()))?;
        let report = load_gestures(&self.path)
            .with_context(|| format!("reload {}", self.path.display()))?;
        tracing::info!(
            path = %self.path.display(),
            gestures = report.config.gesture_count(),
            dropped = report.errors.len(),
            "gesture configuration reloaded"
        );
        self.shared.store(Arc::new(report.config));
        Ok(report.errors)
    }

    /// Reload whenever the file changes on disk.
    pub fn watch(&self) -> notify::Result<JsonWatcher> {
        let reloader = self.clone();
        watch_json(&self.path, move || {
            if let Err(err) = reloader.reload() {
                tracing::error!(?err, "keeping previous gesture configuration");
            }
        })
    }
}

/// What became of one pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored,
    /// Consumed by an ongoing capture.
    Pending,
    /// The swallowed click was replayed.
    PassedThrough,
    Executed {
        context: String,
        gesture: String,
        via: MatchedSequence,
        report: DispatchReport,
    },
    /// A fatal action error stopped the action list.
    Failed {
        context: String,
        gesture: String,
        error: String,
    },
    Practiced {
        context: String,
        gesture: String,
        via: MatchedSequence,
    },
    Blocked {
        context: String,
    },
    NoMatch {
        advanced: String,
        basic: String,
    },
}

impl GestureOutcome {
    /// True once a press/release cycle has been fully handled.
    pub fn is_final(&self) -> bool {
        !matches!(self, GestureOutcome::Ignored | GestureOutcome::Pending)
    }
}

pub struct GestureService {
    config: SharedGestureConfig,
    reloader: Option<ConfigReloader>,
    session: CaptureSession,
    window_info: Arc<dyn WindowInfoProvider>,
    dispatcher: ActionDispatcher,
    modifier: Modifier,
    practice_mode: bool,
    no_match_behavior: NoMatchBehavior,
    shutdown: Arc<AtomicBool>,
}

impl GestureService {
    pub fn new(
        settings: &Settings,
        config: SharedGestureConfig,
        window_info: Arc<dyn WindowInfoProvider>,
        backends: ActionBackends,
    ) -> Self {
        let modifier = settings.grab_modifier().unwrap_or_else(|err| {
            tracing::warn!(%err, "grabbing with any modifier");
            Modifier::Any
        });
        Self {
            config,
            reloader: None,
            modifier,
            session: CaptureSession::new(settings.button, settings.stroke_threshold()),
            window_info,
            dispatcher: ActionDispatcher::new(backends),
            practice_mode: settings.practice_mode,
            no_match_behavior: settings.no_match_behavior,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_reloader(mut self, reloader: ConfigReloader) -> Self {
        self.reloader = Some(reloader);
        self
    }

    pub fn config_handle(&self) -> SharedGestureConfig {
        Arc::clone(&self.config)
    }

    pub fn replace_config(&self, config: GestureConfig) {
        self.config.store(Arc::new(config));
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Setting the returned flag makes [`GestureService::run`] return after
    /// the current event.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Reload the gesture file, if the service was given one.
    pub fn reload(&self) {
        let Some(reloader) = &self.reloader else {
            tracing::warn!("reconfigure requested but no gesture file is attached");
            return;
        };
        match reloader.reload() {
            Ok(errors) => {
                for err in errors {
                    tracing::warn!(%err, "gesture configuration item dropped");
                }
            }
            Err(err) => tracing::error!(?err, "keeping previous gesture configuration"),
        }
    }

    /// Pump events until the source closes or shutdown is requested.
    /// Returns the number of completed gestures.
    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    /// Grab the gesture button on `source`, then handle events until it
    /// closes or shutdown is requested. Returns the number of finished
    /// gestures.
    pub fn run(&mut self, source: &mut dyn PointerEventSource) -> usize {
        if let Err(err) = source.grab(self.session.button(), self.modifier) {
            tracing::error!(?err, "cannot grab the gesture button");
            return 0;
        }
        let mut handled = 0;
        while !self.shutdown.load(Ordering::SeqCst) {
            let Some(event) = source.next_event() else {
                tracing::debug!("pointer event source closed");
                break;
            };
            if self.handle_event(event).is_final() {
                handled += 1;
            }
        }
        handled
    }

    pub fn handle_event(&mut self, event: PointerEvent) -> GestureOutcome {
        match self.session.handle_event(event, self.window_info.as_ref()) {
            CaptureOutcome::Ignored => GestureOutcome::Ignored,
            CaptureOutcome::Started | CaptureOutcome::Tracking => GestureOutcome::Pending,
            CaptureOutcome::PassThroughClick { button, at } => {
                self.pass_through(button, at);
                GestureOutcome::PassedThrough
            }
            CaptureOutcome::Captured(captured) => self.process_movement(&captured),
        }
    }

    /// Resolve a captured movement and run what it is bound to.
    pub fn process_movement(&self, captured: &CapturedMovement) -> GestureOutcome {
        let config = self.config.load();
        let found = match resolve(&config, captured) {
            Resolution::Matched(found) => found,
            Resolution::Blocked(id) => {
                let context = config
                    .context(id)
                    .map(|ctx| ctx.name.clone())
                    .unwrap_or_default();
                return GestureOutcome::Blocked { context };
            }
            Resolution::NoMatch => return self.no_match(captured),
        };

        let (Some(context), Some(gesture)) = (config.context(found.context), config.gesture(found))
        else {
            return self.no_match(captured);
        };
        let context_name = context.name.clone();
        let gesture_name = gesture.name.clone();

        if self.practice_mode {
            tracing::info!(
                context = %context_name,
                gesture = %gesture_name,
                via = ?found.via,
                "practice match"
            );
            return GestureOutcome::Practiced {
                context: context_name,
                gesture: gesture_name,
                via: found.via,
            };
        }

        tracing::info!(context = %context_name, gesture = %gesture_name, "gesture matched");
        let window = captured.window();
        let ctx = DispatchContext {
            window: &window,
            pointer: captured.release_point,
        };
        match self.dispatcher.dispatch(&gesture.actions, &ctx) {
            Ok(report) => {
                if report.reload_requested {
                    self.reload();
                }
                GestureOutcome::Executed {
                    context: context_name,
                    gesture: gesture_name,
                    via: found.via,
                    report,
                }
            }
            Err(err) => GestureOutcome::Failed {
                context: context_name,
                gesture: gesture_name,
                error: err.to_string(),
            },
        }
    }

    fn no_match(&self, captured: &CapturedMovement) -> GestureOutcome {
        tracing::info!(
            advanced = %captured.advanced_movements,
            basic = %captured.basic_movements,
            title = %captured.window_title,
            class = %captured.window_class,
            "no gesture matched"
        );
        if self.no_match_behavior == NoMatchBehavior::PassThroughClick && !self.practice_mode {
            self.pass_through(self.session.button(), captured.release_point);
        }
        GestureOutcome::NoMatch {
            advanced: captured.advanced_movements.clone(),
            basic: captured.basic_movements.clone(),
        }
    }

    fn pass_through(&self, button: u8, at: Point) {
        if let Err(err) = self.dispatcher.backends().clicks.emulate_click(button, at) {
            tracing::warn!(?err, button, "failed to replay click");
        }
    }
}
