use mygestures::common::config_files::ensure_gestures_file;
use mygestures::mouse_gestures::db::{load_gestures, shared_config};
use mygestures::mouse_gestures::replay::{FocusTracker, JsonLinesSource, LoggingBackend};
use mygestures::mouse_gestures::{ConfigReloader, GestureService};
use mygestures::settings::{Settings, SETTINGS_FILE};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    let settings = Settings::load(&settings_path)?;
    mygestures::logging::init(settings.debug_logging, settings.log_file.clone());

    let modifier = settings.grab_modifier()?;
    tracing::info!(
        button = settings.button,
        %modifier,
        delta_min = settings.stroke_threshold(),
        practice = settings.practice_mode,
        "starting gesture recognition"
    );

    let gestures_path = settings.gestures_path(&settings_path);
    ensure_gestures_file(&gestures_path)?;
    let report = load_gestures(&gestures_path)?;
    for err in &report.errors {
        tracing::warn!(%err, "gesture configuration item dropped");
    }
    tracing::info!(
        path = %gestures_path.display(),
        contexts = report.config.contexts().len(),
        gestures = report.config.gesture_count(),
        "gesture configuration loaded"
    );

    let shared = shared_config(report.config);
    let reloader = ConfigReloader::new(&gestures_path, Arc::clone(&shared));
    let _watcher = if settings.watch_config {
        match reloader.watch() {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::warn!(?err, "cannot watch gesture file; reload with a gesture");
                None
            }
        }
    } else {
        None
    };

    let focus = FocusTracker::new();
    let backends = LoggingBackend::new(!settings.practice_mode).backends();
    let mut service = GestureService::new(&settings, shared, Arc::new(focus.clone()), backends)
        .with_reloader(reloader);

    let stdin = std::io::stdin();
    let mut source = JsonLinesSource::new(stdin.lock(), focus);
    let handled = service.run(&mut source);
    tracing::info!(handled, "event stream finished");
    Ok(())
}
