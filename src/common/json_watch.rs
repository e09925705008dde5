use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Keeps a file watch alive; dropping it stops the callbacks.
pub struct JsonWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl JsonWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Call `callback` whenever the JSON file at `path` is written, replaced or
/// removed.
///
/// The parent directory is watched so editors that save through a rename
/// keep triggering the callback.
pub fn watch_json<F, P>(path: P, mut callback: F) -> notify::Result<JsonWatcher>
where
    F: FnMut() + Send + 'static,
    P: AsRef<Path>,
{
    let path = path.as_ref().to_path_buf();
    let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(ev) => {
                if !matches!(
                    ev.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let concerns_file = ev
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if concerns_file {
                    callback();
                }
            }
            Err(e) => tracing::error!("watch error: {:?}", e),
        },
        Config::default(),
    )?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .or_else(|_| watcher.watch(&path, RecursiveMode::NonRecursive))?;

    tracing::debug!(path = %path.display(), "watching configuration file");
    Ok(JsonWatcher {
        path,
        _watcher: watcher,
    })
}
