use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging.
///
/// The level is `info` unless `debug` is set, in which case it is `debug`
/// and `RUST_LOG` may override it. With `log_file` the output goes to that
/// file instead of stderr. Calling this twice keeps the first subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("logging already initialised");
        return;
    }

    // without debug logging `RUST_LOG` is ignored so a stray variable in the
    // environment cannot flood the grab loop with output
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_file.as_deref().and_then(split_log_path) {
        Some((dir, name)) => {
            if let Err(err) = std::fs::create_dir_all(&dir) {
                eprintln!("cannot create log directory {}: {err}", dir.display());
            }
            let appender = tracing_appender::rolling::never(dir, name);
            builder.with_ansi(false).with_writer(appender).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}

fn split_log_path(path: &std::path::Path) -> Option<(PathBuf, std::ffi::OsString)> {
    let name = path.file_name()?.to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}
