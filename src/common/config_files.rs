use crate::mouse_gestures::db::DEFAULT_GESTURES;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFileResult {
    Opened { path: PathBuf },
    Created { path: PathBuf },
}

impl ConfigFileResult {
    pub fn path(&self) -> &Path {
        match self {
            ConfigFileResult::Opened { path } | ConfigFileResult::Created { path } => path,
        }
    }
}

/// Make sure `path` exists, writing `default_contents` to it otherwise.
pub fn ensure_config_file(path: &Path, default_contents: &str) -> anyhow::Result<ConfigFileResult> {
    let path = path.to_path_buf();
    if path.exists() {
        return Ok(ConfigFileResult::Opened { path });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_contents)?;
    Ok(ConfigFileResult::Created { path })
}

/// Seed a first-run gesture file with the built-in bindings.
pub fn ensure_gestures_file(path: &Path) -> anyhow::Result<ConfigFileResult> {
    let result = ensure_config_file(path, DEFAULT_GESTURES)?;
    if let ConfigFileResult::Created { path } = &result {
        tracing::info!(path = %path.display(), "wrote default gesture file");
    }
    Ok(result)
}
