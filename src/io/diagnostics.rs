use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, warn};

/// Per-run dump of intermediate artifacts; every write is best-effort
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    dir: Option<PathBuf>,
}

impl Diagnostics {
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Create `<root>/<input stem>-<YYYYMMDDTHHMMSS>`; falls back to disabled
    /// if the directory cannot be created
    pub fn create(root: &Path, input: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let dir = root.join(format!("{}-{}", stem, Local::now().format("%Y%m%dT%H%M%S")));

        match fs::create_dir_all(&dir) {
            Ok(()) => {
                debug!("Writing diagnostics to {}", dir.display());
                Self { dir: Some(dir) }
            }
            Err(e) => {
                warn!(
                    "Diagnostics disabled, cannot create {}: {}",
                    dir.display(),
                    e
                );
                Self::disabled()
            }
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn write_text(&self, name: &str, contents: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        let path = dir.join(name);
        if let Err(e) = fs::write(&path, contents) {
            warn!("Failed to write diagnostic {}: {}", path.display(), e);
        }
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) {
        if self.dir.is_none() {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write_text(name, &json),
            Err(e) => warn!("Failed to serialize diagnostic {}: {}", name, e),
        }
    }
}
