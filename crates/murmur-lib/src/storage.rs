//! Per-application storage root.
//!
//! ```text
//! <root>/
//!   engine/   installed Piper executable and its libraries
//!   voices/   <locale>-<voice>-<quality>.onnx + .onnx.json pairs
//!   tmp/      in-flight downloads and rendered audio awaiting playback
//! ```
//!
//! Constructed once at startup and handed to whatever needs it. Nothing here
//! ever deletes the root.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

const APP_NAME: &str = "murmur";

#[derive(Debug, Clone)]
pub struct AppStorage {
    root: PathBuf,
}

impl AppStorage {
    /// Open (creating if absent) a storage root at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self { root: root.into() };
        for dir in [storage.root.clone(), storage.voices_dir(), storage.temp_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| Error::storage(&dir, e))?;
        }
        debug!("storage: opened {}", storage.root.display());
        Ok(storage)
    }

    /// Open the platform's per-user config location, e.g.
    /// `~/.config/murmur` or `%APPDATA%\murmur`.
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            Error::Platform("cannot determine the user config directory".to_string())
        })?;
        Self::open(base.join(APP_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install directory of the engine. Its existence means "installed".
    pub fn engine_dir(&self) -> PathBuf {
        self.root.join("engine")
    }

    pub fn voices_dir(&self) -> PathBuf {
        self.root.join("voices")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}
