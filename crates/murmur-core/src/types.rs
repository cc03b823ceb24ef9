//! Shared configuration and event types.
//!
//! Kept in murmur-core so callers can build configuration without pulling in
//! reqwest, rodio, or other heavy deps.

use serde::{Deserialize, Serialize};

use crate::platform::ENGINE_RELEASE_URL;

// ─── Provisioning config ───────────────────────────────────────────────────

/// Where the engine and voices are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Release directory holding the per-platform engine archives.
    pub engine_release_url: String,
    /// Root the voice model/config files are resolved against.
    pub voices_base_url: String,
    /// Browsable catalog root, quoted in "voice unavailable" errors.
    pub catalog_url: String,
    /// Log download progress at info level.
    pub show_progress: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            engine_release_url: ENGINE_RELEASE_URL.into(),
            voices_base_url: "https://huggingface.co/rhasspy/piper-voices/resolve/main".into(),
            catalog_url: "https://huggingface.co/rhasspy/piper-voices/tree/main".into(),
            show_progress: true,
        }
    }
}

// ─── Host speech config ────────────────────────────────────────────────────

/// Voice gender requested from the host speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Host speech backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostVoice {
    pub gender: Gender,
    /// Words per minute.
    pub rate: u32,
    /// 0.0–1.0
    pub volume: f32,
}

impl Default for HostVoice {
    fn default() -> Self {
        Self {
            gender: Gender::Female,
            rate: 165,
            volume: 1.0,
        }
    }
}

impl HostVoice {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(format!("volume {} out of range 0.0–1.0", self.volume));
        }
        if self.rate == 0 {
            return Err("rate must be positive".to_string());
        }
        Ok(())
    }
}

// ─── Download types ────────────────────────────────────────────────────────

/// Download progress payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub asset: String,
    pub percent: f32,
    pub bytes_done: u64,
    pub bytes_total: Option<u64>,
    pub status: String, // "downloading" | "complete"
}
