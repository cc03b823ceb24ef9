//! Piper voice catalog: voice identifiers, quality tiers and asset naming.
//!
//! Every voice has a fixed maximum quality. A [`VoiceSpec`] built without an
//! explicit quality resolves to that maximum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fidelity tier of a voice model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(format!(
                "invalid quality '{other}'; valid qualities: low, medium, high"
            )),
        }
    }
}

/// Language/region a voice was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "en_GB")]
    EnGb,
}

impl Locale {
    /// Region code used in file names, e.g. `en_US`.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::EnUs => "en_US",
            Locale::EnGb => "en_GB",
        }
    }

    /// Language family directory in the catalog, e.g. `en`.
    pub fn language(&self) -> &'static str {
        match self {
            Locale::EnUs | Locale::EnGb => "en",
        }
    }
}

/// One row of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceEntry {
    pub id: &'static str,
    pub locale: Locale,
    pub max_quality: Quality,
}

const fn entry(id: &'static str, locale: Locale, max_quality: Quality) -> VoiceEntry {
    VoiceEntry {
        id,
        locale,
        max_quality,
    }
}

/// Known voices and the highest quality each is published in.
pub const VOICES: &[VoiceEntry] = &[
    entry("amy", Locale::EnUs, Quality::Medium),
    entry("arctic", Locale::EnUs, Quality::Medium),
    entry("bryce", Locale::EnUs, Quality::Medium),
    entry("danny", Locale::EnUs, Quality::Low),
    entry("hfc_female", Locale::EnUs, Quality::Medium),
    entry("hfc_male", Locale::EnUs, Quality::Medium),
    entry("joe", Locale::EnUs, Quality::Medium),
    entry("john", Locale::EnUs, Quality::Medium),
    entry("kathleen", Locale::EnUs, Quality::Low),
    entry("kristin", Locale::EnUs, Quality::Medium),
    entry("kusal", Locale::EnUs, Quality::Medium),
    entry("l2arctic", Locale::EnUs, Quality::Medium),
    entry("lessac", Locale::EnUs, Quality::High),
    entry("libritts", Locale::EnUs, Quality::High),
    entry("libritts_r", Locale::EnUs, Quality::Medium),
    entry("ljspeech", Locale::EnUs, Quality::High),
    entry("norman", Locale::EnUs, Quality::Medium),
    entry("ryan", Locale::EnUs, Quality::High),
    entry("alan", Locale::EnGb, Quality::Medium),
    entry("alba", Locale::EnGb, Quality::Medium),
    entry("aru", Locale::EnGb, Quality::Medium),
    entry("cori", Locale::EnGb, Quality::High),
    entry("jenny_dioco", Locale::EnGb, Quality::Medium),
    entry("northern_english_male", Locale::EnGb, Quality::Medium),
    entry("semaine", Locale::EnGb, Quality::Medium),
    entry("southern_english_female", Locale::EnGb, Quality::Low),
    entry("vctk", Locale::EnGb, Quality::Medium),
];

/// Voice used when none is requested.
pub const DEFAULT_VOICE: &str = "amy";

/// Look up a catalog entry by identifier.
pub fn find_voice(id: &str) -> Result<&'static VoiceEntry, String> {
    VOICES.iter().find(|v| v.id == id).ok_or_else(|| {
        let valid: Vec<&str> = VOICES.iter().map(|v| v.id).collect();
        format!("unknown voice '{id}'; valid voices: {}", valid.join(", "))
    })
}

/// A validated (voice, quality) request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceSpec {
    pub voice: &'static str,
    pub locale: Locale,
    pub quality: Quality,
}

impl VoiceSpec {
    /// Validate `voice` against the catalog. `None` quality resolves to the
    /// voice's maximum.
    pub fn new(voice: &str, quality: Option<Quality>) -> Result<Self, String> {
        let entry = find_voice(voice)?;
        Ok(Self {
            voice: entry.id,
            locale: entry.locale,
            quality: quality.unwrap_or(entry.max_quality),
        })
    }

    /// Shared stem of the model and config file names,
    /// e.g. `en_US-amy-medium`.
    pub fn asset_stem(&self) -> String {
        format!("{}-{}-{}", self.locale.code(), self.voice, self.quality)
    }

    pub fn model_filename(&self) -> String {
        format!("{}.onnx", self.asset_stem())
    }

    pub fn config_filename(&self) -> String {
        format!("{}.onnx.json", self.asset_stem())
    }

    /// Remote directory holding this voice's files under `base_url`.
    fn remote_dir(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.locale.language(),
            self.locale.code(),
            self.voice,
            self.quality
        )
    }

    pub fn model_url(&self, base_url: &str) -> String {
        format!("{}/{}?download=true", self.remote_dir(base_url), self.model_filename())
    }

    pub fn config_url(&self, base_url: &str) -> String {
        format!("{}/{}?download=true", self.remote_dir(base_url), self.config_filename())
    }

    /// Human-browsable page listing every voice/quality for this locale.
    pub fn catalog_page(&self, catalog_url: &str) -> String {
        format!(
            "{}/{}/{}",
            catalog_url.trim_end_matches('/'),
            self.locale.language(),
            self.locale.code()
        )
    }
}
