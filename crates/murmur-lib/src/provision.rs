//! Asset provisioning. Makes sure the Piper engine and a voice's model/config
//! pair are on disk before anything tries to synthesize.
//!
//! Both operations are idempotent: the only state is what exists under the
//! storage root. The engine counts as installed once `engine/` exists. Each
//! voice file is checked and completed on its own, so a model downloaded by
//! an earlier, interrupted run is kept and only the config is fetched.
//!
//! No locking: two provisioners racing on the same root may both download.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use murmur_core::platform::PlatformInfo;
use murmur_core::types::{DownloadProgress, ProvisionConfig};
use murmur_core::voice::VoiceSpec;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::download::{self, Downloader, FetchError};
use crate::error::{Error, Result};
use crate::install;
use crate::storage::AppStorage;

/// Model and config file of one (voice, quality).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceAsset {
    pub model: PathBuf,
    pub config: PathBuf,
}

#[derive(Deserialize)]
struct VoiceConfigFile {
    audio: AudioSection,
}

#[derive(Deserialize)]
struct AudioSection {
    sample_rate: u32,
}

impl VoiceAsset {
    /// Output sample rate declared in the voice config.
    pub fn sample_rate(&self) -> Result<u32> {
        let file = File::open(&self.config).map_err(|e| Error::storage(&self.config, e))?;
        let parsed = read_voice_config(BufReader::new(file)).map_err(|e| {
            Error::storage(&self.config, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        Ok(parsed.audio.sample_rate)
    }
}

fn read_voice_config(reader: impl std::io::Read) -> std::result::Result<VoiceConfigFile, String> {
    serde_json::from_reader(reader).map_err(|e| format!("malformed voice config: {e}"))
}

pub struct AssetProvisioner {
    storage: AppStorage,
    platform: PlatformInfo,
    config: ProvisionConfig,
    downloader: Downloader,
}

impl AssetProvisioner {
    pub fn new(storage: AppStorage, platform: PlatformInfo, config: ProvisionConfig) -> Result<Self> {
        let downloader = Downloader::new(config.show_progress)
            .map_err(|e| Error::Install(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            storage,
            platform,
            config,
            downloader,
        })
    }

    /// Forward per-chunk download progress to `on_progress`.
    pub fn with_progress(
        mut self,
        on_progress: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.downloader = self.downloader.with_progress(on_progress);
        self
    }

    pub fn storage(&self) -> &AppStorage {
        &self.storage
    }

    /// Where the engine executable lives once installed.
    pub fn engine_path(&self) -> PathBuf {
        self.storage
            .engine_dir()
            .join(self.platform.engine_executable())
    }

    /// Install the engine unless `engine/` already exists. Returns the
    /// executable path.
    pub fn ensure_engine_installed(&self) -> Result<PathBuf> {
        let engine_dir = self.storage.engine_dir();
        let exe = self.engine_path();
        if engine_dir.exists() {
            debug!("provision: engine present at {}", engine_dir.display());
            return Ok(exe);
        }

        let archive = self.platform.engine_archive();
        let url = format!(
            "{}/{}",
            self.config.engine_release_url.trim_end_matches('/'),
            archive.filename
        );
        info!("installing piper from {url}");

        let tmp = self
            .downloader
            .fetch(&url, archive.filename, &self.storage.temp_dir())
            .map_err(|e| Error::Install(format!("download of {url} failed: {e}")))?;

        install::install_archive(
            tmp.path(),
            archive.kind,
            self.storage.root(),
            &engine_dir,
            self.platform.engine_executable(),
        )
        .map_err(|e| Error::Install(format!("extracting {} failed: {e}", archive.filename)))?;

        if let Err(e) = tmp.close() {
            warn!("provision: could not remove engine archive: {e}");
        }
        info!("piper installed at {}", engine_dir.display());
        Ok(exe)
    }

    /// Resolve the voice's model and config, downloading whichever is absent.
    pub fn ensure_voice_asset(&self, spec: &VoiceSpec) -> Result<VoiceAsset> {
        let voices = self.storage.voices_dir();
        let asset = VoiceAsset {
            model: voices.join(spec.model_filename()),
            config: voices.join(spec.config_filename()),
        };
        let base = &self.config.voices_base_url;

        self.ensure_file(spec, &spec.model_url(base), &asset.model, |_| Ok(()))?;
        self.ensure_file(spec, &spec.config_url(base), &asset.config, |path| {
            let file = File::open(path).map_err(|e| e.to_string())?;
            read_voice_config(BufReader::new(file)).map(|_| ())
        })?;

        debug!("provision: voice {} ready", spec.asset_stem());
        Ok(asset)
    }

    fn ensure_file(
        &self,
        spec: &VoiceSpec,
        url: &str,
        dest: &Path,
        validate: impl Fn(&Path) -> std::result::Result<(), String>,
    ) -> Result<()> {
        if dest.is_file() {
            return Ok(());
        }
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.asset_stem());
        info!("downloading {name} for voice {}", spec.voice);

        let tmp = self
            .downloader
            .fetch(url, &name, &self.storage.temp_dir())
            .map_err(|e| self.fetch_error(spec, url, e))?;

        validate(tmp.path()).map_err(|e| Error::Download {
            url: url.to_string(),
            source: FetchError::Invalid(e),
        })?;

        download::publish(tmp, dest).map_err(|e| Error::storage(dest, e))
    }

    fn fetch_error(&self, spec: &VoiceSpec, url: &str, err: FetchError) -> Error {
        match err {
            FetchError::NotFound => Error::VoiceUnavailable {
                voice: spec.voice.to_string(),
                quality: spec.quality,
                catalog: spec.catalog_page(&self.config.catalog_url),
            },
            other => Error::Download {
                url: url.to_string(),
                source: other,
            },
        }
    }
}
