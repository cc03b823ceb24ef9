//! Blocking HTTP downloader with progress reporting via callback.
//!
//! Every fetch lands in a temp file under the storage `tmp/` directory. The
//! caller decides whether to publish it (rename into place) or drop it, and
//! dropping always deletes. Nothing is ever written under a final name here.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use murmur_core::types::DownloadProgress;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("murmur/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_BUF_LEN: usize = 64 * 1024;

/// Why a single fetch failed. `NotFound` is split out so callers can map it
/// to their own "does not exist" error before any cleanup or formatting.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not found")]
    NotFound,

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("body ended after {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid content: {0}")]
    Invalid(String),
}

type ProgressFn = dyn Fn(&DownloadProgress) + Send + Sync;

pub struct Downloader {
    client: Client,
    show_progress: bool,
    on_progress: Option<Box<ProgressFn>>,
}

impl Downloader {
    pub fn new(show_progress: bool) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            // Model files run to ~100 MB; bound the connect, not the transfer.
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            client,
            show_progress,
            on_progress: None,
        })
    }

    /// Receive a [`DownloadProgress`] after every chunk.
    pub fn with_progress(
        mut self,
        on_progress: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// GET `url` into a fresh temp file inside `temp_dir`.
    ///
    /// On any error the temp file is already gone when this returns.
    pub fn fetch(
        &self,
        url: &str,
        asset: &str,
        temp_dir: &Path,
    ) -> Result<NamedTempFile, FetchError> {
        debug!("download: GET {url}");
        let mut resp = self.client.get(url).send()?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let total = resp.content_length();
        let mut file = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(temp_dir)?;

        let mut buf = vec![0u8; READ_BUF_LEN];
        let mut bytes_done: u64 = 0;
        let mut last_logged_decile = 0u64;
        loop {
            let n = resp.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            bytes_done += n as u64;

            let percent = total
                .map(|t| (bytes_done as f32 / t.max(1) as f32 * 100.0).min(100.0))
                .unwrap_or(0.0);
            if self.show_progress {
                let decile = percent as u64 / 10;
                if decile > last_logged_decile {
                    last_logged_decile = decile;
                    info!("downloading {asset}: {percent:.0}%");
                }
            }
            self.report(DownloadProgress {
                asset: asset.to_string(),
                percent,
                bytes_done,
                bytes_total: total,
                status: "downloading".to_string(),
            });
        }

        if let Some(expected) = total {
            if bytes_done < expected {
                return Err(FetchError::Truncated {
                    received: bytes_done,
                    expected,
                });
            }
        }

        file.flush()?;
        file.as_file().sync_all()?;

        self.report(DownloadProgress {
            asset: asset.to_string(),
            percent: 100.0,
            bytes_done,
            bytes_total: total,
            status: "complete".to_string(),
        });
        debug!("download: {asset} complete ({bytes_done} bytes)");

        Ok(file)
    }

    fn report(&self, progress: DownloadProgress) {
        if let Some(cb) = &self.on_progress {
            cb(&progress);
        }
    }
}

/// Move a finished download to its final name.
pub fn publish(file: NamedTempFile, dest: &Path) -> std::io::Result<()> {
    file.persist(dest).map(|_| ()).map_err(|e| e.error)
}
