//! Error types for murmur-lib

use std::path::PathBuf;
use std::process::ExitStatus;

use murmur_core::voice::Quality;
use thiserror::Error;

use crate::download::FetchError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("engine install failed: {0}")]
    Install(String),

    #[error(
        "{voice}'s voice is not available in {quality} quality; \
         see {catalog} for all available voices and qualities"
    )]
    VoiceUnavailable {
        voice: String,
        quality: Quality,
        catalog: String,
    },

    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("synthesis failed ({status}): {stderr}")]
    Synthesis { status: String, stderr: String },

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("{0}")]
    UnknownVoice(String),

    #[error("{0}")]
    Platform(String),

    #[error("host speech failed: {0}")]
    HostSpeech(String),

    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn synthesis(status: ExitStatus, stderr: &[u8]) -> Self {
        Error::Synthesis {
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
