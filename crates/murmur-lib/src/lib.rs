//! murmur-lib — Local text-to-speech through the Piper engine.
//!
//! Engine install, voice download, subprocess synthesis, blocking playback,
//! and the `Speaker` facade over Piper and the host OS speech service.
//! Depends on murmur-core for pure types.

pub mod download;
pub mod error;
pub mod install;
pub mod playback;
pub mod provision;
pub mod speaker;
pub mod storage;
pub mod synth;

pub use error::{Error, Result};
pub use provision::{AssetProvisioner, VoiceAsset};
pub use speaker::{HostSpeaker, PiperSpeaker, Speaker};
pub use storage::AppStorage;

// Re-export murmur-core for convenience
pub use murmur_core;
