//! murmur-core — Pure types for local Piper TTS.
//!
//! No network, no audio device, no filesystem.

pub mod platform;
pub mod types;
pub mod voice;
pub mod wav;
