//! Piper subprocess invocation.
//!
//! One `render` is one process: spawned, fed the text on stdin, waited on.
//! Nothing survives the call.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};
use crate::provision::VoiceAsset;

#[derive(Debug, Clone)]
pub struct SynthesisEngine {
    executable: PathBuf,
}

impl SynthesisEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Render `text` with `voice` into a WAV file at `output`.
    pub fn render(&self, voice: &VoiceAsset, text: &str, output: &Path) -> Result<()> {
        debug!(
            "synth: {} chars -> {}",
            text.chars().count(),
            output.display()
        );

        let mut child = Command::new(&self.executable)
            .arg("-m")
            .arg(&voice.model)
            .arg("-c")
            .arg(&voice.config)
            .arg("-f")
            .arg(output)
            .arg("-q")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Synthesis {
                status: "not started".to_string(),
                stderr: format!("failed to spawn {}: {e}", self.executable.display()),
            })?;

        // Piper reads until EOF, so stdin must be closed before waiting.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                // A broken pipe means the engine already exited; its status
                // and stderr below say why.
                debug!("synth: stdin write failed: {e}");
            }
        }

        let output = child.wait_with_output().map_err(|e| Error::Synthesis {
            status: "unknown".to_string(),
            stderr: format!("failed to wait for engine: {e}"),
        })?;

        if !output.status.success() {
            return Err(Error::synthesis(output.status, &output.stderr));
        }
        Ok(())
    }
}
