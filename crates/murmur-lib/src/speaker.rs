//! Speaker facade: one interface over the local Piper engine and the host
//! OS speech service.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use murmur_core::platform::{OsFamily, PlatformInfo};
use murmur_core::types::{Gender, HostVoice, ProvisionConfig};
use murmur_core::voice::{DEFAULT_VOICE, Quality, VoiceSpec};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::playback::{DevicePlayer, Player};
use crate::provision::{AssetProvisioner, VoiceAsset};
use crate::storage::AppStorage;
use crate::synth::SynthesisEngine;

pub trait Speaker {
    /// Speak `text`, returning once it has been heard.
    fn say(&self, text: &str) -> Result<()>;

    /// Render `text` into a WAV file at `dest`. The caller owns the file.
    fn save(&self, text: &str, dest: &Path) -> Result<()>;
}

// ─── Piper backend ─────────────────────────────────────────────────────────

/// Speaks through a locally installed Piper engine.
///
/// Construction provisions everything (engine install, voice download), so a
/// constructed speaker is ready to play.
pub struct PiperSpeaker {
    spec: VoiceSpec,
    storage: AppStorage,
    engine: SynthesisEngine,
    asset: VoiceAsset,
    player: Box<dyn Player>,
}

impl PiperSpeaker {
    /// Provision `voice` under `storage` for the current platform.
    /// `quality: None` picks the voice's best.
    pub fn new(
        storage: AppStorage,
        config: ProvisionConfig,
        voice: &str,
        quality: Option<Quality>,
    ) -> Result<Self> {
        let spec = VoiceSpec::new(voice, quality).map_err(Error::UnknownVoice)?;
        let platform = PlatformInfo::detect().map_err(Error::Platform)?;
        let provisioner = AssetProvisioner::new(storage, platform, config)?;
        Self::provision(&provisioner, spec)
    }

    /// [`PiperSpeaker::new`] with the default voice at its best quality.
    pub fn with_default_voice(storage: AppStorage, config: ProvisionConfig) -> Result<Self> {
        Self::new(storage, config, DEFAULT_VOICE, None)
    }

    /// Build on an existing provisioner (custom platform, progress callback).
    pub fn with_provisioner(
        provisioner: &AssetProvisioner,
        voice: &str,
        quality: Option<Quality>,
    ) -> Result<Self> {
        let spec = VoiceSpec::new(voice, quality).map_err(Error::UnknownVoice)?;
        Self::provision(provisioner, spec)
    }

    fn provision(provisioner: &AssetProvisioner, spec: VoiceSpec) -> Result<Self> {
        let exe = provisioner.ensure_engine_installed()?;
        let asset = provisioner.ensure_voice_asset(&spec)?;
        info!(
            "speaker ready: {} ({})",
            spec.asset_stem(),
            exe.display()
        );
        Ok(Self {
            spec,
            storage: provisioner.storage().clone(),
            engine: SynthesisEngine::new(exe),
            asset,
            player: Box::new(DevicePlayer),
        })
    }

    /// Replace the output device player.
    pub fn with_player(mut self, player: impl Player + 'static) -> Self {
        self.player = Box::new(player);
        self
    }

    pub fn voice(&self) -> &VoiceSpec {
        &self.spec
    }

    pub fn asset(&self) -> &VoiceAsset {
        &self.asset
    }
}

impl Speaker for PiperSpeaker {
    fn say(&self, text: &str) -> Result<()> {
        let temp_dir = self.storage.temp_dir();
        // Deleted on drop from here on, whichever way this function exits.
        let audio = tempfile::Builder::new()
            .prefix("say-")
            .suffix(".wav")
            .tempfile_in(&temp_dir)
            .map_err(|e| Error::storage(&temp_dir, e))?
            .into_temp_path();

        self.engine.render(&self.asset, text, &audio)?;
        self.player.play(&audio)?;

        audio.close().map_err(|e| Error::storage(&temp_dir, e))
    }

    fn save(&self, text: &str, dest: &Path) -> Result<()> {
        self.engine.render(&self.asset, text, dest)
    }
}

// ─── Host OS backend ───────────────────────────────────────────────────────

/// Speaks through the operating system's own speech service: `say` on
/// macOS, `espeak-ng` on Linux, System.Speech on Windows.
#[derive(Debug, Clone)]
pub struct HostSpeaker {
    voice: HostVoice,
    os: OsFamily,
}

impl HostSpeaker {
    pub fn new(voice: HostVoice) -> Result<Self> {
        let platform = PlatformInfo::detect().map_err(Error::Platform)?;
        Self::for_os(voice, platform.os)
    }

    pub fn for_os(voice: HostVoice, os: OsFamily) -> Result<Self> {
        voice.validate().map_err(Error::HostSpeech)?;
        Ok(Self { voice, os })
    }

    /// Command for the host service. Text always goes in on stdin; `output`
    /// switches from the speakers to a WAV file.
    fn command(&self, output: Option<&Path>) -> Command {
        let v = &self.voice;
        match self.os {
            OsFamily::Macos => {
                let mut cmd = Command::new("say");
                cmd.arg("-r").arg(v.rate.to_string());
                cmd.arg("-v").arg(match v.gender {
                    Gender::Female => "Samantha",
                    Gender::Male => "Alex",
                });
                if let Some(path) = output {
                    cmd.arg("-o")
                        .arg(path)
                        .arg("--file-format=WAVE")
                        .arg("--data-format=LEI16@22050");
                }
                cmd
            }
            OsFamily::Linux => {
                let mut cmd = Command::new("espeak-ng");
                cmd.arg("-s").arg(v.rate.to_string());
                cmd.arg("-a").arg(((v.volume * 100.0).round() as u32).to_string());
                cmd.arg("-v").arg(match v.gender {
                    Gender::Female => "en+f3",
                    Gender::Male => "en+m3",
                });
                if let Some(path) = output {
                    cmd.arg("-w").arg(path);
                }
                cmd.arg("--stdin");
                cmd
            }
            OsFamily::Windows => {
                let mut cmd = Command::new("powershell");
                cmd.args(["-NoProfile", "-NonInteractive", "-Command"])
                    .arg(self.windows_script(output));
                cmd
            }
        }
    }

    fn windows_script(&self, output: Option<&Path>) -> String {
        let v = &self.voice;
        // System.Speech rate runs -10..10 with 0 close to 165 wpm.
        let rate = ((v.rate as i32 - 165) / 15).clamp(-10, 10);
        let volume = (v.volume * 100.0).round() as u32;
        let gender = match v.gender {
            Gender::Female => "Female",
            Gender::Male => "Male",
        };
        let target = match output {
            Some(path) => format!(
                "$s.SetOutputToWaveFile('{}')",
                path.display().to_string().replace('\'', "''")
            ),
            None => "$s.SetOutputToDefaultAudioDevice()".to_string(),
        };
        format!(
            "Add-Type -AssemblyName System.Speech; \
             $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $s.SelectVoiceByHints([System.Speech.Synthesis.VoiceGender]::{gender}); \
             $s.Rate = {rate}; $s.Volume = {volume}; {target}; \
             $s.Speak([Console]::In.ReadToEnd()); $s.Dispose()"
        )
    }

    /// macOS `say` has no volume flag; it takes an embedded command instead.
    fn input(&self, text: &str) -> String {
        match self.os {
            OsFamily::Macos if self.voice.volume < 1.0 => {
                format!("[[volm {:.2}]] {text}", self.voice.volume)
            }
            _ => text.to_string(),
        }
    }

    fn run(&self, text: &str, output: Option<&Path>) -> Result<()> {
        let mut cmd = self.command(output);
        let program = cmd.get_program().to_string_lossy().into_owned();
        debug!("host speech: {program}");

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::HostSpeech(format!("failed to start {program}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(self.input(text).as_bytes()) {
                debug!("host speech: stdin write failed: {e}");
            }
        }

        let out = child
            .wait_with_output()
            .map_err(|e| Error::HostSpeech(format!("failed waiting for speech: {e}")))?;
        if !out.status.success() {
            return Err(Error::HostSpeech(format!(
                "{}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Speaker for HostSpeaker {
    fn say(&self, text: &str) -> Result<()> {
        self.run(text, None)
    }

    fn save(&self, text: &str, dest: &Path) -> Result<()> {
        self.run(text, Some(dest))
    }
}
