#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use murmur_core::platform::PlatformInfo;
use murmur_core::types::ProvisionConfig;
use murmur_core::voice::VoiceSpec;
use murmur_core::wav::write_wav;
use murmur_lib::{AppStorage, AssetProvisioner};
use tempfile::TempDir;

/// Nothing listens here; any request that slips through fails fast.
pub const OFFLINE_URL: &str = "http://127.0.0.1:9";

pub const VOICE_CONFIG: &str = r#"{"audio": {"sample_rate": 22050}, "num_speakers": 1}"#;

pub struct Fixture {
    pub dir: TempDir,
    pub storage: AppStorage,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let dir = TempDir::new().unwrap();
        let storage = AppStorage::open(dir.path().join("murmur")).unwrap();
        Self { dir, storage }
    }

    pub fn linux() -> PlatformInfo {
        PlatformInfo::from_parts("linux", "x86_64").unwrap()
    }

    /// Provisioning config pointing every remote at `base`.
    pub fn config(base: &str) -> ProvisionConfig {
        ProvisionConfig {
            engine_release_url: format!("{base}/release"),
            voices_base_url: format!("{base}/voices"),
            catalog_url: format!("{base}/tree"),
            show_progress: false,
        }
    }

    pub fn provisioner(&self, base: &str, platform: PlatformInfo) -> AssetProvisioner {
        AssetProvisioner::new(self.storage.clone(), platform, Self::config(base)).unwrap()
    }

    /// A 0.1 s silent mono clip every fake engine copies to its output.
    pub fn fixture_wav(&self) -> PathBuf {
        let path = self.dir.path().join("fixture.wav");
        if !path.exists() {
            std::fs::write(&path, write_wav(&[0i16; 2205], 1, 22050)).unwrap();
        }
        path
    }

    /// Install a shell script as the engine. `body` sees piper's argv, with
    /// the output path in `$6`.
    #[cfg(unix)]
    pub fn install_fake_engine(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let engine_dir = self.storage.engine_dir();
        std::fs::create_dir_all(&engine_dir).unwrap();
        let exe = engine_dir.join("piper");
        std::fs::write(&exe, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    /// Engine that swallows stdin and writes the fixture WAV.
    #[cfg(unix)]
    pub fn install_working_engine(&self) -> PathBuf {
        let wav = self.fixture_wav();
        self.install_fake_engine(&format!("cat > /dev/null\ncp '{}' \"$6\"", wav.display()))
    }

    /// Engine that starts writing its output, then fails.
    #[cfg(unix)]
    pub fn install_failing_engine(&self) -> PathBuf {
        self.install_fake_engine(
            "cat > /dev/null\nprintf 'RIFF' > \"$6\"\necho 'phonemizer crashed' >&2\nexit 1",
        )
    }

    pub fn install_voice(&self, spec: &VoiceSpec) {
        let voices = self.storage.voices_dir();
        std::fs::write(voices.join(spec.model_filename()), b"onnx").unwrap();
        std::fs::write(voices.join(spec.config_filename()), VOICE_CONFIG).unwrap();
    }

    pub fn temp_entries(&self) -> Vec<PathBuf> {
        list(&self.storage.temp_dir())
    }

    pub fn voice_entries(&self) -> Vec<PathBuf> {
        list(&self.storage.voices_dir())
    }
}

pub fn list(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

/// A release-style tarball: everything under a top-level `piper/`.
pub fn engine_tarball() -> Vec<u8> {
    let gz = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(gz);
    for (name, data) in [
        ("piper/piper", &b"#!/bin/sh\nexit 0\n"[..]),
        ("piper/espeak-ng-data/voices", &b""[..]),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// An HTTP server that promises a large body, sends a sliver, and hangs up.
pub fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n",
            );
            let _ = stream.write_all(&[0u8; 1000]);
        }
    });
    format!("http://{addr}")
}
