//! Host platform resolution and the Piper release archive for each platform.
//!
//! Pure functions: the only input is the `(os, arch)` pair, which
//! [`PlatformInfo::detect`] reads from `std::env::consts`.

use serde::Serialize;

/// Piper release that every platform archive is taken from.
pub const ENGINE_RELEASE_URL: &str =
    "https://github.com/rhasspy/piper/releases/download/2023.11.14-2";

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Macos,
    Linux,
}

/// CPU architecture, as far as the engine archives care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Aarch64,
    Armv7,
    Other(String),
}

impl Arch {
    /// Map an architecture name (`std::env::consts::ARCH` or `uname -m`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "x86_64" | "amd64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            "arm" | "armv7" | "armv7l" => Arch::Armv7,
            other => Arch::Other(other.to_string()),
        }
    }
}

/// Resolved host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub os: OsFamily,
    pub arch: Arch,
}

/// Archive container format of an engine release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

/// The engine archive matching a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineArchive {
    pub filename: &'static str,
    pub kind: ArchiveKind,
}

impl PlatformInfo {
    /// Resolve the platform this binary was compiled for.
    pub fn detect() -> Result<Self, String> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve from explicit OS and architecture names.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, String> {
        let os = match os {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::Macos,
            "linux" => OsFamily::Linux,
            other => {
                return Err(format!(
                    "unsupported operating system '{other}'; supported: windows, macos, linux"
                ));
            }
        };
        Ok(Self {
            os,
            arch: Arch::from_name(arch),
        })
    }

    /// Release archive for this platform. Unknown Linux architectures get
    /// the x86_64 build; macOS always gets the x64 build.
    pub fn engine_archive(&self) -> EngineArchive {
        let (filename, kind) = match (&self.os, &self.arch) {
            (OsFamily::Windows, _) => ("piper_windows_amd64.zip", ArchiveKind::Zip),
            (OsFamily::Macos, _) => ("piper_macos_x64.tar.gz", ArchiveKind::TarGz),
            (OsFamily::Linux, Arch::Aarch64) => ("piper_linux_aarch64.tar.gz", ArchiveKind::TarGz),
            (OsFamily::Linux, Arch::Armv7) => ("piper_linux_armv7l.tar.gz", ArchiveKind::TarGz),
            (OsFamily::Linux, _) => ("piper_linux_x86_64.tar.gz", ArchiveKind::TarGz),
        };
        EngineArchive { filename, kind }
    }

    /// File name of the engine executable inside the install directory.
    pub fn engine_executable(&self) -> &'static str {
        match self.os {
            OsFamily::Windows => "piper.exe",
            _ => "piper",
        }
    }
}
