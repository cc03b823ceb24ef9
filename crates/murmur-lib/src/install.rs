//! Engine archive extraction.
//!
//! The archive is unpacked into a staging directory next to the final install
//! directory, then published with a single rename. A half-extracted tree is
//! never visible as `engine/`, so "directory exists" stays a safe test for
//! "installed".

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use murmur_core::platform::ArchiveKind;
use tracing::debug;

/// Unpack `archive` and publish its contents as `engine_dir`.
///
/// `staging_parent` must be on the same filesystem as `engine_dir`.
/// Fails without touching `engine_dir` if `executable` is not in the archive.
pub fn install_archive(
    archive: &Path,
    kind: ArchiveKind,
    staging_parent: &Path,
    engine_dir: &Path,
    executable: &str,
) -> io::Result<()> {
    let staging = tempfile::Builder::new()
        .prefix(".engine-")
        .tempdir_in(staging_parent)?;

    extract(archive, kind, staging.path())?;

    let tree = install_root(staging.path())?;
    if !tree.join(executable).is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("archive does not contain '{executable}'"),
        ));
    }

    debug!("install: publishing {} as {}", tree.display(), engine_dir.display());
    std::fs::rename(&tree, engine_dir)?;
    // `staging` is empty now, or gone if it was the tree itself.
    Ok(())
}

fn extract(archive: &Path, kind: ArchiveKind, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    match kind {
        ArchiveKind::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(file));
            tar.set_preserve_permissions(true);
            tar.unpack(dest)
        }
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(io::Error::other)?;
            zip.extract(dest).map_err(io::Error::other)
        }
    }
}

/// Release archives wrap everything in a single `piper/` directory; publish
/// that directory rather than the staging root when present.
fn install_root(staging: &Path) -> io::Result<PathBuf> {
    let entries: Vec<_> = std::fs::read_dir(staging)?.collect::<Result<_, _>>()?;
    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(only.path()),
        _ => Ok(staging.to_path_buf()),
    }
}
