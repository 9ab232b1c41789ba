use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

const PICTURES_SUBDIR: &str = "Pictures";
const EXPORT_PREFIX: &str = "power-scouter-analysis-";
const EXPORT_EXTENSION: &str = "png";
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("no free export file name in {dir}")]
    NameExhausted { dir: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Where exported result cards land.
#[derive(Debug, Clone)]
pub struct ExportStorage {
    pictures_dir: PathBuf,
}

impl ExportStorage {
    pub const fn with_pictures_dir(pictures_dir: PathBuf) -> Self {
        Self { pictures_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
        let mut pictures_dir = PathBuf::from(home);
        pictures_dir.push(PICTURES_SUBDIR);
        Ok(Self::with_pictures_dir(pictures_dir))
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    /// `power-scouter-analysis-<millis>.png`, suffixed when the name is taken.
    pub fn allocate_export_path(&self, millis: u128) -> StorageResult<PathBuf> {
        let stem = format!("{EXPORT_PREFIX}{millis}");
        let first = self.pictures_dir.join(format!("{stem}.{EXPORT_EXTENSION}"));
        if !first.exists() {
            return Ok(first);
        }
        (1..MAX_NAME_ATTEMPTS)
            .map(|n| self.pictures_dir.join(format!("{stem}-{n}.{EXPORT_EXTENSION}")))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| StorageError::NameExhausted {
                dir: self.pictures_dir.clone(),
            })
    }

    pub fn save_png(&self, png: &[u8]) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.pictures_dir)?;
        let target = self.allocate_export_path(unix_millis())?;
        write_atomic(&target, png)?;
        tracing::info!(path = %target.display(), bytes = png.len(), "saved result card");
        Ok(target)
    }
}

fn write_atomic(destination: &Path, bytes: &[u8]) -> StorageResult<()> {
    let staging = destination.with_extension("png.part");
    fs::write(&staging, bytes)?;
    if let Err(err) = fs::rename(&staging, destination) {
        let _ = fs::remove_file(&staging);
        return Err(StorageError::Io(err));
    }
    Ok(())
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_path_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().to_path_buf());
        let path = storage.allocate_export_path(1700000000123).unwrap();
        assert_eq!(
            path,
            dir.path().join("power-scouter-analysis-1700000000123.png")
        );
    }

    #[test]
    fn export_path_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().to_path_buf());
        fs::write(dir.path().join("power-scouter-analysis-5.png"), b"x").unwrap();
        let path = storage.allocate_export_path(5).unwrap();
        assert_eq!(path, dir.path().join("power-scouter-analysis-5-1.png"));
    }

    #[test]
    fn save_png_creates_directory_and_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ExportStorage::with_pictures_dir(dir.path().join("Pictures"));
        let path = storage.save_png(b"png-bytes").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"png-bytes");
        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(EXPORT_PREFIX) && name.ends_with(".png")));

        let again = storage.save_png(b"png-bytes").unwrap();
        assert_ne!(path, again);
    }
}
