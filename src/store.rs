//! On-disk store for generated images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::image::OutputFormat;

/// Directory generated images are written to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Flat directory of generated images named after the second they were requested.
///
/// Two generations started within the same second share a file name; the later write wins.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Open the store, creating `dir` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&dir).map_err(|source| Error::OutputDir {
            path: dir.clone(),
            source,
        })?;

        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a generation started at `at` is stored under.
    #[must_use]
    pub fn path_for(&self, format: OutputFormat, at: SystemTime) -> PathBuf {
        let secs = at
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.dir
            .join(format!("generated_{secs}.{}", format.extension()))
    }

    /// Write encoded image bytes, replacing any file with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, bytes: &[u8], format: OutputFormat, at: SystemTime) -> Result<PathBuf> {
        let path = self.path_for(format, at);
        fs::write(&path, bytes).map_err(|source| Error::ImageSave {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("generated");

        let store = OutputStore::create(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_file_name_uses_unix_seconds() {
        let root = tempfile::tempdir().unwrap();
        let store = OutputStore::create(root.path()).unwrap();
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);

        assert_eq!(
            store.path_for(OutputFormat::Webp, at),
            root.path().join("generated_1700000000.webp")
        );
        assert_eq!(
            store.path_for(OutputFormat::Jpeg, at),
            root.path().join("generated_1700000000.jpeg")
        );
    }

    #[test]
    fn test_same_second_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let store = OutputStore::create(root.path()).unwrap();
        let first = UNIX_EPOCH + Duration::from_millis(1_700_000_000_100);
        let second = UNIX_EPOCH + Duration::from_millis(1_700_000_000_900);

        let a = store.save(b"first", OutputFormat::Png, first).unwrap();
        let b = store.save(b"second", OutputFormat::Png, second).unwrap();

        assert_eq!(a, b);
        assert_eq!(fs::read(&b).unwrap(), b"second");
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_fails_when_directory_vanishes() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("out");
        let store = OutputStore::create(&dir).unwrap();
        fs::remove_dir(&dir).unwrap();

        assert!(matches!(
            store.save(b"bytes", OutputFormat::Png, SystemTime::now()),
            Err(Error::ImageSave { .. })
        ));
    }
}
