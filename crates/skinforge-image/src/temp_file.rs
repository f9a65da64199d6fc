//! Scoped on-disk buffers for downloads (spec §4.5). Three well-known roots
//! — URL downloads, uploads, and upstream texture fetches — each get their
//! own subdirectory under the configured temp root. Release happens on
//! every exit path because it's tied to `Drop`, not to the caller
//! remembering to call it.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempDirKind {
    UrlDownload,
    Upload,
    UpstreamFetch,
}

impl TempDirKind {
    fn subdir(&self) -> &'static str {
        match self {
            TempDirKind::UrlDownload => "downloads",
            TempDirKind::Upload => "uploads",
            TempDirKind::UpstreamFetch => "fetches",
        }
    }
}

#[derive(Debug, Error)]
pub enum TempFileError {
    #[error("could not create temp directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),
    #[error("could not create temp file: {0}")]
    CreateFile(std::io::Error),
    #[error("could not write temp file: {0}")]
    Write(std::io::Error),
}

pub struct TempFileManager {
    root: PathBuf,
}

impl TempFileManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Acquires a fresh handle under the subdirectory for `kind`, creating
    /// the directory on first use.
    pub fn acquire(&self, kind: TempDirKind) -> Result<TempHandle, TempFileError> {
        let dir = self.root.join(kind.subdir());
        std::fs::create_dir_all(&dir).map_err(|e| TempFileError::CreateDir(dir.clone(), e))?;
        let file = NamedTempFile::new_in(&dir).map_err(TempFileError::CreateFile)?;
        Ok(TempHandle { file: Some(file) })
    }

    pub fn write(&self, handle: &mut TempHandle, bytes: &[u8]) -> Result<(), TempFileError> {
        use std::io::Write;
        let file = handle.file.as_mut().expect("handle already released");
        file.write_all(bytes).map_err(TempFileError::Write)
    }
}

/// A live temp-file lease. Dropping it (explicitly via [`release`][Self::release]
/// or implicitly) deletes the backing file.
pub struct TempHandle {
    file: Option<NamedTempFile>,
}

impl TempHandle {
    pub fn path(&self) -> &Path {
        self.file
            .as_ref()
            .expect("handle already released")
            .path()
    }

    /// Explicit release — logs at the call site instead of relying solely
    /// on `Drop`'s silence for the happy path.
    pub fn release(mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
        }
    }
}

impl Drop for TempHandle {
    fn drop(&mut self) {
        // NamedTempFile already removes itself on drop; this impl exists so
        // release-on-every-exit-path is a guarantee of the type, not of
        // caller discipline.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_a_readable_file() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(root.path());
        let mut handle = manager.acquire(TempDirKind::Upload).unwrap();
        manager.write(&mut handle, b"hello").unwrap();
        assert_eq!(std::fs::read(handle.path()).unwrap(), b"hello");
    }

    #[test]
    fn release_removes_the_file() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(root.path());
        let handle = manager.acquire(TempDirKind::UrlDownload).unwrap();
        let path = handle.path().to_path_buf();
        handle.release();
        assert!(!path.exists());
    }

    #[test]
    fn drop_releases_without_explicit_call() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(root.path());
        let path = {
            let handle = manager.acquire(TempDirKind::UpstreamFetch).unwrap();
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn separate_kinds_use_separate_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(root.path());
        let a = manager.acquire(TempDirKind::Upload).unwrap();
        let b = manager.acquire(TempDirKind::UrlDownload).unwrap();
        assert_ne!(
            a.path().parent().unwrap(),
            b.path().parent().unwrap()
        );
    }
}
