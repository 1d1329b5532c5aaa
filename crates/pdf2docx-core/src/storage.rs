//! Upload and converted-artifact directories.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The two directories the service works in.
#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    converted_dir: PathBuf,
}

impl Storage {
    pub fn new(upload_dir: impl Into<PathBuf>, converted_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            converted_dir: converted_dir.into(),
        }
    }

    /// Create both directories if they are missing. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<(), StorageError> {
        for dir in [&self.upload_dir, &self.converted_dir] {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn converted_dir(&self) -> &Path {
        &self.converted_dir
    }

    /// Persist upload bytes under `filename` in the upload directory.
    ///
    /// The returned guard deletes the file when dropped.
    pub fn save_upload(&self, filename: &str, data: &[u8]) -> Result<UploadedFile, StorageError> {
        if !is_plain_file_name(filename) {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        let path = self.upload_dir.join(filename);
        // Guard first so a failed write does not leave a truncated file behind.
        let upload = UploadedFile {
            filename: filename.to_string(),
            path,
        };
        std::fs::write(&upload.path, data)?;
        Ok(upload)
    }

    /// Resolve an artifact name under the converted directory.
    ///
    /// Returns `None` when the name could escape the directory.
    pub fn artifact_path(&self, filename: &str) -> Option<PathBuf> {
        is_plain_file_name(filename).then(|| self.converted_dir.join(filename))
    }

    /// Delete every regular file in the converted directory.
    ///
    /// Stops at the first failure; files not reached yet are left in place.
    pub fn clear_converted(&self) -> Result<usize, StorageError> {
        clear_files(&self.converted_dir, |path| std::fs::remove_file(path))
    }
}

/// Remove the non-directory entries of `dir` in name order with `remove`.
fn clear_files(
    dir: &Path,
    mut remove: impl FnMut(&Path) -> std::io::Result<()>,
) -> Result<usize, StorageError> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut removed = 0;
    for entry in entries {
        if entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        remove(&path).map_err(|source| StorageError::Remove {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "removed converted file");
        removed += 1;
    }
    Ok(removed)
}

/// An upload persisted to disk for the duration of one request.
#[derive(Debug)]
pub struct UploadedFile {
    filename: String,
    path: PathBuf,
}

impl UploadedFile {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove upload")
            }
        }
    }
}

/// Reduce a client-supplied name to its last path component.
///
/// Browsers on some platforms send the full local path. Returns `None` when
/// nothing usable is left.
pub fn upload_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    is_plain_file_name(name).then(|| name.to_string())
}

/// A single path component that stays inside its parent directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("uploads"), root.path().join("converted"));
        storage.ensure().unwrap();
        (root, storage)
    }

    #[test]
    fn ensure_is_idempotent() {
        let (_root, storage) = temp_storage();
        storage.ensure().unwrap();
        assert!(storage.upload_dir().is_dir());
        assert!(storage.converted_dir().is_dir());
    }

    #[test]
    fn upload_is_removed_on_drop() {
        let (_root, storage) = temp_storage();
        let upload = storage.save_upload("doc.pdf", b"%PDF-1.7").unwrap();
        let path = upload.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert_eq!(upload.filename(), "doc.pdf");

        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn upload_rejects_traversal() {
        let (_root, storage) = temp_storage();
        assert!(matches!(
            storage.save_upload("../evil.pdf", b"x"),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn artifact_path_stays_in_converted_dir() {
        let (_root, storage) = temp_storage();
        assert_eq!(
            storage.artifact_path("a.docx").unwrap(),
            storage.converted_dir().join("a.docx")
        );
        assert!(storage.artifact_path("../a.docx").is_none());
        assert!(storage.artifact_path("..").is_none());
        assert!(storage.artifact_path("").is_none());
    }

    #[test]
    fn upload_file_name_keeps_last_component() {
        assert_eq!(upload_file_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(
            upload_file_name("C:\\Users\\me\\report.pdf").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(upload_file_name("dir/sub/x.pdf").as_deref(), Some("x.pdf"));
        assert!(upload_file_name("dir/").is_none());
        assert!(upload_file_name("").is_none());
    }

    #[test]
    fn clear_converted_removes_files_and_skips_dirs() {
        let (_root, storage) = temp_storage();
        std::fs::write(storage.converted_dir().join("a.docx"), b"a").unwrap();
        std::fs::write(storage.converted_dir().join("b.docx"), b"b").unwrap();
        std::fs::create_dir(storage.converted_dir().join("nested")).unwrap();

        assert_eq!(storage.clear_converted().unwrap(), 2);
        let left: Vec<_> = std::fs::read_dir(storage.converted_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("nested")]);
    }

    #[test]
    fn clear_stops_at_first_failed_delete() {
        let (_root, storage) = temp_storage();
        for name in ["a.docx", "b.docx", "c.docx"] {
            std::fs::write(storage.converted_dir().join(name), b"x").unwrap();
        }

        let err = clear_files(storage.converted_dir(), |path| {
            if path.ends_with("b.docx") {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"))
            } else {
                std::fs::remove_file(path)
            }
        })
        .unwrap_err();

        match err {
            StorageError::Remove { path, source } => {
                assert!(path.ends_with("b.docx"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!storage.converted_dir().join("a.docx").exists());
        assert!(storage.converted_dir().join("b.docx").exists());
        assert!(storage.converted_dir().join("c.docx").exists());
    }

    #[test]
    fn clear_reports_unreadable_directory() {
        let (_root, storage) = temp_storage();
        std::fs::remove_dir(storage.converted_dir()).unwrap();
        std::fs::write(storage.converted_dir(), b"not a directory").unwrap();

        assert!(matches!(storage.clear_converted(), Err(StorageError::Io(_))));
    }
}
