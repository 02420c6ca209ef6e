//! Filesystem storage for uploaded document bytes.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Stores document bytes under a flat data directory, one file per
/// document id.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes document bytes with exclusive creation (O_CREAT | O_EXCL).
    /// Document ids are unique, so an existing file is a hard error rather
    /// than something to silently overwrite.
    pub fn store(
        &self,
        document_id: &str,
        extension: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        use std::io::Write;

        std::fs::create_dir_all(&self.root).map_err(|e| StorageError::CreateDirectory {
            path: self.root.clone(),
            source: e,
        })?;

        let path = self.root.join(format!("{}.{}", document_id, extension));

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::FileExists(path));
            }
            Err(e) => {
                return Err(StorageError::WriteFile {
                    path,
                    source: e,
                });
            }
        };

        file.write_all(content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Reads stored document bytes.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        std::fs::read(path).map_err(|e| StorageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Removes stored bytes. Missing files are fine — the record is what
    /// matters, and a crash between delete and insert may have left none.
    pub fn remove(&self, path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Stored file already gone: {}", path.display());
                Ok(())
            }
            Err(e) => Err(StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
