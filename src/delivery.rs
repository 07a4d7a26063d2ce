//! The file-save collaborator used by `download()`.
//!
//! From the controller's point of view delivery is fire-and-forget: it hands
//! a transient [`ObjectHandle`] and a suggested name to a [`FileSaver`] and
//! revokes the handle as soon as the call returns. A browser host would
//! click a temporary link; [`DirectorySaver`] writes into a folder.

use crate::error::DeliveryError;
use crate::handle::ObjectHandle;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a delivered file ended up, as reported by the saver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub file_name: String,
    /// Host-specific location: a path for [`DirectorySaver`].
    pub location: String,
    pub size_bytes: u64,
}

/// Delivers the bytes behind a handle under a suggested name.
///
/// The handle is only valid for the duration of the call.
pub trait FileSaver: Send + Sync {
    fn deliver(&self, handle: &ObjectHandle, suggested_name: &str)
        -> Result<Delivery, DeliveryError>;
}

/// Saves downloads into a directory, overwriting files of the same name.
///
/// Writes go to a temp file in the same directory which is then persisted
/// over the final name, so a crash never leaves a truncated image behind.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSaver for DirectorySaver {
    fn deliver(
        &self,
        handle: &ObjectHandle,
        suggested_name: &str,
    ) -> Result<Delivery, DeliveryError> {
        // Only the final component is honoured; names come from user files.
        let file_name = Path::new(suggested_name)
            .file_name()
            .ok_or_else(|| DeliveryError::Rejected(format!("invalid file name {suggested_name:?}")))?;
        let target = self.dir.join(file_name);
        let io_err = |source: std::io::Error| DeliveryError::Io {
            path: target.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(handle.bytes()).map_err(io_err)?;
        tmp.persist(&target).map_err(|e| io_err(e.error))?;

        debug!("Delivered {} from {}", target.display(), handle.url());
        info!("Saved {} ({} bytes)", target.display(), handle.bytes().len());

        Ok(Delivery {
            file_name: file_name.to_string_lossy().into_owned(),
            location: target.display().to_string(),
            size_bytes: handle.bytes().len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleRegistry;
    use std::sync::Arc;

    #[test]
    fn writes_file_under_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let reg = HandleRegistry::new();
        let handle = reg.create(Arc::from(&b"png-bytes"[..]), "image/png");

        let saver = DirectorySaver::new(dir.path());
        let d = saver.deliver(&handle, "photo_convertido.png").unwrap();

        assert_eq!(d.file_name, "photo_convertido.png");
        assert_eq!(d.size_bytes, 9);
        let written = std::fs::read(dir.path().join("photo_convertido.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let reg = HandleRegistry::new();
        let handle = reg.create(Arc::from(&b"x"[..]), "image/png");

        DirectorySaver::new(&nested)
            .deliver(&handle, "x_convertido.png")
            .unwrap();
        assert!(nested.join("x_convertido.png").is_file());
    }

    #[test]
    fn strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let reg = HandleRegistry::new();
        let handle = reg.create(Arc::from(&b"x"[..]), "image/png");

        let d = DirectorySaver::new(dir.path())
            .deliver(&handle, "../escape_convertido.png")
            .unwrap();
        assert_eq!(d.file_name, "escape_convertido.png");
        assert!(dir.path().join("escape_convertido.png").is_file());
    }

    #[test]
    fn rejects_names_without_file_component() {
        let dir = tempfile::tempdir().unwrap();
        let reg = HandleRegistry::new();
        let handle = reg.create(Arc::from(&b"x"[..]), "image/png");

        let err = DirectorySaver::new(dir.path()).deliver(&handle, "..").unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected(_)));
    }
}
