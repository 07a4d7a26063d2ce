//! Candidate files offered to the workflow.
//!
//! A [`CandidateFile`] is what the host hands over after a pick or a drop.
//! The byte source is reference-counted so the controller, an in-flight
//! [`crate::controller::ConversionJob`] and the host can all hold it without
//! copying the payload.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A file offered for conversion, prior to validation.
#[derive(Clone)]
pub struct CandidateFile {
    name: String,
    size_bytes: u64,
    content: Arc<[u8]>,
}

impl CandidateFile {
    /// Wrap an in-memory payload; the size is the payload length.
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Override the size reported by the host (e.g. a picker that knows the
    /// on-disk size before the payload is fully read).
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Load a candidate from disk. The name is the path's final component.
    ///
    /// No extension check happens here; that is the controller's job.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::Internal(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded candidate {} ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Shared handle to the byte source.
    pub fn content(&self) -> &Arc<[u8]> {
        &self.content
    }

    /// Display summary: name plus size in mebibytes.
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            size_mib: format_mib(self.size_bytes),
        }
    }
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("content", &format_args!("<{} bytes>", self.content.len()))
            .finish()
    }
}

/// What the host shows about the accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
    /// `size_bytes / 1024 / 1024` with two decimals, e.g. `"2.35"`.
    pub size_mib: String,
}

const MIB: u128 = 1024 * 1024;

/// Format a byte count as mebibytes rounded to two decimals, ties away
/// from zero (131072 bytes is `"0.13"`).
pub fn format_mib(size_bytes: u64) -> String {
    // Integer hundredths; `{:.2}` on f64 would round exact ties to even.
    let hundredths = (size_bytes as u128 * 100 + MIB / 2) / MIB;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
