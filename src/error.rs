//! Error types for the heic-convert library.
//!
//! Three error types map onto the three seams of the workflow:
//!
//! * [`ConvertError`]: returned by every controller operation. All workflow
//!   variants are recoverable by the user: the controller is left in a
//!   well-defined phase from which a new file can be picked or the
//!   conversion retried.
//!
//! * [`CodecError`]: produced behind the [`crate::codec::HeicCodec`] seam.
//!   The controller logs it and collapses it into
//!   [`ConvertError::ConversionFailed`]; its text never reaches the
//!   user-visible notice.
//!
//! * [`DeliveryError`]: produced behind the [`crate::delivery::FileSaver`]
//!   seam when a download cannot be materialised.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the heic-convert controller and entry points.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Workflow errors ───────────────────────────────────────────────────
    /// The candidate was absent or its name does not end in `.heic`.
    #[error("Not a HEIC file: {}", name.as_deref().unwrap_or("<no file>"))]
    InvalidFileKind { name: Option<String> },

    /// Conversion was requested before any file was accepted.
    #[error("No file selected")]
    NoFileSelected,

    /// The codec failed, produced nothing, or the payload is not HEIC.
    #[error("Conversion failed: {detail}")]
    ConversionFailed { detail: String },

    /// Download was requested with no converted artifact live.
    #[error("No converted image to download")]
    NoArtifact,

    /// An operation that mutates the file or artifact arrived while the
    /// codec is still running.
    #[error("A conversion is already in progress")]
    ConversionInProgress,

    /// `cancel_conversion` was called outside the Converting phase.
    #[error("No conversion is in progress")]
    NoConversionInProgress,

    /// A codec outcome arrived for a conversion that was cancelled or
    /// superseded.
    #[error("Ignoring outcome of superseded conversion #{ticket}")]
    StaleOutcome { ticket: u64 },

    /// The host's file-save mechanism refused or failed the delivery.
    #[error("Failed to deliver '{name}': {source}")]
    DeliveryFailed {
        name: String,
        #[source]
        source: DeliveryError,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("HEIC file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for errors raised by a controller operation. Each of them has
    /// already put a user-facing notice in the render state (or changed
    /// nothing), so hosts show that notice instead of this error's text.
    ///
    /// `false` for input, configuration and internal errors raised outside
    /// the workflow.
    pub fn is_workflow_error(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidFileKind { .. }
                | ConvertError::NoFileSelected
                | ConvertError::ConversionFailed { .. }
                | ConvertError::NoArtifact
                | ConvertError::ConversionInProgress
                | ConvertError::NoConversionInProgress
                | ConvertError::StaleOutcome { .. }
                | ConvertError::DeliveryFailed { .. }
        )
    }
}

/// Failure reported by a [`crate::codec::HeicCodec`] implementation.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload does not carry a HEIF `ftyp` box with a HEIC brand.
    #[error("Input is not a HEIC image (first bytes: {magic:02x?})")]
    NotHeic { magic: Vec<u8> },

    /// The external decoder program could not be started.
    #[error("HEIC decoder '{tool}' is not available: {detail}")]
    DecoderUnavailable { tool: String, detail: String },

    /// The external decoder ran but exited unsuccessfully.
    #[error("HEIC decoder exited with {status}: {stderr}")]
    DecoderFailed { status: String, stderr: String },

    /// The decoder did not finish within the configured timeout.
    #[error("HEIC decoder timed out after {secs}s")]
    DecoderTimeout { secs: u64 },

    /// The decoded intermediate image could not be read.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Re-encoding to the target format failed.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// The codec returned successfully but with zero bytes.
    #[error("Codec produced no output")]
    EmptyOutput,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`crate::delivery::FileSaver`].
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Writing the file failed.
    #[error("could not write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handle could not be resolved or the saver refused the name.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_file_kind_display_names_file() {
        let e = ConvertError::InvalidFileKind {
            name: Some("photo.jpg".into()),
        };
        assert!(e.to_string().contains("photo.jpg"));
    }

    #[test]
    fn invalid_file_kind_display_without_file() {
        let e = ConvertError::InvalidFileKind { name: None };
        assert!(e.to_string().contains("<no file>"), "got: {e}");
    }

    #[test]
    fn delivery_failed_keeps_source() {
        use std::error::Error as _;
        let e = ConvertError::DeliveryFailed {
            name: "a_convertido.png".into(),
            source: DeliveryError::Rejected("disk full".into()),
        };
        assert!(e.to_string().contains("a_convertido.png"));
        assert_eq!(e.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }

    #[test]
    fn not_heic_display_shows_hex() {
        let e = CodecError::NotHeic {
            magic: vec![0x89, 0x50, 0x4e, 0x47],
        };
        assert!(e.to_string().contains("89"), "got: {e}");
    }

    #[test]
    fn workflow_classification() {
        assert!(ConvertError::NoArtifact.is_workflow_error());
        assert!(ConvertError::NoFileSelected.is_workflow_error());
        assert!(ConvertError::NoConversionInProgress.is_workflow_error());
        assert!(ConvertError::StaleOutcome { ticket: 3 }.is_workflow_error());
        assert!(ConvertError::DeliveryFailed {
            name: "a_convertido.png".into(),
            source: DeliveryError::Rejected("disk full".into()),
        }
        .is_workflow_error());
        assert!(!ConvertError::FileNotFound {
            path: PathBuf::from("a.heic")
        }
        .is_workflow_error());
        assert!(!ConvertError::Internal("x".into()).is_workflow_error());
        assert!(!ConvertError::InvalidConfig("x".into()).is_workflow_error());
    }
}
