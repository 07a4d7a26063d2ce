//! HEIC decoding through an external program.
//!
//! No pure-Rust HEVC decoder is mature enough to depend on, so the bundled
//! codec drives libheif's command-line decoder the same way office-document
//! converters drive LibreOffice: copy the input into a private temp dir, run
//! the program against it under a timeout, then read back the result. The
//! `TempDir` guard removes every intermediate file when the call returns,
//! on success, failure or timeout alike.

use super::{encode, sniff, HeicCodec};
use crate::config::ControllerConfig;
use crate::error::CodecError;
use crate::format::TargetFormat;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// [`HeicCodec`] backed by a decoder program such as `heif-dec`.
///
/// The program is invoked as `<program> <input.heic> <output.png>`.
#[derive(Debug, Clone)]
pub struct ExternalDecoderCodec {
    program: String,
    timeout: Duration,
}

impl ExternalDecoderCodec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Program and timeout taken from the controller configuration.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.decoder_program.clone())
            .with_timeout(Duration::from_secs(config.decoder_timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the decoder and return the intermediate PNG bytes.
    async fn decode_to_png(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let work = TempDir::new()?;
        let in_path = work.path().join("input.heic");
        let out_path = work.path().join("decoded.png");
        tokio::fs::write(&in_path, input).await?;

        let child = Command::new(&self.program)
            .arg(&in_path)
            .arg(&out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CodecError::DecoderUnavailable {
                tool: self.program.clone(),
                detail: e.to_string(),
            })?;

        // On timeout the child future is dropped, which kills the process.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CodecError::DecoderTimeout {
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(CodecError::DecoderFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let decoded = locate_output(&out_path).ok_or(CodecError::EmptyOutput)?;
        let bytes = tokio::fs::read(&decoded).await?;
        debug!("Decoder wrote {} ({} bytes)", decoded.display(), bytes.len());
        Ok(bytes)
    }
}

/// Find the decoder's output. Files holding several top-level images are
/// written as `<stem>-1.png`, `<stem>-2.png`, …; the first one is the
/// primary image.
fn locate_output(expected: &Path) -> Option<PathBuf> {
    if expected.is_file() {
        return Some(expected.to_path_buf());
    }
    let stem = expected.file_stem()?.to_string_lossy();
    let numbered = expected.with_file_name(format!("{stem}-1.png"));
    numbered.is_file().then_some(numbered)
}

#[async_trait]
impl HeicCodec for ExternalDecoderCodec {
    async fn convert(
        &self,
        input: Arc<[u8]>,
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError> {
        sniff::check_heic(&input)?;
        info!(
            "Decoding {} bytes with '{}' → {}",
            input.len(),
            self.program,
            target.label()
        );

        let intermediate = self.decode_to_png(&input).await?;
        if intermediate.is_empty() {
            return Err(CodecError::EmptyOutput);
        }

        tokio::task::spawn_blocking(move || encode::reencode(&intermediate, target, quality))
            .await
            .map_err(|e| CodecError::Encode(format!("Encode task panicked: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heic_header() -> Arc<[u8]> {
        let mut v = 24u32.to_be_bytes().to_vec();
        v.extend_from_slice(b"ftypheic\0\0\0\0mif1heic");
        Arc::from(v)
    }

    #[test]
    fn from_config_uses_program_and_timeout() {
        let config = ControllerConfig::builder()
            .decoder_program("my-decoder")
            .decoder_timeout_secs(7)
            .build()
            .unwrap();
        let codec = ExternalDecoderCodec::from_config(&config);
        assert_eq!(codec.program(), "my-decoder");
        assert_eq!(codec.timeout, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn non_heic_payload_is_rejected_before_spawning() {
        let codec = ExternalDecoderCodec::new("/definitely/not/a/decoder");
        let err = codec
            .convert(Arc::from(&b"\xFF\xD8\xFF\xE0 jpeg"[..]), TargetFormat::Png, 0.9)
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::NotHeic { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let codec = ExternalDecoderCodec::new("/definitely/not/a/decoder");
        let err = codec
            .convert(heic_header(), TargetFormat::Png, 0.9)
            .await
            .unwrap_err();
        assert!(
            matches!(err, CodecError::DecoderUnavailable { .. }),
            "got: {err}"
        );
    }

    #[test]
    fn locate_output_falls_back_to_numbered_file() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("decoded.png");
        assert!(locate_output(&expected).is_none());

        std::fs::write(dir.path().join("decoded-1.png"), b"x").unwrap();
        assert_eq!(
            locate_output(&expected),
            Some(dir.path().join("decoded-1.png"))
        );

        std::fs::write(&expected, b"x").unwrap();
        assert_eq!(locate_output(&expected), Some(expected.clone()));
    }
}
