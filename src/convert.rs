//! One-shot conversion entry points.
//!
//! These drive a [`Controller`] through the full workflow for a single file
//! on disk: load, submit, select format, convert, download. Hosts that need
//! to render intermediate states build their own controller and use
//! [`run_workflow`], or call the controller operations directly.

use crate::candidate::CandidateFile;
use crate::codec::{ExternalDecoderCodec, HeicCodec};
use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::delivery::{Delivery, DirectorySaver};
use crate::error::ConvertError;
use crate::format::TargetFormat;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Submit `candidate`, convert it to `format` and deliver the result.
///
/// Stops at the first failing operation; the controller is left in the
/// phase that operation put it in, so the caller can inspect
/// [`Controller::render`].
pub async fn run_workflow(
    controller: &mut Controller,
    candidate: CandidateFile,
    format: TargetFormat,
) -> Result<Delivery, ConvertError> {
    controller.submit_file(Some(candidate))?;
    controller.set_target_format(format);
    controller.convert().await?;
    controller.download()
}

/// Convert a HEIC file on disk into `output_dir` with the bundled
/// [`ExternalDecoderCodec`].
///
/// # Arguments
/// * `input`: Path to a `.heic` file
/// * `output_dir`: Directory receiving `<stem>_convertido.<ext>`; created if missing
/// * `format`: Output format
/// * `config`: Controller configuration (also selects the decoder program)
///
/// # Errors
/// - [`ConvertError::FileNotFound`] / [`ConvertError::PermissionDenied`] reading the input
/// - [`ConvertError::InvalidFileKind`] if the name does not end in `.heic`
/// - [`ConvertError::ConversionFailed`] if decoding or encoding failed
/// - [`ConvertError::DeliveryFailed`] if the output could not be written
pub async fn convert_file(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    format: TargetFormat,
    config: &ControllerConfig,
) -> Result<Delivery, ConvertError> {
    let codec = Arc::new(ExternalDecoderCodec::from_config(config));
    convert_file_with_codec(input, output_dir, format, config, codec).await
}

/// [`convert_file`] with a caller-supplied codec.
pub async fn convert_file_with_codec(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    format: TargetFormat,
    config: &ControllerConfig,
    codec: Arc<dyn HeicCodec>,
) -> Result<Delivery, ConvertError> {
    let start = Instant::now();
    let input = input.as_ref();
    info!("Converting {} → {}", input.display(), format.label());

    let candidate = CandidateFile::from_path(input).await?;
    let saver = Arc::new(DirectorySaver::new(output_dir.as_ref()));
    let mut controller = Controller::new(config.clone(), codec, saver);

    let delivery = run_workflow(&mut controller, candidate, format).await?;
    info!(
        "Wrote {} ({} bytes) in {}ms",
        delivery.location,
        delivery.size_bytes,
        start.elapsed().as_millis()
    );
    Ok(delivery)
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a new tokio runtime internally. Do not call from within an
/// existing async runtime; use [`convert_file`] there.
pub fn convert_file_sync(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    format: TargetFormat,
    config: &ControllerConfig,
) -> Result<Delivery, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(input, output_dir, format, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use async_trait::async_trait;

    struct EchoCodec;

    #[async_trait]
    impl HeicCodec for EchoCodec {
        async fn convert(
            &self,
            input: Arc<[u8]>,
            _target: TargetFormat,
            _quality: f32,
        ) -> Result<Vec<u8>, CodecError> {
            Ok(input.to_vec())
        }
    }

    #[tokio::test]
    async fn converts_file_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("beach.heic");
        std::fs::write(&input, b"payload").unwrap();
        let out = dir.path().join("out");

        let d = convert_file_with_codec(
            &input,
            &out,
            TargetFormat::Jpeg,
            &ControllerConfig::default(),
            Arc::new(EchoCodec),
        )
        .await
        .unwrap();

        assert_eq!(d.file_name, "beach_convertido.jpeg");
        assert_eq!(std::fs::read(out.join("beach_convertido.jpeg")).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn missing_input_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file_with_codec(
            dir.path().join("nope.heic"),
            dir.path(),
            TargetFormat::Png,
            &ControllerConfig::default(),
            Arc::new(EchoCodec),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn non_heic_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.jpg");
        std::fs::write(&input, b"x").unwrap();
        let err = convert_file_with_codec(
            &input,
            dir.path(),
            TargetFormat::Png,
            &ControllerConfig::default(),
            Arc::new(EchoCodec),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidFileKind { .. }));
    }
}
