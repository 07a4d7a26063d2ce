//! The codec seam: HEIC bytes in, PNG or JPEG bytes out.
//!
//! The controller only ever talks to `Arc<dyn HeicCodec>`, so hosts and
//! tests can swap in any implementation. The bundled one is split into
//! stages, each independently testable:
//!
//! ```text
//! sniff ──▶ external decoder ──▶ encode
//! (ftyp)    (heif-dec → PNG)     (image crate → PNG/JPEG)
//! ```
//!
//! 1. [`sniff`]    reject payloads that carry a `.heic` name but are not
//!    HEIF/HEVC containers, before any process is spawned
//! 2. [`external`] run the decoder program on a temp copy of the input;
//!    the only stage with process I/O
//! 3. [`encode`]   re-encode the decoded intermediate to the target
//!    format at the requested quality; CPU-bound, runs in `spawn_blocking`

pub mod encode;
pub mod external;
pub mod sniff;

pub use external::ExternalDecoderCodec;

use crate::error::CodecError;
use crate::format::TargetFormat;
use async_trait::async_trait;
use std::sync::Arc;

/// Converts HEIC bytes to the requested raster format.
///
/// This is the workflow's single suspension point. Implementations must be
/// `Send + Sync`: a [`crate::controller::ConversionJob`] carries the codec
/// across an `.await` and may be moved into `tokio::spawn`.
#[async_trait]
pub trait HeicCodec: Send + Sync {
    /// Convert `input` to `target`.
    ///
    /// `quality` is in 0.0–1.0 and only matters for lossy targets.
    /// Returning `Ok` with an empty vector is treated as a failure by the
    /// controller.
    async fn convert(
        &self,
        input: Arc<[u8]>,
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "codec"
    }
}
