//! # heic-convert
//!
//! Convert HEIC photos to PNG or JPEG through a small, host-agnostic
//! workflow controller.
//!
//! ## Workflow Overview
//!
//! ```text
//! candidate file
//!  │
//!  ├─ 1. Submit   accept `*.heic` (case-insensitive), summarise name + size
//!  ├─ 2. Format   pick PNG (default) or JPEG for the next conversion
//!  ├─ 3. Convert  HeicCodec: decode HEIC, re-encode as target (quality 0.9)
//!  ├─ 4. Preview  artifact exposed through a revocable ObjectHandle
//!  └─ 5. Download FileSaver receives `<stem>_convertido.<png|jpeg>`
//! ```
//!
//! [`Controller`] owns the state between those steps and reports a
//! [`RenderState`] to every registered [`WorkflowObserver`] after each
//! operation, so a host only has to render what it is given.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heic_convert::{convert_file, ControllerConfig, TargetFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Requires libheif's `heif-dec` on PATH.
//!     let config = ControllerConfig::default();
//!     let saved = convert_file("IMG_0001.HEIC", "out", TargetFormat::Jpeg, &config).await?;
//!     println!("{}", saved.location); // out/IMG_0001_convertido.jpeg
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `heic2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! heic-convert = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod candidate;
pub mod codec;
pub mod config;
pub mod controller;
pub mod convert;
pub mod delivery;
pub mod error;
pub mod format;
pub mod handle;
pub mod naming;
pub mod notices;
pub mod observer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use candidate::{CandidateFile, FileSummary};
pub use codec::{ExternalDecoderCodec, HeicCodec};
pub use config::{ControllerConfig, ControllerConfigBuilder, Language};
pub use controller::{
    ConversionArtifact, ConversionJob, ConversionOutcome, Controller, Notice, NoticeKind, Phase,
    RenderState,
};
pub use convert::{convert_file, convert_file_sync, convert_file_with_codec, run_workflow};
pub use delivery::{Delivery, DirectorySaver, FileSaver};
pub use error::{CodecError, ConvertError, DeliveryError};
pub use format::TargetFormat;
pub use handle::{HandleRegistry, ObjectHandle, PreviewRef};
pub use naming::download_name;
pub use observer::{NoopObserver, SharedObserver, WorkflowObserver};
