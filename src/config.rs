//! Configuration types for the conversion workflow.
//!
//! All controller behaviour that is not part of the workflow state itself is
//! controlled through [`ControllerConfig`], built via its
//! [`ControllerConfigBuilder`]. The defaults reproduce the fixed behaviour
//! of the workflow: 90 % quality for lossy output, the `_convertido` name
//! marker, PNG as the initial format and Spanish notices.

use crate::error::ConvertError;
use crate::format::TargetFormat;
use serde::{Deserialize, Serialize};

/// Default quality factor handed to the codec (0.0–1.0).
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Default marker inserted between the stem and the new extension.
pub const DEFAULT_NAME_MARKER: &str = "_convertido";

/// Default program used by [`crate::codec::ExternalDecoderCodec`].
pub const DEFAULT_DECODER_PROGRAM: &str = "heif-dec";

/// Configuration for a [`crate::controller::Controller`].
///
/// Built via [`ControllerConfig::builder()`] or using
/// [`ControllerConfig::default()`].
///
/// # Example
/// ```rust
/// use heic_convert::{ControllerConfig, Language, TargetFormat};
///
/// let config = ControllerConfig::builder()
///     .default_format(TargetFormat::Jpeg)
///     .language(Language::English)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality, 0.9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Quality factor passed to the codec for lossy formats. Range: 0.0–1.0. Default: 0.9.
    pub quality: f32,

    /// Segment appended to the stem of download names. Default: `_convertido`.
    ///
    /// `photo.heic` converted to PNG downloads as `photo_convertido.png`.
    pub name_marker: String,

    /// Format selected when the controller is created. Default: PNG.
    pub default_format: TargetFormat,

    /// Language of user-visible notices. Default: Spanish.
    pub language: Language,

    /// Program the bundled codec runs to decode HEIC. Default: `heif-dec`.
    ///
    /// Must accept `<input> <output.png>` arguments, as libheif's
    /// `heif-dec` (formerly `heif-convert`) does.
    pub decoder_program: String,

    /// Upper bound on one decoder run in seconds. Default: 120.
    pub decoder_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            name_marker: DEFAULT_NAME_MARKER.to_string(),
            default_format: TargetFormat::default(),
            language: Language::default(),
            decoder_program: DEFAULT_DECODER_PROGRAM.to_string(),
            decoder_timeout_secs: 120,
        }
    }
}

impl ControllerConfig {
    /// Create a new builder for `ControllerConfig`.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Quality as the 1–100 integer scale JPEG encoders take.
    pub fn quality_percent(&self) -> u8 {
        crate::codec::encode::quality_percent(self.quality)
    }
}

/// Builder for [`ControllerConfig`].
#[derive(Debug)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    pub fn quality(mut self, q: f32) -> Self {
        self.config.quality = if q.is_nan() { DEFAULT_QUALITY } else { q.clamp(0.0, 1.0) };
        self
    }

    pub fn name_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.name_marker = marker.into();
        self
    }

    pub fn default_format(mut self, format: TargetFormat) -> Self {
        self.config.default_format = format;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn decoder_program(mut self, program: impl Into<String>) -> Self {
        self.config.decoder_program = program.into();
        self
    }

    pub fn decoder_timeout_secs(mut self, secs: u64) -> Self {
        self.config.decoder_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ControllerConfig, ConvertError> {
        let c = &self.config;
        if c.name_marker.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Name marker must not be empty".into(),
            ));
        }
        if c.name_marker.contains(['/', '\\']) {
            return Err(ConvertError::InvalidConfig(format!(
                "Name marker must not contain path separators, got {:?}",
                c.name_marker
            )));
        }
        if c.decoder_program.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Decoder program must not be empty".into(),
            ));
        }
        if c.decoder_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Decoder timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Language of the notices shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Spanish,
    English,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Language::Spanish),
            "en" | "english" => Ok(Language::English),
            other => Err(format!("unsupported language '{other}' (expected es or en)")),
        }
    }
}
