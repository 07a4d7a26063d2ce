//! Output raster formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raster format produced by a conversion. Default: [`TargetFormat::Png`].
///
/// The lowercase [`name`](TargetFormat::name) doubles as the file extension
/// of downloads, so JPEG output is saved as `.jpeg`, never `.jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Lossless; the quality factor is ignored.
    #[default]
    Png,
    /// Lossy; encoded with the configured quality factor.
    Jpeg,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 2] = [TargetFormat::Png, TargetFormat::Jpeg];

    /// Lowercase name, also used as the download extension.
    pub fn name(self) -> &'static str {
        match self {
            TargetFormat::Png => "png",
            TargetFormat::Jpeg => "jpeg",
        }
    }

    /// Upper-case label used in user notices.
    pub fn label(self) -> &'static str {
        match self {
            TargetFormat::Png => "PNG",
            TargetFormat::Jpeg => "JPEG",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Png => "image/png",
            TargetFormat::Jpeg => "image/jpeg",
        }
    }

    /// Whether the quality factor influences encoding.
    pub fn is_lossy(self) -> bool {
        matches!(self, TargetFormat::Jpeg)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(TargetFormat::Png),
            "jpeg" | "jpg" | "image/jpeg" => Ok(TargetFormat::Jpeg),
            other => Err(format!("unsupported output format '{other}' (expected png or jpeg)")),
        }
    }
}
