//! File-name rules: which candidates are accepted and what downloads are called.

use crate::format::TargetFormat;
use once_cell::sync::Lazy;
use regex::Regex;

/// The only accepted input extension, compared case-insensitively.
pub const HEIC_EXTENSION: &str = ".heic";

static HEIC_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){}$", regex::escape(HEIC_EXTENSION))).unwrap()
});

/// `true` when `name` ends in `.heic`, ignoring case.
pub fn is_heic_name(name: &str) -> bool {
    HEIC_SUFFIX.is_match(name)
}

/// Remove one trailing `.heic` (any case); other names are returned as-is.
pub fn strip_heic_suffix(name: &str) -> &str {
    match HEIC_SUFFIX.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Derive the suggested download name for an artifact.
///
/// `IMG_0001.HEIC` + PNG + `_convertido` → `IMG_0001_convertido.png`.
pub fn download_name(original: &str, marker: &str, format: TargetFormat) -> String {
    format!("{}{}.{}", strip_heic_suffix(original), marker, format.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_case() {
        assert!(is_heic_name("photo.heic"));
        assert!(is_heic_name("IMG_0001.HEIC"));
        assert!(is_heic_name("mixed.HeIc"));
    }

    #[test]
    fn rejects_other_names() {
        assert!(!is_heic_name("photo.jpg"));
        assert!(!is_heic_name("photo.heic.png"));
        assert!(!is_heic_name("heic"));
        assert!(!is_heic_name("photo.heif"));
        assert!(!is_heic_name(""));
    }

    #[test]
    fn suffix_follows_extension_constant() {
        assert!(is_heic_name(&format!("x{}", HEIC_EXTENSION.to_uppercase())));
        // The dot is literal.
        assert!(!is_heic_name("photoXheic"));
    }

    #[test]
    fn strips_only_trailing_suffix() {
        assert_eq!(strip_heic_suffix("a.heic.heic"), "a.heic");
        assert_eq!(strip_heic_suffix("notes.txt"), "notes.txt");
    }

    #[test]
    fn derived_names() {
        assert_eq!(
            download_name("IMG_0001.HEIC", "_convertido", TargetFormat::Png),
            "IMG_0001_convertido.png"
        );
        assert_eq!(
            download_name("vacation.heic", "_convertido", TargetFormat::Jpeg),
            "vacation_convertido.jpeg"
        );
    }
}
