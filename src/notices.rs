//! User-visible notices.
//!
//! Every message the controller can put in front of the user lives here so
//! wording changes happen in one place and tests can compare against the
//! same text the controller emits. Notices are deliberately generic: codec
//! and I/O diagnostics go to the log, never into these strings.

use crate::candidate::FileSummary;
use crate::config::Language;
use crate::format::TargetFormat;

/// Shown when the candidate is absent or not a `.heic` file.
pub fn invalid_file(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "Por favor, selecciona un archivo HEIC válido.",
        Language::English => "Please select a valid HEIC file.",
    }
}

/// Shown when conversion is requested with no file accepted.
pub fn no_file_selected(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "No hay archivo seleccionado.",
        Language::English => "No file selected.",
    }
}

/// Shown when the codec fails for any reason.
pub fn conversion_failed(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => {
            "Error al convertir la imagen. Asegúrate de que el archivo sea un HEIC válido."
        }
        Language::English => "Could not convert the image. Make sure the file is a valid HEIC.",
    }
}

/// Shown when download is requested with nothing converted.
pub fn no_artifact(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "No hay imagen convertida para descargar.",
        Language::English => "There is no converted image to download.",
    }
}

/// Shown when the file-save mechanism fails.
pub fn delivery_failed(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "No se pudo guardar la imagen convertida.",
        Language::English => "Could not save the converted image.",
    }
}

/// Shown when a new file arrives while a conversion is running.
pub fn conversion_in_progress(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "Espera a que termine la conversión en curso.",
        Language::English => "Wait for the current conversion to finish.",
    }
}

pub fn conversion_cancelled(lang: Language) -> &'static str {
    match lang {
        Language::Spanish => "Conversión cancelada.",
        Language::English => "Conversion cancelled.",
    }
}

/// Success notice naming the produced format in upper case.
pub fn converted(lang: Language, format: TargetFormat) -> String {
    match lang {
        Language::Spanish => format!("¡Imagen convertida exitosamente a {}!", format.label()),
        Language::English => format!("Image successfully converted to {}!", format.label()),
    }
}

/// Summary shown once a file is accepted.
pub fn file_selected(lang: Language, summary: &FileSummary) -> String {
    match lang {
        Language::Spanish => format!(
            "Archivo seleccionado: {} (Tamaño: {} MB)",
            summary.name, summary.size_mib
        ),
        Language::English => format!(
            "Selected file: {} (Size: {} MB)",
            summary.name, summary.size_mib
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_names_format_in_upper_case() {
        assert!(converted(Language::Spanish, TargetFormat::Jpeg).contains("JPEG"));
        assert!(converted(Language::English, TargetFormat::Png).ends_with("PNG!"));
    }

    #[test]
    fn file_selected_includes_size() {
        let s = FileSummary {
            name: "IMG_0001.HEIC".into(),
            size_bytes: 2_464_153,
            size_mib: "2.35".into(),
        };
        let text = file_selected(Language::English, &s);
        assert!(text.contains("IMG_0001.HEIC"));
        assert!(text.contains("2.35 MB"));
    }

    #[test]
    fn languages_differ() {
        assert_ne!(
            invalid_file(Language::Spanish),
            invalid_file(Language::English)
        );
    }
}
