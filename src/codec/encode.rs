//! Re-encoding: decoded intermediate → target-format bytes.
//!
//! The decoder hands back a lossless PNG; this stage turns it into what the
//! user asked for. PNG output re-encodes losslessly. JPEG output uses the
//! workflow quality factor and, since JPEG has no alpha channel, composites
//! transparent pixels onto white rather than letting them turn black.

use crate::error::CodecError;
use crate::format::TargetFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Map a 0.0–1.0 quality factor to the 1–100 scale JPEG encoders use.
pub fn quality_percent(quality: f32) -> u8 {
    if quality.is_nan() {
        return 90;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Decode an intermediate image produced by the decoder.
pub fn decode_intermediate(bytes: &[u8]) -> Result<DynamicImage, CodecError> {
    image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Encode `img` as `target`.
pub fn encode_image(
    img: &DynamicImage,
    target: TargetFormat,
    quality: f32,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    match target {
        TargetFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }
        TargetFormat::Jpeg => {
            let rgb = flatten_on_white(img);
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality_percent(quality));
            encoder
                .encode_image(&rgb)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }
    }
    debug!(
        "Encoded {}x{} → {} bytes {}",
        img.width(),
        img.height(),
        buf.len(),
        target.label()
    );
    Ok(buf)
}

/// Decode the intermediate and encode it as `target` in one blocking call.
pub fn reencode(intermediate: &[u8], target: TargetFormat, quality: f32) -> Result<Vec<u8>, CodecError> {
    let img = decode_intermediate(intermediate)?;
    encode_image(&img, target, quality)
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, p) in rgba.enumerate_pixels() {
        let a = p[3] as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(p[0]), blend(p[1]), blend(p[2])]));
    }
    out
}
