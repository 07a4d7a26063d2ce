//! HEIF container sniffing.
//!
//! HEIC files are ISO-BMFF: the first box is `ftyp`, holding a major brand
//! and a list of compatible brands. Checking them up front turns a renamed
//! JPEG into a clear [`CodecError::NotHeic`] instead of an opaque decoder
//! failure.

use crate::error::CodecError;

/// Brands of HEVC-coded HEIF images and sequences.
pub const HEVC_BRANDS: [&[u8; 4]; 6] = [b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis"];

/// Generic HEIF brands; accepted as major brand unless an AV1 brand is listed.
pub const GENERIC_BRANDS: [&[u8; 4]; 2] = [b"mif1", b"msf1"];

const AV1_BRANDS: [&[u8; 4]; 2] = [b"avif", b"avis"];

/// Collect major + compatible brands of the leading `ftyp` box.
fn ftyp_brands(bytes: &[u8]) -> Option<Vec<[u8; 4]>> {
    if bytes.len() < 16 || &bytes[4..8] != b"ftyp" {
        return None;
    }
    let declared = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = declared.clamp(16, bytes.len());

    let mut brands = Vec::with_capacity((end - 12) / 4);
    brands.push([bytes[8], bytes[9], bytes[10], bytes[11]]);
    // bytes[12..16] is the minor version
    for chunk in bytes[16..end].chunks_exact(4) {
        brands.push([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(brands)
}

/// `true` if `bytes` starts with a HEIC `ftyp` box.
pub fn is_heic(bytes: &[u8]) -> bool {
    let Some(brands) = ftyp_brands(bytes) else {
        return false;
    };
    if brands.iter().any(|b| HEVC_BRANDS.contains(&b)) {
        return true;
    }
    GENERIC_BRANDS.contains(&&brands[0]) && !brands.iter().any(|b| AV1_BRANDS.contains(&b))
}

/// Error with the leading bytes when `bytes` is not HEIC.
pub fn check_heic(bytes: &[u8]) -> Result<(), CodecError> {
    if is_heic(bytes) {
        Ok(())
    } else {
        Err(CodecError::NotHeic {
            magic: bytes.iter().take(12).copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
        let size = 16 + 4 * compatible.len();
        let mut v = (size as u32).to_be_bytes().to_vec();
        v.extend_from_slice(b"ftyp");
        v.extend_from_slice(major);
        v.extend_from_slice(&[0, 0, 0, 0]);
        for b in compatible {
            v.extend_from_slice(*b);
        }
        v.extend_from_slice(b"\0\0\0\x08meta");
        v
    }

    #[test]
    fn iphone_heic_is_accepted() {
        assert!(is_heic(&ftyp(b"heic", &[b"mif1", b"heic"])));
    }

    #[test]
    fn generic_major_with_hevc_compatible() {
        assert!(is_heic(&ftyp(b"mif1", &[b"heic"])));
        assert!(is_heic(&ftyp(b"mif1", &[b"miaf"])));
    }

    #[test]
    fn avif_is_rejected() {
        assert!(!is_heic(&ftyp(b"avif", &[b"mif1", b"miaf"])));
        assert!(!is_heic(&ftyp(b"mif1", &[b"avif"])));
    }

    #[test]
    fn jpeg_and_short_inputs_are_rejected() {
        assert!(!is_heic(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F']));
        assert!(!is_heic(b""));
        assert!(!is_heic(b"\0\0\0\x18ftyp"));
    }

    #[test]
    fn check_reports_magic() {
        let err = check_heic(b"\x89PNG\r\n\x1a\n").unwrap_err();
        match err {
            CodecError::NotHeic { magic } => assert_eq!(&magic[..4], b"\x89PNG"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
