// src/engine/common.rs
//
// Common helpers shared across engine modules: Exif framing.

/// 4-byte magic a HEIF Exif item payload must start with.
pub const EXIF_MAGIC: &[u8; 4] = b"Exif";

/// Full APP1-style Exif header that precedes the TIFF structure.
pub const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// True when `data` starts with the "Exif" magic.
pub fn has_exif_magic(data: &[u8]) -> bool {
    data.starts_with(EXIF_MAGIC)
}

/// The TIFF structure inside an Exif block, with the `Exif\0\0` header removed if present.
pub fn tiff_payload(exif: &[u8]) -> &[u8] {
    exif.strip_prefix(EXIF_HEADER.as_slice()).unwrap_or(exif)
}

/// Prefix a TIFF structure with the `Exif\0\0` header.
pub fn with_exif_header(tiff: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(EXIF_HEADER.len() + tiff.len());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out
}
