// src/engine/decoder.rs
//
// Decoder boundary: the types an external HEIF/AVIF decoder hands us, and
// the trait it implements. The bitstream itself is never parsed here.

use crate::engine::view::PixelView;
use crate::ops::PixelMode;
use thiserror::Error;

/// libheif error code for "truncated data" ...
pub const HEIF_ERROR_INVALID_INPUT: u32 = 7;
/// ... with sub-code "end of data".
pub const HEIF_SUBERROR_END_OF_DATA: u32 = 100;

/// Failure reported by the external decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code}, subcode {subcode})")]
pub struct DecodeError {
    pub code: u32,
    pub subcode: u32,
    pub message: String,
}

impl DecodeError {
    pub fn new(code: u32, subcode: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            subcode,
            message: message.into(),
        }
    }

    /// EOF reached mid-decode; callers may choose to keep a blank image.
    pub fn is_truncated(&self) -> bool {
        self.code == HEIF_ERROR_INVALID_INPUT && self.subcode == HEIF_SUBERROR_END_OF_DATA
    }
}

/// A generic metadata item from the container (`Exif`, `mime` / XMP, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataItem {
    pub kind: String,
    pub data: Vec<u8>,
}

impl MetadataItem {
    pub fn new(kind: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorProfileKind {
    /// `rICC`
    RestrictedIcc,
    /// `prof`
    FullIcc,
    /// `nclx` (coefficients only, no ICC payload)
    Nclx,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorProfile {
    pub kind: ColorProfileKind,
    pub data: Vec<u8>,
}

impl ColorProfile {
    /// ICC bytes usable as an `icc_profile`; None for nclx.
    pub fn icc(&self) -> Option<&[u8]> {
        match self.kind {
            ColorProfileKind::RestrictedIcc | ColorProfileKind::FullIcc => Some(&self.data),
            ColorProfileKind::Nclx => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_full(&self, size: (u32, u32)) -> bool {
        *self == Self::full(size.0, size.1)
    }

    pub fn fits_within(&self, size: (u32, u32)) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(size.0)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(size.1)
    }
}

/// Geometric transform baked into the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    /// Pending crop, in decoded-pixel coordinates
    pub crop: CropRect,
    /// Exif orientation code 1-8; anything else means "no rotation asserted"
    pub orientation: u16,
}

impl Transform {
    /// No crop, no rotation.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            crop: CropRect::full(width, height),
            orientation: 0,
        }
    }

    pub fn has_orientation(&self) -> bool {
        (1..=8).contains(&self.orientation)
    }
}

/// Everything the decoder knows after reading container headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeifHeader {
    pub size: (u32, u32),
    pub mode: PixelMode,
    pub transform: Transform,
    pub exif: Option<Vec<u8>>,
    pub metadata: Vec<MetadataItem>,
    pub color_profile: Option<ColorProfile>,
}

impl HeifHeader {
    pub fn new(size: (u32, u32), mode: PixelMode) -> Self {
        Self {
            size,
            mode,
            transform: Transform::identity(size.0, size.1),
            exif: None,
            metadata: Vec::new(),
            color_profile: None,
        }
    }
}

/// Raw pixels produced by the decoder's load stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPixels {
    pub data: Vec<u8>,
    /// Bytes per row, at least width * pixel size
    pub stride: usize,
}

/// Header plus pixels: what the crop stage works on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub header: HeifHeader,
    pub pixels: PixelView,
    pub stride: usize,
}

impl DecodedImage {
    pub fn new(header: HeifHeader, pixels: DecodedPixels) -> Self {
        Self {
            header,
            pixels: PixelView::from_vec(pixels.data),
            stride: pixels.stride,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.header.size
    }

    pub fn mode(&self) -> PixelMode {
        self.header.mode
    }

    /// Pixel bytes of row `y`, without stride padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.header.size.1 {
            return None;
        }
        let start = self.stride.checked_mul(y as usize)?;
        let len = (self.header.size.0 as usize).checked_mul(self.header.mode.bytes_per_pixel())?;
        self.pixels.get(start..start.checked_add(len)?)
    }

    /// Copy out tightly packed rows (stride = width * pixel size).
    pub fn to_packed(&self) -> Vec<u8> {
        let row_len = self.header.size.0 as usize * self.header.mode.bytes_per_pixel();
        let mut out = Vec::with_capacity(row_len * self.header.size.1 as usize);
        for y in 0..self.header.size.1 {
            if let Some(row) = self.row(y) {
                out.extend_from_slice(row);
            }
        }
        out
    }
}

/// An external HEIF/AVIF decoder with a two-stage open/load life cycle.
pub trait HeifDecoder {
    /// Opaque per-file state carried from `open` to `load`.
    type Handle;

    /// Magic-number sniff on the first bytes of a stream.
    fn check(&self, data: &[u8]) -> bool {
        is_heif_data(data)
    }

    /// Parse container headers without decoding pixels.
    fn open(&self, data: &[u8]) -> Result<(HeifHeader, Self::Handle), DecodeError>;

    /// Decode pixels for a previously opened file.
    fn load(&self, handle: Self::Handle) -> Result<DecodedPixels, DecodeError>;
}

const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1", b"msf1",
    b"avif", b"avis",
];

/// Check for an ISOBMFF `ftyp` box carrying a HEIF or AVIF brand.
pub fn is_heif_data(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }

    let ftyp_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if ftyp_size < 12 {
        return false;
    }
    let box_end = ftyp_size.min(data.len());

    let is_known = |brand: &[u8]| HEIF_BRANDS.iter().any(|b| b.as_slice() == brand);

    // Major brand (bytes 8-11)
    if is_known(&data[8..12]) {
        return true;
    }

    // Compatible brands start after the 4-byte minor version
    let mut offset = 16;
    while offset + 4 <= box_end {
        if is_known(&data[offset..offset + 4]) {
            return true;
        }
        offset += 4;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
        let size = 16 + 4 * compatible.len();
        let mut out = (size as u32).to_be_bytes().to_vec();
        out.extend_from_slice(b"ftyp");
        out.extend_from_slice(major);
        out.extend_from_slice(&[0, 0, 0, 0]);
        for brand in compatible {
            out.extend_from_slice(*brand);
        }
        out
    }

    #[test]
    fn test_is_heif_data_major_brand() {
        assert!(is_heif_data(&ftyp(b"heic", &[])));
        assert!(is_heif_data(&ftyp(b"avif", &[])));
    }

    #[test]
    fn test_is_heif_data_compatible_brand() {
        assert!(is_heif_data(&ftyp(b"isom", &[b"mp41", b"mif1"])));
        assert!(!is_heif_data(&ftyp(b"isom", &[b"mp41", b"mp42"])));
    }

    #[test]
    fn test_is_heif_data_rejects_other_formats() {
        assert!(!is_heif_data(b"\x89PNG\r\n\x1a\n\0\0\0\0"));
        assert!(!is_heif_data(b"short"));
        assert!(!is_heif_data(&[0, 0, 0, 4, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c']));
    }

    #[test]
    fn test_decode_error_truncation() {
        assert!(DecodeError::new(7, 100, "eof").is_truncated());
        assert!(!DecodeError::new(7, 101, "bad").is_truncated());
        assert!(!DecodeError::new(2, 100, "bad").is_truncated());
    }

    #[test]
    fn test_crop_rect_bounds() {
        assert!(CropRect::full(4, 3).is_full((4, 3)));
        assert!(CropRect::new(1, 1, 3, 2).fits_within((4, 3)));
        assert!(!CropRect::new(2, 0, 3, 1).fits_within((4, 3)));
        assert!(!CropRect::new(u32::MAX, 0, 2, 1).fits_within((4, 3)));
    }

    #[test]
    fn test_color_profile_icc() {
        let prof = ColorProfile {
            kind: ColorProfileKind::FullIcc,
            data: vec![1, 2],
        };
        assert_eq!(prof.icc(), Some(&[1u8, 2][..]));
        let nclx = ColorProfile {
            kind: ColorProfileKind::Nclx,
            data: vec![1, 2],
        };
        assert_eq!(nclx.icc(), None);
    }

    #[test]
    fn test_row_skips_stride_padding() {
        let header = HeifHeader::new((2, 2), PixelMode::Gray8);
        let image = DecodedImage::new(
            header,
            DecodedPixels {
                data: vec![1, 2, 0xAA, 3, 4, 0xAA],
                stride: 3,
            },
        );
        assert_eq!(image.row(1), Some(&[3u8, 4][..]));
        assert_eq!(image.row(2), None);
        assert_eq!(image.to_packed(), vec![1, 2, 3, 4]);
    }
}
