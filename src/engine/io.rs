// src/engine/io.rs
//
// Host-side pixel buffers and the intermediate lossless carrier file.
// heif-enc only reads files, so pixels are written to a scoped PNG first.

use crate::engine::common::tiff_payload;
use crate::error::{HeifError, Result};
use crate::ops::PixelMode;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use img_parts::{png::Png, Bytes, ImageEXIF, ImageICC};
use std::borrow::Cow;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::debug;

/// Per-image metadata the host carries alongside pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// Exif block, `Exif\0\0` header included
    pub exif: Option<Vec<u8>>,
    pub icc_profile: Option<Vec<u8>>,
}

/// A host pixel buffer to be saved. Rows are tightly packed.
#[derive(Clone, Copy, Debug)]
pub struct SourceImage<'a> {
    pub mode: PixelMode,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    pub info: Option<&'a ImageInfo>,
}

impl<'a> SourceImage<'a> {
    pub fn new(mode: PixelMode, width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            mode,
            width,
            height,
            pixels,
            info: None,
        }
    }

    pub fn with_info(mut self, info: &'a ImageInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.mode.bytes_per_pixel()
    }

    /// Fail if the buffer is shorter than its declared geometry.
    pub fn validate(&self) -> Result<()> {
        let expected = self.expected_len();
        if self.pixels.len() < expected {
            return Err(HeifError::invalid_pixel_buffer(expected, self.pixels.len()));
        }
        Ok(())
    }

    pub fn icc_profile(&self) -> Option<&'a [u8]> {
        self.info.and_then(|info| info.icc_profile.as_deref())
    }

    pub fn exif(&self) -> Option<&'a [u8]> {
        self.info.and_then(|info| info.exif.as_deref())
    }
}

/// heif-enc mishandles 1-bit input, so bilevel pixels go out as 8-bit gray.
pub fn widen_bilevel(pixels: &[u8]) -> Vec<u8> {
    pixels
        .iter()
        .map(|&p| if p == 0 { 0x00 } else { 0xFF })
        .collect()
}

fn png_color_type(mode: PixelMode) -> Result<ExtendedColorType> {
    match mode {
        PixelMode::Bilevel | PixelMode::Gray8 => Ok(ExtendedColorType::L8),
        PixelMode::GrayAlpha8 => Ok(ExtendedColorType::La8),
        PixelMode::Rgb8 => Ok(ExtendedColorType::Rgb8),
        PixelMode::Rgba8 => Ok(ExtendedColorType::Rgba8),
        PixelMode::Palette | PixelMode::PaletteAlpha => {
            Err(HeifError::unsupported_pixel_format(mode.as_str()))
        }
    }
}

/// Encode pixels as an unfiltered, fast-compressed PNG with optional ICC and Exif chunks.
pub fn encode_intermediate_png(
    image: &SourceImage<'_>,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>> {
    image.validate()?;
    let color_type = png_color_type(image.mode)?;

    let pixels: Cow<'_, [u8]> = match image.mode {
        PixelMode::Bilevel => Cow::Owned(widen_bilevel(&image.pixels[..image.expected_len()])),
        _ => Cow::Borrowed(&image.pixels[..image.expected_len()]),
    };

    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::NoFilter)
        .write_image(&pixels, image.width, image.height, color_type)
        .map_err(|e| HeifError::intermediate_encode_failed(format!("PNG encode failed: {e}")))?;

    if icc.is_none() && exif.is_none() {
        return Ok(buf);
    }
    embed_png_metadata(buf, icc, exif)
}

/// Embed ICC (iCCP) and Exif (eXIf) into an encoded PNG using img-parts.
pub fn embed_png_metadata(
    png_data: Vec<u8>,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let mut png = Png::from_bytes(Bytes::from(png_data)).map_err(|e| {
        HeifError::intermediate_encode_failed(format!("failed to parse PNG for metadata: {e}"))
    })?;

    if let Some(icc) = icc {
        png.set_icc_profile(Some(Bytes::from(icc.to_vec())));
    }
    if let Some(exif) = exif {
        // eXIf holds the bare TIFF structure
        png.set_exif(Some(Bytes::from(tiff_payload(exif).to_vec())));
    }

    let mut output = Vec::new();
    png.encoder().write_to(&mut output).map_err(|e| {
        HeifError::intermediate_encode_failed(format!("failed to write PNG metadata: {e}"))
    })?;
    Ok(output)
}

/// Write the carrier PNG into a temp file that is removed when dropped.
pub fn write_intermediate(
    image: &SourceImage<'_>,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
) -> Result<NamedTempFile> {
    let png = encode_intermediate_png(image, icc, exif)?;

    let mut temp_file = tempfile::Builder::new()
        .prefix("heif-adapter-")
        .suffix(".png")
        .tempfile()
        .map_err(HeifError::temp_file_failed)?;
    temp_file
        .write_all(&png)
        .map_err(HeifError::temp_file_failed)?;
    temp_file.flush().map_err(HeifError::temp_file_failed)?;

    debug!(
        target: "heif_adapter::io",
        path = %temp_file.path().display(),
        bytes = png.len(),
        mode = image.mode.as_str(),
        "wrote intermediate carrier"
    );
    Ok(temp_file)
}
