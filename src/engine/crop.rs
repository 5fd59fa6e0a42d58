// src/engine/crop.rs
//
// Zero-copy crop: apply the container's pending crop by narrowing the pixel
// view instead of copying rows.

use crate::engine::decoder::{CropRect, DecodedImage, HeifHeader, Transform};
use crate::error::{HeifError, Result};
use crate::ops::PixelMode;
use tracing::debug;

/// Pixel size for modes the crop understands.
fn pixel_size(mode: PixelMode) -> Option<usize> {
    match mode {
        PixelMode::Gray8 => Some(1),
        PixelMode::Rgb8 => Some(3),
        PixelMode::Rgba8 => Some(4),
        _ => None,
    }
}

/// Apply `transform.crop` without copying pixel bytes.
///
/// The returned image's view points into the same storage as the input, at
/// `stride * y + pixel_size * x`, and keeps the original stride. A crop that
/// already covers the whole image returns the input untouched.
pub fn crop(image: DecodedImage) -> Result<DecodedImage> {
    let rect = image.header.transform.crop;
    let size = image.header.size;
    if rect.is_full(size) {
        return Ok(image);
    }

    let mode = image.header.mode;
    let pixel_size = pixel_size(mode).ok_or_else(|| HeifError::unsupported_mode(mode.as_str()))?;

    if !rect.fits_within(size) {
        return Err(HeifError::invalid_crop_bounds(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            size.0,
            size.1,
        ));
    }

    let stride = image.stride;
    let buffer_len = image.pixels.len();
    let overflow = || HeifError::invalid_pixel_buffer(usize::MAX, buffer_len);

    // Every row must hold at least its own pixels.
    let row_len = (size.0 as usize)
        .checked_mul(pixel_size)
        .ok_or_else(overflow)?;
    if stride < row_len {
        return Err(HeifError::invalid_pixel_buffer(row_len, stride));
    }

    let offset = stride
        .checked_mul(rect.y as usize)
        .and_then(|row_start| row_start.checked_add(pixel_size * rect.x as usize))
        .ok_or_else(overflow)?;
    let available = buffer_len
        .checked_sub(offset)
        .ok_or_else(|| HeifError::invalid_pixel_buffer(offset, buffer_len))?;

    // The last cropped row only needs its visible pixels, not full stride padding.
    let needed = match rect.height {
        0 => 0,
        h => stride
            .checked_mul(h as usize - 1)
            .and_then(|rows| rows.checked_add(pixel_size * rect.width as usize))
            .ok_or_else(overflow)?,
    };
    if available < needed {
        return Err(HeifError::invalid_pixel_buffer(
            offset.saturating_add(needed),
            buffer_len,
        ));
    }
    let len = stride
        .checked_mul(rect.height as usize)
        .map_or(available, |full| full.min(available));
    let pixels = image.pixels.slice(offset, len)?;

    debug!(
        target: "heif_adapter::crop",
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        offset,
        len,
        "cropped pixel view"
    );

    Ok(DecodedImage {
        header: HeifHeader {
            size: (rect.width, rect.height),
            transform: Transform {
                crop: CropRect::full(rect.width, rect.height),
                ..image.header.transform
            },
            ..image.header
        },
        pixels,
        stride,
    })
}
