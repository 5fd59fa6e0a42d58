// src/engine/api.rs
//
// Host-facing hooks: open (header only), lazy load, and save.

use crate::engine::crop::crop;
use crate::engine::decoder::{
    CropRect, DecodeError, DecodedImage, DecodedPixels, HeifDecoder, HeifHeader, MetadataItem,
};
use crate::engine::encoder::encode;
use crate::engine::io::{ImageInfo, SourceImage};
use crate::engine::metadata::split_metadata;
use crate::engine::orientation::reconcile_orientation;
use crate::engine::settings::{EncoderSettings, OpenOptions};
use crate::error::{HeifError, Result};
use crate::ops::{PixelMode, SaveOptions};
use crate::FormatInfo;
use std::io::{Read, Write};
use tracing::{debug, warn};

fn syntax_error(err: DecodeError) -> HeifError {
    HeifError::decode_syntax(err.to_string())
}

/// An opened HEIF/AVIF file whose pixels are decoded on first `load`.
pub struct HeifImageFile<D: HeifDecoder> {
    decoder: D,
    options: OpenOptions,
    header: HeifHeader,
    info: ImageInfo,
    handle: Option<D::Handle>,
    image: Option<DecodedImage>,
    load_failure: Option<String>,
}

impl<D: HeifDecoder> HeifImageFile<D> {
    /// Magic-number sniff for format detection.
    pub fn accept(decoder: &D, prefix: &[u8]) -> bool {
        decoder.check(prefix)
    }

    /// Read container headers from `reader`.
    ///
    /// Exif is split out of the metadata list and the container orientation
    /// is folded into it; no pixels are decoded yet.
    pub fn open<R: Read>(decoder: D, mut reader: R, options: OpenOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| HeifError::decode_syntax(format!("failed to read input: {e}")))?;

        if !decoder.check(&data) {
            return Err(HeifError::decode_syntax("not a HEIF/AVIF file"));
        }

        let (header, handle) = decoder.open(&data).map_err(syntax_error)?;
        let header = reconcile_orientation(split_metadata(header));

        let info = ImageInfo {
            exif: header.exif.clone(),
            icc_profile: header
                .color_profile
                .as_ref()
                .and_then(|profile| profile.icc())
                .map(<[u8]>::to_vec),
        };

        debug!(
            target: "heif_adapter::api",
            width = header.size.0,
            height = header.size.1,
            mode = header.mode.as_str(),
            exif = info.exif.is_some(),
            icc = info.icc_profile.is_some(),
            "opened HEIF header"
        );

        Ok(Self {
            decoder,
            options,
            header,
            info,
            handle: Some(handle),
            image: None,
            load_failure: None,
        })
    }

    pub fn format(&self) -> &'static FormatInfo {
        &crate::FORMAT
    }

    /// Size after the container's crop is applied.
    pub fn size(&self) -> (u32, u32) {
        let crop = self.header.transform.crop;
        (crop.width, crop.height)
    }

    pub fn mode(&self) -> PixelMode {
        self.header.mode
    }

    /// `exif` and `icc_profile` as exposed to the host.
    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    /// Non-Exif metadata items, in container order.
    pub fn metadata(&self) -> &[MetadataItem] {
        &self.header.metadata
    }

    pub fn header(&self) -> &HeifHeader {
        &self.header
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Decode and crop pixels on first call; later calls return the same image.
    ///
    /// The decoder handle is consumed by the first attempt, so after a failed
    /// load every later call fails too, naming the first failure.
    pub fn load(&mut self) -> Result<&DecodedImage> {
        if let Some(reason) = &self.load_failure {
            return Err(HeifError::decode_syntax(format!(
                "pixels unavailable, earlier load failed: {reason}"
            )));
        }
        if self.image.is_none() {
            let Some(handle) = self.handle.take() else {
                return Err(HeifError::decode_syntax("decoder handle missing before first load"));
            };
            match self.decode(handle) {
                Ok(image) => self.image = Some(image),
                Err(e) => {
                    self.load_failure = Some(e.to_string());
                    return Err(e);
                }
            }
        }
        self.image
            .as_ref()
            .ok_or_else(|| HeifError::decode_syntax("image not loaded"))
    }

    fn decode(&self, handle: D::Handle) -> Result<DecodedImage> {
        match self.decoder.load(handle) {
            Ok(pixels) => crop(DecodedImage::new(self.header.clone(), pixels)),
            Err(e) if e.is_truncated() && self.options.load_truncated => {
                warn!(target: "heif_adapter::api", error = %e, "truncated HEIF data, keeping blank image");
                self.blank_image()
            }
            Err(e) if e.is_truncated() => Err(HeifError::truncated_data(e.to_string())),
            Err(e) => Err(syntax_error(e)),
        }
    }

    /// Zero-filled image at the post-crop size.
    fn blank_image(&self) -> Result<DecodedImage> {
        let (width, height) = self.size();
        let stride = (width as usize)
            .checked_mul(self.header.mode.bytes_per_pixel())
            .ok_or_else(|| HeifError::invalid_pixel_buffer(usize::MAX, 0))?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| HeifError::invalid_pixel_buffer(usize::MAX, 0))?;
        let mut header = self.header.clone();
        header.size = (width, height);
        header.transform.crop = CropRect::full(width, height);
        Ok(DecodedImage::new(
            header,
            DecodedPixels {
                data: vec![0; len],
                stride,
            },
        ))
    }
}

/// Save hook: encode a host pixel buffer as HEIF/AVIF into `sink`.
pub fn save<W: Write + ?Sized>(
    image: &SourceImage<'_>,
    sink: &mut W,
    target_filename: Option<&str>,
    options: &SaveOptions,
    settings: &EncoderSettings,
) -> Result<u64> {
    encode(image, sink, target_filename, options, settings)
}
