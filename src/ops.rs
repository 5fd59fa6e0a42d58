// src/ops.rs
//
// Pixel modes and save options.
// Save options arrive from the host as a loose key/value map and are parsed
// once into an immutable, typed EncodeOptions before any encoder work starts.

use crate::error::{HeifError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Pixel layout of a buffer, named after the host framework's mode strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelMode {
    /// 1-bit, stored one byte per pixel (0 = black, anything else = white)
    Bilevel,
    /// 8-bit grayscale ("L")
    Gray8,
    /// 8-bit grayscale with alpha ("LA")
    GrayAlpha8,
    /// 8-bit RGB ("RGB")
    Rgb8,
    /// 8-bit RGBA ("RGBA")
    Rgba8,
    /// 8-bit palette indices ("P")
    Palette,
    /// Palette indices with alpha ("PA")
    PaletteAlpha,
}

impl PixelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelMode::Bilevel => "1",
            PixelMode::Gray8 => "L",
            PixelMode::GrayAlpha8 => "LA",
            PixelMode::Rgb8 => "RGB",
            PixelMode::Rgba8 => "RGBA",
            PixelMode::Palette => "P",
            PixelMode::PaletteAlpha => "PA",
        }
    }

    /// Bytes per pixel in a packed buffer of this mode.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelMode::Bilevel | PixelMode::Gray8 | PixelMode::Palette => 1,
            PixelMode::GrayAlpha8 | PixelMode::PaletteAlpha => 2,
            PixelMode::Rgb8 => 3,
            PixelMode::Rgba8 => 4,
        }
    }

    pub fn is_palette(&self) -> bool {
        matches!(self, PixelMode::Palette | PixelMode::PaletteAlpha)
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SAVE OPTIONS MAP
// =============================================================================

/// A single value in the host's save-options map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl OptionValue {
    fn describe(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Str(s) => s.clone(),
            OptionValue::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<Vec<u8>> for OptionValue {
    fn from(value: Vec<u8>) -> Self {
        OptionValue::Bytes(value)
    }
}

/// Caller-supplied save options, keyed by the recognized option names:
/// `icc_profile`, `exif`, `avif`, `encoder`, `quality`, `downsampling`,
/// `subsampling`, `speed`, `concurrency`. Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    values: BTreeMap<String, OptionValue>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    fn bool(&self, key: &'static str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Bool(b)) => Ok(Some(*b)),
            Some(OptionValue::Int(i)) => Ok(Some(*i != 0)),
            Some(other) => Err(HeifError::invalid_option(
                key,
                other.describe(),
                "Expected a boolean",
            )),
        }
    }

    fn int(&self, key: &'static str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Int(i)) => Ok(Some(*i)),
            Some(OptionValue::Str(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                HeifError::invalid_option(key, s.clone(), "Expected an integer")
            }),
            Some(other) => Err(HeifError::invalid_option(
                key,
                other.describe(),
                "Expected an integer",
            )),
        }
    }

    fn string(&self, key: &'static str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Str(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(HeifError::invalid_option(
                key,
                other.describe(),
                "Expected a string",
            )),
        }
    }

    /// Raw bytes for `icc_profile` / `exif`.
    pub fn bytes(&self, key: &'static str) -> Result<Option<&[u8]>> {
        match self.get(key) {
            None => Ok(None),
            Some(OptionValue::Bytes(b)) => Ok(Some(b.as_slice())),
            Some(other) => Err(HeifError::invalid_option(
                key,
                other.describe(),
                "Expected raw bytes",
            )),
        }
    }
}

// =============================================================================
// TYPED ENCODE OPTIONS
// =============================================================================

/// Output container flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerVariant {
    Heic,
    Avif,
}

impl ContainerVariant {
    /// Infer from a target filename: the text after the last `.` (the whole
    /// name when there is no dot) must equal "avif", ignoring case.
    pub fn from_filename(filename: &str) -> Self {
        let suffix = filename.rsplit('.').next().unwrap_or(filename);
        if suffix.eq_ignore_ascii_case("avif") {
            ContainerVariant::Avif
        } else {
            ContainerVariant::Heic
        }
    }
}

/// Chroma subsampling ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromaSubsampling {
    Yuv444,
    Yuv422,
    Yuv420,
}

impl ChromaSubsampling {
    /// Host convention: 0 = 4:4:4, 1 = 4:2:2, 2 = 4:2:0.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Yuv444),
            1 => Some(Self::Yuv422),
            2 => Some(Self::Yuv420),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Yuv444 => "444",
            Self::Yuv422 => "422",
            Self::Yuv420 => "420",
        }
    }
}

impl FromStr for ChromaSubsampling {
    type Err = HeifError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "444" | "4:4:4" => Ok(Self::Yuv444),
            "422" | "4:2:2" => Ok(Self::Yuv422),
            "420" | "4:2:0" => Ok(Self::Yuv420),
            other => Err(HeifError::invalid_option(
                "subsampling",
                other.to_string(),
                "Expected 0, 1, 2, 444, 422 or 420",
            )),
        }
    }
}

/// RGB -> YCbCr chroma downsampling filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownsamplingFilter {
    NearestNeighbor,
    Average,
    SharpYuv,
}

impl DownsamplingFilter {
    pub fn token(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "nn",
            Self::Average => "average",
            Self::SharpYuv => "sharp-yuv",
        }
    }
}

impl FromStr for DownsamplingFilter {
    type Err = HeifError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nn" => Ok(Self::NearestNeighbor),
            "average" => Ok(Self::Average),
            "sharp-yuv" => Ok(Self::SharpYuv),
            other => Err(HeifError::invalid_option(
                "downsampling",
                other.to_string(),
                "Expected nn, average or sharp-yuv",
            )),
        }
    }
}

/// Validated options for one encoder invocation.
///
/// Built fresh per save call and consumed by the command builder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// None = infer from the target filename
    pub container: Option<ContainerVariant>,
    pub encoder: Option<String>,
    /// Passed through unvalidated; the encoder owns the range check
    pub quality: Option<i64>,
    pub chroma: Option<ChromaSubsampling>,
    pub downsampling: Option<DownsamplingFilter>,
    pub speed: Option<i64>,
    pub threads: Option<i64>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self, container: ContainerVariant) -> Self {
        self.container = Some(container);
        self
    }

    pub fn encoder(mut self, name: impl Into<String>) -> Self {
        self.encoder = Some(name.into());
        self
    }

    pub fn quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn chroma(mut self, chroma: ChromaSubsampling) -> Self {
        self.chroma = Some(chroma);
        self
    }

    pub fn downsampling(mut self, filter: DownsamplingFilter) -> Self {
        self.downsampling = Some(filter);
        self
    }

    pub fn speed(mut self, speed: i64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn threads(mut self, threads: i64) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Parse the host option map. Every value is validated here, so a bad
    /// option never reaches the temp file or the encoder process.
    pub fn from_save_options(options: &SaveOptions) -> Result<Self> {
        let container = options.bool("avif")?.map(|avif| {
            if avif {
                ContainerVariant::Avif
            } else {
                ContainerVariant::Heic
            }
        });

        // An empty encoder name means "let heif-enc pick".
        let encoder = options
            .string("encoder")?
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let downsampling = options
            .string("downsampling")?
            .map(DownsamplingFilter::from_str)
            .transpose()?;

        let chroma = match options.get("subsampling") {
            None => None,
            Some(OptionValue::Int(index)) => Some(ChromaSubsampling::from_index(*index).ok_or_else(
                || {
                    HeifError::invalid_option(
                        "subsampling",
                        index.to_string(),
                        "Expected 0, 1, 2, 444, 422 or 420",
                    )
                },
            )?),
            Some(OptionValue::Str(token)) => Some(token.parse()?),
            Some(other) => {
                return Err(HeifError::invalid_option(
                    "subsampling",
                    other.describe(),
                    "Expected 0, 1, 2, 444, 422 or 420",
                ))
            }
        };

        Ok(Self {
            container,
            encoder,
            quality: options.int("quality")?,
            chroma,
            downsampling,
            speed: options.int("speed")?,
            threads: options.int("concurrency")?,
        })
    }

    /// Resolve the container: explicit choice wins, then the filename extension.
    pub fn resolve_container(&self, target_filename: Option<&str>) -> ContainerVariant {
        self.container.unwrap_or_else(|| {
            target_filename
                .map(ContainerVariant::from_filename)
                .unwrap_or(ContainerVariant::Heic)
        })
    }
}
