// lib.rs
//
// heif-adapter: HEIF/AVIF read and write support for a host image library.
//
// Reading goes through an external decoder (`HeifDecoder`); this crate
// splits out Exif, folds the container orientation into it and applies the
// container crop without copying pixels. Writing hands a lossless PNG to the
// `heif-enc` command-line encoder and streams its output to the caller.

pub mod engine;
pub mod error;
pub mod ops;

pub use engine::{
    save, EncoderSettings, HeifDecoder, HeifImageFile, ImageInfo, OpenOptions, PixelView,
    SourceImage,
};
pub use error::{ErrorCategory, HeifError, Result};
pub use ops::{
    ChromaSubsampling, ContainerVariant, DownsamplingFilter, EncodeOptions, OptionValue,
    PixelMode, SaveOptions,
};

/// Identity under which the format is registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
    /// Extensions the host may pick this format for when saving
    pub save_extensions: &'static [&'static str],
    /// Extensions only used to recognise input files
    pub open_extensions: &'static [&'static str],
}

impl FormatInfo {
    /// True if `ext` (with or without the leading dot, any case) belongs to this format.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.save_extensions
            .iter()
            .chain(self.open_extensions)
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    pub fn can_save_extension(&self, ext: &str) -> bool {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.save_extensions
            .iter()
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

pub const FORMAT: FormatInfo = FormatInfo {
    name: "HEIF",
    description: "HEIF/HEIC image",
    mime_type: "image/heif",
    save_extensions: &[".heic", ".avif"],
    open_extensions: &[".heif", ".hif"],
};

/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
