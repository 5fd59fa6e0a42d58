// src/error.rs
//
// Unified error handling for heif-adapter
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid save options, pixel layouts or truncated input, recoverable
// - CodecError: Container / encoder failures
// - ResourceLimit: Temp files, pipes, sinks
// - InternalBug: Library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used by callers to decide whether to retry or report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// File system / pipe failures
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// heif-adapter error types
///
/// Every variant carries the context needed to act on it without digging
/// into internals: the offending option value, the missing binary name, the
/// encoder exit code.
#[derive(Debug, Error)]
pub enum HeifError {
    // Decode Errors
    #[error("Malformed HEIF container: {message}")]
    DecodeSyntax { message: Cow<'static, str> },

    #[error("HEIF data is truncated: {message}")]
    TruncatedData { message: Cow<'static, str> },

    // Pixel layout Errors
    #[error("Unsupported pixel mode for crop: {mode}")]
    UnsupportedMode { mode: Cow<'static, str> },

    #[error("cannot write mode {mode} as HEIF")]
    UnsupportedPixelFormat { mode: Cow<'static, str> },

    #[error("Pixel buffer holds {actual} bytes, expected at least {expected}")]
    InvalidPixelBuffer { expected: usize, actual: usize },

    #[error("Crop bounds ({x}+{width}, {y}+{height}) exceed image dimensions ({img_width}x{img_height})")]
    InvalidCropBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        img_width: u32,
        img_height: u32,
    },

    // Configuration Errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidOption {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Encoder Errors
    #[error(
        "Can't find heif encoding binary '{binary}'. Install 'heif-enc' or set \
         `EncoderSettings::binary` (or the HEIF_ENC_BIN environment variable) to its full path"
    )]
    EncoderNotFound { binary: Cow<'static, str> },

    #[error("Failed to launch encoder '{binary}': {source}")]
    EncoderLaunchFailed {
        binary: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoder {} for command: {command}", describe_exit(.code))]
    EncoderProcess {
        code: Option<i32>,
        command: Cow<'static, str>,
    },

    #[error("Failed to write intermediate image: {message}")]
    IntermediateEncodeFailed { message: Cow<'static, str> },

    // I/O Errors
    #[error("Failed to create temporary carrier file: {source}")]
    TempFileFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read encoder output: {source}")]
    StreamReadFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to destination: {source}")]
    SinkWriteFailed {
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

// Constructor Helpers
impl HeifError {
    pub fn decode_syntax(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeSyntax {
            message: message.into(),
        }
    }

    pub fn truncated_data(message: impl Into<Cow<'static, str>>) -> Self {
        Self::TruncatedData {
            message: message.into(),
        }
    }

    pub fn unsupported_mode(mode: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedMode { mode: mode.into() }
    }

    pub fn unsupported_pixel_format(mode: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedPixelFormat { mode: mode.into() }
    }

    pub fn invalid_pixel_buffer(expected: usize, actual: usize) -> Self {
        Self::InvalidPixelBuffer { expected, actual }
    }

    pub fn invalid_crop_bounds(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        Self::InvalidCropBounds {
            x,
            y,
            width,
            height,
            img_width,
            img_height,
        }
    }

    pub fn invalid_option(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidOption {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn encoder_not_found(binary: impl Into<Cow<'static, str>>) -> Self {
        Self::EncoderNotFound {
            binary: binary.into(),
        }
    }

    pub fn encoder_launch_failed(
        binary: impl Into<Cow<'static, str>>,
        source: std::io::Error,
    ) -> Self {
        Self::EncoderLaunchFailed {
            binary: binary.into(),
            source,
        }
    }

    pub fn encoder_process(code: Option<i32>, command: impl Into<Cow<'static, str>>) -> Self {
        Self::EncoderProcess {
            code,
            command: command.into(),
        }
    }

    pub fn intermediate_encode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::IntermediateEncodeFailed {
            message: message.into(),
        }
    }

    pub fn temp_file_failed(source: std::io::Error) -> Self {
        Self::TempFileFailed { source }
    }

    pub fn stream_read_failed(source: std::io::Error) -> Self {
        Self::StreamReadFailed { source }
    }

    pub fn sink_write_failed(source: std::io::Error) -> Self {
        Self::SinkWriteFailed { source }
    }

    /// Exit code of a failed encoder run, if this is an encoder process error.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::EncoderProcess { code, .. } => *code,
            _ => None,
        }
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category():
    /// - UserError and ResourceLimit errors are recoverable
    /// - CodecError and InternalBug errors are not
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedMode { .. }
            | Self::UnsupportedPixelFormat { .. }
            | Self::InvalidPixelBuffer { .. }
            | Self::InvalidOption { .. }
            // A missing encoder is fixed by installing it or pointing the settings at it.
            | Self::EncoderNotFound { .. }
            // Truncated files load as blank images once OpenOptions::load_truncated is set.
            | Self::TruncatedData { .. } => ErrorCategory::UserError,

            Self::DecodeSyntax { .. }
            | Self::EncoderProcess { .. }
            | Self::IntermediateEncodeFailed { .. } => ErrorCategory::CodecError,

            Self::EncoderLaunchFailed { .. }
            | Self::TempFileFailed { .. }
            | Self::StreamReadFailed { .. }
            | Self::SinkWriteFailed { .. } => ErrorCategory::ResourceLimit,

            // The decoder handed us a crop rectangle outside its own image.
            Self::InvalidCropBounds { .. } => ErrorCategory::InternalBug,
        }
    }
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, HeifError>;
