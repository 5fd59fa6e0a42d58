// src/engine/settings.rs
//
// Explicit configuration for the open and save paths.
// Nothing here is global: callers build a value and pass it in.

use crate::engine::{CHUNK_SIZE, DEFAULT_ENCODER_BIN};
use std::path::PathBuf;

/// Environment variable consulted by `EncoderSettings::from_env`.
pub const ENCODER_BIN_ENV: &str = "HEIF_ENC_BIN";

/// How to run the external encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Executable name (resolved via PATH) or full path
    pub binary: PathBuf,
    /// Bytes read from the encoder's stdout per sink write
    pub chunk_size: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ENCODER_BIN),
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl EncoderSettings {
    /// Defaults, with the binary taken from `HEIF_ENC_BIN` when set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var_os(ENCODER_BIN_ENV) {
            Some(bin) if !bin.is_empty() => Self::default().with_binary(bin),
            _ => Self::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Zero is bumped to one byte so the read loop always progresses.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Options for opening and loading a HEIF file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Keep a blank image instead of failing when the data ends mid-decode
    pub load_truncated: bool,
}

impl OpenOptions {
    /// Best-effort loading of truncated files.
    pub fn lenient() -> Self {
        Self {
            load_truncated: true,
        }
    }
}
