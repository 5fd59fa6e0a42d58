// src/engine.rs
//
// The core of heif-adapter. Decoding side:
// 1. open: container headers, Exif split out of the metadata items,
//    container orientation folded into Exif
// 2. load: pixels decoded once, crop applied as a view over the buffer
//
// Encoding side: pixels -> intermediate PNG -> heif-enc -> caller's sink.
//
// This file is a facade over the modules in engine/

// =============================================================================
// ENCODER DEFAULTS
// =============================================================================

/// Encoder executable used when no other binary is configured.
pub const DEFAULT_ENCODER_BIN: &str = "heif-enc";

/// Bytes read from the encoder's stdout per write to the sink.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Output path handed to the encoder so it writes the container to stdout.
pub const STDOUT_SINK: &str = "/dev/stdout";

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod api;
mod command;
mod common;
mod crop;
mod decoder;
mod encoder;
mod io;
mod metadata;
mod orientation;
mod settings;
mod view;

pub use api::{save, HeifImageFile};
pub use command::{build_command, ensure_encodable, EncoderCommand};
pub use common::{has_exif_magic, tiff_payload, with_exif_header, EXIF_HEADER, EXIF_MAGIC};
pub use crop::crop;
pub use decoder::{
    is_heif_data, ColorProfile, ColorProfileKind, CropRect, DecodeError, DecodedImage,
    DecodedPixels, HeifDecoder, HeifHeader, MetadataItem, Transform, HEIF_ERROR_INVALID_INPUT,
    HEIF_SUBERROR_END_OF_DATA,
};
pub use encoder::{encode, encode_with, run_encoder};
pub use io::{
    embed_png_metadata, encode_intermediate_png, widen_bilevel, write_intermediate, ImageInfo,
    SourceImage,
};
pub use metadata::{extract_exif, split_metadata, EXIF_ITEM_TYPE};
pub use orientation::{fold_orientation, read_orientation, reconcile_orientation};
pub use settings::{EncoderSettings, OpenOptions, ENCODER_BIN_ENV};
pub use view::PixelView;
