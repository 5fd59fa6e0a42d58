// src/engine/metadata.rs
//
// Split the container's generic metadata list into the Exif payload and
// everything else.

use crate::engine::common::has_exif_magic;
use crate::engine::decoder::{HeifHeader, MetadataItem};
use tracing::debug;

/// Item type the container uses for Exif blocks.
pub const EXIF_ITEM_TYPE: &str = "Exif";

/// Pull the Exif payload out of a metadata list.
///
/// The first `Exif` item whose data starts with the "Exif" magic wins. Every
/// `Exif` item is removed from the returned list, valid or not; all other
/// items keep their original order.
pub fn extract_exif(items: Vec<MetadataItem>) -> (Option<Vec<u8>>, Vec<MetadataItem>) {
    let mut exif = None;
    let mut remaining = Vec::with_capacity(items.len());

    for item in items {
        if item.kind != EXIF_ITEM_TYPE {
            remaining.push(item);
            continue;
        }
        if exif.is_none() && has_exif_magic(&item.data) {
            exif = Some(item.data);
        } else {
            debug!(
                target: "heif_adapter::metadata",
                len = item.data.len(),
                "dropping extra or malformed Exif item"
            );
        }
    }

    (exif, remaining)
}

/// Replace the header's Exif and metadata fields with the split result.
///
/// Any Exif the decoder reported separately is discarded in favour of the
/// metadata items.
pub fn split_metadata(mut header: HeifHeader) -> HeifHeader {
    let (exif, remaining) = extract_exif(std::mem::take(&mut header.metadata));
    header.exif = exif;
    header.metadata = remaining;
    header
}
