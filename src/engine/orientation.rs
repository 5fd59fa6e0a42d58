// src/engine/orientation.rs
//
// Fold the container's rotation/mirroring hint into the Exif Orientation tag.
//
// HEIF stores rotation in `irot`/`imir` boxes that take precedence over the
// Exif Orientation tag. Other formats only honour Exif, so once the image is
// handed to the host the container hint must live in Exif and the container
// flag must be cleared, otherwise consumers rotate twice.

use crate::engine::common::{tiff_payload, with_exif_header};
use crate::engine::decoder::{HeifHeader, Transform};
use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use std::io::Cursor;
use tracing::{debug, warn};

/// Move a 1-8 container orientation into Exif and reset the container flag.
///
/// Headers without an asserted orientation come back unchanged.
pub fn reconcile_orientation(header: HeifHeader) -> HeifHeader {
    let orientation = header.transform.orientation;
    if !header.transform.has_orientation() {
        return header;
    }

    let exif = fold_orientation(header.exif.as_deref(), orientation);
    debug!(
        target: "heif_adapter::orientation",
        orientation,
        exif_len = exif.len(),
        "folded container orientation into Exif"
    );

    HeifHeader {
        exif: Some(exif),
        transform: Transform {
            orientation: 0,
            ..header.transform
        },
        ..header
    }
}

/// Serialized Exif block (with `Exif\0\0` header) whose primary Orientation
/// is `orientation`.
///
/// An existing block keeps every other field. If it cannot be parsed or
/// re-serialized a fresh block holding only the Orientation is produced.
pub fn fold_orientation(existing: Option<&[u8]>, orientation: u16) -> Vec<u8> {
    if let Some(existing) = existing {
        match rewrite_orientation(existing, orientation) {
            Ok(exif) => return exif,
            Err(e) => {
                warn!(
                    target: "heif_adapter::orientation",
                    error = %e,
                    "existing Exif unusable, starting a fresh block"
                );
            }
        }
    }
    fresh_exif(orientation)
}

fn orientation_field(orientation: u16) -> Field {
    Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![orientation]),
    }
}

fn rewrite_orientation(existing: &[u8], orientation: u16) -> Result<Vec<u8>, exif::Error> {
    let parsed = Reader::new().read_raw(tiff_payload(existing).to_vec())?;
    let replacement = orientation_field(orientation);

    let mut writer = Writer::new();
    let mut replaced = false;
    for field in parsed.fields() {
        if field.tag == Tag::Orientation && field.ifd_num == In::PRIMARY {
            writer.push_field(&replacement);
            replaced = true;
        } else {
            writer.push_field(field);
        }
    }
    if !replaced {
        writer.push_field(&replacement);
    }

    // The writer drops JPEGInterchangeFormat fields; carry the thumbnail over explicitly.
    if let Some(thumbnail) = thumbnail(&parsed) {
        writer.set_jpeg(thumbnail, In::THUMBNAIL);
    }

    let mut out = Cursor::new(Vec::new());
    writer.write(&mut out, parsed.little_endian())?;
    Ok(with_exif_header(&out.into_inner()))
}

fn thumbnail(parsed: &exif::Exif) -> Option<&[u8]> {
    let offset = parsed
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = parsed
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    parsed.buf().get(offset..offset.checked_add(len)?)
}

fn fresh_exif(orientation: u16) -> Vec<u8> {
    let field = orientation_field(orientation);
    let mut writer = Writer::new();
    writer.push_field(&field);

    let mut out = Cursor::new(Vec::new());
    match writer.write(&mut out, false) {
        Ok(()) => with_exif_header(&out.into_inner()),
        // A single SHORT in IFD0 always serializes; keep the open path infallible anyway.
        Err(e) => {
            warn!(target: "heif_adapter::orientation", error = %e, "failed to write Exif");
            minimal_orientation_tiff(orientation)
        }
    }
}

/// Hand-laid big-endian TIFF with one IFD0 entry (Orientation, SHORT, 1).
fn minimal_orientation_tiff(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::with_capacity(26);
    tiff.extend_from_slice(b"MM\0*");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());
    with_exif_header(&tiff)
}

/// Read the primary Orientation from an Exif block (with or without header).
pub fn read_orientation(exif: &[u8]) -> Option<u16> {
    let parsed = Reader::new().read_raw(tiff_payload(exif).to_vec()).ok()?;
    let field = parsed.get_field(Tag::Orientation, In::PRIMARY)?;
    field.value.get_uint(0).and_then(|v| u16::try_from(v).ok())
}
