#![no_main]

//! Fuzz target for folding an orientation into arbitrary Exif bytes.
//! Exercises fold_orientation() and read_orientation(); the result must
//! always carry the requested orientation.

use heif_adapter::engine::{fold_orientation, read_orientation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, &[u8])| {
    let (seed, data) = input;
    let orientation = u16::from(seed % 8) + 1;

    let exif = fold_orientation(Some(data), orientation);
    assert!(exif.starts_with(b"Exif\0\0"));
    assert_eq!(read_orientation(&exif), Some(orientation));
    let _ = read_orientation(data);
});
