#![no_main]

//! Fuzz target for splitting Exif out of container metadata items.
//! Every non-Exif item must survive, in order.

use arbitrary::Arbitrary;
use heif_adapter::engine::{extract_exif, MetadataItem};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Item {
    is_exif: bool,
    data: Vec<u8>,
}

fuzz_target!(|items: Vec<Item>| {
    let items: Vec<MetadataItem> = items
        .into_iter()
        .map(|item| MetadataItem::new(if item.is_exif { "Exif" } else { "mime" }, item.data))
        .collect();
    let others = items.iter().filter(|item| item.kind != "Exif").count();

    let (exif, rest) = extract_exif(items);
    assert_eq!(rest.len(), others);
    if let Some(exif) = exif {
        assert!(exif.starts_with(b"Exif"));
    }
});
