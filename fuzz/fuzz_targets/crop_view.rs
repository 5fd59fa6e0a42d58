#![no_main]

//! Fuzz target for the zero-copy crop with arbitrary geometry.
//! Must never panic: bad rectangles and short buffers come back as errors.

use arbitrary::Arbitrary;
use heif_adapter::engine::{crop, CropRect, DecodedImage, DecodedPixels, HeifHeader};
use heif_adapter::PixelMode;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    mode: u8,
    width: u8,
    height: u8,
    stride: u16,
    rect: (u8, u8, u8, u8),
    len: u16,
}

fuzz_target!(|input: Input| {
    let mode = match input.mode % 4 {
        0 => PixelMode::Gray8,
        1 => PixelMode::Rgb8,
        2 => PixelMode::Rgba8,
        _ => PixelMode::GrayAlpha8,
    };
    let (x, y, w, h) = input.rect;
    let mut header = HeifHeader::new((input.width.into(), input.height.into()), mode);
    header.transform.crop = CropRect::new(x.into(), y.into(), w.into(), h.into());
    let image = DecodedImage::new(
        header,
        DecodedPixels {
            data: vec![0; input.len as usize],
            stride: input.stride as usize,
        },
    );

    if let Ok(out) = crop(image) {
        let _ = out.to_packed();
    }
});
