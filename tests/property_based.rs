use heif_adapter::engine::{
    crop, extract_exif, read_orientation, reconcile_orientation, CropRect, DecodedImage,
    DecodedPixels, HeifHeader, MetadataItem, Transform,
};
use heif_adapter::ops::{ChromaSubsampling, EncodeOptions, OptionValue, PixelMode, SaveOptions};
use heif_adapter::HeifError;
use proptest::prelude::*;

fn pixel_mode_strategy() -> impl Strategy<Value = PixelMode> {
    prop_oneof![
        Just(PixelMode::Gray8),
        Just(PixelMode::Rgb8),
        Just(PixelMode::Rgba8),
    ]
}

/// (image width, image height, crop rect, stride padding)
fn valid_crop_strategy() -> impl Strategy<Value = (u32, u32, CropRect, usize)> {
    (1u32..=48, 1u32..=48)
        .prop_flat_map(|(img_w, img_h)| (Just(img_w), Just(img_h), 1u32..=img_w, 1u32..=img_h))
        .prop_flat_map(|(img_w, img_h, crop_w, crop_h)| {
            (
                Just(img_w),
                Just(img_h),
                0u32..=img_w - crop_w,
                0u32..=img_h - crop_h,
                Just(crop_w),
                Just(crop_h),
                0usize..8,
            )
        })
        .prop_map(|(img_w, img_h, x, y, w, h, pad)| (img_w, img_h, CropRect::new(x, y, w, h), pad))
}

fn make_image(mode: PixelMode, width: u32, height: u32, pad: usize, rect: CropRect) -> DecodedImage {
    let stride = width as usize * mode.bytes_per_pixel() + pad;
    let data: Vec<u8> = (0..stride * height as usize).map(|i| (i % 251) as u8).collect();
    let mut header = HeifHeader::new((width, height), mode);
    header.transform.crop = rect;
    DecodedImage::new(header, DecodedPixels { data, stride })
}

/// Rows copied out of the full buffer, the reference result for a crop.
fn copy_crop(image: &DecodedImage, rect: CropRect) -> Vec<u8> {
    let px = image.mode().bytes_per_pixel();
    let mut out = Vec::new();
    for y in rect.y..rect.y + rect.height {
        let start = image.stride * y as usize + px * rect.x as usize;
        out.extend_from_slice(&image.pixels[start..start + px * rect.width as usize]);
    }
    out
}

proptest! {
    #[test]
    fn prop_crop_view_matches_copied_rows(
        mode in pixel_mode_strategy(),
        (width, height, rect, pad) in valid_crop_strategy(),
    ) {
        let image = make_image(mode, width, height, pad, rect);
        let expected = copy_crop(&image, rect);
        let original = image.pixels.clone();
        let stride = image.stride;

        let cropped = crop(image).unwrap();
        prop_assert_eq!(cropped.size(), (rect.width, rect.height));
        prop_assert_eq!(cropped.header.transform.crop, CropRect::full(rect.width, rect.height));
        prop_assert_eq!(cropped.stride, stride);
        prop_assert!(cropped.pixels.shares_storage_with(&original));
        prop_assert_eq!(cropped.to_packed(), expected);
    }

    #[test]
    fn prop_crop_outside_image_rejected(
        mode in pixel_mode_strategy(),
        width in 1u32..=32,
        height in 1u32..=32,
        overshoot in 1u32..=16,
    ) {
        let rect = CropRect::new(width, 0, overshoot, height);
        let image = make_image(mode, width, height, 0, CropRect::full(width, height));
        let image = DecodedImage {
            header: HeifHeader {
                transform: Transform { crop: rect, orientation: 0 },
                ..image.header
            },
            ..image
        };
        let is_invalid_crop = matches!(crop(image), Err(HeifError::InvalidCropBounds { .. }));
        prop_assert!(is_invalid_crop);
    }

    #[test]
    fn prop_orientation_folded_into_exif(orientation in 1u16..=8) {
        let mut header = HeifHeader::new((8, 8), PixelMode::Rgb8);
        header.transform.orientation = orientation;

        let header = reconcile_orientation(header);
        prop_assert_eq!(header.transform.orientation, 0);
        let exif = header.exif.unwrap();
        prop_assert!(exif.starts_with(b"Exif\0\0"));
        prop_assert_eq!(read_orientation(&exif), Some(orientation));
    }

    #[test]
    fn prop_orientation_outside_range_is_identity(orientation in prop_oneof![Just(0u16), 9u16..]) {
        let mut header = HeifHeader::new((8, 8), PixelMode::Gray8);
        header.transform.orientation = orientation;
        header.exif = Some(b"Exif\0\0untouched".to_vec());

        let reconciled = reconcile_orientation(header.clone());
        prop_assert_eq!(reconciled, header);
    }

    #[test]
    fn prop_extract_exif_keeps_other_items_in_order(
        kinds in prop::collection::vec(prop_oneof![Just("Exif"), Just("mime"), Just("uri ")], 0..12),
    ) {
        let items: Vec<MetadataItem> = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let mut data = b"Exif\0\0".to_vec();
                data.push(i as u8);
                MetadataItem::new(*kind, data)
            })
            .collect();
        let expected_rest: Vec<MetadataItem> =
            items.iter().filter(|item| item.kind != "Exif").cloned().collect();
        let expected_exif = items.iter().find(|item| item.kind == "Exif").map(|item| item.data.clone());

        let (exif, rest) = extract_exif(items);
        prop_assert_eq!(exif, expected_exif);
        prop_assert_eq!(rest, expected_rest);
    }

    #[test]
    fn prop_subsampling_index_and_token_agree(index in 0i64..=2) {
        let token = ["444", "422", "420"][index as usize];
        let by_index = EncodeOptions::from_save_options(
            &SaveOptions::new().with("subsampling", OptionValue::Int(index)),
        ).unwrap();
        let by_token = EncodeOptions::from_save_options(
            &SaveOptions::new().with("subsampling", token),
        ).unwrap();
        prop_assert_eq!(by_index.chroma, by_token.chroma);
        prop_assert_eq!(by_index.chroma.map(|c| c.token()), Some(token));
        prop_assert_eq!(by_index.chroma, ChromaSubsampling::from_index(index));
    }
}
