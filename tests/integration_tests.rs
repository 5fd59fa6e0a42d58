// tests/integration_tests.rs
//
// End-to-end save path against a stand-in encoder.
//
// The stand-in is a shell script installed as the encoder binary. It logs
// its arguments, keeps a copy of the intermediate file it was given and
// writes a fixed number of bytes to the path passed after `-o`, the way
// heif-enc writes its container.

#[cfg(unix)]
mod unix {
    use heif_adapter::engine::CHUNK_SIZE;
    use heif_adapter::{
        save, EncoderSettings, HeifError, ImageInfo, PixelMode, SaveOptions, SourceImage,
    };
    use image::ImageDecoder;
    use img_parts::{png::Png, Bytes, ImageEXIF, ImageICC};
    use std::fs;
    use std::io::Cursor;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    struct FakeEncoder {
        dir: tempfile::TempDir,
        binary: PathBuf,
    }

    impl FakeEncoder {
        /// Script that emits `output_len` bytes and exits with `exit_code`.
        fn new(output_len: usize, exit_code: i32) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let binary = dir.path().join("heif-enc");
            let script = format!(
                "#!/bin/sh\n\
                 dir='{dir}'\n\
                 for a in \"$@\"; do printf '%s\\n' \"$a\" >> \"$dir/args.txt\"; done\n\
                 [ -f \"$3\" ] || exit 90\n\
                 cp \"$3\" \"$dir/carrier.png\"\n\
                 head -c {output_len} /dev/zero > \"$2\"\n\
                 exit {exit_code}\n",
                dir = dir.path().display(),
            );
            fs::write(&binary, script).unwrap();
            fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir, binary }
        }

        fn settings(&self) -> EncoderSettings {
            EncoderSettings::default().with_binary(&self.binary)
        }

        fn args(&self) -> Vec<String> {
            fs::read_to_string(self.dir.path().join("args.txt"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn carrier(&self) -> Vec<u8> {
            fs::read(self.dir.path().join("carrier.png")).unwrap()
        }

        fn was_launched(&self) -> bool {
            self.dir.path().join("args.txt").exists()
        }
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    fn rgb_pixels(width: u32, height: u32) -> Vec<u8> {
        (0..width * height * 3).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn test_save_streams_encoder_output() {
        let output_len = CHUNK_SIZE + CHUNK_SIZE / 2;
        let encoder = FakeEncoder::new(output_len, 0);
        let pixels = rgb_pixels(2, 2);
        let image = SourceImage::new(PixelMode::Rgb8, 2, 2, &pixels);
        let options = SaveOptions::new()
            .with("quality", 50)
            .with("subsampling", 2)
            .with("encoder", "x265");

        let mut sink: Vec<u8> = Vec::new();
        let written = save(&image, &mut sink, Some("out.heic"), &options, &encoder.settings()).unwrap();

        assert_eq!(written as usize, output_len);
        assert_eq!(sink.len(), output_len);
        assert!(sink.iter().all(|&b| b == 0));

        let args = encoder.args();
        assert_eq!(args[0], "-o");
        assert_eq!(args[1], "/dev/stdout");
        assert!(has_pair(&args, "-q", "50"));
        assert!(has_pair(&args, "-p", "chroma=420"));
        assert!(has_pair(&args, "-e", "x265"));
        assert!(!args.contains(&"-A".to_string()));

        // Carrier is gone once save returns.
        assert!(!Path::new(&args[2]).exists());
    }

    #[test]
    fn test_carrier_holds_pixels_and_metadata() {
        let encoder = FakeEncoder::new(16, 0);
        let info = ImageInfo {
            exif: Some(b"Exif\0\0MM\0*\0\0\0\x08\0\0".to_vec()),
            icc_profile: Some(b"not really an icc profile".to_vec()),
        };
        let pixels = rgb_pixels(3, 2);
        let image = SourceImage::new(PixelMode::Rgb8, 3, 2, &pixels).with_info(&info);

        save(&image, &mut Vec::<u8>::new(), Some("out.avif"), &SaveOptions::new(), &encoder.settings())
            .unwrap();
        assert!(encoder.args().contains(&"-A".to_string()));

        let carrier = encoder.carrier();
        let png = Png::from_bytes(Bytes::from(carrier.clone())).unwrap();
        assert_eq!(
            png.icc_profile().as_deref(),
            Some(&b"not really an icc profile"[..])
        );
        assert_eq!(png.exif().as_deref(), Some(&b"MM\0*\0\0\0\x08\0\0"[..]));

        let decoder = image::codecs::png::PngDecoder::new(Cursor::new(carrier)).unwrap();
        let mut decoded = vec![0; decoder.total_bytes() as usize];
        decoder.read_image(&mut decoded).unwrap();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_icc_option_overrides_image_info() {
        let encoder = FakeEncoder::new(1, 0);
        let info = ImageInfo {
            exif: None,
            icc_profile: Some(b"from image".to_vec()),
        };
        let pixels = vec![7u8; 4];
        let image = SourceImage::new(PixelMode::Gray8, 2, 2, &pixels).with_info(&info);
        let options = SaveOptions::new().with("icc_profile", b"from options".to_vec());

        save(&image, &mut Vec::<u8>::new(), None, &options, &encoder.settings()).unwrap();

        let png = Png::from_bytes(Bytes::from(encoder.carrier())).unwrap();
        assert_eq!(png.icc_profile().as_deref(), Some(&b"from options"[..]));
    }

    #[test]
    fn test_encoder_failure_reports_exit_code_and_cleans_up() {
        let encoder = FakeEncoder::new(10, 4);
        let pixels = rgb_pixels(2, 2);
        let image = SourceImage::new(PixelMode::Rgb8, 2, 2, &pixels);

        let mut sink: Vec<u8> = Vec::new();
        let err = save(&image, &mut sink, None, &SaveOptions::new(), &encoder.settings())
            .unwrap_err();

        assert!(matches!(err, HeifError::EncoderProcess { code: Some(4), .. }));
        assert_eq!(err.exit_code(), Some(4));
        assert!(err.to_string().contains("heif-enc -o /dev/stdout"));
        // Bytes streamed before the failure stay in the sink.
        assert_eq!(sink.len(), 10);

        let args = encoder.args();
        assert!(!Path::new(&args[2]).exists());
    }

    #[test]
    fn test_bilevel_saved_as_gray() {
        let encoder = FakeEncoder::new(1, 0);
        let pixels = vec![0u8, 1, 1, 0];
        let image = SourceImage::new(PixelMode::Bilevel, 2, 2, &pixels);

        save(&image, &mut Vec::<u8>::new(), None, &SaveOptions::new(), &encoder.settings()).unwrap();

        let decoder = image::codecs::png::PngDecoder::new(Cursor::new(encoder.carrier())).unwrap();
        assert_eq!(decoder.color_type(), image::ColorType::L8);
        let mut decoded = vec![0; decoder.total_bytes() as usize];
        decoder.read_image(&mut decoded).unwrap();
        assert_eq!(decoded, vec![0, 255, 255, 0]);
    }

    #[test]
    fn test_rejected_input_never_launches_encoder() {
        let encoder = FakeEncoder::new(1, 0);
        let pixels = vec![0u8; 4];

        let palette = SourceImage::new(PixelMode::Palette, 2, 2, &pixels);
        let err = save(&palette, &mut Vec::<u8>::new(), None, &SaveOptions::new(), &encoder.settings())
            .unwrap_err();
        assert!(matches!(err, HeifError::UnsupportedPixelFormat { .. }));

        let gray = SourceImage::new(PixelMode::Gray8, 2, 2, &pixels);
        let options = SaveOptions::new().with("subsampling", 7);
        let err = save(&gray, &mut Vec::<u8>::new(), None, &options, &encoder.settings()).unwrap_err();
        assert!(matches!(err, HeifError::InvalidOption { .. }));

        assert!(!encoder.was_launched());
    }

    #[test]
    fn test_missing_encoder_binary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EncoderSettings::default().with_binary(dir.path().join("no-heif-enc"));
        let pixels = rgb_pixels(1, 1);
        let image = SourceImage::new(PixelMode::Rgb8, 1, 1, &pixels);

        let err = save(&image, &mut Vec::<u8>::new(), None, &SaveOptions::new(), &settings).unwrap_err();
        assert!(matches!(err, HeifError::EncoderNotFound { .. }));
        assert!(err.to_string().contains("no-heif-enc"));
        assert!(err.is_recoverable());
    }
}
