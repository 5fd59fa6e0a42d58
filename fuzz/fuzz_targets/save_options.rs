#![no_main]

//! Fuzz target for save-option parsing and command assembly.
//! Whatever the option map holds, parsing either fails with InvalidOption
//! or yields a command that starts with `-o <stdout> <input>`.

use arbitrary::Arbitrary;
use heif_adapter::engine::{build_command, EncoderSettings};
use heif_adapter::{EncodeOptions, HeifError, OptionValue, PixelMode, SaveOptions};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

const KEYS: &[&str] = &[
    "avif",
    "encoder",
    "quality",
    "downsampling",
    "subsampling",
    "speed",
    "concurrency",
    "icc_profile",
    "exif",
];

#[derive(Arbitrary, Debug)]
enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

#[derive(Arbitrary, Debug)]
struct Input {
    entries: Vec<(u8, Value)>,
    filename: Option<String>,
}

fuzz_target!(|input: Input| {
    let mut options = SaveOptions::new();
    for (key, value) in input.entries {
        let key = KEYS[key as usize % KEYS.len()];
        let value = match value {
            Value::Bool(b) => OptionValue::Bool(b),
            Value::Int(i) => OptionValue::Int(i),
            Value::Str(s) => OptionValue::Str(s),
            Value::Bytes(b) => OptionValue::Bytes(b),
        };
        options.insert(key, value);
    }

    match EncodeOptions::from_save_options(&options) {
        Ok(parsed) => {
            let command = build_command(
                &EncoderSettings::default(),
                &parsed,
                PixelMode::Rgb8,
                Path::new("in.png"),
                input.filename.as_deref(),
            )
            .unwrap();
            assert_eq!(command.args()[0], "-o");
            assert_eq!(command.args()[2], "in.png");
        }
        Err(err) => assert!(matches!(err, HeifError::InvalidOption { .. })),
    }
});
