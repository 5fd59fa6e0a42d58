// src/engine/command.rs
//
// Build the heif-enc argument vector from validated encode options.

use crate::engine::settings::EncoderSettings;
use crate::engine::STDOUT_SINK;
use crate::error::{HeifError, Result};
use crate::ops::{ContainerVariant, EncodeOptions, PixelMode};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Program plus arguments for one encoder run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl EncoderCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    fn push(&mut self, arg: impl AsRef<OsStr>) {
        self.args.push(arg.as_ref().to_os_string());
    }

    fn push_param(&mut self, name: &str, value: impl fmt::Display) {
        self.push("-p");
        self.push(format!("{name}={value}"));
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// True when `flag` is immediately followed by `value`.
    pub fn has_pair(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|pair| {
            pair[0].as_os_str() == OsStr::new(flag) && pair[1].as_os_str() == OsStr::new(value)
        })
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for EncoderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Reject pixel layouts the encoder cannot take.
pub fn ensure_encodable(mode: PixelMode) -> Result<()> {
    if mode.is_palette() {
        return Err(HeifError::unsupported_pixel_format(mode.as_str()));
    }
    Ok(())
}

/// Assemble `heif-enc -o <stdout> <input> [flags]`.
///
/// Output always goes to the process's stdout; the container variant falls
/// back to the target filename's extension when the options leave it unset.
pub fn build_command(
    settings: &EncoderSettings,
    options: &EncodeOptions,
    mode: PixelMode,
    input: &Path,
    target_filename: Option<&str>,
) -> Result<EncoderCommand> {
    ensure_encodable(mode)?;

    let mut command = EncoderCommand::new(&settings.binary)
        .arg("-o")
        .arg(STDOUT_SINK)
        .arg(input);

    if options.resolve_container(target_filename) == ContainerVariant::Avif {
        command.push("-A");
    }

    if let Some(encoder) = &options.encoder {
        command.push("-e");
        command.push(encoder);
    }

    if let Some(quality) = options.quality {
        command.push("-q");
        command.push(quality.to_string());
    }

    if let Some(filter) = options.downsampling {
        command.push("-C");
        command.push(filter.token());
    }

    if let Some(chroma) = options.chroma {
        command.push_param("chroma", chroma.token());
    }

    if let Some(speed) = options.speed {
        command.push_param("speed", speed);
    }

    if let Some(threads) = options.threads {
        command.push_param("threads", threads);
    }

    debug!(target: "heif_adapter::command", %command, "built encoder command");
    Ok(command)
}
