// src/engine/encoder.rs
//
// Streaming encode: intermediate PNG -> heif-enc subprocess -> sink.
//
// Only stdout is piped. stderr is left to the parent's stderr: reading both
// pipes from one thread can deadlock when the encoder fills the unread one,
// so encoder diagnostics are not captured on any path.

use crate::engine::command::{build_command, ensure_encodable, EncoderCommand};
use crate::engine::io::{write_intermediate, SourceImage};
use crate::engine::settings::EncoderSettings;
use crate::error::{HeifError, Result};
use crate::ops::{EncodeOptions, SaveOptions};
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ExitStatus, Stdio};
use tracing::{debug, warn};

/// Encode `image` through the external encoder, streaming the container
/// bytes into `sink`. Returns the number of bytes written.
///
/// Options are parsed and validated before any file or process is created.
/// `icc_profile` / `exif` options take precedence over the image's own info.
pub fn encode<W: Write + ?Sized>(
    image: &SourceImage<'_>,
    sink: &mut W,
    target_filename: Option<&str>,
    options: &SaveOptions,
    settings: &EncoderSettings,
) -> Result<u64> {
    ensure_encodable(image.mode)?;
    let encode_options = EncodeOptions::from_save_options(options)?;
    let icc = options.bytes("icc_profile")?.or_else(|| image.icc_profile());
    let exif = options.bytes("exif")?.or_else(|| image.exif());

    encode_with(image, sink, target_filename, &encode_options, icc, exif, settings)
}

/// Typed entry point: same pipeline as `encode` with pre-built options.
pub fn encode_with<W: Write + ?Sized>(
    image: &SourceImage<'_>,
    sink: &mut W,
    target_filename: Option<&str>,
    options: &EncodeOptions,
    icc: Option<&[u8]>,
    exif: Option<&[u8]>,
    settings: &EncoderSettings,
) -> Result<u64> {
    ensure_encodable(image.mode)?;
    image.validate()?;

    // Dropped on every exit path below, which deletes the file.
    let carrier = write_intermediate(image, icc, exif)?;
    let command = build_command(settings, options, image.mode, carrier.path(), target_filename)?;

    run_encoder(&command, sink, settings.chunk_size)
}

/// Kills and reaps the child if it is still running when dropped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            // InvalidInput: the process already exited, only reaping is left.
            if e.kind() != ErrorKind::InvalidInput {
                warn!(target: "heif_adapter::encoder", error = %e, "failed to kill encoder");
            }
        }
        let _ = self.child.wait();
    }
}

/// Fill `buf` from `reader` until it is full or the stream ends.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Launch `command` and copy its stdout to `sink` in `chunk_size` chunks.
///
/// Exit status is checked only after stdout is fully drained. A non-zero
/// exit fails with `EncoderProcess` after the bytes already streamed were
/// written to the sink.
pub fn run_encoder<W: Write + ?Sized>(
    command: &EncoderCommand,
    sink: &mut W,
    chunk_size: usize,
) -> Result<u64> {
    debug!(target: "heif_adapter::encoder", %command, "launching encoder");

    let child = command
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| {
            let binary = command.program().display().to_string();
            if e.kind() == ErrorKind::NotFound {
                HeifError::encoder_not_found(binary)
            } else {
                HeifError::encoder_launch_failed(binary, e)
            }
        })?;
    let mut guard = ChildGuard::new(child);

    let mut total = 0u64;
    {
        let Some(stdout) = guard.child.stdout.as_mut() else {
            return Err(HeifError::stream_read_failed(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "encoder stdout was not captured",
            )));
        };

        let mut buf = vec![0u8; chunk_size.max(1)];
        loop {
            let n = read_chunk(stdout, &mut buf).map_err(HeifError::stream_read_failed)?;
            if n == 0 {
                break;
            }
            sink.write_all(&buf[..n]).map_err(HeifError::sink_write_failed)?;
            total += n as u64;
        }
    }
    // stdout is at EOF; release the pipe before reaping.
    drop(guard.child.stdout.take());

    let status = guard.wait().map_err(HeifError::stream_read_failed)?;
    debug!(
        target: "heif_adapter::encoder",
        bytes = total,
        code = ?status.code(),
        "encoder finished"
    );

    if !status.success() {
        return Err(HeifError::encoder_process(status.code(), command.to_string()));
    }
    Ok(total)
}
