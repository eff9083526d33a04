//! Copy sub-protocol encoder.
//!
//! Pushes one file into a remote path by speaking the sink side of the
//! classic `scp -t` exchange:
//!
//! ```text
//! C<mode> <size> <name> \n
//! <exactly size content bytes>
//! \0
//! ```
//!
//! The encoder writes only. Acknowledgement bytes from the receiver are never
//! read, so receiver-side failures are observed solely through its exit
//! status. The destination directory must already exist.

use std::fs::{File, Metadata};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use logging::trace_copy;

use crate::error::RemoteError;
use crate::transport::{ExitStatus, InputPipe, Session};

/// Mode used when the platform exposes no permission bits.
pub const FALLBACK_MODE: u32 = 0o644;

/// Bits of a mode that the header carries; file-type bits are dropped.
pub const HEADER_MODE_MASK: u32 = 0o7777;

/// Builds the header record announcing one file.
///
/// The mode is masked to [`HEADER_MODE_MASK`] and rendered as at least four
/// octal digits. The line keeps the trailing space before the newline.
#[must_use]
pub fn header_line(mode: u32, size: u64, file_name: &str) -> String {
    let mode = mode & HEADER_MODE_MASK;
    format!("C{mode:04o} {size} {file_name} \n")
}

/// Shell-quoted command line that starts the remote copy receiver.
#[must_use]
pub fn receiver_command(destination: &str) -> String {
    shell_words::join(["scp", "-t", destination])
}

/// Streams `size` bytes from `content` into `destination` over `session`.
///
/// The receiver's exit is awaited on a scoped thread while the bytes are
/// written, and both are joined before returning.
///
/// # Errors
///
/// - [`RemoteError::Session`] if the pipe cannot be opened, the receiver cannot
///   be started, or waiting for it fails.
/// - [`RemoteError::CopyProtocol`] if writing fails or `content` ends before
///   `size` bytes were read.
/// - [`RemoteError::Command`] if the receiver exits unsuccessfully.
pub fn copy<S, R>(
    session: &mut S,
    size: u64,
    mode: u32,
    file_name: &str,
    content: R,
    destination: &str,
) -> Result<(), RemoteError>
where
    S: Session,
    R: Read,
{
    let pipe = session.input_pipe().map_err(RemoteError::Session)?;
    let command = receiver_command(destination);
    session.start(&command).map_err(RemoteError::Session)?;
    trace_copy!(destination, size, "sending {:?} with mode {:04o}", file_name, mode);

    let header = header_line(mode, size, file_name);
    let (streamed, waited) = std::thread::scope(|scope| {
        let waiter = scope.spawn(|| session.wait());
        let streamed = stream_and_close(pipe, &header, size, content);
        let waited = match waiter.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        (streamed, waited)
    });

    streamed.map_err(|source| RemoteError::CopyProtocol {
        destination: destination.to_owned(),
        source,
    })?;
    let status = waited.map_err(RemoteError::Session)?;
    check_status(&command, status)
}

/// Copies the local file at `local` into `destination`.
///
/// The header carries the local file name, its length, and its permission
/// bits ([`FALLBACK_MODE`] where the platform has none).
///
/// # Errors
///
/// [`RemoteError::LocalFile`] when the file cannot be opened or inspected,
/// otherwise whatever [`copy`] reports.
pub fn copy_path<S: Session>(
    session: &mut S,
    local: &Path,
    destination: &str,
) -> Result<(), RemoteError> {
    let file = File::open(local).map_err(|error| RemoteError::local_file(local, error))?;
    let metadata = file
        .metadata()
        .map_err(|error| RemoteError::local_file(local, error))?;
    if metadata.is_dir() {
        return Err(RemoteError::local_file(
            local,
            io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
        ));
    }
    let file_name = local
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            RemoteError::local_file(
                local,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;
    copy(
        session,
        metadata.len(),
        permission_bits(&metadata),
        &file_name,
        BufReader::new(file),
        destination,
    )
}

fn stream_and_close<R: Read>(
    mut pipe: Box<dyn InputPipe>,
    header: &str,
    size: u64,
    content: R,
) -> io::Result<()> {
    let streamed = stream(&mut pipe, header, size, content);
    // The receiver only exits once it sees end-of-input, even after a failure.
    let closed = pipe.close();
    streamed.and(closed)
}

fn stream<W: Write + ?Sized, R: Read>(
    pipe: &mut W,
    header: &str,
    size: u64,
    content: R,
) -> io::Result<()> {
    pipe.write_all(header.as_bytes())?;
    let copied = io::copy(&mut content.take(size), pipe)?;
    if copied != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("content ended after {copied} of {size} bytes"),
        ));
    }
    pipe.write_all(&[0])?;
    pipe.flush()
}

fn check_status(command: &str, status: ExitStatus) -> Result<(), RemoteError> {
    if status.success() {
        Ok(())
    } else {
        Err(RemoteError::Command {
            command: command.to_owned(),
            status,
            output: String::new(),
        })
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &Metadata) -> u32 {
    FALLBACK_MODE
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn header_matches_wire_format() {
        assert_eq!(header_line(0o644, 12, "a.txt"), "C0644 12 a.txt \n");
        assert_eq!(header_line(0o7, 0, "x"), "C0007 0 x \n");
    }

    #[test]
    fn header_drops_file_type_bits() {
        assert_eq!(header_line(0o100_644, 3, "a.txt"), "C0644 3 a.txt \n");
        assert_eq!(header_line(0o104_755, 1, "su"), "C4755 1 su \n");
    }

    #[test]
    fn receiver_command_quotes_destination() {
        assert_eq!(receiver_command("/tmp/a.txt"), "scp -t /tmp/a.txt");
        assert_eq!(
            receiver_command("/tmp/with space"),
            "scp -t '/tmp/with space'"
        );
    }

    #[test]
    fn short_content_is_a_protocol_error() {
        let mut sink = Vec::new();
        let error = stream(&mut sink, "C0644 5 f \n", 5, &b"abc"[..]).expect_err("short");
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
        assert!(!sink.ends_with(&[0]));
    }

    #[test]
    fn long_content_is_truncated_to_declared_size() {
        let mut sink = Vec::new();
        stream(&mut sink, "H", 2, &b"abcdef"[..]).expect("stream");
        assert_eq!(sink, b"Hab\0");
    }

    proptest! {
        #[test]
        fn emitted_exchange_carries_exact_size(
            content in proptest::collection::vec(any::<u8>(), 0..512),
            mode in 0u32..=0o777,
            name in "[a-zA-Z0-9._-]{1,24}",
        ) {
            let size = content.len() as u64;
            let header = header_line(mode, size, &name);
            let mut sink = Vec::new();
            stream(&mut sink, &header, size, content.as_slice()).expect("stream");

            let newline = sink.iter().position(|b| *b == b'\n').expect("header newline");
            let line = std::str::from_utf8(&sink[..newline]).expect("ascii header");
            let fields: Vec<&str> = line.trim_end().split(' ').collect();
            prop_assert_eq!(fields.len(), 3);
            prop_assert!(fields[0].starts_with('C'));
            prop_assert_eq!(u32::from_str_radix(&fields[0][1..], 8).expect("octal"), mode);
            prop_assert_eq!(fields[1].parse::<u64>().expect("decimal"), size);
            prop_assert_eq!(fields[2], name.as_str());

            let body = &sink[newline + 1..];
            prop_assert_eq!(body.len() as u64, size + 1);
            prop_assert_eq!(&body[..content.len()], content.as_slice());
            prop_assert_eq!(body[content.len()], 0u8);
        }
    }
}
