//! `FileStream` — POSIX-style file wrapper over `std::fs::File`.

use std::fs::{File, OpenOptions};
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::Path;

use crate::status::IOStatus;
use crate::traits::{Reader, Seekable, Writer};

/// How a `FileStream` was opened; mirrors the spec's POSIX `fopen` mode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    ReadBinary,
    WriteBinaryTruncate,
    WriteBinaryAppend,
}

/// A file-backed stream. Implements `Reader`+`Seekable` when opened for
/// reading, `Writer`+`Seekable` when opened for writing; both traits are
/// implemented unconditionally and simply surface `fail` if used against the
/// grain of the open mode, mirroring `ferror`/`feof` semantics.
pub struct FileStream {
    file: File,
    hit_eof: bool,
    had_error: bool,
}

impl FileStream {
    /// Opens `path` with `mode`. Returns `None` on failure (mirrors a null
    /// `FILE*` from `fopen`).
    #[must_use]
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Option<Self> {
        let mut options = OpenOptions::new();
        match mode {
            FileMode::ReadBinary => {
                options.read(true);
            }
            FileMode::WriteBinaryTruncate => {
                options.write(true).create(true).truncate(true);
            }
            FileMode::WriteBinaryAppend => {
                options.write(true).create(true).append(true);
            }
        }
        let file = options.open(path).ok()?;
        Some(Self {
            file,
            hit_eof: false,
            had_error: false,
        })
    }

    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.had_error
    }

    #[must_use]
    pub const fn at_eof(&self) -> bool {
        self.hit_eof
    }
}

impl Reader for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> (usize, IOStatus) {
        match self.file.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.hit_eof = true;
                (0, IOStatus::ok_eof())
            }
            Ok(n) if n < buf.len() => {
                self.hit_eof = true;
                (n, IOStatus::ok_eof())
            }
            Ok(n) => (n, IOStatus::ok()),
            Err(_) => {
                self.had_error = true;
                (0, IOStatus::fail())
            }
        }
    }
}

impl Writer for FileStream {
    fn write(&mut self, buf: &[u8]) -> IOStatus {
        match self.file.write_all(buf) {
            Ok(()) => IOStatus::ok(),
            Err(_) => {
                self.had_error = true;
                IOStatus::fail()
            }
        }
    }
}

impl Seekable for FileStream {
    fn position(&mut self) -> u64 {
        self.file.stream_position().unwrap_or(0)
    }

    fn seek_to(&mut self, offset: u64) -> u64 {
        self.file
            .seek(SeekFrom::Start(offset))
            .unwrap_or_else(|_| self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.bin");

        let mut w = FileStream::open(&path, FileMode::WriteBinaryTruncate).unwrap();
        assert!(w.write(b"hello").is_ok());
        drop(w);

        let mut r = FileStream::open(&path, FileMode::ReadBinary).unwrap();
        let mut buf = [0u8; 5];
        let (n, status) = r.read(&mut buf);
        assert_eq!(n, 5);
        assert!(status.is_ok());
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn short_read_at_eof_reports_partial_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        let mut w = FileStream::open(&path, FileMode::WriteBinaryTruncate).unwrap();
        assert!(w.write(b"ab").is_ok());
        drop(w);

        let mut r = FileStream::open(&path, FileMode::ReadBinary).unwrap();
        let mut buf = [0u8; 8];
        let (n, status) = r.read(&mut buf);
        assert_eq!(n, 2);
        assert!(status.is_ok());
        assert!(status.is_eof());
    }
}
