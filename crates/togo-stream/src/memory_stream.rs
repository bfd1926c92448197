//! `MemoryWriterStream` and `MemoryReader` — growing-buffer and borrowed-span
//! memory streams.

use crate::status::IOStatus;
use crate::traits::{Reader, Seekable, Writer};

/// Owns a growing byte buffer. Writing past the current length extends the
/// buffer; seeking past the current length is clamped to the end.
#[derive(Default)]
pub struct MemoryWriterStream {
    buffer: Vec<u8>,
    cursor: usize,
}

impl MemoryWriterStream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl Writer for MemoryWriterStream {
    fn write(&mut self, buf: &[u8]) -> IOStatus {
        let end = self.cursor + buf.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.cursor..end].copy_from_slice(buf);
        self.cursor = end;
        IOStatus::ok()
    }
}

impl Seekable for MemoryWriterStream {
    fn position(&mut self) -> u64 {
        self.cursor as u64
    }

    fn seek_to(&mut self, offset: u64) -> u64 {
        let clamped = (offset as usize).min(self.buffer.len());
        self.cursor = clamped;
        clamped as u64
    }
}

/// Borrows a byte span for reading; never owns or extends the buffer.
pub struct MemoryReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> MemoryReader<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }
}

impl Reader for MemoryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> (usize, IOStatus) {
        let remaining = self.data.len() - self.cursor;
        let n = buf.len().min(remaining);
        buf[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
        self.cursor += n;
        if n < buf.len() {
            (n, IOStatus::ok_eof())
        } else {
            (n, IOStatus::ok())
        }
    }
}

impl Seekable for MemoryReader<'_> {
    fn position(&mut self) -> u64 {
        self.cursor as u64
    }

    fn seek_to(&mut self, offset: u64) -> u64 {
        let clamped = (offset as usize).min(self.data.len());
        self.cursor = clamped;
        clamped as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_extends_and_clamps_seek() {
        let mut w = MemoryWriterStream::new();
        assert!(w.write(b"hello").is_ok());
        assert_eq!(w.as_slice(), b"hello");
        assert_eq!(w.seek_to(1000), 5);
    }

    #[test]
    fn reader_reports_eof_on_short_read() {
        let data = b"abc";
        let mut r = MemoryReader::new(data);
        let mut buf = [0u8; 8];
        let (n, status) = r.read(&mut buf);
        assert_eq!(n, 3);
        assert!(status.is_eof());
    }
}
