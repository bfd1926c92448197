//! `Reader`, `Writer`, `Seekable` — the three independently-implementable
//! stream capabilities (spec §4.1). A concrete stream implements whichever
//! subset it supports; no base class ties them together.

use crate::status::IOStatus;

/// Capability to read bytes into a caller-supplied buffer.
pub trait Reader {
    /// Reads up to `buf.len()` bytes. Returns the number of bytes actually
    /// read together with a status describing the outcome. A short read at
    /// end-of-stream returns `(n, IOStatus::ok_eof())` with the partial
    /// count; a failure returns `(0, IOStatus::fail())` and leaves position
    /// unchanged.
    fn read(&mut self, buf: &mut [u8]) -> (usize, IOStatus);
}

/// Capability to write bytes from a caller-supplied buffer.
pub trait Writer {
    /// Writes all of `buf`, returning a status describing the outcome.
    fn write(&mut self, buf: &[u8]) -> IOStatus;
}

/// Capability to query and change stream position.
pub trait Seekable {
    /// Current absolute byte position.
    fn position(&mut self) -> u64;

    /// Seeks to an absolute byte offset, returning the position actually
    /// landed on (implementations may clamp past-EOF seeks).
    fn seek_to(&mut self, offset: u64) -> u64;

    /// Seeks relative to the current position, returning the position
    /// actually landed on.
    fn seek_relative(&mut self, delta: i64) -> u64 {
        let current = self.position();
        let target = if delta >= 0 {
            current.saturating_add(delta as u64)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        };
        self.seek_to(target)
    }
}
