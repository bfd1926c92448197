//! The endian-aware binary serializer.
//!
//! A single [`Serializer`] carries a direction (reading from a
//! [`Reader`](togo_stream::Reader) or writing to a
//! [`Writer`](togo_stream::Writer)) and a target endian. Every primitive
//! operation dispatches on that direction at the call site, which is the
//! closest safe-Rust analogue of the teacher's single overloaded
//! `operator%`: one call that means "read" on a reading serializer and
//! "write" on a writing one.
//!
//! Fixed-width arithmetic values are byte-swapped one element at a time
//! when the target endian differs from native; byte-level blobs
//! ([`buffer`](Serializer::buffer)) are never swapped.

use togo_stream::{Reader, Writer};

use crate::endian::{Arithmetic, Endian};

enum Direction<'s> {
    Reading(&'s mut dyn Reader),
    Writing(&'s mut dyn Writer),
}

/// The serializer. Construct with [`Serializer::reader`] or
/// [`Serializer::writer`].
pub struct Serializer<'s> {
    direction: Direction<'s>,
    endian: Endian,
}

impl<'s> Serializer<'s> {
    #[must_use]
    pub fn reader(reader: &'s mut dyn Reader, endian: Endian) -> Self {
        Self {
            direction: Direction::Reading(reader),
            endian,
        }
    }

    #[must_use]
    pub fn writer(writer: &'s mut dyn Writer, endian: Endian) -> Self {
        Self {
            direction: Direction::Writing(writer),
            endian,
        }
    }

    #[must_use]
    pub const fn endian(&self) -> Endian {
        match self.endian {
            Endian::Little => Endian::Little,
            Endian::Big => Endian::Big,
        }
    }

    #[must_use]
    pub const fn is_reading(&self) -> bool {
        matches!(self.direction, Direction::Reading(_))
    }

    fn read_exact(&mut self, buf: &mut [u8]) {
        match &mut self.direction {
            Direction::Reading(r) => {
                let (n, status) = r.read(buf);
                assert!(
                    n == buf.len() && status.is_ok(),
                    "Serializer: unexpected end of stream reading {} bytes (got {})",
                    buf.len(),
                    n
                );
            }
            Direction::Writing(_) => panic!("Serializer: read on a writing serializer"),
        }
    }

    fn write_exact(&mut self, buf: &[u8]) {
        match &mut self.direction {
            Direction::Writing(w) => {
                let status = w.write(buf);
                assert!(status.is_ok(), "Serializer: write failed");
            }
            Direction::Reading(_) => panic!("Serializer: write on a reading serializer"),
        }
    }

    /// A single fixed-width arithmetic value, byte-swapped on mismatch.
    pub fn arithmetic<T: Arithmetic>(&mut self, value: &mut T) {
        match &self.direction {
            Direction::Writing(_) => {
                let bytes = match self.endian {
                    Endian::Little => value.to_le_array(),
                    Endian::Big => value.to_be_array(),
                };
                self.write_exact(&bytes);
            }
            Direction::Reading(_) => {
                let mut bytes = vec![0u8; T::SIZE];
                self.read_exact(&mut bytes);
                *value = match self.endian {
                    Endian::Little => T::from_le_array(&bytes),
                    Endian::Big => T::from_be_array(&bytes),
                };
            }
        }
    }

    /// `SerBuffer`: `len` raw bytes, verbatim, never byte-swapped.
    pub fn buffer(&mut self, buf: &mut Vec<u8>, len: usize) {
        match &self.direction {
            Direction::Writing(_) => {
                assert!(buf.len() >= len, "Serializer::buffer: buffer shorter than len");
                let bytes = buf[..len].to_vec();
                self.write_exact(&bytes);
            }
            Direction::Reading(_) => {
                buf.resize(len, 0);
                self.read_exact(buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    #[test]
    fn arithmetic_round_trips_both_endians() {
        for endian in [Endian::Little, Endian::Big] {
            let mut w = MemoryWriterStream::new();
            {
                let mut ser = Serializer::writer(&mut w, endian);
                let mut v: u32 = 0x1234_5678;
                ser.arithmetic(&mut v);
            }
            let bytes = w.into_inner();
            let mut r = MemoryReader::new(&bytes);
            let mut ser = Serializer::reader(&mut r, endian);
            let mut out: u32 = 0;
            ser.arithmetic(&mut out);
            assert_eq!(out, 0x1234_5678);
        }
    }

    #[test]
    #[should_panic(expected = "unexpected end of stream")]
    fn reading_past_eof_panics() {
        let data: [u8; 1] = [0];
        let mut r = MemoryReader::new(&data);
        let mut ser = Serializer::reader(&mut r, Endian::Little);
        let mut v: u32 = 0;
        ser.arithmetic(&mut v);
    }
}
