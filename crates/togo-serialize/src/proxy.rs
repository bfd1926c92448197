//! The proxy taxonomy (spec §4.3): zero-sized marker types describing how a
//! value is encoded on the wire, each exposing a `read`/`write` pair that
//! operates on a [`Serializer`].

use std::convert::TryFrom;
use std::marker::PhantomData;

use crate::endian::Arithmetic;
use crate::serializer::Serializer;

/// Encodes/decodes a value of type `T` through a sized integer `S`. Used
/// for enums and booleans whose in-memory representation is wider or
/// narrower than their wire size.
pub struct SerProxy<S, T> {
    _size: PhantomData<S>,
    _value: PhantomData<T>,
}

impl<S, T> SerProxy<S, T>
where
    S: Arithmetic + TryFrom<u64> + Into<u64>,
    T: Copy + Into<u64> + TryFrom<u64>,
{
    /// Writes `value` through `S`, or reads one back, depending on the
    /// serializer's direction.
    ///
    /// # Panics
    /// Panics if `value` does not fit in `S` when writing, or if the wire
    /// value read back does not fit in `T`.
    pub fn apply(ser: &mut Serializer<'_>, value: &mut T) {
        if ser.is_reading() {
            let mut wire: S = S::default();
            ser.arithmetic(&mut wire);
            let wire_u64: u64 = wire.into();
            *value = T::try_from(wire_u64)
                .unwrap_or_else(|_| panic!("SerProxy: value does not fit target type"));
        } else {
            let as_u64: u64 = (*value).into();
            let mut wire = S::try_from(as_u64)
                .unwrap_or_else(|_| panic!("SerProxy: value does not fit in wire size"));
            ser.arithmetic(&mut wire);
        }
    }
}

/// `len` copies of `T`, bulk-transferred for POD `T`.
pub struct SerSequence<T>(PhantomData<T>);

impl<T: Arithmetic> SerSequence<T> {
    pub fn apply(ser: &mut Serializer<'_>, items: &mut Vec<T>, len: usize) {
        if ser.is_reading() {
            items.clear();
            items.reserve(len);
            for _ in 0..len {
                let mut v = T::default();
                ser.arithmetic(&mut v);
                items.push(v);
            }
        } else {
            assert!(
                items.len() >= len,
                "SerSequence::apply: fewer items ({}) than requested len ({len})",
                items.len()
            );
            for item in items.iter_mut().take(len) {
                let mut v = *item;
                ser.arithmetic(&mut v);
            }
        }
    }
}

/// An `S`-sized length prefix followed by a resizable collection of `T`.
pub struct SerCollection<S, T>(PhantomData<(S, T)>);

impl<S, T> SerCollection<S, T>
where
    S: Arithmetic + TryFrom<usize> + Into<u64> + Copy,
    T: Arithmetic,
{
    /// Writes (or reads) the `S` count prefix, then `count` elements of `T`.
    ///
    /// # Panics
    /// Writing panics if `items.len()` overflows `S`. Reading panics if the
    /// size prefix exceeds `max_capacity` (a caller-supplied sanity bound,
    /// standing in for the spec's "size-prefix-too-large-for-capacity"
    /// assertion against a fixed-capacity target).
    pub fn apply(ser: &mut Serializer<'_>, items: &mut Vec<T>, max_capacity: usize) {
        if ser.is_reading() {
            let mut count_wire = S::default();
            ser.arithmetic(&mut count_wire);
            let count: u64 = count_wire.into();
            let count = count as usize;
            assert!(
                count <= max_capacity,
                "SerCollection::apply: size prefix {count} exceeds capacity {max_capacity}"
            );
            items.clear();
            items.reserve(count);
            for _ in 0..count {
                let mut v = T::default();
                ser.arithmetic(&mut v);
                items.push(v);
            }
        } else {
            let mut count = S::try_from(items.len())
                .unwrap_or_else(|_| panic!("SerCollection::apply: length overflows size prefix"));
            ser.arithmetic(&mut count);
            for item in items.iter_mut() {
                let mut v = *item;
                ser.arithmetic(&mut v);
            }
        }
    }
}

/// An `S`-sized length prefix then `size` bytes; readers append a trailing
/// NUL when decoding into a fixed-capacity target.
pub struct SerString<S>(PhantomData<S>);

impl<S> SerString<S>
where
    S: Arithmetic + TryFrom<usize> + Into<u64> + Copy,
{
    /// `fixed_cap`, if given, is the capacity of the target buffer
    /// (including room for the trailing NUL the spec requires readers to
    /// append); exceeding it on read panics.
    ///
    /// # Panics
    /// Writing panics if `s.len()` overflows `S`. Reading panics if the
    /// size prefix would overflow `fixed_cap` (when provided).
    pub fn apply(ser: &mut Serializer<'_>, s: &mut String, fixed_cap: Option<usize>) {
        if ser.is_reading() {
            let mut len_wire = S::default();
            ser.arithmetic(&mut len_wire);
            let len: u64 = len_wire.into();
            let len = len as usize;
            if let Some(cap) = fixed_cap {
                assert!(
                    len + 1 <= cap,
                    "SerString::apply: string of length {len} (+NUL) exceeds capacity {cap}"
                );
            }
            let mut bytes = vec![0u8; len];
            ser.buffer(&mut bytes, len);
            *s = String::from_utf8(bytes).expect("SerString::apply: invalid utf-8");
        } else {
            let byte_len = s.len();
            let mut count = S::try_from(byte_len)
                .unwrap_or_else(|_| panic!("SerString::apply: length overflows size prefix"));
            ser.arithmetic(&mut count);
            let mut bytes = s.clone().into_bytes();
            ser.buffer(&mut bytes, byte_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::Endian;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    #[test]
    fn ser_collection_round_trips_pod_elements() {
        let mut w = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut w, Endian::Little);
            let mut items: Vec<u32> = vec![1, 2, 3, 4, 5];
            SerCollection::<u32, u32>::apply(&mut ser, &mut items, 16);
        }
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        let mut ser = Serializer::reader(&mut r, Endian::Little);
        let mut out: Vec<u32> = Vec::new();
        SerCollection::<u32, u32>::apply(&mut ser, &mut out, 16);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic(expected = "exceeds capacity")]
    fn ser_collection_rejects_oversized_prefix_for_capacity() {
        let mut w = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut w, Endian::Little);
            let mut items: Vec<u8> = vec![0; 10];
            SerCollection::<u32, u8>::apply(&mut ser, &mut items, 64);
        }
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        let mut ser = Serializer::reader(&mut r, Endian::Little);
        let mut out: Vec<u8> = Vec::new();
        SerCollection::<u32, u8>::apply(&mut ser, &mut out, 4);
    }

    #[test]
    fn ser_string_round_trips() {
        let mut w = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut w, Endian::Little);
            let mut s = String::from("hello");
            SerString::<u32>::apply(&mut ser, &mut s, None);
        }
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        let mut ser = Serializer::reader(&mut r, Endian::Little);
        let mut out = String::new();
        SerString::<u32>::apply(&mut ser, &mut out, Some(16));
        assert_eq!(out, "hello");
    }
}
