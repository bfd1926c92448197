//! Binary codec: `u32` version header, tag byte then type-specific body.
//! Collections are `u32`-count-prefixed; string lengths are `u32`.

use togo_serialize::{Endian, SerString, Serializer};
use togo_stream::{Reader, Writer};

use crate::error::Error;
use crate::value::{Kind, Kvs};

const VERSION: u32 = 1;

const TAG_NULL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_DEC: u8 = 2;
const TAG_BOOL: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_VEC1: u8 = 5;
const TAG_VEC2: u8 = 6;
const TAG_VEC3: u8 = 7;
const TAG_VEC4: u8 = 8;
const TAG_ARRAY: u8 = 9;
const TAG_NODE: u8 = 10;

/// Writes `root`'s children with the `u32` version header.
pub fn write(root: &Kvs, writer: &mut dyn Writer) {
    let mut ser = Serializer::writer(writer, Endian::default_target());
    let mut version = VERSION;
    ser.arithmetic(&mut version);
    let children = root.children().unwrap_or(&[]);
    write_children(&mut ser, children);
}

/// Reads a root node previously written by [`write`].
///
/// # Errors
/// Returns [`Error::UnsupportedVersion`] if the header doesn't match.
pub fn read(reader: &mut dyn Reader) -> Result<Kvs, Error> {
    let mut ser = Serializer::reader(reader, Endian::default_target());
    let mut version = 0u32;
    ser.arithmetic(&mut version);
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let children = read_children(&mut ser);
    Ok(Kvs::unnamed(Kind::Node(children)))
}

fn write_children(ser: &mut Serializer<'_>, children: &[Kvs]) {
    let mut count = children.len() as u32;
    ser.arithmetic(&mut count);
    for child in children {
        write_node(ser, child);
    }
}

fn read_children(ser: &mut Serializer<'_>) -> Vec<Kvs> {
    let mut count = 0u32;
    ser.arithmetic(&mut count);
    (0..count).map(|_| read_node(ser)).collect()
}

fn write_node(ser: &mut Serializer<'_>, node: &Kvs) {
    let tag = match node.kind() {
        Kind::Null => TAG_NULL,
        Kind::Int(_) => TAG_INT,
        Kind::Dec(_) => TAG_DEC,
        Kind::Bool(_) => TAG_BOOL,
        Kind::String(_) => TAG_STRING,
        Kind::Vec1(_) => TAG_VEC1,
        Kind::Vec2(_) => TAG_VEC2,
        Kind::Vec3(_) => TAG_VEC3,
        Kind::Vec4(_) => TAG_VEC4,
        Kind::Array(_) => TAG_ARRAY,
        Kind::Node(_) => TAG_NODE,
    };
    let mut tag_byte = tag;
    ser.arithmetic(&mut tag_byte);

    let mut name = node.name().unwrap_or("").to_string();
    SerString::<u32>::apply(ser, &mut name, None);

    match node.kind() {
        Kind::Null => {}
        Kind::Int(v) => {
            let mut v = *v;
            ser.arithmetic(&mut v);
        }
        Kind::Dec(v) => {
            let mut v = *v;
            ser.arithmetic(&mut v);
        }
        Kind::Bool(v) => {
            let mut v = *v;
            ser.arithmetic(&mut v);
        }
        Kind::String(s) => {
            let mut s = s.clone();
            SerString::<u32>::apply(ser, &mut s, None);
        }
        Kind::Vec1(v) => write_floats(ser, v),
        Kind::Vec2(v) => write_floats(ser, v),
        Kind::Vec3(v) => write_floats(ser, v),
        Kind::Vec4(v) => write_floats(ser, v),
        Kind::Array(items) | Kind::Node(items) => write_children(ser, items),
    }
}

fn write_floats(ser: &mut Serializer<'_>, values: &[f32]) {
    for &v in values {
        let mut v = v;
        ser.arithmetic(&mut v);
    }
}

fn read_node(ser: &mut Serializer<'_>) -> Kvs {
    let mut tag = 0u8;
    ser.arithmetic(&mut tag);

    let mut name = String::new();
    SerString::<u32>::apply(ser, &mut name, None);
    let name = if name.is_empty() { None } else { Some(name) };

    let value = match tag {
        TAG_NULL => Kind::Null,
        TAG_INT => {
            let mut v = 0i64;
            ser.arithmetic(&mut v);
            Kind::Int(v)
        }
        TAG_DEC => {
            let mut v = 0f64;
            ser.arithmetic(&mut v);
            Kind::Dec(v)
        }
        TAG_BOOL => {
            let mut v = false;
            ser.arithmetic(&mut v);
            Kind::Bool(v)
        }
        TAG_STRING => {
            let mut s = String::new();
            SerString::<u32>::apply(ser, &mut s, None);
            Kind::String(s)
        }
        TAG_VEC1 => Kind::Vec1(read_floats::<1>(ser)),
        TAG_VEC2 => Kind::Vec2(read_floats::<2>(ser)),
        TAG_VEC3 => Kind::Vec3(read_floats::<3>(ser)),
        TAG_VEC4 => Kind::Vec4(read_floats::<4>(ser)),
        TAG_ARRAY => Kind::Array(read_children(ser)),
        TAG_NODE => Kind::Node(read_children(ser)),
        other => panic!("togo-kvs: unknown binary tag byte {other}"),
    };

    match name {
        Some(name) => Kvs::named(name, value),
        None => Kvs::unnamed(value),
    }
}

fn read_floats<const N: usize>(ser: &mut Serializer<'_>) -> [f32; N] {
    let mut out = [0f32; N];
    for slot in &mut out {
        ser.arithmetic(slot);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    fn round_trip(src: &str) -> (Kvs, Kvs) {
        let parsed = parse(src).unwrap();
        let mut w = MemoryWriterStream::new();
        write(&parsed, &mut w);
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        (parsed, decoded)
    }

    #[test]
    fn round_trips_all_value_kinds() {
        let (parsed, decoded) = round_trip(
            "a = 1\nb = 2.5\nc = true\nd = null\ne = hello\nf = (1 2)\ng = [ 1 2 ]\nh = { i = 3 }\n",
        );
        assert_eq!(parsed, decoded);
    }

    #[test]
    fn rejects_wrong_version_header() {
        let mut w = MemoryWriterStream::new();
        let mut ser = Serializer::writer(&mut w, Endian::default_target());
        let mut version = 2u32;
        ser.arithmetic(&mut version);
        drop(ser);
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        assert!(matches!(read(&mut r), Err(Error::UnsupportedVersion(2))));
    }
}
