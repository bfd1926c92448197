//! The runtime-side reader for the packed render config written by the
//! offline `render_config` compiler (spec §4.7): a 7-`u32` header followed
//! by three contiguous sections (shared resources, pipes, viewports). The
//! writer lays the sections out back to back with no gaps, so reading is
//! purely sequential; the recorded offsets are only cross-checked as a
//! format sanity assertion, never seeked to.

use togo_serialize::{Endian, SerCollection, SerString, Serializer};
use togo_stream::Reader;

use crate::error::{Error, Result};

pub const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: u32 = 7 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedResourceKind {
    RenderTarget,
    DepthStencil,
}

impl SharedResourceKind {
    fn from_wire(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::RenderTarget),
            1 => Some(Self::DepthStencil),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SharedResource {
    pub name_hash: u32,
    pub kind: SharedResourceKind,
    pub format_hash: u32,
    pub flags: u32,
}

/// One generator unit's self-describing blob, still opaque at this layer;
/// [`crate::generator::GeneratorRegistry`] interprets it by `generator_hash`.
#[derive(Debug, Clone)]
pub struct GeneratorUnit {
    pub generator_hash: u32,
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub units: Vec<GeneratorUnit>,
}

#[derive(Debug, Clone)]
pub struct Pipe {
    pub name: String,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    pub name_hash: u32,
    pub pipe_id: u32,
    pub output_hash: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub shared_resources: Vec<SharedResource>,
    pub pipes: Vec<Pipe>,
    pub viewports: Vec<Viewport>,
}

fn read_shared_resources(ser: &mut Serializer<'_>, count: u32) -> Result<Vec<SharedResource>> {
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut name_hash = 0u32;
        ser.arithmetic(&mut name_hash);
        let mut kind_wire = 0u8;
        ser.arithmetic(&mut kind_wire);
        let kind = SharedResourceKind::from_wire(kind_wire).ok_or(Error::UnknownSharedResourceKind(kind_wire))?;
        let mut format_hash = 0u32;
        ser.arithmetic(&mut format_hash);
        let mut flags = 0u32;
        ser.arithmetic(&mut flags);
        out.push(SharedResource { name_hash, kind, format_hash, flags });
    }
    Ok(out)
}

fn read_layer(ser: &mut Serializer<'_>) -> Layer {
    let mut name = String::new();
    SerString::<u32>::apply(ser, &mut name, None);
    let mut layer_items = Vec::new();
    SerCollection::<u32, u8>::apply(ser, &mut layer_items, usize::MAX);

    // `layer_items` is itself a self-contained encoding (unit count, then
    // generator_hash/len/bytes per unit); re-wrap it as a memory reader.
    let mut reader = togo_stream::MemoryReader::new(&layer_items);
    let mut inner = Serializer::reader(&mut reader, ser.endian());
    let mut unit_count = 0u32;
    inner.arithmetic(&mut unit_count);
    let mut units = Vec::with_capacity(unit_count as usize);
    for _ in 0..unit_count {
        let mut generator_hash = 0u32;
        inner.arithmetic(&mut generator_hash);
        let mut len = 0u32;
        inner.arithmetic(&mut len);
        let mut blob = Vec::new();
        inner.buffer(&mut blob, len as usize);
        units.push(GeneratorUnit { generator_hash, blob });
    }
    Layer { name, units }
}

fn read_pipes(ser: &mut Serializer<'_>) -> Vec<Pipe> {
    let mut pipe_count = 0u32;
    ser.arithmetic(&mut pipe_count);
    let mut pipes = Vec::with_capacity(pipe_count as usize);
    for _ in 0..pipe_count {
        let mut name = String::new();
        SerString::<u32>::apply(ser, &mut name, None);
        let mut layer_count = 0u32;
        ser.arithmetic(&mut layer_count);
        let layers = (0..layer_count).map(|_| read_layer(ser)).collect();
        pipes.push(Pipe { name, layers });
    }
    pipes
}

fn read_viewports(ser: &mut Serializer<'_>, count: u32) -> Vec<Viewport> {
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut name_hash = 0u32;
        ser.arithmetic(&mut name_hash);
        let mut pipe_id = 0u32;
        ser.arithmetic(&mut pipe_id);
        let mut output_hash = 0u32;
        ser.arithmetic(&mut output_hash);
        out.push(Viewport { name_hash, pipe_id, output_hash });
    }
    out
}

impl RenderConfig {
    /// # Errors
    /// Returns an error if the format version is unrecognised, a shared
    /// resource carries an unknown kind byte, or a recorded section offset
    /// disagrees with the contiguous layout the writer actually produced.
    pub fn read(reader: &mut dyn Reader) -> Result<Self> {
        let mut ser = Serializer::reader(reader, Endian::default_target());

        let mut version = 0u32;
        ser.arithmetic(&mut version);
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedConfigVersion(version));
        }
        let mut shared_count = 0u32;
        ser.arithmetic(&mut shared_count);
        let mut shared_offset = 0u32;
        ser.arithmetic(&mut shared_offset);
        let mut pipe_count = 0u32;
        ser.arithmetic(&mut pipe_count);
        let mut _pipe_offset = 0u32;
        ser.arithmetic(&mut _pipe_offset);
        let mut viewport_count = 0u32;
        ser.arithmetic(&mut viewport_count);
        let mut _viewport_offset = 0u32;
        ser.arithmetic(&mut _viewport_offset);

        if shared_offset != HEADER_SIZE {
            return Err(Error::OffsetMismatch { expected: HEADER_SIZE, found: shared_offset });
        }

        let shared_resources = read_shared_resources(&mut ser, shared_count)?;
        let pipes = read_pipes(&mut ser);
        if pipes.len() as u32 != pipe_count {
            return Err(Error::OffsetMismatch { expected: pipe_count, found: pipes.len() as u32 });
        }
        let viewports = read_viewports(&mut ser, viewport_count);

        Ok(Self { shared_resources, pipes, viewports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::{MemoryReader, MemoryWriterStream, Writer};

    /// Builds the same bytes the offline compiler's `RenderConfigCompiler`
    /// would, for one shared resource, one pipe/layer/unit, one viewport.
    fn build_minimal_config() -> Vec<u8> {
        let mut shared = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut shared, Endian::default_target());
            let mut count = 1u32;
            ser.arithmetic(&mut count);
            let mut name_hash = 11u32;
            ser.arithmetic(&mut name_hash);
            let mut kind = 0u8;
            ser.arithmetic(&mut kind);
            let mut format_hash = 22u32;
            ser.arithmetic(&mut format_hash);
            let mut flags = 0u32;
            ser.arithmetic(&mut flags);
        }
        let shared_bytes = shared.into_inner();

        let mut layer_inner = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut layer_inner, Endian::default_target());
            let mut unit_count = 1u32;
            ser.arithmetic(&mut unit_count);
            let mut generator_hash = togo_core::hash::calc32(b"clear");
            ser.arithmetic(&mut generator_hash);
            let mut len = 4u32;
            ser.arithmetic(&mut len);
            let mut bytes = 11u32.to_le_bytes().to_vec();
            ser.buffer(&mut bytes, 4);
        }
        let layer_items = layer_inner.into_inner();

        let mut pipes = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut pipes, Endian::default_target());
            let mut pipe_count = 1u32;
            ser.arithmetic(&mut pipe_count);
            let mut name = "main".to_string();
            SerString::<u32>::apply(&mut ser, &mut name, None);
            let mut layer_count = 1u32;
            ser.arithmetic(&mut layer_count);
            let mut layer_name = "opaque".to_string();
            SerString::<u32>::apply(&mut ser, &mut layer_name, None);
            let mut items = layer_items;
            SerCollection::<u32, u8>::apply(&mut ser, &mut items, usize::MAX);
        }
        let pipe_bytes = pipes.into_inner();

        let mut viewports = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut viewports, Endian::default_target());
            let mut count = 1u32;
            ser.arithmetic(&mut count);
            let mut name_hash = 33u32;
            ser.arithmetic(&mut name_hash);
            let mut pipe_id = 0u32;
            ser.arithmetic(&mut pipe_id);
            let mut output_hash = 11u32;
            ser.arithmetic(&mut output_hash);
        }
        let viewport_bytes = viewports.into_inner();

        let shared_offset = HEADER_SIZE;
        let pipe_offset = shared_offset + shared_bytes.len() as u32;
        let viewport_offset = pipe_offset + pipe_bytes.len() as u32;

        let mut out = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut out, Endian::default_target());
            let mut v = FORMAT_VERSION;
            ser.arithmetic(&mut v);
            let mut v = 1u32;
            ser.arithmetic(&mut v);
            let mut v = shared_offset;
            ser.arithmetic(&mut v);
            let mut v = 1u32;
            ser.arithmetic(&mut v);
            let mut v = pipe_offset;
            ser.arithmetic(&mut v);
            let mut v = 1u32;
            ser.arithmetic(&mut v);
            let mut v = viewport_offset;
            ser.arithmetic(&mut v);
        }
        out.write(&shared_bytes);
        out.write(&pipe_bytes);
        out.write(&viewport_bytes);
        out.into_inner()
    }

    #[test]
    fn reads_a_minimal_render_config() {
        let bytes = build_minimal_config();
        let mut reader = MemoryReader::new(&bytes);
        let config = RenderConfig::read(&mut reader).unwrap();

        assert_eq!(config.shared_resources.len(), 1);
        assert_eq!(config.shared_resources[0].kind, SharedResourceKind::RenderTarget);
        assert_eq!(config.pipes.len(), 1);
        assert_eq!(config.pipes[0].layers[0].units[0].generator_hash, togo_core::hash::calc32(b"clear"));
        assert_eq!(config.viewports.len(), 1);
        assert_eq!(config.viewports[0].output_hash, 11);
    }

    #[test]
    fn rejects_an_unsupported_format_version() {
        let mut out = MemoryWriterStream::new();
        {
            let mut ser = Serializer::writer(&mut out, Endian::default_target());
            let mut v = 99u32;
            ser.arithmetic(&mut v);
        }
        let bytes = out.into_inner();
        let mut reader = MemoryReader::new(&bytes);
        assert!(matches!(RenderConfig::read(&mut reader), Err(Error::UnsupportedConfigVersion(99))));
    }
}
