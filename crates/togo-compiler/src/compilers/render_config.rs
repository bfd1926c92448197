//! The render-config compiler (spec §4.7): the most intricate of the
//! built-in compilers. Reads `shared_resources` / `pipes` / `viewports`
//! from a KVS document and writes the packed binary render config, with
//! each pipe layer's generator units dispatched through a
//! [`GeneratorCompiler`] registry keyed by 32-bit generator-name hash.

use std::collections::HashMap;

use togo_core::hash;
use togo_kvs::Kvs;
use togo_resource::ResourceType;
use togo_serialize::{Endian, SerCollection, SerString, Serializer};
use togo_stream::{MemoryWriterStream, Reader, Writer};

use crate::manager::{CompilerContext, ResourceCompiler};

pub const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: u32 = 7 * 4;

/// A generator's compile-time half: turns a unit's KVS into a
/// self-describing blob. The runtime half (not implemented here) interprets
/// the same blob by generator-name hash.
pub trait GeneratorCompiler {
    fn name(&self) -> &str;
    /// Writes the unit's blob body. Returns `false` on a malformed unit.
    fn compile(&self, unit: &Kvs, out: &mut Vec<u8>) -> bool;
}

pub struct ClearGenerator;

impl GeneratorCompiler for ClearGenerator {
    fn name(&self) -> &str {
        "clear"
    }

    fn compile(&self, unit: &Kvs, out: &mut Vec<u8>) -> bool {
        let Some(target) = unit.get_str("target") else {
            return false;
        };
        out.extend_from_slice(&hash::calc32(target.as_bytes()).to_le_bytes());
        true
    }
}

pub struct FullscreenPassGenerator;

impl GeneratorCompiler for FullscreenPassGenerator {
    fn name(&self) -> &str {
        "fullscreen_pass"
    }

    fn compile(&self, unit: &Kvs, out: &mut Vec<u8>) -> bool {
        let (Some(shader), Some(input), Some(output)) =
            (unit.get_str("shader"), unit.get_str("input"), unit.get_str("output"))
        else {
            return false;
        };
        let double_buffered = unit.get_bool("double_buffered").unwrap_or(false);
        if input == output && !double_buffered {
            tracing::warn!(input, output, "fullscreen_pass aliases input and output without double buffering");
            return false;
        }
        out.extend_from_slice(&hash::calc32(shader.as_bytes()).to_le_bytes());
        out.extend_from_slice(&hash::calc32(input.as_bytes()).to_le_bytes());
        out.extend_from_slice(&hash::calc32(output.as_bytes()).to_le_bytes());
        true
    }
}

pub struct WorldGenerator;

impl GeneratorCompiler for WorldGenerator {
    fn name(&self) -> &str {
        "world"
    }

    fn compile(&self, unit: &Kvs, out: &mut Vec<u8>) -> bool {
        let Some(camera) = unit.get_str("camera") else {
            return false;
        };
        let material = unit.get_str("material").unwrap_or("default");
        out.extend_from_slice(&hash::calc32(camera.as_bytes()).to_le_bytes());
        out.extend_from_slice(&hash::calc32(material.as_bytes()).to_le_bytes());
        true
    }
}

/// Registry of `generator_name_hash → GeneratorCompiler`, the compile-side
/// counterpart of the runtime's generator registry.
pub struct GeneratorRegistry {
    generators: HashMap<u32, Box<dyn GeneratorCompiler>>,
}

impl GeneratorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { generators: HashMap::new() }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ClearGenerator));
        registry.register(Box::new(FullscreenPassGenerator));
        registry.register(Box::new(WorldGenerator));
        registry
    }

    pub fn register(&mut self, generator: Box<dyn GeneratorCompiler>) {
        let key = hash::calc32(generator.name().as_bytes());
        tracing::debug!(generator = generator.name(), "registered render generator");
        self.generators.insert(key, generator);
    }

    #[must_use]
    pub fn get(&self, name_hash: u32) -> Option<&dyn GeneratorCompiler> {
        self.generators.get(&name_hash).map(std::convert::AsRef::as_ref)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn shared_resource_kind(kind: &str) -> Option<u8> {
    match kind {
        "render_target" => Some(0),
        "depth_stencil" => Some(1),
        _ => None,
    }
}

fn compile_shared_resources(kvs: &Kvs) -> Option<Vec<u8>> {
    let mut buf = MemoryWriterStream::new();
    let mut ser = Serializer::writer(&mut buf, Endian::default_target());

    let entries = kvs.get("shared_resources").and_then(Kvs::children).unwrap_or(&[]);
    let mut count = entries.len() as u32;
    ser.arithmetic(&mut count);
    for entry in entries {
        let name = entry.get_str("name")?;
        let kind = shared_resource_kind(entry.get_str("kind")?)?;
        let format = entry.get_str("format").unwrap_or("");
        let flags = entry.get_i64_or("flags", 0) as u32;

        let mut name_hash = hash::calc32(name.as_bytes());
        ser.arithmetic(&mut name_hash);
        let mut kind = kind;
        ser.arithmetic(&mut kind);
        let mut format_hash = hash::calc32(format.as_bytes());
        ser.arithmetic(&mut format_hash);
        let mut flags = flags;
        ser.arithmetic(&mut flags);
    }
    Some(buf.into_inner())
}

fn compile_layer(layer: &Kvs, generators: &GeneratorRegistry) -> Option<Vec<u8>> {
    let mut buf = MemoryWriterStream::new();
    let mut ser = Serializer::writer(&mut buf, Endian::default_target());

    let units = layer.get("seq").and_then(Kvs::children).unwrap_or(&[]);
    let mut count = units.len() as u32;
    ser.arithmetic(&mut count);
    for unit in units {
        let generator_name = unit.get_str("generator")?;
        let generator_hash = hash::calc32(generator_name.as_bytes());
        let generator = generators.get(generator_hash)?;

        let mut blob = Vec::new();
        if !generator.compile(unit, &mut blob) {
            return None;
        }

        let mut key = generator_hash;
        ser.arithmetic(&mut key);
        let mut len = blob.len() as u32;
        ser.arithmetic(&mut len);
        let mut bytes = blob;
        ser.buffer(&mut bytes, bytes.len());
    }
    Some(buf.into_inner())
}

fn compile_pipes(kvs: &Kvs, generators: &GeneratorRegistry) -> Option<Vec<u8>> {
    let mut buf = MemoryWriterStream::new();
    let mut ser = Serializer::writer(&mut buf, Endian::default_target());

    let pipes = kvs.get("pipes").and_then(Kvs::children).unwrap_or(&[]);
    let mut pipe_count = pipes.len() as u32;
    ser.arithmetic(&mut pipe_count);
    for pipe in pipes {
        let mut name = pipe.get_str("name")?.to_string();
        SerString::<u32>::apply(&mut ser, &mut name, None);

        let layers = pipe.get("layers").and_then(Kvs::children).unwrap_or(&[]);
        let mut layer_count = layers.len() as u32;
        ser.arithmetic(&mut layer_count);
        for layer in layers {
            let mut layer_name = layer.get_str("name")?.to_string();
            SerString::<u32>::apply(&mut ser, &mut layer_name, None);
            let layer_bytes = compile_layer(layer, generators)?;
            let mut layer_items = layer_bytes;
            SerCollection::<u32, u8>::apply(&mut ser, &mut layer_items, usize::MAX);
        }
    }
    Some(buf.into_inner())
}

fn compile_viewports(kvs: &Kvs, pipe_names: &[String]) -> Option<Vec<u8>> {
    let mut buf = MemoryWriterStream::new();
    let mut ser = Serializer::writer(&mut buf, Endian::default_target());

    let viewports = kvs.get("viewports").and_then(Kvs::children).unwrap_or(&[]);
    let mut count = viewports.len() as u32;
    ser.arithmetic(&mut count);
    for viewport in viewports {
        let name = viewport.get_str("name")?;
        let pipe_name = viewport.get_str("pipe")?;
        let output = viewport.get_str("output").unwrap_or("");
        let pipe_id = pipe_names.iter().position(|p| p == pipe_name)? as u32;

        let mut name_hash = hash::calc32(name.as_bytes());
        ser.arithmetic(&mut name_hash);
        let mut pipe_id = pipe_id;
        ser.arithmetic(&mut pipe_id);
        let mut output_hash = hash::calc32(output.as_bytes());
        ser.arithmetic(&mut output_hash);
    }
    Some(buf.into_inner())
}

pub struct RenderConfigCompiler {
    generators: GeneratorRegistry,
}

impl RenderConfigCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self { generators: GeneratorRegistry::with_builtins() }
    }

    #[must_use]
    pub fn with_generators(generators: GeneratorRegistry) -> Self {
        Self { generators }
    }
}

impl Default for RenderConfigCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCompiler for RenderConfigCompiler {
    fn resource_type(&self) -> ResourceType {
        ResourceType::of("render_config")
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn compile(&self, _ctx: &CompilerContext<'_>, in_reader: &mut dyn Reader, out_writer: &mut dyn Writer) -> bool {
        let mut text = String::new();
        let mut buf = [0u8; 4096];
        loop {
            let (n, status) = in_reader.read(&mut buf);
            if n > 0 {
                text.push_str(&String::from_utf8_lossy(&buf[..n]));
            }
            if status.is_fail() {
                return false;
            }
            if status.is_eof() || n == 0 {
                break;
            }
        }
        let Ok(root) = togo_kvs::parse(&text) else {
            return false;
        };

        let Some(shared_bytes) = compile_shared_resources(&root) else {
            return false;
        };
        let Some(pipe_bytes) = compile_pipes(&root, &self.generators) else {
            return false;
        };
        let pipe_names: Vec<String> = root
            .get("pipes")
            .and_then(Kvs::children)
            .unwrap_or(&[])
            .iter()
            .filter_map(|p| p.get_str("name").map(str::to_string))
            .collect();
        let Some(viewport_bytes) = compile_viewports(&root, &pipe_names) else {
            return false;
        };

        let shared_count = root.get("shared_resources").and_then(Kvs::children).map_or(0, <[Kvs]>::len) as u32;
        let pipe_count = pipe_names.len() as u32;
        let viewport_count = root.get("viewports").and_then(Kvs::children).map_or(0, <[Kvs]>::len) as u32;

        let shared_offset = HEADER_SIZE;
        let pipe_offset = shared_offset + shared_bytes.len() as u32;
        let viewport_offset = pipe_offset + pipe_bytes.len() as u32;

        let mut ser = Serializer::writer(out_writer, Endian::default_target());
        let mut version = FORMAT_VERSION;
        ser.arithmetic(&mut version);
        let mut v = shared_count;
        ser.arithmetic(&mut v);
        let mut v = shared_offset;
        ser.arithmetic(&mut v);
        let mut v = pipe_count;
        ser.arithmetic(&mut v);
        let mut v = pipe_offset;
        ser.arithmetic(&mut v);
        let mut v = viewport_count;
        ser.arithmetic(&mut v);
        let mut v = viewport_offset;
        ser.arithmetic(&mut v);

        let mut shared_bytes = shared_bytes;
        ser.buffer(&mut shared_bytes, shared_bytes.len());
        let mut pipe_bytes = pipe_bytes;
        ser.buffer(&mut pipe_bytes, pipe_bytes.len());
        let mut viewport_bytes = viewport_bytes;
        ser.buffer(&mut viewport_bytes, viewport_bytes.len());

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    const CONFIG: &str = r#"
shared_resources = [
    { name = backbuffer kind = render_target format = rgba8 flags = 0 }
]
pipes = [
    {
        name = main
        layers = [
            {
                name = opaque
                seq = [
                    { name = clear_pass generator = clear target = backbuffer }
                    { name = world_pass generator = world camera = main_camera }
                ]
            }
        ]
    }
]
viewports = [
    { name = primary pipe = main output = backbuffer }
]
"#;

    #[test]
    fn compiles_a_minimal_render_config() {
        let compiler = RenderConfigCompiler::new();
        let mut in_stream = MemoryReader::new(CONFIG.as_bytes());
        let mut out_stream = MemoryWriterStream::new();
        let ctx = CompilerContext {
            package_name: "test",
            name_hash: 0,
            manifest_id: 0,
        };
        assert!(compiler.compile(&ctx, &mut in_stream, &mut out_stream));

        let bytes = out_stream.into_inner();
        assert!(bytes.len() > HEADER_SIZE as usize);
        let mut reader = MemoryReader::new(&bytes);
        let mut ser = Serializer::reader(&mut reader, Endian::default_target());
        let mut version = 0u32;
        ser.arithmetic(&mut version);
        assert_eq!(version, FORMAT_VERSION);
        let mut shared_count = 0u32;
        ser.arithmetic(&mut shared_count);
        assert_eq!(shared_count, 1);
    }

    #[test]
    fn unknown_generator_name_aborts_compilation() {
        let source = r#"
pipes = [
    { name = main layers = [ { name = l seq = [ { name = u generator = nonexistent } ] } ] }
]
"#;
        let compiler = RenderConfigCompiler::new();
        let mut in_stream = MemoryReader::new(source.as_bytes());
        let mut out_stream = MemoryWriterStream::new();
        let ctx = CompilerContext {
            package_name: "test",
            name_hash: 0,
            manifest_id: 0,
        };
        assert!(!compiler.compile(&ctx, &mut in_stream, &mut out_stream));
    }

    #[test]
    fn fullscreen_pass_rejects_aliased_input_output_without_double_buffering() {
        let generator = FullscreenPassGenerator;
        let kvs = togo_kvs::parse("shader = s input = rt output = rt").unwrap();
        let mut out = Vec::new();
        assert!(!generator.compile(&kvs, &mut out));
    }
}
