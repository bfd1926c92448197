//! Shader prelude and shader (unit) compilers: both read a `ShaderDef` KVS
//! and write the same binary layout; the unit compiler additionally
//! validates that every `prelude[]` entry is a plausible name and marks the
//! record linkable.

use togo_resource::ResourceType;
use togo_serialize::{Endian, SerString, Serializer};
use togo_stream::{MemoryReader, Reader, Writer};

use crate::manager::{CompilerContext, ResourceCompiler};

pub const SHADER_DEF_FORMAT_VERSION: u32 = 1;

/// A single `name = index` param-block declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBlockDecl {
    pub name: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDef {
    pub sources: Vec<String>,
    pub prelude: Vec<String>,
    pub param_blocks: Vec<ParamBlockDecl>,
    pub unit: bool,
}

fn parse_shader_def(kvs: &togo_kvs::Kvs) -> Option<ShaderDef> {
    let sources = kvs
        .get("sources")?
        .children()?
        .iter()
        .filter_map(togo_kvs::Kvs::as_str)
        .map(str::to_string)
        .collect();
    let prelude = kvs
        .get("prelude")
        .and_then(togo_kvs::Kvs::children)
        .map(|c| c.iter().filter_map(togo_kvs::Kvs::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let param_blocks = kvs
        .get("param_blocks")
        .and_then(togo_kvs::Kvs::children)
        .map(|children| {
            children
                .iter()
                .enumerate()
                .filter_map(|(i, c)| {
                    c.as_str().map(|name| ParamBlockDecl {
                        name: name.to_string(),
                        index: i as u32,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ShaderDef {
        sources,
        prelude,
        param_blocks,
        unit: false,
    })
}

pub fn write_binary(def: &ShaderDef, writer: &mut dyn Writer) {
    let mut ser = Serializer::writer(writer, Endian::default_target());
    let mut version = SHADER_DEF_FORMAT_VERSION;
    ser.arithmetic(&mut version);
    let mut unit = def.unit;
    ser.arithmetic(&mut unit);

    let mut count = def.sources.len() as u32;
    ser.arithmetic(&mut count);
    for source in &def.sources {
        let mut s = source.clone();
        SerString::<u32>::apply(&mut ser, &mut s, None);
    }

    let mut count = def.prelude.len() as u32;
    ser.arithmetic(&mut count);
    for prelude in &def.prelude {
        let mut s = prelude.clone();
        SerString::<u32>::apply(&mut ser, &mut s, None);
    }

    let mut count = def.param_blocks.len() as u32;
    ser.arithmetic(&mut count);
    for block in &def.param_blocks {
        let mut name = block.name.clone();
        SerString::<u32>::apply(&mut ser, &mut name, None);
        let mut index = block.index;
        ser.arithmetic(&mut index);
    }
}

#[must_use]
pub fn read_binary(reader: &mut dyn Reader) -> ShaderDef {
    let mut ser = Serializer::reader(reader, Endian::default_target());
    let mut version = 0u32;
    ser.arithmetic(&mut version);
    assert_eq!(version, SHADER_DEF_FORMAT_VERSION, "unsupported ShaderDef format version");
    let mut unit = false;
    ser.arithmetic(&mut unit);

    let mut source_count = 0u32;
    ser.arithmetic(&mut source_count);
    let sources = (0..source_count)
        .map(|_| {
            let mut s = String::new();
            SerString::<u32>::apply(&mut ser, &mut s, None);
            s
        })
        .collect();

    let mut prelude_count = 0u32;
    ser.arithmetic(&mut prelude_count);
    let prelude = (0..prelude_count)
        .map(|_| {
            let mut s = String::new();
            SerString::<u32>::apply(&mut ser, &mut s, None);
            s
        })
        .collect();

    let mut block_count = 0u32;
    ser.arithmetic(&mut block_count);
    let param_blocks = (0..block_count)
        .map(|_| {
            let mut name = String::new();
            SerString::<u32>::apply(&mut ser, &mut name, None);
            let mut index = 0u32;
            ser.arithmetic(&mut index);
            ParamBlockDecl { name, index }
        })
        .collect();

    ShaderDef {
        sources,
        prelude,
        param_blocks,
        unit,
    }
}

fn read_kvs_source(reader: &mut dyn Reader) -> Option<togo_kvs::Kvs> {
    let mut text = String::new();
    let mut buf = [0u8; 4096];
    loop {
        let (n, status) = reader.read(&mut buf);
        if n > 0 {
            text.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
        if status.is_fail() {
            return None;
        }
        if status.is_eof() || n == 0 {
            break;
        }
    }
    togo_kvs::parse(&text).ok()
}

pub struct ShaderPreludeCompiler;

impl ResourceCompiler for ShaderPreludeCompiler {
    fn resource_type(&self) -> ResourceType {
        ResourceType::of("shader_prelude")
    }

    fn format_version(&self) -> u32 {
        SHADER_DEF_FORMAT_VERSION
    }

    fn compile(&self, _ctx: &CompilerContext<'_>, in_reader: &mut dyn Reader, out_writer: &mut dyn Writer) -> bool {
        let Some(root) = read_kvs_source(in_reader) else {
            return false;
        };
        let Some(def) = parse_shader_def(&root) else {
            return false;
        };
        write_binary(&def, out_writer);
        true
    }
}

pub struct ShaderCompiler;

impl ResourceCompiler for ShaderCompiler {
    fn resource_type(&self) -> ResourceType {
        ResourceType::of("shader")
    }

    fn format_version(&self) -> u32 {
        SHADER_DEF_FORMAT_VERSION
    }

    fn compile(&self, _ctx: &CompilerContext<'_>, in_reader: &mut dyn Reader, out_writer: &mut dyn Writer) -> bool {
        let Some(root) = read_kvs_source(in_reader) else {
            return false;
        };
        let Some(mut def) = parse_shader_def(&root) else {
            return false;
        };
        if def.prelude.iter().any(|name| name.trim().is_empty()) {
            tracing::warn!("shader unit references an empty prelude name");
            return false;
        }
        def.unit = true;
        write_binary(&def, out_writer);
        true
    }
}
