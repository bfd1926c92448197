//! Runtime-side `ShaderDef` reading and shader merging (spec §4.9 "Shader
//! merging"). The binary layout mirrors the offline shader compiler's
//! exactly (`togo_compiler::compilers::shader`); it is re-read here rather
//! than imported, the same online/offline split already drawn between
//! [`togo_resource::Archive`] and [`togo_runtime::ResourcePackage`].

use std::collections::HashSet;

use togo_serialize::{Endian, SerString, Serializer};
use togo_stream::Reader;

use crate::error::{Error, Result};

pub const SHADER_DEF_FORMAT_VERSION: u32 = 1;

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

    ShaderDef { sources, prelude, param_blocks, unit }
}

/// The result of merging a unit's `ShaderDef` with its transitive prelude
/// closure: concatenated sources, unioned fixed param blocks (contributed
/// by preludes), and the unit's own param blocks renumbered 0..k-1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedShader {
    pub sources: Vec<String>,
    pub fixed_param_blocks: Vec<ParamBlockDecl>,
    pub draw_param_blocks: Vec<ParamBlockDecl>,
}

/// Depth-first, de-duplicated-by-name collection of `unit`'s transitive
/// `prelude[]` dependencies, in dependency order (a prelude's own
/// dependencies are visited before the prelude itself).
fn resolve_prelude_closure<'a>(
    prelude_name: &str,
    preludes: &'a std::collections::HashMap<String, ShaderDef>,
    visited: &mut HashSet<String>,
    order: &mut Vec<&'a str>,
) -> Result<()> {
    if visited.contains(prelude_name) {
        return Ok(());
    }
    visited.insert(prelude_name.to_string());
    let def = preludes.get(prelude_name).ok_or_else(|| Error::PreludeNotFound(prelude_name.to_string()))?;
    for dep in &def.prelude {
        resolve_prelude_closure(dep, preludes, visited, order)?;
    }
    order.push(prelude_name);
    Ok(())
}

/// Unions `contributed`'s blocks (all attributed to `prelude_name`) into
/// `into`, which additionally records which prelude contributed each block
/// so a conflict can name both of them.
fn union_param_blocks(
    into: &mut Vec<(String, ParamBlockDecl)>,
    prelude_name: &str,
    contributed: &[ParamBlockDecl],
) -> Result<()> {
    for block in contributed {
        if let Some((origin, existing)) = into.iter().find(|(_, b)| b.name == block.name) {
            if existing.index != block.index {
                return Err(Error::ParamBlockConflict {
                    name: block.name.clone(),
                    prelude_a: origin.clone(),
                    index_a: existing.index,
                    prelude_b: prelude_name.to_string(),
                    index_b: block.index,
                });
            }
            continue;
        }
        if let Some((origin, existing)) = into.iter().find(|(_, b)| b.index == block.index) {
            return Err(Error::ParamBlockIndexConflict {
                index: block.index,
                prelude_a: origin.clone(),
                name_a: existing.name.clone(),
                prelude_b: prelude_name.to_string(),
                name_b: block.name.clone(),
            });
        }
        into.push((prelude_name.to_string(), block.clone()));
    }
    Ok(())
}

/// Merges `unit` against its transitive prelude closure. `preludes` maps a
/// prelude name to its parsed `ShaderDef` (including the shared
/// `shader_config` prelude, if the caller includes one under that name).
///
/// # Errors
/// [`Error::PreludeNotFound`] if `unit.prelude` names an unregistered
/// prelude; [`Error::ParamBlockConflict`]/[`Error::ParamBlockIndexConflict`]
/// if two contributors disagree on a fixed param block's index or a shared
/// index's name.
pub fn merge(unit: &ShaderDef, preludes: &std::collections::HashMap<String, ShaderDef>) -> Result<MergedShader> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    for dep in &unit.prelude {
        resolve_prelude_closure(dep, preludes, &mut visited, &mut order)?;
    }

    let mut sources = Vec::new();
    let mut fixed_param_blocks: Vec<(String, ParamBlockDecl)> = Vec::new();

    if let Some(shared) = preludes.get("shader_config") {
        sources.extend(shared.sources.iter().cloned());
        union_param_blocks(&mut fixed_param_blocks, "shader_config", &shared.param_blocks)?;
    }
    for prelude_name in order {
        let def = &preludes[prelude_name];
        sources.extend(def.sources.iter().cloned());
        union_param_blocks(&mut fixed_param_blocks, prelude_name, &def.param_blocks)?;
    }
    sources.extend(unit.sources.iter().cloned());

    let draw_param_blocks = unit
        .param_blocks
        .iter()
        .enumerate()
        .map(|(i, block)| ParamBlockDecl { name: block.name.clone(), index: i as u32 })
        .collect();

    Ok(MergedShader {
        sources,
        fixed_param_blocks: fixed_param_blocks.into_iter().map(|(_, block)| block).collect(),
        draw_param_blocks,
    })
}
