//! The runtime half of the generator family (spec §4.9): turns a pipe
//! layer's self-describing unit blobs (produced by the offline
//! `render_config` compiler, see [`crate::config::GeneratorUnit`]) into
//! `Cmd`s pushed onto a [`RenderNode`]. Registered by 32-bit
//! generator-name hash, the same keying the compile-side
//! `GeneratorRegistry` uses.

use std::collections::HashMap;

use crate::cmd::{Cmd, RenderNode};
use crate::error::{Error, Result};
use crate::handles::{RenderTargetKey, ShaderKey};

/// Resolves the name hashes a compiled unit blob carries into live handles.
/// The renderer implements this over its own name-hash indices.
pub trait Resolver {
    fn render_target(&self, name_hash: u32) -> Option<RenderTargetKey>;
    fn shader(&self, name_hash: u32) -> Option<ShaderKey>;
}

fn read_u32(blob: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(blob[offset..offset + 4].try_into().expect("blob too short"))
}

/// A unit generator's runtime half. `exec` pushes whatever `Cmd`s the
/// unit's blob produces onto `node` under `user_key`.
pub trait Generator {
    fn name(&self) -> &str;
    fn exec(&self, blob: &[u8], resolver: &dyn Resolver, node: &mut RenderNode, user_key: u16) -> Result<()>;
}

pub struct ClearGenerator;

impl Generator for ClearGenerator {
    fn name(&self) -> &str {
        "clear"
    }

    fn exec(&self, blob: &[u8], resolver: &dyn Resolver, node: &mut RenderNode, user_key: u16) -> Result<()> {
        let target_hash = read_u32(blob, 0);
        let target = resolver.render_target(target_hash).ok_or(Error::RenderTargetNotFound(target_hash))?;
        node.push(user_key, Cmd::Clear { target });
        Ok(())
    }
}

pub struct FullscreenPassGenerator;

impl Generator for FullscreenPassGenerator {
    fn name(&self) -> &str {
        "fullscreen_pass"
    }

    fn exec(&self, blob: &[u8], resolver: &dyn Resolver, node: &mut RenderNode, user_key: u16) -> Result<()> {
        let shader_hash = read_u32(blob, 0);
        let input_hash = read_u32(blob, 4);
        let output_hash = read_u32(blob, 8);
        let shader = resolver.shader(shader_hash).ok_or(Error::ShaderNotFound(shader_hash))?;
        let input = resolver.render_target(input_hash).ok_or(Error::RenderTargetNotFound(input_hash))?;
        let output = resolver.render_target(output_hash).ok_or(Error::RenderTargetNotFound(output_hash))?;
        node.push(user_key, Cmd::FullscreenPass { shader, input, output });
        Ok(())
    }
}

/// The compiled "world" unit carries a camera and material selector but no
/// world/camera instance data — that arrives per-frame through the app
/// shell's `push_work(CmdRenderWorld{..})` (spec §4.9 step 2). Its runtime
/// counterpart here is a no-op placeholder validating the unit is
/// well-formed; actual world traversal is driven by
/// [`crate::renderer::Renderer::push_render_world`].
pub struct WorldGenerator;

impl Generator for WorldGenerator {
    fn name(&self) -> &str {
        "world"
    }

    fn exec(&self, blob: &[u8], _resolver: &dyn Resolver, _node: &mut RenderNode, _user_key: u16) -> Result<()> {
        let _camera_hash = read_u32(blob, 0);
        let _material_hash = read_u32(blob, 4);
        Ok(())
    }
}

/// `generator_name_hash → Generator`, the runtime counterpart of the
/// compile-side `GeneratorRegistry`.
pub struct GeneratorRegistry {
    generators: HashMap<u32, Box<dyn Generator>>,
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

    pub fn register(&mut self, generator: Box<dyn Generator>) {
        let key = togo_core::hash::calc32(generator.name().as_bytes());
        tracing::debug!(generator = generator.name(), "registered runtime render generator");
        self.generators.insert(key, generator);
    }

    #[must_use]
    pub fn get(&self, name_hash: u32) -> Option<&dyn Generator> {
        self.generators.get(&name_hash).map(std::convert::AsRef::as_ref)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{HandleArenas, RenderTarget};

    struct FakeResolver {
        target: RenderTargetKey,
    }

    impl Resolver for FakeResolver {
        fn render_target(&self, _name_hash: u32) -> Option<RenderTargetKey> {
            Some(self.target)
        }

        fn shader(&self, _name_hash: u32) -> Option<ShaderKey> {
            None
        }
    }

    #[test]
    fn clear_generator_pushes_a_clear_cmd() {
        let mut arenas = HandleArenas::new();
        let target =
            arenas.render_targets.insert(RenderTarget { name_hash: 1, format_hash: 1, flags: 0, swap: None, swapped: false });
        let resolver = FakeResolver { target };
        let registry = GeneratorRegistry::with_builtins();
        let generator = registry.get(togo_core::hash::calc32(b"clear")).unwrap();

        let mut node = RenderNode::new(0);
        let blob = 1u32.to_le_bytes();
        generator.exec(&blob, &resolver, &mut node, 0).unwrap();
        assert_eq!(node.cmds().len(), 1);
        assert!(matches!(node.cmds()[0], Cmd::Clear { .. }));
    }

    #[test]
    fn unresolved_shader_hash_errors() {
        struct NoShaderResolver;
        impl Resolver for NoShaderResolver {
            fn render_target(&self, _: u32) -> Option<RenderTargetKey> {
                None
            }
            fn shader(&self, _: u32) -> Option<ShaderKey> {
                None
            }
        }
        let registry = GeneratorRegistry::with_builtins();
        let generator = registry.get(togo_core::hash::calc32(b"fullscreen_pass")).unwrap();
        let mut node = RenderNode::new(0);
        let mut blob = Vec::new();
        blob.extend_from_slice(&1u32.to_le_bytes());
        blob.extend_from_slice(&2u32.to_le_bytes());
        blob.extend_from_slice(&3u32.to_le_bytes());
        assert!(matches!(generator.exec(&blob, &NoShaderResolver, &mut node, 0), Err(Error::ShaderNotFound(1))));
    }
}
