//! `Renderer` (spec §4.9): owns the handle arenas, the generator registry,
//! the 16 fixed param-block slots, and the per-pass `RenderNode`s. Building
//! a node from a compiled pipe layer dispatches each unit through its
//! generator; `execute_frame` drains the radix-merged command ordering
//! through a [`RenderBackend`].

use togo_core::HashMap as TogoHashMap;

use crate::backend::RenderBackend;
use crate::cmd::{commit_frame, Cmd, RenderNode};
use crate::config::Layer;
use crate::error::{Error, Result};
use crate::generator::{GeneratorRegistry, Resolver};
use crate::handles::{HandleArenas, RenderTargetKey, ShaderKey, UniformKey};

pub const FIXED_PARAM_BLOCK_COUNT: usize = 16;

pub struct Renderer {
    pub arenas: HandleArenas,
    generators: GeneratorRegistry,
    fixed_param_blocks: [Option<UniformKey>; FIXED_PARAM_BLOCK_COUNT],
    nodes: Vec<RenderNode>,
    render_targets_by_hash: TogoHashMap<u32, RenderTargetKey>,
    shaders_by_hash: TogoHashMap<u32, ShaderKey>,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arenas: HandleArenas::new(),
            generators: GeneratorRegistry::with_builtins(),
            fixed_param_blocks: [None; FIXED_PARAM_BLOCK_COUNT],
            nodes: Vec::new(),
            render_targets_by_hash: TogoHashMap::new(),
            shaders_by_hash: TogoHashMap::new(),
        }
    }

    pub fn register_render_target(&mut self, name_hash: u32, key: RenderTargetKey) {
        self.render_targets_by_hash.set(name_hash, key);
    }

    pub fn register_shader(&mut self, name_hash: u32, key: ShaderKey) {
        self.shaders_by_hash.set(name_hash, key);
    }

    /// Binds a fixed param block into renderer slot `slot` (spec
    /// `fixed_param_blocks[0..15]`).
    ///
    /// # Panics
    /// Panics if `slot >= 16`.
    pub fn set_fixed_param_block(&mut self, slot: usize, uniform: UniformKey) {
        assert!(slot < FIXED_PARAM_BLOCK_COUNT, "Renderer: fixed param block slot {slot} out of range");
        self.fixed_param_blocks[slot] = Some(uniform);
    }

    #[must_use]
    pub fn fixed_param_blocks(&self) -> &[Option<UniformKey>; FIXED_PARAM_BLOCK_COUNT] {
        &self.fixed_param_blocks
    }

    /// Adds a new pass node, returning its index for later `push_work` calls.
    pub fn add_node(&mut self, pass_key: u16) -> usize {
        self.nodes.push(RenderNode::new(pass_key));
        self.nodes.len() - 1
    }

    /// Builds (appends into) `node_index`'s command list from a compiled
    /// pipe layer, dispatching every generator unit in sequence order.
    ///
    /// # Errors
    /// Propagates [`Error::UnknownGenerator`] or a generator's own
    /// resolution error.
    pub fn build_node_from_layer(&mut self, node_index: usize, layer: &Layer) -> Result<()> {
        // Borrow the two lookup tables directly (not through `&self`) so
        // they stay disjoint from the node's own mutable borrow below.
        let resolver =
            NameHashResolver { render_targets: &self.render_targets_by_hash, shaders: &self.shaders_by_hash };
        for (i, unit) in layer.units.iter().enumerate() {
            let generator =
                self.generators.get(unit.generator_hash).ok_or(Error::UnknownGenerator(unit.generator_hash))?;
            let node = &mut self.nodes[node_index];
            generator.exec(&unit.blob, &resolver, node, i as u16)?;
        }
        Ok(())
    }

    /// Pushes the per-viewport world-render command the app shell's frame
    /// loop issues each frame (spec §4.9 step 2).
    pub fn push_render_world(&mut self, node_index: usize, user_key: u16, world: u64, camera: u64, viewport: u32) {
        self.nodes[node_index].push(user_key, Cmd::RenderWorld { world, camera, viewport });
    }

    /// Radix-merges every node's keys and drains the resulting ordering
    /// through `backend` (spec §4.9 step 3, `end_frame`).
    pub fn execute_frame(&mut self, backend: &mut dyn RenderBackend) {
        let merged = commit_frame(&self.nodes);
        for entry in merged {
            let cmd = self.nodes[entry.node].cmds()[entry.cmd].clone();
            match cmd {
                Cmd::Clear { target } => backend.clear(target),
                Cmd::FullscreenPass { shader, input, output } => {
                    backend.fullscreen_pass(shader, input, output);
                    if input == output {
                        if let Some(target) = self.arenas.render_targets.get_mut(input) {
                            target.swapped = !target.swapped;
                        }
                    }
                }
                Cmd::Buffers { shader, draw_param_blocks, buffer_bindings } => {
                    backend.draw_buffers(shader, &draw_param_blocks, &buffer_bindings);
                }
                Cmd::RenderWorld { world, camera, viewport } => backend.render_world(world, camera, viewport),
            }
        }
        for node in &mut self.nodes {
            node.clear();
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for Renderer {
    fn render_target(&self, name_hash: u32) -> Option<RenderTargetKey> {
        self.render_targets_by_hash.get(&name_hash).copied()
    }

    fn shader(&self, name_hash: u32) -> Option<ShaderKey> {
        self.shaders_by_hash.get(&name_hash).copied()
    }
}

/// A resolver borrowing only the renderer's name-hash indices, kept
/// disjoint from its node arena so `build_node_from_layer` can hold both
/// at once.
struct NameHashResolver<'a> {
    render_targets: &'a TogoHashMap<u32, RenderTargetKey>,
    shaders: &'a TogoHashMap<u32, ShaderKey>,
}

impl Resolver for NameHashResolver<'_> {
    fn render_target(&self, name_hash: u32) -> Option<RenderTargetKey> {
        self.render_targets.get(&name_hash).copied()
    }

    fn shader(&self, name_hash: u32) -> Option<ShaderKey> {
        self.shaders.get(&name_hash).copied()
    }
}
