//! The command stream (spec §4.9 "Command encoding"). Each [`RenderNode`]
//! is one logical pass: `push` appends a [`Cmd`] to the node's arena and
//! records a sort key `(pass_key << 48 | user_key)`. At frame commit all
//! nodes' key lists are merged into one stable ordering by an LSD radix
//! sort over the 64-bit keys (8 passes of 8 bits), not a comparison sort —
//! the literal "radix merge" the spec calls for.

use crate::handles::{BufferBindingKey, RenderTargetKey, ShaderKey, UniformKey};

/// One opcode a `RenderNode` can carry. The backend (an external GPU
/// collaborator, not implemented here) interprets each variant.
#[derive(Debug, Clone)]
pub enum Cmd {
    /// Clears the named render target to the backend's configured clear
    /// color/depth.
    Clear { target: RenderTargetKey },
    /// Binds `framebuffer`, sets `shader`, draws a screen-covering quad,
    /// blits to `output`. If `input == output` the backend swaps the
    /// target's double-buffered pair afterward.
    FullscreenPass { shader: ShaderKey, input: RenderTargetKey, output: RenderTargetKey },
    /// One draw per buffer binding under `shader`, with `draw_param_blocks`
    /// bound per-draw and the renderer's `fixed_param_blocks` bound
    /// implicitly.
    Buffers { shader: ShaderKey, draw_param_blocks: Vec<UniformKey>, buffer_bindings: Vec<BufferBindingKey> },
    /// Pushed directly by the app shell's frame loop (spec §4.9 step 2),
    /// one per viewport to render this frame.
    RenderWorld { world: u64, camera: u64, viewport: u32 },
}

/// A pass-scoped command arena plus its sort keys. `pass_key` occupies the
/// high 16 bits of every key this node produces, so merging preserves
/// per-pass grouping while letting `user_key` order commands within a pass.
pub struct RenderNode {
    pass_key: u16,
    cmds: Vec<Cmd>,
    keys: Vec<u64>,
}

impl RenderNode {
    #[must_use]
    pub fn new(pass_key: u16) -> Self {
        Self { pass_key, cmds: Vec::new(), keys: Vec::new() }
    }

    #[must_use]
    pub const fn pass_key(&self) -> u16 {
        self.pass_key
    }

    /// Appends `cmd` under `user_key`, returning the command's index within
    /// this node.
    pub fn push(&mut self, user_key: u16, cmd: Cmd) -> usize {
        let key = (u64::from(self.pass_key) << 48) | u64::from(user_key);
        let index = self.cmds.len();
        self.cmds.push(cmd);
        self.keys.push(key);
        index
    }

    #[must_use]
    pub fn cmds(&self) -> &[Cmd] {
        &self.cmds
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
        self.keys.clear();
    }
}

/// A single entry in the frame's merged command ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedEntry {
    pub key: u64,
    pub node: usize,
    pub cmd: usize,
}

fn radix_sort_by_key(mut entries: Vec<MergedEntry>) -> Vec<MergedEntry> {
    let mut buckets: Vec<Vec<MergedEntry>> = vec![Vec::new(); 256];
    for shift in (0..64).step_by(8) {
        for bucket in &mut buckets {
            bucket.clear();
        }
        for entry in entries {
            let byte = ((entry.key >> shift) & 0xff) as usize;
            buckets[byte].push(entry);
        }
        entries = buckets.iter_mut().flat_map(std::mem::take).collect();
    }
    entries
}

/// Radix-merges every node's key list into one stable ordering across the
/// full 64-bit key (pass, then user key within a pass).
#[must_use]
pub fn commit_frame(nodes: &[RenderNode]) -> Vec<MergedEntry> {
    let mut entries = Vec::new();
    for (node_index, node) in nodes.iter().enumerate() {
        for (cmd_index, &key) in node.keys.iter().enumerate() {
            entries.push(MergedEntry { key, node: node_index, cmd: cmd_index });
        }
    }
    radix_sort_by_key(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::HandleArenas;

    #[test]
    fn radix_merge_orders_by_pass_then_user_key() {
        let mut arenas = HandleArenas::new();
        let target = arenas.render_targets.insert(crate::handles::RenderTarget {
            name_hash: 1,
            format_hash: 1,
            flags: 0,
            swap: None,
            swapped: false,
        });

        let mut low_pass = RenderNode::new(0);
        low_pass.push(5, Cmd::Clear { target });
        low_pass.push(1, Cmd::Clear { target });

        let mut high_pass = RenderNode::new(1);
        high_pass.push(0, Cmd::Clear { target });

        let nodes = vec![low_pass, high_pass];
        let merged = commit_frame(&nodes);

        assert_eq!(merged.len(), 3);
        // pass 0's two commands come first, ordered by user_key (1 then 5).
        assert_eq!((merged[0].node, merged[0].cmd), (0, 1));
        assert_eq!((merged[1].node, merged[1].cmd), (0, 0));
        assert_eq!((merged[2].node, merged[2].cmd), (1, 0));
    }
}
