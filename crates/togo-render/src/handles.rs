//! Typed GPU-resource handle arenas (spec §3 "Handle arenas"). Each kind
//! gets its own generational key type via [`slotmap::new_key_type!`];
//! `slotmap::KeyData` already packs a monotonic generation over a
//! power-of-two index, which is the in-memory behavior the packed
//! `(generation | index)` id described by the spec is the wire form of.
//! Freeing and reusing a slot yields a different key, so a stale handle
//! fails lookup rather than aliasing live data.

use slotmap::SlotMap;

slotmap::new_key_type! {
    pub struct BufferKey;
    pub struct BufferBindingKey;
    pub struct TextureKey;
    pub struct RenderTargetKey;
    pub struct FramebufferKey;
    pub struct ShaderKey;
    pub struct UniformKey;
}

/// A GPU buffer. No device backing is modeled here; `byte_len` is enough
/// for the runtime to validate buffer bindings against.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub name_hash: u32,
    pub byte_len: usize,
}

/// A binding of a buffer (or a sub-range of one) to a draw-param slot.
#[derive(Debug, Clone)]
pub struct BufferBinding {
    pub buffer: BufferKey,
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub name_hash: u32,
    pub format_hash: u32,
    pub width: u32,
    pub height: u32,
}

/// A render target or depth/stencil surface, possibly the front half of a
/// double-buffered pair (`swap` partner set once both halves exist).
/// `swapped` flips every time a fullscreen pass is dispatched with this
/// target as both its input and output, observing the otherwise-invisible
/// backend swap.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub name_hash: u32,
    pub format_hash: u32,
    pub flags: u32,
    pub swap: Option<RenderTargetKey>,
    pub swapped: bool,
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub color_attachments: Vec<RenderTargetKey>,
    pub depth_stencil: Option<RenderTargetKey>,
}

#[derive(Debug, Clone)]
pub struct Shader {
    pub sources: Vec<String>,
    pub fixed_param_blocks: Vec<(String, u32)>,
    pub draw_param_blocks: Vec<(String, u32)>,
}

#[derive(Debug, Clone)]
pub struct Uniform {
    pub name_hash: u32,
    pub bytes: Vec<u8>,
}

/// The seven GPU-resource arenas a [`crate::renderer::Renderer`] owns.
#[derive(Default)]
pub struct HandleArenas {
    pub buffers: SlotMap<BufferKey, Buffer>,
    pub buffer_bindings: SlotMap<BufferBindingKey, BufferBinding>,
    pub textures: SlotMap<TextureKey, Texture>,
    pub render_targets: SlotMap<RenderTargetKey, RenderTarget>,
    pub framebuffers: SlotMap<FramebufferKey, Framebuffer>,
    pub shaders: SlotMap<ShaderKey, Shader>,
    pub uniforms: SlotMap<UniformKey, Uniform>,
}

impl HandleArenas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_freed_slot_reused_yields_a_different_key() {
        let mut arenas = HandleArenas::new();
        let first = arenas.buffers.insert(Buffer { name_hash: 1, byte_len: 16 });
        arenas.buffers.remove(first);
        let second = arenas.buffers.insert(Buffer { name_hash: 2, byte_len: 32 });
        assert_ne!(first, second);
        assert!(!arenas.buffers.contains_key(first));
    }
}
