//! The GPU backend seam. Windowing/GL context creation and the actual
//! device calls are out of scope (Non-goal): this trait is the boundary a
//! concrete backend implements; `togo-render` only interprets `Cmd`s and
//! calls through it.

use crate::handles::{BufferBindingKey, RenderTargetKey, ShaderKey, UniformKey};

pub trait RenderBackend {
    fn clear(&mut self, target: RenderTargetKey);
    fn fullscreen_pass(&mut self, shader: ShaderKey, input: RenderTargetKey, output: RenderTargetKey);
    fn draw_buffers(&mut self, shader: ShaderKey, draw_param_blocks: &[UniformKey], buffer_bindings: &[BufferBindingKey]);
    fn render_world(&mut self, world: u64, camera: u64, viewport: u32);
}

/// A backend that records every call instead of touching a device; used by
/// tests and as a reference for what a concrete backend must observe.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RecordingBackend {
    pub calls: Vec<String>,
}

impl RenderBackend for RecordingBackend {
    fn clear(&mut self, target: RenderTargetKey) {
        self.calls.push(format!("clear({target:?})"));
    }

    fn fullscreen_pass(&mut self, shader: ShaderKey, input: RenderTargetKey, output: RenderTargetKey) {
        self.calls.push(format!("fullscreen_pass({shader:?}, {input:?}, {output:?})"));
    }

    fn draw_buffers(&mut self, shader: ShaderKey, draw_param_blocks: &[UniformKey], buffer_bindings: &[BufferBindingKey]) {
        self.calls.push(format!(
            "draw_buffers({shader:?}, {} param blocks, {} bindings)",
            draw_param_blocks.len(),
            buffer_bindings.len()
        ));
    }

    fn render_world(&mut self, world: u64, camera: u64, viewport: u32) {
        self.calls.push(format!("render_world({world}, {camera}, {viewport})"));
    }
}
