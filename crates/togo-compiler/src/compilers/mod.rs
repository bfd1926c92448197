//! Built-in resource compilers (spec §4.6 "Per-compiler conventions").

pub mod render_config;
pub mod shader;
pub mod test_resource;

pub use render_config::RenderConfigCompiler;
pub use shader::{ShaderCompiler, ShaderPreludeCompiler};
pub use test_resource::TestResourceCompiler;
