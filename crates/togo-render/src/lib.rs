//! Render-config data model, GPU handle arenas, shader merging, and the
//! command-stream renderer (spec §4.7–§4.9): the pieces `togo-app`'s frame
//! loop drives each frame.

pub mod backend;
pub mod cmd;
pub mod config;
pub mod error;
pub mod generator;
pub mod handles;
pub mod renderer;
pub mod shader;

pub use backend::RenderBackend;
pub use cmd::{Cmd, RenderNode};
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use generator::GeneratorRegistry;
pub use handles::HandleArenas;
pub use renderer::Renderer;
