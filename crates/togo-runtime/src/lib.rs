//! The online resource manager: mounts [`ResourcePackage`] archives,
//! dispatches loads through per-type [`ResourceHandler`]s, and refcounts
//! every active resource.

pub mod error;
pub mod handler;
pub mod manager;
pub mod package;

pub use error::{Error, Result};
pub use handler::ResourceHandler;
pub use manager::ResourceManager;
pub use package::{ResourcePackage, ResourceStreamLock};
