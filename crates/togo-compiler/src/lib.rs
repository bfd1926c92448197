//! The offline compiler pipeline: per-type [`ResourceCompiler`]s driven by a
//! [`CompilerManager`] over a [`Project`]'s registered [`PackageCompiler`]s,
//! fronted by the six commands in [`commands`] that `togo-cli` wraps.

pub mod commands;
pub mod compiler_metadata;
pub mod compilers;
pub mod error;
pub mod manager;
pub mod package_compiler;
pub mod project;

pub use error::{Error, Result};
pub use manager::{CompilerContext, CompilerManager, ResourceCompiler};
pub use package_compiler::{BuildParity, CompileRecord, PackageCompiler};
pub use project::Project;
