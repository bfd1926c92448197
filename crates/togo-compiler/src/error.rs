//! Recoverable data errors for the offline pipeline (spec tier 2): malformed
//! paths, missing sources, unregistered compilers. Programmer errors
//! (corrupt manifests, serializer contract violations) still panic.

use std::path::PathBuf;

use togo_resource::PathError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("resource path error: {0}")]
    Path(#[from] PathError),

    #[error("no compiler registered for resource type {0:#x}")]
    NoCompilerForType(u32),

    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("compile failed for entry id {0}")]
    CompileFailed(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
