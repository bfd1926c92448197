use std::path::PathBuf;

use togo_resource::ResourceType;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no handler registered for resource type {0:#x}")]
    HandlerNotRegistered(u32),
    #[error("resource {name:#x} of type {type_hash:#x} not found in any mounted package")]
    NotFound { type_hash: u32, name: u64 },
    #[error("resource {0:#x} is active with a different type than requested")]
    TypeMismatch(u64),
    #[error("unref called on resource {0:#x} with no active references")]
    RefcountUnderflow(u64),
    #[error("no mounted package matches {0}")]
    PackageNotMounted(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn handler_not_registered(t: ResourceType) -> Self {
        Self::HandlerNotRegistered(t.raw())
    }
}
