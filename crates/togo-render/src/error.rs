#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("render config format version {0} is unsupported")]
    UnsupportedConfigVersion(u32),
    #[error("render config section offset mismatch: expected {expected}, found {found}")]
    OffsetMismatch { expected: u32, found: u32 },
    #[error("unknown shared resource kind byte {0}")]
    UnknownSharedResourceKind(u8),
    #[error("pipe references unknown generator {0:#x}")]
    UnknownGenerator(u32),
    #[error("shader param block conflict on {name:?}: prelude {prelude_a:?} declared index {index_a}, prelude {prelude_b:?} declared index {index_b}")]
    ParamBlockConflict {
        name: String,
        prelude_a: String,
        index_a: u32,
        prelude_b: String,
        index_b: u32,
    },
    #[error("shader param block index {index} reused: prelude {prelude_a:?} names it {name_a:?}, prelude {prelude_b:?} names it {name_b:?}")]
    ParamBlockIndexConflict {
        index: u32,
        prelude_a: String,
        name_a: String,
        prelude_b: String,
        name_b: String,
    },
    #[error("shader prelude {0:?} not found")]
    PreludeNotFound(String),
    #[error("handle of the wrong generation used (stale handle)")]
    StaleHandle,
    #[error("render target {0:#x} not found")]
    RenderTargetNotFound(u32),
    #[error("shader {0:#x} not found")]
    ShaderNotFound(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
