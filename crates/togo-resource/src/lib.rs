//! Resource identity, the path grammar, and the on-disk package archive
//! format shared by the offline compiler and the online resource manager.

pub mod identity;
pub mod package;
pub mod path;

pub use identity::{PackageName, ResourceName, ResourceTagGlob, ResourceType};
pub use package::{Archive, ResourceMetadata, FORMAT_VERSION};
pub use path::{parse, ParsedPath, PathError};
