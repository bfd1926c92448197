//! Seekable byte streams used throughout the resource pipeline.
//!
//! Three independent capabilities ([`Reader`], [`Writer`], [`Seekable`])
//! compose into concrete streams: [`FileStream`], [`MemoryWriterStream`],
//! [`MemoryReader`], and the producer/consumer [`ObjectBuffer`].

pub mod file_stream;
pub mod memory_stream;
pub mod object_buffer;
pub mod status;
pub mod traits;

pub use file_stream::{FileMode, FileStream};
pub use memory_stream::{MemoryReader, MemoryWriterStream};
pub use object_buffer::ObjectBuffer;
pub use status::IOStatus;
pub use traits::{Reader, Seekable, Writer};
