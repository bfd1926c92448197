//! Endian-aware binary serialization built on [`togo_stream`].
//!
//! [`Serializer`] carries a direction and a target endian; the proxy types
//! in [`proxy`] layer size-prefixed collections and strings on top of its
//! primitive [`Serializer::arithmetic`] and [`Serializer::buffer`] calls.

pub mod endian;
pub mod proxy;
pub mod serializer;

pub use endian::{Arithmetic, Endian};
pub use proxy::{SerCollection, SerProxy, SerSequence, SerString};
pub use serializer::Serializer;
