//! Foundational containers and an allocator-parametric memory model.
//!
//! Everything above L1 in the resource pipeline is built on top of these
//! primitives: an explicit [`Allocator`](allocator::Allocator) capability,
//! POD containers built over it ([`Array`](array::Array),
//! [`FixedArray`](fixed_array::FixedArray), [`Queue`](queue::Queue),
//! [`PriorityQueue`](priority_queue::PriorityQueue)), a chained
//! open-addressing [`HashMap`](hash_map::HashMap), FNV-1a hashing, and a
//! non-owning [`StrRef`](string_ref::StrRef).

pub mod allocator;
pub mod array;
pub mod fixed_array;
pub mod hash;
pub mod hash_map;
pub mod priority_queue;
pub mod queue;
pub mod string_ref;

pub use allocator::{Allocator, FixedBufferAllocator, HeapAllocator, JumpBlockAllocator, TempAllocator};
pub use array::Array;
pub use fixed_array::FixedArray;
pub use hash_map::HashMap;
pub use priority_queue::PriorityQueue;
pub use queue::Queue;
pub use string_ref::StrRef;
