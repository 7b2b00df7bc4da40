//! Storage adapters.

pub mod memory;

pub use memory::{InMemoryChunkStore, InMemoryConflictStore};
