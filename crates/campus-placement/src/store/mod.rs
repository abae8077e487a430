//! Storage backends for the placement repositories.

mod memory;

pub use memory::MemoryStore;
