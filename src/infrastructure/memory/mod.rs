pub mod memory_store;
pub mod memory_vector_index;

pub use memory_store::MemoryStore;
pub use memory_vector_index::MemoryVectorIndex;
