pub mod SharedMemory;
pub mod futex;
pub mod sem;

pub use SharedMemory::{allocate_shared_memory, RawHandle, SharedMemoryBackend};
