pub mod backend;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};
pub use snapshot::Snapshot;
pub use store::Store;
