pub mod blob;
pub mod storage;

pub use blob::BlobCache;
pub use storage::IndexStore;
