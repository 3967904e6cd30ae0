// Static context: the fixed chunk registry and the store loaded from disk at startup.

pub mod registry;
pub mod store;

pub use registry::DEFAULT_CHUNK_ID;
pub use store::{ContextChunk, ContextStore};
