//! Static Context Store — loads the registered chunks once at startup.
//!
//! The store is immutable after `load` and is shared across requests behind an `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::context::registry::CHUNK_REGISTRY;

/// Substituted for any chunk whose file cannot be read.
pub const MISSING_CONTENT_PLACEHOLDER: &str = "[Content not available]";

/// A named block of static profile text plus its human-readable summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChunk {
    pub id: String,
    pub description: String,
    pub content: String,
}

/// Read-only map of chunk id → chunk. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    chunks: HashMap<String, ContextChunk>,
    order: Vec<String>,
}

impl ContextStore {
    /// Builds the store from `CHUNK_REGISTRY`, reading `<content_dir>/<id>.txt` per entry.
    ///
    /// Never partial: a missing or unreadable file yields the placeholder text.
    pub fn load(content_dir: &Path) -> Self {
        let mut missing = 0usize;

        let chunks = CHUNK_REGISTRY.iter().map(|(id, description)| {
            let path = chunk_path(content_dir, id);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Content file not readable: {} ({e})", path.display());
                    missing += 1;
                    MISSING_CONTENT_PLACEHOLDER.to_string()
                }
            };
            ContextChunk {
                id: id.to_string(),
                description: description.to_string(),
                content,
            }
        });
        let store = Self::from_chunks(chunks);

        info!(
            "Loaded {} context chunks from {} ({} missing)",
            store.len(),
            content_dir.display(),
            missing
        );
        store
    }

    /// Builds a store from already-constructed chunks. A repeated id replaces
    /// the earlier chunk but keeps its original position.
    pub fn from_chunks(chunks: impl IntoIterator<Item = ContextChunk>) -> Self {
        let mut store = Self::default();
        for chunk in chunks {
            if !store.chunks.contains_key(&chunk.id) {
                store.order.push(chunk.id.clone());
            }
            store.chunks.insert(chunk.id.clone(), chunk);
        }
        store
    }

    pub fn get(&self, id: &str) -> Option<&ContextChunk> {
        self.chunks.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Chunks in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextChunk> {
        self.order.iter().filter_map(|id| self.chunks.get(id))
    }
}

fn chunk_path(content_dir: &Path, id: &str) -> PathBuf {
    content_dir.join(format!("{id}.txt"))
}
