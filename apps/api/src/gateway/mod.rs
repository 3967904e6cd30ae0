//! Model Gateway — the two model-backed steps of answering a chat query.
//!
//! `AppState` holds an `Arc<dyn ModelGateway>`. Production uses `AssistantGateway`;
//! handler tests swap in a recording fake.
//!
//! Neither operation fails: every error path resolves to a fixed fallback value.

use async_trait::async_trait;

use crate::llm_client::Turn;

pub mod assistant;
pub mod prompts;

pub use assistant::AssistantGateway;

/// Number of trailing history turns handed to `classify`.
pub const CLASSIFY_HISTORY_WINDOW: usize = 4;

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Picks the context chunk ids relevant to `query`. May be empty.
    async fn classify(&self, query: &str, recent_history: &[Turn]) -> Vec<String>;

    /// Produces the final answer from the query, full history and selected chunks.
    async fn generate(&self, query: &str, history: &[Turn], selected_ids: &[String]) -> String;

    /// Whether a model backend is configured.
    fn is_available(&self) -> bool;
}
