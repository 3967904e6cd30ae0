use std::sync::Arc;

use crate::config::Config;
use crate::context::ContextStore;
use crate::gateway::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; the gateway holds its own handle to the same store.
    pub store: Arc<ContextStore>,
    /// Pluggable model gateway. Default: `AssistantGateway` over Gemini.
    pub gateway: Arc<dyn ModelGateway>,
    pub config: Config,
}
