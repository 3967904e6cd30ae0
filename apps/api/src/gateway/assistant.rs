//! Gemini-backed `ModelGateway`: classify-then-generate over the static context store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::{ContextStore, DEFAULT_CHUNK_ID};
use crate::gateway::prompts::{
    ANSWER_SYSTEM_INSTRUCTION, MISSING_KEY_RESPONSE, SELECT_CONTEXT_PROMPT_TEMPLATE,
    SERVICE_ERROR_RESPONSE, TRIVIAL_PHRASES,
};
use crate::gateway::ModelGateway;
use crate::llm_client::{strip_json_fences, GenerativeModel, LlmError, ModelRequest, Turn};

#[derive(Debug, Error)]
enum SelectionError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("selection is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("selection is not a JSON array: {0}")]
    NotAnArray(Value),
}

/// The production gateway. `model` is `None` when no API key was configured;
/// every operation then degrades to its fixed fallback.
#[derive(Clone)]
pub struct AssistantGateway {
    model: Option<Arc<dyn GenerativeModel>>,
    store: Arc<ContextStore>,
}

impl AssistantGateway {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>, store: Arc<ContextStore>) -> Self {
        Self { model, store }
    }

    async fn request_selection(
        &self,
        model: &dyn GenerativeModel,
        query: &str,
        recent_history: &[Turn],
    ) -> Result<Vec<String>, SelectionError> {
        let request = ModelRequest {
            system: None,
            turns: vec![Turn::user(build_selection_prompt(
                &self.store,
                query,
                recent_history,
            ))],
            json_output: true,
        };
        let text = model.generate(request).await?;
        parse_selection(&text)
    }
}

#[async_trait]
impl ModelGateway for AssistantGateway {
    async fn classify(&self, query: &str, recent_history: &[Turn]) -> Vec<String> {
        let Some(model) = &self.model else {
            return default_selection();
        };

        if is_trivial_query(query) {
            debug!("Trivial query, skipping context selection");
            return Vec::new();
        }

        match self.request_selection(model.as_ref(), query, recent_history).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Context selection error: {e}");
                default_selection()
            }
        }
    }

    async fn generate(&self, query: &str, history: &[Turn], selected_ids: &[String]) -> String {
        let Some(model) = &self.model else {
            return MISSING_KEY_RESPONSE.to_string();
        };

        let context = build_context_block(&self.store, selected_ids);
        let mut turns = format_history(history);
        turns.push(Turn::user(build_final_prompt(&context, query)));

        let request = ModelRequest {
            system: Some(ANSWER_SYSTEM_INSTRUCTION.to_string()),
            turns,
            json_output: false,
        };

        match model.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation error: {e}");
                SERVICE_ERROR_RESPONSE.to_string()
            }
        }
    }

    fn is_available(&self) -> bool {
        self.model.is_some()
    }
}

fn default_selection() -> Vec<String> {
    vec![DEFAULT_CHUNK_ID.to_string()]
}

/// Case-insensitive substring match against `TRIVIAL_PHRASES`.
pub fn is_trivial_query(query: &str) -> bool {
    let query = query.to_lowercase();
    TRIVIAL_PHRASES.iter().any(|phrase| query.contains(phrase))
}

fn build_selection_prompt(store: &ContextStore, query: &str, recent_history: &[Turn]) -> String {
    let descriptions = store
        .iter()
        .map(|c| format!("- ID: \"{}\", Description: \"{}\"", c.id, c.description))
        .collect::<Vec<_>>()
        .join("\n");

    let recent = if recent_history.is_empty() {
        String::new()
    } else {
        let lines = recent_history
            .iter()
            .map(|t| format!("- {}: {}", t.role.as_str(), t.text))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Recent Conversation:\n{lines}\n")
    };

    fill_template(
        SELECT_CONTEXT_PROMPT_TEMPLATE,
        &[
            ("chunk_descriptions", descriptions.as_str()),
            ("recent_history", recent.as_str()),
            ("user_query", query),
        ],
    )
}

/// Substitutes `{name}` placeholders in one scan of `template`. Inserted
/// values are never rescanned, so braces inside them survive as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Keeps the string elements of a JSON array reply. Anything else is an error.
fn parse_selection(text: &str) -> Result<Vec<String>, SelectionError> {
    match serde_json::from_str::<Value>(strip_json_fences(text))? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect()),
        other => Err(SelectionError::NotAnArray(other)),
    }
}

/// Concatenates a delimited section per selected id, in the given order.
/// Ids not in the store are skipped. An empty selection falls back to the
/// default chunk's content alone.
fn build_context_block(store: &ContextStore, selected_ids: &[String]) -> String {
    if selected_ids.is_empty() {
        return store
            .get(DEFAULT_CHUNK_ID)
            .map(|chunk| format!("---BEGIN CONTEXT---\n{}\n---END CONTEXT---", chunk.content))
            .unwrap_or_default();
    }

    selected_ids
        .iter()
        .filter_map(|id| store.get(id))
        .map(|chunk| {
            format!(
                "\n---BEGIN CONTEXT: {}---\n{}\n---END CONTEXT---\n",
                chunk.description, chunk.content
            )
        })
        .collect()
}

fn build_final_prompt(context: &str, query: &str) -> String {
    format!("{context}\n\nUser's current query: \"{query}\"")
}

/// Drops turns with empty text; roles are already normalized to user/model.
fn format_history(history: &[Turn]) -> Vec<Turn> {
    history
        .iter()
        .filter(|turn| !turn.text.is_empty())
        .cloned()
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
