//! Wire types for `POST /ask` and their validation into domain values.

use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::{Role, Turn};

pub const MISSING_QUERY_MESSAGE: &str = "Invalid request: 'query' is required.";
pub const EMPTY_QUERY_MESSAGE: &str = "Invalid request: 'query' must not be empty.";

/// A validated ask request: trimmed, non-empty query plus usable history turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub query: String,
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

impl AskRequest {
    /// Validates a raw JSON body.
    ///
    /// `query` must be a string that is non-empty after trimming. `history` is
    /// lenient: a non-array value is ignored and malformed turns are dropped.
    pub fn from_body(body: &Value) -> Result<Self, AppError> {
        let query = body
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Validation(MISSING_QUERY_MESSAGE.to_string()))?
            .trim();

        if query.is_empty() {
            return Err(AppError::Validation(EMPTY_QUERY_MESSAGE.to_string()));
        }

        let history = body
            .get("history")
            .and_then(Value::as_array)
            .map(|turns| parse_history(turns.as_slice()))
            .unwrap_or_default();

        Ok(Self {
            query: query.to_string(),
            history,
        })
    }
}

/// Keeps turns that carry both `role` and `parts` and whose first part has
/// non-empty text. Order is preserved.
pub fn parse_history(raw: &[Value]) -> Vec<Turn> {
    raw.iter().filter_map(parse_turn).collect()
}

fn parse_turn(raw: &Value) -> Option<Turn> {
    let role = raw.get("role")?;
    let parts = raw.get("parts")?;

    let text = parts
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if text.is_empty() {
        return None;
    }

    Some(Turn {
        role: normalize_role(role),
        text: text.to_string(),
    })
}

/// `"user"` is the user; every other role value is the model side.
fn normalize_role(role: &Value) -> Role {
    match role.as_str() {
        Some("user") => Role::User,
        _ => Role::Model,
    }
}
