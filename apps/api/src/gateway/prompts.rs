// All LLM prompt constants for the model gateway.

/// System instruction for the answer step. Restricts the model to supplied context.
pub const ANSWER_SYSTEM_INSTRUCTION: &str = "You are an AI assistant for Justin Stutler's portfolio.
Base your answers *exclusively* on the provided CONTEXT CHUNK(S) and conversation history.
Do not use external knowledge.
If the answer is not in the context, state: \"I'm sorry, I don't have information on that specific topic based on the provided context.\"
Provide helpful, concise, and professional answers.
";

/// Context selection prompt. Replace `{chunk_descriptions}`, `{recent_history}`
/// and `{user_query}` before sending.
pub const SELECT_CONTEXT_PROMPT_TEMPLATE: &str = r#"Based on the user's query and recent conversation history, identify which context chunks are relevant.
Respond ONLY with a valid JSON array of context chunk IDs (strings).
Available Context Chunks:
{chunk_descriptions}
{recent_history}
User Query: "{user_query}""#;

/// Query fragments answered without a selection call.
pub const TRIVIAL_PHRASES: &[&str] = &["hello", "hi", "thanks", "bye"];

/// Returned by `generate` when no model client is configured.
pub const MISSING_KEY_RESPONSE: &str = "Error: API Key missing.";

/// Returned by `generate` when the model call fails.
pub const SERVICE_ERROR_RESPONSE: &str =
    "I encountered an error while communicating with the AI service.";
