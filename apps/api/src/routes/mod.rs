pub mod health;

use std::any::Any;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
};
use tracing::warn;

use crate::chat::handlers;
use crate::errors::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/ask",
            post(handlers::handle_ask).options(handlers::handle_preflight),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

/// CORS headers are attached only when the request `Origin` is in `allowed_origins`.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| {
            // AllowOrigin::list rejects wildcards.
            let wildcard = origin.as_str() == "*";
            if wildcard {
                warn!("Ignoring wildcard entry in allowed origins");
            }
            !wildcard
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid allowed origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal(anyhow::anyhow!("request handler panicked")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::context::{ContextChunk, ContextStore, DEFAULT_CHUNK_ID};
    use crate::gateway::{AssistantGateway, ModelGateway};
    use crate::llm_client::{GenerativeModel, LlmError, ModelRequest, Role, Turn};

    const ALLOWED_ORIGIN: &str = "http://localhost:5500";

    /// Records every gateway call and answers with fixed values.
    #[derive(Default)]
    struct RecordingGateway {
        selection: Vec<String>,
        classify_calls: Mutex<Vec<(String, Vec<Turn>)>>,
        generate_calls: Mutex<Vec<(String, Vec<Turn>, Vec<String>)>>,
    }

    #[async_trait]
    impl ModelGateway for RecordingGateway {
        async fn classify(&self, query: &str, recent_history: &[Turn]) -> Vec<String> {
            self.classify_calls
                .lock()
                .unwrap()
                .push((query.to_string(), recent_history.to_vec()));
            self.selection.clone()
        }

        async fn generate(&self, query: &str, history: &[Turn], selected_ids: &[String]) -> String {
            self.generate_calls.lock().unwrap().push((
                query.to_string(),
                history.to_vec(),
                selected_ids.to_vec(),
            ));
            format!("answer to {query}")
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    /// Echoes the final prompt back, so responses expose the context that was sent.
    struct EchoModel;

    #[async_trait]
    impl GenerativeModel for EchoModel {
        async fn generate(&self, request: ModelRequest) -> Result<String, LlmError> {
            request
                .turns
                .last()
                .map(|t| t.text.clone())
                .ok_or(LlmError::EmptyContent)
        }
    }

    struct PanickingGateway;

    #[async_trait]
    impl ModelGateway for PanickingGateway {
        async fn classify(&self, _query: &str, _recent_history: &[Turn]) -> Vec<String> {
            panic!("classification exploded")
        }

        async fn generate(&self, _query: &str, _history: &[Turn], _ids: &[String]) -> String {
            unreachable!()
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn test_config() -> Config {
        Config {
            gemini_api_key: None,
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
            content_dir: "content".into(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn test_store() -> Arc<ContextStore> {
        Arc::new(ContextStore::from_chunks(vec![ContextChunk {
            id: DEFAULT_CHUNK_ID.to_string(),
            description: "Overview".to_string(),
            content: "Justin studies computer science.".to_string(),
        }]))
    }

    fn app_with(gateway: Arc<dyn ModelGateway>) -> Router {
        build_router(AppState {
            store: test_store(),
            gateway,
            config: test_config(),
        })
    }

    fn post_ask(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn history_turn(role: &str, text: &str) -> Value {
        json!({"role": role, "parts": [{"text": text}]})
    }

    #[tokio::test]
    async fn test_missing_query_returns_400_without_model_calls() {
        let gateway = Arc::new(RecordingGateway::default());
        let app = app_with(gateway.clone());

        let response = app.oneshot(post_ask(json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Invalid request: 'query' is required."})
        );
        assert!(gateway.classify_calls.lock().unwrap().is_empty());
        assert!(gateway.generate_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let gateway = Arc::new(RecordingGateway::default());
        let app = app_with(gateway.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(gateway.classify_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_passes_last_four_turns_to_classify_and_all_to_generate() {
        let gateway = Arc::new(RecordingGateway {
            selection: vec!["resume".to_string()],
            ..Default::default()
        });
        let app = app_with(gateway.clone());

        let history: Vec<Value> = vec![
            history_turn("user", "t1"),
            json!({"parts": [{"text": "dropped, no role"}]}),
            history_turn("model", "t2"),
            history_turn("user", "t3"),
            json!({"role": "user"}),
            history_turn("model", "t4"),
            history_turn("user", "t5"),
        ];
        let response = app
            .oneshot(post_ask(json!({"query": "  Where did he work?  ", "history": history})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"response": "answer to Where did he work?"})
        );

        let classify_calls = gateway.classify_calls.lock().unwrap();
        assert_eq!(classify_calls.len(), 1);
        let (query, recent) = &classify_calls[0];
        assert_eq!(query, "Where did he work?");
        let recent_texts: Vec<_> = recent.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(recent_texts, vec!["t2", "t3", "t4", "t5"]);

        let generate_calls = gateway.generate_calls.lock().unwrap();
        assert_eq!(generate_calls.len(), 1);
        let (_, full_history, selected) = &generate_calls[0];
        let texts: Vec<_> = full_history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(full_history[0].role, Role::User);
        assert_eq!(full_history[1].role, Role::Model);
        assert_eq!(selected, &vec!["resume".to_string()]);
    }

    #[tokio::test]
    async fn test_greeting_uses_default_chunk_end_to_end() {
        let model: Arc<dyn GenerativeModel> = Arc::new(EchoModel);
        let gateway = Arc::new(AssistantGateway::new(Some(model), test_store()));
        let app = app_with(gateway);

        let response = app
            .oneshot(post_ask(json!({"query": "hi", "history": []})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let answer = body["response"].as_str().unwrap();
        assert!(!answer.is_empty());
        assert!(answer.contains("Justin studies computer science."));
        assert!(answer.ends_with("User's current query: \"hi\""));
    }

    #[tokio::test]
    async fn test_degraded_gateway_still_answers_200() {
        let gateway = Arc::new(AssistantGateway::new(None, test_store()));
        let app = app_with(gateway);

        let response = app
            .oneshot(post_ask(json!({"query": "What is his GPA?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"response": "Error: API Key missing."})
        );
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_generic_500() {
        let app = app_with(Arc::new(PanickingGateway));

        let response = app
            .oneshot(post_ask(json!({"query": "What is his GPA?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "An internal server error occurred."})
        );
    }

    #[tokio::test]
    async fn test_preflight_from_unknown_origin_has_no_cors_header() {
        let app = app_with(Arc::new(RecordingGateway::default()));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .header("Origin", "https://evil.example")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin_echoes_origin() {
        let app = app_with(Arc::new(RecordingGateway::default()));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/ask")
            .header("Origin", ALLOWED_ORIGIN)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOWED_ORIGIN
        );
    }

    #[tokio::test]
    async fn test_post_from_allowed_origin_carries_cors_header() {
        let app = app_with(Arc::new(RecordingGateway::default()));

        let mut request = post_ask(json!({"query": "What is his GPA?"}));
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_static(ALLOWED_ORIGIN));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOWED_ORIGIN
        );
    }

    #[tokio::test]
    async fn test_post_from_unknown_origin_has_no_cors_header() {
        let app = app_with(Arc::new(RecordingGateway::default()));

        let mut request = post_ask(json!({"query": "What is his GPA?"}));
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_static("https://evil.example"));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_health_reports_gateway_and_store() {
        let app = app_with(Arc::new(AssistantGateway::new(None, test_store())));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_available"], false);
        assert_eq!(body["context_chunks"], 1);
    }

    #[test]
    fn test_cors_layer_skips_wildcard_and_invalid_origins() {
        // Must not panic on entries AllowOrigin::list cannot take.
        let _ = cors_layer(&[
            "*".to_string(),
            "bad\norigin".to_string(),
            ALLOWED_ORIGIN.to_string(),
        ]);
    }
}
