//! REST API routes.
//!
//! Endpoints:
//!
//! - `GET    /health`                       — Liveness probe
//! - `POST   /api/chat`                     — Send a message (streamed or whole)
//! - `GET    /api/sessions`                 — List sessions
//! - `GET    /api/sessions/{id}/messages`   — Session state
//! - `DELETE /api/sessions/{id}/messages`   — Clear history
//! - `POST   /api/sessions/{id}/model`      — Switch the session model
//! - `GET    /api/knowledge`                — List documents
//! - `POST   /api/knowledge`                — Add a document
//! - `PUT    /api/knowledge/{id}`           — Edit a document
//! - `DELETE /api/knowledge/{id}`           — Remove a document
//! - `GET    /api/feedback`                 — List feedback reports
//! - `POST   /api/feedback`                 — Rate a response against the rubric
//!
//! Every JSON response uses the `{ "success": bool, "data" | "error": … }`
//! envelope. A streamed chat reply is a raw UTF-8 chunk body whose final
//! element is the `<CONTEXT>…</CONTEXT>` payload.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{error, info};

use chatarbor_core::document::DocumentPatch;
use chatarbor_core::error::{Error, SessionError, StoreError};
use chatarbor_core::message::SessionId;

use crate::SharedState;
use crate::feedback::FeedbackReport;

/// Build the API router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions", get(list_sessions_handler))
        .route("/api/sessions/{id}/messages", get(get_messages_handler))
        .route(
            "/api/sessions/{id}/messages",
            delete(clear_messages_handler),
        )
        .route("/api/sessions/{id}/model", post(update_model_handler))
        .route("/api/knowledge", get(list_documents_handler))
        .route("/api/knowledge", post(create_document_handler))
        .route("/api/knowledge/{id}", put(update_document_handler))
        .route("/api/knowledge/{id}", delete(delete_document_handler))
        .route("/api/feedback", get(list_feedback_handler))
        .route("/api/feedback", post(submit_feedback_handler))
        .with_state(state)
}

// ── Envelope helpers ──────────────────────────────────────────────────────

fn ok<T: serde::Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Map a turn error to its HTTP surface. Internal detail goes to the log,
/// never to the client.
fn turn_error(error: &Error) -> Response {
    error!(%error, "Chat request failed");
    match error {
        Error::Session(SessionError::EmptyMessage) => {
            fail(StatusCode::BAD_REQUEST, "Message is required")
        }
        Error::Session(SessionError::Busy(_)) => fail(
            StatusCode::CONFLICT,
            "Session is busy processing another message",
        ),
        _ => fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to process message",
        ),
    }
}

fn store_error(error: StoreError) -> Response {
    let status = match &error {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, &error.to_string())
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatSendRequest {
    /// Existing session id (omit to start a new session).
    #[serde(default)]
    session_id: Option<String>,
    /// The user's message.
    message: String,
    /// Switch the session to this model before processing.
    #[serde(default)]
    model: Option<String>,
    /// Stream the reply (default) or return the whole message.
    #[serde(default = "default_stream")]
    stream: bool,
}

fn default_stream() -> bool {
    true
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatSendRequest>,
) -> Response {
    let session_id = payload
        .session_id
        .map(|s| SessionId::from(&s))
        .unwrap_or_default();

    info!(session = %session_id, stream = payload.stream, "chat request");

    if payload.stream {
        match state
            .orchestrator
            .run_turn_streaming(&session_id, &payload.message, payload.model)
            .await
        {
            Ok(rx) => {
                let stream =
                    ReceiverStream::new(rx).map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)));
                (
                    [
                        (
                            header::CONTENT_TYPE,
                            "text/plain; charset=utf-8".to_string(),
                        ),
                        (
                            header::HeaderName::from_static("x-session-id"),
                            session_id.to_string(),
                        ),
                    ],
                    Body::from_stream(stream),
                )
                    .into_response()
            }
            Err(e) => turn_error(&e),
        }
    } else {
        match state
            .orchestrator
            .run_turn(&session_id, &payload.message, payload.model)
            .await
        {
            Ok(outcome) => {
                let session = state.orchestrator.sessions().snapshot(&session_id).await;
                ok(json!({ "session": session, "context": outcome.context })).into_response()
            }
            Err(e) => turn_error(&e),
        }
    }
}

// ── Sessions ──────────────────────────────────────────────────────────────

async fn list_sessions_handler(State(state): State<SharedState>) -> Response {
    ok(state.orchestrator.sessions().list().await).into_response()
}

async fn get_messages_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let snapshot = state
        .orchestrator
        .sessions()
        .snapshot(&SessionId::from(&id))
        .await;
    ok(snapshot).into_response()
}

async fn clear_messages_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let snapshot = state
        .orchestrator
        .sessions()
        .clear_messages(&SessionId::from(&id))
        .await;
    ok(snapshot).into_response()
}

#[derive(Deserialize)]
struct UpdateModelRequest {
    model: String,
}

async fn update_model_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateModelRequest>,
) -> Response {
    let snapshot = state
        .orchestrator
        .sessions()
        .set_model(&SessionId::from(&id), payload.model)
        .await;
    ok(snapshot).into_response()
}

// ── Knowledge base ────────────────────────────────────────────────────────

async fn list_documents_handler(State(state): State<SharedState>) -> Response {
    match state.documents.list().await {
        Ok(documents) => ok(documents).into_response(),
        Err(e) => store_error(e),
    }
}

#[derive(Deserialize)]
struct CreateDocumentRequest {
    title: String,
    content: String,
}

async fn create_document_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Response {
    match state.documents.add(payload.title, payload.content).await {
        Ok(doc) => (StatusCode::CREATED, ok(doc)).into_response(),
        Err(e) => store_error(e),
    }
}

async fn update_document_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<DocumentPatch>,
) -> Response {
    match state.documents.update(&id, patch).await {
        Ok(doc) => ok(doc).into_response(),
        Err(e) => store_error(e),
    }
}

async fn delete_document_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    match state.documents.delete(&id).await {
        Ok(true) => ok(json!({ "id": id })).into_response(),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Document not found"),
        Err(e) => store_error(e),
    }
}

// ── Feedback ──────────────────────────────────────────────────────────────

async fn list_feedback_handler(State(state): State<SharedState>) -> Response {
    ok(state.feedback.read().await.clone()).into_response()
}

async fn submit_feedback_handler(
    State(state): State<SharedState>,
    Json(payload): Json<crate::feedback::FeedbackSubmission>,
) -> Response {
    match FeedbackReport::from_submission(payload) {
        Ok(report) => {
            state.feedback.write().await.push(report.clone());
            (StatusCode::CREATED, ok(report)).into_response()
        }
        Err(reason) => fail(StatusCode::BAD_REQUEST, &reason),
    }
}

// ── Misc ──────────────────────────────────────────────────────────────────

async fn health_handler() -> Response {
    ok(json!({ "status": "ok" })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GatewayState, build_router};
    use async_trait::async_trait;
    use axum::http::Request;
    use chatarbor_agent::{SessionStore, TurnOrchestrator};
    use chatarbor_core::error::ProviderError;
    use chatarbor_core::provider::{ChatRequest, Completion, Provider};
    use chatarbor_core::tool::ToolRegistry;
    use chatarbor_retrieval::InMemoryDocumentStore;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    /// Echoes the assembled prompt back, so tests can see what was sent.
    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ChatRequest,
        ) -> std::result::Result<Completion, ProviderError> {
            let text = request
                .messages
                .last()
                .map(|m| format!("echo: {}", m.content))
                .unwrap_or_default();
            Ok(Completion {
                text,
                tool_calls: Vec::new(),
            })
        }
    }

    fn test_router() -> Router {
        let documents: Arc<dyn chatarbor_core::document::DocumentStore> =
            Arc::new(InMemoryDocumentStore::new());
        let orchestrator = TurnOrchestrator::new(
            Arc::new(EchoProvider),
            documents.clone(),
            Arc::new(ToolRegistry::new()),
            Arc::new(SessionStore::new("test-model")),
        );
        build_router(Arc::new(GatewayState {
            orchestrator,
            documents,
            feedback: RwLock::new(Vec::new()),
        }))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn chat_rejects_blank_message() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({ "message": "   ", "stream": false }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn chat_whole_message_returns_session_state() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({ "session_id": "sess-1", "message": "hello", "stream": false }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let messages = body["data"]["session"]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["content"], "echo: hello");
    }

    #[tokio::test]
    async fn chat_streaming_body_ends_with_context_payload() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({ "session_id": "sess-1", "message": "hello" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-session-id"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let (visible, rest) = text.split_once("<CONTEXT>").unwrap();
        assert!(visible.contains("echo: hello"));
        assert!(rest.ends_with("</CONTEXT>"));
    }

    #[tokio::test]
    async fn knowledge_crud_cycle() {
        let router = test_router();

        // Create
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/knowledge",
                json!({ "title": "Resume tips", "content": "Keep it short." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // List
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/knowledge")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // Update
        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/knowledge/{id}"),
                json!({ "content": "One page only." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["content"], "One page only.");

        // Delete, then a second delete 404s
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/knowledge/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/knowledge/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_document_rejected() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/knowledge",
                json!({ "title": " ", "content": "body" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn model_update_and_clear() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/sessions/sess-9/model",
                json!({ "model": "gpt-4o" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["model"], "gpt-4o");

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/sessions/sess-9/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn feedback_round_trip() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/feedback",
                json!({
                    "user_prompt": "How do I find a job?",
                    "assistant_response": "Use the job search page.",
                    "ratings": { "Correctness / Accuracy": 5 },
                    "notes": "Good link."
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/feedback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // Unknown dimension rejected
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/feedback",
                json!({
                    "user_prompt": "q",
                    "assistant_response": "a",
                    "ratings": { "Swagger": 3 }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
