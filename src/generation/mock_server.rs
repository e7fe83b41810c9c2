//! Local stand-in for the Gemini REST API, for adapter tests.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// What the mock answers with.
#[derive(Clone)]
pub enum MockReply {
    /// 200 with a `generateContent` body carrying this text.
    Text(&'static str),
    /// Non-success status with this body.
    Status(StatusCode, &'static str),
    /// 200 with this exact JSON body.
    Body(Value),
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    models: Vec<&'static str>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// A running mock server.
pub struct MockGemini {
    /// Base URL to point a `GeminiConfig` at.
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockGemini {
    /// Bodies of every generation request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Start a mock server on an ephemeral port.
pub async fn spawn(reply: MockReply, models: Vec<&'static str>) -> MockGemini {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        models,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/v1beta/models", get(list_models))
        .route("/v1beta/models/{*action}", post(generate_content))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await;
    let Ok(listener) = listener else {
        return MockGemini {
            base_url: "http://127.0.0.1:9".to_string(),
            requests,
        };
    };
    let base_url = listener
        .local_addr()
        .map(|addr| format!("http://{addr}"))
        .unwrap_or_default();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockGemini { base_url, requests }
}

async fn list_models(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !headers.contains_key("x-goog-api-key") {
        return (StatusCode::FORBIDDEN, Json(json!({"error": {"message": "missing key"}})));
    }
    if let MockReply::Status(status, body) = state.reply {
        return (status, Json(json!({"error": {"message": body}})));
    }
    let models: Vec<Value> = state
        .models
        .iter()
        .map(|name| json!({"name": name, "displayName": name}))
        .collect();
    (StatusCode::OK, Json(json!({"models": models})))
}

async fn generate_content(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(body);
    }

    match state.reply {
        MockReply::Text(text) => (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": text}], "role": "model"},
                    "finishReason": "STOP",
                    "index": 0,
                    "safetyRatings": []
                }],
                "usageMetadata": {
                    "promptTokenCount": 12,
                    "candidatesTokenCount": 4,
                    "totalTokenCount": 16
                },
                "modelVersion": "gemini-2.5-flash",
                "responseId": "mock-response"
            })),
        ),
        MockReply::Status(status, body) => {
            (status, Json(json!({"error": {"code": status.as_u16(), "message": body}})))
        }
        MockReply::Body(body) => (StatusCode::OK, Json(body)),
    }
}
