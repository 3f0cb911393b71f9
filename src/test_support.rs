use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct MockChatResponse {
    pub status: u16,
    pub body: String,
}

impl MockChatResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn answer(content: &str) -> Self {
        Self::new(
            200,
            &serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [
                    {
                        "index": 0,
                        "message": { "role": "assistant", "content": content },
                        "finish_reason": "stop"
                    }
                ]
            })
            .to_string(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockChatState {
    responses: Arc<Vec<MockChatResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockChatServer {
    pub endpoint_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockChatServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Local chat completion endpoint answering with `responses` in order, repeating the last one.
pub async fn start_mock_chat_server(responses: Vec<MockChatResponse>) -> MockChatServer {
    assert!(!responses.is_empty(), "At least one mock response is required");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockChatState {
        responses: Arc::new(responses),
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockChatServer {
        endpoint_url: format!("http://{address}/v1/chat/completions"),
        requests,
    }
}

async fn chat_completions(
    State(state): State<MockChatState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let mut requests = state.requests.lock().unwrap();
    requests.push(RecordedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()),
        body,
    });
    let index = (requests.len() - 1).min(state.responses.len() - 1);
    let response = &state.responses[index];
    (
        StatusCode::from_u16(response.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        response.body.clone(),
    )
}
