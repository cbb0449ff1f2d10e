#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock server utilities for testing the backend adapters
pub struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Relay streaming endpoint answering with plain text
    pub async fn mock_relay_stream_text(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain; charset=utf-8")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }

    /// Relay streaming endpoint answering with SSE `data:` lines
    pub async fn mock_relay_stream_sse(&self, events: &[&str]) {
        let body: String = events.iter().map(|e| format!("data: {}\n\n", e)).collect();
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }

    /// SSE `data:` lines served as `text/plain`
    pub async fn mock_relay_stream_sse_as_text(&self, events: &[&str]) {
        let body: String = events.iter().map(|e| format!("data: {}\n\n", e)).collect();
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/plain"))
            .mount(&self.server)
            .await;
    }

    /// Relay streaming endpoint that only matches a bearer key and a request body subset
    pub async fn mock_relay_stream_expecting(&self, api_key: &str, expected: Value, body: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .and(header("authorization", format!("Bearer {}", api_key).as_str()))
            .and(body_partial_json(expected))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Relay non-streaming endpoint
    pub async fn mock_relay_chat(&self, content: &str, suggestions: Option<&[&str]>) {
        let mut reply = json!({ "content": content });
        if let Some(suggestions) = suggestions {
            reply["suggestions"] = json!(suggestions);
        }
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&self.server)
            .await;
    }

    /// Relay endpoint (streaming or not) failing with the given status
    pub async fn mock_relay_error(&self, route: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
            .mount(&self.server)
            .await;
    }

    /// Endpoint answering 200 with a body that is not what the adapter expects
    pub async fn mock_raw(&self, route: &str, body: &str) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Local model server streaming NDJSON, one line per delta, then `done`
    pub async fn mock_local_stream(&self, deltas: &[&str]) {
        let mut body = String::new();
        for delta in deltas {
            body.push_str(
                &json!({ "message": { "role": "assistant", "content": delta }, "done": false })
                    .to_string(),
            );
            body.push('\n');
        }
        body.push_str(&json!({ "message": { "role": "assistant", "content": "" }, "done": true }).to_string());
        body.push('\n');

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/x-ndjson")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }

    /// Local model server non-streaming reply
    pub async fn mock_local_chat(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "qwen2.5:7b",
                "message": { "role": "assistant", "content": content },
                "done": true
            })))
            .mount(&self.server)
            .await;
    }

    /// Local model server with a raw streamed body
    pub async fn mock_local_stream_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// All requests the server has seen, as JSON bodies
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
