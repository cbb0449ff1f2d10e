use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use promochat_logging::{log_request, log_request_to_file, log_response_error, log_stream_chunk, RequestLog};
use promochat_types::BackendMode;

use crate::client::decode::{LineBuffer, Utf8ChunkDecoder};
use crate::client::{
    BackendError, BackendReply, BackendResult, ChatBackend, ChunkStream, ConversationRequest,
};
use crate::config::{normalize_base_url, RelayConfig};

const NAME: &str = "relay";

/// One parsed server-sent event line
#[derive(Debug, Clone, PartialEq)]
enum SseEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Hosted multi-provider relay client.
///
/// Streaming responses are plain text chunks; a relay that answers with
/// `text/event-stream` is read as SSE `data:` lines instead.
pub struct RelayClient {
    config: RelayConfig,
    client: reqwest::Client,
}

impl RelayClient {
    pub fn new(mut config: RelayConfig) -> Self {
        config.base_url = normalize_base_url(&config.base_url);
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    fn stream_url(&self) -> String {
        format!("{}/chat/stream", self.config.base_url)
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.config.base_url)
    }

    /// Wire body shared by the streaming and non-streaming endpoints
    pub fn build_request_body(&self, request: &ConversationRequest) -> Value {
        serde_json::json!({
            "messages": request.to_messages(&self.config.system_prompt),
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "session_id": request.session_id,
        })
    }

    fn log_outbound(&self, url: &str, body: &Value) {
        let entry = RequestLog {
            backend: NAME,
            url,
            model: &self.config.model,
            api_key: self.config.api_key.as_deref(),
            body,
        };
        log_request(&entry, self.config.verbose);

        if let Some(dir) = &self.config.request_log_dir {
            if let Err(e) = log_request_to_file(&entry, dir) {
                log::debug!("Request log not written: {:#}", e);
            }
        }
    }

    async fn post(&self, url: &str, body: &Value, accept: &str) -> BackendResult<reqwest::Response> {
        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", accept)
            .json(body);

        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|source| BackendError::Transport {
            backend: NAME,
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log_response_error(NAME, status, &error_text, self.config.verbose);
            return Err(BackendError::Status {
                backend: NAME,
                status: status.as_u16(),
                body: error_text,
            });
        }

        Ok(response)
    }

    fn looks_like_sse(text: &str) -> bool {
        let first = text.trim_start();
        first.starts_with("data:") || first.starts_with("event:")
    }

    /// Parse a single SSE line
    fn parse_sse_line(line: &str) -> Option<SseEvent> {
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data.trim() == "[DONE]" {
            return Some(SseEvent::Done);
        }

        match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(obj)) => {
                if let Some(error) = obj.get("error") {
                    let message = error
                        .get("message")
                        .and_then(Value::as_str)
                        .or_else(|| error.as_str())
                        .unwrap_or("unknown error");
                    return Some(SseEvent::Error(message.to_string()));
                }
                ["content", "delta", "text"]
                    .iter()
                    .find_map(|field| obj.get(*field).and_then(Value::as_str))
                    .filter(|text| !text.is_empty())
                    .map(|text| SseEvent::Delta(text.to_string()))
            }
            Ok(Value::String(text)) if !text.is_empty() => Some(SseEvent::Delta(text)),
            Ok(Value::String(_)) => None,
            // Anything else is the text itself
            _ if !data.is_empty() => Some(SseEvent::Delta(data.to_string())),
            _ => None,
        }
    }
}

#[async_trait]
impl ChatBackend for RelayClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }

    async fn chat_streaming(&self, request: &ConversationRequest) -> BackendResult<ChunkStream> {
        let body = self.build_request_body(request);
        let url = self.stream_url();
        self.log_outbound(&url, &body);

        let response = self.post(&url, &body, "text/event-stream, text/plain").await?;
        let declared_sse = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/event-stream"))
            .unwrap_or(false);
        let verbose = self.config.verbose;
        let mut byte_stream = response.bytes_stream();

        let stream = stream! {
            let mut decoder = Utf8ChunkDecoder::new();
            let mut lines = LineBuffer::new();
            let mut chunk_counter = 0usize;
            // Decided by the header, or else by the first text received
            let mut is_sse = if declared_sse { Some(true) } else { None };

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(source) => {
                        yield Err(BackendError::Transport { backend: NAME, source });
                        return;
                    }
                };

                let text = match decoder.push(&bytes) {
                    Ok(text) => text,
                    Err(message) => {
                        yield Err(BackendError::Malformed { backend: NAME, message });
                        return;
                    }
                };
                chunk_counter += 1;
                log_stream_chunk(chunk_counter, &text, verbose);

                if is_sse.is_none() && !text.trim_start().is_empty() {
                    let sniffed = RelayClient::looks_like_sse(&text);
                    if sniffed {
                        log::debug!("Relay stream carries SSE framing without the content type");
                    }
                    is_sse = Some(sniffed);
                }

                if is_sse != Some(true) {
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                    continue;
                }

                for line in lines.push(&text) {
                    match RelayClient::parse_sse_line(&line) {
                        Some(SseEvent::Delta(delta)) => {
                            yield Ok(delta);
                        }
                        Some(SseEvent::Done) => break 'read,
                        Some(SseEvent::Error(message)) => {
                            yield Err(BackendError::Stream { backend: NAME, message });
                            return;
                        }
                        None => {}
                    }
                }
            }

            if let Err(message) = decoder.finish() {
                yield Err(BackendError::Malformed { backend: NAME, message });
                return;
            }

            if let Some(line) = lines.finish() {
                match RelayClient::parse_sse_line(&line) {
                    Some(SseEvent::Delta(delta)) => {
                        yield Ok(delta);
                    }
                    Some(SseEvent::Error(message)) => {
                        yield Err(BackendError::Stream { backend: NAME, message });
                    }
                    _ => {}
                }
            }
        };

        Ok(Box::new(Box::pin(stream)))
    }

    async fn chat(&self, request: &ConversationRequest) -> BackendResult<BackendReply> {
        let body = self.build_request_body(request);
        let url = self.chat_url();
        self.log_outbound(&url, &body);

        let response = self.post(&url, &body, "application/json").await?;
        let response_text = response.text().await.map_err(|source| BackendError::Transport {
            backend: NAME,
            source,
        })?;

        serde_json::from_str::<BackendReply>(&response_text).map_err(|e| BackendError::Malformed {
            backend: NAME,
            message: format!("{}: {}", e, promochat_logging::safe_truncate(&response_text, 200)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_json_and_raw_payloads() {
        assert_eq!(
            RelayClient::parse_sse_line(r#"data: {"content":"你好"}"#),
            Some(SseEvent::Delta("你好".to_string()))
        );
        assert_eq!(
            RelayClient::parse_sse_line(r#"data: {"delta":"a"}"#),
            Some(SseEvent::Delta("a".to_string()))
        );
        assert_eq!(
            RelayClient::parse_sse_line("data: plain words"),
            Some(SseEvent::Delta("plain words".to_string()))
        );
        assert_eq!(RelayClient::parse_sse_line("data: [DONE]"), Some(SseEvent::Done));
    }

    #[test]
    fn test_parse_sse_json_string_payload_is_unquoted() {
        assert_eq!(
            RelayClient::parse_sse_line(r#"data: "你好""#),
            Some(SseEvent::Delta("你好".to_string()))
        );
        assert_eq!(RelayClient::parse_sse_line(r#"data: """#), None);
    }

    #[test]
    fn test_sse_framing_is_sniffed() {
        assert!(RelayClient::looks_like_sse("\ndata: {\"content\":\"a\"}\n\n"));
        assert!(RelayClient::looks_like_sse("event: message\n"));
        assert!(!RelayClient::looks_like_sse("游戏机制很简单"));
    }

    #[test]
    fn test_parse_sse_ignores_other_lines() {
        assert_eq!(RelayClient::parse_sse_line(""), None);
        assert_eq!(RelayClient::parse_sse_line("event: ping"), None);
        assert_eq!(RelayClient::parse_sse_line(": keep-alive"), None);
        assert_eq!(RelayClient::parse_sse_line(r#"data: {"content":""}"#), None);
    }

    #[test]
    fn test_parse_sse_error_event() {
        assert_eq!(
            RelayClient::parse_sse_line(r#"data: {"error":{"message":"upstream timeout"}}"#),
            Some(SseEvent::Error("upstream timeout".to_string()))
        );
        assert_eq!(
            RelayClient::parse_sse_line(r#"data: {"error":"quota"}"#),
            Some(SseEvent::Error("quota".to_string()))
        );
    }

    #[test]
    fn test_request_body_shape() {
        let client = RelayClient::new(RelayConfig {
            base_url: "https://relay.example.com/api/".to_string(),
            system_prompt: "sys".to_string(),
            ..RelayConfig::default()
        });
        assert_eq!(client.stream_url(), "https://relay.example.com/api/chat/stream");

        let request = ConversationRequest::new(&[], "hello", "session_1");
        let body = client.build_request_body(&request);
        assert_eq!(body["session_id"], "session_1");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["max_tokens"], 800);
    }
}
