use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;

use promochat_logging::{log_request, log_request_to_file, log_response_error, log_stream_chunk, RequestLog};
use promochat_types::BackendMode;

use crate::client::decode::{LineBuffer, Utf8ChunkDecoder};
use crate::client::{
    BackendError, BackendReply, BackendResult, ChatBackend, ChunkStream, ConversationRequest,
};
use crate::config::{normalize_base_url, LocalConfig};

const NAME: &str = "local";

#[derive(Debug, Default, Deserialize)]
struct LocalMessage {
    #[serde(default)]
    content: String,
}

/// One NDJSON line of a streamed reply, or the whole non-streamed reply
#[derive(Debug, Default, Deserialize)]
struct LocalChunk {
    #[serde(default)]
    message: Option<LocalMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a model server running on the visitor's machine.
///
/// Speaks the `/api/chat` protocol: streamed replies arrive as one JSON
/// object per line and finish with `"done": true`. No session id is sent.
pub struct LocalModelClient {
    config: LocalConfig,
    client: reqwest::Client,
}

impl LocalModelClient {
    pub fn new(mut config: LocalConfig) -> Self {
        config.base_url = normalize_base_url(&config.base_url);
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    pub fn build_request_body(&self, request: &ConversationRequest, stream: bool) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": request.to_messages(&self.config.system_prompt),
            "stream": stream,
            "options": {
                "temperature": self.config.temperature,
                "top_p": self.config.top_p,
            },
        })
    }

    fn log_outbound(&self, url: &str, body: &Value) {
        let entry = RequestLog {
            backend: NAME,
            url,
            model: &self.config.model,
            api_key: None,
            body,
        };
        log_request(&entry, self.config.verbose);

        if let Some(dir) = &self.config.request_log_dir {
            if let Err(e) = log_request_to_file(&entry, dir) {
                log::debug!("Request log not written: {:#}", e);
            }
        }
    }

    async fn post(&self, body: &Value) -> BackendResult<reqwest::Response> {
        let url = self.chat_url();
        self.log_outbound(&url, body);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
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

    fn parse_line(line: &str) -> BackendResult<Option<LocalChunk>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<LocalChunk>(line)
            .map(Some)
            .map_err(|e| BackendError::Malformed {
                backend: NAME,
                message: format!("{}: {}", e, promochat_logging::safe_truncate(line, 120)),
            })
    }
}

#[async_trait]
impl ChatBackend for LocalModelClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }

    async fn chat_streaming(&self, request: &ConversationRequest) -> BackendResult<ChunkStream> {
        let body = self.build_request_body(request, true);
        let response = self.post(&body).await?;
        let verbose = self.config.verbose;
        let mut byte_stream = response.bytes_stream();

        let stream = stream! {
            let mut decoder = Utf8ChunkDecoder::new();
            let mut lines = LineBuffer::new();
            let mut chunk_counter = 0usize;
            let mut finished = false;

            while let Some(chunk_result) = byte_stream.next().await {
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

                for line in lines.push(&text) {
                    match LocalModelClient::parse_line(&line) {
                        Ok(Some(chunk)) => {
                            if let Some(message) = chunk.error {
                                yield Err(BackendError::Stream { backend: NAME, message });
                                return;
                            }
                            if let Some(message) = chunk.message {
                                if !message.content.is_empty() {
                                    yield Ok(message.content);
                                }
                            }
                            if chunk.done {
                                finished = true;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                if finished {
                    return;
                }
            }

            if let Err(message) = decoder.finish() {
                yield Err(BackendError::Malformed { backend: NAME, message });
                return;
            }

            // A final object without a trailing newline
            if let Some(line) = lines.finish() {
                match LocalModelClient::parse_line(&line) {
                    Ok(Some(chunk)) => {
                        if let Some(message) = chunk.error {
                            yield Err(BackendError::Stream { backend: NAME, message });
                        } else if let Some(message) = chunk.message {
                            if !message.content.is_empty() {
                                yield Ok(message.content);
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(stream)))
    }

    async fn chat(&self, request: &ConversationRequest) -> BackendResult<BackendReply> {
        let body = self.build_request_body(request, false);
        let response = self.post(&body).await?;
        let response_text = response.text().await.map_err(|source| BackendError::Transport {
            backend: NAME,
            source,
        })?;

        let chunk: LocalChunk = serde_json::from_str(&response_text).map_err(|e| BackendError::Malformed {
            backend: NAME,
            message: format!("{}: {}", e, promochat_logging::safe_truncate(&response_text, 200)),
        })?;

        if let Some(message) = chunk.error {
            return Err(BackendError::Stream {
                backend: NAME,
                message,
            });
        }

        match chunk.message {
            Some(message) => Ok(BackendReply::text(message.content)),
            None => Err(BackendError::Malformed {
                backend: NAME,
                message: "response has no message".to_string(),
            }),
        }
    }
}
