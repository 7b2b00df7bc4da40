//! Shared client for OpenAI-style `/chat/completions` endpoints.
//!
//! Both configured providers speak this wire format; they differ only in
//! base URL, credentials, and extra headers. Streaming uses SSE framing:
//! `data: {json}` lines terminated by `data: [DONE]`.

use council_application::{ChatMessage, GatewayError, GenerationParams, Role, StreamEvent, StreamHandle};
use council_domain::ModelId;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::debug;

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// HTTP client for one chat-completions endpoint.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
}

impl ChatCompletionsClient {
    /// `timeout_secs` is the per-call ceiling; a slow call surfaces as
    /// [`GatewayError::Timeout`] for that call only.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        })
    }

    /// Add a header to every request (e.g. OpenRouter attribution headers).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    fn payload(
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
        stream: bool,
    ) -> serde_json::Value {
        assert!(!messages.is_empty(), "messages must be a non-empty sequence");
        let wire: Vec<WireMessage<'_>> = messages
            .iter()
            .map(|m| WireMessage {
                role: role_str(m.role),
                content: &m.content,
            })
            .collect();
        json!({
            "model": model.as_str(),
            "messages": wire,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": stream,
        })
    }

    async fn post_chat(&self, payload: &serde_json::Value) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload);
        for (name, value) in &self.extra_headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// One complete generation.
    pub async fn generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, GatewayError> {
        let payload = Self::payload(model, messages, params, false);
        let response = self.post_chat(&payload).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::MalformedResponse("response carried no content".into()))
    }

    /// One streaming generation. The returned handle yields text fragments
    /// as the provider produces them; dropping it abandons the transfer.
    pub async fn stream_generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<StreamHandle, GatewayError> {
        let payload = Self::payload(model, messages, params, true);
        let response = self.post_chat(&payload).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let stream = response.bytes_stream().map(|r| r.map_err(std::io::Error::other));
            let reader = StreamReader::new(stream);
            let mut lines = FramedRead::new(reader, LinesCodec::new());
            let mut assembled = String::new();

            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    break;
                }

                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => {
                        let delta = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                            .unwrap_or_default();
                        if delta.is_empty() {
                            continue;
                        }
                        assembled.push_str(&delta);
                        if tx.send(StreamEvent::Delta(delta)).await.is_err() {
                            // Caller abandoned the stream
                            return;
                        }
                    }
                    Err(e) => {
                        debug!("skipping undecodable SSE frame: {e}");
                    }
                }
            }

            let _ = tx.send(StreamEvent::Completed(assembled)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("hi")];
        let payload = ChatCompletionsClient::payload(
            &ModelId::new("gpt-5.2"),
            &messages,
            GenerationParams::default(),
            false,
        );
        assert_eq!(payload["model"], "gpt-5.2");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["stream"], false);
    }

    #[test]
    fn test_stream_chunk_decoding() {
        let frame = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        let chunk: StreamChunk = serde_json::from_str(frame).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));

        // Role-only first frame decodes with no content
        let frame = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        let chunk: StreamChunk = serde_json::from_str(frame).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
    }

    #[test]
    fn test_response_decoding() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hello")
        );
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_empty_messages_rejected() {
        let _ = ChatCompletionsClient::payload(
            &ModelId::new("m"),
            &[],
            GenerationParams::default(),
            false,
        );
    }
}
