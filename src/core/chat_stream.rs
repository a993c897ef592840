use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest};
use crate::core::stream_decoder::decode_stream;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

pub(crate) fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Render an error body as Markdown: a one-line summary when one can be
/// found, then the body in a fenced block.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return match extract_error_summary(&json_value).filter(|s| !s.is_empty()) {
                Some(summary) => format!("API Error: {summary}\n```json\n{pretty_json}\n```"),
                None => format!("API Error:\n```json\n{pretty_json}\n```"),
            };
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{trimmed}\n```")
    } else {
        format!("API Error:\n```\n{trimmed}\n```")
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub api_messages: Vec<ChatMessage>,
    pub stream_id: u64,
}

/// Runs chat completions on background tasks and reports chunks over a
/// channel, tagged with the id of the turn that produced them.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let stream_id = params.stream_id;
            run_stream(params, &tx).await;
            let _ = tx.send((StreamMessage::End, stream_id));
        });
    }
}

async fn run_stream(params: StreamParams, tx: &mpsc::UnboundedSender<(StreamMessage, u64)>) {
    let StreamParams {
        client,
        api_url,
        api_key,
        model,
        system_prompt,
        api_messages,
        stream_id,
    } = params;

    let request = ChatRequest {
        model,
        messages: api_messages,
        prompt_system: system_prompt,
        stream: true,
    };

    let chat_url = construct_api_url(&api_url, "chat/completions");
    let http_request = add_auth_headers(
        client
            .post(chat_url)
            .header("Content-Type", "application/json"),
        &api_key,
    );

    let response = match http_request.json(&request).send().await {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let message = format!("HTTP {status}: {}", format_api_error(&error_text));
        let _ = tx.send((StreamMessage::Error(message), stream_id));
        return;
    }

    let summary = decode_stream(Box::pin(response.bytes_stream()), |delta: &str| {
        let _ = tx.send((StreamMessage::Chunk(delta.to_string()), stream_id));
    })
    .await;
    debug!(stream_id, deltas = summary.deltas, "chat stream finished");

    if let Some(error) = summary.error {
        let _ = tx.send((StreamMessage::Error(format_api_error(&error)), stream_id));
    } else if let Some(reason) = summary.interrupted {
        let _ = tx.send((
            StreamMessage::Error(format!("Stream interrupted: {reason}")),
            stream_id,
        ));
    }
}
