//! `tracelens chat`: one-shot or line-oriented chat sessions.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::ChatMessage;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::data::{path_display, Config};
use crate::core::credentials::{CredentialError, CredentialStore};
use crate::ui::markdown::RenderOptions;
use crate::ui::presenter::render_transcript;
use crate::utils::logging::LoggingState;

pub struct ChatOptions {
    pub prompt: Vec<String>,
    pub system: Option<String>,
    pub model: Option<String>,
    pub html: Option<PathBuf>,
    pub plain: bool,
    pub log: Option<String>,
}

/// Conversation state shared by the one-shot and interactive modes. The
/// whole history is resent on every turn.
pub struct ChatSession {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    history: Vec<ChatMessage>,
    next_stream_id: u64,
    service: ChatStreamService,
    rx: mpsc::UnboundedReceiver<(StreamMessage, u64)>,
}

impl ChatSession {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let (service, rx) = ChatStreamService::new();
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            next_stream_id: 0,
            service,
            rx,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send `prompt` and feed every chunk to `on_chunk` as it arrives. A turn
    /// that fails before any text arrived is dropped from the history.
    pub async fn send_turn<F>(&mut self, prompt: &str, mut on_chunk: F) -> Result<String, String>
    where
        F: FnMut(&str),
    {
        self.history.push(ChatMessage::user(prompt));
        self.next_stream_id += 1;
        let stream_id = self.next_stream_id;
        self.service.spawn_stream(StreamParams {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            system_prompt: Some(self.system_prompt.clone()),
            api_messages: self.history.clone(),
            stream_id,
        });

        let mut reply = String::new();
        let mut error = None;
        while let Some((message, id)) = self.rx.recv().await {
            if id != stream_id {
                continue;
            }
            match message {
                StreamMessage::Chunk(text) => {
                    on_chunk(&text);
                    reply.push_str(&text);
                }
                StreamMessage::Error(message) => error = Some(message),
                StreamMessage::End => break,
            }
        }

        if !reply.is_empty() {
            self.history.push(ChatMessage::assistant(reply.clone()));
        } else if error.is_some() {
            self.history.pop();
        }
        match error {
            Some(message) => Err(message),
            None => Ok(reply),
        }
    }
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let api_key = match CredentialStore::new().resolve() {
        Ok((key, _)) => key,
        Err(CredentialError::Missing) => {
            warn!("no API key configured; sending requests without authorization");
            String::new()
        }
        Err(err) if err.is_recoverable() => {
            eprintln!("⚠️  {err}");
            String::new()
        }
        Err(err) => return Err(err.into()),
    };
    let system_prompt = options
        .system
        .unwrap_or_else(|| config.chat_system_prompt().to_string());
    let model = options
        .model
        .unwrap_or_else(|| config.model().to_string());
    let logging = LoggingState::new(options.log)?;

    let mut session = ChatSession::new(config.api_url(), api_key, model, system_prompt);
    let prompt = options.prompt.join(" ");

    if prompt.trim().is_empty() {
        run_interactive(&mut session, &logging).await?;
    } else {
        run_turn(&mut session, &logging, &prompt).await?;
    }

    if let Some(path) = &options.html {
        let render_options = RenderOptions {
            highlights: config.highlights() && !options.plain,
        };
        std::fs::write(
            path,
            render_transcript(session.history(), &render_options, Local::now()),
        )?;
        eprintln!("Transcript written to {}", path_display(path));
    }
    Ok(())
}

async fn run_interactive(
    session: &mut ChatSession,
    logging: &LoggingState,
) -> Result<(), Box<dyn Error>> {
    eprintln!("Type a message and press Enter. /quit or Ctrl+D ends the session.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/quit" | "/exit") {
            break;
        }
        run_turn(session, logging, line).await?;
    }
    Ok(())
}

async fn run_turn(
    session: &mut ChatSession,
    logging: &LoggingState,
    prompt: &str,
) -> Result<(), Box<dyn Error>> {
    logging.log_chat_message(&ChatMessage::user(prompt))?;
    let result = session
        .send_turn(prompt, |chunk| {
            print!("{chunk}");
            let _ = io::stdout().flush();
        })
        .await;
    println!();
    match result {
        Ok(reply) => logging.log_chat_message(&ChatMessage::assistant(reply))?,
        Err(message) => eprintln!("{message}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{spawn_mock_server, MockResponse};
    use serde_json::Value;

    #[tokio::test]
    async fn history_is_resent_each_turn() {
        let server = spawn_mock_server(vec![
            MockResponse::event_stream(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
                "data: [DONE]\n\n",
            ]),
            MockResponse::event_stream(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"Two\"}}]}\n\n",
                "data: [DONE]\n\n",
            ]),
        ])
        .await;
        let mut session = ChatSession::new(&server.base_url, "key", "model", "be brief");

        let mut seen = Vec::new();
        let first = session
            .send_turn("hello", |chunk| seen.push(chunk.to_string()))
            .await;
        assert_eq!(first, Ok("Hi".to_string()));
        assert_eq!(seen, vec!["Hi"]);

        let second = session.send_turn("how many?", |_| {}).await;
        assert_eq!(second, Ok("Two".to_string()));
        assert_eq!(session.history().len(), 4);

        let requests = server.requests.lock().await;
        let body: Value = serde_json::from_str(&requests[1].body_text()).expect("json body");
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .expect("messages")
            .iter()
            .filter_map(|message| message["role"].as_str())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(body["promptSystem"], "be brief");
        assert_eq!(body["stream"], true);
    }

    #[tokio::test]
    async fn failed_turn_is_dropped_from_history() {
        let server = spawn_mock_server(vec![MockResponse::json(
            401,
            serde_json::json!({"error": {"message": "Invalid API key"}}),
        )])
        .await;
        let mut session = ChatSession::new(&server.base_url, "bad", "model", "system");

        let err = session
            .send_turn("hello", |_| {})
            .await
            .expect_err("unauthorized");
        assert!(err.contains("Invalid API key"));
        assert!(session.history().is_empty());
    }
}
