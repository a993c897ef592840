//! Diagnostics and chat transcripts.
//!
//! Diagnostics go through `tracing` to stderr. Transcripts are plain text
//! files the chat command appends to when `--log` is given.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::api::ChatMessage;
use crate::core::constants::LOG_FILTER_ENV_VAR;

/// Install the stderr subscriber. The filter comes from `TRACELENS_LOG`
/// (same syntax as `RUST_LOG`) and defaults to `warn`.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    /// Start logging to `log_file` if one is given. The file is opened once
    /// up front so a bad path fails before the first turn.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut logging = LoggingState {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            logging.set_log_file(path)?;
        }
        Ok(logging)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        Self::test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        match (&self.file_path, self.is_active) {
            (Some(path), true) => Self::write_to_log(path, content),
            _ => Ok(()),
        }
    }

    /// Append one chat turn: user lines carry a `You:` prefix, assistant
    /// text is written as-is.
    pub fn log_chat_message(
        &self,
        message: &ChatMessage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let text = message.text();
        if message.role == "user" {
            self.log_message(&format!("You: {text}"))
        } else if text.is_empty() {
            Ok(())
        } else {
            self.log_message(&text)
        }
    }

    fn write_to_log(file_path: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let mut writer = BufWriter::with_capacity(64 * 1024, file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between messages.
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), active) => format!(
                "{} ({})",
                if active { "active" } else { "paused" },
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}
