//! Shared constants used across the application

/// Largest PDF accepted for staging (10 MiB, inclusive).
pub const MAX_PDF_SIZE: u64 = 10 * 1024 * 1024;

/// Files strictly larger than this are submitted through the streaming endpoint.
pub const STREAMING_THRESHOLD: u64 = 500 * 1024;

/// Extracted document text is cut to this many characters before it is sent
/// to the chat-completions API.
pub const MAX_TEXT_CHARS: usize = 100_000;

pub const TRUNCATION_MARKER: &str = "... [content truncated due to size]";

/// Literal end-of-stream marker sent by the completion API and the gateway.
pub const DONE_SENTINEL: &str = "[DONE]";

pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_API_URL: &str = "https://ai.dragonflygroup.fr/api/v1";
pub const DEFAULT_MODEL: &str = "neuralmagic/Llama-3.1-Nemotron-70B-Instruct-HF-FP8-dynamic";

pub const DEFAULT_INSTRUCTION: &str =
    "Analyse this document and give me a detailed summary with the key points.";

pub const DEFAULT_ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert assistant for analysing PDF \
documents. Analyse the provided content precisely and answer the user's questions.";

pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str = "You are a helpful, friendly and intelligent AI \
assistant. Answer questions concisely and precisely.";

pub const API_KEY_ENV_VAR: &str = "TRACELENS_API_KEY";
pub const LOG_FILTER_ENV_VAR: &str = "TRACELENS_LOG";
