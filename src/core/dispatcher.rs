//! Submission of staged files, one at a time, to an analysis backend.
//!
//! Files at or below [`STREAMING_THRESHOLD`] go through a single-shot
//! request; larger files are streamed and decoded as they arrive. Every step
//! is an [`AppAction`] so observers see each intermediate state. The first
//! failure halts the batch; results gathered so far are kept.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{ChatMessage, ChatRequest};
use crate::core::app::{apply_action, AppAction, AppCommand, AppState, ProgressStage};
use crate::core::chat_stream::extract_error_summary;
use crate::core::constants::{DEFAULT_INSTRUCTION, PDF_MIME_TYPE, STREAMING_THRESHOLD};
use crate::core::pdf_text::{build_prompt, extract_text};
use crate::core::staging::StagedFile;
use crate::core::stream_decoder::{decode_stream, FrameDecoder, StreamFrame};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    SingleShot,
    Streaming,
}

impl DispatchMode {
    pub fn label(self) -> &'static str {
        match self {
            DispatchMode::SingleShot => "single-shot",
            DispatchMode::Streaming => "streaming",
        }
    }
}

pub fn choose_mode(size: u64) -> DispatchMode {
    if size > STREAMING_THRESHOLD {
        DispatchMode::Streaming
    } else {
        DispatchMode::SingleShot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    Status { status: u16, body: String },
    Transport(String),
    Io(String),
    Extraction(String),
    EmptyDocument,
    InvalidResponse(String),
    /// The upload could not be assembled locally.
    InvalidRequest(String),
    /// In-band `{"error": ...}` frame.
    Remote(String),
    /// The body stopped with a read error after the response started.
    Interrupted(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Status { status, body } => {
                let summary = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|value| extract_error_summary(&value))
                    .filter(|summary| !summary.is_empty());
                match summary {
                    Some(summary) => write!(f, "Server error: {status} ({summary})"),
                    None => write!(f, "Server error: {status}"),
                }
            }
            DispatchError::Transport(message) => write!(f, "Network error: {message}"),
            DispatchError::Io(message) => write!(f, "Could not read file: {message}"),
            DispatchError::Extraction(message) => {
                write!(f, "Could not extract text from PDF: {message}")
            }
            DispatchError::EmptyDocument => {
                write!(f, "Could not extract text from this PDF or PDF is empty")
            }
            DispatchError::InvalidResponse(message) => write!(f, "Invalid response: {message}"),
            DispatchError::InvalidRequest(message) => {
                write!(f, "Could not build request: {message}")
            }
            DispatchError::Remote(message) => write!(f, "Analysis failed: {message}"),
            DispatchError::Interrupted(message) => write!(f, "Stream interrupted: {message}"),
        }
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub instruction: Option<String>,
}

impl AnalysisRequest {
    pub async fn load(file: &StagedFile, instruction: Option<String>) -> Result<Self, DispatchError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|err| DispatchError::Io(format!("{}: {err}", file.path.display())))?;
        Ok(Self {
            file_name: file.name.clone(),
            bytes,
            instruction,
        })
    }
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whole analysis as one JSON body.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, DispatchError>;

    /// Raw response body of a streaming analysis.
    async fn open_stream(&self, request: &AnalysisRequest) -> Result<ByteStream, DispatchError>;
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(DispatchError::Status {
        status: status.as_u16(),
        body,
    })
}

fn into_byte_stream(response: reqwest::Response) -> ByteStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|err| err.to_string()))
        .boxed()
}

fn transport(err: reqwest::Error) -> DispatchError {
    DispatchError::Transport(err.to_string())
}

fn file_part(request: &AnalysisRequest, mime_type: &str) -> Result<Part, DispatchError> {
    Part::bytes(request.bytes.clone())
        .file_name(request.file_name.clone())
        .mime_str(mime_type)
        .map_err(|err| DispatchError::InvalidRequest(err.to_string()))
}

/// The analysis gateway: uploads the PDF and lets the server extract and
/// prompt.
pub struct GatewayBackend {
    client: reqwest::Client,
    gateway_url: String,
}

impl GatewayBackend {
    pub const ANALYZE_ENDPOINT: &'static str = "api/analyze-pdf";
    pub const STREAM_ENDPOINT: &'static str = "api/stream-analyze-pdf";

    pub fn new(client: reqwest::Client, gateway_url: impl Into<String>) -> Self {
        Self {
            client,
            gateway_url: gateway_url.into(),
        }
    }

    fn form(request: &AnalysisRequest) -> Result<Form, DispatchError> {
        let part = file_part(request, PDF_MIME_TYPE)?;
        let form = Form::new().part("pdf", part);
        Ok(match &request.instruction {
            Some(instruction) => form.text("instruction", instruction.clone()),
            None => form,
        })
    }

    async fn post(
        &self,
        endpoint: &str,
        request: &AnalysisRequest,
    ) -> Result<reqwest::Response, DispatchError> {
        let url = construct_api_url(&self.gateway_url, endpoint);
        debug!(%url, file = %request.file_name, "uploading PDF");
        let response = self
            .client
            .post(url)
            .multipart(Self::form(request)?)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await
    }
}

#[async_trait]
impl AnalysisBackend for GatewayBackend {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, DispatchError> {
        let response = self.post(Self::ANALYZE_ENDPOINT, request).await?;
        response
            .json::<Value>()
            .await
            .map_err(|err| DispatchError::InvalidResponse(err.to_string()))
    }

    async fn open_stream(&self, request: &AnalysisRequest) -> Result<ByteStream, DispatchError> {
        let response = self.post(Self::STREAM_ENDPOINT, request).await?;
        Ok(into_byte_stream(response))
    }
}

/// Extracts text locally and talks to the chat-completions API itself.
pub struct DirectBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl DirectBackend {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    async fn prompt_for(&self, request: &AnalysisRequest) -> Result<String, DispatchError> {
        let text = extract_text(request.bytes.clone())
            .await
            .map_err(DispatchError::Extraction)?;
        if text.trim().is_empty() {
            return Err(DispatchError::EmptyDocument);
        }
        let instruction = request
            .instruction
            .as_deref()
            .unwrap_or(DEFAULT_INSTRUCTION);
        Ok(build_prompt(&text, instruction))
    }

    async fn send(&self, prompt: String, stream: bool) -> Result<reqwest::Response, DispatchError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            prompt_system: Some(self.system_prompt.clone()),
            stream,
        };
        let url = construct_api_url(&self.api_url, "chat/completions");
        let request = add_auth_headers(
            self.client
                .post(url)
                .header("Content-Type", "application/json"),
            &self.api_key,
        );
        let response = request.json(&body).send().await.map_err(transport)?;
        ensure_success(response).await
    }

    /// Send an already-built prompt without streaming. Some deployments
    /// answer with an event stream regardless; that body is collapsed into
    /// the usual `choices[0].message.content` shape.
    pub async fn complete_prompt(&self, prompt: String) -> Result<Value, DispatchError> {
        let response = self.send(prompt, false).await?;
        let body = response.bytes().await.map_err(transport)?;
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return Ok(value);
        }

        let mut decoder = FrameDecoder::new();
        let mut frames = decoder.push(&body);
        frames.extend(decoder.finish());
        let mut text = String::new();
        for frame in frames {
            match frame {
                StreamFrame::Delta(delta) => text.push_str(&delta),
                StreamFrame::Error(message) => return Err(DispatchError::Remote(message)),
                StreamFrame::Done => {}
            }
        }
        if text.is_empty() {
            return Err(DispatchError::InvalidResponse(
                "response is neither JSON nor an event stream".to_string(),
            ));
        }
        Ok(json!({"choices": [{"message": {"content": text}}]}))
    }
}

#[async_trait]
impl AnalysisBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, DispatchError> {
        let prompt = self.prompt_for(request).await?;
        self.complete_prompt(prompt).await
    }

    async fn open_stream(&self, request: &AnalysisRequest) -> Result<ByteStream, DispatchError> {
        let prompt = self.prompt_for(request).await?;
        let response = self.send(prompt, true).await?;
        Ok(into_byte_stream(response))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing staged, or a batch is already running.
    Idle,
    Completed,
    Halted { key: String, error: DispatchError },
}

pub struct Dispatcher {
    backend: Box<dyn AnalysisBackend>,
}

impl Dispatcher {
    pub fn new(backend: Box<dyn AnalysisBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Process every staged file in order. `on_change` sees the state after
    /// each action.
    pub async fn run_batch<F>(&self, state: &mut AppState, mut on_change: F) -> BatchOutcome
    where
        F: FnMut(&AppState),
    {
        let Some(AppCommand::StartBatch(files)) =
            apply(state, AppAction::BeginAnalysis, &mut on_change)
        else {
            return BatchOutcome::Idle;
        };
        info!(files = files.len(), backend = self.backend.name(), "starting analysis batch");

        for file in files {
            let mode = choose_mode(file.size);
            apply(
                state,
                AppAction::FileStarted {
                    file_name: file.name.clone(),
                    mode,
                },
                &mut on_change,
            );
            let key = state
                .results()
                .last()
                .map(|result| result.key.clone())
                .unwrap_or_else(|| file.name.clone());

            if let Err(error) = self
                .process_file(state, &file, &key, mode, &mut on_change)
                .await
            {
                warn!(file = %file.name, %error, "analysis failed; halting batch");
                apply(
                    state,
                    AppAction::FileFailed {
                        key: key.clone(),
                        message: error.to_string(),
                    },
                    &mut on_change,
                );
                return BatchOutcome::Halted { key, error };
            }
        }

        apply(state, AppAction::BatchCompleted, &mut on_change);
        BatchOutcome::Completed
    }

    async fn process_file<F>(
        &self,
        state: &mut AppState,
        file: &StagedFile,
        key: &str,
        mode: DispatchMode,
        on_change: &mut F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&AppState),
    {
        let request = AnalysisRequest::load(file, state.instruction.clone()).await?;
        apply(
            state,
            AppAction::StageAdvanced {
                stage: ProgressStage::Extract,
            },
            on_change,
        );
        debug!(file = %file.name, mode = mode.label(), "dispatching");

        match mode {
            DispatchMode::SingleShot => {
                let body = self.backend.analyze(&request).await?;
                apply(
                    state,
                    AppAction::StageAdvanced {
                        stage: ProgressStage::Analyze,
                    },
                    on_change,
                );
                apply(
                    state,
                    AppAction::ResultReceived {
                        key: key.to_string(),
                        body,
                    },
                    on_change,
                );
            }
            DispatchMode::Streaming => {
                let stream = self.backend.open_stream(&request).await?;
                apply(
                    state,
                    AppAction::StageAdvanced {
                        stage: ProgressStage::Analyze,
                    },
                    on_change,
                );
                let summary = decode_stream(stream, |delta: &str| {
                    apply(
                        state,
                        AppAction::DeltaReceived {
                            key: key.to_string(),
                            text: delta.to_string(),
                        },
                        on_change,
                    );
                })
                .await;
                debug!(
                    file = %file.name,
                    deltas = summary.deltas,
                    malformed = summary.malformed,
                    saw_sentinel = summary.saw_sentinel,
                    "stream finished"
                );
                if let Some(message) = summary.error {
                    return Err(DispatchError::Remote(message));
                }
                if let Some(reason) = summary.interrupted {
                    return Err(DispatchError::Interrupted(reason));
                }
                apply(
                    state,
                    AppAction::StreamFinished {
                        key: key.to_string(),
                    },
                    on_change,
                );
            }
        }
        Ok(())
    }
}

fn apply<F>(state: &mut AppState, action: AppAction, on_change: &mut F) -> Option<AppCommand>
where
    F: FnMut(&AppState),
{
    let command = apply_action(state, action);
    on_change(state);
    command
}
