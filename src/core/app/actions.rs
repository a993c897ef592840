use serde_json::Value;
use tracing::debug;

use super::{AnalysisResult, AppState, Progress, ProgressStage, ResultBody, StageStatus};
use crate::core::dispatcher::DispatchMode;
use crate::core::staging::StagedFile;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    StageFiles {
        files: Vec<StagedFile>,
    },
    RemoveFile {
        index: usize,
    },
    SetInstruction {
        instruction: Option<String>,
    },
    BeginAnalysis,
    FileStarted {
        file_name: String,
        mode: DispatchMode,
    },
    StageAdvanced {
        stage: ProgressStage,
    },
    DeltaReceived {
        key: String,
        text: String,
    },
    ResultReceived {
        key: String,
        body: Value,
    },
    StreamFinished {
        key: String,
    },
    FileFailed {
        key: String,
        message: String,
    },
    BatchCompleted,
    SelectTab {
        index: usize,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Submit these files, in order.
    StartBatch(Vec<StagedFile>),
    RenderActivePanel,
}

pub fn apply_action(state: &mut AppState, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::StageFiles { files } => {
            let rejections = state.staging.stage_all(files);
            state
                .notices
                .extend(rejections.iter().map(ToString::to_string));
            None
        }
        AppAction::RemoveFile { index } => {
            state.staging.remove(index);
            None
        }
        AppAction::SetInstruction { instruction } => {
            state.instruction = instruction.filter(|text| !text.trim().is_empty());
            None
        }
        AppAction::BeginAnalysis => begin_analysis(state),
        AppAction::FileStarted { file_name, mode } => {
            let key = state.unique_key(&file_name);
            let position = state.results.len() + 1;
            state.progress.advance(ProgressStage::Upload);
            state.progress.detail =
                format!("Processing {file_name} ({position}/{})", state.submitted);
            state.results.push(AnalysisResult {
                key,
                file_name,
                mode,
                body: match mode {
                    DispatchMode::Streaming => ResultBody::Streamed(String::new()),
                    DispatchMode::SingleShot => ResultBody::Pending,
                },
                error: None,
                complete: false,
            });
            state.active_tab = Some(state.results.len() - 1);
            None
        }
        AppAction::StageAdvanced { stage } => {
            state.progress.advance(stage);
            None
        }
        AppAction::DeltaReceived { key, text } => {
            match state.result_mut(&key).map(|result| &mut result.body) {
                Some(ResultBody::Streamed(buffer)) => buffer.push_str(&text),
                Some(body) => *body = ResultBody::Streamed(text),
                None => debug!(%key, "delta for unknown result dropped"),
            }
            None
        }
        AppAction::ResultReceived { key, body } => {
            if let Some(result) = state.result_mut(&key) {
                result.body = ResultBody::Json(body);
                result.complete = true;
            }
            state.progress.set(ProgressStage::Analyze, StageStatus::Complete);
            None
        }
        AppAction::StreamFinished { key } => {
            if let Some(result) = state.result_mut(&key) {
                result.complete = true;
            }
            state.progress.set(ProgressStage::Analyze, StageStatus::Complete);
            None
        }
        AppAction::FileFailed { key, message } => {
            if let Some(result) = state.result_mut(&key) {
                result.error = Some(message.clone());
            }
            state.progress.set(ProgressStage::Analyze, StageStatus::Error);
            state.progress.detail = format!("Error: {message}");
            state.running = false;
            None
        }
        AppAction::BatchCompleted => {
            state.progress.advance(ProgressStage::Complete);
            state.progress.set(ProgressStage::Complete, StageStatus::Complete);
            state.progress.detail = "Analysis complete!".to_string();
            state.running = false;
            None
        }
        AppAction::SelectTab { index } => {
            if index >= state.results.len() || state.active_tab == Some(index) {
                return None;
            }
            state.active_tab = Some(index);
            Some(AppCommand::RenderActivePanel)
        }
        AppAction::Reset => {
            let instruction = state.instruction.take();
            *state = AppState::with_instruction(instruction);
            None
        }
    }
}

fn begin_analysis(state: &mut AppState) -> Option<AppCommand> {
    if !state.staging.is_dispatch_enabled() || state.running {
        return None;
    }
    state.results.clear();
    state.active_tab = None;
    state.submitted = state.staging.len();
    state.running = true;
    state.progress = Progress {
        detail: "Preparing files...".to_string(),
        ..Progress::default()
    };
    state.progress.advance(ProgressStage::Upload);
    Some(AppCommand::StartBatch(state.staging.files().to_vec()))
}
