//! Analysis session state.
//!
//! All mutation goes through [`apply_action`]; the dispatcher and the CLI
//! only read the state between actions.

pub mod actions;
#[cfg(test)]
mod tests;

pub use actions::{apply_action, AppAction, AppCommand};

use serde_json::Value;

use crate::core::dispatcher::DispatchMode;
use crate::core::staging::Staging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Upload,
    Extract,
    Analyze,
    Complete,
}

impl ProgressStage {
    pub const ALL: [ProgressStage; 4] = [
        ProgressStage::Upload,
        ProgressStage::Extract,
        ProgressStage::Analyze,
        ProgressStage::Complete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProgressStage::Upload => "upload",
            ProgressStage::Extract => "extract",
            ProgressStage::Analyze => "analyze",
            ProgressStage::Complete => "complete",
        }
    }

    fn index(self) -> usize {
        match self {
            ProgressStage::Upload => 0,
            ProgressStage::Extract => 1,
            ProgressStage::Analyze => 2,
            ProgressStage::Complete => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Pending,
    Active,
    Complete,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    statuses: [StageStatus; 4],
    pub detail: String,
}

impl Progress {
    pub fn status(&self, stage: ProgressStage) -> StageStatus {
        self.statuses[stage.index()]
    }

    /// Mark `stage` active and every earlier stage complete.
    pub(crate) fn advance(&mut self, stage: ProgressStage) {
        let target = stage.index();
        for (index, status) in self.statuses.iter_mut().enumerate() {
            *status = match index.cmp(&target) {
                std::cmp::Ordering::Less => StageStatus::Complete,
                std::cmp::Ordering::Equal => StageStatus::Active,
                std::cmp::Ordering::Greater => StageStatus::Pending,
            };
        }
    }

    pub(crate) fn set(&mut self, stage: ProgressStage, status: StageStatus) {
        self.statuses[stage.index()] = status;
    }

    pub fn has_error(&self) -> bool {
        self.statuses.contains(&StageStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// Accumulated deltas of a streamed response.
    Streamed(String),
    /// Whole response body of a single-shot request.
    Json(Value),
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Key in the result map: the file name, suffixed when a run contains
    /// the same name twice.
    pub key: String,
    pub file_name: String,
    pub mode: DispatchMode,
    pub body: ResultBody,
    pub error: Option<String>,
    pub complete: bool,
}

impl AnalysisResult {
    pub fn streamed_text(&self) -> Option<&str> {
        match &self.body {
            ResultBody::Streamed(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub staging: Staging,
    results: Vec<AnalysisResult>,
    pub progress: Progress,
    pub active_tab: Option<usize>,
    pub instruction: Option<String>,
    /// User-facing messages about rejected files and similar.
    pub notices: Vec<String>,
    /// Number of files in the current run.
    pub submitted: usize,
    pub running: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruction(instruction: Option<String>) -> Self {
        Self {
            instruction,
            ..Self::default()
        }
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn result(&self, key: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|result| result.key == key)
    }

    fn result_mut(&mut self, key: &str) -> Option<&mut AnalysisResult> {
        self.results.iter_mut().find(|result| result.key == key)
    }

    pub fn active_result(&self) -> Option<&AnalysisResult> {
        self.active_tab.and_then(|index| self.results.get(index))
    }

    /// Tabs are only shown when the run covered more than one file.
    pub fn shows_tabs(&self) -> bool {
        self.submitted > 1 && !self.results.is_empty()
    }

    pub fn failed(&self) -> Option<&AnalysisResult> {
        self.results.iter().find(|result| result.error.is_some())
    }

    fn unique_key(&self, file_name: &str) -> String {
        if self.result(file_name).is_none() {
            return file_name.to_string();
        }
        (2..)
            .map(|n| format!("{file_name} ({n})"))
            .find(|candidate| self.result(candidate).is_none())
            .unwrap_or_else(|| file_name.to_string())
    }
}
