use super::*;
use crate::core::constants::{MAX_PDF_SIZE, PDF_MIME_TYPE};
use crate::core::staging::StagedFile;
use serde_json::json;

fn pdf(name: &str, size: u64) -> StagedFile {
    StagedFile::new(name, size, PDF_MIME_TYPE, format!("/tmp/{name}"))
}

fn apply_actions(state: &mut AppState, actions: impl IntoIterator<Item = AppAction>) {
    for action in actions {
        apply_action(state, action);
    }
}

fn staged_state(files: Vec<StagedFile>) -> AppState {
    let mut state = AppState::new();
    apply_action(&mut state, AppAction::StageFiles { files });
    state
}

#[test]
fn staging_rejections_become_notices() {
    let state = staged_state(vec![
        pdf("a.pdf", 10),
        pdf("huge.pdf", MAX_PDF_SIZE + 1),
        pdf("a.pdf", 10),
    ]);
    assert_eq!(state.staging.len(), 1);
    assert_eq!(state.notices.len(), 1);
    assert!(state.notices[0].contains("huge.pdf"));
}

#[test]
fn begin_analysis_requires_files() {
    let mut state = AppState::new();
    assert_eq!(apply_action(&mut state, AppAction::BeginAnalysis), None);
    assert!(!state.running);
}

#[test]
fn begin_analysis_clears_previous_results() {
    let mut state = staged_state(vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
    let command = apply_action(&mut state, AppAction::BeginAnalysis);
    assert_eq!(
        command,
        Some(AppCommand::StartBatch(vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]))
    );
    assert_eq!(state.submitted, 2);
    assert_eq!(state.progress.status(ProgressStage::Upload), StageStatus::Active);

    apply_actions(
        &mut state,
        [
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
            AppAction::ResultReceived {
                key: "a.pdf".into(),
                body: json!({"content": "x"}),
            },
            AppAction::BatchCompleted,
        ],
    );
    assert_eq!(state.results().len(), 1);

    apply_action(&mut state, AppAction::BeginAnalysis);
    assert!(state.results().is_empty());
}

#[test]
fn second_begin_while_running_is_ignored() {
    let mut state = staged_state(vec![pdf("a.pdf", 1)]);
    assert!(apply_action(&mut state, AppAction::BeginAnalysis).is_some());
    assert!(apply_action(&mut state, AppAction::BeginAnalysis).is_none());
}

#[test]
fn deltas_accumulate_in_arrival_order() {
    let mut state = staged_state(vec![pdf("big.pdf", 900_000)]);
    apply_actions(
        &mut state,
        [
            AppAction::BeginAnalysis,
            AppAction::FileStarted {
                file_name: "big.pdf".into(),
                mode: DispatchMode::Streaming,
            },
            AppAction::DeltaReceived {
                key: "big.pdf".into(),
                text: "Hel".into(),
            },
            AppAction::DeltaReceived {
                key: "big.pdf".into(),
                text: "lo".into(),
            },
            AppAction::StreamFinished {
                key: "big.pdf".into(),
            },
        ],
    );
    let result = state.result("big.pdf").expect("result");
    assert_eq!(result.streamed_text(), Some("Hello"));
    assert!(result.complete);
}

#[test]
fn duplicate_names_get_distinct_keys() {
    let mut state = staged_state(vec![pdf("a.pdf", 1), pdf("a.pdf", 2)]);
    apply_actions(
        &mut state,
        [
            AppAction::BeginAnalysis,
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
        ],
    );
    let keys: Vec<_> = state.results().iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["a.pdf", "a.pdf (2)"]);
}

#[test]
fn failure_keeps_partial_results_and_marks_error() {
    let mut state = staged_state(vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
    apply_actions(
        &mut state,
        [
            AppAction::BeginAnalysis,
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
            AppAction::ResultReceived {
                key: "a.pdf".into(),
                body: json!({"content": "done"}),
            },
            AppAction::FileStarted {
                file_name: "b.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
            AppAction::FileFailed {
                key: "b.pdf".into(),
                message: "server error 500".into(),
            },
        ],
    );

    assert!(!state.running);
    assert!(state.progress.has_error());
    assert_eq!(state.progress.status(ProgressStage::Analyze), StageStatus::Error);
    assert_eq!(state.progress.detail, "Error: server error 500");
    assert!(state.result("a.pdf").expect("kept").complete);
    assert_eq!(state.failed().map(|r| r.key.as_str()), Some("b.pdf"));
}

#[test]
fn tabs_follow_the_current_file_and_can_be_switched() {
    let mut state = staged_state(vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
    apply_actions(
        &mut state,
        [
            AppAction::BeginAnalysis,
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::Streaming,
            },
            AppAction::FileStarted {
                file_name: "b.pdf".into(),
                mode: DispatchMode::Streaming,
            },
        ],
    );
    assert!(state.shows_tabs());
    assert_eq!(state.active_tab, Some(1));

    assert_eq!(
        apply_action(&mut state, AppAction::SelectTab { index: 0 }),
        Some(AppCommand::RenderActivePanel)
    );
    assert_eq!(state.active_result().map(|r| r.key.as_str()), Some("a.pdf"));

    assert_eq!(apply_action(&mut state, AppAction::SelectTab { index: 0 }), None);
    assert_eq!(apply_action(&mut state, AppAction::SelectTab { index: 9 }), None);
}

#[test]
fn single_file_run_has_no_tabs() {
    let mut state = staged_state(vec![pdf("a.pdf", 1)]);
    apply_actions(
        &mut state,
        [
            AppAction::BeginAnalysis,
            AppAction::FileStarted {
                file_name: "a.pdf".into(),
                mode: DispatchMode::SingleShot,
            },
        ],
    );
    assert!(!state.shows_tabs());
}

#[test]
fn progress_advance_marks_earlier_stages_complete() {
    let mut progress = Progress::default();
    progress.advance(ProgressStage::Analyze);
    assert_eq!(progress.status(ProgressStage::Upload), StageStatus::Complete);
    assert_eq!(progress.status(ProgressStage::Extract), StageStatus::Complete);
    assert_eq!(progress.status(ProgressStage::Analyze), StageStatus::Active);
    assert_eq!(progress.status(ProgressStage::Complete), StageStatus::Pending);
}

#[test]
fn reset_clears_everything_but_instruction() {
    let mut state = staged_state(vec![pdf("a.pdf", 1)]);
    apply_actions(
        &mut state,
        [
            AppAction::SetInstruction {
                instruction: Some("List the alerts".into()),
            },
            AppAction::BeginAnalysis,
            AppAction::Reset,
        ],
    );
    assert!(state.staging.is_empty());
    assert!(state.results().is_empty());
    assert!(!state.running);
    assert_eq!(state.instruction.as_deref(), Some("List the alerts"));
}

#[test]
fn blank_instruction_falls_back_to_default() {
    let mut state = AppState::new();
    apply_action(
        &mut state,
        AppAction::SetInstruction {
            instruction: Some("   ".into()),
        },
    );
    assert_eq!(state.instruction, None);
}
