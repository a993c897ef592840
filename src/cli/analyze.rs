//! `tracelens analyze`: stage files, run the batch, report progress on
//! stderr and answers on stdout, optionally write the HTML report.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::core::app::{apply_action, AppAction, AppState, ResultBody};
use crate::core::config::data::{path_display, Backend, Config};
use crate::core::credentials::{CredentialError, CredentialStore};
use crate::core::dispatcher::{
    AnalysisBackend, BatchOutcome, DirectBackend, Dispatcher, GatewayBackend,
};
use crate::core::staging::{RejectionReason, StagedFile};
use crate::ui::markdown::RenderOptions;
use crate::ui::presenter::{extract_display_content, progress_line, render_document};

pub struct AnalyzeOptions {
    pub files: Vec<PathBuf>,
    pub instruction: Option<String>,
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub html: Option<PathBuf>,
    pub plain: bool,
}

pub async fn run_analyze(options: AnalyzeOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let render_options = RenderOptions {
        highlights: config.highlights() && !options.plain,
    };

    let mut state = AppState::new();
    let (files, unreadable) = stat_files(&options.files);
    state.notices.extend(unreadable.iter().map(ToString::to_string));
    apply_action(&mut state, AppAction::StageFiles { files });
    apply_action(
        &mut state,
        AppAction::SetInstruction {
            instruction: options.instruction.or_else(|| config.instruction.clone()),
        },
    );
    for notice in &state.notices {
        eprintln!("⚠️  {notice}");
    }
    if state.staging.is_empty() {
        eprintln!("❌ No PDF files to analyze");
        std::process::exit(1);
    }

    let backend = match build_backend(&config, options.backend, options.model) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };
    let dispatcher = Dispatcher::new(backend);
    eprintln!(
        "Analyzing {} file(s) via {}",
        state.staging.len(),
        dispatcher.backend_name()
    );

    let mut reporter = TerminalReporter::default();
    let outcome = dispatcher
        .run_batch(&mut state, |state| reporter.update(state))
        .await;
    reporter.finish();
    print_single_shot_answers(&state);

    if let Some(path) = &options.html {
        std::fs::write(path, render_document(&state, &render_options))?;
        eprintln!("Report written to {}", path_display(path));
    }

    match outcome {
        BatchOutcome::Halted { key, error } => {
            eprintln!("❌ Analysis of {key} failed: {error}");
            std::process::exit(1);
        }
        BatchOutcome::Idle | BatchOutcome::Completed => Ok(()),
    }
}

/// Stat every path. Missing or unreadable files are reported like any
/// other rejection instead of aborting the run.
fn stat_files(paths: &[PathBuf]) -> (Vec<StagedFile>, Vec<RejectionReason>) {
    let mut files = Vec::new();
    let mut rejections = Vec::new();
    for path in paths {
        match StagedFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(err) => rejections.push(RejectionReason::Unreadable {
                name: path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }
    (files, rejections)
}

fn build_backend(
    config: &Config,
    backend: Option<Backend>,
    model: Option<String>,
) -> Result<Box<dyn AnalysisBackend>, CredentialError> {
    let client = reqwest::Client::new();
    match backend.unwrap_or_else(|| config.backend()) {
        Backend::Gateway => Ok(Box::new(GatewayBackend::new(client, config.gateway_url()))),
        Backend::Direct => {
            let (api_key, source) = CredentialStore::new().resolve()?;
            tracing::debug!(%source, "using API key");
            Ok(Box::new(DirectBackend::new(
                client,
                config.api_url(),
                api_key,
                model.unwrap_or_else(|| config.model().to_string()),
                config.analysis_system_prompt(),
            )))
        }
    }
}

/// Prints a progress line whenever it changes and echoes streamed text as
/// it arrives.
#[derive(Default)]
struct TerminalReporter {
    last_line: String,
    streaming_key: Option<String>,
    printed: usize,
}

impl TerminalReporter {
    fn update(&mut self, state: &AppState) {
        let line = progress_line(&state.progress);
        if line != self.last_line {
            self.end_stream_output();
            eprintln!("{line}");
            self.last_line = line;
        }

        let Some(result) = state.active_result() else {
            return;
        };
        let ResultBody::Streamed(text) = &result.body else {
            return;
        };
        if self.streaming_key.as_deref() != Some(result.key.as_str()) {
            self.end_stream_output();
            self.streaming_key = Some(result.key.clone());
            self.printed = 0;
        }
        if text.len() > self.printed {
            print!("{}", &text[self.printed..]);
            let _ = io::stdout().flush();
            self.printed = text.len();
        }
    }

    fn end_stream_output(&mut self) {
        if self.printed > 0 {
            println!();
            self.printed = 0;
        }
    }

    fn finish(&mut self) {
        self.end_stream_output();
    }
}

fn print_single_shot_answers(state: &AppState) {
    for result in state.results() {
        let ResultBody::Json(body) = &result.body else {
            continue;
        };
        println!("== {} ==", result.key);
        match extract_display_content(body) {
            Some(text) => println!("{text}"),
            None => println!(
                "{}",
                serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
            ),
        }
    }
}
