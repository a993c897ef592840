//! Result panels, tabs and the standalone report page.

use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ChatMessage;
use crate::core::app::{
    apply_action, AnalysisResult, AppAction, AppState, Progress, ProgressStage, ResultBody,
    StageStatus,
};
use crate::ui::markdown::{escape_html, render_markdown, RenderOptions};

const REPORT_STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;padding:0 1em}\
.tabs{display:flex;gap:.5em;border-bottom:1px solid #ccc}\
.tab{padding:.4em .8em;border:1px solid #ccc;border-bottom:none;text-decoration:none;color:inherit}\
.tab.active{font-weight:bold;background:#eef}.tab.failed{color:#a00}\
.panel{padding:1em 0;border-top:1px solid #ddd}.panel:target,.panel.active{background:#fafaff}\
.progress{padding:.5em;background:#f4f4f4}.progress.error{background:#fdd}\
.error-message{color:#a00;border:1px solid #a00;padding:.5em}\
.markdown-table{border-collapse:collapse}.markdown-table td,.markdown-table th{border:1px solid #999;padding:.2em .5em}\
.date{color:#06c}.badge-id{font-family:monospace;background:#eee}\
.highlight{background:#ff9}.alert-text{color:#c00;font-weight:bold}\
.user-turn{color:#555}";

/// Answer text inside a single-shot response body, trying the
/// chat-completions shapes first and the gateway's wrapped shape last.
pub fn extract_display_content(body: &Value) -> Option<&str> {
    let choice = &body["choices"][0];
    choice["message"]["content"]
        .as_str()
        .or_else(|| choice["delta"]["content"].as_str())
        .or_else(|| body["content"].as_str())
        .or_else(|| body["response"]["choices"][0]["message"]["content"].as_str())
}

/// HTML for one result panel body.
pub fn render_result(result: &AnalysisResult, options: &RenderOptions) -> String {
    let mut html = String::new();
    if let Some(error) = &result.error {
        html.push_str(&format!(
            "<div class=\"error-message\">Error: {}</div>",
            escape_html(error)
        ));
    }

    let content = match &result.body {
        ResultBody::Streamed(text) if text.is_empty() && result.error.is_some() => String::new(),
        ResultBody::Streamed(text) => render_markdown(text, options),
        ResultBody::Json(body) => match extract_display_content(body) {
            Some(text) => render_markdown(text, options),
            None => {
                warn!(file = %result.file_name, "unrecognized response shape; showing raw JSON");
                let raw = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
                format!("<pre>{}</pre>", escape_html(&raw))
            }
        },
        ResultBody::Pending if result.error.is_some() => String::new(),
        ResultBody::Pending => "<p class=\"pending\">Waiting for response...</p>".to_string(),
    };

    if !html.is_empty() && !content.is_empty() {
        html.push('\n');
    }
    html.push_str(&content);
    html
}

/// Tab strip, or an empty string when the run covered a single file.
pub fn render_tabs(state: &AppState) -> String {
    if !state.shows_tabs() {
        return String::new();
    }
    let tabs: Vec<String> = state
        .results()
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let mut class = String::from("tab");
            if state.active_tab == Some(index) {
                class.push_str(" active");
            }
            if result.error.is_some() {
                class.push_str(" failed");
            }
            format!(
                "<a class=\"{class}\" href=\"#panel-{index}\">{}</a>",
                escape_html(&result.key)
            )
        })
        .collect();
    format!("<div class=\"tabs\">{}</div>", tabs.join(""))
}

/// Panel of the selected tab, re-rendered from the stored text.
pub fn render_active_panel(state: &AppState, options: &RenderOptions) -> String {
    state
        .active_result()
        .map(|result| render_result(result, options))
        .unwrap_or_default()
}

fn stage_class(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Pending => "pending",
        StageStatus::Active => "active",
        StageStatus::Complete => "complete",
        StageStatus::Error => "error",
    }
}

/// Progress banner for the report page.
pub fn render_progress(progress: &Progress) -> String {
    let steps: Vec<String> = ProgressStage::ALL
        .iter()
        .map(|stage| {
            format!(
                "<li class=\"step {}\">{}</li>",
                stage_class(progress.status(*stage)),
                stage.label()
            )
        })
        .collect();
    let class = if progress.has_error() {
        "progress error"
    } else {
        "progress"
    };
    format!(
        "<div class=\"{class}\"><ol class=\"steps\">{}</ol><p>{}</p></div>",
        steps.join(""),
        escape_html(&progress.detail)
    )
}

/// One terminal line per state change, e.g.
/// `[upload ✓] [extract ✓] [analyze …] [complete ·] Processing a.pdf (1/2)`.
pub fn progress_line(progress: &Progress) -> String {
    let steps: Vec<String> = ProgressStage::ALL
        .iter()
        .map(|stage| {
            let mark = match progress.status(*stage) {
                StageStatus::Pending => "·",
                StageStatus::Active => "…",
                StageStatus::Complete => "✓",
                StageStatus::Error => "✗",
            };
            format!("[{} {mark}]", stage.label())
        })
        .collect();
    if progress.detail.is_empty() {
        steps.join(" ")
    } else {
        format!("{} {}", steps.join(" "), progress.detail)
    }
}

pub fn render_document(state: &AppState, options: &RenderOptions) -> String {
    render_document_at(state, options, Local::now())
}

/// Panel bodies in result order, each produced by switching to its tab on
/// a copy of the state.
fn render_panels(state: &AppState, options: &RenderOptions) -> Vec<String> {
    let mut view = state.clone();
    (0..state.results().len())
        .map(|index| {
            if apply_action(&mut view, AppAction::SelectTab { index }).is_some() {
                debug!(index, "tab switched; rendering panel");
            }
            render_active_panel(&view, options)
        })
        .collect()
}

/// Standalone report page. Every panel is visible and the tabs link to
/// them, so results from a halted batch stay readable without script.
pub fn render_document_at(
    state: &AppState,
    options: &RenderOptions,
    generated: DateTime<Local>,
) -> String {
    let panels: Vec<String> = state
        .results()
        .iter()
        .zip(render_panels(state, options))
        .enumerate()
        .map(|(index, (result, body))| {
            let active = state.active_tab == Some(index) || !state.shows_tabs();
            format!(
                "<section class=\"panel{}\" id=\"panel-{index}\"><h2>{}</h2>\n{body}\n</section>",
                if active { " active" } else { "" },
                escape_html(&result.key),
            )
        })
        .collect();

    let body = [
        render_progress(&state.progress),
        render_tabs(state),
        panels.join("\n"),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

    page("Analysis report", generated, &body)
}

/// Chat transcript as a standalone page; user turns are escaped verbatim,
/// assistant turns go through the Markdown renderer.
pub fn render_transcript(
    messages: &[ChatMessage],
    options: &RenderOptions,
    generated: DateTime<Local>,
) -> String {
    let turns: Vec<String> = messages
        .iter()
        .map(|message| {
            let text = message.text();
            if message.role == "user" {
                format!("<p class=\"user-turn\"><strong>You:</strong> {}</p>", escape_html(&text))
            } else {
                format!(
                    "<div class=\"assistant-turn\">\n{}\n</div>",
                    render_markdown(&text, options)
                )
            }
        })
        .collect();
    page("Chat transcript", generated, &turns.join("\n"))
}

fn page(title: &str, generated: DateTime<Local>, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{title}</title>\n<style>{REPORT_STYLE}</style>\n</head>\n<body>\n\
<h1>{title}</h1>\n<p class=\"generated\">Generated {}</p>\n{body}\n</body>\n</html>\n",
        generated.format("%Y-%m-%d %H:%M:%S")
    )
}
