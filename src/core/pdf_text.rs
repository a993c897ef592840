//! Local PDF text extraction for the direct backend.

use tracing::{debug, warn};

use crate::core::constants::{MAX_TEXT_CHARS, TRUNCATION_MARKER};

/// True when the bytes start with the `%PDF-` magic.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Extract text on a blocking thread. A panic inside the parser is reported
/// as an error rather than taking the runtime down.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, String> {
    if !looks_like_pdf(&bytes) {
        return Err("file does not start with a PDF header".to_string());
    }
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|err| format!("PDF parser failed: {err}"))?
        .map_err(|err| err.to_string())?;
    debug!(chars = text.chars().count(), "extracted PDF text");
    Ok(truncate_text(&text, MAX_TEXT_CHARS))
}

/// Cut `text` to at most `max_chars` characters, appending the truncation
/// marker when anything was dropped.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            warn!(
                from = text.chars().count(),
                to = max_chars,
                "PDF text truncated"
            );
            format!("{}{TRUNCATION_MARKER}", &text[..byte_index])
        }
        None => text.to_string(),
    }
}

pub fn build_prompt(document_text: &str, instruction: &str) -> String {
    format!("Document content: {document_text}\n\nUser question: {instruction}")
}
