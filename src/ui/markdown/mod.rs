//! Markdown to HTML conversion for model output.
//!
//! Rendering always starts from the full source text, so callers re-render
//! the growing buffer after every streamed delta. Input may stop anywhere
//! (half a table row, an unclosed fence, a dangling `**`) and still produces
//! well-formed output.
//!
//! The conversion runs as separate stages:
//! 1. [`blocks`] splits the text into fenced code, headings, lists, tables,
//!    quotes, rules and paragraphs.
//! 2. [`inline`] escapes the text of each block, then applies links and
//!    emphasis. Link targets are set aside before emphasis runs, so `*` or `_`
//!    inside a URL is never rewritten.
//! 3. [`table`] turns pipe rows into `<table>` markup using the inline stage
//!    for each cell.
//! 4. [`highlight`] (report mode only) wraps dates, badge ids, references and
//!    alert keywords found in text nodes of paragraphs, list items and cells.
//!
//! Code block bodies and heading text never reach the highlight stage, and
//! emphasis never spans a link or a line break.

mod blocks;
mod highlight;
mod inline;
mod table;

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use regex::Regex;

use blocks::Block;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap dates, badge ids, `#NNN` references and alert keywords in spans.
    pub highlights: bool,
}

impl RenderOptions {
    pub fn plain() -> Self {
        Self { highlights: false }
    }

    pub fn report() -> Self {
        Self { highlights: true }
    }
}

pub fn render_markdown(text: &str, options: &RenderOptions) -> String {
    let normalized = text.replace("\r\n", "\n");
    blocks::parse_blocks(&normalized)
        .iter()
        .map(|block| render_block(block, options))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &Block, options: &RenderOptions) -> String {
    let text_node = |line: &str| {
        let html = inline::render_inline(line);
        if options.highlights {
            highlight::highlight_text_nodes(&html)
        } else {
            html
        }
    };

    match block {
        Block::Code { lang, body } => {
            let class = if lang.is_empty() {
                String::new()
            } else {
                format!(" class=\"language-{lang}\"")
            };
            format!("<pre><code{class}>{}</code></pre>", escape_html(body))
        }
        Block::Heading { level, text } => format!(
            "<h{level} id=\"{}\">{}</h{level}>",
            slugify(text),
            inline::render_inline(text)
        ),
        Block::List(items) => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", text_node(item)))
                .collect();
            format!("<ul>{items}</ul>")
        }
        Block::Table(rows) => table::render_table(&table::parse_table(rows), &text_node),
        Block::Quote(lines) => {
            let body = lines
                .iter()
                .map(|line| inline::render_inline(line))
                .collect::<Vec<_>>()
                .join("<br>");
            format!("<blockquote>{body}</blockquote>")
        }
        Block::Rule => "<hr>".to_string(),
        Block::Paragraph(lines) => {
            let body = lines
                .iter()
                .map(|line| text_node(line))
                .collect::<Vec<_>>()
                .join("<br>");
            format!("<p>{body}</p>")
        }
    }
}

static NON_WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid slug pattern"));

/// Anchor id for a heading: lowercased, every run of non-word characters
/// collapsed into a single `-`.
pub fn slugify(text: &str) -> String {
    NON_WORD_RUN
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
