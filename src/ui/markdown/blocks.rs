use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Block {
    Code { lang: String, body: String },
    Heading { level: u8, text: String },
    List(Vec<String>),
    Table(Vec<String>),
    Quote(Vec<String>),
    Rule,
    Paragraph(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Fence(&'a str),
    Heading(u8, &'a str),
    Rule,
    Quote(&'a str),
    TableRow,
    ListItem(&'a str),
    Blank,
    Text,
}

static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+(.*)$").expect("valid ordered item pattern"));
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").expect("valid unordered item pattern"));

fn fence_lang(rest: &str) -> &str {
    rest.split_whitespace()
        .next()
        .filter(|lang| {
            lang.chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
        })
        .unwrap_or("")
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(rest) = line.trim_start().strip_prefix("```") {
        return LineKind::Fence(fence_lang(rest));
    }
    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(text) = line.strip_prefix(prefix) {
            return LineKind::Heading(level, text.trim_end());
        }
    }
    if line.trim_end() == "---" {
        return LineKind::Rule;
    }
    if let Some(text) = line.strip_prefix("> ") {
        return LineKind::Quote(text);
    }
    let trimmed = line.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|') {
        return LineKind::TableRow;
    }
    for pattern in [&*ORDERED_ITEM, &*UNORDERED_ITEM] {
        if let Some(item) = pattern.captures(line).and_then(|caps| caps.get(1)) {
            return LineKind::ListItem(item.as_str());
        }
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    LineKind::Text
}

/// Group lines into blocks. Consecutive lines of the same kind form one
/// list, table, quote or paragraph; a blank line always ends the current
/// group.
pub(super) fn parse_blocks(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        match classify(lines[index]) {
            LineKind::Fence(lang) => {
                let start = index + 1;
                let end = lines[start..]
                    .iter()
                    .position(|line| line.trim_start().starts_with("```"))
                    .map(|offset| start + offset);
                // An unclosed fence runs to the end of the text.
                let body_end = end.unwrap_or(lines.len());
                blocks.push(Block::Code {
                    lang: lang.to_string(),
                    body: lines[start..body_end].join("\n"),
                });
                index = end.map_or(lines.len(), |end| end + 1);
            }
            LineKind::Heading(level, text) => {
                blocks.push(Block::Heading {
                    level,
                    text: text.to_string(),
                });
                index += 1;
            }
            LineKind::Rule => {
                blocks.push(Block::Rule);
                index += 1;
            }
            LineKind::Blank => index += 1,
            LineKind::Quote(_) => {
                let (quoted, next) = collect_run(&lines, index, |kind| match kind {
                    LineKind::Quote(text) => Some(text.to_string()),
                    _ => None,
                });
                blocks.push(Block::Quote(quoted));
                index = next;
            }
            LineKind::TableRow => {
                let next = run_end(&lines, index, |kind| matches!(kind, LineKind::TableRow));
                blocks.push(Block::Table(trimmed(&lines[index..next])));
                index = next;
            }
            LineKind::ListItem(_) => {
                let (items, next) = collect_run(&lines, index, |kind| match kind {
                    LineKind::ListItem(text) => Some(text.to_string()),
                    _ => None,
                });
                blocks.push(Block::List(items));
                index = next;
            }
            LineKind::Text => {
                let next = run_end(&lines, index, |kind| matches!(kind, LineKind::Text));
                blocks.push(Block::Paragraph(trimmed(&lines[index..next])));
                index = next;
            }
        }
    }

    blocks
}

fn trimmed(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.trim().to_string()).collect()
}

fn run_end(lines: &[&str], start: usize, same_kind: impl Fn(LineKind<'_>) -> bool) -> usize {
    lines[start..]
        .iter()
        .position(|line| !same_kind(classify(line)))
        .map_or(lines.len(), |offset| start + offset)
}

fn collect_run<T>(
    lines: &[&str],
    start: usize,
    mut accept: impl FnMut(LineKind<'_>) -> Option<T>,
) -> (Vec<T>, usize) {
    let mut collected = Vec::new();
    let mut index = start;
    while index < lines.len() {
        match accept(classify(lines[index])) {
            Some(value) => collected.push(value),
            None => break,
        }
        index += 1;
    }
    (collected, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_block_lines() {
        assert_eq!(classify("```rust"), LineKind::Fence("rust"));
        assert_eq!(classify("```"), LineKind::Fence(""));
        assert_eq!(classify("## Details"), LineKind::Heading(2, "Details"));
        assert_eq!(classify("#### too deep"), LineKind::Text);
        assert_eq!(classify("#nospace"), LineKind::Text);
        assert_eq!(classify("---"), LineKind::Rule);
        assert_eq!(classify("> quoted"), LineKind::Quote("quoted"));
        assert_eq!(classify("| a | b |"), LineKind::TableRow);
        assert_eq!(classify("| a | b"), LineKind::Text);
        assert_eq!(classify("  12. item"), LineKind::ListItem("item"));
        assert_eq!(classify("- item"), LineKind::ListItem("item"));
        assert_eq!(classify("* item"), LineKind::ListItem("item"));
        assert_eq!(classify("**bold** start"), LineKind::Text);
        assert_eq!(classify("   "), LineKind::Blank);
    }

    #[test]
    fn groups_consecutive_lines() {
        let blocks = parse_blocks("intro\nmore\n- a\n- b\n\n> q1\n> q2\n---\ntail");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec!["intro".into(), "more".into()]),
                Block::List(vec!["a".into(), "b".into()]),
                Block::Quote(vec!["q1".into(), "q2".into()]),
                Block::Rule,
                Block::Paragraph(vec!["tail".into()]),
            ]
        );
    }

    #[test]
    fn fenced_code_keeps_inner_markup() {
        let blocks = parse_blocks("```sh\n# not a heading\n- not a list\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Code {
                    lang: "sh".into(),
                    body: "# not a heading\n- not a list".into()
                },
                Block::Paragraph(vec!["after".into()]),
            ]
        );
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let blocks = parse_blocks("text\n```python\nprint(1)\n");
        assert_eq!(
            blocks[1],
            Block::Code {
                lang: "python".into(),
                body: "print(1)\n".into()
            }
        );
    }
}
