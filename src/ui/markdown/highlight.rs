use std::sync::LazyLock;

use regex::{Captures, Regex};

static HIGHLIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<date>[0-9]{4}-[0-9]{2}-[0-9]{2})",
        r"|(?P<badge>Badge_[A-Za-z0-9_]+)",
        r"|(?P<reference>#[0-9]{3})",
        r"|(?P<alert>(?i:erreur|alerte|critique|échec|bruteforce|suspect))",
    ))
    .expect("valid highlight pattern")
});

fn wrap(caps: &Captures<'_>) -> String {
    let class = if caps.name("date").is_some() {
        "date"
    } else if caps.name("badge").is_some() {
        "badge-id"
    } else if caps.name("reference").is_some() {
        "highlight"
    } else {
        "alert-text"
    };
    format!("<span class=\"{class}\">{}</span>", &caps[0])
}

/// Wrap matches in the text between tags. Tags and their attributes are
/// copied untouched, and one combined pattern means spans never nest.
pub(super) fn highlight_text_nodes(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 32);
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&HIGHLIGHT.replace_all(&rest[..open], wrap));
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[open..open + close + 1]);
                rest = &rest[open + close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(&HIGHLIGHT.replace_all(rest, wrap));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_each_pattern_kind() {
        assert_eq!(
            highlight_text_nodes("2024-03-01 Badge_A12 #042 Bruteforce"),
            "<span class=\"date\">2024-03-01</span> \
             <span class=\"badge-id\">Badge_A12</span> \
             <span class=\"highlight\">#042</span> \
             <span class=\"alert-text\">Bruteforce</span>"
        );
    }

    #[test]
    fn keywords_match_any_case() {
        assert_eq!(
            highlight_text_nodes("ÉCHEC puis erreur"),
            "<span class=\"alert-text\">ÉCHEC</span> puis <span class=\"alert-text\">erreur</span>"
        );
    }

    #[test]
    fn attributes_are_not_rewritten() {
        let html = "<a href=\"https://h/2024-01-01#123\">x</a>";
        assert_eq!(highlight_text_nodes(html), html);
    }

    #[test]
    fn keyword_is_wrapped_once() {
        let once = highlight_text_nodes("alerte");
        assert_eq!(once, "<span class=\"alert-text\">alerte</span>");
    }
}
