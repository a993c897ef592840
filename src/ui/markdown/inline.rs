use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid link pattern"));

/// Emphasis rules, applied in order. The triple form must run first so
/// `***x***` does not turn into nested partial tags.
static EMPHASIS: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (r"\*\*\*(.+?)\*\*\*", "<strong><em>${1}</em></strong>"),
        (r"\*\*(.+?)\*\*", "<strong>${1}</strong>"),
        (r"\*(.+?)\*", "<em>${1}</em>"),
    ]
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid emphasis pattern"),
            replacement,
        )
    })
});

/// Render one line of text: escape, then links, then emphasis.
pub(super) fn render_inline(line: &str) -> String {
    let mut html = String::with_capacity(line.len());
    let mut last = 0;
    for caps in LINK.captures_iter(line) {
        let (Some(whole), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        html.push_str(&emphasize(&escape_html(&line[last..whole.start()])));
        html.push_str(&render_link(label.as_str(), url.as_str()));
        last = whole.end();
    }
    html.push_str(&emphasize(&escape_html(&line[last..])));
    html
}

fn render_link(label: &str, url: &str) -> String {
    let label = emphasize(&escape_html(label));
    if is_script_url(url) {
        return label;
    }
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{label}</a>",
        escape_html(url)
    )
}

fn is_script_url(url: &str) -> bool {
    let lowered = url.trim().to_ascii_lowercase();
    lowered.starts_with("javascript:") || lowered.starts_with("data:")
}

fn emphasize(text: &str) -> String {
    EMPHASIS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_levels() {
        assert_eq!(render_inline("***both***"), "<strong><em>both</em></strong>");
        assert_eq!(render_inline("a **b** c"), "a <strong>b</strong> c");
        assert_eq!(render_inline("an *aside*"), "an <em>aside</em>");
    }

    #[test]
    fn dangling_markers_are_left_alone() {
        assert_eq!(render_inline("**bol"), "**bol");
        assert_eq!(render_inline("trailing *"), "trailing *");
    }

    #[test]
    fn links_open_in_new_tab() {
        assert_eq!(
            render_inline("see [docs](https://example.com/a)"),
            "see <a href=\"https://example.com/a\" target=\"_blank\" rel=\"noopener\">docs</a>"
        );
    }

    #[test]
    fn emphasis_does_not_touch_link_targets() {
        let html = render_inline("[x](https://h/a*b*c) and *y*");
        assert!(html.contains("href=\"https://h/a*b*c\""));
        assert!(html.ends_with("and <em>y</em>"));
    }

    #[test]
    fn script_urls_render_as_text() {
        assert_eq!(render_inline("[click](JavaScript:void)"), "click");
        assert_eq!(render_inline("[x](data:text/html,hi) y"), "x y");
    }

    #[test]
    fn text_is_escaped_before_markup() {
        assert_eq!(
            render_inline("<b>not bold</b> & **bold**"),
            "&lt;b&gt;not bold&lt;/b&gt; &amp; <strong>bold</strong>"
        );
    }
}
