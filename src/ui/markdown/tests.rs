use super::*;

fn plain(text: &str) -> String {
    render_markdown(text, &RenderOptions::plain())
}

fn report(text: &str) -> String {
    render_markdown(text, &RenderOptions::report())
}

#[test]
fn heading_and_paragraph() {
    let html = plain("# Title\n\nHello **world**");
    assert!(html.contains("<h1 id=\"title\">Title</h1>"));
    assert!(html.contains("<p>Hello <strong>world</strong></p>"));
}

#[test]
fn heading_slugs_collapse_punctuation() {
    assert_eq!(slugify("Key Findings: 2024"), "key-findings-2024");
    assert_eq!(slugify("Résumé"), "r-sum-");
    assert!(plain("### A & B").contains("<h3 id=\"a-b\">A &amp; B</h3>"));
}

#[test]
fn pipe_table_with_header() {
    let html = plain("| A | B |\n|---|---|\n| 1 | 2 |\n");
    assert!(html.contains("<thead><tr><th>A</th><th>B</th></tr></thead>"));
    assert!(html.contains("<tbody><tr><td>1</td><td>2</td></tr></tbody>"));
    assert!(html.starts_with("<table class=\"markdown-table\">"));
}

#[test]
fn fenced_code_is_escaped_and_untouched() {
    let html = report("```html\n<b>**not bold**</b> 2024-01-01\n```");
    assert_eq!(
        html,
        "<pre><code class=\"language-html\">&lt;b&gt;**not bold**&lt;/b&gt; 2024-01-01</code></pre>"
    );
}

#[test]
fn list_items_are_wrapped_in_one_list() {
    let html = plain("- first\n- second\n1. third");
    assert_eq!(
        html,
        "<ul><li>first</li><li>second</li><li>third</li></ul>"
    );
}

#[test]
fn quotes_and_rules() {
    assert_eq!(
        plain("> one\n> two\n---"),
        "<blockquote>one<br>two</blockquote>\n<hr>"
    );
}

#[test]
fn paragraph_lines_keep_breaks() {
    assert_eq!(plain("line one\nline two\n\nnext"), "<p>line one<br>line two</p>\n<p>next</p>");
}

#[test]
fn raw_html_never_passes_through() {
    let html = plain("<script>alert(1)</script>");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn report_mode_highlights_only_text_nodes() {
    let html = report(
        "## Incident 2024-05-02\n\nBadge_X9 failed with erreur at #101\n\n| When | What |\n|---|---|\n| 2024-05-02 | Suspect |",
    );
    // Headings stay plain.
    assert!(html.contains("<h2 id=\"incident-2024-05-02\">Incident 2024-05-02</h2>"));
    assert!(html.contains("<span class=\"badge-id\">Badge_X9</span>"));
    assert!(html.contains("<span class=\"alert-text\">erreur</span>"));
    assert!(html.contains("<span class=\"highlight\">#101</span>"));
    assert!(html.contains("<td><span class=\"date\">2024-05-02</span></td>"));
    assert!(html.contains("<td><span class=\"alert-text\">Suspect</span></td>"));
}

#[test]
fn plain_mode_never_highlights() {
    assert!(!plain("erreur 2024-01-01").contains("<span"));
}

#[test]
fn link_urls_survive_highlighting() {
    let html = report("[log](https://h/2024-01-01/#123)");
    assert!(html.contains("href=\"https://h/2024-01-01/#123\""));
}

#[test]
fn rendering_is_deterministic() {
    let text = "# T\n\n- a **b**\n\n| x |\n|---|\n| 1 |\n\n```\ncode\n```";
    assert_eq!(report(text), report(text));
}

#[test]
fn every_prefix_renders_without_panicking() {
    let text = "# Report\n\n| A | B |\n|---|---|\n| **x** | [l](http://a) |\n\n```rust\nfn main() {}\n```\n> done ***now***";
    for (index, _) in text.char_indices() {
        let html = report(&text[..index]);
        assert_eq!(
            html.matches("<table").count(),
            html.matches("</table>").count()
        );
        assert_eq!(html.matches("<pre>").count(), html.matches("</pre>").count());
        assert_eq!(
            html.matches("<strong>").count(),
            html.matches("</strong>").count()
        );
    }
}

#[test]
fn half_written_table_row_still_renders() {
    let html = plain("| A | B |\n|---|---|\n| 1 |");
    assert!(html.contains("<td>1</td>"));
}

#[test]
fn crlf_input_matches_lf_input() {
    assert_eq!(plain("a\r\nb\r\n\r\n- c"), plain("a\nb\n\n- c"));
}

#[test]
fn empty_input_renders_nothing() {
    assert_eq!(plain(""), "");
    assert_eq!(plain("\n\n"), "");
}
