#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

fn split_cells(row: &str) -> Vec<String> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator(row: &str) -> bool {
    let inner = row.trim().trim_matches('|');
    inner.contains('-')
        && inner
            .chars()
            .all(|ch| matches!(ch, '-' | ':' | '|' | ' ' | '\t'))
}

/// Only a first row followed by a separator row is a header. Separator rows
/// never become body rows.
pub(super) fn parse_table(rows: &[String]) -> Table {
    let has_header = rows.len() >= 2 && !is_separator(&rows[0]) && is_separator(&rows[1]);
    let (header, body) = if has_header {
        (Some(split_cells(&rows[0])), &rows[2..])
    } else {
        (None, rows)
    };
    Table {
        header,
        rows: body
            .iter()
            .filter(|row| !is_separator(row))
            .map(|row| split_cells(row))
            .collect(),
    }
}

pub(super) fn render_table(table: &Table, render_cell: &dyn Fn(&str) -> String) -> String {
    let mut html = String::from("<table class=\"markdown-table\">");
    if let Some(header) = &table.header {
        html.push_str("<thead><tr>");
        for cell in header {
            html.push_str("<th>");
            html.push_str(&super::inline::render_inline(cell));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead>");
    }
    html.push_str("<tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&render_cell(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn header_needs_separator() {
        let table = parse_table(&rows(&["| A | B |", "|---|:-:|", "| 1 | 2 |"]));
        assert_eq!(table.header, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);

        let table = parse_table(&rows(&["| A | B |", "| 1 | 2 |"]));
        assert_eq!(table.header, None);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn inner_empty_cells_are_kept() {
        assert_eq!(split_cells("| a || c |"), vec!["a", "", "c"]);
    }

    #[test]
    fn separator_only_table_has_no_rows() {
        let table = parse_table(&rows(&["|---|---|"]));
        assert_eq!(table.header, None);
        assert!(table.rows.is_empty());
        assert_eq!(
            render_table(&table, &|cell| cell.to_string()),
            "<table class=\"markdown-table\"><tbody></tbody></table>"
        );
    }
}
