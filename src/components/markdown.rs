//! Markdown to styled lines
//!
//! Covers what the assistant actually sends: headings, bullet and numbered
//! lists, bold, italic, inline code and fenced code blocks. Fenced `sql`
//! blocks get keyword highlighting. Pipe tables are left to the grid.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "OUTER", "ON", "AS", "AND",
    "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "IS", "NULL", "GROUP", "BY", "HAVING",
    "ORDER", "ASC", "DESC", "LIMIT", "OFFSET", "WITH", "CASE", "WHEN", "THEN", "ELSE", "END",
    "DISTINCT", "UNION", "ALL", "COUNT", "SUM", "AVG", "MIN", "MAX", "CAST", "COALESCE", "TOP",
];

/// Render markdown text into lines ready for a `Paragraph`
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    // Some(language) while inside a fenced block
    let mut fence: Option<String> = None;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if let Some(rest) = trimmed.strip_prefix("```") {
            fence = match fence {
                Some(_) => None,
                None => Some(rest.trim().to_lowercase()),
            };
            continue;
        }

        if let Some(language) = &fence {
            if language == "sql" {
                lines.push(highlight_sql_line(raw));
            } else {
                lines.push(Line::from(Span::styled(
                    raw.to_string(),
                    Style::default().fg(Color::Gray),
                )));
            }
            continue;
        }

        lines.push(render_block_line(trimmed));
    }

    lines
}

fn render_block_line(line: &str) -> Line<'static> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        return Line::from(Span::styled(
            line[hashes..].trim().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Yellow))];
        spans.extend(render_inline(item));
        return Line::from(spans);
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && line[digits..].starts_with(". ") {
        let mut spans = vec![Span::styled(
            format!("  {}. ", &line[..digits]),
            Style::default().fg(Color::Yellow),
        )];
        spans.extend(render_inline(&line[digits + 2..]));
        return Line::from(spans);
    }

    Line::from(render_inline(line))
}

/// Inline emphasis: `**bold**`, `*italic*` and `` `code` ``
///
/// Underscores are left alone; field names like `user_key` are common.
fn render_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let marker = if rest.starts_with("**") {
            Some(("**", Style::default().add_modifier(Modifier::BOLD)))
        } else if rest.starts_with('`') {
            Some(("`", Style::default().fg(Color::Green)))
        } else if rest.starts_with('*') {
            Some(("*", Style::default().add_modifier(Modifier::ITALIC)))
        } else {
            None
        };

        if let Some((delim, style)) = marker {
            let body = &rest[delim.len()..];
            if let Some(end) = body.find(delim).filter(|&end| end > 0) {
                if !plain.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut plain)));
                }
                spans.push(Span::styled(body[..end].to_string(), style));
                rest = &body[end + delim.len()..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            plain.push(c);
        }
        rest = chars.as_str();
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }
    spans
}

fn highlight_sql_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut word = String::new();
    let mut in_string = false;

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>| {
        if word.is_empty() {
            return;
        }
        let style = if SQL_KEYWORDS.contains(&word.to_uppercase().as_str()) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if word.chars().all(|c| c.is_ascii_digit() || c == '.') {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(std::mem::take(word), style));
    };

    for c in line.chars() {
        if in_string {
            word.push(c);
            if c == '\'' {
                spans.push(Span::styled(
                    std::mem::take(&mut word),
                    Style::default().fg(Color::Green),
                ));
                in_string = false;
            }
        } else if c == '\'' {
            flush(&mut word, &mut spans);
            word.push(c);
            in_string = true;
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
        } else {
            flush(&mut word, &mut spans);
            spans.push(Span::styled(c.to_string(), Style::default().fg(Color::Gray)));
        }
    }

    if in_string {
        spans.push(Span::styled(word, Style::default().fg(Color::Green)));
    } else {
        flush(&mut word, &mut spans);
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_heading_and_list() {
        let lines = render_markdown("## Results\n- first\n2. second");
        assert_eq!(plain(&lines[0]), "Results");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(plain(&lines[1]), "  • first");
        assert_eq!(plain(&lines[2]), "  2. second");
    }

    #[test]
    fn test_inline_emphasis() {
        let spans = render_inline("Found **12** clients in *Austin*");
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[1].content, "12");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[3].content, "Austin");
        assert!(spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_unclosed_marker_is_plain() {
        let spans = render_inline("2 * 3 = 6");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "2 * 3 = 6");
    }

    #[test]
    fn test_fenced_sql_block() {
        let lines = render_markdown("Query:\n```sql\nSELECT name FROM users WHERE id = 'a b'\n```\nDone");
        assert_eq!(lines.len(), 3);
        let sql = &lines[1];
        assert_eq!(plain(sql), "SELECT name FROM users WHERE id = 'a b'");
        assert_eq!(sql.spans[0].content, "SELECT");
        assert_eq!(sql.spans[0].style.fg, Some(Color::Cyan));
        let literal = sql.spans.iter().find(|s| s.content == "'a b'");
        assert!(literal.is_some());
        assert_eq!(plain(&lines[2]), "Done");
    }

    #[test]
    fn test_multibyte_text() {
        let lines = render_markdown("Café – **résumé**");
        assert_eq!(plain(&lines[0]), "Café – résumé");
    }
}
