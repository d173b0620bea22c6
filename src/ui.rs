use ratatui::{prelude::*, widgets::*};

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Simple JSON syntax highlighting, one line at a time
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    text.lines().map(highlight_json_line).collect()
}

fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut word = String::new();
    let mut chars = line.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '"' => {
                flush_word(&mut spans, &mut word);
                // Unterminated strings run to the end of the line
                let mut end = line.len();
                let mut escaped = false;
                for (i, c) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        end = i + 1;
                        break;
                    }
                }
                // A key is a string followed by ':'
                let color = if line[end..].trim_start().starts_with(':') {
                    Color::Cyan
                } else {
                    Color::Green
                };
                spans.push(Span::styled(
                    line[start..end].to_string(),
                    Style::default().fg(color),
                ));
            }
            '{' | '}' | '[' | ']' => {
                flush_word(&mut spans, &mut word);
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
            }
            ':' => {
                flush_word(&mut spans, &mut word);
                spans.push(Span::styled(":", Style::default().fg(Color::White)));
            }
            ',' => {
                flush_word(&mut spans, &mut word);
                spans.push(Span::raw(","));
            }
            c if c.is_whitespace() => {
                flush_word(&mut spans, &mut word);
                spans.push(Span::raw(c.to_string()));
            }
            _ => word.push(c),
        }
    }
    flush_word(&mut spans, &mut word);

    Line::from(spans)
}

/// Push a bare word: literals and numbers are colored
fn flush_word(spans: &mut Vec<Span<'static>>, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let is_number = word.starts_with(|c: char| c.is_ascii_digit() || c == '-')
        && word.parse::<f64>().is_ok();
    let style = match word.as_str() {
        "true" | "false" | "null" => Style::default().fg(Color::Magenta),
        _ if is_number => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    spans.push(Span::styled(std::mem::take(word), style));
}

/// Color of a card's state badge
pub fn outcome_color(state: &str) -> Color {
    match state {
        "running" => Color::Yellow,
        "succeeded" => Color::Green,
        "failed" => Color::Red,
        _ => Color::DarkGray,
    }
}

/// Color of a balance row
pub fn balance_color(pending: bool) -> Color {
    if pending {
        Color::DarkGray
    } else {
        Color::Green
    }
}

/// Color for a field kind tag
pub fn field_kind_color(kind: &str) -> Color {
    match kind {
        "network" => Color::Magenta,
        "select" => Color::Cyan,
        "number" => Color::Yellow,
        "json" => Color::Blue,
        _ => Color::White,
    }
}
