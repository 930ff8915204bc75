//! Reusable TUI widgets and text helpers.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Spinner frame for the given tick.
pub(crate) fn spinner(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

/// Border style for a form field: yellow while editing, cyan when focused.
pub(crate) fn field_style(focused: bool, editing: bool) -> Style {
    match (focused, editing) {
        (true, true) => Style::default().fg(Color::Yellow),
        (true, false) => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
}

/// A bordered single- or multi-line input showing `value`.
pub(crate) fn input_field<'a>(title: &'a str, value: &'a str, style: Style) -> Paragraph<'a> {
    Paragraph::new(value)
        .wrap(ratatui::widgets::Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title).border_style(style))
}

/// Greedy word wrap by character count. Blank lines are kept.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for raw in text.lines() {
        if raw.is_empty() {
            out.push(String::new());
            continue;
        }
        let mut line = String::new();
        let mut len = 0usize;
        for word in raw.split(' ') {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            // Hard-split words longer than the line.
            let mut rest: Vec<char> = word.chars().collect();
            while len + rest.len() > width {
                let take = width - len;
                line.extend(rest.drain(..take));
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            len += rest.len();
            line.extend(rest);
        }
        out.push(line);
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Light markdown styling for plan and chat text: headings, bullets and
/// fenced code. Everything else is wrapped as plain text.
pub(crate) fn markdown_lines(text: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();
        if trimmed.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            lines.push(Line::styled(format!("  {raw}"), Style::default().fg(Color::Green)));
            continue;
        }

        let heading = trimmed.chars().take_while(|c| *c == '#').count();
        if heading > 0 && trimmed[heading..].starts_with(' ') {
            let title = trimmed[heading..].trim().replace("**", "");
            let style = match heading {
                1 => Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                _ => Style::default().add_modifier(Modifier::BOLD),
            };
            for part in wrap_text(&title, width) {
                lines.push(Line::styled(part, style));
            }
            continue;
        }

        let bullet = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "));
        match bullet {
            Some(item) => {
                let indent = raw.len() - trimmed.len();
                let prefix = format!("{}• ", " ".repeat(indent));
                let pad = " ".repeat(prefix.chars().count());
                let body = wrap_text(item, width.saturating_sub(pad.len()));
                for (i, part) in body.into_iter().enumerate() {
                    let lead = if i == 0 { prefix.clone() } else { pad.clone() };
                    lines.push(Line::from(format!("{lead}{part}")));
                }
            }
            None => {
                for part in wrap_text(raw, width) {
                    lines.push(Line::from(part));
                }
            }
        }
    }

    lines
}
