//! "Interview Agent" screen: the streamed conversation and its input line.

use crossterm::event::{KeyCode, KeyModifiers};
use prepagent_core::assistant::Assistant;
use prepagent_shared::{ChatMessage, ChatRole};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::Action;
use crate::widgets::{field_style, input_field, markdown_lines, spinner, wrap_text};

pub(crate) struct InterviewScreen {
    input: String,
    editing: bool,
    /// Lines scrolled up from the bottom; 0 follows the stream.
    scroll_back: u16,
}

impl InterviewScreen {
    pub(crate) fn new() -> Self {
        Self {
            input: String::new(),
            editing: false,
            scroll_back: 0,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn start_editing(&mut self) {
        self.editing = true;
        self.scroll_back = 0;
    }

    /// Called once a message was accepted.
    pub(crate) fn message_sent(&mut self) {
        self.input.clear();
        self.scroll_back = 0;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, assistant: &Assistant, tick: usize) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(3),    // Conversation
                Constraint::Length(3), // Input
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let width = chunks[0].width.saturating_sub(2) as usize;
        let lines = conversation_lines(assistant.messages(), width, tick);
        let height = chunks[0].height.saturating_sub(2);
        let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let bottom = total.saturating_sub(height);
        let offset = bottom.saturating_sub(self.scroll_back);

        let title = format!(" Interview Agent · {} ", assistant.context_role());
        let web = if assistant.config().chat.web_search {
            " Web search on "
        } else {
            " Web search off "
        };
        let conversation = Paragraph::new(lines).scroll((offset, 0)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(web).right_aligned())
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(conversation, chunks[0]);

        let input_title = if assistant.is_loading() {
            " Waiting for the answer... "
        } else {
            " Ask for a mock question, a case study, or advice "
        };
        f.render_widget(
            input_field(input_title, &self.input, field_style(true, self.editing)),
            chunks[1],
        );

        let hint = if self.editing {
            "Enter to send · Esc to stop typing"
        } else {
            "Enter to type · ↑/↓ PgUp/PgDn scroll · End to follow"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[2],
        );
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        assistant: &Assistant,
    ) -> Action {
        if self.editing {
            match code {
                KeyCode::Esc => self.editing = false,
                KeyCode::Enter => {
                    if self.input.trim().is_empty() {
                        return Action::None;
                    }
                    if assistant.is_loading() {
                        return Action::Status("Still waiting for the previous answer.".into());
                    }
                    return Action::SendMessage(self.input.clone());
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Enter | KeyCode::Char('i') => self.start_editing(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_back = self.scroll_back.saturating_add(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_back = self.scroll_back.saturating_sub(1),
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(10),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),
            KeyCode::End => self.scroll_back = 0,
            _ => {}
        }
        Action::None
    }
}

/// Render messages as styled lines: a role header, the body, then sources.
fn conversation_lines(messages: &[ChatMessage], width: usize, tick: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        let (label, color) = match message.role {
            ChatRole::User => ("You", Color::Green),
            ChatRole::Model => ("Interviewer", Color::Cyan),
        };
        lines.push(Line::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

        if message.is_thinking && message.text.is_empty() {
            lines.push(Line::styled(
                format!("{} Thinking...", spinner(tick)),
                Style::default().fg(Color::Yellow),
            ));
        } else {
            match message.role {
                ChatRole::User => lines.extend(wrap_text(&message.text, width).into_iter().map(Line::from)),
                ChatRole::Model => lines.extend(markdown_lines(&message.text, width)),
            }
        }

        if let Some(sources) = &message.sources {
            lines.push(Line::styled(
                "Sources:",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            ));
            for source in sources {
                lines.push(Line::from(vec![
                    Span::styled(format!("  • {} ", source.title), Style::default().fg(Color::Blue)),
                    Span::styled(source.uri.clone(), Style::default().fg(Color::DarkGray)),
                ]));
            }
        }

        lines.push(Line::default());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use prepagent_gemini::GeminiClient;
    use prepagent_shared::{AppConfig, Source};

    fn assistant() -> Assistant {
        let client = GeminiClient::new("test-key", "http://127.0.0.1:9", std::time::Duration::from_secs(1))
            .unwrap();
        Assistant::new(AppConfig::default(), Arc::new(client))
    }

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn empty_input_is_ignored() {
        let assistant = assistant();
        let mut screen = InterviewScreen::new();
        screen.start_editing();

        screen.handle_key(KeyCode::Char(' '), KeyModifiers::NONE, &assistant);
        assert_eq!(
            screen.handle_key(KeyCode::Enter, KeyModifiers::NONE, &assistant),
            Action::None
        );
    }

    #[test]
    fn enter_sends_typed_message() {
        let assistant = assistant();
        let mut screen = InterviewScreen::new();
        screen.handle_key(KeyCode::Enter, KeyModifiers::NONE, &assistant);
        for c in "Quiz me".chars() {
            screen.handle_key(KeyCode::Char(c), KeyModifiers::NONE, &assistant);
        }
        assert_eq!(
            screen.handle_key(KeyCode::Enter, KeyModifiers::NONE, &assistant),
            Action::SendMessage("Quiz me".into())
        );

        screen.message_sent();
        assert!(screen.input.is_empty());
        assert!(screen.is_editing());
    }

    #[test]
    fn thinking_message_shows_spinner_and_sources_are_listed() {
        let mut answer = ChatMessage::model("Answer");
        answer.sources = Some(vec![Source {
            uri: "https://a.com".into(),
            title: "A".into(),
        }]);
        let mut pending = ChatMessage::model("");
        pending.is_thinking = true;

        let lines: Vec<String> = conversation_lines(&[answer, pending], 40, 0)
            .iter()
            .map(text_of)
            .collect();

        assert!(lines.contains(&"Answer".to_string()));
        assert!(lines.contains(&"Sources:".to_string()));
        assert!(lines.contains(&"  • A https://a.com".to_string()));
        assert!(lines.iter().any(|l| l.ends_with("Thinking...")));
    }
}
