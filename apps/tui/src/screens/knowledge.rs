//! "Knowledge Base" screen: add notes, import files, browse and delete.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use prepagent_core::assistant::Assistant;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::Action;
use crate::widgets::{field_style, input_field};

/// Which part of the screen is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Content,
    Import,
    List,
}

pub(crate) struct KnowledgeScreen {
    title: String,
    content: String,
    import_path: String,
    focused: Field,
    editing: bool,
    selected: usize,
}

impl KnowledgeScreen {
    pub(crate) fn new() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            import_path: String::new(),
            focused: Field::Title,
            editing: false,
            selected: 0,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    /// Reset the note form after a successful add.
    pub(crate) fn clear_note(&mut self) {
        self.title.clear();
        self.content.clear();
        self.editing = false;
        self.focused = Field::Title;
    }

    pub(crate) fn clear_import(&mut self) {
        self.import_path.clear();
        self.editing = false;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, assistant: &Assistant) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let form = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(5),    // Content
                Constraint::Length(3), // Import path
                Constraint::Length(2), // Hint
            ])
            .split(columns[0]);

        let style = |field| field_style(self.focused == field, self.editing);
        f.render_widget(
            input_field(" Topic / Title ", &self.title, style(Field::Title)),
            form[0],
        );
        f.render_widget(
            input_field(" Content ", &self.content, style(Field::Content)),
            form[1],
        );
        f.render_widget(
            input_field(" Import file (path) ", &self.import_path, style(Field::Import)),
            form[2],
        );

        let hint = match (self.editing, self.focused) {
            (true, Field::Content) => "Enter for newline · Esc to stop editing",
            (true, Field::Import) => "Enter to import · Esc to cancel",
            (true, _) => "Type to edit · Esc to stop · Tab to next field",
            (false, Field::List) => "↑/↓ select · d to delete · Tab to next field",
            (false, _) => "Enter to edit · s to save note · Tab to next field",
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            form[3],
        );

        self.draw_list(f, columns[1], assistant);
    }

    fn draw_list(&self, f: &mut Frame, area: Rect, assistant: &Assistant) {
        let snippets = assistant.knowledge().list();
        let border = field_style(self.focused == Field::List, false);

        if snippets.is_empty() {
            let empty = Paragraph::new(
                "Your knowledge base is empty.\n\nAdd notes, copy-paste from docs, \
                 or import a text file to get started.",
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Your Knowledge Base (0) ")
                    .border_style(border),
            );
            f.render_widget(empty, area);
            return;
        }

        let preview_width = area.width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = snippets
            .iter()
            .map(|s| {
                let preview: String = s
                    .content
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .chars()
                    .take(preview_width)
                    .collect();
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(s.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(
                            format!("  {}", s.date_added.with_timezone(&chrono::Local).format("%Y-%m-%d")),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]),
                    Line::styled(preview, Style::default().fg(Color::Gray)),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Your Knowledge Base ({}) ", snippets.len()))
                    .border_style(border),
            )
            .highlight_style(Style::default().fg(Color::Cyan))
            .highlight_symbol("▸ ");

        let mut state = ListState::default();
        if self.focused == Field::List {
            state.select(Some(self.selected.min(snippets.len() - 1)));
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        assistant: &Assistant,
    ) -> Action {
        if self.editing {
            return self.handle_edit_key(code);
        }

        let count = assistant.knowledge().len();
        match code {
            KeyCode::Enter if self.focused != Field::List => self.editing = true,
            KeyCode::Tab | KeyCode::Down if self.focused != Field::List => self.next_field(),
            KeyCode::BackTab => self.prev_field(),
            KeyCode::Tab => self.next_field(),
            KeyCode::Up if self.focused == Field::List => {
                if self.selected > 0 {
                    self.selected -= 1;
                } else {
                    self.prev_field();
                }
            }
            KeyCode::Down | KeyCode::Char('j') if self.focused == Field::List => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') if self.focused == Field::List => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Up => self.prev_field(),
            KeyCode::Char('d') | KeyCode::Delete if self.focused == Field::List => {
                if let Some(snippet) = assistant.knowledge().list().get(self.selected) {
                    let id = snippet.id;
                    if self.selected + 1 >= count {
                        self.selected = self.selected.saturating_sub(1);
                    }
                    return Action::RemoveSnippet(id);
                }
            }
            KeyCode::Char('s') => return self.save_note(),
            _ => {}
        }
        Action::None
    }

    fn handle_edit_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => self.editing = false,
            KeyCode::Tab => {
                self.editing = false;
                self.next_field();
            }
            KeyCode::Enter => match self.focused {
                Field::Title => {
                    self.focused = Field::Content;
                }
                Field::Content => self.content.push('\n'),
                Field::Import => {
                    let path = self.import_path.trim();
                    if path.is_empty() {
                        return Action::Status("Type a file path to import.".into());
                    }
                    return Action::ImportFile(expand_home(path));
                }
                Field::List => {}
            },
            KeyCode::Backspace => {
                if let Some(field) = self.current_field_mut() {
                    field.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.current_field_mut() {
                    field.push(c);
                }
            }
            _ => {}
        }
        Action::None
    }

    fn save_note(&mut self) -> Action {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Action::Status("A note needs both a title and some content.".into());
        }
        Action::AddSnippet {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }

    fn current_field_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            Field::Title => Some(&mut self.title),
            Field::Content => Some(&mut self.content),
            Field::Import => Some(&mut self.import_path),
            Field::List => None,
        }
    }

    fn next_field(&mut self) {
        self.focused = match self.focused {
            Field::Title => Field::Content,
            Field::Content => Field::Import,
            Field::Import => Field::List,
            Field::List => Field::Title,
        };
    }

    fn prev_field(&mut self) {
        self.focused = match self.focused {
            Field::Title => Field::List,
            Field::Content => Field::Title,
            Field::Import => Field::Content,
            Field::List => Field::Import,
        };
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
