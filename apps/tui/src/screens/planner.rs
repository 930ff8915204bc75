//! "Study Planner" screen: role + job description in, markdown plan out.

use crossterm::event::{KeyCode, KeyModifiers};
use prepagent_core::assistant::Assistant;
use prepagent_shared::StudyPlan;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::Action;
use crate::widgets::{field_style, input_field, markdown_lines, spinner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Role,
    JobDescription,
}

pub(crate) struct PlannerScreen {
    role: String,
    job_description: String,
    focused: Field,
    editing: bool,
    /// Set while a plan request is in flight.
    generating: bool,
    /// Last failure, shown under the form.
    error: Option<String>,
    scroll: u16,
}

impl PlannerScreen {
    pub(crate) fn new() -> Self {
        Self {
            role: String::new(),
            job_description: String::new(),
            focused: Field::Role,
            editing: false,
            generating: false,
            error: None,
            scroll: 0,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn is_generating(&self) -> bool {
        self.generating
    }

    pub(crate) fn set_generating(&mut self) {
        self.generating = true;
        self.editing = false;
        self.error = None;
    }

    pub(crate) fn plan_ready(&mut self) {
        self.generating = false;
        self.scroll = 0;
    }

    pub(crate) fn plan_failed(&mut self, notice: String) {
        self.generating = false;
        self.error = Some(notice);
    }

    /// Back to the form with the previous inputs kept.
    pub(crate) fn edit_inputs(&mut self, previous: Option<StudyPlan>) {
        if let Some(plan) = previous {
            self.role = plan.role;
            self.job_description = plan.job_description;
        }
        self.focused = Field::Role;
        self.scroll = 0;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, assistant: &Assistant, tick: usize) {
        match assistant.plan() {
            Some(plan) => self.draw_plan(f, area, plan),
            None => self.draw_form(f, area, assistant, tick),
        }
    }

    fn draw_form(&self, f: &mut Frame, area: Rect, assistant: &Assistant, tick: usize) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Role
                Constraint::Min(6),    // JD
                Constraint::Length(2), // Hint
                Constraint::Length(3), // Status
            ])
            .split(area);

        let style = |field| field_style(self.focused == field, self.editing);
        f.render_widget(
            input_field(
                " Target Role (e.g. Senior Product Manager) ",
                &self.role,
                style(Field::Role),
            ),
            chunks[0],
        );
        f.render_widget(
            input_field(
                " Job Description (paste the full JD) ",
                &self.job_description,
                style(Field::JobDescription),
            ),
            chunks[1],
        );

        let hint = if self.editing {
            "Type to edit · Enter for newline in JD · Esc to stop editing"
        } else {
            "Enter to edit · Tab to next field · g to generate plan"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[2],
        );

        let status = if self.generating {
            Paragraph::new(format!(
                "{} Analyzing your knowledge base against the job description...",
                spinner(tick)
            ))
            .style(Style::default().fg(Color::Yellow))
        } else if let Some(err) = &self.error {
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red))
        } else {
            Paragraph::new(format!(
                "{} note(s) in your knowledge base will be used.",
                assistant.knowledge().len()
            ))
        };
        f.render_widget(
            status.block(Block::default().borders(Borders::ALL).title(" Status ")),
            chunks[3],
        );
    }

    fn draw_plan(&self, f: &mut Frame, area: Rect, plan: &StudyPlan) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let width = chunks[0].width.saturating_sub(2) as usize;
        let body = Paragraph::new(markdown_lines(&plan.generated_plan, width))
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Study Plan: {} ", plan.role))
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(body, chunks[0]);

        f.render_widget(
            Paragraph::new("↑/↓ PgUp/PgDn scroll · e edit inputs · i start mock interview")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[1],
        );
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        assistant: &Assistant,
    ) -> Action {
        if assistant.plan().is_some() {
            return self.handle_plan_key(code);
        }
        if self.editing {
            self.handle_edit_key(code);
            return Action::None;
        }

        match code {
            KeyCode::Enter => self.editing = true,
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => self.toggle_field(),
            KeyCode::Char('g') => {
                if self.generating {
                    return Action::Status("A plan is already being generated.".into());
                }
                return Action::GeneratePlan {
                    role: self.role.clone(),
                    job_description: self.job_description.clone(),
                };
            }
            _ => {}
        }
        Action::None
    }

    fn handle_plan_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home => self.scroll = 0,
            KeyCode::Char('e') => return Action::EditInputs,
            KeyCode::Char('i') => return Action::StartInterview,
            _ => {}
        }
        Action::None
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.editing = false,
            KeyCode::Tab => {
                self.editing = false;
                self.toggle_field();
            }
            KeyCode::Enter => match self.focused {
                Field::Role => self.focused = Field::JobDescription,
                Field::JobDescription => self.job_description.push('\n'),
            },
            KeyCode::Backspace => {
                self.current_field_mut().pop();
            }
            KeyCode::Char(c) => self.current_field_mut().push(c),
            _ => {}
        }
    }

    fn current_field_mut(&mut self) -> &mut String {
        match self.focused {
            Field::Role => &mut self.role,
            Field::JobDescription => &mut self.job_description,
        }
    }

    fn toggle_field(&mut self) {
        self.focused = match self.focused {
            Field::Role => Field::JobDescription,
            Field::JobDescription => Field::Role,
        };
    }
}
