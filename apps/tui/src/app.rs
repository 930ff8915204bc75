//! Core TUI application state and event loop.

use std::io;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use prepagent_core::assistant::Assistant;
use prepagent_core::plan::plan_error_notice;
use prepagent_shared::ChatMessage;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::event::AppEvent;
use crate::screens::{Action, InterviewScreen, KnowledgeScreen, PlannerScreen, ScreenId};
use crate::widgets::status_bar;

/// Application state.
pub(crate) struct App {
    assistant: Assistant,
    /// Currently active screen tab.
    active_tab: usize,
    screens: [ScreenId; 3],
    should_quit: bool,
    /// Status message shown in bottom bar.
    status: String,
    show_help: bool,
    knowledge: KnowledgeScreen,
    planner: PlannerScreen,
    interview: InterviewScreen,
    /// Animation counter, advanced on every tick.
    tick: usize,
    sender: UnboundedSender<AppEvent>,
}

impl App {
    pub(crate) fn new(assistant: Assistant, sender: UnboundedSender<AppEvent>) -> Self {
        Self {
            assistant,
            active_tab: 0,
            screens: [ScreenId::Knowledge, ScreenId::Planner, ScreenId::Interview],
            should_quit: false,
            status: "Ready · press ? for help".to_string(),
            show_help: false,
            knowledge: KnowledgeScreen::new(),
            planner: PlannerScreen::new(),
            interview: InterviewScreen::new(),
            tick: 0,
            sender,
        }
    }

    fn current_screen(&self) -> ScreenId {
        self.screens[self.active_tab]
    }

    fn is_editing(&self) -> bool {
        match self.current_screen() {
            ScreenId::Knowledge => self.knowledge.is_editing(),
            ScreenId::Planner => self.planner.is_editing(),
            ScreenId::Interview => self.interview.is_editing(),
        }
    }

    fn select_tab(&mut self, idx: usize) {
        self.active_tab = idx;
        self.status = self.screens[idx].to_string();
    }

    /// Apply one event. Returns false once the app should exit.
    fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Input(key) => {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code, key.modifiers);
                }
            }
            AppEvent::Tick => self.tick = self.tick.wrapping_add(1),
            AppEvent::PlanReady(Ok(plan)) => {
                self.planner.plan_ready();
                self.status = format!("Study plan ready for {}", plan.role);
                self.assistant.set_plan(plan);
            }
            AppEvent::PlanReady(Err(e)) => {
                error!(error = %e, "plan generation failed");
                self.planner.plan_failed(plan_error_notice(&e));
                self.status = "Plan generation failed".to_string();
            }
            AppEvent::Snapshot(snapshot) => {
                self.assistant.apply_snapshot(snapshot);
            }
            AppEvent::TurnFinished(outcome) => {
                if outcome.is_failure() {
                    self.status = "The interviewer could not answer".to_string();
                }
                self.assistant.finish_turn(outcome);
            }
        }
        !self.should_quit
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        // Global keybindings (always active)
        match code {
            KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('q') if !self.is_editing() => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') if !self.is_editing() => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            KeyCode::Char(c @ '1'..='3') if !self.is_editing() => {
                self.select_tab((c as usize) - ('1' as usize));
                return;
            }
            KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => {
                self.select_tab((self.active_tab + 1) % self.screens.len());
                return;
            }
            KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => {
                self.select_tab((self.active_tab + self.screens.len() - 1) % self.screens.len());
                return;
            }
            _ => {}
        }

        // If help is showing, consume any key to dismiss
        if self.show_help {
            self.show_help = false;
            return;
        }

        let action = match self.current_screen() {
            ScreenId::Knowledge => self.knowledge.handle_key(code, modifiers, &self.assistant),
            ScreenId::Planner => self.planner.handle_key(code, modifiers, &self.assistant),
            ScreenId::Interview => self.interview.handle_key(code, modifiers, &self.assistant),
        };
        self.dispatch(action);
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Status(msg) => self.status = msg,
            Action::AddSnippet { title, content } => {
                match self.assistant.add_snippet(&title, &content) {
                    Ok(_) => {
                        self.knowledge.clear_note();
                        self.status = format!("Added \"{title}\" to your knowledge base");
                    }
                    Err(e) => self.status = e.to_string(),
                }
            }
            Action::ImportFile(path) => match self.assistant.import_snippet(&path) {
                Ok(_) => {
                    self.knowledge.clear_import();
                    self.status = format!("Imported {}", path.display());
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "import failed");
                    self.status = e.to_string();
                }
            },
            Action::RemoveSnippet(id) => {
                if let Some(removed) = self.assistant.remove_snippet(&id) {
                    self.status = format!("Removed \"{}\"", removed.title);
                }
            }
            Action::GeneratePlan {
                role,
                job_description,
            } => self.spawn_plan(&role, &job_description),
            Action::EditInputs => {
                let previous = self.assistant.clear_plan();
                self.planner.edit_inputs(previous);
                self.status = "Editing plan inputs".to_string();
            }
            Action::StartInterview => {
                if let Some(idx) = self.screens.iter().position(|s| *s == ScreenId::Interview) {
                    self.select_tab(idx);
                }
                self.interview.start_editing();
            }
            Action::SendMessage(text) => self.spawn_turn(&text),
        }
    }

    fn spawn_plan(&mut self, role: &str, job_description: &str) {
        if self.planner.is_generating() {
            return;
        }
        let request = match self.assistant.plan_request(role, job_description) {
            Ok(request) => request,
            Err(e) => {
                self.planner.plan_failed(plan_error_notice(&e));
                return;
            }
        };

        info!(role = %request.role(), "generating study plan");
        self.planner.set_generating();
        self.status = "Generating study plan...".to_string();

        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = request.run().await;
            let _ = sender.send(AppEvent::PlanReady(result));
        });
    }

    fn spawn_turn(&mut self, text: &str) {
        let request = match self.assistant.begin_turn(text) {
            Ok(request) => request,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        self.interview.message_sent();
        debug!(id = %request.message_id(), "chat turn started");

        let sender = self.sender.clone();
        tokio::spawn(async move {
            let snapshots = sender.clone();
            let mut publish = move |message: &ChatMessage| {
                let _ = snapshots.send(AppEvent::Snapshot(message.clone()));
            };
            let outcome = request.run(&mut publish).await;
            let _ = sender.send(AppEvent::TurnFinished(outcome));
        });
    }
}

/// Entry point: sets up the terminal, runs the event loop, restores the terminal.
pub(crate) async fn run(assistant: Assistant) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, assistant).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    assistant: Assistant,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());

    let mut app = App::new(assistant, tx);

    loop {
        terminal.draw(|f| draw(f, &app))?;

        let Some(event) = rx.recv().await else { break };
        if !app.handle_event(event) {
            break;
        }
        // Drain whatever else is queued so bursts of snapshots share one draw.
        while let Ok(event) = rx.try_recv() {
            if !app.handle_event(event) {
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Read terminal input on a blocking thread and forward key presses.
fn spawn_input_handler(sender: UnboundedSender<AppEvent>) {
    tokio::task::spawn_blocking(move || {
        loop {
            match event::poll(Duration::from_millis(50)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if sender.send(AppEvent::Input(key)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "terminal read failed");
                        break;
                    }
                },
                Ok(false) => {
                    if sender.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "terminal poll failed");
                    break;
                }
            }
        }
    });
}

/// Periodic tick for the spinner.
fn spawn_tick(sender: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(120));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let tab_titles: Vec<Line> = app
        .screens
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{} {s}", i + 1)))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" PrepAgent "))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");
    f.render_widget(tabs, chunks[0]);

    match app.current_screen() {
        ScreenId::Knowledge => app.knowledge.draw(f, chunks[1], &app.assistant),
        ScreenId::Planner => app.planner.draw(f, chunks[1], &app.assistant, app.tick),
        ScreenId::Interview => app.interview.draw(f, chunks[1], &app.assistant, app.tick),
    }

    f.render_widget(status_bar(&app.status), chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-3          Switch to screen"),
        Line::from("  Ctrl-←/→     Previous/next screen"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Knowledge Base:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Enter        Edit field / import file"),
        Line::from("  s            Save note"),
        Line::from("  d            Delete selected note"),
        Line::from(""),
        Line::from("Study Planner:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  g            Generate plan"),
        Line::from("  e / i        Edit inputs / start mock interview"),
        Line::from(""),
        Line::from("Interview Agent:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Enter        Type / send message"),
        Line::from("  ↑/↓ End      Scroll / follow the answer"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help · press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
