use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::cell::RefCell;
use std::io::stdout;
use tracing::debug;

use crate::display::{self, truncate};
use crate::filter::{self, CandidateFilter, EmployeeFilter};
use crate::gateway::Gateway;
use crate::indeed;
use crate::models::{AdminApproval, Candidate, Employee, PipelineStatus};
use crate::mutation::{Confirmed, Coordinator, Notice, Notify};
use crate::pipeline::{self, CandidateAction, Decision, STAGES};
use crate::store::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Candidates,
    Employees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Search,
    ConfirmDelete(i64),
}

#[derive(Default)]
struct StatusLine {
    notice: RefCell<Option<Notice>>,
}

impl Notify for StatusLine {
    fn notify(&self, notice: Notice) {
        *self.notice.borrow_mut() = Some(notice);
    }
}

struct AppState {
    screen: Screen,
    mode: Mode,
    candidates: Collection<Candidate>,
    candidate_filter: CandidateFilter,
    employees: Collection<Employee>,
    employee_filter: EmployeeFilter,
    detail: Option<Employee>,
    selected: usize,
    scroll_offset: u16,
}

impl AppState {
    fn new() -> Self {
        Self {
            screen: Screen::Candidates,
            mode: Mode::Normal,
            candidates: Collection::new(),
            candidate_filter: CandidateFilter::default(),
            employees: Collection::new(),
            employee_filter: EmployeeFilter::default(),
            detail: None,
            selected: 0,
            scroll_offset: 0,
        }
    }

    fn visible_candidates(&self) -> Vec<&Candidate> {
        filter::apply(self.candidates.items(), &self.candidate_filter)
    }

    fn visible_employees(&self) -> Vec<&Employee> {
        filter::apply(self.employees.items(), &self.employee_filter)
    }

    fn visible_len(&self) -> usize {
        match self.screen {
            Screen::Candidates => self.visible_candidates().len(),
            Screen::Employees => self.visible_employees().len(),
        }
    }

    fn current_candidate(&self) -> Option<&Candidate> {
        self.visible_candidates().get(self.selected).copied()
    }

    fn current_employee(&self) -> Option<&Employee> {
        self.visible_employees().get(self.selected).copied()
    }

    fn current_id(&self) -> Option<i64> {
        match self.screen {
            Screen::Candidates => self.current_candidate().map(|c| c.id),
            Screen::Employees => self.current_employee().map(|e| e.id),
        }
    }

    fn search_mut(&mut self) -> &mut String {
        match self.screen {
            Screen::Candidates => &mut self.candidate_filter.search,
            Screen::Employees => &mut self.employee_filter.search,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn next(&mut self) {
        let len = self.visible_len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn load_detail(&mut self, coordinator: &Coordinator) {
        let Some(id) = self.current_employee().map(|e| e.id) else {
            self.detail = None;
            return;
        };
        if self.detail.as_ref().is_some_and(|d| d.id == id) {
            return;
        }
        debug!(id, "loading employee detail");
        match coordinator.gateway().get::<Employee>(id) {
            Ok(employee) => self.detail = Some(employee),
            Err(err) => {
                self.detail = None;
                coordinator.fail(&format!("load employee #{}", id), err);
            }
        }
    }
}

pub fn run_browse(gateway: &Gateway) -> Result<()> {
    let status = StatusLine::default();
    // Deletes are confirmed inside the browser before the coordinator runs.
    let coordinator = Coordinator::new(gateway, &Confirmed, &status);

    let mut state = AppState::new();
    let candidates = gateway.list::<Candidate>().context("Failed to load candidates")?;
    state.candidates.load(candidates);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &coordinator, &status);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    coordinator: &Coordinator,
    status: &StatusLine,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if state.visible_len() == 0 { None } else { Some(state.selected) });
        terminal.draw(|frame| draw(frame, state, status, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !handle_key(state, key.code, coordinator) {
                break;
            }
        }
    }
    Ok(())
}

/// Applies one key press. Returns false when the browser should exit.
fn handle_key(state: &mut AppState, code: KeyCode, coordinator: &Coordinator) -> bool {
    let prev = (state.screen, state.current_id());

    match state.mode {
        Mode::Search => match code {
            KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Normal,
            KeyCode::Backspace => {
                state.search_mut().pop();
                state.selected = 0;
            }
            KeyCode::Char(c) => {
                state.search_mut().push(c);
                state.selected = 0;
            }
            _ => {}
        },
        Mode::ConfirmDelete(id) => {
            state.mode = Mode::Normal;
            if matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                match state.screen {
                    Screen::Candidates => {
                        coordinator.delete(&mut state.candidates, id);
                    }
                    Screen::Employees => {
                        if coordinator.delete(&mut state.employees, id).succeeded()
                            && state.detail.as_ref().is_some_and(|d| d.id == id)
                        {
                            state.detail = None;
                        }
                    }
                }
                state.clamp_selection();
            } else {
                coordinator.info("Delete cancelled");
            }
        }
        Mode::Normal => match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Down | KeyCode::Char('j') => state.next(),
            KeyCode::Up | KeyCode::Char('k') => state.prev(),
            KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
            KeyCode::Char('/') => state.mode = Mode::Search,
            KeyCode::Tab => {
                state.screen = match state.screen {
                    Screen::Candidates => Screen::Employees,
                    Screen::Employees => Screen::Candidates,
                };
                state.selected = 0;
                state.scroll_offset = 0;
                if state.screen == Screen::Employees && !state.employees.is_loaded() {
                    coordinator.reload(&mut state.employees);
                }
            }
            KeyCode::Char('r') => {
                match state.screen {
                    Screen::Candidates => {
                        coordinator.reload(&mut state.candidates);
                    }
                    Screen::Employees => {
                        coordinator.reload(&mut state.employees);
                        state.detail = None;
                    }
                }
                state.clamp_selection();
                if state.screen == Screen::Employees {
                    state.load_detail(coordinator);
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = state.current_id() {
                    state.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('f') => {
                match state.screen {
                    Screen::Candidates => {
                        state.candidate_filter.pipeline = state.candidate_filter.pipeline.cycle()
                    }
                    Screen::Employees => {
                        state.employee_filter.activity = state.employee_filter.activity.cycle()
                    }
                }
                state.selected = 0;
            }
            KeyCode::Char('g') if state.screen == Screen::Candidates => {
                state.candidate_filter.approval = state.candidate_filter.approval.cycle();
                state.selected = 0;
            }
            KeyCode::Char(c @ '1'..='3') if state.screen == Screen::Candidates => {
                let stage = STAGES[c as usize - '1' as usize];
                let target = state
                    .current_candidate()
                    .filter(|c| pipeline::offers(c, CandidateAction::MoveTo(stage)))
                    .map(|c| c.id);
                if let Some(id) = target {
                    coordinator.transition(&mut state.candidates, id, stage);
                    state.clamp_selection();
                }
            }
            KeyCode::Char('a') if state.screen == Screen::Candidates => {
                if let Some(id) = state.current_id() {
                    coordinator.decide(&mut state.candidates, id, Decision::Approve);
                    state.clamp_selection();
                }
            }
            KeyCode::Char('d') if state.screen == Screen::Candidates => {
                if let Some(id) = state.current_id() {
                    coordinator.decide(&mut state.candidates, id, Decision::Deny);
                    state.clamp_selection();
                }
            }
            KeyCode::Char('p') if state.screen == Screen::Candidates => {
                if let Some(id) = state.current_id() {
                    indeed::push_status(coordinator, &mut state.candidates, id);
                }
            }
            _ => {}
        },
    }

    if state.screen == Screen::Employees && (state.screen, state.current_id()) != prev {
        state.scroll_offset = 0;
        state.load_detail(coordinator);
    }
    true
}

fn draw(frame: &mut Frame, state: &AppState, status: &StatusLine, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(rows[0]);

    // Left panel: record list
    let (items, title): (Vec<ListItem>, String) = match state.screen {
        Screen::Candidates => {
            let visible = state.visible_candidates();
            let items = visible
                .iter()
                .map(|c| {
                    let icon = match c.admin_approval {
                        AdminApproval::Pending => "?",
                        AdminApproval::Approved => "+",
                        AdminApproval::Denied => "x",
                    };
                    let name = format!("{} {}", c.first_name, c.last_name);
                    ListItem::new(format!("{} #{:<4} {} | {}", icon, c.id, truncate(&name, 24), c.pipeline_status))
                })
                .collect();
            let f = &state.candidate_filter;
            let title = format!(
                " Candidates ({}/{}) pipeline:{} approval:{} ",
                visible.len(),
                state.candidates.len(),
                f.pipeline,
                f.approval
            );
            (items, title)
        }
        Screen::Employees => {
            let visible = state.visible_employees();
            let items = visible
                .iter()
                .map(|e| {
                    let icon = if e.is_active() { " " } else { "-" };
                    let name = format!("{} {}", e.first_name, e.last_name);
                    ListItem::new(format!("{} #{:<4} {}", icon, e.id, truncate(&name, 32)))
                })
                .collect();
            let title = format!(
                " Employees ({}/{}) status:{} ",
                visible.len(),
                state.employees.len(),
                state.employee_filter.activity
            );
            (items, title)
        }
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: detail
    let detail_widget = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Status line: prompt, search term or last notice
    let status_line = match state.mode {
        Mode::ConfirmDelete(id) => {
            let noun = match state.screen {
                Screen::Candidates => "candidate",
                Screen::Employees => "employee",
            };
            Paragraph::new(format!(" Delete {} #{}? (y/n)", noun, id))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        }
        Mode::Search => {
            let term = match state.screen {
                Screen::Candidates => &state.candidate_filter.search,
                Screen::Employees => &state.employee_filter.search,
            };
            Paragraph::new(format!(" /{}", term))
        }
        Mode::Normal => match status.notice.borrow().as_ref() {
            Some(notice) if notice.is_error() => {
                Paragraph::new(format!(" {}", notice.message)).style(Style::default().fg(Color::Red))
            }
            Some(notice) => {
                Paragraph::new(format!(" {}", notice.message)).style(Style::default().fg(Color::Green))
            }
            None => Paragraph::new(""),
        },
    };
    frame.render_widget(status_line, rows[1]);

    // Footer help
    let help_text = match state.screen {
        Screen::Candidates => {
            " j/k:navigate J/K:scroll /:search f:pipeline g:approval 1/2/3:move a:approve d:deny p:push x:delete r:reload tab:employees q:quit"
        }
        Screen::Employees => {
            " j/k:navigate J/K:scroll /:search f:status x:delete r:reload tab:candidates q:quit"
        }
    };
    let help = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn push_card(lines: &mut Vec<Line<'static>>, card: &str) {
    for (i, raw) in card.lines().enumerate() {
        if i == 0 {
            lines.push(Line::from(Span::styled(
                raw.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            continue;
        }
        if raw.is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for wrapped in textwrap::wrap(raw, 70) {
            lines.push(Line::from(wrapped.into_owned()));
        }
    }
}

fn stage_style(status: PipelineStatus) -> Style {
    match status {
        PipelineStatus::Applied => Style::default().fg(Color::Green),
        PipelineStatus::Interviewing => Style::default().fg(Color::Yellow),
        PipelineStatus::Offered => Style::default().fg(Color::Cyan),
        PipelineStatus::Approved => Style::default().fg(Color::Blue),
        PipelineStatus::Denied => Style::default().fg(Color::Red),
    }
}

fn build_detail(state: &AppState) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    match state.screen {
        Screen::Candidates => {
            let Some(candidate) = state.current_candidate() else {
                return Text::raw("No candidate selected");
            };
            push_card(&mut lines, &display::candidate_card(candidate));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Stage: {}", candidate.pipeline_status),
                stage_style(candidate.pipeline_status),
            )));
            if !pipeline::is_undecided(candidate) {
                lines.push(Line::from(Span::styled(
                    format!("Decision recorded: {}", candidate.admin_approval),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        Screen::Employees => {
            let Some(summary) = state.current_employee() else {
                return Text::raw("No employee selected");
            };
            match state.detail.as_ref().filter(|d| d.id == summary.id) {
                Some(detail) => push_card(&mut lines, &display::employee_card(detail)),
                None => {
                    push_card(&mut lines, &display::employee_card(summary));
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "(Full record not loaded, press r to retry)",
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
        }
    }

    Text::from(lines)
}
