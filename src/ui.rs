use anyhow::Result;
use company_review::{
    country_name, format_label, format_revenue, AttributeType, ChoiceSource, Collection, Notice,
    NoticeLevel, ReviewSession, Scope, SideEffect,
};
use company_review::export::export_success_notice;
use company_review::schema::{coerce_number, sanitize_amount_input};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use serde_json::Value;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Companies,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing into the selected field
    Editing { buffer: String },
    /// Waiting for y/n before discarding edits
    ConfirmReset,
}

/// One row of the form: a field of the company or of one of its items
#[derive(Debug, Clone, PartialEq)]
pub struct FormRow {
    pub path: String,
    pub label: String,
    pub type_: AttributeType,

    /// Set on item rows, for removal
    pub item: Option<(Collection, String)>,
}

pub struct App {
    pub session: ReviewSession,
    pub out_dir: PathBuf,
    pub record_ids: Vec<String>,
    pub companies_state: TableState,
    pub form_state: TableState,
    pub focus: Focus,
    pub mode: Mode,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(session: ReviewSession, out_dir: PathBuf) -> Result<Self> {
        let record_ids: Vec<String> = session
            .dataset()
            .records()
            .iter()
            .map(|r| r.id.clone())
            .collect();

        let mut app = Self {
            session,
            out_dir,
            record_ids,
            companies_state: TableState::default(),
            form_state: TableState::default(),
            focus: Focus::Companies,
            mode: Mode::Browse,
            notice: None,
        };

        if let Some(first) = app.record_ids.first().cloned() {
            app.companies_state.select(Some(0));
            app.session.select(&first)?;
            app.form_state.select(Some(0));
        }
        Ok(app)
    }

    // ------------------------------------------------------------------------
    // Form model
    // ------------------------------------------------------------------------

    /// Rows of the active record's form, in display order
    pub fn form_rows(&self) -> Vec<FormRow> {
        let registry = self.session.registry();
        let draft = match self.session.draft() {
            Ok(draft) => draft,
            Err(_) => return Vec::new(),
        };
        let is_public = draft.get("fundingStage").and_then(Value::as_str) == Some("public");

        let mut rows: Vec<FormRow> = registry
            .in_scope(Scope::Company)
            .filter(|a| !a.public_only || is_public)
            .map(|a| FormRow {
                path: a.key.to_string(),
                label: a.label.to_string(),
                type_: a.type_,
                item: None,
            })
            .collect();

        for collection in Collection::ALL {
            let ids = self.session.item_ids(collection).unwrap_or_default();
            let noun = match collection {
                Collection::Directors => "Director",
                Collection::Locations => "Location",
            };

            for (index, id) in ids.iter().enumerate() {
                for attribute in registry.in_scope(Scope::Item(collection)) {
                    rows.push(FormRow {
                        path: format!("{}.{}.{}", collection, index, attribute.key),
                        label: format!("{} {} · {}", noun, index + 1, attribute.label),
                        type_: attribute.type_,
                        item: Some((collection, id.clone())),
                    });
                }
            }
        }

        rows
    }

    pub fn selected_row(&self) -> Option<FormRow> {
        let index = self.form_state.selected()?;
        self.form_rows().into_iter().nth(index)
    }

    /// Options a choice field can cycle through, given the current draft
    pub fn choice_options(&self, source: ChoiceSource) -> Vec<String> {
        let reference = self.session.validator().reference();

        match source {
            ChoiceSource::CompanyStatus => reference.statuses().iter().map(|s| s.to_string()).collect(),
            ChoiceSource::EntityType => reference.entity_types().iter().map(|e| e.to_string()).collect(),
            ChoiceSource::FundingStage => reference.funding_stages().iter().map(|f| f.to_string()).collect(),
            ChoiceSource::Vertical => reference.verticals().map(str::to_string).collect(),
            ChoiceSource::SubVertical => {
                let vertical = self
                    .session
                    .field_value("vertical")
                    .ok()
                    .flatten()
                    .and_then(Value::as_str)
                    .unwrap_or("");
                reference.sub_verticals(vertical).to_vec()
            }
            ChoiceSource::Country => reference.country_codes().map(str::to_string).collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Companies => Focus::Form,
            Focus::Form => Focus::Companies,
        };
    }

    pub fn next(&mut self) {
        match self.focus {
            Focus::Companies => step(&mut self.companies_state, self.record_ids.len(), 1),
            Focus::Form => {
                let len = self.form_rows().len();
                step(&mut self.form_state, len, 1)
            }
        }
    }

    pub fn previous(&mut self) {
        match self.focus {
            Focus::Companies => step(&mut self.companies_state, self.record_ids.len(), -1),
            Focus::Form => {
                let len = self.form_rows().len();
                step(&mut self.form_state, len, -1)
            }
        }
    }

    /// Mount the highlighted company and move to its form
    pub fn open_selected_company(&mut self) {
        let id = match self.companies_state.selected().and_then(|i| self.record_ids.get(i)) {
            Some(id) => id.clone(),
            None => return,
        };

        match self.session.select(&id) {
            Ok(()) => {
                self.form_state.select(Some(0));
                self.focus = Focus::Form;
                self.notice = None;
            }
            Err(err) => self.notice = Some(Notice::error("Cannot open company", err.to_string())),
        }
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    pub fn start_editing(&mut self) {
        let row = match self.selected_row() {
            Some(row) => row,
            None => return,
        };
        let current = self.session.field_value(&row.path).ok().flatten();
        self.mode = Mode::Editing {
            buffer: display_value(current),
        };
    }

    pub fn commit_edit(&mut self) {
        let buffer = match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Editing { buffer } => buffer,
            other => {
                self.mode = other;
                return;
            }
        };
        if let Some(row) = self.selected_row() {
            let result = self.session.commit_field(&row.path, &buffer);
            self.report_edit(result);
        }
    }

    /// Type into the edit buffer; amount fields take digits and `.` only
    pub fn type_char(&mut self, c: char) {
        let is_amount = self
            .selected_row()
            .is_some_and(|row| row.type_ == AttributeType::Number);
        if let Mode::Editing { buffer } = &mut self.mode {
            buffer.push(c);
            if is_amount {
                *buffer = sanitize_amount_input(buffer);
            }
        }
    }

    /// Step a choice field to the next/previous option
    pub fn cycle_choice(&mut self, delta: isize) {
        let row = match self.selected_row() {
            Some(row) => row,
            None => return,
        };
        let source = match row.type_ {
            AttributeType::Choice(source) => source,
            _ => return,
        };

        let options = self.choice_options(source);
        if options.is_empty() {
            return;
        }

        let current = self.session.field_value(&row.path).ok().flatten().and_then(Value::as_str);
        let next = match current.and_then(|c| options.iter().position(|o| o == c)) {
            Some(i) => (i as isize + delta).rem_euclid(options.len() as isize) as usize,
            None => 0,
        };
        let value = options[next].clone();
        self.set_field(&row.path, Value::String(value));
    }

    fn set_field(&mut self, path: &str, value: Value) {
        let result = self.session.set_field(path, value);
        self.report_edit(result);
    }

    fn report_edit(&mut self, result: company_review::Result<Vec<SideEffect>>) {
        match result {
            Ok(effects) if !effects.is_empty() => {
                let detail = effects.iter().map(|e| format!("{:?}", e)).collect::<Vec<_>>().join(", ");
                self.notice = Some(Notice::warning("Dependent fields updated", detail));
            }
            Ok(_) => self.notice = None,
            Err(err) => self.notice = Some(Notice::error("Edit rejected", err.to_string())),
        }
    }

    pub fn add_item(&mut self, collection: Collection) {
        let added = match collection {
            Collection::Directors => self.session.add_director(),
            Collection::Locations => self.session.add_location(),
        };

        match added {
            Ok(id) => {
                // Jump to the first field of the new item
                let rows = self.form_rows();
                let first = rows
                    .iter()
                    .position(|r| r.item.as_ref().is_some_and(|(_, item_id)| *item_id == id));
                self.form_state.select(first);
                self.focus = Focus::Form;
            }
            Err(err) => self.notice = Some(Notice::error("Cannot add item", err.to_string())),
        }
    }

    pub fn remove_selected_item(&mut self) {
        let (collection, id) = match self.selected_row().and_then(|r| r.item) {
            Some(item) => item,
            None => return,
        };

        let removed = match collection {
            Collection::Directors => self.session.remove_director(&id),
            Collection::Locations => self.session.remove_location(&id),
        };

        match removed {
            Ok(()) => {
                let len = self.form_rows().len();
                if self.form_state.selected().is_some_and(|i| i >= len) {
                    self.form_state.select(len.checked_sub(1));
                }
            }
            Err(err) => self.notice = Some(Notice::error("Cannot remove item", err.to_string())),
        }
    }

    pub fn confirm_reset(&mut self) {
        self.mode = Mode::Browse;
        self.notice = match self.session.reset() {
            Ok(notice) => Some(notice),
            Err(err) => Some(Notice::error("Reset failed", err.to_string())),
        };
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub fn export_current(&mut self) {
        self.notice = Some(match self.session.export_current() {
            Ok(Ok(document)) => match document.write_to(&self.out_dir) {
                Ok(_) => export_success_notice(),
                Err(err) => Notice::error("Export failed", err.to_string()),
            },
            Ok(Err(blocked)) => blocked.notice(),
            Err(err) => Notice::error("Export failed", err.to_string()),
        });
    }

    pub fn export_all(&mut self) {
        let bulk = self.session.export_all();
        self.notice = Some(match bulk.document.write_to(&self.out_dir) {
            Ok(_) => bulk.notice(),
            Err(err) => Notice::error("Export failed", err.to_string()),
        });
    }
}

/// Move a table selection by `delta`, wrapping around
fn step(state: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
        None => 0,
    };
    state.select(Some(i));
}

/// Draft value as editable text
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match &mut app.mode {
            Mode::Editing { buffer } => match key.code {
                KeyCode::Enter => app.commit_edit(),
                KeyCode::Esc => app.mode = Mode::Browse,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => app.type_char(c),
                _ => {}
            },
            Mode::ConfirmReset => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_reset(),
                _ => app.mode = Mode::Browse,
            },
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.toggle_focus(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Enter if app.focus == Focus::Companies => app.open_selected_company(),
                KeyCode::Enter => app.start_editing(),
                KeyCode::Right if app.focus == Focus::Form => app.cycle_choice(1),
                KeyCode::Left if app.focus == Focus::Form => app.cycle_choice(-1),
                KeyCode::Char('d') => app.add_item(Collection::Directors),
                KeyCode::Char('l') => app.add_item(Collection::Locations),
                KeyCode::Char('x') if app.focus == Focus::Form => app.remove_selected_item(),
                KeyCode::Char('r') if app.session.is_dirty() => app.mode = Mode::ConfirmReset,
                KeyCode::Char('e') => app.export_current(),
                KeyCode::Char('E') => app.export_all(),
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Companies + form
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28), // Company list
            Constraint::Percentage(72), // Form + issues
        ])
        .split(chunks[1]);

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(content_chunks[1]);

    render_companies(f, content_chunks[0], app);
    render_form(f, form_chunks[0], app);
    render_issues(f, form_chunks[1], app);

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let edited = app.session.edited_ids().len();
    let name = app
        .session
        .field_value("name")
        .ok()
        .flatten()
        .map(|v| display_value(Some(v)))
        .unwrap_or_default();

    let mut spans = vec![
        Span::styled(
            "Company Review",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Companies: {}", app.record_ids.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Edited: {}", edited), Style::default().fg(Color::Yellow)),
        Span::raw("  |  "),
        Span::styled(name, Style::default().fg(Color::Cyan)),
    ];

    if app.session.is_dirty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("● Unsaved changes", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_companies(f: &mut Frame, area: Rect, app: &mut App) {
    let session = &app.session;

    let rows = session.dataset().records().iter().map(|record| {
        let edited = session.is_edited(&record.id);
        let valid = session
            .working_copy(&record.id)
            .map(|v| session.validator().issues(v).is_empty())
            .unwrap_or(false);

        let marker = if edited {
            Span::styled("● ", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("  ")
        };
        let name_style = if valid {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Red)
        };

        Row::new(vec![Cell::from(Line::from(vec![
            marker,
            Span::styled(truncate(&record.name, 28), name_style),
        ]))])
    });

    let border = if app.focus == Focus::Companies {
        Color::Yellow
    } else {
        Color::White
    };

    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(" Companies "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.companies_state);
}

fn render_form(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Field", "Value", ""].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let form_rows = app.form_rows();
    let selected = app.form_state.selected();
    let issues = app.session.issues().unwrap_or_default();

    let rows = form_rows.iter().enumerate().map(|(i, row)| {
        let value = app.session.field_value(&row.path).ok().flatten();

        let shown = match (&app.mode, Some(i) == selected) {
            (Mode::Editing { buffer }, true) => format!("{}▏", buffer),
            _ => describe_value(&row.type_, value),
        };

        let dirty = app.session.field_dirty(&row.path).unwrap_or(false);
        let error = issues.iter().find(|issue| issue.path == row.path);

        let status = match (error, dirty) {
            (Some(issue), _) => Span::styled(issue.message.clone(), Style::default().fg(Color::Red)),
            (None, true) => Span::styled("edited", Style::default().fg(Color::Yellow)),
            (None, false) => Span::raw(""),
        };

        let label_style = if dirty {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        };

        Row::new(vec![
            Cell::from(Span::styled(row.label.clone(), label_style)),
            Cell::from(truncate(&shown, 48)),
            Cell::from(Line::from(status)),
        ])
    });

    let border = if app.focus == Focus::Form {
        Color::Yellow
    } else {
        Color::White
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(50),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Company Profile · Directors · Locations "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.form_state);
}

/// Read-only rendering of a value, with hints for choices and amounts
fn describe_value(type_: &AttributeType, value: Option<&Value>) -> String {
    let text = display_value(value);

    match type_ {
        AttributeType::Choice(ChoiceSource::CompanyStatus | ChoiceSource::FundingStage) if !text.is_empty() => {
            format!("◂ {} ▸", format_label(&text))
        }
        AttributeType::Choice(ChoiceSource::Country) if !text.is_empty() => match country_name(&text) {
            Some(name) => format!("◂ {} - {} ▸", text, name),
            None => format!("◂ {} ▸", text),
        },
        AttributeType::Choice(_) => format!("◂ {} ▸", text),
        AttributeType::Number => match value.and_then(coerce_number) {
            Some(n) => format!("{}  ({})", text, format_revenue(n)),
            None => text,
        },
        _ => text,
    }
}

fn render_issues(f: &mut Frame, area: Rect, app: &App) {
    let issues = app.session.issues().unwrap_or_default();

    let content: Vec<Line> = if issues.is_empty() {
        vec![Line::from(Span::styled(
            "  ✓ Ready to export",
            Style::default().fg(Color::Green),
        ))]
    } else {
        issues
            .iter()
            .map(|issue| {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{}: ", issue.path), Style::default().fg(Color::DarkGray)),
                    Span::styled(issue.message.clone(), Style::default().fg(Color::Red)),
                ])
            })
            .collect()
    };

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Issues ({}) ", issues.len())),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    match (&app.mode, &app.notice) {
        (Mode::ConfirmReset, _) => {
            status_spans.push(Span::styled(
                " Discard all changes to this company? ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
            status_spans.push(Span::styled("y", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Reset | any other key Cancel"));
        }
        (Mode::Editing { .. }, _) => {
            status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Save field | "));
            status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Cancel"));
        }
        (Mode::Browse, Some(notice)) => {
            let color = match notice.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            status_spans.push(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            if let Some(detail) = &notice.detail {
                status_spans.push(Span::raw(detail.clone()));
            }
        }
        (Mode::Browse, None) => {
            status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Focus | "));
            status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Open/Edit | "));
            status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Choice | "));
            status_spans.push(Span::styled("d/l", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Add director/location | "));
            status_spans.push(Span::styled("x", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Remove | "));
            status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Reset | "));
            status_spans.push(Span::styled("e/E", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Export/All | "));
            status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            status_spans.push(Span::raw(" Quit"));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
