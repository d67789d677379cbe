use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use threat_triage::{
    derive_view, Action, Collection, DashboardStats, Entity, Ingestor, Report, Severity, SortKey,
    TriageStatus, TriageStore, View, ViewQuery,
};

/// How long to wait for a key before redrawing (and draining ingest)
const TICK_RATE: Duration = Duration::from_millis(100);

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

fn next_tab(tab: Collection) -> Collection {
    match tab {
        Collection::Unreviewed => Collection::Flagged,
        Collection::Flagged => Collection::Priority,
        Collection::Priority => Collection::Deleted,
        Collection::Deleted => Collection::Submitted,
        Collection::Submitted => Collection::Unreviewed,
    }
}

fn previous_tab(tab: Collection) -> Collection {
    match tab {
        Collection::Unreviewed => Collection::Submitted,
        Collection::Flagged => Collection::Unreviewed,
        Collection::Priority => Collection::Flagged,
        Collection::Deleted => Collection::Priority,
        Collection::Submitted => Collection::Deleted,
    }
}

pub struct App {
    pub store: TriageStore,
    pub ingestor: Ingestor,
    pub query: ViewQuery,
    pub state: TableState,
    pub show_detail: bool,
    pub show_audit: bool,
    pub input_mode: InputMode,
    pub report_dir: PathBuf,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(store: TriageStore, ingestor: Ingestor, report_dir: PathBuf) -> Self {
        let mut app = Self {
            store,
            ingestor,
            query: ViewQuery::default(),
            state: TableState::default(),
            show_detail: false,
            show_audit: false,
            input_mode: InputMode::Normal,
            report_dir,
            status_message: None,
        };
        app.select_first();
        app
    }

    pub fn view(&self) -> View<'_> {
        derive_view(&self.store, &self.query)
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.state.selected().and_then(|i| self.view().get(i))
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_store(&self.store)
    }

    // ------------------------------------------------------------------------
    // Store mutations
    // ------------------------------------------------------------------------

    /// Apply an action, keeping the highlight on the same entity if it is
    /// still visible, otherwise on the same row index.
    fn dispatch(&mut self, action: Action) {
        let selected_id = self.selected_entity().map(|e| e.id.clone());
        let previous_index = self.state.selected();

        self.store = std::mem::take(&mut self.store).apply(action);

        let position =
            selected_id.and_then(|id| self.view().rows.iter().position(|e| e.id == id));
        match position {
            Some(i) => self.state.select(Some(i)),
            None => {
                self.state.select(previous_index);
                self.clamp_selection();
            }
        }
    }

    pub fn act_on_selected(&mut self, target: TriageStatus) {
        let Some(id) = self.selected_entity().map(|e| e.id.clone()) else {
            return;
        };
        self.dispatch(Action::Transition { id, target });
    }

    pub fn submit_batch(&mut self) {
        self.dispatch(Action::SubmitBatch);
        if let Some(entry) = self.store.audit().latest() {
            self.status_message = Some(entry.message.clone());
        }
    }

    /// Apply whatever the ingest feed produced since the last frame
    pub fn poll_ingest(&mut self) {
        for entity in self.ingestor.drain() {
            self.dispatch(Action::Ingest(entity));
        }
    }

    pub fn toggle_ingest(&mut self) {
        let active = self.ingestor.toggle();
        self.status_message = Some(if active {
            "Ingest started".to_string()
        } else {
            "Ingest stopped".to_string()
        });
    }

    pub fn export_report(&mut self) {
        let report = Report::from_store(&self.store, Utc::now());
        self.status_message = Some(match report.write_to_dir(&self.report_dir) {
            Ok(path) => format!("Report saved: {}", path.display()),
            Err(e) => {
                warn!(error = %e, "report export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    // ------------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------------

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn toggle_audit(&mut self) {
        self.show_audit = !self.show_audit;
    }

    pub fn set_tab(&mut self, tab: Collection) {
        self.query.tab = tab;
        self.select_first();
    }

    pub fn next_page(&mut self) {
        self.set_tab(next_tab(self.query.tab));
    }

    pub fn previous_page(&mut self) {
        self.set_tab(previous_tab(self.query.tab));
    }

    pub fn sort_by(&mut self, key: SortKey) {
        self.query.toggle_sort(key);
        self.select_first();
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.query.search.push(c);
        self.select_first();
    }

    pub fn pop_search_char(&mut self) {
        self.query.search.pop();
        self.select_first();
    }

    /// Clear search and sort
    pub fn clear_filter(&mut self) {
        self.query.search.clear();
        self.query.clear_sort();
        self.input_mode = InputMode::Normal;
        self.select_first();
    }

    fn select_first(&mut self) {
        if self.view().is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.view().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let i = self.state.selected().unwrap_or(0).min(len - 1);
        self.state.select(Some(i));
    }

    pub fn next(&mut self) {
        let len = self.view().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.view().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.view().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_SIZE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.view().is_empty() {
            return;
        }
        let i = self.state.selected().unwrap_or(0).saturating_sub(PAGE_SIZE);
        self.state.select(Some(i));
    }

    pub fn select_last(&mut self) {
        let len = self.view().len();
        if len > 0 {
            self.state.select(Some(len - 1));
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input_mode == InputMode::Search {
            match key.code {
                KeyCode::Enter => self.input_mode = InputMode::Normal,
                KeyCode::Esc => self.clear_filter(),
                KeyCode::Backspace => self.pop_search_char(),
                KeyCode::Char(c) => self.push_search_char(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Char('c') => self.clear_filter(),
            KeyCode::Char('f') => self.act_on_selected(TriageStatus::Flagged),
            KeyCode::Char('p') => self.act_on_selected(TriageStatus::Priority),
            KeyCode::Char('d') => self.act_on_selected(TriageStatus::Deleted),
            KeyCode::Char('s') => self.submit_batch(),
            KeyCode::Char('i') => self.toggle_ingest(),
            KeyCode::Char('a') => self.toggle_audit(),
            KeyCode::Char('e') => self.export_report(),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                self.sort_by(SortKey::ALL[index]);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(),
            _ => {}
        }
        false
    }
}

pub async fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("dashboard started");

    let res = run_app(&mut terminal, app).await;

    app.ingestor.stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.poll_ingest();

        // event::poll blocks this worker; let the ingest task run
        tokio::task::yield_now().await;

        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs + stats
            Constraint::Length(1), // Critical banner
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_banner(f, chunks[1], app);

    let mut constraints = vec![Constraint::Min(0)];
    if app.show_detail {
        constraints.push(Constraint::Percentage(35));
    }
    if app.show_audit {
        constraints.push(Constraint::Length(42));
    }
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(chunks[2]);

    render_table(f, content_chunks[0], app);
    let mut next_chunk = 1;
    if app.show_detail {
        render_detail_panel(f, content_chunks[next_chunk], app);
        next_chunk += 1;
    }
    if app.show_audit {
        render_audit_sidebar(f, content_chunks[next_chunk], app);
    }

    render_status_bar(f, chunks[3], app);
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Signal => Color::Yellow,
        Severity::Noise => Color::Green,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let mut tab_spans = vec![];
    for (i, tab) in Collection::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *tab == app.query.tab {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let count = app.store.collection(*tab).len();
        tab_spans.push(Span::styled(format!("{} ({})", tab.title(), count), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Avg risk: {}", stats.average_risk),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!(
            "Last ingest: {}",
            stats
                .last_ingest
                .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    if app.ingestor.is_active() {
        tab_spans.push(Span::styled(
            "● LIVE",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    } else {
        tab_spans.push(Span::styled("○ paused", Style::default().fg(Color::DarkGray)));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Threat Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_banner(f: &mut Frame, area: Rect, app: &App) {
    let critical = app.view().critical_count;

    let line = if critical > 0 {
        Line::from(Span::styled(
            format!(
                " ⚠ {} critical {} in view",
                critical,
                if critical == 1 { "entity" } else { "entities" }
            ),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from("")
    };

    f.render_widget(Paragraph::new(line), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let view = derive_view(&app.store, &app.query);

    let header_cells = SortKey::ALL.iter().enumerate().map(|(i, key)| {
        let arrow = match app.query.sort {
            Some(spec) if spec.key == *key => format!(" {}", spec.direction.arrow()),
            _ => String::new(),
        };
        Cell::from(format!("{}.{}{}", i + 1, key.title(), arrow)).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = view.rows.iter().map(|entity| {
        let color = severity_color(entity.severity());

        let cells = vec![
            Cell::from(truncate(&entity.name, 24)),
            Cell::from(entity.entity_type.as_str()),
            Cell::from(format!("{}", entity.risk_score)).style(Style::default().fg(color)),
            Cell::from(entity.source.as_str()),
            Cell::from(entity.status.as_str()),
            Cell::from(
                entity
                    .timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        ];

        let row = Row::new(cells).height(1);
        if entity.is_critical() {
            row.style(Style::default().add_modifier(Modifier::BOLD))
        } else {
            row
        }
    });

    let title = if app.query.search.is_empty() {
        format!(" {} ({}) ", app.query.tab.title(), view.len())
    } else {
        format!(
            " {} ({}) - search: \"{}\" ",
            app.query.tab.title(),
            view.len(),
            app.query.search
        )
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Length(21),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.view().len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.input_mode == InputMode::Search {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Search: {}▏", app.query.search),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" done, "));
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    } else {
        if let Some(message) = &app.status_message {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
        }

        let hints = [
            ("f", "Flag"),
            ("p", "Priority"),
            ("d", "Delete"),
            ("s", "Submit"),
            ("i", "Ingest"),
            ("/", "Search"),
            ("1-6", "Sort"),
            ("a", "Audit"),
            ("e", "Export"),
            ("Tab", "Page"),
        ];
        for (key, label) in hints {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(format!(" {}", label)));
        }
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
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
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let entity = match app.selected_entity() {
        Some(e) => e,
        None => {
            let no_selection = Paragraph::new("No entity selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Entity Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let severity = entity.severity();

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(entity.name.clone())]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Type: ", label),
            Span::raw(entity.entity_type.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Risk: ", label),
            Span::styled(
                format!("{} ({})", entity.risk_score, severity.label()),
                Style::default().fg(severity_color(severity)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Source: ", label),
            Span::raw(entity.source.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Status: ", label),
            Span::raw(entity.status.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Seen: ", label),
            Span::raw(
                entity
                    .timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ID: ", label),
            Span::styled(entity.id.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  SUMMARY",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                entity.summary.clone(),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Entity Details "),
        );

    f.render_widget(detail_panel, area);
}

fn render_audit_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let audit = app.store.audit();

    let content: Vec<Line> = if audit.is_empty() {
        vec![Line::from(Span::styled(
            "No audit logs yet.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))]
    } else {
        audit
            .entries()
            .flat_map(|entry| {
                [
                    Line::from(Span::styled(
                        entry
                            .timestamp
                            .with_timezone(&Local)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(entry.message.clone()),
                    Line::from(""),
                ]
            })
            .collect()
    };

    let sidebar = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(format!(" Audit Trail ({}) ", audit.len())),
        );

    f.render_widget(sidebar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use threat_triage::{EntitySource, EntityType};

    fn entity(id: &str, name: &str, score: u8) -> Entity {
        Entity::new(
            id.to_string(),
            name.to_string(),
            EntityType::Person,
            score,
            EntitySource::Watchlist,
        )
    }

    fn app() -> App {
        let store = TriageStore::seeded(vec![
            entity("a", "Entity Alpha", 20),
            entity("b", "Entity Bravo", 85),
            entity("c", "Entity Charlie", 60),
        ]);
        let ingestor = Ingestor::new(Duration::from_millis(2000), Some(1));
        App::new(store, ingestor, std::env::temp_dir())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_starts_on_unreviewed_with_first_row_selected() {
        let app = app();

        assert_eq!(app.query.tab, Collection::Unreviewed);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.selected_entity().unwrap().id, "a");
    }

    #[test]
    fn test_flag_key_moves_selected_entity() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('f'));

        assert_eq!(app.store.locate("b"), Some(Collection::Flagged));
        // highlight stays on the same row index
        assert_eq!(app.selected_entity().unwrap().id, "c");
        assert_eq!(app.store.audit().len(), 1);
    }

    #[test]
    fn test_acting_on_last_row_clamps_selection() {
        let mut app = app();
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.store.locate("c"), Some(Collection::Deleted));
        assert_eq!(app.selected_entity().unwrap().id, "b");
    }

    #[test]
    fn test_selection_follows_entity_on_ingest() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        app.dispatch(Action::Ingest(entity("n", "Entity New", 5)));

        assert_eq!(app.selected_entity().unwrap().id, "b");
        assert_eq!(app.state.selected(), Some(2));
    }

    #[test]
    fn test_search_mode_filters_rows() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        for c in "brav".chars() {
            press(&mut app, KeyCode::Char(c));
        }

        assert_eq!(app.input_mode, InputMode::Search);
        assert_eq!(app.view().len(), 1);
        // keys go to the search box, not to actions
        assert_eq!(app.store.locate("b"), Some(Collection::Unreviewed));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.selected_entity().unwrap().id, "b");

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view().len(), 3);
    }

    #[test]
    fn test_sort_keys_toggle() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        let ids: Vec<String> = app.view().rows.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);

        press(&mut app, KeyCode::Char('3'));
        let ids: Vec<String> = app.view().rows.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_tabs_wrap_around() {
        let mut app = app();
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.query.tab, Collection::Submitted);
        assert_eq!(app.state.selected(), None);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.query.tab, Collection::Unreviewed);
    }

    #[test]
    fn test_submit_key_archives_and_reports() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('s'));

        assert_eq!(app.store.locate("a"), Some(Collection::Submitted));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Submitted batch: 0 flagged, 1 priority")
        );
    }

    #[test]
    fn test_export_key_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.report_dir = dir.path().to_path_buf();

        press(&mut app, KeyCode::Char('e'));

        assert!(app.status_message.unwrap().starts_with("Report saved"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingest_key_toggles_feed() {
        let mut app = app();

        press(&mut app, KeyCode::Char('i'));
        assert!(app.ingestor.is_active());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        app.poll_ingest();
        assert_eq!(app.store.collection(Collection::Unreviewed).len(), 4);

        press(&mut app, KeyCode::Char('i'));
        assert!(!app.ingestor.is_active());
        assert_eq!(app.status_message.as_deref(), Some("Ingest stopped"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(press(&mut app, KeyCode::Esc));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Entity ABCDEFGHIJ", 10), "Entity ...");
    }
}
