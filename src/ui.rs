// 🖥️ Terminal Dashboard - overview, programs and paginated client list
use crate::analytics::{AnalyticsSnapshot, UNSPECIFIED_PROFESSION};
use crate::models::{Client, Dataset, DateWindow, Enrollment};
use crate::pagination::{paginate, Page as ClientPage, DEFAULT_PAGE_SIZE};
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

/// Days covered by the "recent" window toggle
pub const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Programs,
    Clients,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Programs,
            Page::Programs => Page::Clients,
            Page::Clients => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Clients,
            Page::Programs => Page::Overview,
            Page::Clients => Page::Programs,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Programs => "Programs",
            Page::Clients => "Clients",
        }
    }
}

pub struct App {
    pub dataset: Dataset,
    pub window: Option<DateWindow>,
    pub snapshot: AnalyticsSnapshot,
    pub current_page: Page,
    pub client_page: usize,
    pub state: TableState,
    pub show_detail: bool,
    now: DateTime<Utc>,
}

impl App {
    pub fn new(dataset: Dataset, now: DateTime<Utc>) -> Self {
        let snapshot = AnalyticsSnapshot::compute(&dataset, None);
        let mut state = TableState::default();
        if !dataset.clients.is_empty() {
            state.select(Some(0));
        }

        Self {
            dataset,
            window: None,
            snapshot,
            current_page: Page::Overview,
            client_page: 1,
            state,
            show_detail: false,
            now,
        }
    }

    /// Switches between all-time figures and the last 30 days
    pub fn toggle_window(&mut self) {
        self.window = match self.window {
            Some(_) => None,
            None => Some(DateWindow::last_days(RECENT_WINDOW_DAYS, self.now)),
        };
        self.snapshot = AnalyticsSnapshot::compute(&self.dataset, self.window.as_ref());
    }

    pub fn window_label(&self) -> String {
        match &self.window {
            Some(w) => format!("{} → {}", w.from.format("%Y-%m-%d"), w.to.format("%Y-%m-%d")),
            None => "All time".to_string(),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn clients_page(&self) -> ClientPage<Client> {
        paginate(&self.dataset.clients, self.client_page, DEFAULT_PAGE_SIZE)
    }

    pub fn next_client_page(&mut self) {
        let total_pages = self.clients_page().total_pages;
        if self.client_page < total_pages {
            self.client_page += 1;
            self.reset_selection();
        }
    }

    pub fn previous_client_page(&mut self) {
        if self.client_page > 1 {
            self.client_page -= 1;
            self.reset_selection();
        }
    }

    fn reset_selection(&mut self) {
        let has_rows = !self.clients_page().items.is_empty();
        self.state.select(if has_rows { Some(0) } else { None });
    }

    pub fn next(&mut self) {
        let len = self.clients_page().items.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.clients_page().items.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected_client(&self) -> Option<Client> {
        let page = self.clients_page();
        self.state.selected().and_then(|i| page.items.get(i).cloned())
    }

    pub fn enrollments_for(&self, client_id: i64) -> Vec<&Enrollment> {
        self.dataset
            .enrollments
            .iter()
            .filter(|e| e.client_id == Some(client_id))
            .collect()
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    dashboard_outcome(res)
}

/// Surfaces a failure from the event loop once the terminal is restored
fn dashboard_outcome(res: io::Result<()>) -> Result<()> {
    if let Err(err) = res {
        tracing::error!(error = %err, "terminal dashboard failed");
        return Err(anyhow::Error::new(err).context("terminal dashboard failed"));
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('w') => app.toggle_window(),
                KeyCode::Enter if app.current_page == Page::Clients => app.toggle_detail(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Right | KeyCode::Char('l') => app.next_client_page(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_client_page(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Programs => render_programs(f, chunks[1], app),
        Page::Clients if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);
            render_clients(f, content_chunks[0], app);
            render_client_detail(f, content_chunks[1], app);
        }
        Page::Clients => render_clients(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Overview, Page::Programs, Page::Clients].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(app.window_label(), Style::default().fg(Color::Green)));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Healthcare Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let summary = &app.snapshot.summary;
    let metric = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<18}", label), Style::default().fg(Color::Cyan)),
            Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        ])
    };
    let metrics = Paragraph::new(vec![
        metric("Total Clients", summary.total_clients.to_string()),
        metric("Total Programs", summary.total_programs.to_string()),
        metric("Total Enrollments", summary.total_enrollments.to_string()),
        metric("Average Age", summary.average_age.to_string()),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Key Metrics "));
    f.render_widget(metrics, rows[0]);

    let bars: Vec<(&str, u64)> = app
        .snapshot
        .age_distribution
        .iter()
        .map(|b| (b.name.as_str(), b.value as u64))
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Age Distribution "))
        .data(bars.as_slice())
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, columns[0]);

    let growth_rows = app.snapshot.monthly_growth.iter().map(|point| {
        Row::new(vec![
            Cell::from(point.date.clone()),
            Cell::from(point.new_clients.to_string()),
            Cell::from(point.total_clients.to_string()),
        ])
    });
    let growth = Table::new(
        growth_rows,
        [Constraint::Length(10), Constraint::Length(8), Constraint::Length(8)],
    )
    .header(Row::new(vec!["Month", "New", "Total"]).style(header_style()))
    .block(Block::default().borders(Borders::ALL).title(" Client Growth "));
    f.render_widget(growth, columns[1]);
}

fn render_programs(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.snapshot.program_enrollments.iter().map(|row| {
        Row::new(vec![
            Cell::from(truncate(&row.name, 30)),
            Cell::from(row.short_code.clone()),
            Cell::from(row.enrollments.to_string()).style(Style::default().fg(Color::Green)),
        ])
    });

    let professions = app
        .snapshot
        .top_professions
        .iter()
        .map(|p| format!("{} ({})", p.name, p.value))
        .collect::<Vec<_>>()
        .join(", ");

    let table = Table::new(
        rows,
        [Constraint::Length(32), Constraint::Length(12), Constraint::Length(12)],
    )
    .header(
        Row::new(vec!["Program", "Code", "Enrollments"])
            .style(header_style())
            .bottom_margin(1),
    )
    .block(Block::default().borders(Borders::ALL).title(" Program Enrollments "));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);
    f.render_widget(table, chunks[0]);

    let footer = Paragraph::new(professions)
        .block(Block::default().borders(Borders::ALL).title(" Top Professions "));
    f.render_widget(footer, chunks[1]);
}

fn render_clients(f: &mut Frame, area: Rect, app: &mut App) {
    let page = app.clients_page();

    let rows = page.items.iter().map(|client| {
        Row::new(vec![
            Cell::from(truncate(&client.full_name(), 28)),
            Cell::from(client.age.to_string()),
            Cell::from(client.phone_number.clone()),
            Cell::from(truncate(&client.area_of_residence, 20)),
            Cell::from(client.profession.clone().unwrap_or_else(|| "-".to_string())),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(5),
            Constraint::Length(16),
            Constraint::Length(22),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Name", "Age", "Phone", "Area", "Profession"])
            .style(header_style().bg(Color::DarkGray)),
    )
    .block(Block::default().borders(Borders::ALL).title(format!(
        " Clients (page {}/{}, {} total) ",
        page.page, page.total_pages, page.total_items
    )))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_client_detail(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Client Profile ");

    let Some(client) = app.selected_client() else {
        f.render_widget(Paragraph::new("No client selected").block(block), area);
        return;
    };

    let label = |text: &str| Span::styled(format!("  {}: ", text), Style::default().fg(Color::Cyan));
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![label("Name"), Span::raw(client.full_name())]),
        Line::from(vec![label("Age"), Span::raw(client.age.to_string())]),
        Line::from(vec![label("Phone"), Span::raw(client.phone_number.clone())]),
        Line::from(vec![label("Area"), Span::raw(client.area_of_residence.clone())]),
        Line::from(vec![
            label("Profession"),
            Span::raw(client.profession.clone().unwrap_or_else(|| UNSPECIFIED_PROFESSION.to_string())),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Enrollments", header_style())),
    ];

    let enrollments = app.enrollments_for(client.id);
    if enrollments.is_empty() {
        lines.push(Line::from("  (none)"));
    }
    for enrollment in enrollments {
        let when = enrollment
            .enrolled_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        lines.push(Line::from(format!(
            "  {} {} ({})",
            enrollment.enrollment_id, enrollment.program_name, when
        )));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    if app.current_page == Page::Clients {
        status_spans.push(key("←/→"));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(key("↑/↓"));
        status_spans.push(Span::raw(" Nav | "));
        status_spans.push(key("Enter"));
        status_spans.push(Span::raw(" Profile | "));
    }
    status_spans.push(key("w"));
    status_spans.push(Span::raw(format!(" Last {} days | ", RECENT_WINDOW_DAYS)));
    status_spans.push(key("Tab"));
    status_spans.push(Span::raw(" Switch | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::{client, enrollment, program};
    use chrono::TimeZone;

    fn app_with_clients(n: i64) -> App {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let clients = (1..=n)
            .map(|id| client(id, 30, "Kisumu", Some(if id == 1 { recent } else { old })))
            .collect();
        let dataset = Dataset::new(
            clients,
            vec![program(1, "HIV Care", "HIV")],
            vec![enrollment(1, Some(1), Some(recent))],
        );
        App::new(dataset, now)
    }

    #[test]
    fn test_page_cycle() {
        let mut app = app_with_clients(1);
        assert_eq!(app.current_page, Page::Overview);
        app.next_page();
        app.next_page();
        assert_eq!(app.current_page, Page::Clients);
        app.next_page();
        assert_eq!(app.current_page, Page::Overview);
        app.previous_page();
        assert_eq!(app.current_page, Page::Clients);
    }

    #[test]
    fn test_client_paging() {
        let mut app = app_with_clients(13);
        assert_eq!(app.clients_page().items.len(), DEFAULT_PAGE_SIZE);

        app.next_client_page();
        app.next_client_page();
        app.next_client_page();
        assert_eq!(app.client_page, 3);
        assert_eq!(app.clients_page().items.len(), 1);
        assert_eq!(app.state.selected(), Some(0));

        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous_client_page();
        app.previous();
        assert_eq!(app.state.selected(), Some(DEFAULT_PAGE_SIZE - 1));
    }

    #[test]
    fn test_window_toggle_recomputes_snapshot() {
        let mut app = app_with_clients(4);
        assert_eq!(app.snapshot.summary.total_clients, 4);
        assert_eq!(app.window_label(), "All time");

        app.toggle_window();
        assert_eq!(app.snapshot.summary.total_clients, 1);
        assert_eq!(app.snapshot.summary.total_enrollments, 1);
        assert_eq!(app.window_label(), "2024-03-01 → 2024-03-31");

        app.toggle_window();
        assert!(app.window.is_none());
        assert_eq!(app.snapshot.summary.total_clients, 4);
    }

    #[test]
    fn test_selected_client_enrollments() {
        let app = app_with_clients(2);
        let selected = app.selected_client().unwrap();
        assert_eq!(app.enrollments_for(selected.id).len(), usize::from(selected.id == 1));
    }

    #[test]
    fn test_event_loop_failure_is_returned() {
        let failure = io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away");
        let err = dashboard_outcome(Err(failure)).unwrap_err();
        assert!(format!("{:#}", err).contains("terminal went away"));
        assert!(dashboard_outcome(Ok(())).is_ok());
    }

    #[test]
    fn test_profile_uses_shared_unspecified_label() {
        let app = app_with_clients(1);
        let selected = app.selected_client().unwrap();
        assert_eq!(selected.profession, None);
        assert_eq!(
            selected.profession.unwrap_or_else(|| UNSPECIFIED_PROFESSION.to_string()),
            "Not Specified"
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Nyahururu", 20), "Nyahururu");
        assert_eq!(truncate("Ñandú Ñandú Ñandú", 8), "Ñandú...");
    }
}
