//! Interactive terminal dashboard built on ratatui

use crate::dashboard::{DashboardState, DashboardView, ReadyView, ServiceRow};
use crate::errors::Result;
use crate::history::Stability;
use crate::poller::Poller;
use crate::render::{
    BRAND, EMPTY_SEARCH_MESSAGE, LOADING_MESSAGE, NO_INCIDENTS_MESSAGE, expanded_lines,
    format_local_datetime, history_dots, page_label, refresh_label, status_label,
};
use crate::status::ComponentStatus;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const INPUT_POLL: Duration = Duration::from_millis(200);
const MAX_INCIDENT_LINES: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Apply one key press to the dashboard state.
pub fn handle_key(state: &mut DashboardState, key: KeyEvent) -> Control {
    if key.kind != KeyEventKind::Press {
        return Control::Continue;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Control::Quit,
        KeyCode::Esc => {
            if state.query().is_empty() {
                Control::Quit
            } else {
                state.set_query("");
                Control::Continue
            }
        }
        KeyCode::Char(c) if is_plain_char(key.modifiers) => {
            state.push_query_char(c);
            Control::Continue
        }
        KeyCode::Backspace => {
            state.pop_query_char();
            Control::Continue
        }
        KeyCode::Left | KeyCode::PageUp => {
            state.prev_page();
            Control::Continue
        }
        KeyCode::Right | KeyCode::PageDown => {
            state.next_page();
            Control::Continue
        }
        KeyCode::Up => {
            state.select_prev();
            Control::Continue
        }
        KeyCode::Down => {
            state.select_next();
            Control::Continue
        }
        KeyCode::Enter => {
            state.toggle_expanded();
            Control::Continue
        }
        _ => Control::Continue,
    }
}

/// Only unmodified or shifted characters go into the search query.
fn is_plain_char(modifiers: KeyModifiers) -> bool {
    modifiers.difference(KeyModifiers::SHIFT).is_empty()
}

/// Raw mode and the alternate screen, undone on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }

    fn restore() {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        TerminalGuard::restore();
    }
}

type PanicHook = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Runs `restore` before the previous panic hook while alive; puts the
/// previous hook back on drop.
struct PanicHookGuard {
    previous: Arc<PanicHook>,
}

impl PanicHookGuard {
    fn install(restore: fn()) -> Self {
        let previous: Arc<PanicHook> = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&previous);
        std::panic::set_hook(Box::new(move |info| {
            restore();
            (chained.as_ref())(info);
        }));
        Self { previous }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        let previous = Arc::clone(&self.previous);
        drop(std::panic::take_hook());
        std::panic::set_hook(Box::new(move |info| (previous.as_ref())(info)));
    }
}

/// Run the interactive dashboard until the user quits.
///
/// Blocks the calling thread; call it from `spawn_blocking`.
pub fn run(mut state: DashboardState, mut poller: Poller, poll_interval: Duration) -> Result<()> {
    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let hook = PanicHookGuard::install(TerminalGuard::restore);

    let result = event_loop(&mut terminal, &mut state, &mut poller, poll_interval);

    drop(hook);
    drop(guard);

    poller.shutdown();
    info!("Dashboard closed");
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut DashboardState,
    poller: &mut Poller,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        while let Some(event) = poller.try_next() {
            state.apply(event);
        }

        let view = state.view();
        terminal.draw(|frame| draw(frame, &view, poll_interval))?;

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if handle_key(state, key) == Control::Quit {
                    debug!("Quit requested");
                    return Ok(());
                }
            }
        }
    }
}

pub fn draw(frame: &mut Frame, view: &DashboardView, poll_interval: Duration) {
    match view {
        DashboardView::Loading => draw_message(frame, LOADING_MESSAGE, Color::Gray),
        DashboardView::Error(message) => draw_message(frame, message, Color::Red),
        DashboardView::Ready(ready) => draw_ready(frame, ready, poll_interval),
    }
}

fn draw_message(frame: &mut Frame, message: &str, color: Color) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(color),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, chunks[1]);
}

fn draw_ready(frame: &mut Frame, view: &ReadyView, poll_interval: Duration) {
    let incident_height = (view.incidents.len().max(1) as u16).min(MAX_INCIDENT_LINES) + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),               // header
            Constraint::Length(3),               // search
            Constraint::Length(1),               // summary
            Constraint::Min(5),                  // services
            Constraint::Length(2),               // pagination
            Constraint::Length(incident_height), // incidents
        ])
        .split(frame.area());

    draw_header(frame, view, chunks[0]);
    draw_search(frame, view, chunks[1]);
    draw_summary(frame, view, chunks[2]);
    draw_services(frame, view, chunks[3]);
    draw_pagination(frame, view, poll_interval, chunks[4]);
    draw_incidents(frame, view, chunks[5]);
}

fn status_color(status: Option<ComponentStatus>) -> Color {
    match status {
        Some(ComponentStatus::Operational) => Color::Green,
        Some(ComponentStatus::UnderMaintenance) => Color::Blue,
        Some(ComponentStatus::DegradedPerformance) => Color::Yellow,
        Some(ComponentStatus::PartialOutage) => Color::LightRed,
        Some(ComponentStatus::MajorOutage) => Color::Red,
        None => Color::DarkGray,
    }
}

fn stability_color(stability: Stability) -> Color {
    match stability {
        Stability::Stable => Color::Green,
        Stability::Flapping => Color::Yellow,
        Stability::Unstable => Color::Red,
    }
}

fn draw_header(frame: &mut Frame, view: &ReadyView, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                BRAND,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                view.overall.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("Last updated: {}", format_local_datetime(&view.updated_at)),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(err) = &view.stale_error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_search(frame: &mut Frame, view: &ReadyView, area: Rect) {
    let content = if view.query.is_empty() {
        Span::styled("Search services...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(view.query.clone())
    };

    let search = Paragraph::new(Line::from(content)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(search, area);
}

fn draw_summary(frame: &mut Frame, view: &ReadyView, area: Rect) {
    let mut spans: Vec<Span> = ComponentStatus::ALL
        .iter()
        .flat_map(|s| {
            [
                Span::styled(
                    format!("{} {}", s.short_label(), view.counts.get(*s)),
                    Style::default().fg(status_color(Some(*s))),
                ),
                Span::raw("  "),
            ]
        })
        .collect();

    if view.counts.unknown > 0 {
        spans.push(Span::styled(
            format!("Unknown {}", view.counts.unknown),
            Style::default().fg(status_color(None)),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn service_row(row: &ServiceRow, any_expanded: bool) -> Row<'static> {
    let style = if row.selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let status = Line::from(vec![
        Span::styled(
            status_label(row.service.status),
            Style::default().fg(status_color(row.service.status)),
        ),
        Span::raw(" "),
        Span::styled(
            history_dots(&row.history),
            Style::default().fg(stability_color(row.stability)),
        ),
    ]);

    let marker = match (row.expanded, any_expanded) {
        (true, _) => "▾ ",
        (false, true) => "  ",
        (false, false) => "",
    };

    Row::new(vec![
        Line::from(format!("{}{}", marker, row.service.name)),
        status,
        Line::from(row.service.region.clone()),
        Line::from(row.service.latency_display()),
        Line::from(row.service.uptime_display().to_string()),
    ])
    .style(style)
}

const DETAIL_HEIGHT: u16 = 6;

fn draw_details(frame: &mut Frame, row: &ServiceRow, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", row.service.name));

    let lines: Vec<Line> = expanded_lines(row).into_iter().map(Line::from).collect();
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Gray))
            .block(block),
        area,
    );
}

fn draw_services(frame: &mut Frame, view: &ReadyView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Services ");

    if view.rows.is_empty() {
        let empty = Paragraph::new(EMPTY_SEARCH_MESSAGE)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let (table_area, expanded) = match view.rows.iter().find(|row| row.expanded) {
        Some(row) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(DETAIL_HEIGHT)])
                .split(area);
            draw_details(frame, row, chunks[1]);
            (chunks[0], true)
        }
        None => (area, false),
    };

    let rows: Vec<Row> = view.rows.iter().map(|row| service_row(row, expanded)).collect();

    let header = Row::new(vec!["Service", "Status", "Region", "Latency", "Uptime"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(24),
            Constraint::Percentage(22),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, table_area);
}

fn draw_pagination(frame: &mut Frame, view: &ReadyView, poll_interval: Duration, area: Rect) {
    let prev = if view.pagination.has_prev() { "◀ Prev" } else { "      " };
    let next = if view.pagination.has_next() { "Next ▶" } else { "      " };

    let lines = vec![
        Line::from(format!("{}  {}  {}", prev, page_label(view), next)),
        Line::from(Span::styled(
            refresh_label(view, poll_interval),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_incidents(frame: &mut Frame, view: &ReadyView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Incidents ");

    let lines: Vec<Line> = if view.incidents.is_empty() {
        vec![Line::from(NO_INCIDENTS_MESSAGE)]
    } else {
        view.incidents
            .iter()
            .take(MAX_INCIDENT_LINES as usize)
            .map(|incident| {
                Line::from(vec![
                    Span::styled(
                        incident.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format_local_datetime(&incident.updated_at),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Service, Snapshot};
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state_with_services(n: usize) -> DashboardState {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(Snapshot {
            overall: "All Systems Operational".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            services: (0..n)
                .map(|i| Service {
                    id: format!("svc-{}", i),
                    name: format!("Service {}", i),
                    region: "Global".to_string(),
                    status: Some(ComponentStatus::Operational),
                    latency: None,
                    uptime: None,
                })
                .collect(),
            incidents: vec![],
        });
        state
    }

    fn screen_text(backend: &TestBackend) -> String {
        backend
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_typing_edits_query() {
        let mut state = state_with_services(3);

        assert_eq!(handle_key(&mut state, key(KeyCode::Char('s'))), Control::Continue);
        assert_eq!(handle_key(&mut state, key(KeyCode::Char('v'))), Control::Continue);
        assert_eq!(state.query(), "sv");

        handle_key(&mut state, key(KeyCode::Backspace));
        assert_eq!(state.query(), "s");

        assert_eq!(handle_key(&mut state, key(KeyCode::Esc)), Control::Continue);
        assert_eq!(state.query(), "");
        assert_eq!(handle_key(&mut state, key(KeyCode::Esc)), Control::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_even_with_query() {
        let mut state = state_with_services(1);
        state.set_query("abc");

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut state, ctrl_c), Control::Quit);
        assert_eq!(state.query(), "abc");
    }

    #[test]
    fn test_arrow_keys_page() {
        let mut state = state_with_services(25);

        handle_key(&mut state, key(KeyCode::Right));
        assert_eq!(state.page(), 2);
        handle_key(&mut state, key(KeyCode::PageDown));
        handle_key(&mut state, key(KeyCode::PageDown));
        assert_eq!(state.page(), 3);
        handle_key(&mut state, key(KeyCode::Left));
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_draw_loading() {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal
            .draw(|f| draw(f, &DashboardView::Loading, Duration::from_secs(60)))
            .unwrap();

        assert!(screen_text(terminal.backend()).contains(LOADING_MESSAGE));
    }

    #[test]
    fn test_draw_ready_dashboard() {
        let mut state = state_with_services(12);
        handle_key(&mut state, key(KeyCode::Enter));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let view = state.view();
        terminal
            .draw(|f| draw(f, &view, Duration::from_secs(60)))
            .unwrap();

        let text = screen_text(terminal.backend());
        assert!(text.contains("Atlas"));
        assert!(text.contains("All Systems Operational"));
        assert!(text.contains("Service 0"));
        assert!(text.contains("Region: Global"));
        assert!(text.contains("Page 1 of 2"));
        assert!(text.contains(NO_INCIDENTS_MESSAGE));
        assert!(!text.contains("Service 11"));
    }

    #[test]
    fn test_modified_chars_do_not_edit_query() {
        let mut state = state_with_services(3);
        state.set_query("ab");

        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(handle_key(&mut state, ctrl_u), Control::Continue);
        assert_eq!(handle_key(&mut state, alt_x), Control::Continue);
        assert_eq!(state.query(), "ab");

        let shifted = KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT);
        handle_key(&mut state, shifted);
        assert_eq!(state.query(), "abC");
    }

    #[test]
    fn test_expanded_details_show_every_field() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(Snapshot {
            overall: "Partial System Outage".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            services: vec![Service {
                id: "cdg".to_string(),
                name: "Paris, France - (CDG)".to_string(),
                region: "Paris, France".to_string(),
                status: Some(ComponentStatus::Operational),
                latency: Some(21.0),
                uptime: Some("99.9%".to_string()),
            }],
            incidents: vec![],
        });
        handle_key(&mut state, key(KeyCode::Enter));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let view = state.view();
        terminal
            .draw(|f| draw(f, &view, Duration::from_secs(60)))
            .unwrap();

        let text = screen_text(terminal.backend());
        assert!(text.contains("▾ Paris, France - (CDG)"));
        assert!(text.contains("Region: Paris, France"));
        assert!(text.contains("Latency: 21 ms"));
        assert!(text.contains("Uptime: 99.9%"));
        assert!(text.contains("Stability:"));
        assert!(text.contains("No recent status changes"));
    }

    #[test]
    fn test_draw_summary_lists_unknown_when_present() {
        let mut state = DashboardState::new(10, 5);
        state.apply_snapshot(Snapshot {
            overall: "All Systems Operational".to_string(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            services: vec![Service {
                id: "x".to_string(),
                name: "Mystery".to_string(),
                region: "Global".to_string(),
                status: None,
                latency: None,
                uptime: None,
            }],
            incidents: vec![],
        });

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let view = state.view();
        terminal
            .draw(|f| draw(f, &view, Duration::from_secs(60)))
            .unwrap();
        assert!(screen_text(terminal.backend()).contains("Unknown 1"));

        let state = state_with_services(2);
        let view = state.view();
        terminal
            .draw(|f| draw(f, &view, Duration::from_secs(60)))
            .unwrap();
        assert!(!screen_text(terminal.backend()).contains("Unknown"));
    }

    static RESTORES: AtomicUsize = AtomicUsize::new(0);
    static ORIGINAL_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn count_restore() {
        RESTORES.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_panic_hook_guard_restores_previous_hook() {
        std::panic::set_hook(Box::new(|_| {
            ORIGINAL_CALLS.fetch_add(1, Ordering::SeqCst);
        }));

        {
            let _guard = PanicHookGuard::install(count_restore);
            let _ = std::panic::catch_unwind(|| panic!("while drawing"));
        }
        assert_eq!(RESTORES.load(Ordering::SeqCst), 1);
        assert_eq!(ORIGINAL_CALLS.load(Ordering::SeqCst), 1);

        let _ = std::panic::catch_unwind(|| panic!("after teardown"));
        assert_eq!(RESTORES.load(Ordering::SeqCst), 1);
        assert_eq!(ORIGINAL_CALLS.load(Ordering::SeqCst), 2);

        drop(std::panic::take_hook());
    }

    #[test]
    fn test_draw_empty_search() {
        let mut state = state_with_services(3);
        state.set_query("nope");

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let view = state.view();
        terminal
            .draw(|f| draw(f, &view, Duration::from_secs(60)))
            .unwrap();

        assert!(screen_text(terminal.backend()).contains(EMPTY_SEARCH_MESSAGE));
    }
}
