// Real-time dashboard for watch mode using ratatui
use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
};
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::alerts::{AlertAggregator, AlertSettings, ClassifiedEvent, IngestOutcome, SeverityClassifier, TickOutcome};
use crate::analysis::history::{HistoryRecord, build_records};
use crate::models::{Domain, SeverityLevel};
use crate::output::table::byte_keys;
use crate::utils::date_format::format_clock;
use crate::watch::events::{SeverityStyle, WatchEvent};

const MAX_ACTIVITY: usize = 50;
const MAX_QUEUED_SHOWN: usize = 3;

/// What one domain card shows
#[derive(Debug, Clone, Default)]
pub struct DomainPanel {
    pub latest: Option<ClassifiedEvent>,
    pub updated_at: Option<DateTime<Utc>>,
    pub details: Vec<HistoryRecord>,
    pub details_error: Option<String>,
    /// `None` when the domain has no live feed configured
    pub feed_connected: Option<bool>,
    pub threats_seen: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub domain: Domain,
    pub severity: SeverityLevel,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Everything the live view renders. Owned and mutated by the watch loop only.
#[derive(Debug, Clone)]
pub struct DashboardState {
    classifier: SeverityClassifier,
    aggregator: AlertAggregator,
    pub timezone: Tz,
    pub panels: [DomainPanel; 3],
    pub activity: VecDeque<ActivityEntry>,
    pub selected: Domain,
    pub show_help: bool,
    pub paused: bool,
    pub start_time: Instant,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(SeverityClassifier::default(), AlertSettings::default(), Tz::UTC)
    }
}

impl DashboardState {
    pub fn new(classifier: SeverityClassifier, alerts: AlertSettings, timezone: Tz) -> Self {
        DashboardState {
            classifier,
            aggregator: AlertAggregator::new(alerts),
            timezone,
            panels: Default::default(),
            activity: VecDeque::new(),
            selected: Domain::Iot,
            show_help: false,
            paused: false,
            start_time: Instant::now(),
        }
    }

    pub fn aggregator(&self) -> &AlertAggregator {
        &self.aggregator
    }

    pub fn panel(&self, domain: Domain) -> &DomainPanel {
        &self.panels[domain.index()]
    }

    fn panel_mut(&mut self, domain: Domain) -> &mut DomainPanel {
        &mut self.panels[domain.index()]
    }

    /// Fold one background event into the view. Detections go through the
    /// classifier and the aggregator; the outcome is returned for detections.
    pub fn apply(&mut self, event: WatchEvent, now: DateTime<Utc>) -> Option<IngestOutcome> {
        match event {
            WatchEvent::Detection(detection) => {
                let classified = self.classifier.classify_owned(detection);
                let outcome = self.aggregator.ingest(&classified, now);
                self.record_detection(classified, now);
                Some(outcome)
            }
            WatchEvent::DetailsUpdated { domain, events } => {
                let records = build_records(events, &self.classifier, &self.timezone);
                let panel = self.panel_mut(domain);
                panel.details = records;
                panel.details_error = None;
                None
            }
            WatchEvent::DetailsUnavailable { domain, error } => {
                self.panel_mut(domain).details_error = Some(error);
                None
            }
            WatchEvent::FeedStatus { domain, connected } => {
                let previous = self.panel_mut(domain).feed_connected.replace(connected);
                if previous != Some(connected) {
                    let text = if connected { "Live feed connected" } else { "Live feed lost" };
                    self.push_activity(ActivityEntry {
                        at: now,
                        domain,
                        severity: SeverityLevel::Normal,
                        text: text.to_string(),
                    });
                }
                None
            }
        }
    }

    fn record_detection(&mut self, classified: ClassifiedEvent, now: DateTime<Utc>) {
        let domain = classified.event.domain;
        let severity = classified.severity;
        let label = classified.event.label.clone();

        let panel = self.panel_mut(domain);
        let changed = panel
            .latest
            .as_ref()
            .is_none_or(|prev| prev.event.label != label || prev.severity != severity);
        if severity.is_alerting() && changed {
            panel.threats_seen += 1;
        }
        panel.latest = Some(classified);
        panel.updated_at = Some(now);

        // Polls repeat the same label every cycle; only log transitions
        if changed {
            self.push_activity(ActivityEntry {
                at: now,
                domain,
                severity,
                text: label,
            });
        }
    }

    fn push_activity(&mut self, entry: ActivityEntry) {
        self.activity.push_back(entry);
        while self.activity.len() > MAX_ACTIVITY {
            self.activity.pop_front();
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        self.aggregator.tick(now)
    }

    pub fn dismiss_alert(&mut self, now: DateTime<Utc>) {
        if let Some(alert) = self.aggregator.dismiss(now) {
            debug!(domain = %alert.domain, label = %alert.label, "Alert dismissed");
        }
    }

    pub fn select_next(&mut self) {
        self.selected = Domain::ALL[(self.selected.index() + 1) % Domain::ALL.len()];
    }

    pub fn select_previous(&mut self) {
        let len = Domain::ALL.len();
        self.selected = Domain::ALL[(self.selected.index() + len - 1) % len];
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: DateTime<Utc>) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::Continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return KeyAction::Quit,
            KeyCode::Tab | KeyCode::Right => self.select_next(),
            KeyCode::BackTab | KeyCode::Left => self.select_previous(),
            KeyCode::Char('1') => self.selected = Domain::Iot,
            KeyCode::Char('2') => self.selected = Domain::Cyber,
            KeyCode::Char('3') => self.selected = Domain::Traditional,
            KeyCode::Char('d') | KeyCode::Enter => self.dismiss_alert(now),
            KeyCode::Char('h') | KeyCode::F(1) => self.show_help = !self.show_help,
            KeyCode::Char('p') | KeyCode::Char(' ') => self.paused = !self.paused,
            _ => {}
        }
        KeyAction::Continue
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Dashboard {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Dashboard { terminal })
    }

    pub fn draw(&mut self, state: &DashboardState, now: DateTime<Utc>) -> Result<()> {
        draw_to(&mut self.terminal, state, now)
    }

    /// Full redraw after a resize
    pub fn clear(&mut self) -> Result<()> {
        self.terminal.clear()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

pub fn draw_to<B: Backend>(terminal: &mut Terminal<B>, state: &DashboardState, now: DateTime<Utc>) -> Result<()> {
    terminal.draw(|f| render(f, state, now))?;
    Ok(())
}

pub fn render(f: &mut Frame, state: &DashboardState, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Alert banner
            Constraint::Length(7), // Domain cards
            Constraint::Min(6),    // Details
            Constraint::Length(8), // Recent activity
            Constraint::Length(1), // Status line
        ])
        .split(f.size());

    render_header(f, chunks[0], state);
    render_banner(f, chunks[1], state);
    render_domain_cards(f, chunks[2], state);
    render_details(f, chunks[3], state);
    render_recent_activity(f, chunks[4], state);
    render_status_line(f, chunks[5], state);

    if state.show_help {
        render_help_popup(f);
    } else if state.aggregator.active().is_some() {
        render_alert_popup(f, state, now);
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    let online = state.panels.iter().filter(|p| p.latest.as_ref().is_some_and(|c| !c.event.is_placeholder())).count();
    let status = if state.paused { " [PAUSED]" } else { "" };

    let header = Line::from(vec![
        Span::styled("idswatch", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(status, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw("  Uptime: "),
        Span::styled(format_duration(state.uptime()), Style::default().fg(Color::Green)),
        Span::raw(" | Services: "),
        Span::styled(format!("{}/{}", online, Domain::ALL.len()), Style::default().fg(Color::Yellow)),
        Span::raw(" | Alerts raised: "),
        Span::styled(state.aggregator.raised_total().to_string(), Style::default().fg(Color::Red)),
        Span::raw(" | Pending: "),
        Span::styled(state.aggregator.pending().len().to_string(), Style::default().fg(Color::Magenta)),
    ]);

    let widget = Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Security Operations"));
    f.render_widget(widget, area);
}

fn render_banner(f: &mut Frame, area: Rect, state: &DashboardState) {
    let (text, style) = match state.aggregator.active() {
        Some(alert) => (
            format!("{} {}", alert.severity.to_symbol(), alert.summary()),
            Style::default().fg(alert.severity.to_color()).add_modifier(Modifier::BOLD),
        ),
        None => ("✓ All systems nominal".to_string(), Style::default().fg(Color::Green)),
    };
    let banner = Paragraph::new(Line::from(Span::styled(text, style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(banner, area);
}

fn render_domain_cards(f: &mut Frame, area: Rect, state: &DashboardState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    for domain in Domain::ALL {
        let panel = state.panel(domain);
        let (label, severity) = match &panel.latest {
            Some(c) if !c.event.label.is_empty() => (c.event.label.clone(), c.severity),
            Some(c) => (domain.idle_text().to_string(), c.severity),
            None => (domain.idle_text().to_string(), SeverityLevel::Normal),
        };
        let updated = panel
            .updated_at
            .map(|at| format_clock(at, &state.timezone))
            .unwrap_or_else(|| "--:--:--".to_string());
        let feed = match panel.feed_connected {
            Some(true) => Span::styled("feed ●", Style::default().fg(Color::Green)),
            Some(false) => Span::styled("feed ○", Style::default().fg(Color::Red)),
            None => Span::styled("poll", Style::default().fg(Color::Gray)),
        };

        let lines = vec![
            Line::from(Span::styled(
                format!("{} {}", severity.to_symbol(), severity.as_str().to_uppercase()),
                Style::default().fg(severity.to_color()).add_modifier(Modifier::BOLD),
            )),
            Line::from(label),
            Line::from(vec![
                Span::styled(format!("updated {}", updated), Style::default().fg(Color::Gray)),
                Span::raw("  "),
                feed,
            ]),
            Line::from(Span::styled(
                format!("threats seen: {}", panel.threats_seen),
                Style::default().fg(Color::Yellow),
            )),
        ];

        let border = if domain == state.selected { Color::Cyan } else { severity.to_color() };
        let card = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(format!("{} ({})", domain.panel_title(), domain.display_name())),
        );
        f.render_widget(card, columns[domain.index()]);
    }
}

fn render_details(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = Domain::ALL.iter().map(|d| Line::from(d.display_name())).collect();
    let tabs = Tabs::new(titles)
        .select(state.selected.index())
        .block(Block::default().borders(Borders::ALL).title("Attack Details"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let panel = state.panel(state.selected);
    let block = Block::default().borders(Borders::ALL);

    if panel.details.is_empty() {
        let text = match &panel.details_error {
            Some(error) => format!("Details unavailable: {}", error),
            None => "No attack details yet".to_string(),
        };
        let placeholder = Paragraph::new(text).alignment(Alignment::Center).block(block);
        f.render_widget(placeholder, chunks[1]);
        return;
    }

    let (out_key, in_key) = byte_keys(state.selected);
    let visible = chunks[1].height.saturating_sub(3) as usize;
    let rows: Vec<Row> = panel
        .details
        .iter()
        .take(visible.max(1))
        .map(|record| {
            Row::new(vec![
                Cell::from(record.event.timestamp.clone()),
                Cell::from(record.display_label()),
                Cell::from(record.severity.as_str().to_uppercase()).style(Style::default().fg(record.severity.to_color())),
                Cell::from(record.event.feature_text("duration")),
                Cell::from(record.event.protocol_name()),
                Cell::from(record.event.feature_text(out_key)),
                Cell::from(record.event.feature_text(in_key)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(20),
        Constraint::Min(18),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let header = Row::new(vec!["Time", "Attack", "Severity", "Duration", "Protocol", "Bytes Out", "Bytes In"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let title = match &panel.details_error {
        Some(_) => "stale: last refresh failed",
        None => "",
    };
    let table = Table::new(rows, widths).header(header).block(block.title(title));
    f.render_widget(table, chunks[1]);
}

fn render_recent_activity(f: &mut Frame, area: Rect, state: &DashboardState) {
    let max_events = area.height.saturating_sub(2).max(1) as usize;
    let width = area.width.saturating_sub(24) as usize;

    let items: Vec<ListItem> = state
        .activity
        .iter()
        .rev()
        .take(max_events)
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", entry.severity.to_symbol()), Style::default().fg(entry.severity.to_color())),
                Span::styled(
                    format!("[{}] ", format_clock(entry.at, &state.timezone)),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(truncate(&format!("{}: {}", entry.domain.display_name(), entry.text), width)),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Recent Activity"));
    f.render_widget(list, area);
}

fn render_status_line(f: &mut Frame, area: Rect, state: &DashboardState) {
    let text = if state.paused {
        "[PAUSED] 'p' resume | Tab switch domain | 'd' dismiss alert | 'h' help | 'q' quit"
    } else {
        "'p' pause | Tab switch domain | 'd' dismiss alert | 'h' help | 'q' quit"
    };
    let status = Paragraph::new(text).style(Style::default().fg(Color::Gray)).alignment(Alignment::Center);
    f.render_widget(status, area);
}

fn render_alert_popup(f: &mut Frame, state: &DashboardState, now: DateTime<Utc>) {
    let Some(alert) = state.aggregator.active() else {
        return;
    };
    let area = centered_rect(50, 40, f.size());
    f.render_widget(Clear, area);

    let color = alert.severity.to_color();
    let remaining = alert.remaining(now).num_seconds();
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", alert.severity.to_symbol(), alert.title()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(alert.label.clone()),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Severity: "),
            Span::styled(alert.severity.as_str().to_uppercase(), Style::default().fg(color)),
            Span::raw(format!("   Closes in {}s", remaining)),
        ]),
    ];
    if !alert.timestamp.is_empty() {
        lines.push(Line::raw(format!("Detected: {}", alert.timestamp)));
    }
    if alert.placeholder {
        lines.push(Line::from(Span::styled(
            "Service unreachable",
            Style::default().fg(Color::Gray),
        )));
    }
    let pending = state.aggregator.pending();
    if !pending.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::raw(format!("{} more pending", pending.len())));
        for queued in pending.iter().take(MAX_QUEUED_SHOWN) {
            lines.push(Line::from(Span::styled(
                format!(
                    "{}: {} ({})",
                    queued.domain.display_name(),
                    truncate(&queued.label, 40),
                    queued.severity.as_str().to_uppercase()
                ),
                Style::default().fg(queued.severity.to_color()),
            )));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("'d' to dismiss", Style::default().fg(Color::Gray))));

    let popup = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(alert.domain.display_name())
                .title_alignment(Alignment::Center),
        );
    f.render_widget(popup, area);
}

fn render_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 70, f.size());
    f.render_widget(Clear, area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "idswatch - Help",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("Controls:"),
        Line::raw("  Tab / Right  - Next domain"),
        Line::raw("  Shift-Tab    - Previous domain"),
        Line::raw("  1 / 2 / 3    - IoT / CICIDS / NSL-KDD"),
        Line::raw("  d / Enter    - Dismiss the active alert"),
        Line::raw("  p / Space    - Pause/Resume drawing"),
        Line::raw("  h / F1       - Show/Hide help"),
        Line::raw("  q / Esc      - Quit"),
        Line::raw(""),
        Line::raw("Severity:"),
    ];
    help_text.extend(SeverityLevel::ALL.iter().rev().map(|s| {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(s.to_symbol(), Style::default().fg(s.to_color())),
            Span::raw(format!(" {}", s.as_str())),
        ])
    }));
    help_text.push(Line::raw(""));
    help_text.push(Line::raw("Press 'h' again to close this help."));

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(help, area);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AggregatorState;
    use crate::models::{DetectionEvent, EventOrigin};
    use crate::poller::placeholder_event;
    use ratatui::backend::TestBackend;

    fn detection(domain: Domain, label: &str) -> WatchEvent {
        WatchEvent::Detection(DetectionEvent::new(domain, label, "10:00:00", EventOrigin::Poll))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(state: &DashboardState, now: DateTime<Utc>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        draw_to(&mut terminal, state, now).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_benign_detection_updates_panel_without_alert() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        let outcome = state.apply(detection(Domain::Cyber, "BENIGN"), now);

        assert_eq!(outcome, Some(IngestOutcome::Suppressed));
        assert_eq!(state.aggregator().state(), AggregatorState::Idle);
        let latest = state.panel(Domain::Cyber).latest.as_ref().unwrap();
        assert_eq!(latest.severity, SeverityLevel::Normal);
    }

    #[test]
    fn test_mirai_raises_alert_that_expires() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        state.apply(detection(Domain::Iot, "Mirai Botnet"), now);

        let alert = state.aggregator().active().unwrap();
        assert_eq!(alert.severity, SeverityLevel::Critical);

        state.tick(now + chrono::Duration::seconds(9));
        assert!(state.aggregator().active().is_some());
        state.tick(now + chrono::Duration::seconds(10));
        assert!(state.aggregator().active().is_none());
    }

    #[test]
    fn test_repeated_polls_log_activity_once() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        for _ in 0..3 {
            state.apply(detection(Domain::Traditional, "DoS"), now);
        }
        assert_eq!(state.activity.len(), 1);
        assert_eq!(state.panel(Domain::Traditional).threats_seen, 1);

        state.apply(detection(Domain::Traditional, "Normal"), now);
        state.apply(detection(Domain::Traditional, "DoS"), now);
        assert_eq!(state.activity.len(), 3);
        assert_eq!(state.panel(Domain::Traditional).threats_seen, 2);
    }

    #[test]
    fn test_activity_is_bounded() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        for i in 0..(MAX_ACTIVITY + 10) {
            state.apply(detection(Domain::Iot, &format!("label-{}", i)), now);
        }
        assert_eq!(state.activity.len(), MAX_ACTIVITY);
    }

    #[test]
    fn test_feed_status_logged_on_change() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        let connected = WatchEvent::FeedStatus {
            domain: Domain::Iot,
            connected: true,
        };
        state.apply(connected.clone(), now);
        state.apply(connected, now);
        assert_eq!(state.panel(Domain::Iot).feed_connected, Some(true));
        assert_eq!(state.activity.len(), 1);
    }

    #[test]
    fn test_details_replace_and_error_keeps_rows() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        let events = vec![DetectionEvent::new(Domain::Cyber, "DDoS", "10:00:00", EventOrigin::Poll)];
        state.apply(
            WatchEvent::DetailsUpdated {
                domain: Domain::Cyber,
                events,
            },
            now,
        );
        state.apply(
            WatchEvent::DetailsUnavailable {
                domain: Domain::Cyber,
                error: "timed out".into(),
            },
            now,
        );
        let panel = state.panel(Domain::Cyber);
        assert_eq!(panel.details.len(), 1);
        assert_eq!(panel.details[0].severity, SeverityLevel::Critical);
        assert_eq!(panel.details_error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_keys() {
        let mut state = DashboardState::default();
        let now = Utc::now();

        state.handle_key(key(KeyCode::Tab), now);
        assert_eq!(state.selected, Domain::Cyber);
        state.handle_key(key(KeyCode::BackTab), now);
        state.handle_key(key(KeyCode::BackTab), now);
        assert_eq!(state.selected, Domain::Traditional);
        state.handle_key(key(KeyCode::Char('1')), now);
        assert_eq!(state.selected, Domain::Iot);

        state.handle_key(key(KeyCode::Char('h')), now);
        assert!(state.show_help);

        state.apply(detection(Domain::Iot, "Mirai"), now);
        state.handle_key(key(KeyCode::Char('d')), now);
        assert!(state.aggregator().active().is_none());

        assert_eq!(state.handle_key(key(KeyCode::Char('q')), now), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(state.handle_key(ctrl_c, now), KeyAction::Quit);
    }

    #[test]
    fn test_render_idle_dashboard() {
        let state = DashboardState::default();
        let text = screen(&state, Utc::now());
        assert!(text.contains("All systems nominal"));
        assert!(text.contains("Scanning network..."));
        assert!(text.contains("No attack details yet"));
    }

    #[test]
    fn test_render_placeholder_alert_popup() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        state.apply(WatchEvent::Detection(placeholder_event(Domain::Iot)), now);

        let text = screen(&state, now);
        assert!(text.contains("IOT THREAT DETECTED"));
        assert!(text.contains("IoT security breach"));
        assert!(text.contains("Service unreachable"));
    }

    #[test]
    fn test_alert_popup_lists_queued_alerts() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        state.apply(detection(Domain::Iot, "Mirai"), now);
        state.apply(detection(Domain::Cyber, "DDoS"), now);
        state.apply(detection(Domain::Traditional, "Probe"), now);

        let text = screen(&state, now);
        assert!(text.contains("2 more pending"));
        assert!(text.contains("CICIDS: DDoS (CRITICAL)"));
        assert!(text.contains("NSL-KDD: Probe (MEDIUM)"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }
}
