use std::{io, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use chrono::{Duration, Local};
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
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};

use crate::{
    analytics::{rank_activities, total_minutes, totals_by_activity},
    db::Session,
    error::is_storage_error,
    log_warn,
    settings::SESSION_TARGET_CHOICES,
    timer::{SystemClock, TimerController, TimerSnapshot, TimerStatus},
    utils::format::{format_hms, minutes_to_pretty},
};

use super::AppContext;

const ENABLE_LOGS: bool = true;
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(250);

struct TrackerScreen {
    timer: TimerController,
    activities: Vec<String>,
    today: Vec<Session>,
    status: Option<String>,
    confirm_quit: bool,
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run_tracker(ctx: &AppContext) -> Result<()> {
    let settings = ctx.settings.get();
    let mut screen = TrackerScreen {
        timer: TimerController::new(
            ctx.db.clone(),
            Arc::new(SystemClock),
            settings.session_target_minutes,
        ),
        activities: settings.activities,
        today: Vec::new(),
        status: Some(format!("Logs: {}", ctx.log_path().display())),
        confirm_quit: false,
    };
    screen.refresh_today(ctx).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, &mut screen, ctx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut TrackerScreen,
    ctx: &AppContext,
) -> Result<()> {
    loop {
        let snapshot = screen.timer.snapshot().await;
        terminal.draw(|f| draw(f, screen, &snapshot))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Flow::Quit = screen.handle_key(key.code, ctx).await {
                return Ok(());
            }
        }
    }
}

impl TrackerScreen {
    async fn refresh_today(&mut self, ctx: &AppContext) {
        match ctx.db.sessions_today().await {
            Ok(sessions) => self.today = sessions,
            Err(err) => {
                log_warn!("Could not load today's sessions: {:#}", err);
                self.status = Some(format!("Could not load today's log: {err}"));
            }
        }
    }

    async fn handle_key(&mut self, code: KeyCode, ctx: &AppContext) -> Flow {
        if !matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.confirm_quit = false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                let active = self.timer.snapshot().await.status != TimerStatus::Idle;
                if active && !self.confirm_quit {
                    self.confirm_quit = true;
                    self.status = Some("A session is running: s saves it, q again discards it.".into());
                } else {
                    return Flow::Quit;
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(activity) = activity_for_key(&self.activities, c) {
                    let activity = activity.to_string();
                    self.status = match self.timer.select(&activity).await {
                        Ok(()) => Some(format!("Tracking {activity}.")),
                        Err(err) => Some(err.to_string()),
                    };
                }
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => self.timer.toggle_pause().await,
            KeyCode::Char('r') => {
                self.timer.reset().await;
                self.status = Some("Timer reset; nothing saved.".into());
            }
            KeyCode::Char('t') => {
                let next = next_target(self.timer.target_minutes());
                if self.timer.set_target_minutes(next).is_ok() {
                    self.status = Some(format!("Session target: {next} min."));
                }
            }
            KeyCode::Char('s') => match self.timer.stop_and_save().await {
                Ok(Some(session)) => {
                    self.status = Some(format!(
                        "Saved {} ({}).",
                        session.activity,
                        minutes_to_pretty(session.duration_minutes)
                    ));
                    self.refresh_today(ctx).await;
                }
                Ok(None) => self.status = Some("Nothing running.".into()),
                Err(err) if is_storage_error(&err) => {
                    self.status = Some(format!("Save failed, timer kept; press s to retry. ({err:#})"));
                }
                Err(err) => self.status = Some(err.to_string()),
            },
            _ => {}
        }
        Flow::Continue
    }
}

/// Keys `1`..`9` pick the matching activity.
fn activity_for_key(activities: &[String], key: char) -> Option<&str> {
    let index = key.to_digit(10)?.checked_sub(1)? as usize;
    activities.get(index).map(String::as_str)
}

/// The next session target after `current`, wrapping around.
fn next_target(current: u32) -> u32 {
    let pos = SESSION_TARGET_CHOICES.iter().position(|&t| t == current);
    match pos {
        Some(i) => SESSION_TARGET_CHOICES[(i + 1) % SESSION_TARGET_CHOICES.len()],
        None => SESSION_TARGET_CHOICES[0],
    }
}

fn draw(frame: &mut Frame, screen: &TrackerScreen, snapshot: &TimerSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Timer
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Today
            Constraint::Length(4), // Footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], snapshot);
    draw_timer(frame, chunks[1], snapshot);
    draw_progress(frame, chunks[2], snapshot);
    draw_today(frame, chunks[3], &screen.today);
    draw_footer(frame, chunks[4], screen);
}

fn draw_header(frame: &mut Frame, area: Rect, snapshot: &TimerSnapshot) {
    let status = match snapshot.status {
        TimerStatus::Running => Span::styled(
            "RUNNING",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        TimerStatus::Paused => Span::styled(
            "PAUSED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        TimerStatus::Idle => Span::styled("IDLE", Style::default().fg(Color::DarkGray)),
    };

    let header = Line::from(vec![
        Span::styled(
            " Lazy Genius ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status,
        Span::raw(" | "),
        Span::raw(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    ]);
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_timer(frame: &mut Frame, area: Rect, snapshot: &TimerSnapshot) {
    let activity = snapshot.activity.as_deref().unwrap_or("pick an activity");
    let started = snapshot
        .start_time
        .map(|t| format!("started {}", t.format("%H:%M")))
        .unwrap_or_default();

    let lines = vec![
        Line::from(vec![
            Span::raw("  Activity: "),
            Span::styled(activity.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {started}")),
        ]),
        Line::from(vec![
            Span::raw("  Elapsed:  "),
            Span::styled(
                format_hms(Duration::seconds(snapshot.elapsed_secs)),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::raw(format!(
            "  Paused:   {}",
            format_hms(Duration::seconds(snapshot.paused_secs))
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(" SESSION ").borders(Borders::ALL)),
        area,
    );
}

fn draw_progress(frame: &mut Frame, area: Rect, snapshot: &TimerSnapshot) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(format!(" TARGET {} min ", snapshot.target_minutes))
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(snapshot.progress.clamp(0.0, 1.0));
    frame.render_widget(gauge, area);
}

fn draw_today(frame: &mut Frame, area: Rect, today: &[Session]) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let log: Vec<ListItem> = today
        .iter()
        .map(|s| {
            ListItem::new(format!(
                "{}-{}  {:<10} {}",
                s.start_time.format("%H:%M"),
                s.end_time.format("%H:%M"),
                s.activity,
                minutes_to_pretty(s.duration_minutes)
            ))
        })
        .collect();
    frame.render_widget(
        List::new(log).block(Block::default().title(" TODAY ").borders(Borders::ALL)),
        chunks[0],
    );

    let mut totals = vec![Line::from(vec![
        Span::raw("  Total: "),
        Span::styled(
            minutes_to_pretty(total_minutes(today)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    for (activity, minutes) in rank_activities(&totals_by_activity(today)) {
        totals.push(Line::raw(format!("  {activity:<10} {}", minutes_to_pretty(minutes))));
    }
    frame.render_widget(
        Paragraph::new(totals).block(Block::default().title(" TOTALS ").borders(Borders::ALL)),
        chunks[1],
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, screen: &TrackerScreen) {
    let keys: Vec<String> = screen
        .activities
        .iter()
        .take(9)
        .enumerate()
        .map(|(i, a)| format!("{}:{a}", i + 1))
        .collect();
    let help = format!("{}  p:pause  s:save  r:reset  t:target  q:quit", keys.join(" "));
    let lines = vec![
        Line::raw(help),
        Line::styled(
            screen.status.clone().unwrap_or_default(),
            Style::default().fg(Color::Yellow),
        ),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );
}
