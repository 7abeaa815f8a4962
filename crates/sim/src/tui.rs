use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::{Frame, Terminal};

use duel::BufferState;

use crate::client::Client;
use crate::events::SimEvent;
use crate::present::Presenter;

const MAX_LOG_LINES: usize = 200;
const PALETTE: [Color; 2] = [Color::Red, Color::Blue];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Info,
    Warn,
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    log: VecDeque<(LogLevel, String)>,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            log: VecDeque::with_capacity(MAX_LOG_LINES),
        })
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back((level, message));
    }

    fn quit_requested(&self) -> io::Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c');
                if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn restore_terminal(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

impl Presenter for Tui {
    fn present(&mut self, client: &Client, events: &[SimEvent], now_ms: u64) -> Result<bool> {
        for event in events.iter().filter(|e| !e.is_noise()) {
            let level = if event.is_warning() {
                LogLevel::Warn
            } else {
                LogLevel::Info
            };
            self.push_log(level, event.describe());
        }

        let log = &self.log;
        self.terminal.draw(|frame| render(frame, client, log, now_ms))?;

        Ok(!self.quit_requested()?)
    }
}

fn render(frame: &mut Frame, client: &Client, log: &VecDeque<(LogLevel, String)>, now_ms: u64) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(8),
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(body[1]);

    render_header(frame, rows[0], client);
    render_arena(frame, body[0], client);
    render_hit_points(frame, side[0], client);
    render_telemetry(frame, side[1], client, now_ms);
    render_log(frame, rows[2], log);
}

fn render_header(frame: &mut Frame, area: Rect, client: &Client) {
    let sync = client.sync();
    let block = Block::default()
        .title(" Duel Sim ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let state = match sync.state() {
        BufferState::Empty => "empty",
        BufferState::Buffering => "buffering",
        BufferState::Running => "running",
        BufferState::CatchingUp => "catching up",
        BufferState::Reconnecting => "reconnecting",
    };
    let text = format!(
        "Frame: {}  |  Buffered: {}  |  State: {}  |  'q' to quit",
        sync.last_executed_id().unwrap_or(0),
        sync.buffered(),
        state
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_arena(frame: &mut Frame, area: Rect, client: &Client) {
    let ctx = client.ctx();
    let arena = ctx.arena();
    let height = f64::from(arena.height);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" Arena ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .x_bounds([0.0, f64::from(arena.width)])
        .y_bounds([0.0, height])
        .paint(|painter| {
            // Canvas y grows upward, the arena's grows downward.
            for (idx, c) in ctx.combatants().iter().enumerate() {
                let p = c.render_position();
                painter.draw(&Circle {
                    x: f64::from(p.x),
                    y: height - f64::from(p.y),
                    radius: f64::from(c.radius()),
                    color: PALETTE[idx % PALETTE.len()],
                });
            }
            for shot in ctx.projectiles() {
                let p = shot.render_position();
                painter.draw(&Circle {
                    x: f64::from(p.x),
                    y: height - f64::from(p.y),
                    radius: f64::from(shot.radius()),
                    color: Color::Yellow,
                });
            }
        });

    frame.render_widget(canvas, area);
}

fn render_hit_points(frame: &mut Frame, area: Rect, client: &Client) {
    let ctx = client.ctx();
    let max = f64::from(ctx.arena().hit_points.max(1));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    for (idx, (c, slot)) in ctx.combatants().iter().zip(slots.iter()).enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        let name = if c.profile.name.is_empty() {
            c.id().to_string()
        } else {
            c.profile.name.clone()
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(format!(" {} ", name))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            )
            .gauge_style(Style::default().fg(color))
            .ratio((f64::from(c.hit_points()) / max).min(1.0))
            .label(format!("{} hp", c.hit_points()));
        frame.render_widget(gauge, *slot);
    }
}

fn render_telemetry(frame: &mut Frame, area: Rect, client: &Client, now_ms: u64) {
    let block = Block::default()
        .title(" Sync ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let overlay = client.sync().debug_overlay(now_ms);
    let lines: Vec<Line> = overlay
        .lines()
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::White))))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, log: &VecDeque<(LogLevel, String)>) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = log
        .iter()
        .skip(log.len().saturating_sub(visible))
        .map(|(level, message)| {
            let style = match level {
                LogLevel::Info => Style::default().fg(Color::Gray),
                LogLevel::Warn => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            };
            Line::from(Span::styled(message.clone(), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
