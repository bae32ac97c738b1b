//! Interactive terminal front-end built on crossterm + ratatui.
//!
//! The shell owns the idle array and all user-facing policy (size, speed,
//! algorithm choice). While a run is active it only renders the snapshots the
//! engine publishes and forwards user intent (stop, speed retune) into the
//! run handle; structural controls are locked until the run settles.

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use sortscope_core::{
    start, Algorithm, Counters, Element, RunHandle, RunOutcome, VisualState,
};
use tracing::{info, warn};

use crate::{
    generate_elements, pacing_for_speed, SharedFrame, ARRAY_SIZE_STEP, MAX_ARRAY_SIZE,
    MIN_ARRAY_SIZE, VALUE_FLOOR, VALUE_SPAN,
};

const UI_TICK_MILLIS: u64 = 33;
const DEFAULT_ARRAY_SIZE: usize = 50;
const DEFAULT_SPEED: u32 = 50;
const SPEED_STEP: u32 = 5;
const HEADLESS_ENV: &str = "SORTSCOPE_HEADLESS";

/// Terminal renderer configuration.
pub struct TerminalShell {
    draw_interval: Duration,
}

impl Default for TerminalShell {
    fn default() -> Self {
        Self {
            draw_interval: Duration::from_millis(UI_TICK_MILLIS),
        }
    }
}

impl TerminalShell {
    /// Launch the shell; blocks until the user quits.
    ///
    /// With `SORTSCOPE_HEADLESS` set, runs one full sort without touching the
    /// terminal and logs a summary instead.
    pub fn run(&self) -> Result<()> {
        if std::env::var_os(HEADLESS_ENV).is_some() {
            let report = run_headless(Algorithm::Bubble, DEFAULT_ARRAY_SIZE, 0xC0FF_EE00)?;
            info!(
                algorithm = report.algorithm.key(),
                len = report.len,
                frames = report.frames,
                "headless run completed"
            );
            return Ok(());
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to build terminal backend")?;
        terminal.hide_cursor().ok();

        let result = run_event_loop(self, &mut terminal);

        terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }

        result
    }
}

fn run_event_loop(
    shell: &TerminalShell,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<()> {
    let mut app = ShellApp::new();
    let mut last_draw = Instant::now()
        .checked_sub(shell.draw_interval)
        .unwrap_or_else(Instant::now);

    loop {
        app.refresh_frame();
        app.settle_run_if_complete();

        let now = Instant::now();
        if now.duration_since(last_draw) >= shell.draw_interval {
            terminal.draw(|frame| app.draw(frame))?;
            last_draw = now;
        }

        if event::poll(shell.draw_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key)? {
                    break;
                }
            }
        }
    }

    app.abandon_run();
    Ok(())
}

/// Summary returned by a headless run, for smoke tests and logging.
#[derive(Debug)]
pub struct HeadlessReport {
    pub algorithm: Algorithm,
    pub len: usize,
    pub outcome: RunOutcome,
    pub frames: usize,
}

/// Run one algorithm to completion at zero pacing without a terminal.
pub fn run_headless(algorithm: Algorithm, size: usize, seed: u64) -> Result<HeadlessReport> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let elements = generate_elements(size, &mut rng);
    let frames = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&frames);
    let handle = start(&elements, Duration::ZERO, algorithm.key(), move |_snapshot| {
        if let Ok(mut count) = counter.lock() {
            *count += 1;
        }
    })
    .context("failed to start headless run")?;
    let outcome = handle.wait();
    let frames = frames.lock().map(|count| *count).unwrap_or(0);
    Ok(HeadlessReport {
        algorithm,
        len: size,
        outcome,
        frames,
    })
}

enum RunStatus {
    Idle,
    Running,
    Sorted,
    Stopped,
    Failed,
}

impl RunStatus {
    fn text(&self) -> &'static str {
        match self {
            Self::Idle => "READY",
            Self::Running => "SORTING",
            Self::Sorted => "SORTED",
            Self::Stopped => "STOPPED",
            Self::Failed => "FAILED",
        }
    }

    fn style(&self) -> Style {
        let color = match self {
            Self::Idle => Color::Gray,
            Self::Running => Color::Yellow,
            Self::Sorted => Color::Green,
            Self::Stopped => Color::Blue,
            Self::Failed => Color::Red,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}

struct ActiveRun {
    handle: RunHandle,
    frame: SharedFrame,
}

struct ShellApp {
    rng: SmallRng,
    algorithm_index: usize,
    array_size: usize,
    speed: u32,
    elements: Vec<Element>,
    counters: Counters,
    elapsed: Duration,
    status: RunStatus,
    message: String,
    run: Option<ActiveRun>,
}

impl ShellApp {
    fn new() -> Self {
        let mut rng = SmallRng::from_os_rng();
        let elements = generate_elements(DEFAULT_ARRAY_SIZE, &mut rng);
        Self {
            rng,
            algorithm_index: 0,
            array_size: DEFAULT_ARRAY_SIZE,
            speed: DEFAULT_SPEED,
            elements,
            counters: Counters::default(),
            elapsed: Duration::ZERO,
            status: RunStatus::Idle,
            message: "space to start sorting".to_string(),
            run: None,
        }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::ALL[self.algorithm_index % Algorithm::ALL.len()]
    }

    fn is_running(&self) -> bool {
        self.run.is_some()
    }

    fn regenerate(&mut self) {
        self.elements = generate_elements(self.array_size, &mut self.rng);
        self.counters = Counters::default();
        self.elapsed = Duration::ZERO;
        self.status = RunStatus::Idle;
        self.message = "new array generated".to_string();
    }

    fn start_run(&mut self) -> Result<()> {
        let frame: SharedFrame = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&frame);
        let handle = start(
            &self.elements,
            pacing_for_speed(self.speed),
            self.algorithm().key(),
            move |snapshot| {
                if let Ok(mut slot) = sink.lock() {
                    *slot = Some(snapshot);
                }
            },
        )
        .context("failed to start sorting run")?;

        self.run = Some(ActiveRun { handle, frame });
        self.counters = Counters::default();
        self.elapsed = Duration::ZERO;
        self.status = RunStatus::Running;
        self.message = format!("{} running", self.algorithm().label());
        Ok(())
    }

    /// Pull the latest published snapshot into the drawable state.
    fn refresh_frame(&mut self) {
        if let Some(run) = &self.run {
            if let Ok(slot) = run.frame.lock() {
                if let Some(snapshot) = slot.as_ref() {
                    self.elements = snapshot.elements.clone();
                    self.counters = snapshot.counters;
                    self.elapsed = snapshot.elapsed;
                }
            }
        }
    }

    /// Classify a settled run and unlock the structural controls.
    fn settle_run_if_complete(&mut self) {
        let run = match self.run.take_if(|run| run.handle.is_complete()) {
            Some(run) => run,
            None => return,
        };
        match run.handle.wait() {
            RunOutcome::Finished { elements, counters } => {
                self.elements = elements;
                self.counters = counters;
                self.status = RunStatus::Sorted;
                self.message = "sorted — space for a new array".to_string();
            }
            RunOutcome::Stopped => {
                self.status = RunStatus::Stopped;
                self.message = "stopped — space to sort again, r to reset".to_string();
            }
            RunOutcome::Failed { message } => {
                warn!(message = %message, "sorting run failed");
                self.status = RunStatus::Failed;
                self.message = format!("run failed: {message}");
            }
        }
    }

    /// Stop and discard an in-flight run (shutdown path).
    fn abandon_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.handle.stop();
            let _ = run.handle.wait();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char(' ') => {
                if let Some(run) = &self.run {
                    run.handle.stop();
                    self.message = "stopping...".to_string();
                } else if matches!(self.status, RunStatus::Sorted) {
                    self.regenerate();
                } else {
                    self.start_run()?;
                }
            }
            KeyCode::Char('r') => {
                if self.is_running() {
                    self.message = "stop the run before resetting".to_string();
                } else {
                    self.regenerate();
                }
            }
            KeyCode::Char('a') => {
                if self.is_running() {
                    self.message = "algorithm locked while sorting".to_string();
                } else {
                    self.algorithm_index = (self.algorithm_index + 1) % Algorithm::ALL.len();
                    self.status = RunStatus::Idle;
                    self.message = format!(
                        "{} {}",
                        self.algorithm().label(),
                        self.algorithm().complexity()
                    );
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if self.is_running() {
                    self.message = "array size locked while sorting".to_string();
                } else {
                    self.array_size = (self.array_size + ARRAY_SIZE_STEP).min(MAX_ARRAY_SIZE);
                    self.regenerate();
                }
            }
            KeyCode::Char('-') => {
                if self.is_running() {
                    self.message = "array size locked while sorting".to_string();
                } else {
                    self.array_size = self
                        .array_size
                        .saturating_sub(ARRAY_SIZE_STEP)
                        .max(MIN_ARRAY_SIZE);
                    self.regenerate();
                }
            }
            KeyCode::Char(']') => {
                self.speed = (self.speed + SPEED_STEP).min(100);
                self.apply_speed();
            }
            KeyCode::Char('[') => {
                self.speed = self.speed.saturating_sub(SPEED_STEP).max(1);
                self.apply_speed();
            }
            _ => {}
        }
        Ok(false)
    }

    fn apply_speed(&mut self) {
        self.message = format!("speed {}%", self.speed);
        if let Some(run) = &self.run {
            run.handle.set_pacing(pacing_for_speed(self.speed));
        }
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_header(frame, outer[0]);
        self.draw_metrics(frame, outer[1]);
        self.draw_chart(frame, outer[2]);
        self.draw_footer(frame, outer[3]);
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let algorithm = self.algorithm();
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", algorithm.label()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(algorithm.complexity(), Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "  size {:>3}  speed {:>3}%  ",
                self.array_size, self.speed
            )),
            Span::styled(format!(" {} ", self.status.text()), self.status.style()),
            Span::raw(format!("  {}", self.message)),
        ]);
        let header = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title(" sortscope "));
        frame.render_widget(header, area);
    }

    fn draw_metrics(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::raw(" comparisons "),
            Span::styled(
                format_count(self.counters.comparisons),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   swaps "),
            Span::styled(
                format_count(self.counters.swaps),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   array accesses "),
            Span::styled(
                format_count(self.counters.array_accesses),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   elapsed "),
            Span::styled(
                format_elapsed(self.elapsed),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]);
        let metrics = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title(" metrics "));
        frame.render_widget(metrics, area);
    }

    fn draw_chart(&self, frame: &mut Frame<'_>, area: Rect) {
        let len = self.elements.len().max(1) as u16;
        let inner_width = area.width.saturating_sub(2);
        let gap = u16::from(inner_width / len > 1);
        let bar_width = ((inner_width.saturating_sub(gap * (len - 1))) / len).max(1);

        let bars: Vec<Bar<'_>> = self
            .elements
            .iter()
            .map(|element| {
                Bar::default()
                    .value(u64::from(element.value))
                    .text_value(String::new())
                    .style(bar_style(element.state))
            })
            .collect();

        let title = format!(" {} elements ", self.elements.len());
        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .bar_width(bar_width)
            .bar_gap(gap)
            .max(u64::from(VALUE_FLOOR + VALUE_SPAN))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let help = Paragraph::new(
            " space start/stop   r reset   a algorithm   +/- size   [/] speed   q quit",
        )
        .alignment(Alignment::Left)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, area);
    }
}

/// Visual-state → presentation mapping. The engine never depends on these
/// colors.
fn bar_style(state: VisualState) -> Style {
    let color = match state {
        VisualState::Default => Color::Gray,
        VisualState::Comparing => Color::Yellow,
        VisualState::Swapping => Color::Red,
        VisualState::Pivot => Color::Magenta,
        VisualState::Sorted => Color::Green,
    };
    Style::default().fg(color)
}

fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
