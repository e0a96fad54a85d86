//! TUI module for partials
//!
//! Renders the analysis spectrum, the tracker's voice frame and recent voice
//! trails. Keys are turned into `TrackerMessage`s for the analysis thread.

mod spectrum;
mod state;
mod status;
mod voices;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use saavy_partials::{Strategy, TrackerConfig, TrackerMessage};
use std::time::Duration;
use tracing::{debug, warn};

pub use state::{FrameSnapshot, MAX_DISPLAY_VOICES};

use crate::analysis::{display_frequencies, SPECTRUM_BINS};
use spectrum::render_spectrum;
use status::render_status;
use voices::{render_trails, render_voices, Trails};

/// Grace frames used when grace is toggled on
const GRACE_ON: u32 = 2;

/// UI application state
pub struct UiApp {
    /// Snapshots from the analysis thread
    snapshot_rx: Consumer<FrameSnapshot>,
    /// Control messages to the analysis thread
    control_tx: Producer<TrackerMessage>,
    /// Configuration last sent to the tracker
    config: TrackerConfig,
    /// Latest snapshot, if any arrived yet
    current: Option<FrameSnapshot>,
    trails: Trails,
    source_label: String,
    sample_rate: f32,
    spectrum_freqs: [f64; SPECTRUM_BINS],
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        snapshot_rx: Consumer<FrameSnapshot>,
        control_tx: Producer<TrackerMessage>,
        config: TrackerConfig,
        source_label: String,
        sample_rate: f32,
    ) -> Self {
        Self {
            snapshot_rx,
            control_tx,
            config,
            current: None,
            trails: Trails::new(),
            source_label,
            sample_rate,
            spectrum_freqs: display_frequencies(sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_snapshots();

            terminal
                .draw(|frame| self.render(frame))
                .wrap_err("failed to draw frame")?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16)).wrap_err("failed to poll terminal events")? {
                if let Event::Key(key) = event::read().wrap_err("failed to read terminal event")? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_snapshots(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.pop() {
            self.trails.record(&snapshot);
            self.current = Some(snapshot);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let mut next = self.config;
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.trails.clear();
                self.send(TrackerMessage::Clear);
                return;
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                next.strategy = match next.strategy {
                    Strategy::Greedy => Strategy::Optimal,
                    Strategy::Optimal => Strategy::Greedy,
                };
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                next.grace_frames = if next.grace_frames == 0 { GRACE_ON } else { 0 };
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                next.max_voices = (next.max_voices + 1).min(MAX_DISPLAY_VOICES);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                next.max_voices = next.max_voices.saturating_sub(1).max(1);
            }
            _ => return,
        }

        if next != self.config {
            // Any configuration change resets the tracker
            self.trails.clear();
            self.send(TrackerMessage::Configure(next));
            self.config = next;
        }
    }

    fn send(&mut self, message: TrackerMessage) {
        match self.control_tx.push(message) {
            Ok(()) => debug!(?message, "sent control message"),
            Err(_) => warn!(?message, "control queue full, message dropped"),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: status, spectrum + voices, trails, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(10),    // Spectrum and voice table
                Constraint::Length(12), // Voice trails
                Constraint::Length(1),  // Help bar
            ])
            .split(area);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_status(
            frame,
            chunks[0],
            &self.config,
            self.current.as_ref(),
            &self.source_label,
            self.sample_rate,
        );
        render_spectrum(frame, middle[0], &self.spectrum_freqs, self.current.as_ref());
        render_voices(frame, middle[1], self.current.as_ref());
        render_trails(frame, chunks[2], &self.trails);

        let help = Paragraph::new(
            " [Q] Quit  [S] Strategy  [C] Clear  [+/-] Voices  [G] Grace",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
