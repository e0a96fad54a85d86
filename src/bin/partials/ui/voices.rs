//! Voice widgets - the current output frame as a table, and recent
//! frequency trails per voice id

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Row, Table},
    Frame,
};
use saavy_partials::{io::converter::freq_to_midi, VoiceState};

use super::{FrameSnapshot, MAX_DISPLAY_VOICES};

/// Frames of history kept per voice
const TRAIL_FRAMES: u64 = 200;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const VOICE_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightGreen,
];

fn voice_color(voice: i32) -> Color {
    VOICE_COLORS[voice.rem_euclid(VOICE_COLORS.len() as i32) as usize]
}

/// Nearest note name and cents offset, e.g. `A4 +3`
fn note_label(frequency: f32) -> String {
    let Some(midi) = freq_to_midi(frequency) else {
        return String::new();
    };
    let nearest = midi.round();
    let cents = ((midi - nearest) * 100.0).round() as i32;
    let note = nearest as i32;
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    let octave = note.div_euclid(12) - 1;
    format!("{name}{octave} {cents:+}")
}

pub fn render_voices(frame: &mut Frame, area: Rect, snapshot: Option<&FrameSnapshot>) {
    let block = Block::default().title(" Voices ").borders(Borders::ALL);

    let header = Row::new(vec!["slot", "voice", "freq", "note", "dB", "state"])
        .style(Style::default().fg(Color::DarkGray));

    let rows: Vec<Row> = snapshot
        .map(FrameSnapshot::slots)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            if slot.is_empty() {
                return Row::new(vec![
                    Cell::from(format!("{i:>2}")),
                    Cell::from("-"),
                    Cell::from(""),
                    Cell::from(""),
                    Cell::from(""),
                    Cell::from(""),
                ])
                .style(Style::default().fg(Color::DarkGray));
            }

            let (state, style) = match slot.state {
                VoiceState::Attack => (
                    "attack",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                VoiceState::Sustain => ("sustain", Style::default()),
                VoiceState::Release => ("release", Style::default().fg(Color::DarkGray)),
                VoiceState::Free => ("", Style::default()),
            };

            Row::new(vec![
                Cell::from(format!("{i:>2}")),
                Cell::from(format!("v{}", slot.voice))
                    .style(Style::default().fg(voice_color(slot.voice))),
                Cell::from(format!("{:>8.1}", slot.frequency)),
                Cell::from(note_label(slot.frequency)),
                Cell::from(format!("{:>6.1}", slot.magnitude)),
                Cell::from(state),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Min(7),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

/// Frequency history per voice id as `(frame, log2 Hz)` points.
pub struct Trails {
    points: Vec<Vec<(f64, f64)>>,
    latest_frame: u64,
}

impl Trails {
    pub fn new() -> Self {
        Self {
            points: vec![Vec::new(); MAX_DISPLAY_VOICES],
            latest_frame: 0,
        }
    }

    pub fn record(&mut self, snapshot: &FrameSnapshot) {
        self.latest_frame = snapshot.frame_index;
        for slot in snapshot.slots() {
            let Some(trail) = slot
                .voice_id()
                .and_then(|id| self.points.get_mut(id.index()))
            else {
                continue;
            };
            trail.push((snapshot.frame_index as f64, (slot.frequency as f64).log2()));
        }

        let oldest = self.oldest_frame() as f64;
        for trail in &mut self.points {
            let stale = trail.iter().take_while(|(frame, _)| *frame < oldest).count();
            if stale > 0 {
                trail.drain(..stale);
            }
        }
    }

    pub fn clear(&mut self) {
        for trail in &mut self.points {
            trail.clear();
        }
    }

    fn oldest_frame(&self) -> u64 {
        self.latest_frame.saturating_sub(TRAIL_FRAMES)
    }
}

pub fn render_trails(frame: &mut Frame, area: Rect, trails: &Trails) {
    let block = Block::default().title(" Trails ").borders(Borders::ALL);

    let datasets: Vec<Dataset> = trails
        .points
        .iter()
        .enumerate()
        .filter(|(_, points)| !points.is_empty())
        .map(|(voice, points)| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(voice_color(voice as i32)))
                .data(points)
        })
        .collect();

    let x_min = trails.oldest_frame() as f64;
    let x_max = (trails.latest_frame as f64).max(x_min + 1.0);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            // 50 Hz to 5 kHz
            Axis::default()
                .bounds([50f64.log2(), 5000f64.log2()])
                .labels(vec!["50", "500", "5k"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
