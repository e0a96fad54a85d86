//! Spectrum widget
//!
//! Log-frequency spectrum line with the tracked voices overlaid as points.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use saavy_partials::VoiceState;

use super::FrameSnapshot;
use crate::analysis::SPECTRUM_BINS;

const FLOOR_DB: f64 = -100.0;

pub fn render_spectrum(
    frame: &mut Frame,
    area: Rect,
    freqs: &[f64; SPECTRUM_BINS],
    snapshot: Option<&FrameSnapshot>,
) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    // x is log10(Hz) so the log-spaced bins sit evenly
    let spectrum: Vec<(f64, f64)> = match snapshot {
        Some(snapshot) => freqs
            .iter()
            .zip(&snapshot.spectrum)
            .map(|(&f, &db)| (f.log10(), (db as f64).max(FLOOR_DB)))
            .collect(),
        None => freqs.iter().map(|&f| (f.log10(), FLOOR_DB)).collect(),
    };

    let (sounding, releasing): (Vec<(f64, f64)>, Vec<(f64, f64)>) = {
        let mut sounding = Vec::new();
        let mut releasing = Vec::new();
        for slot in snapshot.map(FrameSnapshot::slots).unwrap_or_default() {
            if slot.is_empty() || slot.frequency <= 0.0 {
                continue;
            }
            let point = ((slot.frequency as f64).log10(), slot.magnitude as f64);
            if slot.state == VoiceState::Release {
                releasing.push(point);
            } else {
                sounding.push(point);
            }
        }
        (sounding, releasing)
    };

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&spectrum),
        Dataset::default()
            .name("voices")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&sounding),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::DarkGray))
            .data(&releasing),
    ];

    let min_x = freqs[0].log10();
    let max_x = freqs[SPECTRUM_BINS - 1].log10().max(min_x + 1.0);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["30", "300", "3k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
