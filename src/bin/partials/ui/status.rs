//! Status bar widget - shows source, strategy, polyphony and pool usage

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_partials::{io::converter::SILENT_FRAME_DB, Strategy, TrackerConfig};

use super::FrameSnapshot;

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    config: &TrackerConfig,
    snapshot: Option<&FrameSnapshot>,
    source_label: &str,
    sample_rate: f32,
) {
    let block = Block::default().title(" partials ").borders(Borders::ALL);

    let strategy = match config.strategy {
        Strategy::Greedy => "Greedy",
        Strategy::Optimal => "Optimal",
    };
    let grace = if config.grace_frames > 0 {
        format!("Grace {}  ", config.grace_frames)
    } else {
        "Grace off  ".to_string()
    };

    let mut spans = vec![
        Span::styled(
            format!(" {source_label} {:.1}kHz  ", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{strategy}  "), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("Voices {}  ", config.max_voices),
            Style::default().fg(Color::White),
        ),
        Span::styled(grace, Style::default().fg(Color::Yellow)),
    ];

    match snapshot {
        Some(snapshot) => {
            // The snapshot lags a control change by a frame or two
            let pending = snapshot.strategy != config.strategy
                || snapshot.max_voices != config.max_voices
                || snapshot.grace_frames != config.grace_frames;
            spans.push(Span::styled(
                format!(
                    "Active {}/{}  Tracks {}  ",
                    snapshot.active_voices,
                    snapshot.active_voices + snapshot.free_voices,
                    snapshot.track_count
                ),
                Style::default().fg(if snapshot.free_voices == 0 {
                    Color::Red
                } else {
                    Color::Green
                }),
            ));
            spans.push(Span::styled(
                format!("Frame {}  ", snapshot.frame_index),
                Style::default().fg(Color::DarkGray),
            ));
            let level = if snapshot.frame_level <= SILENT_FRAME_DB {
                "Peak --".to_string()
            } else {
                format!("Peak {:.1} dB", snapshot.frame_level)
            };
            spans.push(Span::styled(level, Style::default().fg(Color::Magenta)));
            if pending {
                spans.push(Span::styled("  (applying)", Style::default().fg(Color::Yellow)));
            }
        }
        None => spans.push(Span::styled(
            "waiting for audio",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
