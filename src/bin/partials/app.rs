//! Partials - application builder and runner
//!
//! Three threads: the audio source fills a sample queue, the analysis
//! thread turns samples into peak frames and runs the tracker, and the UI
//! thread renders snapshots and sends control messages back.
//!
//! ```text
//! source ──f32──▶ analysis + tracker ──FrameSnapshot──▶ UI
//!                        ▲                              │
//!                        └──────── TrackerMessage ──────┘
//! ```

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use rtrb::{Consumer, Producer, RingBuffer};
use saavy_partials::{MagnitudeScale, Strategy, TrackerConfig, TrackerMessage, VoiceTracker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::analysis::PeakPicker;
use super::source::Capture;
use super::ui::{FrameSnapshot, UiApp, MAX_DISPLAY_VOICES};

const FFT_SIZE: usize = 4096;
const HOP_SIZE: usize = 1024;

/// Peak slots handed to the tracker each frame
const PEAK_SLOTS: usize = 24;

/// Main application builder
pub struct Partials {
    voices: usize,
    synthetic: bool,
    strategy: Strategy,
}

impl Partials {
    pub fn new() -> Self {
        Self {
            voices: 8,
            synthetic: false,
            strategy: Strategy::Greedy,
        }
    }

    /// Set the starting polyphony
    pub fn voices(mut self, voices: usize) -> Self {
        self.voices = voices.clamp(1, MAX_DISPLAY_VOICES);
        self
    }

    /// Track a generated signal instead of the input device
    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Start with the Hungarian solver
    pub fn optimal(mut self, optimal: bool) -> Self {
        self.strategy = if optimal {
            Strategy::Optimal
        } else {
            Strategy::Greedy
        };
        self
    }

    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::with_voices(self.voices)
            .with_max_peaks(PEAK_SLOTS)
            .with_min_track_length(3)
            .with_birth_thresholds(-60.0, -30.0)
            .with_ranges(40.0, 18.0)
            .with_track_prob(0.3)
            .with_strategy(self.strategy)
            .with_magnitude_scale(MagnitudeScale::Decibels)
    }

    /// Run the application until the user quits
    pub fn run(self) -> EyreResult<()> {
        let capture = if self.synthetic {
            Capture::synthetic()?
        } else {
            match Capture::open_device() {
                Ok(capture) => capture,
                Err(err) => {
                    warn!("input device unavailable, using synthetic source: {err:#}");
                    Capture::synthetic()?
                }
            }
        };

        let config = self.tracker_config();
        let tracker = VoiceTracker::new(config).wrap_err("invalid tracker configuration")?;
        let picker = PeakPicker::new(FFT_SIZE, HOP_SIZE, capture.sample_rate);

        let (control_tx, control_rx) = RingBuffer::<TrackerMessage>::new(64);
        let (snapshot_tx, snapshot_rx) = RingBuffer::<FrameSnapshot>::new(256);

        // The rest of `capture` keeps the source alive until `run` returns
        let samples = capture.samples;
        let sample_rate = capture.sample_rate;
        let label = capture.label.clone();

        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = running.clone();
            let analysis = AnalysisLoop {
                samples,
                control: control_rx,
                snapshots: snapshot_tx,
                tracker,
                picker,
            };
            std::thread::Builder::new()
                .name("partials-analysis".into())
                .spawn(move || analysis.run(&running))
                .wrap_err("failed to spawn analysis thread")?
        };

        info!(source = %label, sample_rate, ?config, "tracker running");

        let mut terminal = ratatui::init();
        let result = UiApp::new(snapshot_rx, control_tx, config, label, sample_rate)
            .run(&mut terminal);
        ratatui::restore();

        running.store(false, Ordering::Relaxed);
        let _ = worker.join();

        result
    }
}

impl Default for Partials {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the analysis thread
struct AnalysisLoop {
    samples: Consumer<f32>,
    control: Consumer<TrackerMessage>,
    snapshots: Producer<FrameSnapshot>,
    tracker: VoiceTracker,
    picker: PeakPicker,
}

impl AnalysisLoop {
    fn run(mut self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            let mut frames = 0usize;
            while let Ok(sample) = self.samples.pop() {
                if self.picker.push(sample) {
                    self.process();
                    frames += 1;
                }
            }
            if frames == 0 {
                std::thread::sleep(Duration::from_millis(2));
            }
        }
        debug!(frames = self.tracker.frame_index(), "analysis thread stopped");
    }

    fn process(&mut self) {
        // Control changes land between frames only
        let applied = self.tracker.apply_messages(&mut self.control);
        if applied > 0 {
            debug!(applied, "applied control messages");
        }

        let width = self.tracker.config().max_peaks;
        let (frequencies, magnitudes) = self.picker.analyze(width);
        self.tracker.process_frame(frequencies, magnitudes);

        let snapshot = FrameSnapshot::capture(&self.tracker, self.picker.display());
        self.tracker.prune();

        // UI fell behind: skip this frame rather than wait
        let _ = self.snapshots.push(snapshot);
    }
}
