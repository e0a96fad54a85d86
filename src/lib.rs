pub mod engine; // Tracker, voice pool, configuration
pub mod io; // Peak ingest and output frames
pub mod tracking; // Scoring, assignment and lifecycle

pub use engine::{
    allocator::VoiceId,
    config::{BirthPriority, ConfigError, SlotOrder, Strategy, TrackerConfig},
    message::{MessageReceiver, TrackerMessage},
    VoiceTracker,
};
pub use io::{converter::MagnitudeScale, OutputSlot, VoiceState};

/// Upper bound on `max_voices` and `max_peaks`.
pub const MAX_VOICES: usize = 256;
