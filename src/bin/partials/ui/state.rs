//! Per-frame snapshot sent from the analysis thread to the UI
//!
//! Copy-only and fixed-size so the analysis thread never allocates while
//! publishing.

use saavy_partials::{OutputSlot, Strategy, VoiceTracker};

use crate::analysis::SPECTRUM_BINS;

/// Most voices the UI shows; also the polyphony ceiling of the `+` key
pub const MAX_DISPLAY_VOICES: usize = 32;

#[derive(Clone, Copy, Debug)]
pub struct FrameSnapshot {
    pub frame_index: u64,
    pub strategy: Strategy,
    pub max_voices: usize,
    pub grace_frames: u32,
    pub track_count: usize,
    pub active_voices: usize,
    pub free_voices: usize,
    /// Loudest peak level this frame in dB
    pub frame_level: f32,
    pub slots: [OutputSlot; MAX_DISPLAY_VOICES],
    pub spectrum: [f32; SPECTRUM_BINS],
}

impl FrameSnapshot {
    /// Capture the tracker's emitted frame. Call before `prune`.
    pub fn capture(tracker: &VoiceTracker, spectrum: [f32; SPECTRUM_BINS]) -> Self {
        let mut slots = [OutputSlot::EMPTY; MAX_DISPLAY_VOICES];
        for (slot, emitted) in slots.iter_mut().zip(tracker.output()) {
            *slot = *emitted;
        }

        let config = tracker.config();
        Self {
            frame_index: tracker.frame_index(),
            strategy: config.strategy,
            max_voices: config.max_voices,
            grace_frames: config.grace_frames,
            track_count: tracker.track_count(),
            active_voices: tracker.active_voice_count(),
            free_voices: tracker.free_voice_count(),
            frame_level: tracker.last_frame_level(),
            slots,
            spectrum,
        }
    }

    /// Emitted slots within the configured polyphony.
    pub fn slots(&self) -> &[OutputSlot] {
        &self.slots[..self.max_voices.min(MAX_DISPLAY_VOICES)]
    }
}
