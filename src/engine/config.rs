//! Tracker configuration.
//!
//! Plain fields with a `validate` pass. A rejected configuration never
//! reaches the engine, which keeps running with the one it had.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{io::converter::MagnitudeScale, MAX_VOICES};

/// Assignment strategy used to pair tracks with peaks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Lowest cost first, O(E log E)
    #[default]
    Greedy,
    /// Minimum total cost (Hungarian), O(n^3)
    Optimal,
}

/// How reported voices are laid out across output slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotOrder {
    /// Reported tracks fill slots from 0 in internal track-slot order
    #[default]
    TrackIndex,
    /// Slot `i` always carries voice `i`
    VoiceId,
}

/// Which birth-eligible peaks win when track slots run out.
///
/// Only peaks that survive ingest compete, and ingest keeps the loudest
/// `max_peaks`. With `max_peaks == max_voices` (what `with_voices` sets),
/// `Lowest` only reorders peaks already chosen by loudness; raise
/// `max_peaks` for it to reach quieter low partials.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BirthPriority {
    #[default]
    Loudest,
    Lowest,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Polyphony: output width, id pool size, and live track limit
    pub max_voices: usize,
    /// Matched frames required before a track is confirmed
    pub min_track_length: u32,
    /// Looser birth offset in dB below the frame peak (marginal band)
    pub birth_low_threshold: f32,
    /// Stricter birth offset in dB below the frame peak (confident band)
    pub birth_high_threshold: f32,
    pub strategy: Strategy,
    /// Largest level difference in dB a match may span
    pub track_mag_range: f32,
    /// Largest frequency difference in Hz a match may span
    pub track_freq_range: f32,
    /// Minimum match score in `[0, 1)`; higher is stricter
    pub track_prob: f32,
    /// Peak slots considered per frame
    pub max_peaks: usize,
    pub magnitude_scale: MagnitudeScale,
    /// Frames an unmatched confirmed track survives before it is pruned
    pub grace_frames: u32,
    pub slot_order: SlotOrder,
    pub birth_priority: BirthPriority,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_voices: 8,
            min_track_length: 2,
            birth_low_threshold: -60.0,
            birth_high_threshold: -24.0,
            strategy: Strategy::Greedy,
            track_mag_range: 15.0,
            track_freq_range: 50.0,
            track_prob: 0.5,
            max_peaks: 8,
            magnitude_scale: MagnitudeScale::Decibels,
            grace_frames: 0,
            slot_order: SlotOrder::TrackIndex,
            birth_priority: BirthPriority::Loudest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_voices must be between 1 and {max}, got {got}")]
    VoiceCount { got: usize, max: usize },
    #[error("max_peaks must be between 1 and {max}, got {got}")]
    PeakCount { got: usize, max: usize },
    #[error("min_track_length must be at least 1")]
    ZeroTrackLength,
    #[error("birth thresholds must satisfy low <= high <= 0 dB, got low {low} and high {high}")]
    BirthThresholds { low: f32, high: f32 },
    #[error("{name} must be a positive finite range, got {value}")]
    Range { name: &'static str, value: f32 },
    #[error("track_prob must lie in [0, 1), got {0}")]
    TrackProb(f32),
}

impl TrackerConfig {
    /// Config with `max_voices` set and `max_peaks` following it.
    pub fn with_voices(max_voices: usize) -> Self {
        Self {
            max_voices,
            max_peaks: max_voices,
            ..Self::default()
        }
    }

    pub fn with_min_track_length(mut self, frames: u32) -> Self {
        self.min_track_length = frames;
        self
    }

    pub fn with_birth_thresholds(mut self, low: f32, high: f32) -> Self {
        self.birth_low_threshold = low;
        self.birth_high_threshold = high;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_ranges(mut self, freq_range: f32, mag_range: f32) -> Self {
        self.track_freq_range = freq_range;
        self.track_mag_range = mag_range;
        self
    }

    pub fn with_track_prob(mut self, track_prob: f32) -> Self {
        self.track_prob = track_prob;
        self
    }

    pub fn with_max_peaks(mut self, max_peaks: usize) -> Self {
        self.max_peaks = max_peaks;
        self
    }

    pub fn with_magnitude_scale(mut self, scale: MagnitudeScale) -> Self {
        self.magnitude_scale = scale;
        self
    }

    pub fn with_grace_frames(mut self, frames: u32) -> Self {
        self.grace_frames = frames;
        self
    }

    pub fn with_slot_order(mut self, order: SlotOrder) -> Self {
        self.slot_order = order;
        self
    }

    pub fn with_birth_priority(mut self, priority: BirthPriority) -> Self {
        self.birth_priority = priority;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_voices == 0 || self.max_voices > MAX_VOICES {
            return Err(ConfigError::VoiceCount {
                got: self.max_voices,
                max: MAX_VOICES,
            });
        }
        if self.max_peaks == 0 || self.max_peaks > MAX_VOICES {
            return Err(ConfigError::PeakCount {
                got: self.max_peaks,
                max: MAX_VOICES,
            });
        }
        if self.min_track_length == 0 {
            return Err(ConfigError::ZeroTrackLength);
        }

        let (low, high) = (self.birth_low_threshold, self.birth_high_threshold);
        if !low.is_finite() || !high.is_finite() || low > high || high > 0.0 {
            return Err(ConfigError::BirthThresholds { low, high });
        }

        for (name, value) in [
            ("track_freq_range", self.track_freq_range),
            ("track_mag_range", self.track_mag_range),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Range { name, value });
            }
        }

        if !(0.0..1.0).contains(&self.track_prob) {
            return Err(ConfigError::TrackProb(self.track_prob));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_voices_rejected() {
        let config = TrackerConfig::with_voices(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::VoiceCount { got: 0, max: MAX_VOICES })
        );
    }

    #[test]
    fn zero_track_length_rejected() {
        let config = TrackerConfig::default().with_min_track_length(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTrackLength));
    }

    #[test]
    fn inverted_birth_thresholds_rejected() {
        let config = TrackerConfig::default().with_birth_thresholds(-10.0, -30.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BirthThresholds { .. })
        ));

        let above_peak = TrackerConfig::default().with_birth_thresholds(-10.0, 3.0);
        assert!(above_peak.validate().is_err());
    }

    #[test]
    fn ranges_must_be_positive() {
        let config = TrackerConfig::default().with_ranges(0.0, 10.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Range { name: "track_freq_range", .. })
        ));

        let nan = TrackerConfig::default().with_ranges(10.0, f32::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn track_prob_must_be_below_one() {
        assert!(TrackerConfig::default().with_track_prob(1.0).validate().is_err());
        assert!(TrackerConfig::default().with_track_prob(-0.1).validate().is_err());
        assert!(TrackerConfig::default().with_track_prob(0.0).validate().is_ok());
    }

    #[test]
    fn with_voices_tracks_peak_width() {
        let config = TrackerConfig::with_voices(3);
        assert_eq!(config.max_voices, 3);
        assert_eq!(config.max_peaks, 3);
    }
}
