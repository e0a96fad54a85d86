//! Unit conversions shared by the ingest stage and host code.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scale of the magnitudes handed to the tracker.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnitudeScale {
    /// Linear amplitude; converted to dB before scoring.
    Linear,
    /// Already in dB; used as given. A slot of exactly 0.0 still reads as
    /// empty, so a 0 dBFS peak must be sent as a small negative level.
    #[default]
    Decibels,
}

impl MagnitudeScale {
    /// Normalise a caller magnitude to the dB level used for gating.
    pub fn to_level(self, magnitude: f32) -> f32 {
        match self {
            MagnitudeScale::Linear => amplitude_to_db(magnitude),
            MagnitudeScale::Decibels => magnitude,
        }
    }
}

/// Smallest linear magnitude considered before taking a logarithm.
///
/// `20 * log10(1e-10)` is -200 dB, far below anything an analysis stage
/// reports, so the floor never competes with real peaks.
pub const MAGNITUDE_FLOOR: f32 = 1e-10;

/// Level reported for a frame that contains no candidates at all.
pub const SILENT_FRAME_DB: f32 = -999.0;

/// Linear magnitude to decibels, floored so silence never becomes `-inf`.
pub fn amplitude_to_db(magnitude: f32) -> f32 {
    20.0 * magnitude.max(MAGNITUDE_FLOOR).log10()
}

pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Fractional MIDI note for a frequency in Hz. Returns `None` for
/// non-positive input.
pub fn freq_to_midi(frequency: f32) -> Option<f32> {
    if frequency > 0.0 && frequency.is_finite() {
        Some(69.0 + 12.0 * (frequency / 440.0).log2())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_is_zero_db() {
        assert!(amplitude_to_db(1.0).abs() < 1e-6);
        assert!((amplitude_to_db(0.1) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn zero_magnitude_is_floored() {
        let db = amplitude_to_db(0.0);
        assert!(db.is_finite());
        assert!((db + 200.0).abs() < 1e-3);
    }

    #[test]
    fn db_round_trips_through_amplitude() {
        let amp = db_to_amplitude(-6.0);
        assert!((amplitude_to_db(amp) + 6.0).abs() < 1e-4);
    }

    #[test]
    fn decibel_scale_passes_through() {
        assert_eq!(MagnitudeScale::Decibels.to_level(-20.0), -20.0);
        assert!((MagnitudeScale::Linear.to_level(0.1) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn a4_maps_to_note_69() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((freq_to_midi(440.0).unwrap() - 69.0).abs() < 1e-4);
        assert!(freq_to_midi(0.0).is_none());
    }
}
