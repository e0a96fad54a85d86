use crate::{
    engine::config::TrackerConfig,
    io::peaks::{Peak, PeakBuffer},
};

/*
Gating and Scoring
==================

Both assignment strategies read their costs from `MatchGate::cost`, so the
choice of solver changes which of the eligible pairs win, never which pairs
are eligible.

  gate      |df| <= freq_range  AND  |dl| <= mag_range
            (df in Hz, dl in dB, both measured against the track's last value)

  cost      w_f * |df| / freq_range  +  w_m * |dl| / mag_range      in [0, 1]

  score     1 - cost

  accept    score >= track_prob

Birth uses two offsets below the loudest peak of the frame:

    level
      ▲
  max ┤ ───────────── loudest peak
      │   confident   (always born)
 +high┤ ─────────────
      │   marginal    (born only if last frame had a peak nearby)
 +low ┤ ─────────────
      │   rejected
*/

const FREQ_WEIGHT: f32 = 0.5;
const MAG_WEIGHT: f32 = 0.5;

/// Pairing rule shared by every solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchGate {
    pub freq_range: f32,
    pub mag_range: f32,
    /// Lowest acceptable score (`track_prob`)
    pub min_score: f32,
}

impl MatchGate {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            freq_range: config.track_freq_range,
            mag_range: config.track_mag_range,
            min_score: config.track_prob,
        }
    }

    /// Cost of continuing a track at (`frequency`, `level`) with `peak`, or
    /// `None` when the pair is outside the gate or scores too low.
    pub fn cost(&self, frequency: f32, level: f32, peak: &Peak) -> Option<f32> {
        let df = (peak.frequency - frequency).abs();
        let dl = (peak.level - level).abs();
        if !(df <= self.freq_range && dl <= self.mag_range) {
            return None;
        }

        let cost = FREQ_WEIGHT * df / self.freq_range + MAG_WEIGHT * dl / self.mag_range;
        if score(cost) >= self.min_score {
            Some(cost)
        } else {
            None
        }
    }
}

pub fn score(cost: f32) -> f32 {
    1.0 - cost
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BirthBand {
    Confident,
    Marginal,
    Rejected,
}

/// Dual-threshold birth rule relative to the frame's loudest peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthGate {
    pub low: f32,
    pub high: f32,
    freq_range: f32,
    mag_range: f32,
}

impl BirthGate {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            low: config.birth_low_threshold,
            high: config.birth_high_threshold,
            freq_range: config.track_freq_range,
            mag_range: config.track_mag_range,
        }
    }

    pub fn band(&self, level: f32, max_level: f32) -> BirthBand {
        if level >= max_level + self.high {
            BirthBand::Confident
        } else if level >= max_level + self.low {
            BirthBand::Marginal
        } else {
            BirthBand::Rejected
        }
    }

    /// Whether an unmatched peak may start a track. Marginal peaks need a
    /// neighbour in the previous frame's candidates.
    pub fn is_eligible(&self, peak: &Peak, max_level: f32, previous: &PeakBuffer) -> bool {
        match self.band(peak.level, max_level) {
            BirthBand::Confident => true,
            BirthBand::Marginal => {
                previous.contains_near(peak.frequency, peak.level, self.freq_range, self.mag_range)
            }
            BirthBand::Rejected => false,
        }
    }
}
