//! Peak ingest - raw analysis slots to a compact candidate list.
//!
//! An analysis stage hands over a fixed-width pair of arrays where unused
//! slots are zero. The buffer below keeps only the populated ones, in slot
//! order, inside storage sized once at configure time.

use super::converter::{MagnitudeScale, SILENT_FRAME_DB};

/// One spectral peak considered for tracking this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Frequency in Hz
    pub frequency: f32,
    /// Magnitude exactly as the caller supplied it
    pub magnitude: f32,
    /// Magnitude normalised to dB, used for gating and scoring
    pub level: f32,
    /// Set once the assignment stage pairs this peak with a track
    pub matched: bool,
}

impl Peak {
    pub fn new(frequency: f32, magnitude: f32, scale: MagnitudeScale) -> Self {
        Self {
            frequency,
            magnitude,
            level: scale.to_level(magnitude),
            matched: false,
        }
    }

    /// Empty slots (zero frequency or zero magnitude) and garbage values are
    /// not peaks.
    fn is_valid(frequency: f32, magnitude: f32, scale: MagnitudeScale) -> bool {
        if !frequency.is_finite() || !magnitude.is_finite() {
            return false;
        }
        if frequency <= 0.0 || magnitude == 0.0 {
            return false;
        }
        match scale {
            MagnitudeScale::Linear => magnitude > 0.0,
            MagnitudeScale::Decibels => true,
        }
    }
}

/// Reusable per-frame candidate storage.
#[derive(Debug, Clone)]
pub struct PeakBuffer {
    peaks: Vec<Peak>,
    capacity: usize,
    max_level: f32,
}

impl PeakBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            peaks: Vec::with_capacity(capacity),
            capacity,
            max_level: SILENT_FRAME_DB,
        }
    }

    /// Change the capacity. Configure-time only: this may allocate.
    pub fn resize(&mut self, capacity: usize) {
        self.peaks.clear();
        if capacity > self.peaks.capacity() {
            self.peaks.reserve_exact(capacity);
        }
        self.capacity = capacity;
        self.max_level = SILENT_FRAME_DB;
    }

    /// Replace the contents with this frame's populated slots.
    ///
    /// Returns how many raw slots were read, which lets the caller notice a
    /// change in input width. Once the buffer is full, a newcomer evicts the
    /// weakest held peak if it is louder, otherwise it is dropped. Survivors
    /// keep their relative slot order.
    pub fn ingest<I>(&mut self, slots: I, scale: MagnitudeScale) -> usize
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        self.peaks.clear();
        self.max_level = SILENT_FRAME_DB;

        let mut width = 0;
        for (frequency, magnitude) in slots {
            width += 1;
            if self.capacity == 0 || !Peak::is_valid(frequency, magnitude, scale) {
                continue;
            }

            let peak = Peak::new(frequency, magnitude, scale);
            if self.peaks.len() < self.capacity {
                self.peaks.push(peak);
                continue;
            }

            if let Some(weakest) = self.weakest_index() {
                if peak.level > self.peaks[weakest].level {
                    // remove() shifts in place, no reallocation
                    self.peaks.remove(weakest);
                    self.peaks.push(peak);
                }
            }
        }

        self.max_level = self
            .peaks
            .iter()
            .map(|p| p.level)
            .fold(SILENT_FRAME_DB, f32::max);

        width
    }

    fn weakest_index(&self) -> Option<usize> {
        self.peaks
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.level.total_cmp(&b.level))
            .map(|(idx, _)| idx)
    }

    /// True if any held peak lies within both ranges of the given point.
    pub fn contains_near(&self, frequency: f32, level: f32, freq_range: f32, mag_range: f32) -> bool {
        self.peaks.iter().any(|p| {
            (p.frequency - frequency).abs() <= freq_range && (p.level - level).abs() <= mag_range
        })
    }

    pub fn clear(&mut self) {
        self.peaks.clear();
        self.max_level = SILENT_FRAME_DB;
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn peaks_mut(&mut self) -> &mut [Peak] {
        &mut self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Loudest normalised level this frame, or the silent sentinel.
    pub fn max_level(&self) -> f32 {
        self.max_level
    }
}
