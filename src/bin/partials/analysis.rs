//! Short-time spectrum and naive peak picking
//!
//! Hann-windowed FFT over a sliding window. Local maxima above a floor are
//! refined with parabolic interpolation and the loudest ones are written
//! into fixed-width frequency/magnitude slot arrays, zero-padded, which is
//! the layout the tracker ingests.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use saavy_partials::{io::converter::amplitude_to_db, MAX_VOICES};
use std::sync::Arc;

/// Number of log-spaced bins kept for display
pub const SPECTRUM_BINS: usize = 48;

/// Lowest frequency shown and picked
const MIN_FREQ: f32 = 30.0;

/// Local maxima quieter than this are ignored
const PEAK_FLOOR_DB: f32 = -80.0;

/// Log-spaced display frequencies from `MIN_FREQ` to Nyquist (capped at 20 kHz).
pub fn display_frequencies(sample_rate: f32) -> [f64; SPECTRUM_BINS] {
    let max_freq = (sample_rate / 2.0).min(20_000.0).max(MIN_FREQ + 1.0) as f64;
    let min_freq = MIN_FREQ as f64;
    let ratio = max_freq / min_freq;

    let mut freqs = [0.0; SPECTRUM_BINS];
    for (i, freq) in freqs.iter_mut().enumerate() {
        let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
        *freq = min_freq * ratio.powf(t);
    }
    freqs
}

pub struct PeakPicker {
    fft_size: usize,
    hop_size: usize,
    sample_rate: f32,
    /// Hann window coefficients
    window: Vec<f32>,
    /// Amplitude correction for the window's coherent gain
    window_gain: f32,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    /// Circular input history of `fft_size` samples
    history: Vec<f32>,
    write_pos: usize,
    since_hop: usize,
    /// Per-bin level in dB, `fft_size / 2` entries
    spectrum_db: Vec<f32>,
    /// FFT bin for each display frequency
    display_bins: [usize; SPECTRUM_BINS],
    /// `(frequency, dB)` candidates, sized for every possible maximum
    candidates: Vec<(f32, f32)>,
    frequencies: Vec<f32>,
    magnitudes: Vec<f32>,
}

impl PeakPicker {
    pub fn new(fft_size: usize, hop_size: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                if fft_size > 1 {
                    let denom = (fft_size - 1) as f32;
                    0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();
        let window_gain = 2.0 / window.iter().sum::<f32>().max(f32::EPSILON);

        let half = (fft_size / 2).max(1);
        let mut display_bins = [0; SPECTRUM_BINS];
        for (bin, freq) in display_bins.iter_mut().zip(display_frequencies(sample_rate)) {
            let index = (freq * fft_size as f64 / sample_rate as f64).round() as usize;
            *bin = index.min(half - 1);
        }

        Self {
            fft_size,
            hop_size: hop_size.max(1),
            sample_rate,
            window,
            window_gain,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            fft_scratch: vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()],
            fft,
            history: vec![0.0; fft_size],
            write_pos: 0,
            since_hop: 0,
            spectrum_db: vec![PEAK_FLOOR_DB; half],
            display_bins,
            candidates: Vec::with_capacity(half),
            frequencies: vec![0.0; MAX_VOICES],
            magnitudes: vec![0.0; MAX_VOICES],
        }
    }

    /// Append one sample. Returns true when a new analysis frame is due.
    pub fn push(&mut self, sample: f32) -> bool {
        self.history[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.fft_size;
        self.since_hop += 1;
        if self.since_hop >= self.hop_size {
            self.since_hop = 0;
            return true;
        }
        false
    }

    /// Analyse the current window and return `width` peak slots.
    ///
    /// Slots are ordered loudest first; unused slots hold `(0, 0)`, which the
    /// tracker treats as empty.
    pub fn analyze(&mut self, width: usize) -> (&[f32], &[f32]) {
        let width = width.min(MAX_VOICES);

        // Oldest sample first
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = self.history[(self.write_pos + i) % self.fft_size];
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.fft_scratch);

        for (db, bin) in self.spectrum_db.iter_mut().zip(&self.buffer) {
            *db = amplitude_to_db(bin.norm() * self.window_gain);
        }

        self.pick_candidates();
        // Loudest first; ties to the lower frequency
        self.candidates
            .sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.total_cmp(&b.0)));

        self.frequencies[..width].fill(0.0);
        self.magnitudes[..width].fill(0.0);
        for (i, &(freq, db)) in self.candidates.iter().take(width).enumerate() {
            self.frequencies[i] = freq;
            // 0.0 is the empty-slot marker
            self.magnitudes[i] = if db == 0.0 { -f32::EPSILON } else { db };
        }

        (&self.frequencies[..width], &self.magnitudes[..width])
    }

    fn pick_candidates(&mut self) {
        self.candidates.clear();
        let bin_hz = self.sample_rate / self.fft_size as f32;
        let first = ((MIN_FREQ / bin_hz).ceil() as usize).max(1);
        let spectrum = &self.spectrum_db;

        for k in first..spectrum.len().saturating_sub(1) {
            let (a, b, c) = (spectrum[k - 1], spectrum[k], spectrum[k + 1]);
            if b <= PEAK_FLOOR_DB || b <= a || b < c {
                continue;
            }

            // Parabolic interpolation on the dB curve
            let denom = a - 2.0 * b + c;
            let offset = if denom.abs() > f32::EPSILON {
                (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            let freq = (k as f32 + offset) * bin_hz;
            let level = b - 0.25 * (a - c) * offset;
            self.candidates.push((freq, level));
        }
    }

    /// Current display spectrum in dB at [`display_frequencies`].
    pub fn display(&self) -> [f32; SPECTRUM_BINS] {
        let mut out = [PEAK_FLOOR_DB; SPECTRUM_BINS];
        for (db, &bin) in out.iter_mut().zip(&self.display_bins) {
            *db = self.spectrum_db[bin];
        }
        out
    }
}
