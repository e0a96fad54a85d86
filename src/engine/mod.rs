//! The frame-synchronous tracking engine.
//!
//! `VoiceTracker` owns the track table, the voice pool and every scratch
//! buffer. All storage is sized in `configure`; `process_frame` and `prune`
//! only reuse it, so a host may call them from an audio callback.
//!
//! Per frame:
//!
//! ```text
//! ingest → gate & score → assign → lifecycle → births → emit   (process_frame)
//!                                                       → prune (prune)
//! ```

pub mod allocator;
pub mod config;
pub mod message;

use tracing::{debug, error, info, trace, warn};

use self::{
    allocator::VoicePool,
    config::{BirthPriority, ConfigError, SlotOrder, Strategy, TrackerConfig},
    message::{MessageReceiver, TrackerMessage},
};
use crate::{
    io::{frame::OutputSlot, peaks::PeakBuffer},
    tracking::{
        lifecycle::{Track, TrackState},
        score::{BirthGate, MatchGate},
        solver::{AssignmentSolver, CostMatrix, Matching, Solver},
    },
};

pub struct VoiceTracker {
    config: TrackerConfig,
    pool: VoicePool,
    /// Track arena indexed by stable slot; `None` is a free slot
    tracks: Vec<Option<Track>>,
    /// Free arena slots, lowest on top
    free_slots: Vec<usize>,
    /// Cost-matrix row → arena slot, rebuilt each frame
    live: Vec<usize>,
    peaks: PeakBuffer,
    previous_peaks: PeakBuffer,
    costs: CostMatrix,
    matching: Matching,
    solver: Solver,
    match_gate: MatchGate,
    birth_gate: BirthGate,
    /// Birth-eligible peak indices, sorted by priority
    births: Vec<usize>,
    output: Vec<OutputSlot>,
    pending_prune: bool,
    last_input_width: Option<usize>,
    frame_index: u64,
}

impl VoiceTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut tracker = Self {
            config,
            pool: VoicePool::new(0),
            tracks: Vec::new(),
            free_slots: Vec::new(),
            live: Vec::new(),
            peaks: PeakBuffer::with_capacity(0),
            previous_peaks: PeakBuffer::with_capacity(0),
            costs: CostMatrix::with_capacity(0, 0),
            matching: Matching::default(),
            solver: Solver::for_strategy(config.strategy, 0, 0),
            match_gate: MatchGate::from_config(&config),
            birth_gate: BirthGate::from_config(&config),
            births: Vec::new(),
            output: Vec::new(),
            pending_prune: false,
            last_input_width: None,
            frame_index: 0,
        };
        tracker.rebuild();
        Ok(tracker)
    }

    /// Apply a new configuration at a frame boundary.
    ///
    /// An invalid configuration is rejected and the current one stays in
    /// force. An identical configuration is a no-op; anything else resets
    /// every track and voice.
    pub fn configure(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            warn!(%err, "rejected tracker configuration");
            return Err(err);
        }
        if config == self.config {
            debug!("tracker configuration unchanged");
            return Ok(());
        }

        self.config = config;
        self.rebuild();
        Ok(())
    }

    /// Size every buffer for the current configuration and start empty.
    fn rebuild(&mut self) {
        let TrackerConfig {
            max_voices,
            max_peaks,
            strategy,
            ..
        } = self.config;

        self.pool.reset(max_voices);

        self.tracks.clear();
        self.tracks.resize_with(max_voices, || None);
        self.free_slots = Vec::with_capacity(max_voices);
        self.free_slots.extend((0..max_voices).rev());
        self.live = Vec::with_capacity(max_voices);

        self.peaks.resize(max_peaks);
        self.previous_peaks.resize(max_peaks);
        self.costs = CostMatrix::with_capacity(max_voices, max_peaks);
        self.matching = Matching::with_capacity(max_voices, max_peaks);
        self.solver = Solver::for_strategy(strategy, max_voices, max_peaks);
        self.match_gate = MatchGate::from_config(&self.config);
        self.birth_gate = BirthGate::from_config(&self.config);
        self.births = Vec::with_capacity(max_peaks);
        self.output = vec![OutputSlot::EMPTY; max_voices];

        self.pending_prune = false;
        self.last_input_width = None;

        info!(
            max_voices,
            max_peaks,
            strategy = ?strategy,
            min_track_length = self.config.min_track_length,
            grace_frames = self.config.grace_frames,
            "tracker configured"
        );
    }

    /// Drop every track and return every voice, keeping the configuration.
    pub fn clear(&mut self) {
        for track in &mut self.tracks {
            *track = None;
        }
        self.pool.reset(self.config.max_voices);
        self.free_slots.clear();
        self.free_slots.extend((0..self.config.max_voices).rev());
        self.peaks.clear();
        self.previous_peaks.clear();
        self.output.fill(OutputSlot::EMPTY);
        self.pending_prune = false;
        debug!("tracker cleared");
    }

    /// Drain queued control messages. Call between frames.
    pub fn apply_messages<R: MessageReceiver>(&mut self, rx: &mut R) -> usize {
        let mut applied = 0;
        while let Some(msg) = rx.pop() {
            match msg {
                TrackerMessage::Configure(config) => {
                    // rejection is already logged and leaves the tracker as is
                    let _ = self.configure(config);
                }
                TrackerMessage::Clear => self.clear(),
            }
            applied += 1;
        }
        applied
    }

    /// Track one frame given parallel frequency and magnitude slots.
    pub fn process_frame(&mut self, frequencies: &[f32], magnitudes: &[f32]) -> &[OutputSlot] {
        self.process_slots(frequencies.iter().copied().zip(magnitudes.iter().copied()))
    }

    /// Track one frame given `(frequency, magnitude)` pairs.
    pub fn process_peaks(&mut self, peaks: &[(f32, f32)]) -> &[OutputSlot] {
        self.process_slots(peaks.iter().copied())
    }

    /// Track one frame. The returned slice always holds `max_voices` slots.
    pub fn process_slots<I>(&mut self, slots: I) -> &[OutputSlot]
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        if self.pending_prune {
            debug!(frame = self.frame_index, "prune was not called after the last frame");
            self.prune();
        }

        std::mem::swap(&mut self.peaks, &mut self.previous_peaks);
        let width = self.peaks.ingest(slots, self.config.magnitude_scale);
        self.note_input_width(width);

        self.associate();
        self.advance_tracks();
        self.spawn_births();
        self.emit();

        self.pending_prune = true;
        self.frame_index += 1;
        &self.output
    }

    fn note_input_width(&mut self, width: usize) {
        if self.last_input_width != Some(width) {
            if width > self.config.max_peaks {
                debug!(width, max_peaks = self.config.max_peaks, "input wider than max_peaks, keeping the loudest");
            } else {
                debug!(width, "input width changed");
            }
            self.last_input_width = Some(width);
        }
    }

    /// Score every (track, peak) pair and solve the assignment.
    fn associate(&mut self) {
        self.live.clear();
        self.live.extend(
            self.tracks
                .iter()
                .enumerate()
                .filter_map(|(slot, track)| track.as_ref().map(|_| slot)),
        );

        self.costs.reshape(self.live.len(), self.peaks.len());
        for (row, &slot) in self.live.iter().enumerate() {
            let Some(track) = &self.tracks[slot] else {
                continue;
            };
            for (col, peak) in self.peaks.peaks().iter().enumerate() {
                let cost = self.match_gate.cost(track.frequency(), track.level(), peak);
                self.costs.set(row, col, cost);
            }
        }

        self.solver.solve(&self.costs, &mut self.matching);

        for (col, peak) in self.peaks.peaks_mut().iter_mut().enumerate() {
            peak.matched = self.matching.is_col_matched(col);
        }
    }

    fn advance_tracks(&mut self) {
        let min_track_length = self.config.min_track_length;

        for row in 0..self.live.len() {
            let slot = self.live[row];
            let Some(track) = self.tracks[slot].as_mut() else {
                continue;
            };

            let next = match self.matching.col_for_row(row) {
                Some(col) => track.hit(&self.peaks.peaks()[col], min_track_length, &mut self.pool),
                None => track.miss(min_track_length, &mut self.pool),
            };

            if next == TrackState::Freed {
                self.release_slot(slot);
            }
        }
    }

    fn spawn_births(&mut self) {
        let max_level = self.peaks.max_level();
        let peaks = self.peaks.peaks();

        self.births.clear();
        for (col, peak) in peaks.iter().enumerate() {
            if !peak.matched && self.birth_gate.is_eligible(peak, max_level, &self.previous_peaks) {
                self.births.push(col);
            }
        }
        if self.births.is_empty() {
            return;
        }

        match self.config.birth_priority {
            BirthPriority::Loudest => self.births.sort_unstable_by(|&a, &b| {
                peaks[b].level.total_cmp(&peaks[a].level).then(a.cmp(&b))
            }),
            BirthPriority::Lowest => self.births.sort_unstable_by(|&a, &b| {
                peaks[a].frequency.total_cmp(&peaks[b].frequency).then(a.cmp(&b))
            }),
        }

        let min_track_length = self.config.min_track_length;
        for (spawned, &col) in self.births.iter().enumerate() {
            let Some(slot) = self.free_slots.pop() else {
                trace!(dropped = self.births.len() - spawned, "track table full, births dropped");
                break;
            };
            self.tracks[slot] = Some(Track::spawn(&peaks[col], min_track_length, &mut self.pool));
        }
    }

    fn emit(&mut self) {
        self.output.fill(OutputSlot::EMPTY);

        let mut next = 0;
        for track in self.tracks.iter_mut().flatten() {
            if !track.is_reported() {
                continue;
            }
            let Some(id) = track.id() else {
                continue;
            };

            let position = match self.config.slot_order {
                SlotOrder::TrackIndex => {
                    next += 1;
                    next - 1
                }
                SlotOrder::VoiceId => id.index(),
            };
            if let Some(slot) = self.output.get_mut(position) {
                *slot = OutputSlot::new(id, track.frequency(), track.magnitude(), track.voice_state());
            }
            track.mark_reported();
        }
    }

    /// Free tracks that have been dying past their grace allowance and
    /// return their voices. Call once after each `process_frame`.
    ///
    /// Returns the number of tracks freed.
    pub fn prune(&mut self) -> usize {
        let grace_frames = self.config.grace_frames;
        let mut freed = 0;

        for slot in 0..self.tracks.len() {
            let expired = self.tracks[slot]
                .as_ref()
                .is_some_and(|track| track.is_expired(grace_frames));
            if expired {
                self.release_slot(slot);
                freed += 1;
            }
        }

        self.pending_prune = false;
        freed
    }

    fn release_slot(&mut self, slot: usize) {
        let Some(mut track) = self.tracks[slot].take() else {
            return;
        };

        let result = track.free(&mut self.pool);
        debug_assert!(result.is_ok(), "voice pool invariant violated: {result:?}");
        if let Err(err) = result {
            error!(%err, "voice pool invariant violated");
        }
        self.free_slots.push(slot);
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.solver.strategy()
    }

    /// The last emitted frame.
    pub fn output(&self) -> &[OutputSlot] {
        &self.output
    }

    /// Live tracks in arena order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().flatten()
    }

    pub fn track_count(&self) -> usize {
        self.tracks().count()
    }

    pub fn active_voice_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn free_voice_count(&self) -> usize {
        self.pool.free_count()
    }

    /// Frames processed since construction.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Loudest normalised peak level of the last frame.
    pub fn last_frame_level(&self) -> f32 {
        self.peaks.max_level()
    }

    /// Frames of delay between input and output.
    pub fn latency(&self) -> usize {
        0
    }
}

impl Default for VoiceTracker {
    fn default() -> Self {
        let config = TrackerConfig::default();
        Self::new(config).unwrap_or_else(|err| unreachable!("default config is valid: {err}"))
    }
}
