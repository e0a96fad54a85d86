use crate::{
    engine::allocator::{PoolError, VoiceId, VoicePool},
    io::{frame::VoiceState, peaks::Peak},
};

/*
Track Lifecycle
===============

Every live track advances exactly once per frame, after assignment, as a
function of (state, matched this frame, age, pool has an id).

                 matched, age >= min_track_length, id available
   ┌───────────┐ ─────────────────────────────────────────→ ┌───────────┐
   │ Candidate │                                            │ Confirmed │
   └───────────┘ ←─┐ matched, too young or pool exhausted   └───────────┘
      │   │        │                                        │     ↑
      │   └────────┘                              unmatched │     │ matched
      │ unmatched                                           ↓     │
      │                                                  ┌───────────┐
      │                                                  │   Dying   │──┐ unmatched
      │                                                  └───────────┘ ←┘
      ↓                                                         │
   ┌───────┐              prune(): frames since match > grace   │
   │ Freed │ ←──────────────────────────────────────────────────┘
   └───────┘

Candidates get no grace: one miss frees them. Only Confirmed tracks hold a
voice id, and a Dying track keeps its id (and keeps being reported) until
prune releases it, so the last frame of a voice is still visible downstream.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Candidate, // Born, not yet old enough to hold a voice
    Confirmed, // Holds a voice id, matched this frame
    Dying,     // Holds a voice id, lost its peak
    Freed,     // Gone; id (if any) returned
}

/// Next state for one frame.
///
/// `age` is the age after this frame's match has been counted.
pub fn transition(
    state: TrackState,
    matched: bool,
    age: u32,
    min_track_length: u32,
    pool_available: bool,
) -> TrackState {
    match (state, matched) {
        (TrackState::Candidate, true) => {
            if age >= min_track_length && pool_available {
                TrackState::Confirmed
            } else {
                TrackState::Candidate
            }
        }
        (TrackState::Candidate, false) => TrackState::Freed,
        (TrackState::Confirmed | TrackState::Dying, true) => TrackState::Confirmed,
        (TrackState::Confirmed | TrackState::Dying, false) => TrackState::Dying,
        (TrackState::Freed, _) => TrackState::Freed,
    }
}

/// A tracked partial.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: Option<VoiceId>,
    frequency: f32,
    magnitude: f32,
    level: f32,
    age: u32,
    state: TrackState,
    frames_since_last_match: u32,
    reported: bool,
}

impl Track {
    /// Start a track from an unmatched peak. The birth frame counts as the
    /// first match, so a `min_track_length` of 1 confirms immediately.
    pub fn spawn(peak: &Peak, min_track_length: u32, pool: &mut VoicePool) -> Self {
        let mut track = Self {
            id: None,
            frequency: peak.frequency,
            magnitude: peak.magnitude,
            level: peak.level,
            age: 1,
            state: TrackState::Candidate,
            frames_since_last_match: 0,
            reported: false,
        };
        track.advance(true, min_track_length, pool);
        track
    }

    /// Continue with this frame's matched peak.
    pub fn hit(&mut self, peak: &Peak, min_track_length: u32, pool: &mut VoicePool) -> TrackState {
        self.frequency = peak.frequency;
        self.magnitude = peak.magnitude;
        self.level = peak.level;
        self.age = self.age.saturating_add(1);
        self.frames_since_last_match = 0;
        self.advance(true, min_track_length, pool)
    }

    /// No peak this frame. Values hold at their last match.
    pub fn miss(&mut self, min_track_length: u32, pool: &mut VoicePool) -> TrackState {
        self.frames_since_last_match = self.frames_since_last_match.saturating_add(1);
        self.advance(false, min_track_length, pool)
    }

    fn advance(&mut self, matched: bool, min_track_length: u32, pool: &mut VoicePool) -> TrackState {
        let pool_available = self.id.is_some() || !pool.is_exhausted();
        let mut next = transition(self.state, matched, self.age, min_track_length, pool_available);

        if next == TrackState::Confirmed && self.id.is_none() {
            match pool.allocate() {
                Some(id) => self.id = Some(id),
                None => next = TrackState::Candidate,
            }
        }

        self.state = next;
        next
    }

    /// Dying for longer than the grace allowance.
    pub fn is_expired(&self, grace_frames: u32) -> bool {
        self.state == TrackState::Dying && self.frames_since_last_match > grace_frames
    }

    /// Move to `Freed`, handing the voice id back.
    pub fn free(&mut self, pool: &mut VoicePool) -> Result<(), PoolError> {
        self.state = TrackState::Freed;
        match self.id.take() {
            Some(id) => pool.free(id),
            None => Ok(()),
        }
    }

    /// Confirmed and Dying tracks appear in the output frame.
    pub fn is_reported(&self) -> bool {
        matches!(self.state, TrackState::Confirmed | TrackState::Dying)
    }

    pub fn voice_state(&self) -> VoiceState {
        match self.state {
            TrackState::Confirmed if !self.reported => VoiceState::Attack,
            TrackState::Confirmed => VoiceState::Sustain,
            TrackState::Dying => VoiceState::Release,
            TrackState::Candidate | TrackState::Freed => VoiceState::Free,
        }
    }

    pub fn mark_reported(&mut self) {
        self.reported = true;
    }

    pub fn id(&self) -> Option<VoiceId> {
        self.id
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn frames_since_last_match(&self) -> u32 {
        self.frames_since_last_match
    }
}
