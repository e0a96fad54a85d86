use crate::engine::allocator::VoiceId;

/// Voice state reported alongside each output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Free,    // Empty slot, sentinel values
    Attack,  // First frame this voice is reported
    Sustain, // Still matching peaks
    Release, // Lost its peak, reported until pruned
}

impl VoiceState {
    /// Numeric code for hosts that carry state as a control value.
    pub fn code(self) -> u8 {
        match self {
            VoiceState::Free => 0,
            VoiceState::Attack => 1,
            VoiceState::Sustain => 2,
            VoiceState::Release => 3,
        }
    }
}

/// One fixed position of the emitted voice frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSlot {
    /// Voice id, or -1 for an empty slot
    pub voice: i32,
    pub frequency: f32,
    pub magnitude: f32,
    pub state: VoiceState,
}

impl OutputSlot {
    /// The `(-1, 0, 0)` sentinel.
    pub const EMPTY: OutputSlot = OutputSlot {
        voice: -1,
        frequency: 0.0,
        magnitude: 0.0,
        state: VoiceState::Free,
    };

    pub fn new(voice: VoiceId, frequency: f32, magnitude: f32, state: VoiceState) -> Self {
        Self {
            voice: voice.index() as i32,
            frequency,
            magnitude,
            state,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voice < 0
    }

    pub fn voice_id(&self) -> Option<VoiceId> {
        u16::try_from(self.voice).ok().map(VoiceId::new)
    }

    /// `(voice, frequency, magnitude)` as a plain tuple.
    pub fn as_tuple(&self) -> (i32, f32, f32) {
        (self.voice, self.frequency, self.magnitude)
    }
}

impl Default for OutputSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_minus_one_zero_zero() {
        let slot = OutputSlot::default();
        assert_eq!(slot.as_tuple(), (-1, 0.0, 0.0));
        assert!(slot.is_empty());
        assert!(slot.voice_id().is_none());
        assert_eq!(slot.state.code(), 0);
    }

    #[test]
    fn live_slot_exposes_voice_id() {
        let slot = OutputSlot::new(VoiceId::new(3), 440.0, -12.0, VoiceState::Attack);
        assert_eq!(slot.voice_id(), Some(VoiceId::new(3)));
        assert_eq!(slot.as_tuple(), (3, 440.0, -12.0));
    }
}
