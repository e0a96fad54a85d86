//! Voice identity pool.
//!
//! A fixed set of small integer ids handed to confirmed tracks. Storage is
//! sized in `reset`, so `allocate` and `free` are O(1) pushes and pops on
//! pre-reserved vectors and never touch the heap.

use std::fmt;

use thiserror::Error;

/// Identity of a voice in `[0, max_voices)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u16);

impl VoiceId {
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("voice {0} is already free")]
    AlreadyFree(VoiceId),
    #[error("voice {id} is outside a pool of {capacity}")]
    OutOfRange { id: VoiceId, capacity: usize },
}

pub struct VoicePool {
    /// Stack of free ids; the top is handed out next
    free: Vec<VoiceId>,
    /// `in_use[i]` mirrors whether id `i` is held by a track
    in_use: Vec<bool>,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        let mut pool = Self {
            free: Vec::new(),
            in_use: Vec::new(),
        };
        pool.reset(max_voices);
        pool
    }

    /// Forget every association and refill with `[0, max_voices)`.
    ///
    /// Frame-boundary only. The stack is filled in descending order so a
    /// fresh pool hands out 0 first.
    pub fn reset(&mut self, max_voices: usize) {
        debug_assert!(max_voices <= u16::MAX as usize + 1);

        self.free.clear();
        self.free.reserve_exact(max_voices);
        self.free
            .extend((0..max_voices).rev().map(|i| VoiceId::new(i as u16)));

        self.in_use.clear();
        self.in_use.resize(max_voices, false);
    }

    pub fn allocate(&mut self) -> Option<VoiceId> {
        let id = self.free.pop()?;
        self.in_use[id.index()] = true;
        Some(id)
    }

    pub fn free(&mut self, id: VoiceId) -> Result<(), PoolError> {
        match self.in_use.get_mut(id.index()) {
            None => Err(PoolError::OutOfRange {
                id,
                capacity: self.capacity(),
            }),
            Some(false) => Err(PoolError::AlreadyFree(id)),
            Some(held) => {
                *held = false;
                self.free.push(id);
                Ok(())
            }
        }
    }

    pub fn is_allocated(&self, id: VoiceId) -> bool {
        self.in_use.get(id.index()).copied().unwrap_or(false)
    }

    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn active_count(&self) -> usize {
        self.capacity() - self.free.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }
}
