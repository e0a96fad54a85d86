//! Data association and lifecycle for spectral partials.
//!
//! Everything here is allocation-free once its buffers are sized, and
//! deterministic: the same peaks in the same order always produce the same
//! tracks.

/// Track lifecycle state machine.
pub mod lifecycle;
/// Shared gating, match cost and birth rules.
pub mod score;
/// Greedy and Hungarian assignment.
pub mod solver;

pub use lifecycle::{Track, TrackState};
