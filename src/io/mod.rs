// Purpose - external interfaces, format conversions
//
// Everything that crosses the engine boundary lives here: the raw peak slots
// coming in from an analysis stage, and the fixed-width voice frame going out
// to a synthesis bank.

pub mod converter;
pub mod frame;
pub mod peaks;

pub use frame::{OutputSlot, VoiceState};
pub use peaks::{Peak, PeakBuffer};
