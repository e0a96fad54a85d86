#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use super::config::TrackerConfig;

/// Control messages applied by the tracker between frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrackerMessage {
    /// Replace the configuration; resets tracks and voices if it differs
    Configure(TrackerConfig),
    /// Drop every track and return every voice id
    Clear,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<TrackerMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<TrackerMessage> {
    fn pop(&mut self) -> Option<TrackerMessage> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for std::collections::VecDeque<TrackerMessage> {
    fn pop(&mut self) -> Option<TrackerMessage> {
        self.pop_front()
    }
}
