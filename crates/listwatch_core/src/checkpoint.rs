use crate::date::Timestamp;

/// Boundary between already-reported and not-yet-reported entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    at: Timestamp,
}

impl Checkpoint {
    pub fn new(at: Timestamp) -> Self {
        Self { at }
    }

    pub fn at(&self) -> Timestamp {
        self.at
    }

    /// Entries strictly newer than the checkpoint are unseen.
    pub fn is_unseen(&self, ts: Timestamp) -> bool {
        ts > self.at
    }

    /// Moves the checkpoint forward at the end of a cycle. Never moves back.
    pub fn advance(&mut self, to: Timestamp) -> Timestamp {
        if to > self.at {
            self.at = to;
        }
        self.at
    }

    /// Explicit override from the checkpoint-set command; may move back.
    pub fn reset(&mut self, to: Timestamp) {
        self.at = to;
    }
}
