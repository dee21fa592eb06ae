use listwatch_core::Timestamp;

use crate::sync::{CycleReport, ListReport};

/// Outcome of one [`EngineCommand`](crate::EngineCommand).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A scheduled check finished; errors were already logged.
    CycleCompleted(Result<CycleReport, String>),
    ListCompleted(Result<ListReport, String>),
    CheckpointSet(Result<Timestamp, String>),
}
