//! Data types flowing through the session pipeline.

use crate::alphabet::Label;
use std::time::Instant;

/// A single classifier observation entering the pipeline.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Raw per-frame label from the upstream classifier.
    pub label: Label,
    /// Timestamp when this frame was polled.
    pub timestamp: Instant,
    /// Sequence number for ordering and reporting.
    pub sequence: u64,
}

impl Observation {
    /// Creates a new observation.
    pub fn new(label: Label, timestamp: Instant, sequence: u64) -> Self {
        Self {
            label,
            timestamp,
            sequence,
        }
    }
}

/// A committed state transition produced by the stabilizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEvent {
    /// The committed state before this transition, if any.
    pub previous: Option<Label>,
    /// The newly committed state.
    pub label: Label,
    /// Sequence number of the frame that triggered the commit.
    pub sequence: u64,
    /// Timestamp of the frame that triggered the commit.
    pub timestamp: Instant,
}

/// Session-level control commands issued by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Append the separator to the assembled sentence.
    AppendSeparator,
    /// Clear the assembled sentence.
    Clear,
}

/// Events delivered to the dispatcher station.
///
/// Commits come from the stabilizer; controls come from the session
/// handle. They share one channel so ordering is preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Commit(CommitEvent),
    Control(ControlCommand),
}
