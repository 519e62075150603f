//! Session pipeline for label stabilization.
//!
//! Implements a multi-station pipeline where each station runs in its own
//! thread, connected by bounded crossbeam channels for backpressure.

pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod stabilizer_station;
pub mod station;
pub mod types;

pub use dispatcher::{
    ActionDispatcher, CollectorDispatcher, CommandSpeechEngine, IoPortWriter, MockPortWriter,
    MockSpeechEngine, PortWriter, SerialCommandDispatcher, SpeechDispatcher, SpeechEngine,
    StdoutDispatcher,
};
pub use error::{ErrorReporter, LogReporter, StationError};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle};
pub use stabilizer_station::StabilizerStation;
pub use station::{Station, StationRunner};
pub use types::{CommitEvent, ControlCommand, Observation, SessionEvent};
