//! framelock - temporal stabilization for noisy frame-classifier streams
//!
//! Takes a per-frame stream of classifier labels, debounces it over a
//! sliding window, and fires edge-triggered actions only on genuine state
//! transitions.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod alphabet;
pub mod assembler;
pub mod classify;
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod stabilizer;

// Core types (labels → stabilizer → actions)
pub use alphabet::{Alphabet, Label};
pub use assembler::SentenceAssembler;
pub use classify::DensityClassifier;
pub use observer::{ObservationSource, ReaderObservationSource, ScriptedObservationSource};
pub use stabilizer::{Decision, Stabilizer, StabilizerConfig};

// Pipeline
pub use pipeline::dispatcher::{
    ActionDispatcher, CollectorDispatcher, SerialCommandDispatcher, SpeechDispatcher,
    StdoutDispatcher,
};
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle};

// Error handling
pub use error::{FramelockError, Result};

// Config
pub use config::Config;

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;
