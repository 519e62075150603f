//! Observation sources.
//!
//! An observer wraps whatever produces one raw label per frame — a camera
//! plus classifier in production, a script or mock in tests. The trait keeps
//! the stabilizer testable without real capture hardware.

use crate::alphabet::Label;
use crate::error::{FramelockError, Result};
use std::io::BufRead;

/// Trait for per-frame label producers.
///
/// This trait allows swapping implementations (real capture loop vs mock).
pub trait ObservationSource: Send + 'static {
    /// Start producing observations.
    fn start(&mut self) -> Result<()>;

    /// Stop producing observations.
    fn stop(&mut self) -> Result<()>;

    /// Whether this source ends on its own (file/script) rather than running
    /// until cancelled (camera).
    fn is_finite(&self) -> bool {
        false
    }

    /// Read the next frame's label.
    ///
    /// `Ok(None)` means no frame is ready: a finite source is exhausted, a
    /// live source has nothing yet and should be polled again.
    fn next_label(&mut self) -> Result<Option<Label>>;
}

/// Finite source replaying a fixed label sequence, one per poll.
pub struct ScriptedObservationSource {
    labels: std::collections::VecDeque<Label>,
    started: bool,
}

impl ScriptedObservationSource {
    pub fn new(labels: Vec<Label>) -> Self {
        Self {
            labels: labels.into(),
            started: false,
        }
    }

    pub fn from_strs(labels: &[&str]) -> Self {
        Self::new(labels.iter().map(|l| Label::new(*l)).collect())
    }
}

impl ObservationSource for ScriptedObservationSource {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn is_finite(&self) -> bool {
        true
    }

    fn next_label(&mut self) -> Result<Option<Label>> {
        Ok(self.labels.pop_front())
    }
}

/// Finite source reading one whitespace-separated label per token from a
/// reader. Used by pipe mode, where another process streams classifier
/// output line by line.
pub struct ReaderObservationSource<R: BufRead + Send + 'static> {
    reader: R,
    pending: std::collections::VecDeque<Label>,
}

impl<R: BufRead + Send + 'static> ReaderObservationSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: std::collections::VecDeque::new(),
        }
    }
}

impl<R: BufRead + Send + 'static> ObservationSource for ReaderObservationSource<R> {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_finite(&self) -> bool {
        true
    }

    fn next_label(&mut self) -> Result<Option<Label>> {
        if let Some(label) = self.pending.pop_front() {
            return Ok(Some(label));
        }
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line).map_err(|e| {
                FramelockError::Observer {
                    message: format!("failed to read label stream: {}", e),
                }
            })?;
            if n == 0 {
                return Ok(None);
            }
            let mut tokens = line.split_whitespace().map(Label::new);
            if let Some(first) = tokens.next() {
                self.pending.extend(tokens);
                return Ok(Some(first));
            }
            // blank line, keep reading
        }
    }
}

/// One phase of a mock source: the same reading repeated `count` times.
/// `label: None` simulates polls where no frame is ready yet.
#[derive(Debug, Clone)]
pub struct LabelPhase {
    pub label: Option<Label>,
    pub count: usize,
}

impl LabelPhase {
    pub fn steady(label: &str, count: usize) -> Self {
        Self {
            label: Some(Label::new(label)),
            count,
        }
    }

    pub fn empty(count: usize) -> Self {
        Self { label: None, count }
    }
}

/// Mock observation source for testing.
#[derive(Debug, Clone)]
pub struct MockObservationSource {
    phases: Vec<LabelPhase>,
    phase_index: usize,
    phase_remaining: usize,
    is_started: bool,
    live: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockObservationSource {
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            phase_index: 0,
            phase_remaining: 0,
            is_started: false,
            live: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock observer error".to_string(),
        }
    }

    /// Configure the mock to play a sequence of phases.
    pub fn with_phases(mut self, phases: Vec<LabelPhase>) -> Self {
        self.phase_remaining = phases.first().map(|p| p.count).unwrap_or(0);
        self.phases = phases;
        self.phase_index = 0;
        self
    }

    /// Treats the source as a live camera: exhausted phases yield `None`
    /// forever instead of ending the session.
    pub fn as_live_source(mut self) -> Self {
        self.live = true;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockObservationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationSource for MockObservationSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(FramelockError::Observer {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn is_finite(&self) -> bool {
        !self.live
    }

    fn next_label(&mut self) -> Result<Option<Label>> {
        if self.should_fail_read {
            return Err(FramelockError::Observer {
                message: self.error_message.clone(),
            });
        }

        while self.phase_index < self.phases.len() {
            if self.phase_remaining > 0 {
                self.phase_remaining -= 1;
                return Ok(self.phases[self.phase_index].label.clone());
            }
            self.phase_index += 1;
            self.phase_remaining = self
                .phases
                .get(self.phase_index)
                .map(|p| p.count)
                .unwrap_or(0);
        }
        Ok(None)
    }
}
