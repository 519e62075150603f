//! Temporal stabilization of a noisy label stream.
//!
//! The stabilizer keeps a bounded recency window of raw per-frame labels and
//! commits to a new stable state only when the window supports it: the
//! window's mode must cover at least the configured fraction of the window
//! *and* differ from the state already committed. Everything else is a hold,
//! so downstream actions fire exactly once per genuine transition.

use crate::alphabet::{Alphabet, Label};
use crate::defaults;
use crate::error::{FramelockError, Result};
use std::collections::VecDeque;

/// Configuration for the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    /// Number of most recent observations the window holds (W ≥ 1).
    pub window_size: usize,
    /// Fraction of the window the mode must cover to commit (0 < T ≤ 1).
    pub agreement_threshold: f64,
}

impl StabilizerConfig {
    /// Density tuning: five consecutive identical readings, unanimity.
    pub fn density() -> Self {
        Self {
            window_size: defaults::DENSITY_WINDOW,
            agreement_threshold: defaults::DENSITY_AGREEMENT,
        }
    }

    /// Sign-language tuning: 20-frame window, 80% agreement.
    pub fn sign() -> Self {
        Self {
            window_size: defaults::SIGN_WINDOW,
            agreement_threshold: defaults::SIGN_AGREEMENT,
        }
    }

    /// Validates the window size and threshold constraints.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 1 {
            return Err(FramelockError::ConfigInvalidValue {
                key: "stabilizer.window_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(self.agreement_threshold > 0.0 && self.agreement_threshold <= 1.0) {
            return Err(FramelockError::ConfigInvalidValue {
                key: "stabilizer.agreement_threshold".to_string(),
                message: format!(
                    "must be in (0.0, 1.0], got {}",
                    self.agreement_threshold
                ),
            });
        }
        Ok(())
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self::density()
    }
}

/// Outcome of feeding one observation to the stabilizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The window is not yet full; no commit can happen during warm-up.
    Warmup,
    /// The window is full but either agreement is insufficient or the mode
    /// equals the state already committed.
    Hold,
    /// A new stable state was accepted. `previous` is `None` for the first
    /// commit of a session.
    Commit {
        previous: Option<Label>,
        label: Label,
    },
}

impl Decision {
    pub fn is_commit(&self) -> bool {
        matches!(self, Decision::Commit { .. })
    }
}

/// Sliding-window debouncer over a stream of classifier labels.
///
/// Owned, instantiable state — one per session. Calls to [`observe`] must
/// arrive in frame order from a single owner; the stabilizer holds no
/// internal synchronization.
///
/// [`observe`]: Stabilizer::observe
pub struct Stabilizer {
    config: StabilizerConfig,
    alphabet: Alphabet,
    window: VecDeque<Label>,
    committed: Option<Label>,
}

impl Stabilizer {
    /// Creates a stabilizer, validating the configuration first.
    pub fn new(config: StabilizerConfig, alphabet: Alphabet) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(config.window_size),
            config,
            alphabet,
            committed: None,
        })
    }

    /// Feeds one raw observation and decides whether to commit.
    ///
    /// Labels outside the declared alphabet are rejected without touching the
    /// window, so one bad frame cannot poison the recency buffer.
    ///
    /// When two labels tie for the window mode, the label whose first
    /// occurrence in the current window is earliest wins — oldest evidence
    /// takes precedence.
    pub fn observe(&mut self, label: &Label) -> Result<Decision> {
        if !self.alphabet.contains(label) {
            return Err(FramelockError::InvalidLabel {
                label: label.to_string(),
            });
        }

        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(label.clone());

        if self.window.len() < self.config.window_size {
            return Ok(Decision::Warmup);
        }

        let (mode, count) = self.window_mode();
        let agreement = count as f64 / self.window.len() as f64;

        if agreement >= self.config.agreement_threshold && self.committed.as_ref() != Some(&mode) {
            let previous = self.committed.replace(mode.clone());
            Ok(Decision::Commit {
                previous,
                label: mode,
            })
        } else {
            Ok(Decision::Hold)
        }
    }

    /// Mode of the current window with its occurrence count.
    /// Ties break toward the earliest first appearance.
    fn window_mode(&self) -> (Label, usize) {
        let mut counts: Vec<(&Label, usize)> = Vec::new();
        for label in &self.window {
            match counts.iter_mut().find(|(candidate, _)| *candidate == label) {
                Some(entry) => entry.1 += 1,
                None => counts.push((label, 1)),
            }
        }
        // window is non-empty here: observe() pushes before deciding
        let mut best = counts[0];
        for entry in &counts[1..] {
            if entry.1 > best.1 {
                best = *entry;
            }
        }
        (best.0.clone(), best.1)
    }

    /// Current window mode and its agreement ratio, if any observations exist.
    ///
    /// Read-only view for status displays; the ratio is over the current
    /// window length, so it is meaningful even during warm-up.
    pub fn snapshot(&self) -> Option<(Label, f64)> {
        if self.window.is_empty() {
            return None;
        }
        let (mode, count) = self.window_mode();
        Some((mode, count as f64 / self.window.len() as f64))
    }

    /// Clears the window and the committed state for a fresh session.
    pub fn reset(&mut self) {
        self.window.clear();
        self.committed = None;
    }

    /// The label currently considered true, or `None` before the first commit.
    pub fn committed(&self) -> Option<&Label> {
        self.committed.as_ref()
    }

    /// Number of observations currently in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// True once the window has filled for the first time.
    pub fn is_warmed_up(&self) -> bool {
        self.window.len() == self.config.window_size
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }
}
