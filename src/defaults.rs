//! Default configuration constants for framelock.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Window size for the density configuration.
///
/// Five consecutive readings must agree before the command state changes.
/// Tuned for a ~30fps capture loop: a state must hold for roughly 170ms of
/// wall time before the actuator is told about it.
pub const DENSITY_WINDOW: usize = 5;

/// Agreement threshold for the density configuration.
///
/// 1.0 requires unanimity: a single dissenting frame inside the window
/// blocks the commit. This gives strict hysteresis on the hardware channel.
pub const DENSITY_AGREEMENT: f64 = 1.0;

/// Window size for the sign-language configuration.
pub const SIGN_WINDOW: usize = 20;

/// Agreement threshold for the sign-language configuration.
///
/// 0.8 tolerates up to 4 dissenting frames out of 20, which absorbs the
/// per-frame flicker of a hand-sign classifier without stalling commits.
pub const SIGN_AGREEMENT: f64 = 0.8;

/// Default interval between observation polls in milliseconds.
///
/// 33ms matches a 30fps camera; the poll loop never outruns the capture rate.
pub const FRAME_INTERVAL_MS: u64 = 33;

/// Density command codes sent to the actuator, one byte each.
pub const DENSITY_LOW: &str = "L";
pub const DENSITY_MEDIUM: &str = "M";
pub const DENSITY_HIGH: &str = "H";

/// Quiescent command forced on session shutdown.
///
/// The actuator must never be left in a non-low state when the detector exits.
pub const QUIESCENT_COMMAND: &str = "L";

/// Object-count boundary below which density is LOW (0..low = LOW).
pub const DENSITY_LOW_COUNT: usize = 2;

/// Object-count boundary below which density is MEDIUM (low..medium = MEDIUM,
/// medium.. = HIGH).
pub const DENSITY_MEDIUM_COUNT: usize = 5;

/// Sentinel label meaning "no classifiable subject in frame".
pub const SENTINEL_LABEL: &str = "blank";

/// Separator appended between words in the assembled sentence.
pub const SEPARATOR_LABEL: &str = " ";

/// Default channel capacity for raw observations.
///
/// Sized so a briefly stalled stabilizer never blocks the poll loop at
/// camera rates (1024 frames ≈ 34s at 30fps).
pub const OBSERVATION_BUFFER: usize = 1024;

/// Default channel capacity for commit/control events.
///
/// Commits are rare by construction (at most one per genuine transition),
/// so a small buffer suffices.
pub const EVENT_BUFFER: usize = 16;

/// Default text-to-speech program used by the speech dispatcher.
pub const SPEECH_PROGRAM: &str = "espeak";
