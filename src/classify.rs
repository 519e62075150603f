//! Object-count to density-label mapping.
//!
//! The density observer counts moving objects per frame; this classifier
//! turns that count into one of the three command labels before the
//! stabilizer sees it. Kept separate from the observer so a counting source
//! can be wired without any vision stack behind it.

use crate::alphabet::Label;
use crate::defaults;
use crate::error::{FramelockError, Result};

/// Maps a per-frame object count to a density command label.
///
/// Counts in `0..low_threshold` are LOW, `low_threshold..medium_threshold`
/// are MEDIUM, and `medium_threshold..` are HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityClassifier {
    low_threshold: usize,
    medium_threshold: usize,
}

impl DensityClassifier {
    /// Creates a classifier, requiring `0 < low_threshold < medium_threshold`.
    pub fn new(low_threshold: usize, medium_threshold: usize) -> Result<Self> {
        if low_threshold == 0 || low_threshold >= medium_threshold {
            return Err(FramelockError::ConfigInvalidValue {
                key: "density.thresholds".to_string(),
                message: format!(
                    "need 0 < low < medium, got low={} medium={}",
                    low_threshold, medium_threshold
                ),
            });
        }
        Ok(Self {
            low_threshold,
            medium_threshold,
        })
    }

    /// Classifies one frame's object count.
    pub fn classify(&self, object_count: usize) -> Label {
        if object_count < self.low_threshold {
            Label::new(defaults::DENSITY_LOW)
        } else if object_count < self.medium_threshold {
            Label::new(defaults::DENSITY_MEDIUM)
        } else {
            Label::new(defaults::DENSITY_HIGH)
        }
    }
}

impl Default for DensityClassifier {
    fn default() -> Self {
        Self {
            low_threshold: defaults::DENSITY_LOW_COUNT,
            medium_threshold: defaults::DENSITY_MEDIUM_COUNT,
        }
    }
}
