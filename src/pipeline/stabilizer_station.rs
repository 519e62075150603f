//! Stabilizer station that turns raw observations into committed transitions.

use crate::output;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{CommitEvent, Observation, SessionEvent};
use crate::stabilizer::{Decision, Stabilizer};

/// Station wrapping the [`Stabilizer`] for pipeline use.
///
/// Held and warm-up frames produce no output; committed transitions flow
/// downstream as [`SessionEvent::Commit`]. Unknown labels are recoverable:
/// the frame is reported and dropped, the window stays intact.
pub struct StabilizerStation {
    stabilizer: Stabilizer,
    show_status: bool,
}

impl StabilizerStation {
    pub fn new(stabilizer: Stabilizer) -> Self {
        Self {
            stabilizer,
            show_status: false,
        }
    }

    /// Enables or disables the live agreement bar on stderr.
    pub fn with_show_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }

    fn display_status(&self) {
        let config = self.stabilizer.config();
        let committed = self.stabilizer.committed();
        match self.stabilizer.snapshot() {
            Some((mode, agreement)) => output::render_status(
                Some(&mode),
                committed,
                agreement,
                config.agreement_threshold,
                self.stabilizer.window_len(),
                config.window_size,
            ),
            None => output::render_status(
                None,
                committed,
                0.0,
                config.agreement_threshold,
                0,
                config.window_size,
            ),
        }
    }
}

impl Station for StabilizerStation {
    type Input = Observation;
    type Output = SessionEvent;

    fn name(&self) -> &'static str {
        "stabilizer"
    }

    fn process(&mut self, obs: Observation) -> Result<Option<SessionEvent>, StationError> {
        let decision = self
            .stabilizer
            .observe(&obs.label)
            .map_err(|e| StationError::Recoverable(format!("frame {}: {}", obs.sequence, e)))?;

        if self.show_status {
            self.display_status();
        }

        match decision {
            Decision::Commit { previous, label } => {
                Ok(Some(SessionEvent::Commit(CommitEvent {
                    previous,
                    label,
                    sequence: obs.sequence,
                    timestamp: obs.timestamp,
                })))
            }
            Decision::Warmup | Decision::Hold => Ok(None),
        }
    }

    fn shutdown(&mut self) {
        if self.show_status {
            output::clear_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{Alphabet, Label};
    use crate::stabilizer::StabilizerConfig;
    use std::time::Instant;

    fn density_station() -> StabilizerStation {
        let stabilizer =
            Stabilizer::new(StabilizerConfig::density(), Alphabet::density()).unwrap();
        StabilizerStation::new(stabilizer)
    }

    fn obs(label: &str, sequence: u64) -> Observation {
        Observation::new(Label::new(label), Instant::now(), sequence)
    }

    #[test]
    fn test_warmup_and_first_commit() {
        let mut station = density_station();

        for i in 0..4 {
            assert_eq!(station.process(obs("H", i)).unwrap(), None);
        }

        let event = station.process(obs("H", 4)).unwrap();
        let Some(SessionEvent::Commit(commit)) = event else {
            panic!("expected a commit, got {event:?}");
        };
        assert_eq!(commit.previous, None);
        assert_eq!(commit.label, Label::new("H"));
        assert_eq!(commit.sequence, 4);
    }

    #[test]
    fn test_holds_produce_no_output() {
        let mut station = density_station();
        for i in 0..5 {
            station.process(obs("L", i)).unwrap();
        }

        // Already committed L, steady frames are held
        assert_eq!(station.process(obs("L", 5)).unwrap(), None);
        assert_eq!(station.process(obs("L", 6)).unwrap(), None);
    }

    #[test]
    fn test_unknown_label_is_recoverable() {
        let mut station = density_station();
        station.process(obs("L", 0)).unwrap();

        let err = station.process(obs("X", 1)).unwrap_err();
        assert!(matches!(err, StationError::Recoverable(_)));
        assert!(err.to_string().contains("frame 1"));

        // The rejected frame did not enter the window; four more L frames
        // complete the original warm-up.
        for i in 2..5 {
            assert_eq!(station.process(obs("L", i)).unwrap(), None);
        }
        let event = station.process(obs("L", 5)).unwrap();
        assert!(matches!(event, Some(SessionEvent::Commit(_))));
    }

    #[test]
    fn test_transition_carries_previous_state() {
        let mut station = density_station();
        for i in 0..5 {
            station.process(obs("L", i)).unwrap();
        }
        let mut last = None;
        for i in 5..10 {
            last = station.process(obs("H", i)).unwrap();
        }

        let Some(SessionEvent::Commit(commit)) = last else {
            panic!("expected a commit, got {last:?}");
        };
        assert_eq!(commit.previous, Some(Label::new("L")));
        assert_eq!(commit.label, Label::new("H"));
        assert_eq!(commit.sequence, 9);
    }

    #[test]
    fn test_status_display_does_not_affect_decisions() {
        let mut station = density_station().with_show_status(true);
        for i in 0..4 {
            assert_eq!(station.process(obs("M", i)).unwrap(), None);
        }
        assert!(station.process(obs("M", 4)).unwrap().is_some());
        station.shutdown();
    }
}
