//! Core station abstraction and runner for the session pipeline.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing station in the session pipeline.
///
/// Each station receives input, processes it, and produces output.
/// Stations run in their own threads and are connected by channels.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - Produced output (e.g., a committed transition)
    /// - `Ok(None)` - Consumed without output (e.g., a held frame)
    /// - `Err(StationError)` - Processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once when the station is shutting down.
    ///
    /// Override this to flush terminal actions or emit final results.
    fn shutdown(&mut self) {}
}

/// Runs a station in a dedicated thread.
///
/// The thread drains the input channel until it closes, then calls
/// [`Station::shutdown`] exactly once.
pub struct StationRunner {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
}

impl StationRunner {
    /// Spawns a station in a dedicated thread.
    pub fn spawn<S: Station>(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            while let Ok(input) = input_rx.recv() {
                match station.process(input) {
                    Ok(Some(output)) => {
                        if output_tx.send(output).is_err() {
                            // Downstream hung up, shut down
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err @ StationError::Recoverable(_)) => {
                        error_reporter.report(station.name(), &err);
                    }
                    Err(err @ StationError::Fatal(_)) => {
                        error_reporter.report(station.name(), &err);
                        break;
                    }
                }
            }
            station.shutdown();
        });

        Self {
            handle: Some(handle),
            station_name,
        }
    }

    /// Waits for the station thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name)),
            None => Ok(()),
        }
    }

    /// Returns the name of the station.
    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
