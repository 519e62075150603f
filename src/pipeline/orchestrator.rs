//! Session pipeline that runs from startup until shutdown.

use crate::alphabet::{Alphabet, Label};
use crate::assembler::SentenceAssembler;
use crate::clock::{Clock, SystemClock};
use crate::defaults;
use crate::error::{FramelockError, Result};
use crate::observer::ObservationSource;
use crate::pipeline::dispatcher::{ActionDispatcher, DispatcherStation};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::stabilizer_station::StabilizerStation;
use crate::pipeline::station::StationRunner;
use crate::pipeline::types::{ControlCommand, Observation, SessionEvent};
use crate::stabilizer::{Stabilizer, StabilizerConfig};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the session pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stabilizer tuning (window size, agreement threshold)
    pub stabilizer: StabilizerConfig,
    /// Label alphabet the session accepts
    pub alphabet: Alphabet,
    /// Accumulate committed labels into a sentence
    pub assemble_sentence: bool,
    /// Delay between source polls
    pub frame_interval: Duration,
    /// Verbosity level (0=results only, 1=status bar + transitions)
    pub verbosity: u8,
    /// Suppress output messages
    pub quiet: bool,
    /// Channel buffer sizes
    pub observation_buffer: usize,
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::density()
    }
}

impl PipelineConfig {
    /// Crowd-density preset: unanimity over 5 frames, L/M/H commands.
    pub fn density() -> Self {
        Self {
            stabilizer: StabilizerConfig::density(),
            alphabet: Alphabet::density(),
            assemble_sentence: false,
            frame_interval: Duration::from_millis(defaults::FRAME_INTERVAL_MS),
            verbosity: 0,
            quiet: false,
            observation_buffer: defaults::OBSERVATION_BUFFER,
            event_buffer: defaults::EVENT_BUFFER,
        }
    }

    /// Sign-language preset: 0.8 agreement over 20 frames, fingerspelling
    /// alphabet with the "blank" sentinel, sentence assembly on.
    pub fn sign() -> Self {
        Self {
            stabilizer: StabilizerConfig::sign(),
            alphabet: Alphabet::sign_fingerspelling(),
            assemble_sentence: true,
            ..Self::density()
        }
    }
}

/// Handle to a running session.
pub struct PipelineHandle {
    /// Flag to signal shutdown
    running: Arc<AtomicBool>,
    /// Join handles for spawned threads
    threads: Vec<JoinHandle<()>>,
    /// Receiver for the dispatcher's finish() result
    result_rx: Option<crossbeam_channel::Receiver<Option<String>>>,
    /// Sender for control commands; dropped on stop so the event channel closes
    control_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
}

impl PipelineHandle {
    /// Appends the separator to the assembled sentence.
    pub fn append_separator(&self) -> Result<()> {
        self.send_control(ControlCommand::AppendSeparator)
    }

    /// Clears the assembled sentence.
    pub fn clear(&self) -> Result<()> {
        self.send_control(ControlCommand::Clear)
    }

    fn send_control(&self, command: ControlCommand) -> Result<()> {
        let tx = self
            .control_tx
            .as_ref()
            .ok_or_else(|| FramelockError::Other("session already stopped".to_string()))?;
        tx.send(SessionEvent::Control(command))
            .map_err(|_| FramelockError::Other("session event channel closed".to_string()))
    }

    /// Stops the session gracefully and returns the final sentence, if any.
    ///
    /// Waits up to 5s for the result, then 1s for threads to finish.
    /// After the deadline, remaining threads are detached — they die with
    /// the process.
    pub fn stop(mut self) -> Option<String> {
        // Signal shutdown; the poll thread exits and drops the observation
        // sender, which cascades channel closure through the stations.
        self.running.store(false, Ordering::SeqCst);

        // The dispatcher's input only closes once every sender is gone, so
        // the control sender goes first.
        drop(self.control_tx.take());

        let result = self
            .result_rx
            .as_ref()
            .and_then(|rx| rx.recv_timeout(Duration::from_secs(5)).ok().flatten());

        // Wait up to 1s more for threads to finish, joining completed ones
        // to surface panics.
        let deadline = Instant::now() + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("framelock: session thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "framelock: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }

        result
    }

    /// Returns true if the session is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Session pipeline: ObservationSource → Stabilizer → ActionDispatcher.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Creates a new pipeline with the default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the session.
    ///
    /// Validates the stabilizer configuration up front — a bad window size or
    /// threshold fails here, before any thread spawns.
    pub fn start(
        self,
        mut source: Box<dyn ObservationSource>,
        dispatcher: Box<dyn ActionDispatcher>,
    ) -> Result<PipelineHandle> {
        let stabilizer = Stabilizer::new(self.config.stabilizer, self.config.alphabet.clone())?;

        let running = Arc::new(AtomicBool::new(true));
        let sequence = Arc::new(AtomicU64::new(0));

        let (obs_tx, obs_rx) = bounded(self.config.observation_buffer);
        let (event_tx, event_rx) = bounded(self.config.event_buffer);

        let stabilizer_station = StabilizerStation::new(stabilizer)
            .with_show_status(self.config.verbosity >= 1 && !self.config.quiet);

        let (result_tx, result_rx) = bounded(1);
        let mut dispatcher_station = DispatcherStation::new(
            dispatcher,
            self.config.quiet,
            self.config.verbosity,
            result_tx,
        );
        if self.config.assemble_sentence {
            dispatcher_station = dispatcher_station
                .with_assembler(SentenceAssembler::new(self.config.alphabet.clone()));
        }

        // Controls share the event channel with commits so ordering holds.
        let control_tx = event_tx.clone();

        let stabilizer_runner = StationRunner::spawn(
            stabilizer_station,
            obs_rx,
            event_tx,
            self.error_reporter.clone(),
        );

        // The dispatcher is the terminal station; its output goes nowhere.
        let (dispatch_out_tx, dispatch_out_rx) = bounded::<()>(self.config.event_buffer);

        let dispatcher_runner = StationRunner::spawn(
            dispatcher_station,
            event_rx,
            dispatch_out_tx,
            self.error_reporter.clone(),
        );

        // Drain the dispatcher output in a separate thread
        let drain_running = running.clone();
        let drain_handle = thread::spawn(move || {
            while drain_running.load(Ordering::SeqCst) {
                if dispatch_out_rx
                    .recv_timeout(Duration::from_millis(100))
                    .is_err()
                    && !drain_running.load(Ordering::SeqCst)
                {
                    break;
                }
            }
        });

        source.start()?;
        let source_is_finite = source.is_finite();

        // Spawn the observation polling thread
        let poll_running = running.clone();
        let poll_sequence = sequence.clone();
        let poll_interval = self.config.frame_interval;
        let clock = self.clock.clone();
        let poll_handle = thread::spawn(move || {
            let mut consecutive_errors: u32 = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 10;

            while poll_running.load(Ordering::SeqCst) {
                let label: Option<Label> = match source.next_label() {
                    Ok(l) => {
                        consecutive_errors = 0;
                        l
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "framelock: observation source failed {consecutive_errors} times in a row: {e}"
                            );
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                let Some(label) = label else {
                    if source_is_finite {
                        // Script/pipe source exhausted — exit polling loop.
                        break;
                    }
                    // Live source: no frame ready yet, keep polling.
                    thread::sleep(poll_interval);
                    continue;
                };

                let observation = Observation::new(
                    label,
                    clock.now(),
                    poll_sequence.fetch_add(1, Ordering::Relaxed),
                );

                // Every frame counts toward the window, so block instead of
                // dropping when the channel is momentarily full.
                if obs_tx.send(observation).is_err() {
                    break;
                }

                thread::sleep(poll_interval);
            }

            if let Err(e) = source.stop() {
                eprintln!("framelock: failed to stop observation source: {e}");
            }

            // A finite source ending on its own also ends the session, so
            // callers polling is_running() see the exhaustion.
            poll_running.store(false, Ordering::SeqCst);
        });

        let mut threads = vec![poll_handle, drain_handle];
        threads.push(thread::spawn(move || {
            if let Err(msg) = stabilizer_runner.join() {
                eprintln!("framelock: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = dispatcher_runner.join() {
                eprintln!("framelock: {msg}");
            }
        }));

        Ok(PipelineHandle {
            running,
            threads,
            result_rx: Some(result_rx),
            control_tx: Some(control_tx),
        })
    }
}
