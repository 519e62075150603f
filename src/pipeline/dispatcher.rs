//! Action dispatchers for committed transitions.
//!
//! Pairs with `ObservationSource` for input: a dispatcher is the pluggable
//! back end that turns commits into side effects (serial commands, speech,
//! stdout). Dispatch failures never undo a commit; the stabilizer has
//! already accepted the transition by the time the dispatcher sees it.

use crate::alphabet::Label;
use crate::assembler::SentenceAssembler;
use crate::error::{FramelockError, Result};
use crate::output;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{CommitEvent, ControlCommand, SessionEvent};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

/// Pluggable handler for committed transitions and session controls.
pub trait ActionDispatcher: Send + 'static {
    /// Handle a committed transition. Called once per commit.
    fn on_commit(&mut self, event: &CommitEvent) -> Result<()>;

    /// Handle a session control command. Default implementation ignores it.
    fn on_control(&mut self, _command: ControlCommand) -> Result<()> {
        Ok(())
    }

    /// Called once on shutdown, before `finish`. Dispatchers that drive
    /// external hardware use this to leave it in a safe state.
    fn flush_terminal(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called on shutdown. Return accumulated output if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "dispatcher"
    }
}

/// Byte-oriented command channel, normally a serial port.
pub trait PortWriter: Send + 'static {
    fn write_command(&mut self, byte: u8) -> Result<()>;
}

/// Port writer over any `io::Write` (serial device file, pipe, buffer).
pub struct IoPortWriter<W: Write + Send + 'static> {
    writer: W,
}

impl<W: Write + Send + 'static> IoPortWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send + 'static> PortWriter for IoPortWriter<W> {
    fn write_command(&mut self, byte: u8) -> Result<()> {
        self.writer.write_all(&[byte])?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Port writer that records commands in memory, for tests and dry runs.
#[derive(Clone, Default)]
pub struct MockPortWriter {
    written: Arc<Mutex<Vec<u8>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockPortWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands written so far, in order.
    #[allow(clippy::unwrap_used)]
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    /// Makes the next write fail.
    #[allow(clippy::unwrap_used)]
    pub fn set_fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

impl PortWriter for MockPortWriter {
    #[allow(clippy::unwrap_used)]
    fn write_command(&mut self, byte: u8) -> Result<()> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(FramelockError::Dispatch {
                message: "mock port failure".to_string(),
            });
        }
        self.written.lock().unwrap().push(byte);
        Ok(())
    }
}

/// Dispatcher that writes one command byte per committed state.
///
/// On shutdown it writes the quiescent command exactly once, so the
/// controlled device never stays in whatever state the session ended in.
pub struct SerialCommandDispatcher<P: PortWriter> {
    port: P,
    quiescent: Label,
    quiesced: bool,
}

impl<P: PortWriter> SerialCommandDispatcher<P> {
    pub fn new(port: P, quiescent: Label) -> Self {
        Self {
            port,
            quiescent,
            quiesced: false,
        }
    }

    fn command_byte(label: &Label) -> Result<u8> {
        label
            .as_command_byte()
            .ok_or_else(|| FramelockError::Dispatch {
                message: format!("label '{}' is not a single-byte command", label),
            })
    }
}

impl<P: PortWriter> ActionDispatcher for SerialCommandDispatcher<P> {
    fn on_commit(&mut self, event: &CommitEvent) -> Result<()> {
        let byte = Self::command_byte(&event.label)?;
        self.port.write_command(byte)
    }

    fn flush_terminal(&mut self) -> Result<()> {
        if self.quiesced {
            return Ok(());
        }
        self.quiesced = true;
        let byte = Self::command_byte(&self.quiescent)?;
        self.port.write_command(byte)
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

/// Text-to-speech back end.
pub trait SpeechEngine: Send + 'static {
    fn say(&mut self, text: &str) -> Result<()>;
}

/// Speech engine that shells out to a TTS program (espeak, say, ...).
pub struct CommandSpeechEngine {
    program: String,
}

impl CommandSpeechEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn say(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    FramelockError::DispatchToolNotFound {
                        tool: self.program.clone(),
                    }
                } else {
                    FramelockError::Io(e)
                }
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FramelockError::Dispatch {
                message: format!("{} exited with {}", self.program, status),
            })
        }
    }
}

/// Speech engine that records utterances in memory, for tests.
#[derive(Clone, Default)]
pub struct MockSpeechEngine {
    utterances: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)]
    pub fn utterances(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }

    #[allow(clippy::unwrap_used)]
    pub fn set_fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

impl SpeechEngine for MockSpeechEngine {
    #[allow(clippy::unwrap_used)]
    fn say(&mut self, text: &str) -> Result<()> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(FramelockError::Dispatch {
                message: "mock speech failure".to_string(),
            });
        }
        self.utterances.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Dispatcher that speaks each committed label aloud.
///
/// The sentinel label is committed like any other state but stays silent;
/// speaking "blank" every time the signer rests their hand would be noise.
/// Control commands get short verbal acknowledgments instead of their
/// literal labels.
pub struct SpeechDispatcher<S: SpeechEngine> {
    engine: S,
    sentinel: Option<Label>,
}

impl<S: SpeechEngine> SpeechDispatcher<S> {
    pub fn new(engine: S) -> Self {
        Self {
            engine,
            sentinel: None,
        }
    }

    /// Sets the label that is committed silently.
    pub fn with_sentinel(mut self, sentinel: Label) -> Self {
        self.sentinel = Some(sentinel);
        self
    }
}

impl<S: SpeechEngine> ActionDispatcher for SpeechDispatcher<S> {
    fn on_commit(&mut self, event: &CommitEvent) -> Result<()> {
        if self.sentinel.as_ref() == Some(&event.label) {
            return Ok(());
        }
        self.engine.say(event.label.as_str())
    }

    fn on_control(&mut self, command: ControlCommand) -> Result<()> {
        match command {
            ControlCommand::AppendSeparator => self.engine.say("space"),
            ControlCommand::Clear => self.engine.say("cleared"),
        }
    }

    fn name(&self) -> &'static str {
        "speech"
    }
}

/// Collects commit labels for library use and tests.
/// Returns the concatenated labels on finish().
#[derive(Clone, Default)]
pub struct CollectorDispatcher {
    commits: Arc<Mutex<Vec<CommitEvent>>>,
    controls: Arc<Mutex<Vec<ControlCommand>>>,
    terminal_flushes: Arc<Mutex<u32>>,
}

impl CollectorDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)]
    pub fn commits(&self) -> Vec<CommitEvent> {
        self.commits.lock().unwrap().clone()
    }

    #[allow(clippy::unwrap_used)]
    pub fn controls(&self) -> Vec<ControlCommand> {
        self.controls.lock().unwrap().clone()
    }

    #[allow(clippy::unwrap_used)]
    pub fn terminal_flushes(&self) -> u32 {
        *self.terminal_flushes.lock().unwrap()
    }
}

impl ActionDispatcher for CollectorDispatcher {
    #[allow(clippy::unwrap_used)]
    fn on_commit(&mut self, event: &CommitEvent) -> Result<()> {
        self.commits.lock().unwrap().push(event.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    fn on_control(&mut self, command: ControlCommand) -> Result<()> {
        self.controls.lock().unwrap().push(command);
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    fn flush_terminal(&mut self) -> Result<()> {
        *self.terminal_flushes.lock().unwrap() += 1;
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    fn finish(&mut self) -> Option<String> {
        let commits = self.commits.lock().unwrap();
        if commits.is_empty() {
            None
        } else {
            Some(
                commits
                    .iter()
                    .map(|e| e.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Pipe mode dispatcher — writes each committed label to stdout.
pub struct StdoutDispatcher;

impl ActionDispatcher for StdoutDispatcher {
    fn on_commit(&mut self, event: &CommitEvent) -> Result<()> {
        println!("{}", event.label);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Station wrapper for any ActionDispatcher implementation.
///
/// Owns the optional sentence assembler: commits update the sentence before
/// the dispatcher runs, and control commands are applied here so commits and
/// controls stay ordered on one channel. A failed dispatch is reported and
/// the session continues — the assembler and stabilizer keep their state.
pub(crate) struct DispatcherStation {
    dispatcher: Box<dyn ActionDispatcher>,
    assembler: Option<SentenceAssembler>,
    quiet: bool,
    verbosity: u8,
    result_tx: Option<crossbeam_channel::Sender<Option<String>>>,
}

impl DispatcherStation {
    pub(crate) fn new(
        dispatcher: Box<dyn ActionDispatcher>,
        quiet: bool,
        verbosity: u8,
        result_tx: crossbeam_channel::Sender<Option<String>>,
    ) -> Self {
        Self {
            dispatcher,
            assembler: None,
            quiet,
            verbosity,
            result_tx: Some(result_tx),
        }
    }

    pub(crate) fn with_assembler(mut self, assembler: SentenceAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    fn show_sentence(&self) {
        if self.quiet {
            return;
        }
        if let Some(ref assembler) = self.assembler {
            output::render_sentence(&assembler.current_text());
        }
    }
}

impl Station for DispatcherStation {
    type Input = SessionEvent;
    type Output = ();

    fn name(&self) -> &'static str {
        self.dispatcher.name()
    }

    fn process(&mut self, event: SessionEvent) -> std::result::Result<Option<()>, StationError> {
        match event {
            SessionEvent::Commit(commit) => {
                if let Some(ref mut assembler) = self.assembler {
                    assembler.on_commit(&commit.label);
                }
                if !self.quiet && self.verbosity >= 1 {
                    output::render_commit(commit.previous.as_ref(), &commit.label, commit.sequence);
                }
                if let Err(e) = self.dispatcher.on_commit(&commit) {
                    // The commit stands; only the side effect was lost.
                    return Err(StationError::Recoverable(format!(
                        "dispatch of '{}' failed: {}",
                        commit.label, e
                    )));
                }
                self.show_sentence();
                Ok(Some(()))
            }
            SessionEvent::Control(command) => {
                if let Some(ref mut assembler) = self.assembler {
                    match command {
                        ControlCommand::AppendSeparator => assembler.append_separator(),
                        ControlCommand::Clear => assembler.clear(),
                    }
                }
                if let Err(e) = self.dispatcher.on_control(command) {
                    return Err(StationError::Recoverable(format!(
                        "control {:?} failed: {}",
                        command, e
                    )));
                }
                self.show_sentence();
                Ok(Some(()))
            }
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.dispatcher.flush_terminal() {
            eprintln!("framelock: terminal flush failed: {e}");
        }

        let result = match self.assembler {
            Some(ref assembler) => {
                let text = assembler.current_text();
                if text.is_empty() { None } else { Some(text) }
            }
            None => self.dispatcher.finish(),
        };

        if let Some(tx) = self.result_tx.take()
            && tx.send(result).is_err()
        {
            eprintln!("framelock: dispatcher shutdown: result receiver already dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn commit(previous: Option<&str>, label: &str, sequence: u64) -> CommitEvent {
        CommitEvent {
            previous: previous.map(Label::new),
            label: Label::new(label),
            sequence,
            timestamp: std::time::Instant::now(),
        }
    }

    #[test]
    fn dispatcher_is_object_safe() {
        let _dispatcher: Box<dyn ActionDispatcher> = Box::new(CollectorDispatcher::new());
    }

    // ── serial dispatcher tests ────────────────────────────────────────

    #[test]
    fn serial_writes_one_byte_per_commit() {
        let port = MockPortWriter::new();
        let mut dispatcher = SerialCommandDispatcher::new(port.clone(), Label::new("L"));

        dispatcher.on_commit(&commit(None, "L", 4)).unwrap();
        dispatcher.on_commit(&commit(Some("L"), "H", 12)).unwrap();
        dispatcher.on_commit(&commit(Some("H"), "M", 30)).unwrap();

        assert_eq!(port.written(), vec![b'L', b'H', b'M']);
    }

    #[test]
    fn serial_flush_terminal_writes_quiescent_once() {
        let port = MockPortWriter::new();
        let mut dispatcher = SerialCommandDispatcher::new(port.clone(), Label::new("L"));

        dispatcher.on_commit(&commit(None, "H", 4)).unwrap();
        dispatcher.flush_terminal().unwrap();
        dispatcher.flush_terminal().unwrap();

        assert_eq!(port.written(), vec![b'H', b'L']);
    }

    #[test]
    fn serial_rejects_multibyte_label() {
        let port = MockPortWriter::new();
        let mut dispatcher = SerialCommandDispatcher::new(port.clone(), Label::new("L"));

        let result = dispatcher.on_commit(&commit(None, "blank", 0));
        assert!(result.is_err());
        assert!(port.written().is_empty());
    }

    #[test]
    fn serial_write_failure_propagates() {
        let port = MockPortWriter::new();
        port.set_fail_next();
        let mut dispatcher = SerialCommandDispatcher::new(port.clone(), Label::new("L"));

        assert!(dispatcher.on_commit(&commit(None, "H", 0)).is_err());

        // Next write succeeds; the failed one is simply lost.
        dispatcher.on_commit(&commit(Some("H"), "M", 5)).unwrap();
        assert_eq!(port.written(), vec![b'M']);
    }

    #[test]
    fn io_port_writer_writes_bytes() {
        let mut writer = IoPortWriter::new(Vec::new());
        writer.write_command(b'H').unwrap();
        writer.write_command(b'L').unwrap();
        assert_eq!(writer.writer, vec![b'H', b'L']);
    }

    // ── speech dispatcher tests ────────────────────────────────────────

    #[test]
    fn speech_speaks_committed_labels() {
        let engine = MockSpeechEngine::new();
        let mut dispatcher = SpeechDispatcher::new(engine.clone());

        dispatcher.on_commit(&commit(None, "A", 19)).unwrap();
        dispatcher.on_commit(&commit(Some("A"), "B", 40)).unwrap();

        assert_eq!(engine.utterances(), vec!["A", "B"]);
    }

    #[test]
    fn speech_is_silent_on_sentinel() {
        let engine = MockSpeechEngine::new();
        let mut dispatcher =
            SpeechDispatcher::new(engine.clone()).with_sentinel(Label::new("blank"));

        dispatcher.on_commit(&commit(None, "A", 19)).unwrap();
        dispatcher
            .on_commit(&commit(Some("A"), "blank", 45))
            .unwrap();
        dispatcher
            .on_commit(&commit(Some("blank"), "A", 70))
            .unwrap();

        assert_eq!(engine.utterances(), vec!["A", "A"]);
    }

    #[test]
    fn speech_acknowledges_controls() {
        let engine = MockSpeechEngine::new();
        let mut dispatcher = SpeechDispatcher::new(engine.clone());

        dispatcher
            .on_control(ControlCommand::AppendSeparator)
            .unwrap();
        dispatcher.on_control(ControlCommand::Clear).unwrap();

        assert_eq!(engine.utterances(), vec!["space", "cleared"]);
    }

    #[test]
    fn speech_failure_propagates() {
        let engine = MockSpeechEngine::new();
        engine.set_fail_next();
        let mut dispatcher = SpeechDispatcher::new(engine.clone());

        assert!(dispatcher.on_commit(&commit(None, "A", 0)).is_err());
    }

    #[test]
    fn command_speech_engine_reports_missing_program() {
        let mut engine = CommandSpeechEngine::new("definitely-not-a-real-tts-program");
        let err = engine.say("hello").unwrap_err();
        assert!(matches!(err, FramelockError::DispatchToolNotFound { .. }));
    }

    // ── collector dispatcher tests ─────────────────────────────────────

    #[test]
    fn collector_records_commits_and_controls() {
        let mut dispatcher = CollectorDispatcher::new();

        dispatcher.on_commit(&commit(None, "L", 4)).unwrap();
        dispatcher
            .on_control(ControlCommand::AppendSeparator)
            .unwrap();
        dispatcher.on_commit(&commit(Some("L"), "H", 9)).unwrap();

        assert_eq!(dispatcher.commits().len(), 2);
        assert_eq!(dispatcher.controls(), vec![ControlCommand::AppendSeparator]);
        assert_eq!(dispatcher.finish(), Some("L H".to_string()));
    }

    #[test]
    fn collector_empty_returns_none() {
        let mut dispatcher = CollectorDispatcher::new();
        assert_eq!(dispatcher.finish(), None);
    }

    #[test]
    fn collector_counts_terminal_flushes() {
        let mut dispatcher = CollectorDispatcher::new();
        dispatcher.flush_terminal().unwrap();
        assert_eq!(dispatcher.terminal_flushes(), 1);
    }

    // ── dispatcher station tests ───────────────────────────────────────

    fn station_with_collector() -> (DispatcherStation, CollectorDispatcher) {
        let collector = CollectorDispatcher::new();
        let (result_tx, _result_rx) = crossbeam_channel::bounded(1);
        let station = DispatcherStation::new(Box::new(collector.clone()), true, 0, result_tx);
        (station, collector)
    }

    #[test]
    fn station_delegates_commits() {
        let (mut station, collector) = station_with_collector();

        station
            .process(SessionEvent::Commit(commit(None, "H", 4)))
            .unwrap();

        assert_eq!(collector.commits().len(), 1);
        assert_eq!(collector.commits()[0].label, Label::new("H"));
    }

    #[test]
    fn station_shutdown_flushes_terminal_and_sends_result() {
        let collector = CollectorDispatcher::new();
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let mut station =
            DispatcherStation::new(Box::new(collector.clone()), true, 0, result_tx);

        station
            .process(SessionEvent::Commit(commit(None, "H", 4)))
            .unwrap();
        station.shutdown();

        assert_eq!(collector.terminal_flushes(), 1);
        assert_eq!(result_rx.recv().unwrap(), Some("H".to_string()));
    }

    #[test]
    fn station_with_assembler_builds_sentence() {
        let collector = CollectorDispatcher::new();
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let mut station = DispatcherStation::new(Box::new(collector), true, 0, result_tx)
            .with_assembler(SentenceAssembler::new(Alphabet::sign_fingerspelling()));

        station
            .process(SessionEvent::Commit(commit(None, "H", 19)))
            .unwrap();
        station
            .process(SessionEvent::Commit(commit(Some("H"), "I", 40)))
            .unwrap();
        station
            .process(SessionEvent::Control(ControlCommand::AppendSeparator))
            .unwrap();
        station
            .process(SessionEvent::Commit(commit(Some("I"), "5", 70)))
            .unwrap();
        station.shutdown();

        // With an assembler present, the result is the sentence rather than
        // the dispatcher's own accumulation.
        assert_eq!(result_rx.recv().unwrap(), Some("HI 5".to_string()));
    }

    #[test]
    fn station_with_assembler_empty_sentence_is_none() {
        let collector = CollectorDispatcher::new();
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let mut station = DispatcherStation::new(Box::new(collector), true, 0, result_tx)
            .with_assembler(SentenceAssembler::new(Alphabet::sign_fingerspelling()));

        station.shutdown();
        assert_eq!(result_rx.recv().unwrap(), None);
    }

    #[test]
    fn station_dispatch_failure_is_recoverable_and_keeps_sentence() {
        let engine = MockSpeechEngine::new();
        let dispatcher = SpeechDispatcher::new(engine.clone());
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let mut station = DispatcherStation::new(Box::new(dispatcher), true, 0, result_tx)
            .with_assembler(SentenceAssembler::new(Alphabet::sign_fingerspelling()));

        station
            .process(SessionEvent::Commit(commit(None, "O", 19)))
            .unwrap();

        engine.set_fail_next();
        let err = station
            .process(SessionEvent::Commit(commit(Some("O"), "K", 33)))
            .unwrap_err();
        assert!(matches!(err, StationError::Recoverable(_)));

        station.shutdown();
        // The failed dispatch did not lose the letter.
        assert_eq!(result_rx.recv().unwrap(), Some("OK".to_string()));
    }

    #[test]
    fn station_clear_control_resets_sentence() {
        let collector = CollectorDispatcher::new();
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let mut station = DispatcherStation::new(Box::new(collector), true, 0, result_tx)
            .with_assembler(SentenceAssembler::new(Alphabet::sign_fingerspelling()));

        station
            .process(SessionEvent::Commit(commit(None, "X", 19)))
            .unwrap();
        station
            .process(SessionEvent::Control(ControlCommand::Clear))
            .unwrap();
        station.shutdown();

        assert_eq!(result_rx.recv().unwrap(), None);
    }

    #[test]
    fn station_shutdown_logs_on_send_failure() {
        let (mut station, _collector) = station_with_collector();
        // Receiver already dropped by station_with_collector; shutdown must
        // log instead of panicking.
        station.shutdown();
    }

    #[test]
    fn station_name_delegates_to_dispatcher() {
        let (station, _) = station_with_collector();
        assert_eq!(station.name(), "collector");
    }
}
