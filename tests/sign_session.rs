//! End-to-end sign sessions: fingerspelled letters assembled into sentences.

use framelock::observer::ScriptedObservationSource;
use framelock::pipeline::{CollectorDispatcher, Pipeline, PipelineConfig, PipelineHandle};
use std::thread;
use std::time::{Duration, Instant};

fn sign_pipeline() -> PipelineConfig {
    let mut config = PipelineConfig::sign();
    config.frame_interval = Duration::from_millis(1);
    config.quiet = true;
    config
}

fn start_session(frames: Vec<&str>) -> (PipelineHandle, CollectorDispatcher) {
    let dispatcher = CollectorDispatcher::new();
    let source = Box::new(ScriptedObservationSource::from_strs(&frames));
    let handle = Pipeline::new(sign_pipeline())
        .start(source, Box::new(dispatcher.clone()))
        .expect("session should start");
    (handle, dispatcher)
}

fn wait_for_exhaustion(handle: &PipelineHandle) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
}

/// `count` frames of `label`, with a dash of disagreement that stays under
/// the 20% tolerance.
fn noisy_hold(frames: &mut Vec<&'static str>, label: &'static str, noise: &'static str) {
    for i in 0..20 {
        frames.push(if i % 7 == 3 { noise } else { label });
    }
}

#[test]
fn fingerspelling_assembles_a_word() {
    let mut frames = Vec::new();
    frames.extend(["H"; 20]);
    frames.extend(["E"; 20]);
    frames.extend(["Y"; 20]);

    let (handle, dispatcher) = start_session(frames);
    wait_for_exhaustion(&handle);

    assert_eq!(handle.stop(), Some("HEY".to_string()));
    assert_eq!(dispatcher.commits().len(), 3);
    assert_eq!(dispatcher.terminal_flushes(), 1);
}

#[test]
fn tolerant_agreement_survives_classifier_noise() {
    let mut frames = Vec::new();
    noisy_hold(&mut frames, "O", "Q");
    noisy_hold(&mut frames, "K", "R");

    let (handle, _dispatcher) = start_session(frames);
    wait_for_exhaustion(&handle);

    assert_eq!(handle.stop(), Some("OK".to_string()));
}

#[test]
fn sentinel_gap_allows_repeated_letters() {
    let mut frames = Vec::new();
    frames.extend(["L"; 20]);
    frames.extend(["blank"; 20]);
    frames.extend(["L"; 20]);

    let (handle, dispatcher) = start_session(frames);
    wait_for_exhaustion(&handle);

    // The blank commit breaks the repeat suppression without appearing in
    // the sentence.
    assert_eq!(handle.stop(), Some("LL".to_string()));
    assert_eq!(dispatcher.commits().len(), 3);
}

#[test]
fn held_letter_is_not_duplicated() {
    // One long hold: the letter commits once no matter how long it lasts.
    let (handle, dispatcher) = start_session(vec!["W"; 100]);
    wait_for_exhaustion(&handle);

    assert_eq!(handle.stop(), Some("W".to_string()));
    assert_eq!(dispatcher.commits().len(), 1);
}

#[test]
fn separator_control_inserts_a_space() {
    let mut frames = Vec::new();
    frames.extend(["H"; 20]);
    frames.extend(["I"; 20]);

    let (handle, dispatcher) = start_session(frames);
    wait_for_exhaustion(&handle);

    handle.append_separator().expect("separator should send");
    thread::sleep(Duration::from_millis(50));

    assert_eq!(handle.stop(), Some("HI ".to_string()));
    assert_eq!(dispatcher.controls().len(), 1);
}

#[test]
fn clear_control_discards_the_sentence() {
    let mut frames = Vec::new();
    frames.extend(["N"; 20]);
    frames.extend(["O"; 20]);

    let (handle, _dispatcher) = start_session(frames);
    wait_for_exhaustion(&handle);

    handle.clear().expect("clear should send");
    thread::sleep(Duration::from_millis(50));

    assert_eq!(handle.stop(), None);
}

#[test]
fn warmup_commits_nothing_before_window_fills() {
    // 19 frames: one short of the window.
    let (handle, dispatcher) = start_session(vec!["A"; 19]);
    wait_for_exhaustion(&handle);

    assert_eq!(handle.stop(), None);
    assert!(dispatcher.commits().is_empty());
}
