//! Shared terminal rendering for session output.
//! Used by the stabilizer status line and verbose commit reporting.

use crate::alphabet::Label;
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Width of the agreement bar in characters.
const BAR_WIDTH: usize = 20;

/// Clear the current terminal line (replaces the status bar etc.)
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Format an agreement bar with a threshold marker.
///
/// The bar fills with the current agreement ratio; `|` marks the commit
/// threshold. Example at 0.6 agreement, 0.8 threshold:
/// `[############    |   ] 60%`
pub fn format_agreement_bar(agreement: f64, threshold: f64) -> String {
    let filled = ((agreement.clamp(0.0, 1.0)) * BAR_WIDTH as f64).round() as usize;
    let marker = ((threshold.clamp(0.0, 1.0)) * BAR_WIDTH as f64).round() as usize;

    let mut bar = String::with_capacity(BAR_WIDTH + 10);
    bar.push('[');
    for i in 0..BAR_WIDTH {
        if i + 1 == marker && i >= filled {
            bar.push('|');
        } else if i < filled {
            bar.push('#');
        } else {
            bar.push(' ');
        }
    }
    bar.push(']');
    bar.push_str(&format!(" {:3.0}%", agreement * 100.0));
    bar
}

/// Render the live status line: leading raw label, committed state,
/// agreement bar, fill state.
///
/// During warm-up, `mode` is `None` and the fill fraction shows progress.
pub fn render_status(
    mode: Option<&Label>,
    committed: Option<&Label>,
    agreement: f64,
    threshold: f64,
    window_len: usize,
    window_size: usize,
) {
    let raw = mode.map(|l| l.as_str()).unwrap_or("-");
    let stable = committed.map(|l| l.as_str()).unwrap_or("-");
    let bar = format_agreement_bar(agreement, threshold);
    let fill = if window_len < window_size {
        format!("  {DIM}warmup {window_len}/{window_size}{RESET}")
    } else {
        String::new()
    };
    eprint!("\r\x1b[2K{bar} raw {raw} {DIM}|{RESET} stable {stable}{fill}");
    io::stderr().flush().ok();
}

/// Render a committed transition.
pub fn render_commit(previous: Option<&Label>, label: &Label, sequence: u64) {
    clear_line();
    match previous {
        Some(prev) => {
            eprintln!("{GREEN}{prev} -> {label}{RESET} {DIM}(frame {sequence}){RESET}");
        }
        None => {
            eprintln!("{GREEN}-> {label}{RESET} {DIM}(frame {sequence}){RESET}");
        }
    }
}

/// Render the current assembled sentence.
pub fn render_sentence(text: &str) {
    clear_line();
    eprintln!("{YELLOW}{text}{RESET}");
}

/// Render a non-fatal warning (rejected frame, dispatch failure).
pub fn render_warning(message: &str) {
    clear_line();
    eprintln!("{DIM}[warn] {message}{RESET}");
}
