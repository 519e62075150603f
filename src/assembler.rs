//! Sentence assembly from committed labels.
//!
//! Collects the stabilizer's commit stream into an ordered symbol sequence,
//! handling:
//! - Suppression of back-to-back identical commits
//! - The no-signal sentinel (clears repeat tracking, never enters the buffer)
//! - Explicit separator and clear controls

use crate::alphabet::{Alphabet, Label};

/// Accumulates committed labels into a sentence.
///
/// Lives for the whole session: the buffer only shrinks on an explicit
/// [`clear`], never on a failed commit or a sentinel gap.
///
/// [`clear`]: SentenceAssembler::clear
pub struct SentenceAssembler {
    alphabet: Alphabet,
    buffer: Vec<Label>,
    /// Last label appended to the buffer; `None` after a sentinel commit or
    /// separator, so the next commit is treated as a fresh transition.
    last_appended: Option<Label>,
}

impl SentenceAssembler {
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            buffer: Vec::new(),
            last_appended: None,
        }
    }

    /// Handles one commit event from the stabilizer.
    ///
    /// A sentinel commit resets repeat tracking without touching the buffer:
    /// the next genuine signal counts as a new transition even if it repeats
    /// the symbol that preceded the gap. A non-sentinel commit is appended
    /// unless it equals the label appended immediately before it.
    pub fn on_commit(&mut self, label: &Label) {
        if self.alphabet.is_sentinel(label) {
            self.last_appended = None;
            return;
        }
        if self.last_appended.as_ref() != Some(label) {
            self.buffer.push(label.clone());
            self.last_appended = Some(label.clone());
        }
    }

    /// Appends the separator symbol unconditionally and resets repeat
    /// tracking.
    pub fn append_separator(&mut self) {
        self.buffer.push(self.alphabet.separator().clone());
        self.last_appended = None;
    }

    /// Empties the buffer and resets all tracking. Only ever triggered by an
    /// explicit external command.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_appended = None;
    }

    /// Read-only snapshot of the accumulated labels.
    pub fn labels(&self) -> &[Label] {
        &self.buffer
    }

    /// The accumulated sentence as text. Labels concatenate directly, the
    /// way fingerspelled characters join into words.
    pub fn current_text(&self) -> String {
        self.buffer.iter().map(Label::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}
