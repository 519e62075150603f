//! Label and alphabet types.
//!
//! A `Label` is one symbol a per-frame classifier can emit; an `Alphabet` is
//! the declared finite set of labels a session accepts. The stabilizer only
//! ever compares labels for equality — their meaning lives in the dispatcher.

use crate::defaults;
use crate::error::{FramelockError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One symbol from the finite alphabet a classifier can emit for a frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The single command byte for this label, if it is one byte long.
    ///
    /// Used by the serial contract, where committed states are one-character
    /// command codes.
    pub fn as_command_byte(&self) -> Option<u8> {
        let bytes = self.0.as_bytes();
        if bytes.len() == 1 { Some(bytes[0]) } else { None }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The declared finite set of labels a session accepts.
///
/// Observations outside the alphabet are rejected before they reach the
/// stabilizer window. The alphabet optionally designates a sentinel label
/// ("no classifiable subject present") and a separator symbol used by the
/// sentence assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    labels: Vec<Label>,
    sentinel: Option<Label>,
    separator: Label,
}

impl Alphabet {
    /// Creates an alphabet from a list of labels.
    ///
    /// Fails if the list is empty or contains duplicates.
    pub fn new(labels: Vec<Label>) -> Result<Self> {
        if labels.is_empty() {
            return Err(FramelockError::ConfigInvalidValue {
                key: "alphabet.labels".to_string(),
                message: "alphabet must declare at least one label".to_string(),
            });
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(FramelockError::ConfigInvalidValue {
                    key: "alphabet.labels".to_string(),
                    message: format!("duplicate label '{}'", label),
                });
            }
        }
        Ok(Self {
            labels,
            sentinel: None,
            separator: Label::new(defaults::SEPARATOR_LABEL),
        })
    }

    /// Designates the sentinel label. Must already be a member.
    pub fn with_sentinel(mut self, sentinel: Label) -> Result<Self> {
        if !self.labels.contains(&sentinel) {
            return Err(FramelockError::ConfigInvalidValue {
                key: "alphabet.sentinel".to_string(),
                message: format!("sentinel '{}' is not a declared label", sentinel),
            });
        }
        self.sentinel = Some(sentinel);
        Ok(self)
    }

    /// Overrides the separator symbol appended by `append_separator`.
    pub fn with_separator(mut self, separator: Label) -> Self {
        self.separator = separator;
        self
    }

    /// The three-command alphabet of the density contract: L, M, H.
    pub fn density() -> Self {
        Self {
            labels: vec![
                Label::new(defaults::DENSITY_LOW),
                Label::new(defaults::DENSITY_MEDIUM),
                Label::new(defaults::DENSITY_HIGH),
            ],
            sentinel: None,
            separator: Label::new(defaults::SEPARATOR_LABEL),
        }
    }

    /// The fingerspelling alphabet of the sign contract: A-Z, 0-9 and the
    /// "blank" sentinel.
    pub fn sign_fingerspelling() -> Self {
        let mut labels: Vec<Label> = ('A'..='Z').map(|c| Label::new(c.to_string())).collect();
        labels.extend(('0'..='9').map(|c| Label::new(c.to_string())));
        let sentinel = Label::new(defaults::SENTINEL_LABEL);
        labels.push(sentinel.clone());
        Self {
            labels,
            sentinel: Some(sentinel),
            separator: Label::new(defaults::SEPARATOR_LABEL),
        }
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    pub fn is_sentinel(&self, label: &Label) -> bool {
        self.sentinel.as_ref() == Some(label)
    }

    pub fn sentinel(&self) -> Option<&Label> {
        self.sentinel.as_ref()
    }

    pub fn separator(&self) -> &Label {
        &self.separator
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display_and_as_str() {
        let label = Label::new("H");
        assert_eq!(label.as_str(), "H");
        assert_eq!(label.to_string(), "H");
    }

    #[test]
    fn test_label_command_byte_single_char() {
        assert_eq!(Label::new("L").as_command_byte(), Some(b'L'));
        assert_eq!(Label::new("blank").as_command_byte(), None);
        assert_eq!(Label::new("").as_command_byte(), None);
    }

    #[test]
    fn test_alphabet_rejects_empty() {
        let result = Alphabet::new(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_alphabet_rejects_duplicates() {
        let result = Alphabet::new(vec![Label::new("A"), Label::new("B"), Label::new("A")]);
        match result {
            Err(FramelockError::ConfigInvalidValue { message, .. }) => {
                assert!(message.contains("duplicate"));
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_alphabet_membership() {
        let alphabet = Alphabet::density();
        assert!(alphabet.contains(&Label::new("L")));
        assert!(alphabet.contains(&Label::new("M")));
        assert!(alphabet.contains(&Label::new("H")));
        assert!(!alphabet.contains(&Label::new("X")));
    }

    #[test]
    fn test_density_alphabet_has_no_sentinel() {
        let alphabet = Alphabet::density();
        assert!(alphabet.sentinel().is_none());
        assert!(!alphabet.is_sentinel(&Label::new("L")));
    }

    #[test]
    fn test_sign_alphabet_sentinel() {
        let alphabet = Alphabet::sign_fingerspelling();
        let blank = Label::new("blank");
        assert!(alphabet.contains(&blank));
        assert!(alphabet.is_sentinel(&blank));
        assert!(!alphabet.is_sentinel(&Label::new("A")));
        // 26 letters + 10 digits + blank
        assert_eq!(alphabet.len(), 37);
    }

    #[test]
    fn test_with_sentinel_requires_membership() {
        let alphabet = Alphabet::new(vec![Label::new("A"), Label::new("B")]).unwrap();
        let result = alphabet.with_sentinel(Label::new("C"));
        assert!(result.is_err());
    }

    #[test]
    fn test_with_sentinel_accepts_member() {
        let alphabet = Alphabet::new(vec![Label::new("A"), Label::new("none")])
            .unwrap()
            .with_sentinel(Label::new("none"))
            .unwrap();
        assert!(alphabet.is_sentinel(&Label::new("none")));
    }

    #[test]
    fn test_separator_default_and_override() {
        let alphabet = Alphabet::density();
        assert_eq!(alphabet.separator().as_str(), " ");

        let alphabet = alphabet.with_separator(Label::new("_"));
        assert_eq!(alphabet.separator().as_str(), "_");
    }

    #[test]
    fn test_label_serde_transparent() {
        let label: Label = toml::from_str::<std::collections::HashMap<String, Label>>(
            "key = \"H\"",
        )
        .unwrap()
        .remove("key")
        .unwrap();
        assert_eq!(label, Label::new("H"));
    }
}
