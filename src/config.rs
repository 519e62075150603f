use crate::alphabet::{Alphabet, Label};
use crate::defaults;
use crate::stabilizer::StabilizerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub stabilizer: StabilizerSection,
    pub alphabet: AlphabetSection,
    pub session: SessionSection,
    pub serial: SerialSection,
}

/// Stabilizer tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StabilizerSection {
    pub window_size: usize,
    pub agreement_threshold: f64,
}

/// Declared label alphabet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlphabetSection {
    pub labels: Vec<String>,
    pub sentinel: Option<String>,
    pub separator: String,
}

/// Session behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    pub frame_interval_ms: u64,
    pub assemble_sentence: bool,
    pub speech_program: String,
}

/// Serial-like command channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialSection {
    pub port: Option<String>,
    pub quiescent_command: String,
}

impl Default for StabilizerSection {
    fn default() -> Self {
        Self {
            window_size: defaults::DENSITY_WINDOW,
            agreement_threshold: defaults::DENSITY_AGREEMENT,
        }
    }
}

impl Default for AlphabetSection {
    fn default() -> Self {
        Self {
            labels: vec![
                defaults::DENSITY_LOW.to_string(),
                defaults::DENSITY_MEDIUM.to_string(),
                defaults::DENSITY_HIGH.to_string(),
            ],
            sentinel: None,
            separator: defaults::SEPARATOR_LABEL.to_string(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            frame_interval_ms: defaults::FRAME_INTERVAL_MS,
            assemble_sentence: false,
            speech_program: defaults::SPEECH_PROGRAM.to_string(),
        }
    }
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: None,
            quiescent_command: defaults::QUIESCENT_COMMAND.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - FRAMELOCK_PORT → serial.port
    /// - FRAMELOCK_FRAME_INTERVAL_MS → session.frame_interval_ms
    /// - FRAMELOCK_WINDOW_SIZE → stabilizer.window_size
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("FRAMELOCK_PORT")
            && !port.is_empty()
        {
            self.serial.port = Some(port);
        }

        if let Ok(interval) = std::env::var("FRAMELOCK_FRAME_INTERVAL_MS")
            && let Ok(ms) = interval.parse::<u64>()
        {
            self.session.frame_interval_ms = ms;
        }

        if let Ok(window) = std::env::var("FRAMELOCK_WINDOW_SIZE")
            && let Ok(size) = window.parse::<usize>()
        {
            self.stabilizer.window_size = size;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/framelock/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("framelock")
            .join("config.toml")
    }

    /// Preset matching the crowd-density detector: W=5, unanimity, L/M/H.
    pub fn density() -> Self {
        Self::default()
    }

    /// Preset matching the sign-language assistant: W=20, 0.8 agreement,
    /// fingerspelling alphabet with the "blank" sentinel, sentence assembly.
    pub fn sign() -> Self {
        let reference = Alphabet::sign_fingerspelling();
        Self {
            stabilizer: StabilizerSection {
                window_size: defaults::SIGN_WINDOW,
                agreement_threshold: defaults::SIGN_AGREEMENT,
            },
            alphabet: AlphabetSection {
                labels: reference
                    .labels()
                    .iter()
                    .map(|l| l.as_str().to_string())
                    .collect(),
                sentinel: Some(defaults::SENTINEL_LABEL.to_string()),
                separator: defaults::SEPARATOR_LABEL.to_string(),
            },
            session: SessionSection {
                assemble_sentence: true,
                ..Default::default()
            },
            serial: SerialSection::default(),
        }
    }

    /// Builds the stabilizer configuration from this config.
    pub fn stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            window_size: self.stabilizer.window_size,
            agreement_threshold: self.stabilizer.agreement_threshold,
        }
    }

    /// Builds and validates the alphabet from this config.
    pub fn build_alphabet(&self) -> crate::error::Result<Alphabet> {
        let labels = self.alphabet.labels.iter().map(Label::new).collect();
        let mut alphabet =
            Alphabet::new(labels)?.with_separator(Label::new(&self.alphabet.separator));
        if let Some(ref sentinel) = self.alphabet.sentinel {
            alphabet = alphabet.with_sentinel(Label::new(sentinel))?;
        }
        Ok(alphabet)
    }
}
