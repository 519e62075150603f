//! Command-line interface for framelock
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Temporal stabilization for noisy frame-classifier streams
#[derive(Parser, Debug)]
#[command(
    name = "framelock",
    version,
    about = "Temporal stabilization for noisy frame-classifier streams"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: agreement bar + transitions)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Stabilization preset
    #[arg(long, value_enum, default_value_t = Mode::Density)]
    pub mode: Mode,

    /// Sliding window size in frames
    #[arg(long, short = 'w', value_name = "FRAMES")]
    pub window: Option<usize>,

    /// Agreement threshold in (0,1]
    #[arg(long, short = 't', value_name = "RATIO")]
    pub threshold: Option<f64>,

    /// Delay between frames. Examples: 33ms, 50ms, 1s
    #[arg(long, value_name = "DURATION", value_parser = parse_frame_interval)]
    pub frame_interval: Option<Duration>,

    /// Serial device to drive with command bytes (e.g., /dev/ttyUSB0)
    #[arg(long, value_name = "DEVICE")]
    pub port: Option<String>,

    /// Speak committed labels aloud via the configured TTS program
    #[arg(long)]
    pub speak: bool,
}

/// Built-in stabilization presets.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Crowd-density commands: unanimity over 5 frames, L/M/H
    Density,
    /// Sign fingerspelling: 80% agreement over 20 frames, sentence assembly
    Sign,
}

/// Parse a frame interval string into a duration.
///
/// Supports any format accepted by `humantime`: bare numbers
/// (milliseconds), single-unit (`33ms`, `1s`), and compound (`1s500ms`).
fn parse_frame_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["framelock"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.mode, Mode::Density);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.port.is_none());
        assert!(!cli.speak);
    }

    #[test]
    fn test_parse_sign_mode() {
        let cli = Cli::try_parse_from(["framelock", "--mode", "sign"]).unwrap();
        assert_eq!(cli.mode, Mode::Sign);
    }

    #[test]
    fn test_parse_tuning_overrides() {
        let cli = Cli::try_parse_from([
            "framelock",
            "--window",
            "10",
            "--threshold",
            "0.9",
            "--frame-interval",
            "50ms",
        ])
        .unwrap();
        assert_eq!(cli.window, Some(10));
        assert_eq!(cli.threshold, Some(0.9));
        assert_eq!(cli.frame_interval, Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_frame_interval_bare_number_is_millis() {
        assert_eq!(parse_frame_interval("33"), Ok(Duration::from_millis(33)));
        assert_eq!(parse_frame_interval("1s"), Ok(Duration::from_secs(1)));
        assert!(parse_frame_interval("soon").is_err());
    }

    #[test]
    fn test_parse_port_and_speak() {
        let cli =
            Cli::try_parse_from(["framelock", "--port", "/dev/ttyUSB0", "--speak"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
        assert!(cli.speak);
    }

    #[test]
    fn test_parse_config_subcommands() {
        let cli = Cli::try_parse_from(["framelock", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));

        let cli = Cli::try_parse_from(["framelock", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["framelock", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let cli = Cli::try_parse_from(["framelock", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["framelock", "--mode", "bogus"]).is_err());
    }
}
