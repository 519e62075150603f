use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use framelock::alphabet::Label;
use framelock::cli::{Cli, Commands, ConfigAction, Mode};
use framelock::config::Config;
use framelock::observer::ReaderObservationSource;
use framelock::pipeline::{
    ActionDispatcher, CommandSpeechEngine, IoPortWriter, Pipeline, PipelineConfig,
    SerialCommandDispatcher, SpeechDispatcher, StdoutDispatcher,
};
use std::fs::OpenOptions;
use std::io::{BufReader, IsTerminal};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run_session(cli)?,
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "framelock",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Resolve the effective configuration.
///
/// A config file (explicit or at the default path) is the base; without one
/// the `--mode` preset applies. Environment variables and CLI flags override
/// either.
fn resolve_config(cli: &Cli) -> Config {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);

    let base = if path.exists() {
        Config::load_or_default(&path)
    } else {
        match cli.mode {
            Mode::Density => Config::density(),
            Mode::Sign => Config::sign(),
        }
    };

    let mut config = base.with_env_overrides();
    if let Some(window) = cli.window {
        config.stabilizer.window_size = window;
    }
    if let Some(threshold) = cli.threshold {
        config.stabilizer.agreement_threshold = threshold;
    }
    if let Some(interval) = cli.frame_interval {
        config.session.frame_interval_ms = interval.as_millis() as u64;
    }
    if let Some(ref port) = cli.port {
        config.serial.port = Some(port.clone());
    }
    config
}

/// Run a stabilization session over labels read from stdin.
fn run_session(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli);
    let alphabet = config.build_alphabet()?;

    let pipeline_config = PipelineConfig {
        stabilizer: config.stabilizer_config(),
        alphabet: alphabet.clone(),
        assemble_sentence: config.session.assemble_sentence,
        frame_interval: Duration::from_millis(config.session.frame_interval_ms),
        verbosity: cli.verbose,
        quiet: cli.quiet,
        ..PipelineConfig::density()
    };

    let dispatcher: Box<dyn ActionDispatcher> = if let Some(ref port) = config.serial.port {
        let device = OpenOptions::new()
            .write(true)
            .open(port)
            .with_context(|| format!("failed to open serial device {port}"))?;
        Box::new(SerialCommandDispatcher::new(
            IoPortWriter::new(device),
            Label::new(&config.serial.quiescent_command),
        ))
    } else if cli.speak {
        let mut speech =
            SpeechDispatcher::new(CommandSpeechEngine::new(&config.session.speech_program));
        if let Some(sentinel) = alphabet.sentinel() {
            speech = speech.with_sentinel(sentinel.clone());
        }
        Box::new(speech)
    } else {
        Box::new(StdoutDispatcher)
    };

    if std::io::stdin().is_terminal() && !cli.quiet {
        eprintln!("Reading labels from stdin (one per whitespace-separated token).");
        eprintln!("Pipe classifier output in, or type labels and finish with Ctrl-D.");
    }

    let source = Box::new(ReaderObservationSource::new(BufReader::new(
        std::io::stdin(),
    )));

    let handle = Pipeline::new(pipeline_config).start(source, dispatcher)?;

    // The stdin source is finite; the session ends itself at EOF.
    while handle.is_running() {
        thread::sleep(Duration::from_millis(50));
    }

    if let Some(sentence) = handle.stop() {
        println!("{sentence}");
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    let path: PathBuf = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&path).with_env_overrides();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}
