//! readaloud - speech scheduling for a screen reader
//!
//! CLI entry point for inspecting segmentation and URLs and for running the
//! scheduler against the simulated audio device.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use readaloud::browse::BrowseMode;
use readaloud::cli::{Cli, Command, OutputFormat};
use readaloud::config::Config;
use readaloud::domain::Utterance;
use readaloud::engine::simulated::simulated_engines;
use readaloud::events::{SpeechBus, SpeechEvent};
use readaloud::scheduler::{
    KeyAction, ParagraphCursor, PendingActions, Scheduler, Speech, SpeechRunner, echo_keycodes, key_name,
};
use readaloud::text::Segmenter;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readaloud")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to the log file; stdout belongs to command output
    let level: tracing::Level = level.parse().map_err(|_| eyre::eyre!("Invalid log level: {}", level))?;
    let log_file = fs::File::create(log_dir.join("readaloud.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    setup_logging(&level).context("Failed to setup logging")?;

    match cli.command {
        Command::Segment { text, format } => cmd_segment(&config, &text, format),
        Command::Url { text } => cmd_url(&config, &text),
        Command::Speak {
            texts,
            embed,
            mode,
            fail_streaming,
            timeout_secs,
            format,
        } => {
            let options = SpeakOptions {
                embed: embed || config.engine.embed,
                mode,
                fail_streaming,
                timeout: Duration::from_secs(timeout_secs),
                format,
            };
            cmd_speak(&config, texts, options).await
        }
        Command::Keys => cmd_keys(),
    }
}

fn utterances(config: &Config, text: &str) -> Vec<Utterance> {
    Segmenter::new(config.scheduler.split_by_boundaries)
        .segment(text)
        .into_iter()
        .map(Utterance::new)
        .collect()
}

fn cmd_segment(config: &Config, text: &str, format: OutputFormat) -> Result<()> {
    let utterances = utterances(config, text);
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = utterances
                .iter()
                .map(|u| {
                    serde_json::json!({
                        "id": u.id,
                        "text": u.raw_text,
                        "normalized": u.normalized_text,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            for u in &utterances {
                println!("{}  {}  {}", u.id.to_string().dimmed(), u.normalized_text.bold(), u.raw_text);
            }
        }
    }
    Ok(())
}

fn cmd_url(config: &Config, text: &str) -> Result<()> {
    let resolver = config.audio.url_resolver();
    for u in utterances(config, text) {
        println!("{}", resolver.resolve(&u.normalized_text));
    }
    Ok(())
}

fn cmd_keys() -> Result<()> {
    for code in echo_keycodes() {
        if let Some(name) = key_name(code) {
            println!("{:>3}  {:?}", code, name);
        }
    }
    Ok(())
}

struct SpeakOptions {
    embed: bool,
    mode: BrowseMode,
    fail_streaming: bool,
    timeout: Duration,
    format: OutputFormat,
}

async fn cmd_speak(config: &Config, texts: Vec<String>, options: SpeakOptions) -> Result<()> {
    let mut simulator = config.simulator.clone();
    simulator.fail_streaming_init |= options.fail_streaming;
    let engines = simulated_engines(&simulator, options.embed);

    let bus = SpeechBus::with_default_capacity();
    let mut events = bus.subscribe();
    let mut speech = Speech::new(
        &config.scheduler,
        engines,
        config.audio.url_resolver(),
        config.audio.volume(),
        bus.emitter(),
    );
    speech.set_mode(options.mode);

    // Without an auto-advancing mode the texts arrive as key actions
    let keyboard = options.mode.direction().is_none();
    let nodes = if keyboard { Vec::new() } else { texts.clone() };
    let scheduler = Scheduler::new(speech, Box::new(ParagraphCursor::new(nodes)), Box::new(PendingActions::new()));
    let (task, handle) = SpeechRunner::spawn(scheduler, &config.scheduler);
    if keyboard {
        for text in texts {
            handle.action(KeyAction::Speak(text)).await?;
        }
    }

    let mut seen = Vec::new();
    let deadline = tokio::time::sleep(options.timeout);
    tokio::pin!(deadline);
    let mut poll = tokio::time::interval(config.scheduler.tick_interval());
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if options.format == OutputFormat::Text {
                        print_event(&event);
                    }
                    seen.push(event);
                }
                Err(RecvError::Lagged(n)) => warn!(n, "Event output lagged"),
                Err(RecvError::Closed) => break,
            },

            _ = poll.tick() => {
                if handle.status().await?.is_idle() {
                    break;
                }
            }

            _ = &mut deadline => {
                warn!(timeout_secs = options.timeout.as_secs(), "Speech did not finish in time");
                eprintln!("{}", "timed out before speech finished".yellow());
                break;
            }
        }
    }

    handle.shutdown().await?;
    let scheduler = task.await.context("Speech runner failed")?;
    let speech = scheduler.speech();
    let timing = speech.timing();

    match options.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "engine": speech.engine().kind(),
                "events": seen,
                "timing": timing.export_json(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!();
            println!("{} {}", "engine:".bold(), speech.engine().kind());
            println!("{} {}", "sounds played:".bold(), timing.stats().sounds_played);
            println!("{} {}", "timing:".bold(), timing.report());
        }
    }
    Ok(())
}

fn print_event(event: &SpeechEvent) {
    match event {
        SpeechEvent::NowPlaying { text: Some(text), .. } => println!("{} {}", ">".green().bold(), text),
        SpeechEvent::NowPlaying { .. } => {}
        SpeechEvent::EngineFallback { .. } => println!("{}", event.to_string().yellow()),
        _ => println!("{}", event.to_string().dimmed()),
    }
}
