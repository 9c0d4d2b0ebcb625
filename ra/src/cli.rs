//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::browse::BrowseMode;

/// readaloud - speech scheduling for a screen reader
#[derive(Parser)]
#[command(
    name = "ra",
    about = "Segment, resolve and schedule speech the way the screen reader does",
    version,
    after_help = "Logs are written to: ~/.local/share/readaloud/logs/readaloud.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Split text into utterances and show their identities
    Segment {
        text: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the audio URL for each utterance of the text
    Url { text: String },

    /// Read document nodes aloud on the simulated device
    Speak {
        /// One document node per argument
        #[arg(required = true)]
        texts: Vec<String>,

        /// Use the embedded player instead of the streaming one
        #[arg(long)]
        embed: bool,

        /// Browse mode to read in; keyboard-driven speaks each text as a key action
        #[arg(short, long, default_value = "continuous-read")]
        mode: BrowseMode,

        /// Make the streaming engine fail to start
        #[arg(long)]
        fail_streaming: bool,

        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the key echo names that get prefetched
    Keys,
}

/// Output format for command results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readaloud")
        .join("logs")
        .join("readaloud.log")
}
