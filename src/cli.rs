//! Command-line interface for wavepeaks
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Streaming waveform peak extraction for raw PCM audio
#[derive(Parser, Debug)]
#[command(
    name = "wavepeaks",
    version,
    about = "Streaming waveform peak extraction for raw PCM audio"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract peaks from a raw s16le PCM file
    Extract {
        /// Raw PCM input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Interleaved channel count (default: from config)
        #[arg(long, short = 'c', value_name = "N")]
        channels: Option<usize>,

        /// Number of buckets (default: from config)
        #[arg(long, short = 'n', value_name = "N")]
        count: Option<usize>,

        /// Decimation step inside each bucket (default: from config)
        #[arg(long, short = 's', value_name = "N")]
        step: Option<usize>,

        /// Merge channels even when the input has several
        #[arg(long)]
        merged: bool,

        /// Read size in bytes (default: from config)
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,

        /// Write the peaks JSON here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the transcoder request for a peaks intermediary
    Intermediary {
        /// Quality factor, clamped to 0.1..=1.0 (default: from config)
        #[arg(long, value_name = "Q")]
        quality: Option<f64>,

        /// Print transcoder arguments instead of JSON
        #[arg(long)]
        args: bool,
    },

    /// Add the peaks intermediary output to a job file
    Prep {
        /// Job JSON file
        #[arg(value_name = "JOB")]
        job: PathBuf,

        /// Write the updated job here (default: overwrite JOB)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compute peaks from a job's intermediary and store them in the job
    Attach {
        /// Job JSON file
        #[arg(value_name = "JOB")]
        job: PathBuf,

        /// Write the updated job here (default: overwrite JOB)
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
