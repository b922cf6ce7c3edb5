use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wavepeaks::cli::{Cli, Commands, ConfigAction};
use wavepeaks::config::Config;
use wavepeaks::pipeline::Job;
use wavepeaks::{get_peaks, peaks_intermediary, version_string};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    debug!(version = %version_string(), "wavepeaks starting");

    match cli.command {
        Commands::Extract {
            input,
            channels,
            count,
            step,
            merged,
            chunk_size,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut peak_config = config.peaks.to_peak_config();
            if let Some(channels) = channels {
                peak_config = peak_config.with_channels(channels);
            }
            if let Some(count) = count {
                peak_config = peak_config.with_count(count);
            }
            if let Some(step) = step {
                peak_config = peak_config.with_step(step);
            }
            if merged {
                peak_config = peak_config.with_split(false);
            }
            let chunk_size = chunk_size.unwrap_or(config.stream.chunk_size);

            let peaks = get_peaks(&input, &peak_config, chunk_size, output.as_deref()).await?;
            info!(
                input = %input.display(),
                buckets = peaks.bucket_count(),
                channels = peaks.channel_count(),
                "peaks extracted"
            );
            if output.is_none() {
                println!("{}", peaks.to_json()?);
            }
        }
        Commands::Intermediary { quality, args } => {
            let config = load_config(cli.config.as_deref())?;
            let request = peaks_intermediary(quality.unwrap_or(config.peaks.quality));
            if args {
                println!("{}", request.ffmpeg_args().join(" "));
            } else {
                println!("{}", request.to_json()?);
            }
        }
        Commands::Prep { job, output } => {
            let config = load_config(cli.config.as_deref())?;
            let mut parsed = read_job(&job).await?;
            let request = parsed.prep_for_peaks_with(config.peaks.quality)?;
            debug!(sample_rate = request.sample_rate, "intermediary requested");
            write_job(output.as_deref().unwrap_or(&job), &parsed).await?;
        }
        Commands::Attach { job, output } => {
            let config = load_config(cli.config.as_deref())?;
            let mut parsed = read_job(&job).await?;
            parsed
                .attach_peaks(&config.peaks.to_peak_config(), config.stream.chunk_size)
                .await?;
            write_job(output.as_deref().unwrap_or(&job), &parsed).await?;
        }
        Commands::Config { action } => handle_config_command(action, cli.config.as_deref())?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "wavepeaks",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the CLI flags.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/wavepeaks/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn config_path(custom_path: Option<&Path>) -> Option<PathBuf> {
    custom_path.map(Path::to_path_buf).or_else(Config::default_path)
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::Path => match config_path(custom_path) {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("no configuration directory on this platform"),
        },
    }
    Ok(())
}

async fn read_job(path: &Path) -> Result<Job> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading job {}", path.display()))?;
    Job::from_json(&contents).with_context(|| format!("parsing job {}", path.display()))
}

async fn write_job(path: &Path, job: &Job) -> Result<()> {
    let json = job.to_json()?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing job {}", path.display()))
}
