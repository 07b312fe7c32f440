//! Slidereel CLI: command-line interface for building slideshow videos.
//!
//! Usage:
//!   slidereel render <PIPELINE> -o <OUT>   Render a video from pipeline data
//!   slidereel plan <PIPELINE>              Print the encoder invocation
//!   slidereel probe <AUDIO>                Show an audio file's duration
//!   slidereel check                        Check encoder availability
//!   slidereel config [--init]              Show or write the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::VideoOverrides;

#[derive(Parser)]
#[command(
    name = "slidereel",
    about = "Compose still images, narration and text overlays into MP4 videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/slidereel/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a video from pipeline data
    Render {
        /// Pipeline data JSON (step outputs and context)
        pipeline: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: VideoOverrides,
    },

    /// Print the encoder invocation without running it
    Plan {
        /// Pipeline data JSON (step outputs and context)
        pipeline: PathBuf,

        /// Audio duration in seconds; probed with ffprobe when omitted
        #[arg(long)]
        audio_duration: Option<f64>,

        /// Output file path used in the printed arguments
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,

        #[command(flatten)]
        overrides: VideoOverrides,
    },

    /// Print the duration of an audio file
    Probe {
        /// Audio file
        audio: PathBuf,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,

    /// Show the effective configuration
    Config {
        /// Write it to the config file so it can be edited
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(slidereel_common::config::config_file_path);
    let mut config = slidereel_common::config::EngineConfig::load_from(&config_path);

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    slidereel_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            pipeline,
            output,
            overrides,
        } => {
            overrides.apply(&mut config.video);
            commands::render::run(pipeline, output, config).await
        }
        Commands::Plan {
            pipeline,
            audio_duration,
            output,
            overrides,
        } => {
            overrides.apply(&mut config.video);
            commands::plan::run(pipeline, audio_duration, output, config).await
        }
        Commands::Probe { audio } => commands::probe::run(audio, config).await,
        Commands::Check => commands::check::run(config).await,
        Commands::Config { init } => commands::config::run(config, config_path, init),
    }
}
