//! roomeq CLI - acoustic measurement and room correction from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomeq")]
#[command(author, version, about = "Room measurement and correction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture sweep measurements and optionally design a correction filter
    Measure(commands::measure::MeasureArgs),

    /// Estimate output-to-input delay per channel with clicks
    Delay(commands::delay::DelayArgs),

    /// Design a correction filter from an impulse response WAV file
    Correct(commands::correct::CorrectArgs),

    /// Inspect a microphone calibration or house curve file
    Calibration(commands::calibration::CalibrationArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Show or create the settings file
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => commands::measure::run(args).await,
        Commands::Delay(args) => commands::delay::run(args).await,
        Commands::Correct(args) => commands::correct::run(args),
        Commands::Calibration(args) => commands::calibration::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
