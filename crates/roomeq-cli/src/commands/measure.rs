//! Live sweep measurement command.

use super::common::{AudioArgs, print_measurement, spinner, wav_file_name};
use anyhow::Context;
use clap::Args;
use roomeq_measure::{Workspace, capture, export_impulse_responses, generate_correction};
use std::path::PathBuf;

#[derive(Args)]
pub struct MeasureArgs {
    #[command(flatten)]
    audio: AudioArgs,

    /// Number of capture rounds (averaged when more than one)
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Directory for the impulse response WAV files
    #[arg(short, long, default_value = "measurements")]
    output: PathBuf,

    /// Also design a correction filter for the result
    #[arg(long)]
    correct: bool,
}

pub async fn run(args: MeasureArgs) -> anyhow::Result<()> {
    let mut settings = args.audio.settings()?;
    if let Some(rounds) = args.rounds {
        settings.num_measurements = rounds;
        settings.validate()?;
    }

    println!(
        "Measuring {} round(s): {:.0}-{:.0} Hz sweep, {:.2}s, {} Hz",
        settings.num_measurements,
        settings.sweep.start_frequency_hz,
        settings.sweep.end_frequency_hz,
        settings.sweep.duration_seconds,
        settings.audio.sample_rate
    );

    let session = args.audio.start_session(&settings).await?;
    let pb = spinner("Capturing...");
    let mut workspace = Workspace::new();
    let captured = capture(&mut workspace, &session, &settings).await;
    pb.finish_and_clear();
    session.stop();
    captured?;

    if args.correct {
        generate_correction(&mut workspace, &settings.correction)?;
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    println!("\nMeasurements:");
    for measurement in workspace.iter() {
        print_measurement(measurement);
        let path = args.output.join(wav_file_name(measurement));
        export_impulse_responses(measurement, &path)?;
    }
    println!("\nWrote {} file(s) to {}", workspace.len(), args.output.display());

    Ok(())
}
