//! Offline correction filter design from an impulse response file.

use super::common::{load_settings, print_measurement};
use clap::Args;
use roomeq_io::read_wav_channels;
use roomeq_measure::{
    Workspace, export_impulse_responses, generate_correction, import_impulse_responses, smooth,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct CorrectArgs {
    /// Impulse response WAV file, one channel per loudspeaker
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output WAV file for the correction filter
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Also write the corrected impulse response
    #[arg(long, value_name = "FILE")]
    corrected: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Filter length in taps
    #[arg(short, long)]
    length: Option<usize>,

    /// Design a minimum-phase filter instead of linear phase
    #[arg(long)]
    minimum_phase: bool,

    /// Smooth before designing, 1/N octave (e.g. 6 for 1/6 octave)
    #[arg(long, value_name = "N")]
    smooth: Option<f32>,
}

pub fn run(args: CorrectArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(length) = args.length {
        settings.correction.filter_length = length;
    }
    if args.minimum_phase {
        settings.correction.linear_phase = false;
    }
    settings.validate()?;

    println!("Reading {}...", args.input.display());
    let (channels, sample_rate) = read_wav_channels(&args.input)?;
    let name = args
        .input
        .file_stem()
        .map_or_else(|| "input".to_string(), |s| s.to_string_lossy().into_owned());

    let mut workspace = Workspace::new();
    import_impulse_responses(&mut workspace, &name, sample_rate, channels)?;

    if let Some(n) = args.smooth {
        if n <= 0.0 {
            anyhow::bail!("--smooth must be positive");
        }
        smooth(&mut workspace, 1.0 / n, settings.smoothing.log_domain)?;
    }

    let (filter, corrected) = generate_correction(&mut workspace, &settings.correction)?;

    println!("\nMeasurements:");
    for measurement in workspace.iter() {
        print_measurement(measurement);
    }

    if let Some(filter) = workspace.get(filter) {
        export_impulse_responses(filter, &args.output)?;
        println!(
            "\nWrote {}-tap {} filter to {}",
            settings.correction.filter_length,
            if settings.correction.linear_phase {
                "linear-phase"
            } else {
                "minimum-phase"
            },
            args.output.display()
        );
    }
    if let (Some(path), Some(corrected)) = (&args.corrected, workspace.get(corrected)) {
        export_impulse_responses(corrected, path)?;
        println!("Wrote corrected response to {}", path.display());
    }

    Ok(())
}
