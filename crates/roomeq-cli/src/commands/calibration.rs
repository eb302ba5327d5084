//! Calibration and house curve inspection command.

use anyhow::Context;
use clap::Args;
use roomeq_analysis::gain_to_db;
use roomeq_measure::{Workspace, export_impulse_responses, import_calibration, import_house_curve};
use std::path::PathBuf;

/// Frequencies shown in the summary table
const REPORT_FREQUENCIES: [usize; 10] = [20, 50, 100, 200, 500, 1000, 2000, 5000, 10000, 20000];

#[derive(Args)]
pub struct CalibrationArgs {
    /// Text file with "frequency gain_db" lines
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Treat the file as a house (target) curve
    #[arg(long)]
    house: bool,

    /// Write the curve's impulse response to a WAV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

pub fn run(args: CalibrationArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let name = args
        .file
        .file_stem()
        .map_or_else(|| "curve".to_string(), |s| s.to_string_lossy().into_owned());

    let mut workspace = Workspace::new();
    let id = if args.house {
        import_house_curve(&mut workspace, &name, &text)?
    } else {
        import_calibration(&mut workspace, &name, &text)?
    };
    let Some(curve) = workspace.get(id) else {
        anyhow::bail!("imported curve missing from workspace");
    };

    println!("{} ({})", curve.name, curve.kind.label());
    println!("Frequency (Hz)  Gain (dB)");
    println!("--------------  ---------");
    let amplitude = curve.channels[0].amplitude();
    for hz in REPORT_FREQUENCIES {
        if let Some(&gain) = amplitude.get(hz) {
            println!("{hz:>14}  {:>9.2}", gain_to_db(gain));
        }
    }

    if let Some(path) = &args.export {
        export_impulse_responses(curve, path)?;
        println!("\nWrote {}", path.display());
    }

    Ok(())
}
