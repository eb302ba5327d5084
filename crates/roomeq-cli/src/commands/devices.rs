//! Audio device listing command.

use clap::Args;
use roomeq_io::backend::{AudioBackend, CpalBackend, LoopbackBackend};

#[derive(Args)]
pub struct DevicesArgs {
    /// List the built-in loopback instead of sound cards
    #[arg(long)]
    loopback: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend: Box<dyn AudioBackend> = if args.loopback {
        Box::new(LoopbackBackend::new())
    } else {
        Box::new(CpalBackend::new())
    };

    let devices = backend.list_devices()?;
    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Audio Devices ({})", backend.name());
    println!("=============\n");

    let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
    if !inputs.is_empty() {
        println!("Input Devices:");
        for (idx, device) in inputs.iter().enumerate() {
            let also_output = if device.is_output { " (also output)" } else { "" };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also_output
            );
        }
        println!();
    }

    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
    if !outputs.is_empty() {
        println!("Output Devices:");
        for (idx, device) in outputs.iter().enumerate() {
            let also_input = if device.is_input { " (also input)" } else { "" };
            println!(
                "  [{}] {} ({} Hz){}",
                idx, device.name, device.default_sample_rate, also_input
            );
        }
        println!();
    }

    let default_in = backend.default_input_device()?.map(|d| d.name);
    let default_out = backend.default_output_device()?.map(|d| d.name);
    println!(
        "Default input: {}",
        default_in.as_deref().unwrap_or("None")
    );
    println!(
        "Default output: {}",
        default_out.as_deref().unwrap_or("None")
    );
    println!();
    println!("Tip: pass a partial name with --input/--output:");
    println!("  roomeq measure --input \"USB\" --output \"USB\"");

    Ok(())
}
