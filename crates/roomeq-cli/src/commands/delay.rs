//! Click-based delay estimation command.

use super::common::AudioArgs;
use clap::Args;
use roomeq_measure::DelayOptions;

#[derive(Args)]
pub struct DelayArgs {
    #[command(flatten)]
    audio: AudioArgs,

    /// Clicks per channel
    #[arg(short, long, default_value = "2")]
    rounds: usize,

    /// Channels to click (defaults to the configured output channels)
    #[arg(long)]
    channels: Option<usize>,

    /// Shortest expected delay in seconds
    #[arg(long, default_value = "0.0")]
    min_delay: f32,

    /// Longest expected delay in seconds
    #[arg(long, default_value = "0.5")]
    max_delay: f32,

    /// Spacing between clicks in seconds
    #[arg(long, default_value = "0.5")]
    spacing: f32,
}

pub async fn run(args: DelayArgs) -> anyhow::Result<()> {
    let settings = args.audio.settings()?;
    let options = DelayOptions {
        rounds: args.rounds,
        channels: args
            .channels
            .unwrap_or(usize::from(settings.audio.channels)),
        min_delay_seconds: args.min_delay,
        max_delay_seconds: args.max_delay,
        max_inter_channel_delay: args.spacing,
    };
    if options.rounds == 0 || options.channels == 0 {
        anyhow::bail!("need at least one round and one channel");
    }
    if options.max_delay_seconds < options.min_delay_seconds {
        anyhow::bail!("--max-delay must not be below --min-delay");
    }

    let session = args.audio.start_session(&settings).await?;
    let estimates = session.measure_delay(&options).await;
    session.stop();
    let estimates = estimates?;

    println!("Round  Channel  Delay (ms)  Confidence");
    println!("-----  -------  ----------  ----------");
    for e in &estimates {
        println!(
            "{:>5}  {:>7}  {:>10.2}  {:>10.3}",
            e.round,
            e.channel,
            e.delay_seconds * 1000.0,
            e.confidence
        );
    }

    let channels = options.channels;
    for channel in 0..channels {
        let delays: Vec<f32> = estimates
            .iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.delay_seconds)
            .collect();
        if !delays.is_empty() {
            let mean = delays.iter().sum::<f32>() / delays.len() as f32;
            println!("Channel {channel}: mean delay {:.2} ms", mean * 1000.0);
        }
    }

    Ok(())
}
