//! Shared helpers for CLI commands.

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use roomeq_io::backend::{AudioBackend, CpalBackend, LoopbackBackend};
use roomeq_measure::{Measurement, MeasurementSession, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audio device selection shared by the live commands.
#[derive(Args, Debug, Clone)]
pub struct AudioArgs {
    /// Settings file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the built-in loopback instead of a sound card
    #[arg(long)]
    pub loopback: bool,

    /// Input device (partial name match)
    #[arg(long)]
    pub input: Option<String>,

    /// Output device (partial name match)
    #[arg(long)]
    pub output: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,
}

impl AudioArgs {
    /// Settings with the command line overrides applied.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(input) = &self.input {
            settings.audio.input_device = Some(input.clone());
        }
        if let Some(output) = &self.output {
            settings.audio.output_device = Some(output.clone());
        }
        if let Some(rate) = self.sample_rate {
            settings.audio.sample_rate = rate;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Backend selected by `--loopback`.
    ///
    /// The loopback's latency equals the capture pre-delay, so captures
    /// deconvolve to an impulse at time zero.
    pub fn backend(&self, settings: &Settings) -> Box<dyn AudioBackend> {
        if self.loopback {
            let latency = (settings.capture.pre_delay_seconds * settings.audio.sample_rate as f32)
                .round() as usize;
            Box::new(LoopbackBackend::new().with_gain(0.5).with_latency(latency))
        } else {
            Box::new(CpalBackend::new())
        }
    }

    /// Open a measurement session, showing a spinner while the stream
    /// settles.
    pub async fn start_session(&self, settings: &Settings) -> anyhow::Result<MeasurementSession> {
        let backend = self.backend(settings);
        let spinner = spinner("Opening audio stream...");
        let session = MeasurementSession::start(
            backend.as_ref(),
            &settings.audio.to_stream_config(),
            Duration::from_millis(settings.capture.settle_ms),
        )
        .await
        .with_context(|| format!("failed to start {} audio stream", backend.name()))?;
        spinner.finish_and_clear();
        Ok(session)
    }
}

/// Load settings from `path`, or from the default location if present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default()?,
    };
    Ok(settings)
}

/// Spinner that ticks on its own until finished.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// File name for a measurement: its name with anything but letters,
/// digits, `-`, `_` and `.` replaced by `_`, plus `.wav`.
pub fn wav_file_name(measurement: &Measurement) -> String {
    let stem: String = measurement
        .name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.wav")
}

/// Print a one-line summary of a measurement.
pub fn print_measurement(measurement: &Measurement) {
    let ir_len = measurement
        .channels
        .first()
        .map_or(0, |c| c.impulse_response().len());
    println!(
        "  {} {:<32} {:>10} {} ch, {} Hz, {} samples",
        measurement.id,
        measurement.name,
        measurement.kind.label(),
        measurement.channel_count(),
        measurement.sample_rate,
        ir_len
    );
}
