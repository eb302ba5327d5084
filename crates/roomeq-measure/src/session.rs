//! Live audio session: one duplex stream plus its scheduler.
//!
//! [`MeasurementSession`] owns everything between the orchestrator and the
//! device: the backend stream driving a [`SchedulerEngine`], the control
//! side [`Scheduler`], and the tokio task resolving completions. Dropping the
//! session stops the stream; commands still pending then fail with
//! [`roomeq_io::Error::Disconnected`].
//!
//! [`SchedulerEngine`]: roomeq_io::SchedulerEngine

use crate::error::{MeasureError, Result};
use roomeq_analysis::{Click, find_peaks};
use roomeq_io::Scheduler;
use roomeq_io::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use roomeq_io::scheduler::{self, DEFAULT_CAPACITY, Source};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often pending completions are resolved
const DISPATCH_PERIOD: Duration = Duration::from_millis(2);

/// Parameters of [`MeasurementSession::measure_delay`].
#[derive(Debug, Clone, PartialEq)]
pub struct DelayOptions {
    /// Number of times every channel clicks.
    pub rounds: usize,
    /// Output channels to click, starting at 0.
    pub channels: usize,
    /// Shortest delay expected; recording starts this late.
    pub min_delay_seconds: f32,
    /// Longest delay expected; recording runs this far past the last click.
    pub max_delay_seconds: f32,
    /// Spacing between consecutive clicks. Clicks decay within half of it.
    pub max_inter_channel_delay: f32,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            rounds: 2,
            channels: 2,
            min_delay_seconds: 0.0,
            max_delay_seconds: 0.5,
            max_inter_channel_delay: 0.5,
        }
    }
}

/// Delay found for one click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayEstimate {
    /// Round the click belongs to.
    pub round: usize,
    /// Output channel that played the click.
    pub channel: usize,
    /// Frame at which the click's peak left the output.
    pub expected_frame: usize,
    /// Frame at which the peak was found in the recording.
    pub peak_frame: usize,
    /// `(peak_frame - expected_frame) / sample_rate`.
    pub delay_seconds: f32,
    /// Absolute recorded value at the peak.
    pub confidence: f32,
}

/// Open duplex stream with a running scheduler.
pub struct MeasurementSession {
    scheduler: Scheduler,
    stream: Option<StreamHandle>,
    dispatcher: JoinHandle<()>,
    sample_rate: u32,
    output_channels: usize,
}

impl std::fmt::Debug for MeasurementSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementSession")
            .field("sample_rate", &self.sample_rate)
            .field("output_channels", &self.output_channels)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl MeasurementSession {
    /// Open a duplex stream on `backend` and wait `settle` before returning.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        backend: &dyn AudioBackend,
        config: &BackendStreamConfig,
        settle: Duration,
    ) -> Result<Self> {
        let (scheduler, mut engine) = scheduler::channel(DEFAULT_CAPACITY, config);
        let stream = backend.build_duplex_stream(
            config,
            Box::new(move |input, output| engine.process_block(input, output)),
            Box::new(|err| tracing::warn!(error = err, "audio stream error")),
        )?;
        let dispatcher = scheduler.spawn_dispatcher(DISPATCH_PERIOD);
        let sample_rate = backend.actual_sample_rate(config);

        tracing::info!(
            backend = backend.name(),
            sample_rate,
            channels = config.channels,
            settle_ms = settle.as_millis() as u64,
            "measurement session started"
        );
        tokio::time::sleep(settle).await;

        Ok(Self {
            scheduler,
            stream: Some(stream),
            dispatcher,
            sample_rate,
            output_channels: usize::from(config.channels),
        })
    }

    /// Stop the stream. Pending commands fail with `Disconnected`.
    pub fn stop(mut self) {
        self.shutdown();
        tracing::info!("measurement session stopped");
    }

    fn shutdown(&mut self) {
        if self.stream.take().is_some() {
            self.scheduler.dispatch();
            self.dispatcher.abort();
        }
    }

    /// Stream sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of output channels
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Scheduler feeding the stream
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn frames(&self, seconds: f32) -> i64 {
        (f64::from(seconds) * f64::from(self.sample_rate)).round() as i64
    }

    /// Play `count` clicks on every output channel, `spacing_seconds` apart,
    /// and wait until they have finished.
    pub async fn play_clicks(&self, count: usize, spacing_seconds: f32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let click: Arc<[f32]> = Click::new(self.sample_rate as f32).generate().into();
        let spacing = self.frames(spacing_seconds);

        let mut batch = self.scheduler.batch();
        for i in 0..count {
            let sources = vec![Some(Arc::clone(&click)); self.output_channels];
            batch.play(sources, i as i64 * spacing);
        }
        tracing::debug!(count, spacing, "playing alignment clicks");
        batch.submit()?.wait().await?;
        Ok(())
    }

    /// Play `sources` (one per output channel) and record input channel 0
    /// for as long as the longest source.
    ///
    /// A positive `delay_seconds` starts the recording that much after the
    /// playback; a negative one starts the playback after the recording.
    pub async fn play_and_record(&self, sources: Vec<Source>, delay_seconds: f32) -> Result<Vec<f32>> {
        let length = sources
            .iter()
            .map(|s| s.as_ref().map_or(0, |s| s.len()))
            .max()
            .unwrap_or(0);
        let delay = self.frames(delay_seconds);

        let mut batch = self.scheduler.batch();
        batch.play(sources, (-delay).max(0));
        let recording = batch.record(0, length, delay.max(0));
        batch.submit()?;

        tracing::debug!(frames = length, delay, "play and record");
        Ok(recording.await?)
    }

    /// Estimate the output-to-input delay of each channel with clicks.
    ///
    /// Every channel clicks once per round, `max_inter_channel_delay` apart,
    /// while input channel 0 records. The loudest peaks of the recording,
    /// in time order, are paired with the clicks in round and channel order.
    pub async fn measure_delay(&self, options: &DelayOptions) -> Result<Vec<DelayEstimate>> {
        if options.channels > self.output_channels {
            return Err(MeasureError::invalid_setting(
                "channels",
                format!(
                    "{} requested but the stream has {} output channels",
                    options.channels, self.output_channels
                ),
            ));
        }
        let spacing = self.frames(options.max_inter_channel_delay).max(1);
        let min_delay = self.frames(options.min_delay_seconds).max(0);
        let max_delay = self.frames(options.max_delay_seconds).max(min_delay);

        let click_len = (spacing / 2).max(1);
        let click = Click::new(self.sample_rate as f32)
            .with_decay(click_len as f32 / self.sample_rate as f32)
            .generate();
        let click_peak = click
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &x)| if x.abs() > best.1 { (i, x.abs()) } else { best })
            .0;
        let click: Arc<[f32]> = click.into();

        let mut clicks = Vec::with_capacity(options.rounds * options.channels);
        let mut batch = self.scheduler.batch();
        let mut time = 0i64;
        for round in 0..options.rounds {
            for channel in 0..options.channels {
                let mut sources: Vec<Source> = vec![None; channel + 1];
                sources[channel] = Some(Arc::clone(&click));
                batch.play(sources, time);
                clicks.push((round, channel, time as usize + click_peak));
                time += spacing;
            }
        }
        let length = (time + max_delay - min_delay).max(0) as usize;
        let recording = batch.record(0, length, min_delay);
        batch.submit()?;
        let recording = recording.await?;

        let peaks = find_peaks(clicks.len(), &recording);
        let estimates: Vec<DelayEstimate> = clicks
            .iter()
            .zip(&peaks)
            .map(|(&(round, channel, expected_frame), &peak)| {
                let peak_frame = peak + min_delay as usize;
                let delay_seconds =
                    (peak_frame as f64 - expected_frame as f64) / f64::from(self.sample_rate);
                DelayEstimate {
                    round,
                    channel,
                    expected_frame,
                    peak_frame,
                    delay_seconds: delay_seconds as f32,
                    confidence: recording[peak].abs(),
                }
            })
            .collect();

        for estimate in &estimates {
            tracing::info!(
                round = estimate.round,
                channel = estimate.channel,
                delay_ms = estimate.delay_seconds * 1000.0,
                confidence = estimate.confidence,
                "click delay"
            );
        }
        Ok(estimates)
    }
}

impl Drop for MeasurementSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
