//! Deterministic loopback backend.
//!
//! Drives the duplex callback from a plain thread at the block cadence of
//! the stream configuration and feeds the output back as input: every input
//! channel receives the sum of all output channels, scaled by `gain` and
//! delayed by `latency_frames`. Used for tests and for exercising the
//! measurement workflow without hardware.

use super::{
    AudioBackend, AudioDevice, BackendStreamConfig, DuplexCallback, ErrorCallback, StreamHandle,
};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const DEVICE_NAME: &str = "Loopback";

/// Backend that routes its output straight back to its input.
#[derive(Debug, Clone)]
pub struct LoopbackBackend {
    gain: f32,
    latency_frames: usize,
    speed: f32,
}

impl LoopbackBackend {
    /// Unity gain, one block of latency, real-time pacing.
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            latency_frames: 0,
            speed: 1.0,
        }
    }

    /// Scale the looped-back signal
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Delay between output and input in frames.
    ///
    /// The effective latency is never less than one block, since a block's
    /// input is captured before its output is rendered.
    pub fn with_latency(mut self, latency_frames: usize) -> Self {
        self.latency_frames = latency_frames;
        self
    }

    /// Run `speed` times faster than real time
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Effective loop latency in frames for `config`
    pub fn effective_latency(&self, config: &BackendStreamConfig) -> usize {
        self.latency_frames.max(config.buffer_size as usize)
    }

    fn device(config_rate: u32) -> AudioDevice {
        AudioDevice {
            name: DEVICE_NAME.to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: config_rate,
        }
    }
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Running loopback thread; stops and joins on drop.
struct LoopbackStream {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for LoopbackStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl AudioBackend for LoopbackBackend {
    fn name(&self) -> &'static str {
        "loopback"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![Self::device(48000)])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device(48000)))
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device(48000)))
    }

    fn build_duplex_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: DuplexCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if config.buffer_size == 0 || config.sample_rate == 0 || config.channels == 0 {
            return Err(Error::Stream(format!(
                "unusable loopback configuration: {config:?}"
            )));
        }

        let frames = config.buffer_size as usize;
        let out_channels = usize::from(config.channels);
        let in_channels = usize::from(config.input_channels);
        let latency = self.effective_latency(config);
        let gain = self.gain;
        let period = Duration::from_secs_f64(
            frames as f64 / f64::from(config.sample_rate) / f64::from(self.speed.max(1e-3)),
        );

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let thread = std::thread::Builder::new()
            .name("roomeq-loopback".into())
            .spawn(move || {
                let mut delay: VecDeque<f32> = std::iter::repeat_n(0.0, latency).collect();
                let mut input = vec![0.0; frames * in_channels];
                let mut output = vec![0.0; frames * out_channels];
                let mut next = Instant::now();

                while flag.load(Ordering::Acquire) {
                    for frame in 0..frames {
                        let value = delay.pop_front().unwrap_or(0.0);
                        for ch in 0..in_channels {
                            input[frame * in_channels + ch] = value;
                        }
                    }

                    callback(&input, &mut output);

                    for frame in output.chunks_exact(out_channels) {
                        delay.push_back(gain * frame.iter().sum::<f32>());
                    }

                    next += period;
                    let now = Instant::now();
                    if next > now {
                        std::thread::sleep(next - now);
                    } else {
                        next = now;
                    }
                }
            })?;

        tracing::info!(
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            latency,
            speed = self.speed,
            "loopback stream started"
        );

        Ok(StreamHandle::new(LoopbackStream {
            running,
            thread: Some(thread),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_loopback_delays_output_into_input() {
        let config = BackendStreamConfig {
            sample_rate: 8000,
            buffer_size: 16,
            channels: 2,
            input_channels: 1,
            ..Default::default()
        };
        let backend = LoopbackBackend::new().with_gain(0.5).with_latency(40).with_speed(50.0);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let mut frame_index = 0usize;

        let handle = backend
            .build_duplex_stream(
                &config,
                Box::new(move |input, output| {
                    sink.lock().extend_from_slice(input);
                    output.fill(0.0);
                    for frame in output.chunks_exact_mut(2) {
                        if frame_index == 3 {
                            frame[0] = 1.0;
                            frame[1] = 1.0;
                        }
                        frame_index += 1;
                    }
                }),
                Box::new(|_| {}),
            )
            .unwrap();

        while captured.lock().len() < 128 {
            std::thread::sleep(Duration::from_millis(1));
        }
        drop(handle);

        let captured = captured.lock();
        assert_eq!(captured[43], 1.0);
        assert_eq!(captured.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn test_minimum_latency_is_one_block() {
        let config = BackendStreamConfig::default();
        assert_eq!(LoopbackBackend::new().effective_latency(&config), 512);
        assert_eq!(LoopbackBackend::new().with_latency(2000).effective_latency(&config), 2000);
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let config = BackendStreamConfig {
            buffer_size: 0,
            ..Default::default()
        };
        let result =
            LoopbackBackend::new().build_duplex_stream(&config, Box::new(|_, _| {}), Box::new(|_| {}));
        assert!(result.is_err());
    }

    #[test]
    fn test_lists_single_device() {
        let devices = LoopbackBackend::new().list_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_input && devices[0].is_output);
    }
}
