//! cpal-based audio backend.
//!
//! cpal exposes input and output as separate streams with separate
//! callbacks. [`CpalBackend`] joins them into one duplex callback: the input
//! callback pushes captured samples into an `rtrb` ring and the output
//! callback drains it into a preallocated scratch buffer before running the
//! duplex callback. When the input falls behind, missing frames reach the
//! callback as silence.

use super::{
    AudioBackend, AudioDevice, BackendStreamConfig, DuplexCallback, ErrorCallback, StreamHandle,
};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host};
use parking_lot::Mutex;
use std::sync::Arc;

/// Input ring length in blocks; absorbs jitter between the two callbacks.
const RING_BLOCKS: usize = 8;

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

fn describe(device: &Device, is_input: bool, is_output: bool) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    let config = if is_input {
        device.default_input_config().map(|c| c.sample_rate())
    } else {
        device.default_output_config().map(|c| c.sample_rate())
    };
    Some(AudioDevice {
        name,
        is_input,
        is_output,
        default_sample_rate: config.unwrap_or(48000),
    })
}

/// cpal-based audio backend.
///
/// Holds the platform's default cpal [`Host`] (ALSA, CoreAudio, WASAPI).
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a new cpal backend using the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// Find an output device by case-insensitive substring, or the default.
    fn find_output_device(&self, name: Option<&str>) -> Result<Device> {
        match name {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .output_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;
                for device in devices {
                    if let Ok(dev_name) = device_name(&device)
                        && dev_name.to_lowercase().contains(&search_lower)
                    {
                        return Ok(device);
                    }
                }
                Err(Error::DeviceNotFound(format!(
                    "no output device matching '{search}'"
                )))
            }
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }

    /// Find an input device by case-insensitive substring, or the default.
    fn find_input_device(&self, name: Option<&str>) -> Result<Device> {
        match name {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .input_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;
                for device in devices {
                    if let Ok(dev_name) = device_name(&device)
                        && dev_name.to_lowercase().contains(&search_lower)
                    {
                        return Ok(device);
                    }
                }
                Err(Error::DeviceNotFound(format!(
                    "no input device matching '{search}'"
                )))
            }
            None => self.host.default_input_device().ok_or(Error::NoDevice),
        }
    }

    fn stream_config(config: &BackendStreamConfig, channels: u16) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        let mut devices: Vec<AudioDevice> = Vec::new();

        if let Ok(inputs) = self.host.input_devices() {
            for device in inputs {
                let is_output = device.default_output_config().is_ok();
                if let Some(info) = describe(&device, true, is_output) {
                    devices.push(info);
                }
            }
        }

        if let Ok(outputs) = self.host.output_devices() {
            for device in outputs {
                if let Some(info) = describe(&device, false, true)
                    && !devices.iter().any(|d| d.name == info.name)
                {
                    devices.push(info);
                }
            }
        }

        Ok(devices)
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self
            .host
            .default_output_device()
            .and_then(|d| describe(&d, false, true)))
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self
            .host
            .default_input_device()
            .and_then(|d| describe(&d, true, false)))
    }

    fn build_duplex_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: DuplexCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let output_device = self.find_output_device(config.output_device.as_deref())?;
        let out_channels = usize::from(config.channels.max(1));
        let in_channels = usize::from(config.input_channels);
        let frames = config.buffer_size as usize;

        let errors = Arc::new(Mutex::new(error_callback));

        // A missing default input degrades to an output-only stream; a
        // named input that cannot be found is an error.
        let input_device = if in_channels == 0 {
            None
        } else {
            match self.find_input_device(config.input_device.as_deref()) {
                Ok(device) => Some(device),
                Err(Error::NoDevice) if config.input_device.is_none() => {
                    tracing::warn!("no input device, recording silence");
                    None
                }
                Err(e) => return Err(e),
            }
        };

        let ring_len = (frames * in_channels * RING_BLOCKS).max(1);
        let (mut input_tx, mut input_rx) = rtrb::RingBuffer::<f32>::new(ring_len);

        let input_stream = match input_device {
            Some(device) => {
                let errors = Arc::clone(&errors);
                let stream = device
                    .build_input_stream(
                        &Self::stream_config(config, config.input_channels),
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            for &sample in data {
                                if input_tx.push(sample).is_err() {
                                    break;
                                }
                            }
                        },
                        move |err| {
                            let mut report = errors.lock();
                            (*report)(&err.to_string());
                        },
                        None,
                    )
                    .map_err(|e| Error::Stream(e.to_string()))?;
                Some(stream)
            }
            None => None,
        };

        let mut scratch = vec![0.0f32; ring_len];
        let output_stream = output_device
            .build_output_stream(
                &Self::stream_config(config, config.channels),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let block_frames = data.len() / out_channels;
                    let wanted = (block_frames * in_channels).min(scratch.len());
                    let available = match in_channels {
                        0 => 0,
                        n => input_rx.slots().min(wanted) / n * n,
                    };
                    for slot in &mut scratch[..available] {
                        *slot = input_rx.pop().unwrap_or(0.0);
                    }
                    callback(&scratch[..available], data);
                },
                move |err| {
                    let mut report = errors.lock();
                    (*report)(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        if let Some(stream) = &input_stream {
            stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        }
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            output_channels = config.channels,
            input_channels = config.input_channels,
            has_input = input_stream.is_some(),
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "duplex stream started"
        );

        Ok(StreamHandle::new((input_stream, output_stream)))
    }
}
