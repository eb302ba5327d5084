//! Pluggable audio backend abstraction.
//!
//! A measurement needs playback and capture on one clock, so backends build
//! a single duplex stream whose callback receives the captured input and
//! fills the output for the same block:
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   MeasurementSession / CLI       │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │ list_devices / build_duplex      │
//! └──────────────┬───────────────────┘
//!        ┌───────┴─────────┐
//!        ▼                 ▼
//! ┌─────────────┐  ┌────────────────┐
//! │ CpalBackend │  │LoopbackBackend │
//! │  (devices)  │  │ (tests, CI)    │
//! └─────────────┘  └────────────────┘
//! ```
//!
//! Stream handles are returned as [`StreamHandle`], a type-erased wrapper
//! that stops the stream on drop.

mod cpal_backend;
mod loopback;

pub use cpal_backend::CpalBackend;
pub use loopback::LoopbackBackend;

use crate::Result;

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Configuration for building a duplex stream.
///
/// ## Fields
///
/// - `sample_rate`: Requested sample rate in Hz (default: 48000)
/// - `buffer_size`: Preferred buffer size in frames (default: 512)
/// - `channels`: Number of output channels (default: 2)
/// - `input_channels`: Number of input channels (default: 1, one microphone)
/// - `output_device` / `input_device`: Optional device name filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of output channels.
    pub channels: u16,
    /// Number of input channels.
    pub input_channels: u16,
    /// Output device name (uses system default if `None`).
    pub output_device: Option<String>,
    /// Input device name (uses system default if `None`).
    pub input_device: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            input_channels: 1,
            output_device: None,
            input_device: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback and capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Duplex callback signature.
///
/// Called on the real-time audio thread with the block's captured input and
/// the output buffer to fill. Both are interleaved (`[L0, R0, L1, R1, ...]`).
/// The input slice may be shorter than the block, or empty when no input is
/// available; missing frames are silence.
///
/// ## Real-Time Safety
///
/// Implementations must not allocate, lock mutexes, or perform I/O.
pub type DuplexCallback = Box<dyn FnMut(&[f32], &mut [f32]) + Send>;

/// Error callback signature.
///
/// Called when the backend encounters an error while streaming.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend trait.
///
/// Object-safe, so the backend can be chosen at runtime via
/// `Box<dyn AudioBackend>`.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "loopback").
    fn name(&self) -> &str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Get the default input device, if any.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start a duplex stream.
    ///
    /// The returned [`StreamHandle`] keeps the stream alive.
    fn build_duplex_stream(
        &self,
        config: &BackendStreamConfig,
        callback: DuplexCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Sample rate the backend will actually run at for `config`.
    ///
    /// Default implementation returns the requested rate unchanged.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.channels, 2);
        assert_eq!(config.input_channels, 1);
        assert!(config.output_device.is_none());
    }

    #[test]
    fn test_stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }

    #[test]
    fn test_backend_is_object_safe() {
        let backends: Vec<Box<dyn AudioBackend>> = vec![Box::new(LoopbackBackend::new())];
        assert_eq!(backends[0].name(), "loopback");
    }
}
