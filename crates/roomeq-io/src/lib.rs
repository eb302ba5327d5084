//! Audio I/O layer for roomeq.
//!
//! This crate provides:
//!
//! - **Scheduling**: [`scheduler`] multiplexes concurrent playback and record
//!   commands against a fixed-rate audio callback, sample accurately
//! - **Command batches**: [`Batch`] groups commands that must start in the
//!   same block and hands back a future per command
//! - **Backends**: [`backend::AudioBackend`] with a cpal implementation for
//!   real devices and a deterministic loopback for tests
//! - **WAV file I/O**: [`read_wav_channels`] and [`write_wav_channels`] for
//!   exporting and importing impulse responses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roomeq_io::backend::{AudioBackend, BackendStreamConfig, LoopbackBackend};
//! use roomeq_io::scheduler;
//! use std::sync::Arc;
//!
//! let config = BackendStreamConfig::default();
//! let (scheduler, mut engine) = scheduler::channel(64, &config);
//! let _stream = LoopbackBackend::new().build_duplex_stream(
//!     &config,
//!     Box::new(move |input, output| engine.process_block(input, output)),
//!     Box::new(|err| tracing::warn!(err, "stream error")),
//! )?;
//! let _dispatcher = scheduler.spawn_dispatcher(std::time::Duration::from_millis(5));
//!
//! let tone: Arc<[f32]> = vec![0.5; 4800].into();
//! let mut batch = scheduler.batch();
//! let recording = batch.record(0, 4800, 0);
//! batch.play(vec![Some(tone)], 0);
//! batch.submit()?.wait().await?;
//! let captured = recording.await?;
//! ```

pub mod backend;
pub mod scheduler;
mod wav;

pub use backend::AudioDevice;
pub use scheduler::{Batch, BatchHandle, CommandId, Completion, Scheduler, SchedulerEngine};
pub use wav::{WavInfo, read_wav_channels, read_wav_info, write_wav_channels};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Submitting would exceed the scheduler's command capacity.
    #[error("Scheduler queue is full")]
    QueueFull,

    /// A command with this id is already pending.
    #[error("Command {0} is already pending")]
    DuplicateCommand(CommandId),

    /// The command was cancelled before it completed.
    #[error("Command was cancelled")]
    Cancelled,

    /// The audio side went away before the command completed.
    #[error("Audio engine disconnected")]
    Disconnected,
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
