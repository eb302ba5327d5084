//! Sample-accurate scheduling of playback and record commands.
//!
//! The scheduler is split in two halves joined by a pair of `rtrb` SPSC
//! rings:
//!
//! ```text
//!  control thread (tokio)                      audio thread
//! ┌────────────────────────┐  Command ring  ┌────────────────────────┐
//! │ Scheduler / Batch      │ ─────────────▶ │ SchedulerEngine        │
//! │  play / record / cancel│                │  process_block()       │
//! │  dispatch()            │ ◀───────────── │  playing / recording   │
//! └────────────────────────┘   Event ring   └────────────────────────┘
//! ```
//!
//! A [`Batch`] is written to the command ring in a single commit, so the
//! engine installs all of its commands at the same block boundary. Each
//! command owns a oneshot slot that [`Scheduler::dispatch`] resolves when
//! the matching event comes back. Buffers owned by the audio thread always
//! return inside an event and are freed on the control side.

mod batch;
mod command;
mod engine;

pub use batch::{Batch, BatchHandle, Completion, Scheduler};
pub use command::{Command, CommandId, Event, PlaybackCommand, RecordCommand, Source};
pub use engine::SchedulerEngine;

use crate::backend::BackendStreamConfig;

/// Default number of commands that may be pending at once
pub const DEFAULT_CAPACITY: usize = 256;

/// Create a connected scheduler pair for a stream with `config`'s channel
/// layout.
///
/// `capacity` bounds the number of pending commands; the engine reserves
/// room for that many playbacks and recordings before the stream starts.
pub fn channel(capacity: usize, config: &BackendStreamConfig) -> (Scheduler, SchedulerEngine) {
    with_channels(
        capacity,
        usize::from(config.channels),
        usize::from(config.input_channels),
    )
}

/// Create a connected scheduler pair for explicit channel counts.
pub fn with_channels(
    capacity: usize,
    output_channels: usize,
    input_channels: usize,
) -> (Scheduler, SchedulerEngine) {
    let capacity = capacity.max(1);
    // Cancels travel on the same ring as the commands they target
    let (command_tx, command_rx) = rtrb::RingBuffer::new(capacity * 2);
    let (event_tx, event_rx) = rtrb::RingBuffer::new(capacity * 2);

    (
        Scheduler::new(command_tx, event_rx, capacity),
        SchedulerEngine::new(command_rx, event_tx, capacity, output_channels, input_channels),
    )
}
