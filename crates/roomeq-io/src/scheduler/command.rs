//! Commands sent to the audio thread and the events it sends back.

use std::sync::Arc;

/// Client-assigned command identifier
pub type CommandId = u64;

/// One output channel's samples; `None` leaves the channel untouched.
pub type Source = Option<Arc<[f32]>>;

/// Play one buffer per output channel, all sharing a cursor.
#[derive(Debug, Clone)]
pub struct PlaybackCommand {
    /// Command id
    pub id: CommandId,
    /// Samples per output channel, indexed by channel
    pub sources: Vec<Source>,
    /// Next source frame to mix; negative means that many frames of silence
    /// remain before sample 0
    pub cursor: i64,
}

impl PlaybackCommand {
    /// Playback starting `delay_frames` frames after installation.
    pub fn new(id: CommandId, sources: Vec<Source>, delay_frames: i64) -> Self {
        Self {
            id,
            sources,
            cursor: -delay_frames,
        }
    }

    /// Length of the longest source in frames
    pub fn len(&self) -> usize {
        self.sources
            .iter()
            .flatten()
            .map(|s| s.len())
            .max()
            .unwrap_or(0)
    }

    /// True when no source has samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once every source has been played through
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.len() as i64
    }
}

/// Capture one input channel into a preallocated buffer.
#[derive(Debug, Clone)]
pub struct RecordCommand {
    /// Command id
    pub id: CommandId,
    /// Input channel to capture
    pub channel: usize,
    /// Capture buffer, allocated at submission
    pub destination: Vec<f32>,
    /// Next destination frame to write; negative means that many input
    /// frames are skipped first
    pub cursor: i64,
}

impl RecordCommand {
    /// Record `frames` frames of `channel`, starting `delay_frames` frames
    /// after installation.
    pub fn new(id: CommandId, channel: usize, frames: usize, delay_frames: i64) -> Self {
        Self {
            id,
            channel,
            destination: vec![0.0; frames],
            cursor: -delay_frames,
        }
    }

    /// True once the destination is full
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.destination.len() as i64
    }
}

/// Control → audio message
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a playback
    Play(PlaybackCommand),
    /// Start a recording
    Record(RecordCommand),
    /// Remove the playback or recording with this id
    Cancel(CommandId),
}

impl Command {
    /// Id of the command this message concerns
    pub fn id(&self) -> CommandId {
        match self {
            Command::Play(p) => p.id,
            Command::Record(r) => r.id,
            Command::Cancel(id) => *id,
        }
    }
}

/// Audio → control message
///
/// Every buffer the audio thread owned travels back inside an event, so
/// nothing is freed on the audio thread.
#[derive(Debug)]
pub enum Event {
    /// A playback finished; its sources are handed back
    Played {
        /// Command id
        id: CommandId,
        /// The sources that were played
        sources: Vec<Source>,
    },
    /// A recording finished
    Recorded {
        /// Command id
        id: CommandId,
        /// Captured samples
        samples: Vec<f32>,
    },
    /// A command was removed without completing
    Retired(Command),
}

impl Event {
    /// Id of the command this event concerns
    pub fn id(&self) -> CommandId {
        match self {
            Event::Played { id, .. } | Event::Recorded { id, .. } => *id,
            Event::Retired(command) => command.id(),
        }
    }
}
