//! Audio-thread half of the scheduler.
//!
//! [`SchedulerEngine::process_block`] runs inside the audio callback. It
//! never allocates, locks or logs: commands arrive on one lock-free ring,
//! completions leave on another, and the active sets are reserved to the
//! scheduler capacity up front.

use super::command::{Command, CommandId, Event, PlaybackCommand, RecordCommand};
use std::ops::Range;

/// Per-block executor of playback and record commands.
pub struct SchedulerEngine {
    commands: rtrb::Consumer<Command>,
    events: rtrb::Producer<Event>,
    playing: Vec<PlaybackCommand>,
    recording: Vec<RecordCommand>,
    capacity: usize,
    output_channels: usize,
    input_channels: usize,
}

impl SchedulerEngine {
    pub(crate) fn new(
        commands: rtrb::Consumer<Command>,
        events: rtrb::Producer<Event>,
        capacity: usize,
        output_channels: usize,
        input_channels: usize,
    ) -> Self {
        Self {
            commands,
            events,
            playing: Vec::with_capacity(capacity),
            recording: Vec::with_capacity(capacity),
            capacity,
            output_channels: output_channels.max(1),
            input_channels,
        }
    }

    /// Number of interleaved output channels
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Number of interleaved input channels
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Number of playbacks and recordings currently installed
    pub fn active(&self) -> usize {
        self.playing.len() + self.recording.len()
    }

    /// Render one block.
    ///
    /// `output` is overwritten with the mix of all active playbacks;
    /// `input` is read for active recordings. Both are interleaved, and the
    /// block length in frames is taken from `output`. Frames missing from
    /// `input` (including an empty slice) are captured as silence.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        output.fill(0.0);
        let frames = output.len() / self.output_channels;

        self.install_commands();
        self.mix_playback(output, frames);
        self.capture(input, frames);
    }

    fn install_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                Command::Play(play) if self.playing.len() < self.capacity => {
                    self.playing.push(play);
                }
                Command::Record(record) if self.recording.len() < self.capacity => {
                    self.recording.push(record);
                }
                Command::Cancel(id) => self.cancel(id),
                overflow => {
                    let _ = self.events.push(Event::Retired(overflow));
                }
            }
        }
    }

    fn cancel(&mut self, id: CommandId) {
        if let Some(pos) = self.playing.iter().position(|p| p.id == id) {
            let play = self.playing.swap_remove(pos);
            let _ = self.events.push(Event::Retired(Command::Play(play)));
        }
        if let Some(pos) = self.recording.iter().position(|r| r.id == id) {
            let record = self.recording.swap_remove(pos);
            let _ = self.events.push(Event::Retired(Command::Record(record)));
        }
    }

    fn mix_playback(&mut self, output: &mut [f32], frames: usize) {
        let channels = self.output_channels;
        let mut i = 0;
        while i < self.playing.len() {
            let play = &mut self.playing[i];
            for (ch, source) in play.sources.iter().enumerate().take(channels) {
                let Some(source) = source else { continue };
                for frame in active_range(play.cursor, source.len(), frames) {
                    let idx = (play.cursor + frame as i64) as usize;
                    output[frame * channels + ch] += source[idx];
                }
            }
            play.cursor += frames as i64;

            // Completion waits for room on the event ring
            if play.is_finished() && self.events.slots() > 0 {
                let play = self.playing.swap_remove(i);
                let _ = self.events.push(Event::Played {
                    id: play.id,
                    sources: play.sources,
                });
            } else {
                i += 1;
            }
        }
    }

    fn capture(&mut self, input: &[f32], frames: usize) {
        let channels = self.input_channels;
        let mut i = 0;
        while i < self.recording.len() {
            let record = &mut self.recording[i];
            let channel = record.channel;
            let cursor = record.cursor;
            for frame in active_range(cursor, record.destination.len(), frames) {
                let value = if channel < channels {
                    input.get(frame * channels + channel).copied().unwrap_or(0.0)
                } else {
                    0.0
                };
                record.destination[(cursor + frame as i64) as usize] = value;
            }
            record.cursor += frames as i64;

            if record.is_finished() && self.events.slots() > 0 {
                let mut record = self.recording.swap_remove(i);
                let _ = self.events.push(Event::Recorded {
                    id: record.id,
                    samples: std::mem::take(&mut record.destination),
                });
            } else {
                i += 1;
            }
        }
    }
}

/// Block frames whose buffer index `cursor + frame` falls inside `[0, len)`.
fn active_range(cursor: i64, len: usize, frames: usize) -> Range<usize> {
    let frames = frames as i64;
    let start = (-cursor).clamp(0, frames);
    let end = (len as i64 - cursor).clamp(start, frames);
    start as usize..end as usize
}
