//! Control-thread half of the scheduler: command batches and completions.

use super::command::{Command, CommandId, Event, PlaybackCommand, RecordCommand, Source};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Result slot of one command
enum Slot {
    Play(oneshot::Sender<Result<()>>),
    Record(oneshot::Sender<Result<Vec<f32>>>),
}

impl Slot {
    fn fail(self, error: Error) {
        match self {
            Slot::Play(tx) => {
                let _ = tx.send(Err(error));
            }
            Slot::Record(tx) => {
                let _ = tx.send(Err(error));
            }
        }
    }

    fn resolve(self, event: Event) {
        match (self, event) {
            (Slot::Play(tx), Event::Played { sources, .. }) => {
                drop(sources);
                let _ = tx.send(Ok(()));
            }
            (Slot::Record(tx), Event::Recorded { samples, .. }) => {
                let _ = tx.send(Ok(samples));
            }
            (slot, Event::Retired(_)) => slot.fail(Error::Cancelled),
            (slot, _) => slot.fail(Error::Disconnected),
        }
    }
}

/// Bookkeeping for a command the audio thread may still hold.
///
/// A cancelled command keeps its entry (with the slot already resolved)
/// until the audio thread reports it, so capacity accounting stays exact.
struct Pending {
    slot: Option<Slot>,
    done: Option<oneshot::Sender<()>>,
}

impl Pending {
    fn finish(&mut self, event: Option<Event>) {
        if let Some(slot) = self.slot.take() {
            match event {
                Some(event) => slot.resolve(event),
                None => slot.fail(Error::Cancelled),
            }
        }
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

struct Inner {
    commands: rtrb::Producer<Command>,
    events: rtrb::Consumer<Event>,
    pending: HashMap<CommandId, Pending>,
    capacity: usize,
}

/// Handle for submitting command batches to a [`SchedulerEngine`].
///
/// Cloning is cheap; all clones share one queue.
///
/// [`SchedulerEngine`]: super::SchedulerEngine
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Scheduler")
            .field("pending", &inner.pending.len())
            .field("capacity", &inner.capacity)
            .finish()
    }
}

impl Scheduler {
    pub(crate) fn new(
        commands: rtrb::Producer<Command>,
        events: rtrb::Consumer<Event>,
        capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                commands,
                events,
                pending: HashMap::with_capacity(capacity),
                capacity,
            })),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Start a new, empty batch
    pub fn batch(&self) -> Batch {
        Batch {
            scheduler: self.clone(),
            commands: Vec::new(),
            pending: Vec::new(),
            done: Vec::new(),
        }
    }

    /// Allocate a fresh command id
    pub fn next_id(&self) -> CommandId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Maximum number of commands that may be pending at once
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Number of submitted commands the audio thread has not reported yet
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Cancel a pending command.
    ///
    /// Its completion resolves to [`Error::Cancelled`] right away; the audio
    /// thread drops it at the next block without reporting a completion.
    /// Returns `false` if no such command is pending.
    pub fn cancel(&self, id: CommandId) -> Result<bool> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(pending) = inner.pending.get_mut(&id) else {
            return Ok(false);
        };
        if pending.slot.is_none() {
            return Ok(false);
        }

        inner
            .commands
            .push(Command::Cancel(id))
            .map_err(|_| Error::QueueFull)?;
        pending.finish(None);
        tracing::debug!(id, "command cancelled");
        Ok(true)
    }

    /// Resolve completions reported by the audio thread.
    ///
    /// Returns the number of events handled. If the audio side has gone
    /// away, every remaining command fails with [`Error::Disconnected`].
    pub fn dispatch(&self) -> usize {
        Self::dispatch_inner(&self.inner)
    }

    fn dispatch_inner(inner: &Mutex<Inner>) -> usize {
        let mut guard = inner.lock();
        let inner = &mut *guard;

        let abandoned = inner.events.is_abandoned();
        let mut handled = 0;
        while let Ok(event) = inner.events.pop() {
            handled += 1;
            if let Some(mut pending) = inner.pending.remove(&event.id()) {
                pending.finish(Some(event));
            }
        }

        if abandoned && !inner.pending.is_empty() {
            tracing::warn!(
                pending = inner.pending.len(),
                "audio engine gone, failing pending commands"
            );
            for (_, mut pending) in inner.pending.drain() {
                if let Some(slot) = pending.slot.take() {
                    slot.fail(Error::Disconnected);
                }
            }
        }
        handled
    }

    /// Run [`dispatch`](Self::dispatch) every `period` on the current tokio
    /// runtime.
    ///
    /// The task ends by itself once every clone of this scheduler is dropped.
    pub fn spawn_dispatcher(&self, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                Self::dispatch_inner(&inner);
            }
        })
    }
}

/// Commands that start together.
///
/// Every command of a batch is installed by the audio thread in the same
/// block, so relative delays inside a batch are sample accurate.
pub struct Batch {
    scheduler: Scheduler,
    commands: Vec<Command>,
    pending: Vec<Pending>,
    done: Vec<oneshot::Receiver<()>>,
}

impl Batch {
    /// Number of commands in the batch
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if the batch has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Play `sources` (one per output channel) after `delay_frames` frames.
    ///
    /// A negative delay skips that many frames of the sources.
    pub fn play(&mut self, sources: Vec<Source>, delay_frames: i64) -> Completion<()> {
        let id = self.scheduler.next_id();
        self.play_with_id(id, sources, delay_frames)
    }

    /// [`play`](Self::play) under a caller-chosen id.
    pub fn play_with_id(
        &mut self,
        id: CommandId,
        sources: Vec<Source>,
        delay_frames: i64,
    ) -> Completion<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            Command::Play(PlaybackCommand::new(id, sources, delay_frames)),
            Slot::Play(tx),
        );
        Completion { id, receiver: rx }
    }

    /// Record `frames` frames of input `channel` after `delay_frames` frames.
    ///
    /// The capture buffer is allocated here, not on the audio thread.
    pub fn record(
        &mut self,
        channel: usize,
        frames: usize,
        delay_frames: i64,
    ) -> Completion<Vec<f32>> {
        let id = self.scheduler.next_id();
        self.record_with_id(id, channel, frames, delay_frames)
    }

    /// [`record`](Self::record) under a caller-chosen id.
    pub fn record_with_id(
        &mut self,
        id: CommandId,
        channel: usize,
        frames: usize,
        delay_frames: i64,
    ) -> Completion<Vec<f32>> {
        let (tx, rx) = oneshot::channel();
        self.push(
            Command::Record(RecordCommand::new(id, channel, frames, delay_frames)),
            Slot::Record(tx),
        );
        Completion { id, receiver: rx }
    }

    fn push(&mut self, command: Command, slot: Slot) {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands.push(command);
        self.pending.push(Pending {
            slot: Some(slot),
            done: Some(done_tx),
        });
        self.done.push(done_rx);
    }

    /// Send every command to the audio thread in one ring commit.
    ///
    /// Fails without sending anything if an id is already pending or
    /// repeated in the batch, or if the batch would exceed the scheduler's
    /// capacity.
    pub fn submit(self) -> Result<BatchHandle> {
        let Batch {
            scheduler,
            commands,
            pending,
            done,
        } = self;
        let ids: Vec<CommandId> = commands.iter().map(Command::id).collect();

        let mut guard = scheduler.inner.lock();
        let inner = &mut *guard;

        let mut seen = HashSet::with_capacity(ids.len());
        for &id in &ids {
            if inner.pending.contains_key(&id) || !seen.insert(id) {
                return Err(Error::DuplicateCommand(id));
            }
        }
        if inner.pending.len() + commands.len() > inner.capacity {
            return Err(Error::QueueFull);
        }

        if !commands.is_empty() {
            let chunk = inner
                .commands
                .write_chunk_uninit(commands.len())
                .map_err(|_| Error::QueueFull)?;
            inner.pending.extend(ids.iter().copied().zip(pending));
            chunk.fill_from_iter(commands);
        }

        tracing::debug!(commands = ids.len(), "batch submitted");
        Ok(BatchHandle { ids, done })
    }
}

/// A submitted batch
#[derive(Debug)]
pub struct BatchHandle {
    ids: Vec<CommandId>,
    done: Vec<oneshot::Receiver<()>>,
}

impl BatchHandle {
    /// Ids of the batch's commands, in the order they were added
    pub fn ids(&self) -> &[CommandId] {
        &self.ids
    }

    /// Wait until every command of the batch has completed or been
    /// cancelled.
    pub async fn wait(self) -> Result<()> {
        for done in self.done {
            done.await.map_err(|_| Error::Disconnected)?;
        }
        Ok(())
    }
}

/// Future resolving when one command completes.
///
/// Playbacks resolve to `()`, recordings to the captured samples. A
/// cancelled command resolves to [`Error::Cancelled`].
#[derive(Debug)]
pub struct Completion<T> {
    id: CommandId,
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Completion<T> {
    /// Id of the command
    pub fn id(&self) -> CommandId {
        self.id
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Disconnected)),
            Poll::Pending => Poll::Pending,
        }
    }
}
