//! Deferred channel teardown across threads.
//!
//! Only the thread that owns the mixer may touch the pool or the backend.
//! Everything else (device callbacks, worker threads holding a shared
//! mixer) hands requests to a [`ReleaseQueue`], which `process()` drains.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use super::ChannelHandle;
use crate::backend::VoiceId;

/// A request waiting for the owning thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    /// Tear this channel down.
    Channel(ChannelHandle),
    /// The backend reports this voice stopped on its own.
    Voice(VoiceId),
}

#[derive(Debug)]
pub(crate) struct ReleaseQueue {
    owner: ThreadId,
    pending: Mutex<Vec<Pending>>,
    deferred: AtomicU64,
}

impl ReleaseQueue {
    /// Creates a queue owned by the calling thread.
    pub(crate) fn new() -> Self {
        Self {
            owner: thread::current().id(),
            pending: Mutex::new(Vec::new()),
            deferred: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub(crate) fn defer(&self, entry: Pending) {
        self.pending.lock().push(entry);
        if matches!(entry, Pending::Channel(_)) {
            self.deferred.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Whether a teardown of `handle` is queued.
    pub(crate) fn is_pending(&self, handle: ChannelHandle) -> bool {
        self.pending.lock().contains(&Pending::Channel(handle))
    }

    /// Moves every queued entry into `out`, leaving the queue empty.
    ///
    /// `out` should be empty; its allocation is swapped into the queue so
    /// neither side reallocates in steady state.
    pub(crate) fn drain_into(&self, out: &mut Vec<Pending>) {
        out.clear();
        std::mem::swap(&mut *self.pending.lock(), out);
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Channel teardowns deferred since creation.
    pub(crate) fn deferred_total(&self) -> u64 {
        self.deferred.load(Ordering::Relaxed)
    }
}

/// Cross-thread hand-off for stopping channels.
///
/// Cloneable and `Send + Sync`. Requests are applied by the next
/// [`Mixer::process()`](crate::Mixer::process) on the owning thread;
/// until then the channel reports [`ChannelState::Stopped`].
///
/// [`ChannelState::Stopped`]: crate::ChannelState::Stopped
///
/// # Example
///
/// ```
/// use stream_mixer::{ChannelState, Mixer, MockAudioFile, MockLoader, SimulatedBackend};
///
/// let loader = MockLoader::new();
/// loader.insert("engine.wav", MockAudioFile::new(8000, 1).with_silence(800));
/// let mut mixer = Mixer::builder()
///     .max_channels(2)
///     .loader(loader)
///     .start(SimulatedBackend::new())?;
///
/// let engine = mixer.load_sound("engine.wav").unwrap();
/// let channel = mixer.play(&engine).unwrap();
///
/// let releaser = mixer.release_handle();
/// std::thread::spawn(move || releaser.release(channel))
///     .join()
///     .unwrap();
/// assert_eq!(mixer.channel_state(channel), ChannelState::Stopped);
///
/// mixer.process();
/// assert_eq!(mixer.channel_state(channel), ChannelState::Available);
/// # Ok::<(), stream_mixer::MixerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseHandle {
    queue: Arc<ReleaseQueue>,
}

impl ReleaseHandle {
    pub(crate) fn new(queue: Arc<ReleaseQueue>) -> Self {
        Self { queue }
    }

    /// Queues `channel` for teardown. Duplicates and stale handles are
    /// harmless.
    pub fn release(&self, channel: ChannelHandle) {
        self.queue.defer(Pending::Channel(channel));
        tracing::trace!(channel = channel.index(), "channel release queued");
    }

    /// Requests currently waiting for `process()`.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
