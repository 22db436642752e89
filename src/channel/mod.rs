//! Playback channels: the pool of hardware voices and their release queue.

mod pool;
mod release;

pub(crate) use pool::ChannelPool;
pub(crate) use release::{Pending, ReleaseQueue};
pub use release::ReleaseHandle;

use crate::backend::{BufferId, VoiceId};
use crate::sound::SoundKey;

/// Reference to one playback on a channel.
///
/// A handle stays valid until the channel is retired. After that every
/// operation on it is a no-op, even once the slot plays something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    index: usize,
    generation: u32,
}

impl ChannelHandle {
    /// Creates a handle for slot `index` at `generation`.
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slot generation the handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Channel state as seen through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Free, retired, or the handle is stale.
    Available,
    /// Playing a sound.
    Playing,
    /// Paused by the caller.
    Paused,
    /// Finished or release requested; the slot is reclaimed on the next
    /// `process()`.
    Stopped,
}

/// Lifecycle of a slot inside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Available,
    Playing,
    Paused,
}

/// One pool slot.
#[derive(Debug)]
pub(crate) struct Channel {
    pub(crate) voice: VoiceId,
    pub(crate) buffers: Vec<BufferId>,
    pub(crate) generation: u32,
    pub(crate) slot: Slot,
    pub(crate) sound: Option<SoundKey>,
    /// Extra passes left after the current one; `-1` loops forever.
    pub(crate) loop_count: i32,
    /// The stream hit its end with no loops left; only the queued tail plays.
    pub(crate) exhausted: bool,
}

impl Channel {
    pub(crate) fn new(voice: VoiceId, buffers: Vec<BufferId>) -> Self {
        Self {
            voice,
            buffers,
            generation: 0,
            slot: Slot::Available,
            sound: None,
            loop_count: 0,
            exhausted: false,
        }
    }

    pub(crate) fn handle(&self, index: usize) -> ChannelHandle {
        ChannelHandle::new(index, self.generation)
    }

    pub(crate) fn is_live(&self) -> bool {
        self.slot != Slot::Available
    }
}
