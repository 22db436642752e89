//! Fixed-size channel pool.

use super::{Channel, ChannelHandle, Slot};
use crate::backend::{Backend, BufferId, VoiceId};
use crate::sound::{SoundFormat, SoundKey};
use crate::MixerError;

/// Owns every channel slot, allocated once and never grown.
#[derive(Debug, Default)]
pub(crate) struct ChannelPool {
    channels: Vec<Channel>,
}

impl ChannelPool {
    /// Creates `max` voices with `buffers_per_channel` ring buffers each.
    ///
    /// On failure every resource created so far is returned to the backend.
    pub(crate) fn allocate<B: Backend>(
        backend: &mut B,
        max: usize,
        buffers_per_channel: usize,
    ) -> Result<Self, MixerError> {
        let voices = backend
            .create_voices(max)
            .map_err(|source| MixerError::VoiceAllocation {
                requested: max,
                source,
            })?;

        let requested = max * buffers_per_channel;
        let buffers = match backend.create_buffers(requested) {
            Ok(buffers) => buffers,
            Err(source) => {
                backend.destroy_voices(&voices);
                return Err(MixerError::BufferAllocation { requested, source });
            }
        };

        let channels = voices
            .into_iter()
            .zip(buffers.chunks(buffers_per_channel))
            .map(|(voice, ring)| Channel::new(voice, ring.to_vec()))
            .collect();
        Ok(Self { channels })
    }

    /// Hands out the lowest-index free channel.
    pub(crate) fn acquire(&mut self) -> Option<ChannelHandle> {
        let (index, channel) = self
            .channels
            .iter_mut()
            .enumerate()
            .find(|(_, c)| !c.is_live())?;
        channel.slot = Slot::Playing;
        Some(channel.handle(index))
    }

    /// The live channel `handle` refers to.
    pub(crate) fn get(&self, handle: ChannelHandle) -> Option<&Channel> {
        self.channels
            .get(handle.index())
            .filter(|c| c.generation == handle.generation() && c.is_live())
    }

    pub(crate) fn get_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel> {
        self.channels
            .get_mut(handle.index())
            .filter(|c| c.generation == handle.generation() && c.is_live())
    }

    /// Live channel playing on `voice`.
    pub(crate) fn find_voice(&self, voice: VoiceId) -> Option<ChannelHandle> {
        self.channels
            .iter()
            .position(|c| c.voice == voice && c.is_live())
            .map(|i| self.channels[i].handle(i))
    }

    /// Live channels that have `sound` attached.
    pub(crate) fn handles_with_sound(&self, sound: &str) -> Vec<ChannelHandle> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_live() && c.sound.as_ref().is_some_and(|k| k.as_str() == sound))
            .map(|(i, c)| c.handle(i))
            .collect()
    }

    /// Stops the channel, scrubs its buffers and returns it to the pool.
    ///
    /// Returns the sound that was attached. Stale handles are ignored.
    pub(crate) fn release<B: Backend>(
        &mut self,
        backend: &mut B,
        handle: ChannelHandle,
    ) -> Option<Option<SoundKey>> {
        let channel = self.get_mut(handle)?;

        backend.stop(channel.voice);
        backend.attach(channel.voice, None);
        backend.set_looping(channel.voice, false);
        for &buffer in &channel.buffers {
            backend.upload(buffer, SoundFormat::default(), &[]);
        }

        channel.slot = Slot::Available;
        channel.loop_count = 0;
        channel.exhausted = false;
        channel.generation = channel.generation.wrapping_add(1);
        tracing::trace!(channel = handle.index(), "channel returned to pool");
        Some(channel.sound.take())
    }

    /// Handle of slot `index` if it is live.
    pub(crate) fn live_handle(&self, index: usize) -> Option<ChannelHandle> {
        self.channels
            .get(index)
            .filter(|c| c.is_live())
            .map(|c| c.handle(index))
    }

    /// Handles of every live channel, in slot order.
    pub(crate) fn live_handles(&self) -> impl Iterator<Item = ChannelHandle> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_live())
            .map(|(i, c)| c.handle(i))
    }

    pub(crate) fn active_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_live()).count()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.channels.len()
    }

    /// Returns every voice and buffer to the backend.
    pub(crate) fn destroy<B: Backend>(&mut self, backend: &mut B) {
        let voices: Vec<VoiceId> = self.channels.iter().map(|c| c.voice).collect();
        let buffers: Vec<BufferId> = self
            .channels
            .iter()
            .flat_map(|c| c.buffers.iter().copied())
            .collect();
        backend.destroy_voices(&voices);
        backend.destroy_buffers(&buffers);
        self.channels.clear();
    }
}
