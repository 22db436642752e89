//! The mixer façade.

mod refill;

use std::sync::Arc;

use glam::Vec2;

use crate::backend::{Backend, BufferId, VoiceId, VoiceKind, VoiceState};
use crate::channel::{
    ChannelHandle, ChannelPool, ChannelState, Pending, ReleaseHandle, ReleaseQueue, Slot,
};
use crate::sound::{Sound, SoundFormat, SoundKey, SoundKind, SoundRegistry};
use crate::source::{AudioFile, AudioLoader, FileLoader};
use crate::{EventCallback, MixerBuilder, MixerConfig, MixerError, MixerEvent, RetireReason};

/// Snapshot of mixer counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixerStats {
    /// Channels currently playing or paused.
    pub active_channels: usize,
    /// Pool capacity.
    pub max_channels: usize,
    /// Requests waiting for the next `process()`.
    pub pending_releases: usize,
    /// Loaded sounds.
    pub sounds: usize,
    /// Channels returned to the pool since creation.
    pub channels_retired: u64,
    /// Streaming channels restarted after running dry.
    pub underruns_recovered: u64,
    /// Releases queued from other threads since creation.
    pub deferred_releases: u64,
}

/// Fixed-channel playback engine.
///
/// `Mixer` owns a pool of hardware voices, the registry of loaded sounds
/// and the refill state of every streaming channel. All of it is driven
/// from one owning thread (the thread that created the mixer), which must
/// call [`process()`](Self::process) once per tick.
///
/// Nothing here panics on expected conditions: a full pool, an unknown
/// sound or a stale handle simply yield `None`/`false`. A mixer that was
/// never initialized, or failed to, stays silent.
///
/// # Example
///
/// ```
/// use stream_mixer::{Mixer, MockAudioFile, MockLoader, SimulatedBackend};
///
/// let loader = MockLoader::new();
/// loader.insert("beep.wav", MockAudioFile::new(8000, 1).with_sine(440.0, 50));
///
/// let mut mixer = Mixer::builder()
///     .max_channels(4)
///     .loader(loader)
///     .start(SimulatedBackend::new())?;
///
/// let beep = mixer.load_sound("beep.wav").unwrap();
/// let channel = mixer.play(&beep).unwrap();
/// assert!(mixer.is_playing(channel));
///
/// mixer.backend_mut().advance(400);
/// mixer.process();
/// assert!(!mixer.is_playing(channel));
/// # Ok::<(), stream_mixer::MixerError>(())
/// ```
pub struct Mixer<B: Backend> {
    backend: B,
    loader: Box<dyn AudioLoader>,
    config: MixerConfig,
    pool: ChannelPool,
    sounds: SoundRegistry,
    releases: Arc<ReleaseQueue>,
    drained: Vec<Pending>,
    scratch: Vec<i16>,
    on_event: Option<EventCallback>,
    initialized: bool,
    channels_retired: u64,
    underruns_recovered: u64,
}

impl<B: Backend> Mixer<B> {
    /// Creates an uninitialized mixer with default configuration and a
    /// [`FileLoader`] rooted at the working directory.
    ///
    /// The calling thread becomes the owning thread.
    pub fn new(backend: B) -> Self {
        Self::from_parts(
            backend,
            MixerConfig::default(),
            Box::new(FileLoader::new()),
            None,
        )
    }

    /// Returns a builder for configuring a mixer.
    pub fn builder() -> MixerBuilder<B> {
        MixerBuilder::new()
    }

    pub(crate) fn from_parts(
        backend: B,
        config: MixerConfig,
        loader: Box<dyn AudioLoader>,
        on_event: Option<EventCallback>,
    ) -> Self {
        Self {
            backend,
            loader,
            config,
            pool: ChannelPool::default(),
            sounds: SoundRegistry::new(),
            releases: Arc::new(ReleaseQueue::new()),
            drained: Vec::new(),
            scratch: Vec::new(),
            on_event,
            initialized: false,
            channels_retired: 0,
            underruns_recovered: 0,
        }
    }

    /// Allocates `max_channels` voices and their streaming buffer rings.
    ///
    /// Calling this twice is a programming error.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `max_channels` is zero or the configuration is
    ///   otherwise unusable
    /// - `VoiceAllocation` / `BufferAllocation` if the backend runs out of
    ///   resources; nothing stays allocated in that case
    /// - `AlreadyInitialized` on a second call (release builds)
    pub fn initialize(&mut self, max_channels: usize) -> Result<(), MixerError> {
        debug_assert!(!self.initialized, "Mixer::initialize called twice");
        if self.initialized {
            tracing::error!("mixer already initialized");
            return Err(MixerError::AlreadyInitialized);
        }

        self.config.max_channels = max_channels;
        self.config.validate()?;

        let pool = ChannelPool::allocate(
            &mut self.backend,
            max_channels,
            self.config.buffers_per_channel,
        )
        .map_err(|e| {
            tracing::error!(error = %e, backend = self.backend.name(), "mixer initialization failed");
            e
        })?;

        let queue = Arc::clone(&self.releases);
        self.backend
            .set_completion_handler(Arc::new(move |voice| queue.defer(Pending::Voice(voice))));

        self.pool = pool;
        self.scratch = vec![0; self.config.stream_buffer_samples];
        self.drained = Vec::with_capacity(max_channels);
        self.initialized = true;
        tracing::info!(
            backend = self.backend.name(),
            channels = max_channels,
            buffers_per_channel = self.config.buffers_per_channel,
            "mixer initialized"
        );
        Ok(())
    }

    /// Returns `true` once [`initialize()`](Self::initialize) succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Releases every channel and unloads every sound.
    ///
    /// The pool stays allocated; the mixer can keep playing afterwards.
    pub fn clear(&mut self) {
        let live: Vec<_> = self.pool.live_handles().collect();
        for handle in live {
            self.retire(handle, RetireReason::Cleared);
        }
        self.releases.drain_into(&mut self.drained);
        self.drained.clear();

        let buffers: Vec<_> = self
            .sounds
            .drain()
            .filter_map(|sound| sound.static_buffer())
            .collect();
        self.backend.destroy_buffers(&buffers);
        tracing::debug!(freed_buffers = buffers.len(), "mixer cleared");
    }

    /// Runs one tick: applies queued releases, refills streaming channels,
    /// retires finished ones, then applies releases that arrived meanwhile.
    ///
    /// Call once per frame from the owning thread.
    pub fn process(&mut self) {
        if !self.initialized {
            return;
        }
        self.drain_releases();

        for index in 0..self.pool.capacity() {
            let Some(handle) = self.pool.live_handle(index) else {
                continue;
            };
            if !self.releases.is_pending(handle) {
                self.service(handle, true);
            }
        }

        self.drain_releases();
    }

    /// Pauses or resumes the whole device without touching channel states.
    pub fn suspend(&mut self, suspended: bool) {
        if !self.initialized {
            return;
        }
        self.backend.suspend(suspended);
        tracing::debug!(suspended, "mixer suspend toggled");
    }

    /// Loads `path` fully into a static hardware buffer.
    ///
    /// Idempotent: a path already loaded returns its existing key without
    /// decoding again. Returns `None` if the file can't be opened or the
    /// backend has no buffer left.
    pub fn load_sound(&mut self, path: &str) -> Option<SoundKey> {
        if !self.initialized {
            return None;
        }
        let (sound, _) = self.sounds.create(path);
        debug_assert_ne!(
            sound.kind(),
            Some(SoundKind::Streaming),
            "{path} is already loaded as a stream"
        );
        match sound.kind() {
            Some(SoundKind::Static) => return Some(sound.key().clone()),
            Some(SoundKind::Streaming) => {
                tracing::error!(path, "sound already loaded as a stream");
                return None;
            }
            None => {}
        }

        let loaded = match self.loader.open(path) {
            Ok(mut file) => self.upload_static(file.as_mut()),
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to open sound");
                None
            }
        };

        match (loaded, self.sounds.get_mut(path)) {
            (Some((buffer, format)), Some(sound)) => {
                sound.set_static(buffer, format);
                tracing::debug!(path, ?format, "static sound loaded");
                Some(sound.key().clone())
            }
            _ => {
                self.sounds.remove(path);
                None
            }
        }
    }

    /// Registers `path` for incremental decoding.
    ///
    /// Idempotent like [`load_sound()`](Self::load_sound). The file stays
    /// open until the sound is released.
    pub fn load_stream(&mut self, path: &str) -> Option<SoundKey> {
        if !self.initialized {
            return None;
        }
        let (sound, _) = self.sounds.create(path);
        debug_assert_ne!(
            sound.kind(),
            Some(SoundKind::Static),
            "{path} is already loaded as a static sound"
        );
        match sound.kind() {
            Some(SoundKind::Streaming) => return Some(sound.key().clone()),
            Some(SoundKind::Static) => {
                tracing::error!(path, "sound already loaded as static");
                return None;
            }
            None => {}
        }

        match self.loader.open(path) {
            Ok(file) => {
                let format = file.format();
                sound.set_streaming(file);
                tracing::debug!(path, ?format, "stream loaded");
                Some(sound.key().clone())
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to open stream");
                self.sounds.remove(path);
                None
            }
        }
    }

    /// Stops every channel playing `sound`, then unloads it.
    ///
    /// Returns `false` if the sound isn't loaded.
    pub fn release_sound(&mut self, sound: &SoundKey) -> bool {
        if self.sounds.get(sound.as_str()).is_none() {
            return false;
        }
        for handle in self.pool.handles_with_sound(sound.as_str()) {
            self.retire(handle, RetireReason::SoundReleased);
        }
        if let Some(buffer) = self
            .sounds
            .remove(sound.as_str())
            .and_then(|s| s.static_buffer())
        {
            self.backend.destroy_buffers(&[buffer]);
        }
        tracing::debug!(sound = %sound, "sound released");
        true
    }

    /// Looks up a loaded sound.
    pub fn sound(&self, key: &str) -> Option<&Sound> {
        self.sounds.get(key)
    }

    /// Number of loaded sounds.
    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    /// Plays `sound` at the world origin. See [`play_at()`](Self::play_at).
    pub fn play(&mut self, sound: &SoundKey) -> Option<ChannelHandle> {
        self.play_at(sound, Vec2::ZERO)
    }

    /// Starts `sound` on a free channel at `position`.
    ///
    /// The channel starts with the configured default volume and no extra
    /// loops. A streaming sound already playing elsewhere is restarted on
    /// the new channel. Returns `None` when the mixer is uninitialized, the
    /// sound is unknown, every channel is busy, or a stream is empty.
    pub fn play_at(&mut self, sound: &SoundKey, position: Vec2) -> Option<ChannelHandle> {
        if !self.initialized {
            return None;
        }
        let Some(kind) = self.sounds.get(sound.as_str()).and_then(Sound::kind) else {
            tracing::debug!(sound = %sound, "play of unknown sound");
            return None;
        };

        if kind == SoundKind::Streaming {
            for old in self.pool.handles_with_sound(sound.as_str()) {
                self.retire(old, RetireReason::Restarted);
            }
        }

        let Some(handle) = self.pool.acquire() else {
            tracing::debug!(sound = %sound, "no free channel");
            return None;
        };

        let started = match kind {
            SoundKind::Static => self.start_static(handle, sound),
            SoundKind::Streaming => self.start_stream(handle, sound),
        };
        let Some(voice) = started else {
            self.pool.release(&mut self.backend, handle);
            return None;
        };

        self.backend.set_gain(voice, sanitize_gain(self.config.default_volume));
        self.backend.set_position(voice, position);
        self.backend.play(voice);

        tracing::debug!(channel = handle.index(), sound = %sound, "channel started");
        self.emit(MixerEvent::ChannelStarted {
            channel: handle,
            sound: sound.clone(),
        });
        Some(handle)
    }

    /// Resumes a paused channel.
    ///
    /// Returns the handle while the channel is live (playing or paused),
    /// `None` once it finished, was stopped, or is awaiting release. A
    /// stream that ran dry before it was paused restarts through a refill,
    /// so buffers it already played are never heard again.
    pub fn resume(&mut self, channel: ChannelHandle) -> Option<ChannelHandle> {
        if self.releases.is_pending(channel) || self.has_finished(channel) {
            return None;
        }
        let ch = self.pool.get_mut(channel)?;
        if ch.slot == Slot::Paused {
            ch.slot = Slot::Playing;
            let voice = ch.voice;
            if self.backend.state(voice) == VoiceState::Stopped {
                self.service(channel, true);
            } else {
                self.backend.play(voice);
            }
            tracing::trace!(channel = channel.index(), "channel resumed");
        }
        self.pool.get(channel).map(|_| channel)
    }

    /// Pauses a playing channel. Paused channels are never refilled and
    /// never finish on their own.
    ///
    /// A channel whose voice already finished is left alone; the next
    /// `process()` retires it.
    pub fn pause(&mut self, channel: ChannelHandle) {
        if self.releases.is_pending(channel) || self.has_finished(channel) {
            return;
        }
        if let Some(ch) = self.pool.get_mut(channel) {
            if ch.slot == Slot::Playing {
                ch.slot = Slot::Paused;
                self.backend.pause(ch.voice);
                tracing::trace!(channel = channel.index(), "channel paused");
            }
        }
    }

    /// Stops `channel` and returns it to the pool.
    pub fn stop(&mut self, channel: ChannelHandle) {
        self.release_channel(channel);
    }

    /// Tears `channel` down now if called on the owning thread, otherwise
    /// queues it for the next [`process()`](Self::process).
    pub fn release_channel(&mut self, channel: ChannelHandle) {
        if self.releases.is_owner() {
            self.retire(channel, RetireReason::Stopped);
            return;
        }
        if self.pool.get(channel).is_none() {
            return;
        }
        self.releases.defer(Pending::Channel(channel));
        tracing::trace!(channel = channel.index(), "release deferred to owning thread");
        self.emit(MixerEvent::ReleaseDeferred { channel });
    }

    /// Returns `true` if `channel` is live, not paused and its voice has
    /// not finished.
    pub fn is_playing(&mut self, channel: ChannelHandle) -> bool {
        self.channel_state(channel) == ChannelState::Playing
    }

    /// Returns `true` if `channel` is paused.
    pub fn is_paused(&mut self, channel: ChannelHandle) -> bool {
        self.channel_state(channel) == ChannelState::Paused
    }

    /// Current state of `channel`.
    ///
    /// Queries the voice, so a sound that ended since the last `process()`
    /// already reads as [`ChannelState::Stopped`].
    pub fn channel_state(&mut self, channel: ChannelHandle) -> ChannelState {
        let Some(slot) = self.pool.get(channel).map(|ch| ch.slot) else {
            return ChannelState::Available;
        };
        if self.releases.is_pending(channel) {
            return ChannelState::Stopped;
        }
        match slot {
            Slot::Available => ChannelState::Available,
            Slot::Playing if self.has_finished(channel) => ChannelState::Stopped,
            Slot::Playing => ChannelState::Playing,
            Slot::Paused => ChannelState::Paused,
        }
    }

    /// Sets the channel's linear gain. Negative and non-finite values
    /// become silence.
    pub fn set_volume(&mut self, channel: ChannelHandle, gain: f32) {
        if let Some(ch) = self.pool.get(channel) {
            self.backend.set_gain(ch.voice, sanitize_gain(gain));
        }
    }

    /// Sets how many extra passes the channel plays after the current one.
    ///
    /// `-1` loops forever; anything below is treated as `-1`.
    pub fn set_loop_count(&mut self, channel: ChannelHandle, count: i32) {
        let count = count.max(-1);
        let Some(ch) = self.pool.get_mut(channel) else {
            return;
        };
        ch.loop_count = count;
        let is_static = ch
            .sound
            .as_ref()
            .and_then(|key| self.sounds.get(key.as_str()))
            .and_then(Sound::kind)
            == Some(SoundKind::Static);
        if is_static {
            self.backend.set_looping(ch.voice, count == -1);
        }
    }

    /// Moves the channel in the 2D world; backends derive stereo pan from it.
    pub fn set_world_position(&mut self, channel: ChannelHandle, position: Vec2) {
        if let Some(ch) = self.pool.get(channel) {
            self.backend.set_position(ch.voice, position);
        }
    }

    /// Returns a handle other threads can use to stop channels.
    pub fn release_handle(&self) -> ReleaseHandle {
        ReleaseHandle::new(Arc::clone(&self.releases))
    }

    /// Returns current counters.
    pub fn stats(&self) -> MixerStats {
        MixerStats {
            active_channels: self.pool.active_count(),
            max_channels: self.pool.capacity(),
            pending_releases: self.releases.len(),
            sounds: self.sounds.len(),
            channels_retired: self.channels_retired,
            underruns_recovered: self.underruns_recovered,
            deferred_releases: self.releases.deferred_total(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// The backend, for diagnostics.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, e.g. to advance a simulated clock.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Hardware voice behind a live channel.
    pub fn voice_of(&self, channel: ChannelHandle) -> Option<VoiceId> {
        self.pool.get(channel).map(|ch| ch.voice)
    }

    fn upload_static(&mut self, file: &mut dyn AudioFile) -> Option<(BufferId, SoundFormat)> {
        let format = file.format();
        let mut pcm = vec![0i16; file.size()];
        let mut len = 0;
        while len < pcm.len() {
            let n = file.read(&mut pcm[len..]);
            if n == 0 {
                break;
            }
            len += n;
        }

        let buffer = match self.backend.create_buffers(1) {
            Ok(buffers) => buffers.into_iter().next()?,
            Err(e) => {
                tracing::warn!(error = %e, "no hardware buffer for static sound");
                return None;
            }
        };
        self.backend.upload(buffer, format, &pcm[..len]);
        Some((buffer, format))
    }

    fn start_static(&mut self, handle: ChannelHandle, sound: &SoundKey) -> Option<VoiceId> {
        let entry = self.sounds.get(sound.as_str())?;
        let buffer = entry.static_buffer()?;
        let key = entry.key().clone();
        let ch = self.pool.get_mut(handle)?;
        ch.sound = Some(key);
        ch.loop_count = 0;
        self.backend.attach(ch.voice, Some(buffer));
        self.backend.set_looping(ch.voice, false);
        Some(ch.voice)
    }

    fn start_stream(&mut self, handle: ChannelHandle, sound: &SoundKey) -> Option<VoiceId> {
        let entry = self.sounds.get_mut(sound.as_str())?;
        let key = entry.key().clone();
        let format = entry.format();
        let file = entry.stream_mut()?;
        let ch = self.pool.get_mut(handle)?;
        ch.sound = Some(key);
        ch.loop_count = 0;
        self.backend.attach(ch.voice, None);
        self.backend.set_looping(ch.voice, false);

        let primed = refill::prime(&mut self.backend, ch, file, format, &mut self.scratch);
        if primed.filled == 0 {
            tracing::debug!(sound = %sound, "stream is empty");
            return None;
        }
        Some(ch.voice)
    }

    /// `true` when the channel's voice stopped and nothing will restart it:
    /// a static pass with no loops left or a stream whose tail played out.
    fn has_finished(&mut self, handle: ChannelHandle) -> bool {
        let Some(ch) = self.pool.get(handle) else {
            return false;
        };
        let (voice, loop_count, exhausted) = (ch.voice, ch.loop_count, ch.exhausted);
        if self.backend.state(voice) != VoiceState::Stopped {
            return false;
        }
        match self.backend.kind(voice) {
            VoiceKind::Streaming => exhausted,
            VoiceKind::Static => loop_count <= 0,
            VoiceKind::Undetermined => true,
        }
    }

    fn drain_releases(&mut self) {
        self.releases.drain_into(&mut self.drained);
        let mut drained = std::mem::take(&mut self.drained);
        for entry in drained.drain(..) {
            match entry {
                Pending::Channel(handle) => self.retire(handle, RetireReason::Stopped),
                Pending::Voice(voice) => {
                    if let Some(handle) = self.pool.find_voice(voice) {
                        self.service(handle, false);
                    }
                }
            }
        }
        self.drained = drained;
    }

    /// Advances one channel: restarts or retires finished voices and, when
    /// `refill` is set, tops up a streaming ring.
    fn service(&mut self, handle: ChannelHandle, refill: bool) {
        let Some(ch) = self.pool.get_mut(handle) else {
            return;
        };
        let voice = ch.voice;
        let kind = self.backend.kind(voice);
        let state = self.backend.state(voice);

        if kind != VoiceKind::Streaming {
            if state != VoiceState::Stopped || ch.slot == Slot::Paused {
                return;
            }
            if kind == VoiceKind::Static && ch.loop_count > 0 {
                ch.loop_count -= 1;
                let remaining = ch.loop_count;
                self.backend.play(voice);
                self.emit(MixerEvent::StreamLooped {
                    channel: handle,
                    remaining,
                });
            } else {
                self.retire(handle, RetireReason::Finished);
            }
            return;
        }

        if ch.slot == Slot::Paused || state == VoiceState::Paused {
            return;
        }
        if ch.exhausted {
            if state == VoiceState::Stopped {
                self.retire(handle, RetireReason::Finished);
            }
            return;
        }
        if !refill {
            return;
        }

        let Some(entry) = ch.sound.as_ref().and_then(|k| self.sounds.get_mut(k.as_str())) else {
            return;
        };
        let format = entry.format();
        let Some(file) = entry.stream_mut() else {
            return;
        };
        let outcome = refill::refill(&mut self.backend, ch, file, format, &mut self.scratch);
        let remaining = ch.loop_count;
        let exhausted = ch.exhausted;

        if outcome.loops > 0 {
            tracing::trace!(channel = handle.index(), remaining, "stream looped");
            self.emit(MixerEvent::StreamLooped {
                channel: handle,
                remaining,
            });
        }

        if state != VoiceState::Stopped {
            return;
        }
        // A stopped ring that still holds unplayed buffers restarts too.
        if outcome.filled > 0 || !exhausted {
            while self.backend.processed(voice) > 0 {
                self.backend.unqueue(voice);
            }
            self.backend.play(voice);
            self.underruns_recovered += 1;
            tracing::debug!(channel = handle.index(), "stream underrun, restarted");
            self.emit(MixerEvent::UnderrunRecovered { channel: handle });
        } else if exhausted {
            self.retire(handle, RetireReason::Finished);
        }
    }

    fn retire(&mut self, handle: ChannelHandle, reason: RetireReason) {
        let Some(sound) = self.pool.release(&mut self.backend, handle) else {
            return;
        };
        self.channels_retired += 1;
        tracing::debug!(channel = handle.index(), ?reason, "channel retired");
        self.emit(MixerEvent::ChannelRetired {
            channel: handle,
            sound,
            reason,
        });
    }

    fn emit(&self, event: MixerEvent) {
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }
}

impl<B: Backend> Drop for Mixer<B> {
    fn drop(&mut self) {
        self.clear();
        self.pool.destroy(&mut self.backend);
    }
}

impl<B: Backend> std::fmt::Debug for Mixer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn sanitize_gain(gain: f32) -> f32 {
    if gain.is_finite() && gain > 0.0 {
        gain
    } else {
        0.0
    }
}
