//! Deterministic backend for tests and headless runs.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use super::{Backend, BufferId, CompletionHandler, VoiceId, VoiceKind, VoiceState};
use crate::sound::SoundFormat;
use crate::BackendError;

#[derive(Debug, Default)]
struct SimBuffer {
    format: SoundFormat,
    pcm: Vec<i16>,
}

impl SimBuffer {
    fn frames(&self) -> usize {
        self.pcm.len() / usize::from(self.format.channels.max(1))
    }
}

#[derive(Debug)]
struct SimVoice {
    state: VoiceState,
    attached: Option<BufferId>,
    queue: VecDeque<BufferId>,
    processed: usize,
    cursor: usize,
    gain: f32,
    position: Vec2,
    looping: bool,
}

impl Default for SimVoice {
    fn default() -> Self {
        Self {
            state: VoiceState::Initial,
            attached: None,
            queue: VecDeque::new(),
            processed: 0,
            cursor: 0,
            gain: 1.0,
            position: Vec2::ZERO,
            looping: false,
        }
    }
}

impl SimVoice {
    fn kind(&self) -> VoiceKind {
        if self.attached.is_some() {
            VoiceKind::Static
        } else if self.queue.is_empty() {
            VoiceKind::Undetermined
        } else {
            VoiceKind::Streaming
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.processed = 0;
    }
}

/// A fixed-voice device whose clock only moves when told to.
///
/// Voices consume frames from their attached buffer or queue when
/// [`advance`](Self::advance) is called. Nothing happens in the background,
/// so every test observes an exact, repeatable timeline. Optional voice and
/// buffer ceilings reproduce hardware exhaustion.
///
/// # Example
///
/// ```
/// use stream_mixer::{Backend, SimulatedBackend, SoundFormat, VoiceState};
///
/// let mut backend = SimulatedBackend::new();
/// let voice = backend.create_voices(1).unwrap()[0];
/// let buffer = backend.create_buffers(1).unwrap()[0];
///
/// backend.upload(buffer, SoundFormat::new(1, 8000), &[0; 100]);
/// backend.attach(voice, Some(buffer));
/// backend.play(voice);
///
/// backend.advance(100);
/// assert_eq!(backend.state(voice), VoiceState::Stopped);
/// ```
#[derive(Default)]
pub struct SimulatedBackend {
    voices: BTreeMap<VoiceId, SimVoice>,
    buffers: BTreeMap<BufferId, SimBuffer>,
    next_voice: u32,
    next_buffer: u32,
    voice_limit: Option<usize>,
    buffer_limit: Option<usize>,
    suspended: bool,
    uploads: usize,
    handler: Option<CompletionHandler>,
}

impl SimulatedBackend {
    /// Creates a backend with no resource ceilings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of live voices.
    #[must_use]
    pub fn with_voice_limit(mut self, limit: usize) -> Self {
        self.voice_limit = Some(limit);
        self
    }

    /// Caps the number of live buffers.
    #[must_use]
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    /// Plays `frames` frames on every playing voice.
    ///
    /// Voices that run out of data stop and fire the completion handler,
    /// in voice order, after all voices have advanced. Does nothing while
    /// suspended.
    pub fn advance(&mut self, frames: usize) {
        if self.suspended {
            return;
        }

        let mut finished = Vec::new();
        for (&id, voice) in &mut self.voices {
            if voice.state != VoiceState::Playing {
                continue;
            }
            let drained = match voice.attached {
                Some(buffer) => {
                    let len = self.buffers.get(&buffer).map_or(0, SimBuffer::frames);
                    advance_static(voice, len, frames)
                }
                None => advance_queue(voice, &self.buffers, frames),
            };
            if drained {
                voice.state = VoiceState::Stopped;
                voice.cursor = 0;
                finished.push(id);
            }
        }

        if let Some(handler) = &self.handler {
            for id in finished {
                handler(id);
            }
        }
    }

    /// Number of voices currently allocated.
    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    /// Number of buffers currently allocated.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Total `upload` calls so far.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// State of `voice` without the `&mut` the trait requires.
    pub fn voice_state(&self, voice: VoiceId) -> Option<VoiceState> {
        self.voices.get(&voice).map(|v| v.state)
    }

    /// Gain last set on `voice`.
    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.voices.get(&voice).map(|v| v.gain)
    }

    /// Position last set on `voice`.
    pub fn position(&self, voice: VoiceId) -> Option<Vec2> {
        self.voices.get(&voice).map(|v| v.position)
    }

    /// Whether the attached buffer of `voice` loops.
    pub fn is_looping(&self, voice: VoiceId) -> Option<bool> {
        self.voices.get(&voice).map(|v| v.looping)
    }

    /// Buffers queued on `voice`, processed ones included.
    pub fn queued_len(&self, voice: VoiceId) -> usize {
        self.voices.get(&voice).map_or(0, |v| v.queue.len())
    }

    /// Samples held by `buffer`.
    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        self.buffers.get(&buffer).map(|b| b.pcm.len())
    }

    /// Whether the device is suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

/// Returns `true` when a non-looping voice reached the end of its buffer.
fn advance_static(voice: &mut SimVoice, len: usize, frames: usize) -> bool {
    if len == 0 {
        return !voice.looping;
    }
    voice.cursor += frames;
    if voice.cursor < len {
        return false;
    }
    if voice.looping {
        voice.cursor %= len;
        false
    } else {
        true
    }
}

/// Returns `true` when every queued buffer has been played.
fn advance_queue(
    voice: &mut SimVoice,
    buffers: &BTreeMap<BufferId, SimBuffer>,
    frames: usize,
) -> bool {
    let mut remaining = frames;
    while let Some(id) = voice.queue.get(voice.processed) {
        let len = buffers.get(id).map_or(0, SimBuffer::frames);
        let left = len.saturating_sub(voice.cursor);
        if remaining < left {
            voice.cursor += remaining;
            break;
        }
        remaining -= left;
        voice.cursor = 0;
        voice.processed += 1;
    }
    voice.processed >= voice.queue.len()
}

impl Backend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn create_voices(&mut self, count: usize) -> Result<Vec<VoiceId>, BackendError> {
        if let Some(limit) = self.voice_limit {
            if self.voices.len() + count > limit {
                return Err(BackendError::VoiceLimit { limit });
            }
        }
        let ids: Vec<_> = (0..count)
            .map(|_| {
                let id = VoiceId(self.next_voice);
                self.next_voice += 1;
                id
            })
            .collect();
        for &id in &ids {
            self.voices.insert(id, SimVoice::default());
        }
        Ok(ids)
    }

    fn destroy_voices(&mut self, voices: &[VoiceId]) {
        for id in voices {
            self.voices.remove(id);
        }
    }

    fn create_buffers(&mut self, count: usize) -> Result<Vec<BufferId>, BackendError> {
        if let Some(limit) = self.buffer_limit {
            if self.buffers.len() + count > limit {
                return Err(BackendError::BufferLimit { limit });
            }
        }
        let ids: Vec<_> = (0..count)
            .map(|_| {
                let id = BufferId(self.next_buffer);
                self.next_buffer += 1;
                id
            })
            .collect();
        for &id in &ids {
            self.buffers.insert(id, SimBuffer::default());
        }
        Ok(ids)
    }

    fn destroy_buffers(&mut self, buffers: &[BufferId]) {
        for id in buffers {
            self.buffers.remove(id);
        }
    }

    fn upload(&mut self, buffer: BufferId, format: SoundFormat, pcm: &[i16]) {
        if let Some(slot) = self.buffers.get_mut(&buffer) {
            slot.format = format;
            slot.pcm.clear();
            slot.pcm.extend_from_slice(pcm);
            self.uploads += 1;
        }
    }

    fn attach(&mut self, voice: VoiceId, buffer: Option<BufferId>) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.attached = buffer;
            v.queue.clear();
            v.rewind();
        }
    }

    fn queue(&mut self, voice: VoiceId, buffers: &[BufferId]) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.attached = None;
            v.queue.extend(buffers);
        }
    }

    fn unqueue(&mut self, voice: VoiceId) -> Option<BufferId> {
        let v = self.voices.get_mut(&voice)?;
        if v.processed == 0 {
            return None;
        }
        v.processed -= 1;
        v.queue.pop_front()
    }

    fn processed(&mut self, voice: VoiceId) -> usize {
        self.voices.get(&voice).map_or(0, |v| v.processed)
    }

    fn state(&mut self, voice: VoiceId) -> VoiceState {
        self.voice_state(voice).unwrap_or_default()
    }

    fn kind(&mut self, voice: VoiceId) -> VoiceKind {
        self.voices.get(&voice).map_or(VoiceKind::Undetermined, SimVoice::kind)
    }

    fn play(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            match v.state {
                VoiceState::Playing => {}
                VoiceState::Paused => v.state = VoiceState::Playing,
                VoiceState::Initial | VoiceState::Stopped => {
                    v.rewind();
                    v.state = VoiceState::Playing;
                }
            }
        }
    }

    fn pause(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            if v.state == VoiceState::Playing {
                v.state = VoiceState::Paused;
            }
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.state = VoiceState::Stopped;
            v.cursor = 0;
            v.processed = v.queue.len();
        }
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.gain = gain;
        }
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec2) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.position = position;
        }
    }

    fn set_looping(&mut self, voice: VoiceId, looping: bool) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.looping = looping;
        }
    }

    fn suspend(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    fn set_completion_handler(&mut self, handler: CompletionHandler) {
        self.handler = Some(handler);
    }
}

impl std::fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("voices", &self.voices.len())
            .field("buffers", &self.buffers.len())
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}
