//! Hardware voice abstraction.
//!
//! A [`Backend`] exposes the primitives of a fixed-voice audio API: voices
//! that play either one attached buffer or a FIFO queue of buffers, plus
//! gain, position and looping controls. The mixer drives everything from
//! its owning thread; backends may only call back through the
//! [`CompletionHandler`], which can fire on any thread.
//!
//! Two backends ship with the crate:
//!
//! - [`CpalBackend`]: real output through CPAL, one stream per voice
//! - [`SimulatedBackend`]: deterministic, clock-driven, for tests and CI

mod device;
mod simulated;

pub use device::{default_output_device_name, list_output_devices, CpalBackend};
pub use simulated::SimulatedBackend;

use std::sync::Arc;

use glam::Vec2;

use crate::sound::SoundFormat;
use crate::BackendError;

/// Opaque identifier of a hardware voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u32);

/// Opaque identifier of a hardware buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Playback state of a voice as the hardware reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// Never played since creation or the last rewind.
    #[default]
    Initial,
    /// Consuming samples.
    Playing,
    /// Paused mid-buffer.
    Paused,
    /// Ran out of data or was stopped.
    Stopped,
}

/// What the voice is currently fed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceKind {
    /// Nothing attached or queued.
    #[default]
    Undetermined,
    /// A single attached buffer.
    Static,
    /// A queue of buffers.
    Streaming,
}

/// Callback fired when a voice stops on its own.
///
/// Backends may invoke it from a real-time audio thread, so it must not
/// block or touch the mixer directly. Use it to enqueue work onto a
/// [`ReleaseHandle`](crate::ReleaseHandle).
pub type CompletionHandler = Arc<dyn Fn(VoiceId) + Send + Sync>;

/// A fixed-voice audio device.
///
/// Every method is called from the mixer's owning thread.
///
/// # Implementation Notes
///
/// - `create_voices` and `create_buffers` are all-or-nothing: on error no
///   resources may be left allocated.
/// - Operations on unknown ids are ignored.
/// - `stop` marks every queued buffer processed so a following `unqueue`
///   loop can reclaim them.
/// - A streaming voice that drains its queue goes to `Stopped` and fires
///   the completion handler. So does a non-looping static voice that
///   reaches the end of its buffer.
pub trait Backend {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Creates `count` voices.
    fn create_voices(&mut self, count: usize) -> Result<Vec<VoiceId>, BackendError>;

    /// Destroys voices, stopping them first.
    fn destroy_voices(&mut self, voices: &[VoiceId]);

    /// Creates `count` empty buffers.
    fn create_buffers(&mut self, count: usize) -> Result<Vec<BufferId>, BackendError>;

    /// Destroys buffers.
    fn destroy_buffers(&mut self, buffers: &[BufferId]);

    /// Replaces the contents of `buffer` with 16-bit interleaved PCM.
    fn upload(&mut self, buffer: BufferId, format: SoundFormat, pcm: &[i16]);

    /// Attaches a single buffer to `voice`, or detaches with `None`.
    ///
    /// Attaching clears the voice's queue.
    fn attach(&mut self, voice: VoiceId, buffer: Option<BufferId>);

    /// Appends buffers to the voice's queue.
    fn queue(&mut self, voice: VoiceId, buffers: &[BufferId]);

    /// Removes the oldest processed buffer from the voice's queue.
    fn unqueue(&mut self, voice: VoiceId) -> Option<BufferId>;

    /// Number of queued buffers the voice has finished playing.
    fn processed(&mut self, voice: VoiceId) -> usize;

    /// Current playback state.
    fn state(&mut self, voice: VoiceId) -> VoiceState;

    /// Current source kind.
    fn kind(&mut self, voice: VoiceId) -> VoiceKind;

    /// Starts or resumes playback. Restarts a stopped voice from the front.
    fn play(&mut self, voice: VoiceId);

    /// Pauses playback.
    fn pause(&mut self, voice: VoiceId);

    /// Stops playback.
    fn stop(&mut self, voice: VoiceId);

    /// Sets linear gain.
    fn set_gain(&mut self, voice: VoiceId, gain: f32);

    /// Sets the voice's position in the 2D world.
    fn set_position(&mut self, voice: VoiceId, position: Vec2);

    /// Makes an attached buffer restart automatically at its end.
    fn set_looping(&mut self, voice: VoiceId, looping: bool);

    /// Suspends or resumes the whole device.
    fn suspend(&mut self, suspended: bool);

    /// Installs the handler fired when a voice stops on its own.
    fn set_completion_handler(&mut self, handler: CompletionHandler);
}
