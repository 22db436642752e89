//! Runtime events for monitoring channel lifecycle.
//!
//! Events are non-fatal notifications about playback. The mixer keeps
//! running after any event is emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

use crate::channel::ChannelHandle;
use crate::sound::SoundKey;

/// Why a channel went back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// The sound played to the end and had no loops left.
    Finished,
    /// `stop()` or `release_channel()` was called.
    Stopped,
    /// The sound the channel was playing got released.
    SoundReleased,
    /// A newer `play()` of the same streaming sound took over.
    Restarted,
    /// `clear()` released every channel.
    Cleared,
}

/// Runtime events emitted by the mixer.
///
/// # Example
///
/// ```
/// use stream_mixer::MixerEvent;
///
/// fn handle_event(event: MixerEvent) {
///     match event {
///         MixerEvent::ChannelStarted { channel, sound } => {
///             eprintln!("{channel:?} started {sound}");
///         }
///         MixerEvent::ChannelRetired { channel, reason, .. } => {
///             eprintln!("{channel:?} retired: {reason:?}");
///         }
///         MixerEvent::StreamLooped { channel, remaining } => {
///             eprintln!("{channel:?} looped ({remaining} left)");
///         }
///         MixerEvent::UnderrunRecovered { channel } => {
///             eprintln!("{channel:?} starved and was restarted");
///         }
///         MixerEvent::ReleaseDeferred { channel } => {
///             eprintln!("{channel:?} release queued for the owning thread");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum MixerEvent {
    /// A channel was acquired and started playing a sound.
    ChannelStarted {
        /// The channel now playing.
        channel: ChannelHandle,
        /// The sound attached to it.
        sound: SoundKey,
    },

    /// A channel was torn down and returned to the pool.
    ChannelRetired {
        /// The handle that is now stale.
        channel: ChannelHandle,
        /// The sound that was attached, if any.
        sound: Option<SoundKey>,
        /// Why the channel was retired.
        reason: RetireReason,
    },

    /// A sound reached its end and was rewound for another pass.
    StreamLooped {
        /// The looping channel.
        channel: ChannelHandle,
        /// Remaining additional passes (`-1` for infinite).
        remaining: i32,
    },

    /// A streaming channel ran dry before `process()` refilled it and was
    /// restarted.
    ///
    /// Frequent underruns mean `process()` is called too rarely for the
    /// configured ring size.
    UnderrunRecovered {
        /// The channel that starved.
        channel: ChannelHandle,
    },

    /// A release was requested off the owning thread and queued.
    ReleaseDeferred {
        /// The channel awaiting teardown.
        channel: ChannelHandle,
    },
}

/// Callback type for receiving mixer events.
///
/// Register one via [`MixerBuilder::on_event()`].
///
/// [`MixerBuilder::on_event()`]: crate::MixerBuilder::on_event
pub type EventCallback = Arc<dyn Fn(MixerEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use stream_mixer::{event_callback, MixerEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(MixerEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
