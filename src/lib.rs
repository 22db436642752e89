//! # stream-mixer
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Fixed-channel audio playback with streaming buffer refill.
//!
//! `stream-mixer` drives a small, fixed pool of hardware voices. Short
//! sounds are decoded once into a static buffer; long ones are streamed
//! through a ring of buffers that [`Mixer::process()`] refills every tick.
//! Channels can be stopped from any thread without touching the hardware
//! off the owning thread.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stream_mixer::{CpalBackend, FileLoader, Mixer};
//!
//! let mut mixer = Mixer::builder()
//!     .max_channels(16)
//!     .loader(FileLoader::with_root("assets/sound"))
//!     .on_event(|e| tracing::debug!(?e, "mixer event"))
//!     .start(CpalBackend::open_default()?)?;
//!
//! let music = mixer.load_stream("music/theme.wav").unwrap();
//! let channel = mixer.play(&music).unwrap();
//! mixer.set_loop_count(channel, -1);
//!
//! loop {
//!     // once per frame
//!     mixer.process();
//! #   break;
//! }
//! # Ok::<(), stream_mixer::MixerError>(())
//! ```
//!
//! ## Architecture
//!
//! The crate keeps a strict thread boundary:
//!
//! - **Owning thread**: the thread that created the [`Mixer`]. Only it
//!   touches the channel pool and the backend.
//! - **Release queue**: a short lock-guarded list where other threads and
//!   backend callbacks park teardown requests ([`ReleaseHandle`]).
//! - **Device callbacks**: [`CpalBackend`] renders voices on CPAL's
//!   real-time threads and exchanges commands and reports with the owning
//!   thread over lock-free ring buffers.
//!
//! A channel whose release is queued reads as [`ChannelState::Stopped`]
//! until the next `process()` returns it to the pool.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

pub mod backend;
mod builder;
mod channel;
mod config;
mod error;
mod event;
pub mod format;
mod mixer;
mod sound;
pub mod source;

pub use backend::{
    default_output_device_name, list_output_devices, Backend, BufferId, CompletionHandler,
    CpalBackend, SimulatedBackend, VoiceId, VoiceKind, VoiceState,
};
pub use builder::MixerBuilder;
pub use channel::{ChannelHandle, ChannelState, ReleaseHandle};
pub use config::MixerConfig;
pub use error::{BackendError, DecodeError, MixerError};
pub use event::{event_callback, EventCallback, MixerEvent, RetireReason};
pub use mixer::{Mixer, MixerStats};
pub use sound::{Sound, SoundFormat, SoundKey, SoundKind};
pub use source::{AudioFile, AudioLoader, FileLoader, MockAudioFile, MockLoader, SilentFile, WavFile};

pub use glam::Vec2;
