//! Error types for stream-mixer.
//!
//! Errors are split into three categories:
//! - **Fatal errors** ([`MixerError`]): Prevent the mixer from initializing
//! - **Decode errors** ([`DecodeError`]): A sound could not be opened; the
//!   load call returns `None` and playback of other sounds continues
//! - **Backend errors** ([`BackendError`]): Hardware refused a resource
//!
//! Expected conditions (no free channel, unknown sound, stale handle) are
//! not errors at all and surface as `None`.

use std::path::PathBuf;

/// Fatal errors that prevent the mixer from initializing.
///
/// These are returned from [`Mixer::initialize()`] and from the device
/// constructors of [`CpalBackend`]. A mixer that failed to initialize stays
/// silent: every playback call becomes a no-op.
///
/// [`Mixer::initialize()`]: crate::Mixer::initialize
/// [`CpalBackend`]: crate::backend::CpalBackend
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// No default output device is configured on this system.
    #[error("no default output device configured")]
    NoDefaultDevice,

    /// The requested output device was not found.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name of the device that wasn't found.
        name: String,
    },

    /// The backend could not create the requested number of voices.
    #[error("failed to allocate {requested} voices: {source}")]
    VoiceAllocation {
        /// Number of voices requested.
        requested: usize,
        /// The underlying backend error.
        #[source]
        source: BackendError,
    },

    /// The backend could not create the per-channel buffer ring.
    #[error("failed to allocate {requested} buffers: {source}")]
    BufferAllocation {
        /// Number of buffers requested.
        requested: usize,
        /// The underlying backend error.
        #[source]
        source: BackendError,
    },

    /// `initialize()` was called on an already initialized mixer.
    #[error("mixer is already initialized")]
    AlreadyInitialized,

    /// The configuration is unusable.
    #[error("invalid mixer configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    Backend(String),
}

impl MixerError {
    /// Creates an invalid configuration error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors raised while opening or seeking an [`AudioFile`](crate::AudioFile).
///
/// Read failures in the middle of a stream are not reported through this
/// type: a failing read ends the stream instead.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No file exists at the resolved path.
    #[error("audio file not found: {path}")]
    NotFound {
        /// The resolved path.
        path: PathBuf,
    },

    /// File I/O error.
    #[error("file error: {path}: {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file signature does not match any supported codec.
    #[error("unsupported audio format: {path}")]
    UnsupportedFormat {
        /// Path to the file.
        path: PathBuf,
    },

    /// The WAV decoder rejected the file.
    #[error("wav decode error: {0}")]
    Wav(#[from] hound::Error),

    /// A seek went past the end of the stream.
    #[error("seek to sample {offset} is out of range (size: {size})")]
    InvalidSeek {
        /// Requested sample offset.
        offset: usize,
        /// Total samples in the stream.
        size: usize,
    },

    /// Custom error for user-implemented loaders.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Creates a custom decode error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors reported by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The hardware voice ceiling was reached.
    #[error("voice limit reached ({limit})")]
    VoiceLimit {
        /// Maximum voices the hardware provides.
        limit: usize,
    },

    /// The hardware buffer ceiling was reached.
    #[error("buffer limit reached ({limit})")]
    BufferLimit {
        /// Maximum buffers the hardware provides.
        limit: usize,
    },

    /// The device refused to build or start an output stream.
    #[error("output stream error: {0}")]
    Stream(String),
}
