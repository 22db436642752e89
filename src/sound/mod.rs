//! Loaded sounds and the registry that owns them.

mod key;
mod registry;

pub use key::SoundKey;
pub(crate) use registry::SoundRegistry;

use crate::backend::BufferId;
use crate::source::AudioFile;

/// Channel layout and rate of a sound's PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundFormat {
    /// Interleaved channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl SoundFormat {
    /// Creates a new format.
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// 16-bit mono at 11025 Hz, the format of the silent fallback.
    pub fn mono_11k() -> Self {
        Self::new(1, 11025)
    }
}

impl Default for SoundFormat {
    fn default() -> Self {
        Self::mono_11k()
    }
}

/// How a sound's data reaches the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Decoded once into a single hardware buffer; any number of channels
    /// may play it at the same time.
    Static,
    /// Decoded incrementally into each channel's buffer ring; one channel
    /// at most.
    Streaming,
}

enum Backing {
    Unloaded,
    Static(BufferId),
    Streaming(Box<dyn AudioFile>),
}

/// A loaded sound: the identity and data of one path.
///
/// Owned by the mixer; inspect it through [`Mixer::sound()`].
///
/// [`Mixer::sound()`]: crate::Mixer::sound
pub struct Sound {
    key: SoundKey,
    format: SoundFormat,
    backing: Backing,
}

impl Sound {
    pub(crate) fn new(key: SoundKey) -> Self {
        Self {
            key,
            format: SoundFormat::default(),
            backing: Backing::Unloaded,
        }
    }

    /// The key the sound is registered under.
    pub fn key(&self) -> &SoundKey {
        &self.key
    }

    /// Channel count and sample rate of the decoded PCM.
    pub fn format(&self) -> SoundFormat {
        self.format
    }

    /// Static or streaming; `None` until the data has been attached.
    pub fn kind(&self) -> Option<SoundKind> {
        match self.backing {
            Backing::Unloaded => None,
            Backing::Static(_) => Some(SoundKind::Static),
            Backing::Streaming(_) => Some(SoundKind::Streaming),
        }
    }

    pub(crate) fn set_static(&mut self, buffer: BufferId, format: SoundFormat) {
        self.format = format;
        self.backing = Backing::Static(buffer);
    }

    pub(crate) fn set_streaming(&mut self, file: Box<dyn AudioFile>) {
        self.format = file.format();
        self.backing = Backing::Streaming(file);
    }

    pub(crate) fn static_buffer(&self) -> Option<BufferId> {
        match self.backing {
            Backing::Static(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub(crate) fn stream_mut(&mut self) -> Option<&mut dyn AudioFile> {
        match &mut self.backing {
            Backing::Streaming(file) => Some(file.as_mut()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("key", &self.key)
            .field("format", &self.format)
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
