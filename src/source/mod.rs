//! Decoded PCM sources.
//!
//! The mixer never parses containers itself. It pulls 16-bit interleaved PCM
//! from an [`AudioFile`], which an [`AudioLoader`] opens by path:
//!
//! - [`FileLoader`]: resolves paths on disk and decodes WAV via `hound`
//! - [`MockLoader`]: serves synthetic in-memory audio for tests and CI
//!
//! Implement [`AudioLoader`] to plug in other codecs or asset archives.

mod loader;
mod mock;
mod wav;

pub use loader::{FileLoader, SilentFile};
pub use mock::{MockAudioFile, MockLoader};
pub use wav::WavFile;

use crate::sound::SoundFormat;
use crate::DecodeError;

/// An open, decodable audio stream.
///
/// Samples are 16-bit signed PCM, interleaved by channel. Offsets and sizes
/// are counted in samples, not frames or bytes.
///
/// # Implementation Notes
///
/// - `read` fills as much of `dst` as it can and returns the number of
///   samples written. A short read means the end of the stream.
/// - Decode failures in `read` must not panic: log them and return the
///   samples decoded so far. The mixer treats them as end-of-stream.
/// - `rewind` must make the next `read` start at the first sample again.
pub trait AudioFile: Send {
    /// Number of interleaved channels (1 = mono, 2 = stereo).
    fn channels(&self) -> u16;

    /// Sample rate in Hz.
    fn rate(&self) -> u32;

    /// Total decoded size in samples, across all channels.
    fn size(&self) -> usize;

    /// Decodes up to `dst.len()` samples into `dst`.
    fn read(&mut self, dst: &mut [i16]) -> usize;

    /// Moves the read position back to the start of the stream.
    fn rewind(&mut self);

    /// Moves the read position to `offset` samples from the start.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSeek` if `offset` lies past the end of the stream.
    fn seek(&mut self, offset: usize) -> Result<(), DecodeError>;

    /// Returns the channel count and sample rate as a [`SoundFormat`].
    fn format(&self) -> SoundFormat {
        SoundFormat::new(self.channels(), self.rate())
    }
}

/// Opens [`AudioFile`]s by path.
///
/// # Example
///
/// ```
/// use stream_mixer::{AudioFile, AudioLoader, DecodeError, SilentFile};
///
/// struct SilenceLoader;
///
/// impl AudioLoader for SilenceLoader {
///     fn open(&self, _path: &str) -> Result<Box<dyn AudioFile>, DecodeError> {
///         Ok(Box::new(SilentFile::default()))
///     }
/// }
/// ```
pub trait AudioLoader: Send {
    /// Opens the audio file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the path cannot be resolved or the
    /// file is not a supported format.
    fn open(&self, path: &str) -> Result<Box<dyn AudioFile>, DecodeError>;
}
