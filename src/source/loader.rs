//! Filesystem loader and the silent fallback file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::source::{AudioFile, AudioLoader, WavFile};
use crate::DecodeError;

const RIFF_SIGNATURE: &[u8; 4] = b"RIFF";
const WAVE_SIGNATURE: &[u8; 4] = b"WAVE";

/// Opens audio files from disk.
///
/// Relative paths are joined onto an optional root directory. The container
/// is detected from the file signature, not the extension.
///
/// # Example
///
/// ```
/// use stream_mixer::FileLoader;
///
/// let loader = FileLoader::with_root("assets/sound").silent_fallback(true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
    silent_fallback: bool,
}

impl FileLoader {
    /// Creates a loader that resolves paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that resolves relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            silent_fallback: false,
        }
    }

    /// Substitutes a [`SilentFile`] for files in an unknown format instead
    /// of failing.
    ///
    /// Missing files still fail.
    #[must_use]
    pub fn silent_fallback(mut self, enabled: bool) -> Self {
        self.silent_fallback = enabled;
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl AudioLoader for FileLoader {
    fn open(&self, path: &str) -> Result<Box<dyn AudioFile>, DecodeError> {
        let resolved = self.resolve(path);
        let mut file = File::open(&resolved).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DecodeError::NotFound {
                path: resolved.clone(),
            },
            _ => DecodeError::io(&resolved, e),
        })?;

        let mut signature = [0u8; 12];
        let is_wav = match file.read_exact(&mut signature) {
            Ok(()) => &signature[0..4] == RIFF_SIGNATURE && &signature[8..12] == WAVE_SIGNATURE,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => false,
            Err(e) => return Err(DecodeError::io(&resolved, e)),
        };

        if is_wav {
            file.seek(SeekFrom::Start(0))
                .map_err(|e| DecodeError::io(&resolved, e))?;
            let wav = WavFile::from_reader(BufReader::new(file))?;
            tracing::debug!(path = %resolved.display(), "opened WAV file");
            return Ok(Box::new(wav));
        }

        if self.silent_fallback {
            tracing::warn!(
                path = %resolved.display(),
                "unrecognized audio format, substituting silence"
            );
            return Ok(Box::new(SilentFile::default()));
        }

        Err(DecodeError::UnsupportedFormat { path: resolved })
    }
}

/// A finite stream of silence.
///
/// Stands in for files that could not be decoded so callers still get a
/// playable sound.
#[derive(Debug, Clone)]
pub struct SilentFile {
    channels: u16,
    rate: u32,
    size: usize,
    position: usize,
}

impl SilentFile {
    /// Creates `size` samples of silence in the given format.
    pub fn new(channels: u16, rate: u32, size: usize) -> Self {
        Self {
            channels,
            rate,
            size,
            position: 0,
        }
    }
}

impl Default for SilentFile {
    /// 2048 mono samples at 11025 Hz.
    fn default() -> Self {
        Self::new(1, 11025, 2048)
    }
}

impl AudioFile for SilentFile {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn rate(&self) -> u32 {
        self.rate
    }

    fn size(&self) -> usize {
        self.size
    }

    fn read(&mut self, dst: &mut [i16]) -> usize {
        let n = dst.len().min(self.size - self.position);
        dst[..n].fill(0);
        self.position += n;
        n
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn seek(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.size {
            return Err(DecodeError::InvalidSeek {
                offset,
                size: self.size,
            });
        }
        self.position = offset;
        Ok(())
    }
}
