//! WAV decoding through `hound`.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::format::f32_to_i16;
use crate::source::AudioFile;
use crate::DecodeError;

/// How samples are stored in the file.
#[derive(Debug, Clone, Copy)]
enum Encoding {
    /// 8..16-bit integer samples, shifted up to 16 bits.
    Narrow { shift: u16 },
    /// 24/32-bit integer samples, shifted down to 16 bits.
    Wide { shift: u16 },
    /// 32-bit float samples.
    Float,
}

/// A WAV file decoded incrementally.
///
/// Integer and float encodings are accepted; everything is converted to
/// 16-bit samples on read.
///
/// # Example
///
/// ```no_run
/// use stream_mixer::{AudioFile, WavFile};
///
/// let mut file = WavFile::open("music/theme.wav")?;
/// let mut pcm = vec![0i16; file.size()];
/// let read = file.read(&mut pcm);
/// assert_eq!(read, pcm.len());
/// # Ok::<(), stream_mixer::DecodeError>(())
/// ```
pub struct WavFile<R: Read + Seek = BufReader<File>> {
    reader: WavReader<R>,
    encoding: Encoding,
    position: usize,
}

impl WavFile {
    /// Opens and parses the header of the WAV file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Wav` if the header is malformed or the file can't be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let reader = WavReader::open(path)?;
        Ok(Self::from_wav_reader(reader))
    }
}

impl<R: Read + Seek> WavFile<R> {
    /// Parses a WAV stream from any seekable reader.
    ///
    /// # Errors
    ///
    /// Returns `Wav` if the header is malformed.
    pub fn from_reader(reader: R) -> Result<Self, DecodeError> {
        let reader = WavReader::new(reader)?;
        Ok(Self::from_wav_reader(reader))
    }

    fn from_wav_reader(reader: WavReader<R>) -> Self {
        let spec = reader.spec();
        let encoding = match spec.sample_format {
            SampleFormat::Float => Encoding::Float,
            SampleFormat::Int if spec.bits_per_sample <= 16 => Encoding::Narrow {
                shift: 16 - spec.bits_per_sample.max(1),
            },
            SampleFormat::Int => Encoding::Wide {
                shift: spec.bits_per_sample - 16,
            },
        };
        Self {
            reader,
            encoding,
            position: 0,
        }
    }

    fn read_narrow(&mut self, dst: &mut [i16], shift: u16) -> usize {
        let mut written = 0;
        for (slot, sample) in dst.iter_mut().zip(self.reader.samples::<i16>()) {
            match sample {
                Ok(value) => *slot = value << shift,
                Err(e) => {
                    tracing::warn!(error = %e, "WAV decode failed, ending stream");
                    break;
                }
            }
            written += 1;
        }
        written
    }

    fn read_wide(&mut self, dst: &mut [i16], shift: u16) -> usize {
        let mut written = 0;
        for (slot, sample) in dst.iter_mut().zip(self.reader.samples::<i32>()) {
            match sample {
                Ok(value) => *slot = (value >> shift) as i16,
                Err(e) => {
                    tracing::warn!(error = %e, "WAV decode failed, ending stream");
                    break;
                }
            }
            written += 1;
        }
        written
    }

    fn read_float(&mut self, dst: &mut [i16]) -> usize {
        let mut written = 0;
        for (slot, sample) in dst.iter_mut().zip(self.reader.samples::<f32>()) {
            match sample {
                Ok(value) => *slot = f32_to_i16(value),
                Err(e) => {
                    tracing::warn!(error = %e, "WAV decode failed, ending stream");
                    break;
                }
            }
            written += 1;
        }
        written
    }
}

impl<R: Read + Seek + Send> AudioFile for WavFile<R> {
    fn channels(&self) -> u16 {
        self.reader.spec().channels
    }

    fn rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    fn size(&self) -> usize {
        self.reader.len() as usize
    }

    fn read(&mut self, dst: &mut [i16]) -> usize {
        let written = match self.encoding {
            Encoding::Narrow { shift } => self.read_narrow(dst, shift),
            Encoding::Wide { shift } => self.read_wide(dst, shift),
            Encoding::Float => self.read_float(dst),
        };
        self.position += written;
        written
    }

    fn rewind(&mut self) {
        if let Err(e) = self.seek(0) {
            tracing::warn!(error = %e, "WAV rewind failed");
        }
    }

    fn seek(&mut self, offset: usize) -> Result<(), DecodeError> {
        let size = self.size();
        if offset > size {
            return Err(DecodeError::InvalidSeek { offset, size });
        }
        let channels = usize::from(self.channels().max(1));
        let frame = offset / channels;
        self.reader
            .seek(frame as u32)
            .map_err(|e| DecodeError::Wav(hound::Error::IoError(e)))?;
        self.position = frame * channels;
        Ok(())
    }
}
