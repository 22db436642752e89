//! Synthetic audio files for testing without disk or hardware.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::source::{AudioFile, AudioLoader};
use crate::DecodeError;

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    rewinds: AtomicUsize,
}

/// An in-memory audio file built from generated samples.
///
/// Clones share the sample data and the rewind counter but keep their own
/// read position.
///
/// # Example
///
/// ```
/// use stream_mixer::{AudioFile, MockAudioFile};
///
/// let mut file = MockAudioFile::new(16000, 1)
///     .with_silence(100)
///     .with_sine(440.0, 100);
///
/// assert_eq!(file.size(), 3200);
/// let mut pcm = vec![0i16; 3200];
/// assert_eq!(file.read(&mut pcm), 3200);
/// ```
#[derive(Debug, Clone)]
pub struct MockAudioFile {
    sample_rate: u32,
    channels: u16,
    samples: Arc<[i16]>,
    position: usize,
    fail_after: Option<usize>,
    counters: Arc<Counters>,
}

impl MockAudioFile {
    /// Creates an empty file with the given format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Arc::from(Vec::new()),
            position: 0,
            fail_after: None,
            counters: Arc::default(),
        }
    }

    /// Appends silence for the given duration in milliseconds.
    #[must_use]
    pub fn with_silence(self, duration_ms: u64) -> Self {
        let n = self.samples_for_duration(duration_ms);
        self.extend(std::iter::repeat(0i16).take(n))
    }

    /// Appends a sine wave at `frequency` Hz, same value on every channel.
    #[must_use]
    pub fn with_sine(self, frequency: f64, duration_ms: u64) -> Self {
        let frames = self.samples_for_duration(duration_ms) / usize::from(self.channels);
        let rate = f64::from(self.sample_rate);
        let channels = usize::from(self.channels);
        let wave = (0..frames).flat_map(move |i| {
            let t = i as f64 / rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin();
            std::iter::repeat((value * 32767.0) as i16).take(channels)
        });
        self.extend(wave)
    }

    /// Appends raw interleaved samples.
    #[must_use]
    pub fn with_samples(self, samples: &[i16]) -> Self {
        self.extend(samples.iter().copied())
    }

    /// Makes reads stop short once `samples` samples have been delivered
    /// since the last rewind, as a decoder error would.
    #[must_use]
    pub fn failing_after(mut self, samples: usize) -> Self {
        self.fail_after = Some(samples);
        self
    }

    /// Returns the playback length of the generated samples.
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / usize::from(self.channels.max(1));
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Returns how many times this file (or any clone of it) was rewound.
    pub fn rewinds(&self) -> usize {
        self.counters.rewinds.load(Ordering::SeqCst)
    }

    fn extend(mut self, more: impl Iterator<Item = i16>) -> Self {
        let mut samples = self.samples.to_vec();
        samples.extend(more);
        self.samples = samples.into();
        self
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        let frames = (u64::from(self.sample_rate) * duration_ms / 1000) as usize;
        frames * usize::from(self.channels)
    }

    fn readable_end(&self) -> usize {
        match self.fail_after {
            Some(limit) => limit.min(self.samples.len()),
            None => self.samples.len(),
        }
    }
}

impl AudioFile for MockAudioFile {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn rate(&self) -> u32 {
        self.sample_rate
    }

    fn size(&self) -> usize {
        self.samples.len()
    }

    fn read(&mut self, dst: &mut [i16]) -> usize {
        let end = self.readable_end();
        let start = self.position.min(end);
        let n = dst.len().min(end - start);
        dst[..n].copy_from_slice(&self.samples[start..start + n]);
        self.position = start + n;
        if n < dst.len() && self.fail_after.is_some() {
            tracing::warn!(position = self.position, "mock decode failure");
        }
        n
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.counters.rewinds.fetch_add(1, Ordering::SeqCst);
    }

    fn seek(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.samples.len() {
            return Err(DecodeError::InvalidSeek {
                offset,
                size: self.samples.len(),
            });
        }
        self.position = offset;
        Ok(())
    }
}

/// An [`AudioLoader`] that serves registered [`MockAudioFile`]s.
///
/// Clones share the same table, so a test can keep one clone to register
/// files and inspect open/rewind counts after handing another to the mixer.
///
/// # Example
///
/// ```
/// use stream_mixer::{AudioLoader, MockAudioFile, MockLoader};
///
/// let loader = MockLoader::new();
/// loader.insert("beep.wav", MockAudioFile::new(8000, 1).with_silence(50));
///
/// assert!(loader.open("beep.wav").is_ok());
/// assert!(loader.open("missing.wav").is_err());
/// assert_eq!(loader.opens("beep.wav"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    files: Arc<Mutex<HashMap<String, MockAudioFile>>>,
}

impl MockLoader {
    /// Creates a loader with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `path`, replacing any earlier entry.
    pub fn insert(&self, path: impl Into<String>, file: MockAudioFile) {
        self.files.lock().insert(path.into(), file);
    }

    /// Returns how many times `path` was opened.
    pub fn opens(&self, path: &str) -> usize {
        self.files
            .lock()
            .get(path)
            .map_or(0, |f| f.counters.opens.load(Ordering::SeqCst))
    }

    /// Returns how many times files opened from `path` were rewound.
    pub fn rewinds(&self, path: &str) -> usize {
        self.files.lock().get(path).map_or(0, MockAudioFile::rewinds)
    }
}

impl AudioLoader for MockLoader {
    fn open(&self, path: &str) -> Result<Box<dyn AudioFile>, DecodeError> {
        let files = self.files.lock();
        let template = files.get(path).ok_or_else(|| DecodeError::NotFound {
            path: path.into(),
        })?;
        template.counters.opens.fetch_add(1, Ordering::SeqCst);

        let mut file = template.clone();
        file.position = 0;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_file_silence() {
        let file = MockAudioFile::new(16000, 1).with_silence(100);
        assert_eq!(file.size(), 1600);
        assert!(file.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_mock_file_sine_stereo() {
        let mut file = MockAudioFile::new(48000, 2).with_sine(440.0, 100);
        assert_eq!(file.size(), 9600);

        let mut pcm = vec![0i16; 9600];
        file.read(&mut pcm);
        assert!(pcm.iter().any(|&s| s > 0));
        assert!(pcm.iter().any(|&s| s < 0));
        assert!(pcm.chunks_exact(2).all(|f| f[0] == f[1]));
    }

    #[test]
    fn test_mock_file_duration() {
        let file = MockAudioFile::new(16000, 1).with_silence(500);
        assert_eq!(file.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_mock_file_short_read_at_end() {
        let mut file = MockAudioFile::new(8000, 1).with_samples(&[1, 2, 3, 4, 5]);
        let mut pcm = [0i16; 4];
        assert_eq!(file.read(&mut pcm), 4);
        assert_eq!(pcm, [1, 2, 3, 4]);
        assert_eq!(file.read(&mut pcm), 1);
        assert_eq!(pcm[0], 5);
        assert_eq!(file.read(&mut pcm), 0);

        file.rewind();
        assert_eq!(file.read(&mut pcm), 4);
        assert_eq!(file.rewinds(), 1);
    }

    #[test]
    fn test_mock_file_failure_truncates() {
        let mut file = MockAudioFile::new(8000, 1)
            .with_silence(100)
            .failing_after(10);
        let mut pcm = [0i16; 64];
        assert_eq!(file.read(&mut pcm), 10);
        assert_eq!(file.read(&mut pcm), 0);
    }

    #[test]
    fn test_loader_counts_opens_and_rewinds() {
        let loader = MockLoader::new();
        loader.insert("a.wav", MockAudioFile::new(8000, 1).with_samples(&[1, 2]));

        let mut first = loader.open("a.wav").unwrap();
        let mut second = loader.open("a.wav").unwrap();
        first.rewind();
        second.rewind();

        assert_eq!(loader.opens("a.wav"), 2);
        assert_eq!(loader.rewinds("a.wav"), 2);
        assert_eq!(loader.opens("b.wav"), 0);
    }

    #[test]
    fn test_loader_missing_path() {
        let loader = MockLoader::new();
        assert!(matches!(
            loader.open("ghost.wav"),
            Err(DecodeError::NotFound { .. })
        ));
    }
}
