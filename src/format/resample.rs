//! Sample rate conversion.
//!
//! Linear interpolation: fast and good enough for game audio played back
//! at a device rate close to the source rate.

/// Resamples mono audio from `from_rate` to `to_rate`.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx >= last {
                return samples[last];
            }
            let frac = src_pos - idx as f64;
            let s1 = f64::from(samples[idx]);
            let s2 = f64::from(samples[idx + 1]);
            (s1 + (s2 - s1) * frac) as i16
        })
        .collect()
}

/// Resamples interleaved audio with `channels` channels.
///
/// Each channel is resampled on its own; a trailing partial frame is
/// dropped.
pub fn resample_interleaved(samples: &[i16], channels: u16, from_rate: u32, to_rate: u32) -> Vec<i16> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return resample(samples, from_rate, to_rate);
    }
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let planes: Vec<Vec<i16>> = (0..channels)
        .map(|c| {
            let plane: Vec<i16> = samples
                .chunks_exact(channels)
                .map(|frame| frame[c])
                .collect();
            resample(&plane, from_rate, to_rate)
        })
        .collect();

    let frames = planes.first().map_or(0, Vec::len);
    let mut output = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        output.extend(planes.iter().map(|plane| plane[i]));
    }
    output
}

/// Linear resampler for a stream fed in consecutive chunks.
///
/// Keeps the interpolation phase and the last frame of the previous chunk,
/// so chunk boundaries neither click nor drift. The final fractional frame
/// of a stream is carried over rather than emitted.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    channels: usize,
    from_rate: u32,
    to_rate: u32,
    /// Source position of the next output frame, relative to the first
    /// frame of the next chunk. Never below `-1.0`.
    phase: f64,
    /// Last frame of the previous chunk; empty at stream start.
    prev: Vec<i16>,
}

impl StreamResampler {
    /// Creates a resampler for interleaved audio with `channels` channels.
    pub fn new(channels: u16, from_rate: u32, to_rate: u32) -> Self {
        Self {
            channels: usize::from(channels.max(1)),
            from_rate,
            to_rate,
            phase: 0.0,
            prev: Vec::new(),
        }
    }

    /// Returns `true` if this resampler converts exactly this layout.
    pub fn converts(&self, channels: u16, from_rate: u32, to_rate: u32) -> bool {
        self.channels == usize::from(channels.max(1))
            && self.from_rate == from_rate
            && self.to_rate == to_rate
    }

    /// Forgets the previous chunk; the next chunk starts a new stream.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.prev.clear();
    }

    /// Resamples the next chunk of the stream. A trailing partial frame is
    /// dropped.
    pub fn process(&mut self, samples: &[i16]) -> Vec<i16> {
        if self.to_rate == 0 {
            return Vec::new();
        }
        if self.from_rate == self.to_rate || self.from_rate == 0 {
            return samples.to_vec();
        }

        let channels = self.channels;
        let frames = samples.len() / channels;
        if frames == 0 {
            return Vec::new();
        }

        let mut frames_in = Vec::with_capacity(self.prev.len() + frames * channels);
        frames_in.extend_from_slice(&self.prev);
        frames_in.extend_from_slice(&samples[..frames * channels]);
        let total = frames_in.len() / channels;

        let step = f64::from(self.from_rate) / f64::from(self.to_rate);
        let mut pos = self.phase + (self.prev.len() / channels) as f64;
        let mut output = Vec::with_capacity(((frames as f64 / step).ceil() as usize + 1) * channels);
        loop {
            let idx = pos.floor() as usize;
            if idx + 1 >= total {
                break;
            }
            let frac = pos - idx as f64;
            let a = &frames_in[idx * channels..(idx + 1) * channels];
            let b = &frames_in[(idx + 1) * channels..(idx + 2) * channels];
            output.extend(a.iter().zip(b).map(|(&s1, &s2)| {
                let (s1, s2) = (f64::from(s1), f64::from(s2));
                (s1 + (s2 - s1) * frac) as i16
            }));
            pos += step;
        }

        self.phase = pos - total as f64;
        self.prev.clear();
        self.prev.extend_from_slice(&frames_in[(total - 1) * channels..]);
        output
    }
}
