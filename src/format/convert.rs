//! Sample format and channel conversion.

/// Converts an f32 sample to i16.
///
/// Input should be in the range [-1.0, 1.0]; values outside are clamped.
/// Scales by 32767 so that -1.0 maps to -32767 and the result never
/// overflows.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Converts an i16 sample to f32 in [-1.0, 1.0].
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Batch converts i16 samples to f32.
pub fn i16_slice_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| i16_to_f32(s)).collect()
}

/// Converts stereo samples to mono by averaging channels.
///
/// A trailing half frame is dropped.
pub fn stereo_to_mono(stereo: &[i16]) -> Vec<i16> {
    stereo
        .chunks_exact(2)
        .map(|pair| ((i32::from(pair[0]) + i32::from(pair[1])) / 2) as i16)
        .collect()
}

/// Converts mono samples to stereo by duplicating each sample.
pub fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    mono.iter().flat_map(|&s| [s, s]).collect()
}

/// Maps interleaved PCM from `from` channels to `to` channels.
///
/// - mono fans out to every output channel
/// - multi-channel to mono averages the first two channels
/// - otherwise channels are copied by position; extra outputs are silent
pub fn remap_channels(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    let (from, to) = (usize::from(from.max(1)), usize::from(to.max(1)));
    match (from, to) {
        (f, t) if f == t => samples.to_vec(),
        (1, 2) => mono_to_stereo(samples),
        (1, t) => samples
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(t))
            .collect(),
        (2, 1) => stereo_to_mono(samples),
        (f, 1) => samples
            .chunks_exact(f)
            .map(|frame| ((i32::from(frame[0]) + i32::from(frame[1])) / 2) as i16)
            .collect(),
        (f, t) => {
            let mut out = Vec::with_capacity(samples.len() / f * t);
            for frame in samples.chunks_exact(f) {
                out.extend((0..t).map(|c| frame.get(c).copied().unwrap_or(0)));
            }
            out
        }
    }
}
