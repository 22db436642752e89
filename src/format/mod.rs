//! Audio format conversion utilities.
//!
//! Used to bring decoded PCM to the format an output device expects:
//! - Sample format conversion (f32 ↔ i16)
//! - Channel mapping (mono, stereo, multi-channel)
//! - Sample rate conversion (linear resampling)

mod convert;
mod resample;

pub use convert::{
    f32_to_i16, i16_slice_to_f32, i16_to_f32, mono_to_stereo, remap_channels, stereo_to_mono,
};
pub use resample::{resample, resample_interleaved, StreamResampler};
