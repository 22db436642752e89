//! Configuration types for the mixer.

use crate::MixerError;

/// Configuration for mixer behavior.
///
/// Use [`MixerConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use stream_mixer::MixerConfig;
///
/// let config = MixerConfig {
///     max_channels: 8,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MixerConfig {
    /// Number of hardware channels allocated by [`Mixer::initialize()`].
    ///
    /// This is a hard ceiling: the pool never grows past it.
    /// Default: 16
    ///
    /// [`Mixer::initialize()`]: crate::Mixer::initialize
    pub max_channels: usize,

    /// Hardware buffers in each streaming channel's refill ring.
    ///
    /// More buffers tolerate longer gaps between `process()` calls at the
    /// cost of latency when a stream starts. Must be at least 2.
    /// Default: 3
    pub buffers_per_channel: usize,

    /// Samples (not frames) decoded into each streaming buffer per refill.
    ///
    /// Default: 4096 (8 KiB of 16-bit PCM)
    pub stream_buffer_samples: usize,

    /// Gain applied to a channel when playback starts.
    ///
    /// Default: 1.0
    pub default_volume: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            max_channels: 16,
            buffers_per_channel: 3,
            stream_buffer_samples: 4096,
            default_volume: 1.0,
        }
    }
}

impl MixerConfig {
    /// Checks that the configuration can back a channel pool.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for zero channels, fewer than two buffers per
    /// channel, or an empty stream buffer.
    pub fn validate(&self) -> Result<(), MixerError> {
        if self.max_channels == 0 {
            return Err(MixerError::invalid_config(
                "max_channels must be at least 1",
            ));
        }
        if self.buffers_per_channel < 2 {
            return Err(MixerError::invalid_config(
                "buffers_per_channel must be at least 2",
            ));
        }
        if self.stream_buffer_samples == 0 {
            return Err(MixerError::invalid_config(
                "stream_buffer_samples must be non-zero",
            ));
        }
        Ok(())
    }
}
