//! Builder pattern for `Mixer`.

use std::marker::PhantomData;

use crate::backend::Backend;
use crate::source::{AudioLoader, FileLoader};
use crate::{event_callback, EventCallback, Mixer, MixerConfig, MixerError, MixerEvent};

/// Builder for configuring a [`Mixer`].
///
/// Use [`Mixer::builder()`] to create one. The backend type is fixed by
/// whichever backend [`start()`](Self::start) or [`build()`](Self::build)
/// receives.
///
/// # Example
///
/// ```
/// use stream_mixer::{FileLoader, Mixer, SimulatedBackend};
///
/// let mixer = Mixer::builder()
///     .max_channels(8)
///     .loader(FileLoader::with_root("assets/sound"))
///     .on_event(|e| tracing::debug!(?e, "mixer event"))
///     .start(SimulatedBackend::new())?;
///
/// assert_eq!(mixer.stats().max_channels, 8);
/// # Ok::<(), stream_mixer::MixerError>(())
/// ```
#[must_use]
pub struct MixerBuilder<B> {
    config: MixerConfig,
    loader: Box<dyn AudioLoader>,
    on_event: Option<EventCallback>,
    backend: PhantomData<fn() -> B>,
}

impl<B: Backend> MixerBuilder<B> {
    /// Creates a builder with default configuration and a [`FileLoader`].
    pub fn new() -> Self {
        Self {
            config: MixerConfig::default(),
            loader: Box::new(FileLoader::new()),
            on_event: None,
            backend: PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: MixerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of channels [`start()`](Self::start) allocates.
    pub fn max_channels(mut self, max_channels: usize) -> Self {
        self.config.max_channels = max_channels;
        self
    }

    /// Sets the number of buffers in each streaming ring.
    pub fn buffers_per_channel(mut self, buffers: usize) -> Self {
        self.config.buffers_per_channel = buffers;
        self
    }

    /// Sets the number of samples decoded per streaming buffer.
    pub fn stream_buffer_samples(mut self, samples: usize) -> Self {
        self.config.stream_buffer_samples = samples;
        self
    }

    /// Sets the loader used by `load_sound` and `load_stream`.
    pub fn loader(mut self, loader: impl AudioLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Registers a callback for mixer events.
    ///
    /// The callback runs synchronously on whichever thread triggered the
    /// event, usually the owning thread inside `process()`.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(MixerEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(event_callback(callback));
        self
    }

    /// Builds an uninitialized mixer owned by the calling thread.
    pub fn build(self, backend: B) -> Mixer<B> {
        Mixer::from_parts(backend, self.config, self.loader, self.on_event)
    }

    /// Builds the mixer and initializes it with the configured channel
    /// count.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Mixer::initialize()`].
    pub fn start(self, backend: B) -> Result<Mixer<B>, MixerError> {
        let max_channels = self.config.max_channels;
        let mut mixer = self.build(backend);
        mixer.initialize(max_channels)?;
        Ok(mixer)
    }
}

impl<B: Backend> Default for MixerBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}
