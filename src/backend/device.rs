//! CPAL output backend.
//!
//! Every voice owns one CPAL output stream. The owning thread sends
//! [`VoiceCommand`]s to the stream's callback over a lock-free SPSC ring
//! and reads [`VoiceReport`]s back over another; the callback never waits
//! on the owning thread.
//!
//! Buffers are converted to the device's channel layout, rate and sample
//! type before they reach a callback, so the callback only copies and
//! scales. A static buffer is converted once, on first attach. Queued
//! stream buffers go through the voice's own resampler so consecutive
//! chunks join without seams.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, OnceLock};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig as CpalStreamConfig};
use glam::Vec2;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{Backend, BufferId, CompletionHandler, VoiceId, VoiceKind, VoiceState};
use crate::format::{i16_slice_to_f32, remap_channels, resample_interleaved, StreamResampler};
use crate::sound::SoundFormat;
use crate::{BackendError, MixerError};

/// Commands in flight to one voice's callback.
const COMMAND_CAPACITY: usize = 64;
/// Reports in flight back from one callback.
const REPORT_CAPACITY: usize = 64;
/// Buffers a voice can hold queued without reallocating in the callback.
const QUEUE_CAPACITY: usize = 16;
/// Voice ceiling when none is configured.
const DEFAULT_MAX_VOICES: usize = 32;

/// Owning thread → callback.
enum VoiceCommand {
    Attach(Option<Arc<[f32]>>),
    Queue(Arc<[f32]>),
    Play,
    Pause,
    Stop,
    Gain(f32),
    Pan(f32),
    Looping(bool),
}

/// Callback → owning thread.
///
/// Tagged with the epoch they were produced in so the owning thread can
/// drop reports that predate its last `stop`/`attach`/`play`.
#[derive(Debug, Clone, Copy)]
enum VoiceReport {
    /// One queued buffer finished.
    Processed { queue_gen: u32 },
    /// The voice ran out of data and stopped.
    Drained { run: u32 },
}

/// Callback-side state of one voice.
struct Renderer {
    voice: VoiceId,
    channels: usize,
    commands: HeapCons<VoiceCommand>,
    reports: HeapProd<VoiceReport>,
    handler: Arc<OnceLock<CompletionHandler>>,
    attached: Option<Arc<[f32]>>,
    queue: VecDeque<Arc<[f32]>>,
    cursor: usize,
    playing: bool,
    looping: bool,
    gain: f32,
    left: f32,
    right: f32,
    queue_gen: u32,
    run: u32,
}

impl Renderer {
    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                VoiceCommand::Attach(buffer) => {
                    self.attached = buffer;
                    self.queue.clear();
                    self.cursor = 0;
                    self.queue_gen = self.queue_gen.wrapping_add(1);
                }
                VoiceCommand::Queue(buffer) => {
                    self.attached = None;
                    self.queue.push_back(buffer);
                }
                VoiceCommand::Play => {
                    self.run = self.run.wrapping_add(1);
                    self.playing = true;
                }
                VoiceCommand::Pause => self.playing = false,
                VoiceCommand::Stop => {
                    self.playing = false;
                    self.queue.clear();
                    self.cursor = 0;
                    self.queue_gen = self.queue_gen.wrapping_add(1);
                }
                VoiceCommand::Gain(gain) => self.gain = gain,
                VoiceCommand::Pan(pan) => {
                    self.left = (1.0 - pan).min(1.0);
                    self.right = (1.0 + pan).min(1.0);
                }
                VoiceCommand::Looping(looping) => self.looping = looping,
            }
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        self.apply_commands();
        out.fill(0.0);
        if !self.playing {
            return;
        }

        let channels = self.channels;
        for frame in out.chunks_exact_mut(channels) {
            if !self.advance_to_data() {
                self.finish();
                return;
            }
            let source = match &self.attached {
                Some(buffer) => buffer,
                None => &self.queue[0],
            };
            let samples = &source[self.cursor..self.cursor + channels];
            for (c, (dst, &src)) in frame.iter_mut().zip(samples).enumerate() {
                let pan = match c {
                    0 if channels > 1 => self.left,
                    1 => self.right,
                    _ => 1.0,
                };
                *dst = src * self.gain * pan;
            }
            self.cursor += channels;
        }
    }

    /// Skips finished buffers; `false` once nothing is left to play.
    fn advance_to_data(&mut self) -> bool {
        let channels = self.channels;
        if let Some(buffer) = &self.attached {
            if self.cursor + channels <= buffer.len() {
                return true;
            }
            if self.looping && buffer.len() >= channels {
                self.cursor = 0;
                return true;
            }
            return false;
        }
        while let Some(front) = self.queue.front() {
            if self.cursor + channels <= front.len() {
                return true;
            }
            self.queue.pop_front();
            self.cursor = 0;
            let report = VoiceReport::Processed {
                queue_gen: self.queue_gen,
            };
            if self.reports.try_push(report).is_err() {
                tracing::warn!(voice = self.voice.0, "voice report queue full");
            }
        }
        false
    }

    fn finish(&mut self) {
        self.playing = false;
        self.cursor = 0;
        if self.reports.try_push(VoiceReport::Drained { run: self.run }).is_err() {
            tracing::warn!(voice = self.voice.0, "voice report queue full");
        }
        if let Some(handler) = self.handler.get() {
            handler(self.voice);
        }
    }
}

/// Owning-thread side of one voice.
/// Uploaded PCM as decoded, plus its device rendition once attached.
#[derive(Default)]
struct StoredBuffer {
    format: Option<SoundFormat>,
    pcm: Vec<i16>,
    converted: Option<Arc<[f32]>>,
}

struct VoiceSlot {
    stream: Stream,
    commands: HeapProd<VoiceCommand>,
    reports: HeapCons<VoiceReport>,
    state: VoiceState,
    attached: Option<BufferId>,
    queue: VecDeque<BufferId>,
    processed: usize,
    queue_gen: u32,
    run: u32,
    /// Carries interpolation state between the stream chunks queued here.
    resampler: Option<StreamResampler>,
}

impl VoiceSlot {
    fn send(&mut self, command: VoiceCommand) {
        if self.commands.try_push(command).is_err() {
            tracing::warn!("voice command queue full, command dropped");
        }
    }

    fn pump_reports(&mut self) {
        while let Some(report) = self.reports.try_pop() {
            match report {
                VoiceReport::Processed { queue_gen } if queue_gen == self.queue_gen => {
                    self.processed = (self.processed + 1).min(self.queue.len());
                }
                VoiceReport::Drained { run }
                    if run == self.run && self.state == VoiceState::Playing =>
                {
                    self.state = VoiceState::Stopped;
                }
                _ => {}
            }
        }
    }
}

/// Output format negotiated with the device.
#[derive(Debug, Clone)]
struct OutputFormat {
    config: CpalStreamConfig,
    sample_format: SampleFormat,
}

/// Real audio output through CPAL.
///
/// Each voice is an independent CPAL output stream rendered by its own
/// callback; the device or OS mixes them. Gain and pan are applied in the
/// callback, with pan derived from the direction of the world position.
///
/// `CpalBackend` is not `Send` on every platform, so the mixer that owns
/// it stays on the thread that created it.
///
/// # Example
///
/// ```no_run
/// use stream_mixer::{CpalBackend, Mixer};
///
/// let backend = CpalBackend::open_default()?;
/// println!("playing on {}", backend.device_name());
///
/// let mixer = Mixer::builder().max_channels(8).start(backend)?;
/// # Ok::<(), stream_mixer::MixerError>(())
/// ```
#[must_use]
pub struct CpalBackend {
    device: Device,
    name: String,
    output: OutputFormat,
    max_voices: usize,
    voices: BTreeMap<VoiceId, VoiceSlot>,
    buffers: BTreeMap<BufferId, StoredBuffer>,
    next_voice: u32,
    next_buffer: u32,
    suspended: bool,
    handler: Arc<OnceLock<CompletionHandler>>,
}

impl CpalBackend {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `NoDefaultDevice` if no default output device is configured.
    pub fn open_default() -> Result<Self, MixerError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(MixerError::NoDefaultDevice)?;
        Self::from_device(device)
    }

    /// Opens a specific output device by name.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if no device with the given name exists.
    pub fn open_by_name(name: &str) -> Result<Self, MixerError> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| MixerError::Backend(e.to_string()))?;

        for device in devices {
            if device.name().is_ok_and(|n| n == name) {
                return Self::from_device(device);
            }
        }

        Err(MixerError::DeviceNotFound {
            name: name.to_string(),
        })
    }

    fn from_device(device: Device) -> Result<Self, MixerError> {
        let supported = device
            .default_output_config()
            .map_err(|e| MixerError::Backend(e.to_string()))?;
        let sample_format = supported.sample_format();
        if !matches!(sample_format, SampleFormat::F32 | SampleFormat::I16) {
            return Err(MixerError::Backend(format!(
                "unsupported output sample format: {sample_format:?}"
            )));
        }

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let output = OutputFormat {
            config: supported.config(),
            sample_format,
        };
        tracing::info!(
            device = %name,
            sample_rate = output.config.sample_rate.0,
            channels = output.config.channels,
            format = ?sample_format,
            "opened output device"
        );

        Ok(Self {
            device,
            name,
            output,
            max_voices: DEFAULT_MAX_VOICES,
            voices: BTreeMap::new(),
            buffers: BTreeMap::new(),
            next_voice: 0,
            next_buffer: 0,
            suspended: false,
            handler: Arc::new(OnceLock::new()),
        })
    }

    /// Caps how many voices (output streams) may exist at once.
    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    /// Returns the device name.
    pub fn device_name(&self) -> &str {
        &self.name
    }

    /// Channel count and sample rate the device plays at.
    pub fn output_format(&self) -> SoundFormat {
        SoundFormat::new(self.output.config.channels, self.output.config.sample_rate.0)
    }

    fn open_voice(&self, voice: VoiceId) -> Result<VoiceSlot, BackendError> {
        let (commands, command_rx) = HeapRb::<VoiceCommand>::new(COMMAND_CAPACITY).split();
        let (report_tx, reports) = HeapRb::<VoiceReport>::new(REPORT_CAPACITY).split();

        let renderer = Renderer {
            voice,
            channels: usize::from(self.output.config.channels.max(1)),
            commands: command_rx,
            reports: report_tx,
            handler: Arc::clone(&self.handler),
            attached: None,
            queue: VecDeque::with_capacity(QUEUE_CAPACITY),
            cursor: 0,
            playing: false,
            looping: false,
            gain: 1.0,
            left: 1.0,
            right: 1.0,
            queue_gen: 0,
            run: 0,
        };

        let stream = match self.output.sample_format {
            SampleFormat::I16 => self.build_i16_stream(renderer)?,
            _ => self.build_f32_stream(renderer)?,
        };
        if !self.suspended {
            stream.play().map_err(|e| BackendError::Stream(e.to_string()))?;
        }

        Ok(VoiceSlot {
            stream,
            commands,
            reports,
            state: VoiceState::Initial,
            attached: None,
            queue: VecDeque::new(),
            processed: 0,
            queue_gen: 0,
            run: 0,
            resampler: None,
        })
    }

    fn build_f32_stream(&self, mut renderer: Renderer) -> Result<Stream, BackendError> {
        self.device
            .build_output_stream(
                &self.output.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| BackendError::Stream(e.to_string()))
    }

    fn build_i16_stream(&self, mut renderer: Renderer) -> Result<Stream, BackendError> {
        let mut mix: Vec<f32> = Vec::new();
        self.device
            .build_output_stream(
                &self.output.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if mix.len() < data.len() {
                        mix.resize(data.len(), 0.0);
                    }
                    let mix = &mut mix[..data.len()];
                    renderer.render(mix);
                    for (dst, &src) in data.iter_mut().zip(mix.iter()) {
                        *dst = crate::format::f32_to_i16(src);
                    }
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| BackendError::Stream(e.to_string()))
    }

    /// Converts a whole buffer for static playback.
    fn convert(&self, format: SoundFormat, pcm: &[i16]) -> Arc<[f32]> {
        let channels = self.output.config.channels;
        let mapped = remap_channels(pcm, format.channels, channels);
        let resampled = resample_interleaved(
            &mapped,
            channels,
            format.sample_rate,
            self.output.config.sample_rate.0,
        );
        i16_slice_to_f32(&resampled).into()
    }

    /// Device rendition of `buffer` for attaching, converted on first use.
    fn static_data(&mut self, buffer: BufferId) -> Option<Arc<[f32]>> {
        let stored = self.buffers.get(&buffer)?;
        if let Some(data) = &stored.converted {
            return Some(Arc::clone(data));
        }
        let data = match stored.format {
            Some(format) => self.convert(format, &stored.pcm),
            None => Arc::from(Vec::new()),
        };
        if let Some(stored) = self.buffers.get_mut(&buffer) {
            stored.converted = Some(Arc::clone(&data));
        }
        Some(data)
    }

    fn slot(&mut self, voice: VoiceId) -> Option<&mut VoiceSlot> {
        self.voices.get_mut(&voice)
    }
}

impl Backend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn create_voices(&mut self, count: usize) -> Result<Vec<VoiceId>, BackendError> {
        if self.voices.len() + count > self.max_voices {
            return Err(BackendError::VoiceLimit {
                limit: self.max_voices,
            });
        }

        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let id = VoiceId(self.next_voice);
            match self.open_voice(id) {
                Ok(slot) => {
                    self.next_voice += 1;
                    self.voices.insert(id, slot);
                    created.push(id);
                }
                Err(e) => {
                    self.destroy_voices(&created);
                    return Err(e);
                }
            }
        }
        tracing::debug!(count, "output voices opened");
        Ok(created)
    }

    fn destroy_voices(&mut self, voices: &[VoiceId]) {
        for id in voices {
            // Dropping the stream stops its callback.
            self.voices.remove(id);
        }
    }

    fn create_buffers(&mut self, count: usize) -> Result<Vec<BufferId>, BackendError> {
        let ids: Vec<_> = (0..count)
            .map(|i| BufferId(self.next_buffer + i as u32))
            .collect();
        self.next_buffer += count as u32;
        for &id in &ids {
            self.buffers.insert(id, StoredBuffer::default());
        }
        Ok(ids)
    }

    fn destroy_buffers(&mut self, buffers: &[BufferId]) {
        for id in buffers {
            self.buffers.remove(id);
        }
    }

    fn upload(&mut self, buffer: BufferId, format: SoundFormat, pcm: &[i16]) {
        if let Some(stored) = self.buffers.get_mut(&buffer) {
            stored.format = Some(format);
            stored.pcm.clear();
            stored.pcm.extend_from_slice(pcm);
            stored.converted = None;
        }
    }

    fn attach(&mut self, voice: VoiceId, buffer: Option<BufferId>) {
        let data = buffer.and_then(|b| self.static_data(b));
        if let Some(slot) = self.slot(voice) {
            slot.attached = buffer;
            slot.queue.clear();
            slot.processed = 0;
            slot.queue_gen = slot.queue_gen.wrapping_add(1);
            slot.resampler = None;
            slot.send(VoiceCommand::Attach(data));
        }
    }

    fn queue(&mut self, voice: VoiceId, buffers: &[BufferId]) {
        let channels = self.output.config.channels;
        let device_rate = self.output.config.sample_rate.0;
        let Some(slot) = self.voices.get_mut(&voice) else {
            return;
        };
        slot.attached = None;
        for &id in buffers {
            let data: Arc<[f32]> = match self.buffers.get(&id) {
                Some(StoredBuffer {
                    format: Some(format),
                    pcm,
                    ..
                }) => {
                    let resampler = match slot.resampler.take() {
                        Some(r) if r.converts(channels, format.sample_rate, device_rate) => r,
                        _ => StreamResampler::new(channels, format.sample_rate, device_rate),
                    };
                    let resampler = slot.resampler.insert(resampler);
                    let mapped = remap_channels(pcm, format.channels, channels);
                    i16_slice_to_f32(&resampler.process(&mapped)).into()
                }
                _ => Arc::from(Vec::new()),
            };
            slot.queue.push_back(id);
            slot.send(VoiceCommand::Queue(data));
        }
    }

    fn unqueue(&mut self, voice: VoiceId) -> Option<BufferId> {
        let slot = self.slot(voice)?;
        slot.pump_reports();
        if slot.processed == 0 {
            return None;
        }
        slot.processed -= 1;
        slot.queue.pop_front()
    }

    fn processed(&mut self, voice: VoiceId) -> usize {
        self.slot(voice).map_or(0, |slot| {
            slot.pump_reports();
            slot.processed
        })
    }

    fn state(&mut self, voice: VoiceId) -> VoiceState {
        self.slot(voice).map_or(VoiceState::Initial, |slot| {
            slot.pump_reports();
            slot.state
        })
    }

    fn kind(&mut self, voice: VoiceId) -> VoiceKind {
        match self.slot(voice) {
            Some(slot) if slot.attached.is_some() => VoiceKind::Static,
            Some(slot) if !slot.queue.is_empty() => VoiceKind::Streaming,
            _ => VoiceKind::Undetermined,
        }
    }

    fn play(&mut self, voice: VoiceId) {
        if let Some(slot) = self.slot(voice) {
            slot.run = slot.run.wrapping_add(1);
            slot.state = VoiceState::Playing;
            slot.send(VoiceCommand::Play);
        }
    }

    fn pause(&mut self, voice: VoiceId) {
        if let Some(slot) = self.slot(voice) {
            if slot.state == VoiceState::Playing {
                slot.state = VoiceState::Paused;
                slot.send(VoiceCommand::Pause);
            }
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(slot) = self.slot(voice) {
            slot.pump_reports();
            slot.state = VoiceState::Stopped;
            slot.queue_gen = slot.queue_gen.wrapping_add(1);
            slot.processed = slot.queue.len();
            slot.resampler = None;
            slot.send(VoiceCommand::Stop);
        }
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(slot) = self.slot(voice) {
            slot.send(VoiceCommand::Gain(gain));
        }
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec2) {
        let pan = position.try_normalize().map_or(0.0, |dir| dir.x);
        if let Some(slot) = self.slot(voice) {
            slot.send(VoiceCommand::Pan(pan));
        }
    }

    fn set_looping(&mut self, voice: VoiceId, looping: bool) {
        if let Some(slot) = self.slot(voice) {
            slot.send(VoiceCommand::Looping(looping));
        }
    }

    fn suspend(&mut self, suspended: bool) {
        if self.suspended == suspended {
            return;
        }
        self.suspended = suspended;
        for (id, slot) in &self.voices {
            let result = if suspended {
                slot.stream.pause().map_err(|e| e.to_string())
            } else {
                slot.stream.play().map_err(|e| e.to_string())
            };
            if let Err(e) = result {
                tracing::error!(voice = id.0, error = %e, "failed to toggle output stream");
            }
        }
    }

    fn set_completion_handler(&mut self, handler: CompletionHandler) {
        if self.handler.set(handler).is_err() {
            tracing::warn!("completion handler already installed");
        }
    }
}

impl std::fmt::Debug for CpalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalBackend")
            .field("device", &self.name)
            .field("output", &self.output)
            .field("voices", &self.voices.len())
            .field("buffers", &self.buffers.len())
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}

/// Names of every output device on the default host.
///
/// # Errors
///
/// Returns `Backend` if the host cannot enumerate devices.
pub fn list_output_devices() -> Result<Vec<String>, MixerError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| MixerError::Backend(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Name of the default output device, if any.
pub fn default_output_device_name() -> Option<String> {
    cpal::default_host()
        .default_output_device()
        .and_then(|d| d.name().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(channels: usize) -> (Renderer, HeapProd<VoiceCommand>, HeapCons<VoiceReport>) {
        let (commands, command_rx) = HeapRb::<VoiceCommand>::new(COMMAND_CAPACITY).split();
        let (report_tx, reports) = HeapRb::<VoiceReport>::new(REPORT_CAPACITY).split();
        let renderer = Renderer {
            voice: VoiceId(0),
            channels,
            commands: command_rx,
            reports: report_tx,
            handler: Arc::new(OnceLock::new()),
            attached: None,
            queue: VecDeque::with_capacity(QUEUE_CAPACITY),
            cursor: 0,
            playing: false,
            looping: false,
            gain: 1.0,
            left: 1.0,
            right: 1.0,
            queue_gen: 0,
            run: 0,
        };
        (renderer, commands, reports)
    }

    fn data(samples: &[f32]) -> Arc<[f32]> {
        Arc::from(samples.to_vec())
    }

    #[test]
    fn test_renderer_silent_until_played() {
        let (mut r, mut tx, _rx) = renderer(1);
        let _ = tx.try_push(VoiceCommand::Queue(data(&[0.5; 4])));
        let mut out = [1.0f32; 4];
        r.render(&mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_renderer_reports_processed_and_drained() {
        let (mut r, mut tx, mut rx) = renderer(1);
        let _ = tx.try_push(VoiceCommand::Queue(data(&[0.25; 2])));
        let _ = tx.try_push(VoiceCommand::Queue(data(&[0.5; 2])));
        let _ = tx.try_push(VoiceCommand::Play);

        let mut out = [0.0f32; 6];
        r.render(&mut out);
        assert_eq!(out, [0.25, 0.25, 0.5, 0.5, 0.0, 0.0]);

        let reports: Vec<_> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert!(matches!(
            reports.as_slice(),
            [
                VoiceReport::Processed { queue_gen: 0 },
                VoiceReport::Processed { queue_gen: 0 },
                VoiceReport::Drained { run: 1 }
            ]
        ));
        assert!(!r.playing);
    }

    #[test]
    fn test_renderer_loops_attached_buffer() {
        let (mut r, mut tx, mut rx) = renderer(1);
        let _ = tx.try_push(VoiceCommand::Attach(Some(data(&[0.1, 0.2]))));
        let _ = tx.try_push(VoiceCommand::Looping(true));
        let _ = tx.try_push(VoiceCommand::Play);

        let mut out = [0.0f32; 5];
        r.render(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_renderer_applies_gain_and_pan() {
        let (mut r, mut tx, _rx) = renderer(2);
        let _ = tx.try_push(VoiceCommand::Attach(Some(data(&[1.0, 1.0]))));
        let _ = tx.try_push(VoiceCommand::Gain(0.5));
        let _ = tx.try_push(VoiceCommand::Pan(1.0));
        let _ = tx.try_push(VoiceCommand::Play);

        let mut out = [0.0f32; 2];
        r.render(&mut out);
        assert_eq!(out, [0.0, 0.5]);
    }

    #[test]
    fn test_stop_invalidates_in_flight_reports() {
        let (mut r, mut tx, _rx) = renderer(1);
        let _ = tx.try_push(VoiceCommand::Queue(data(&[0.5; 8])));
        let _ = tx.try_push(VoiceCommand::Play);
        let _ = tx.try_push(VoiceCommand::Stop);

        let mut out = [0.0f32; 4];
        r.render(&mut out);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(r.queue_gen, 1);
        assert!(r.queue.is_empty());
    }

    // Device tests require actual audio hardware and are skipped in CI
    #[test]
    #[ignore = "requires audio hardware"]
    fn test_open_default_device() {
        let backend = CpalBackend::open_default().unwrap();
        println!("Default output: {}", backend.device_name());
        assert!(backend.output_format().channels > 0);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_voice_lifecycle_on_device() {
        let mut backend = CpalBackend::open_default().unwrap().with_max_voices(2);
        let voices = backend.create_voices(2).unwrap();
        assert!(backend.create_voices(1).is_err());

        let buffer = backend.create_buffers(1).unwrap()[0];
        backend.upload(buffer, SoundFormat::new(1, 22050), &[0; 2205]);
        backend.queue(voices[0], &[buffer]);
        backend.play(voices[0]);
        std::thread::sleep(std::time::Duration::from_millis(300));
        assert_eq!(backend.processed(voices[0]), 1);
        assert_eq!(backend.state(voices[0]), VoiceState::Stopped);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_list_output_devices() {
        let devices = list_output_devices().unwrap();
        println!("Output devices: {devices:?}");
    }
}
