//! Integration tests for stream-mixer.
//!
//! Everything runs on [`SimulatedBackend`], whose clock only moves when a
//! test calls `advance()`. Tests that need real output live next to
//! `CpalBackend` and are `#[ignore]`d.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use stream_mixer::{
    ChannelHandle, ChannelState, FileLoader, Mixer, MixerError, MixerEvent, MockAudioFile,
    MockLoader, RetireReason, SimulatedBackend, SoundKind, Vec2,
};

const STEP: usize = 10;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 100-sample chunks, three per ring.
fn mixer(loader: &MockLoader, channels: usize) -> Mixer<SimulatedBackend> {
    Mixer::builder()
        .max_channels(channels)
        .stream_buffer_samples(100)
        .loader(loader.clone())
        .start(SimulatedBackend::new())
        .unwrap()
}

fn mixer_with_events(
    loader: &MockLoader,
    channels: usize,
) -> (Mixer<SimulatedBackend>, Arc<Mutex<Vec<MixerEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mixer = Mixer::builder()
        .max_channels(channels)
        .stream_buffer_samples(100)
        .loader(loader.clone())
        .on_event(move |e| sink.lock().push(e))
        .start(SimulatedBackend::new())
        .unwrap();
    (mixer, events)
}

fn pcm(samples: usize) -> MockAudioFile {
    MockAudioFile::new(8000, 1).with_samples(&vec![1000; samples])
}

/// Advances the clock until `channel` is back in the pool and returns how
/// many frames it played.
fn play_out(mixer: &mut Mixer<SimulatedBackend>, channel: ChannelHandle) -> usize {
    let mut played = 0;
    for _ in 0..10_000 {
        if mixer.channel_state(channel) == ChannelState::Available {
            return played;
        }
        mixer.backend_mut().advance(STEP);
        played += STEP;
        mixer.process();
    }
    panic!("channel never finished");
}

fn retire_reasons(events: &Mutex<Vec<MixerEvent>>) -> Vec<RetireReason> {
    events
        .lock()
        .iter()
        .filter_map(|e| match e {
            MixerEvent::ChannelRetired { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

fn loop_events(events: &Mutex<Vec<MixerEvent>>) -> Vec<i32> {
    events
        .lock()
        .iter()
        .filter_map(|e| match e {
            MixerEvent::StreamLooped { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Channel pool
// ---------------------------------------------------------------------------

#[test]
fn test_pool_capacity_is_a_hard_limit() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 4);
    let blip = mixer.load_sound("blip").unwrap();

    let handles: Vec<_> = (0..4).map(|_| mixer.play(&blip).unwrap()).collect();
    assert!(mixer.play(&blip).is_none());
    assert_eq!(mixer.stats().active_channels, 4);

    let indices: Vec<_> = handles.iter().map(|h| h.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    mixer.stop(handles[2]);
    let reused = mixer.play(&blip).unwrap();
    assert_eq!(reused.index(), 2);
    assert_ne!(reused, handles[2]);
}

#[test]
fn test_stale_handle_is_inert() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let old = mixer.play(&blip).unwrap();
    mixer.stop(old);
    let new = mixer.play(&blip).unwrap();
    assert_eq!(old.index(), new.index());

    // Nothing addressed through the old handle reaches the new channel.
    mixer.set_volume(old, 0.0);
    mixer.pause(old);
    mixer.stop(old);
    assert!(mixer.is_playing(new));
    assert_eq!(mixer.channel_state(old), ChannelState::Available);
    let voice = mixer.voice_of(new).unwrap();
    assert_eq!(mixer.backend().gain(voice), Some(1.0));
}

#[test]
fn test_init_failure_leaks_nothing() {
    // Two channels with three ring buffers each need six buffers.
    let mut mixer = Mixer::new(SimulatedBackend::new().with_buffer_limit(5));
    let err = mixer.initialize(2).unwrap_err();
    assert!(matches!(err, MixerError::BufferAllocation { requested: 6, .. }));
    assert_eq!(mixer.backend().live_voices(), 0);
    assert_eq!(mixer.backend().live_buffers(), 0);
    assert!(!mixer.is_initialized());

    let mut mixer = Mixer::new(SimulatedBackend::new().with_voice_limit(1));
    let err = mixer.initialize(2).unwrap_err();
    assert!(matches!(err, MixerError::VoiceAllocation { requested: 2, .. }));
    assert_eq!(mixer.backend().live_voices(), 0);
}

// ---------------------------------------------------------------------------
// Sound registry
// ---------------------------------------------------------------------------

#[test]
fn test_load_is_idempotent() {
    let loader = MockLoader::new();
    loader.insert("hit", pcm(100));
    loader.insert("theme", pcm(1000));
    let mut mixer = mixer(&loader, 2);

    let a = mixer.load_sound("hit").unwrap();
    let b = mixer.load_sound("hit").unwrap();
    assert_eq!(a, b);
    assert_eq!(loader.opens("hit"), 1);

    let s1 = mixer.load_stream("theme").unwrap();
    let s2 = mixer.load_stream("theme").unwrap();
    assert_eq!(s1, s2);
    assert_eq!(loader.opens("theme"), 1);

    assert_eq!(mixer.sound_count(), 2);
    assert_eq!(mixer.sound("hit").unwrap().kind(), Some(SoundKind::Static));
    assert_eq!(mixer.sound("theme").unwrap().kind(), Some(SoundKind::Streaming));
}

#[test]
fn test_missing_file_leaves_no_entry() {
    let loader = MockLoader::new();
    let mut mixer = mixer(&loader, 1);
    assert!(mixer.load_sound("nope").is_none());
    assert!(mixer.load_stream("nope").is_none());
    assert_eq!(mixer.sound_count(), 0);
}

#[test]
fn test_release_sound_stops_its_channels() {
    let loader = MockLoader::new();
    loader.insert("hit", pcm(100));
    loader.insert("other", pcm(100));
    let (mut mixer, events) = mixer_with_events(&loader, 3);
    let hit = mixer.load_sound("hit").unwrap();
    let other = mixer.load_sound("other").unwrap();
    let ring_buffers = mixer.backend().live_buffers() - 2;

    let a = mixer.play(&hit).unwrap();
    let b = mixer.play(&hit).unwrap();
    let c = mixer.play(&other).unwrap();

    assert!(mixer.release_sound(&hit));
    assert!(!mixer.release_sound(&hit));
    assert_eq!(mixer.channel_state(a), ChannelState::Available);
    assert_eq!(mixer.channel_state(b), ChannelState::Available);
    assert!(mixer.is_playing(c));
    assert!(mixer.play(&hit).is_none());
    assert_eq!(mixer.sound_count(), 1);
    assert_eq!(mixer.backend().live_buffers(), ring_buffers + 1);
    assert_eq!(
        retire_reasons(&events),
        vec![RetireReason::SoundReleased, RetireReason::SoundReleased]
    );
}

// ---------------------------------------------------------------------------
// Static playback
// ---------------------------------------------------------------------------

#[test]
fn test_static_sound_retires_when_finished() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    assert_eq!(play_out(&mut mixer, channel), 100);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
    assert_eq!(mixer.stats().channels_retired, 1);
}

#[test]
fn test_static_loop_count_adds_passes() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    mixer.set_loop_count(channel, 2);
    assert_eq!(play_out(&mut mixer, channel), 300);
    assert_eq!(loop_events(&events), vec![1, 0]);
}

#[test]
fn test_static_infinite_loop_uses_hardware_looping() {
    let loader = MockLoader::new();
    loader.insert("hum", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let hum = mixer.load_sound("hum").unwrap();

    let channel = mixer.play(&hum).unwrap();
    mixer.set_loop_count(channel, -1);
    let voice = mixer.voice_of(channel).unwrap();
    assert_eq!(mixer.backend().is_looping(voice), Some(true));

    for _ in 0..100 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert!(mixer.is_playing(channel));

    mixer.stop(channel);
    assert_eq!(mixer.backend().is_looping(voice), Some(false));
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[test]
fn test_stream_plays_once_by_default() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(250));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    assert_eq!(play_out(&mut mixer, channel), 250);
    assert!(loop_events(&events).is_empty());
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
}

#[test]
fn test_stream_loop_count_plays_extra_passes() {
    init_tracing();
    let loader = MockLoader::new();
    // Two and a half ring buffers.
    loader.insert("theme", pcm(250));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    let rewinds = loader.rewinds("theme");
    mixer.set_loop_count(channel, 1);

    // One full pass plus half of the second.
    for _ in 0..38 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert!(mixer.is_playing(channel));

    assert_eq!(play_out(&mut mixer, channel) + 380, 500);
    assert_eq!(loader.rewinds("theme") - rewinds, 1);
    assert_eq!(loop_events(&events), vec![0]);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
}

#[test]
fn test_stream_infinite_loop_never_finishes() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(250));
    let mut mixer = mixer(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    let rewinds = loader.rewinds("theme");
    mixer.set_loop_count(channel, -1);

    for _ in 0..200 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert!(mixer.is_playing(channel));
    // 2000 frames of a 250-frame file.
    assert!(loader.rewinds("theme") - rewinds >= 7);
    assert_eq!(mixer.stats().underruns_recovered, 0);
}

#[test]
fn test_stream_plays_on_one_channel_at_a_time() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(1000));
    let (mut mixer, events) = mixer_with_events(&loader, 2);
    let theme = mixer.load_stream("theme").unwrap();

    let first = mixer.play(&theme).unwrap();
    let second = mixer.play(&theme).unwrap();
    assert_eq!(mixer.channel_state(first), ChannelState::Available);
    assert!(mixer.is_playing(second));
    assert_eq!(mixer.stats().active_channels, 1);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Restarted]);
}

#[test]
fn test_empty_stream_does_not_play() {
    let loader = MockLoader::new();
    loader.insert("empty", MockAudioFile::new(8000, 1));
    let mut mixer = mixer(&loader, 1);
    let empty = mixer.load_stream("empty").unwrap();

    assert!(mixer.play(&empty).is_none());
    assert_eq!(mixer.stats().active_channels, 0);
}

#[test]
fn test_paused_stream_is_not_refilled() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(1000));
    let mut mixer = mixer(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    mixer.backend_mut().advance(50);
    mixer.pause(channel);
    assert!(mixer.is_paused(channel));

    let uploads = mixer.backend().uploads();
    for _ in 0..50 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert_eq!(mixer.backend().uploads(), uploads);
    assert!(mixer.is_paused(channel));

    assert_eq!(mixer.resume(channel), Some(channel));
    assert!(mixer.is_playing(channel));
    assert_eq!(play_out(&mut mixer, channel), 950);
}

#[test]
fn test_underrun_restarts_the_stream() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(1000));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    let voice = mixer.voice_of(channel).unwrap();

    // The whole ring drains before the next tick.
    mixer.backend_mut().advance(300);
    assert_eq!(
        mixer.backend().voice_state(voice),
        Some(stream_mixer::VoiceState::Stopped)
    );

    mixer.process();
    assert!(mixer.is_playing(channel));
    assert_eq!(
        mixer.backend().voice_state(voice),
        Some(stream_mixer::VoiceState::Playing)
    );
    assert_eq!(mixer.stats().underruns_recovered, 1);
    assert!(events
        .lock()
        .iter()
        .any(|e| matches!(e, MixerEvent::UnderrunRecovered { channel: c } if *c == channel)));

    assert_eq!(play_out(&mut mixer, channel), 700);
}

#[test]
fn test_pause_across_underrun_does_not_replay() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(1000));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let theme = mixer.load_stream("theme").unwrap();

    let channel = mixer.play(&theme).unwrap();
    mixer.backend_mut().advance(300);
    mixer.pause(channel);
    assert!(mixer.is_paused(channel));

    for _ in 0..5 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert!(mixer.is_paused(channel));
    assert_eq!(mixer.stats().underruns_recovered, 0);

    assert_eq!(mixer.resume(channel), Some(channel));
    assert!(mixer.is_playing(channel));
    assert_eq!(mixer.stats().underruns_recovered, 1);

    // Only the 700 samples never heard remain.
    assert_eq!(play_out(&mut mixer, channel), 700);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
}

#[test]
fn test_finished_static_reads_stopped_before_process() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    mixer.backend_mut().advance(100);

    assert_eq!(mixer.channel_state(channel), ChannelState::Stopped);
    assert!(!mixer.is_playing(channel));
    assert_eq!(mixer.resume(channel), None);
    mixer.pause(channel);
    assert!(!mixer.is_paused(channel));

    mixer.process();
    assert_eq!(mixer.channel_state(channel), ChannelState::Available);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
}

#[test]
fn test_static_with_loops_left_still_reads_playing() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    mixer.set_loop_count(channel, 1);
    mixer.backend_mut().advance(100);

    assert!(mixer.is_playing(channel));
    assert_eq!(mixer.resume(channel), Some(channel));

    mixer.process();
    assert!(mixer.is_playing(channel));
    assert_eq!(play_out(&mut mixer, channel), 100);
}

#[test]
fn test_drained_exhausted_stream_reads_stopped_before_process() {
    let loader = MockLoader::new();
    loader.insert("sting", pcm(250));
    let (mut mixer, events) = mixer_with_events(&loader, 1);
    let sting = mixer.load_stream("sting").unwrap();

    let channel = mixer.play(&sting).unwrap();
    // The next refill hits the end of the file.
    mixer.backend_mut().advance(100);
    mixer.process();
    assert!(mixer.is_playing(channel));

    mixer.backend_mut().advance(150);
    assert_eq!(mixer.channel_state(channel), ChannelState::Stopped);
    assert_eq!(mixer.resume(channel), None);

    mixer.process();
    assert_eq!(mixer.channel_state(channel), ChannelState::Available);
    assert_eq!(retire_reasons(&events), vec![RetireReason::Finished]);
}

// ---------------------------------------------------------------------------
// Channel operations
// ---------------------------------------------------------------------------

#[test]
fn test_stop_then_resume_returns_none() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    mixer.pause(channel);
    assert_eq!(mixer.resume(channel), Some(channel));
    mixer.stop(channel);
    assert_eq!(mixer.resume(channel), None);
    assert!(!mixer.is_playing(channel));
}

#[test]
fn test_volume_and_position_reach_the_voice() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play_at(&blip, Vec2::new(-3.0, 1.0)).unwrap();
    let voice = mixer.voice_of(channel).unwrap();
    assert_eq!(mixer.backend().position(voice), Some(Vec2::new(-3.0, 1.0)));

    mixer.set_world_position(channel, Vec2::new(5.0, 0.0));
    assert_eq!(mixer.backend().position(voice), Some(Vec2::new(5.0, 0.0)));

    mixer.set_volume(channel, 0.25);
    assert_eq!(mixer.backend().gain(voice), Some(0.25));
    mixer.set_volume(channel, f32::NAN);
    assert_eq!(mixer.backend().gain(voice), Some(0.0));
}

#[test]
fn test_suspend_freezes_playback() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();

    let channel = mixer.play(&blip).unwrap();
    mixer.suspend(true);
    assert!(mixer.backend().is_suspended());
    for _ in 0..50 {
        mixer.backend_mut().advance(STEP);
        mixer.process();
    }
    assert!(mixer.is_playing(channel));

    mixer.suspend(false);
    assert_eq!(play_out(&mut mixer, channel), 100);
}

// ---------------------------------------------------------------------------
// Cross-thread release
// ---------------------------------------------------------------------------

#[test]
fn test_off_thread_stop_is_deferred() {
    let loader = MockLoader::new();
    loader.insert("theme", pcm(1000));
    let (mut mixer, events) = mixer_with_events(&loader, 2);
    let theme = mixer.load_stream("theme").unwrap();
    let channel = mixer.play(&theme).unwrap();
    let voice = mixer.voice_of(channel).unwrap();

    let mixer = Arc::new(Mutex::new(mixer));
    let shared = Arc::clone(&mixer);
    thread::spawn(move || shared.lock().stop(channel))
        .join()
        .unwrap();

    let mut mixer = mixer.lock();
    assert_eq!(mixer.channel_state(channel), ChannelState::Stopped);
    assert!(!mixer.is_playing(channel));
    assert_eq!(mixer.resume(channel), None);
    assert_eq!(mixer.stats().pending_releases, 1);
    // Hardware untouched until the owning thread drains the queue.
    assert_eq!(
        mixer.backend().voice_state(voice),
        Some(stream_mixer::VoiceState::Playing)
    );

    mixer.process();
    assert_eq!(mixer.channel_state(channel), ChannelState::Available);
    let stats = mixer.stats();
    assert_eq!(stats.pending_releases, 0);
    assert_eq!(stats.deferred_releases, 1);
    assert_eq!(stats.channels_retired, 1);
    assert!(events
        .lock()
        .iter()
        .any(|e| matches!(e, MixerEvent::ReleaseDeferred { .. })));
}

#[test]
fn test_duplicate_release_requests_tear_down_once() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 1);
    let blip = mixer.load_sound("blip").unwrap();
    let channel = mixer.play(&blip).unwrap();

    let releaser = mixer.release_handle();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let releaser = releaser.clone();
            thread::spawn(move || releaser.release(channel))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(releaser.pending(), 4);

    mixer.process();
    assert_eq!(releaser.pending(), 0);
    assert_eq!(mixer.stats().channels_retired, 1);

    // The slot is reusable and the old handle can't reach it.
    let next = mixer.play(&blip).unwrap();
    releaser.release(channel);
    mixer.process();
    assert!(mixer.is_playing(next));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_clear_resets_everything() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    loader.insert("theme", pcm(1000));
    let (mut mixer, events) = mixer_with_events(&loader, 3);
    let blip = mixer.load_sound("blip").unwrap();
    let theme = mixer.load_stream("theme").unwrap();
    let ring_buffers = mixer.backend().live_buffers() - 1;

    mixer.play(&blip).unwrap();
    mixer.play(&theme).unwrap();
    mixer.clear();

    let stats = mixer.stats();
    assert_eq!(stats.active_channels, 0);
    assert_eq!(stats.sounds, 0);
    assert_eq!(stats.max_channels, 3);
    assert_eq!(mixer.backend().live_buffers(), ring_buffers);
    assert_eq!(
        retire_reasons(&events),
        vec![RetireReason::Cleared, RetireReason::Cleared]
    );

    // Still usable.
    let blip = mixer.load_sound("blip").unwrap();
    assert!(mixer.play(&blip).is_some());
}

#[test]
fn test_uninitialized_mixer_is_inert() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = Mixer::builder()
        .loader(loader.clone())
        .build(SimulatedBackend::new());

    assert!(mixer.load_sound("blip").is_none());
    mixer.process();
    mixer.suspend(true);
    assert!(!mixer.backend().is_suspended());
    assert_eq!(loader.opens("blip"), 0);
}

#[test]
fn test_drop_frees_backend_resources() {
    let loader = MockLoader::new();
    loader.insert("blip", pcm(100));
    let mut mixer = mixer(&loader, 2);
    let blip = mixer.load_sound("blip").unwrap();
    mixer.play(&blip).unwrap();

    let releaser = mixer.release_handle();
    drop(mixer);
    assert_eq!(releaser.pending(), 0);
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

fn write_wav(path: &std::path::Path, samples: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..samples {
        writer.write_sample((i % 100) as i16 * 100).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_wav_files_play_through_file_loader() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_wav(&dir.path().join("hit.wav"), 120);
    write_wav(&dir.path().join("theme.wav"), 250);

    let mut mixer = Mixer::builder()
        .max_channels(2)
        .stream_buffer_samples(100)
        .loader(FileLoader::with_root(dir.path()))
        .start(SimulatedBackend::new())
        .unwrap();

    let hit = mixer.load_sound("hit.wav").unwrap();
    let theme = mixer.load_stream("theme.wav").unwrap();
    assert_eq!(mixer.sound("theme.wav").unwrap().format().sample_rate, 8000);

    let a = mixer.play(&hit).unwrap();
    let b = mixer.play(&theme).unwrap();
    assert_eq!(play_out(&mut mixer, b), 250);
    assert_eq!(mixer.channel_state(a), ChannelState::Available);

    assert!(mixer.load_sound("missing.wav").is_none());
}
