//! Plays a WAV file on the default output device.
//!
//! Short files are loaded into a static buffer, long ones are streamed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example play_file -- path/to/file.wav
//! cargo run --example play_file -- path/to/music.wav --stream --loops 2
//! cargo run --example play_file -- path/to/file.wav --device "USB Audio"
//! ```

use std::time::Duration;

use stream_mixer::{
    list_output_devices, ChannelState, CpalBackend, FileLoader, Mixer, MixerEvent,
};
use tracing_subscriber::EnvFilter;

/// One tick at roughly 60 Hz.
const TICK: Duration = Duration::from_millis(16);

struct Args {
    path: String,
    stream: bool,
    loops: i32,
    device: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        path: String::new(),
        stream: false,
        loops: 0,
        device: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stream" => parsed.stream = true,
            "--loops" => {
                let value = args.next().ok_or("--loops needs a value")?;
                parsed.loops = value.parse().map_err(|_| format!("bad loop count: {value}"))?;
            }
            "--device" => parsed.device = Some(args.next().ok_or("--device needs a name")?),
            _ if parsed.path.is_empty() => parsed.path = arg,
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }

    if parsed.path.is_empty() {
        return Err("usage: play_file <file.wav> [--stream] [--loops N] [--device NAME]".into());
    }
    Ok(parsed)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;

    println!("Output devices:");
    for name in list_output_devices()? {
        println!("  - {name}");
    }
    println!();

    let backend = match &args.device {
        Some(name) => CpalBackend::open_by_name(name)?,
        None => CpalBackend::open_default()?,
    };
    println!("Playing on: {}", backend.device_name());

    let mut mixer = Mixer::builder()
        .max_channels(4)
        .loader(FileLoader::new())
        .on_event(|event| match event {
            MixerEvent::StreamLooped { remaining, .. } => println!("looped ({remaining} left)"),
            MixerEvent::UnderrunRecovered { .. } => println!("underrun, restarted"),
            other => tracing::debug!(?other, "mixer event"),
        })
        .start(backend)?;

    let sound = if args.stream {
        mixer.load_stream(&args.path)
    } else {
        mixer.load_sound(&args.path)
    }
    .ok_or_else(|| format!("could not load {}", args.path))?;

    let channel = mixer.play(&sound).ok_or("no free channel")?;
    mixer.set_loop_count(channel, args.loops);

    while mixer.channel_state(channel) != ChannelState::Available {
        mixer.process();
        std::thread::sleep(TICK);
    }

    println!("Done. Stats: {:?}", mixer.stats());
    Ok(())
}
