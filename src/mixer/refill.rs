//! Streaming buffer refill.
//!
//! A streaming channel owns a small ring of hardware buffers. Priming fills
//! the whole ring; afterwards each `process()` tick unqueues the buffers the
//! hardware finished, decodes the next chunk into them and queues them back
//! at the tail. End of stream consumes one loop pass per rewind.

use crate::backend::Backend;
use crate::channel::Channel;
use crate::sound::SoundFormat;
use crate::source::AudioFile;

/// One decoded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk {
    /// Samples written to the scratch buffer; `0` means exhausted.
    pub(crate) len: usize,
    /// The stream was rewound to produce this chunk.
    pub(crate) looped: bool,
}

/// Reads the next chunk, rewinding once at end of stream if a loop pass
/// remains.
///
/// `-1` loops forever and is never decremented. A rewound stream that
/// still reads nothing is empty and counts as exhausted.
pub(crate) fn read_chunk(file: &mut dyn AudioFile, loop_count: &mut i32, dst: &mut [i16]) -> Chunk {
    let len = file.read(dst);
    if len > 0 || *loop_count == 0 {
        return Chunk { len, looped: false };
    }
    if *loop_count > 0 {
        *loop_count -= 1;
    }
    file.rewind();
    Chunk {
        len: file.read(dst),
        looped: true,
    }
}

/// Result of servicing one channel's ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Refill {
    /// Buffers uploaded and queued.
    pub(crate) filled: usize,
    /// Rewinds taken.
    pub(crate) loops: usize,
}

/// Fills the channel's ring from the start of `file` and queues it.
///
/// Stops early, marking the channel exhausted, when the stream runs dry.
pub(crate) fn prime<B: Backend>(
    backend: &mut B,
    channel: &mut Channel,
    file: &mut dyn AudioFile,
    format: SoundFormat,
    scratch: &mut [i16],
) -> Refill {
    file.rewind();
    let mut outcome = Refill::default();
    for i in 0..channel.buffers.len() {
        let chunk = read_chunk(file, &mut channel.loop_count, scratch);
        outcome.loops += usize::from(chunk.looped);
        if chunk.len == 0 {
            channel.exhausted = true;
            break;
        }
        let buffer = channel.buffers[i];
        backend.upload(buffer, format, &scratch[..chunk.len]);
        backend.queue(channel.voice, &[buffer]);
        outcome.filled += 1;
    }
    outcome
}

/// Recycles every buffer the hardware has finished with.
pub(crate) fn refill<B: Backend>(
    backend: &mut B,
    channel: &mut Channel,
    file: &mut dyn AudioFile,
    format: SoundFormat,
    scratch: &mut [i16],
) -> Refill {
    let mut outcome = Refill::default();
    let processed = backend.processed(channel.voice);
    for _ in 0..processed {
        if channel.exhausted {
            break;
        }
        let chunk = read_chunk(file, &mut channel.loop_count, scratch);
        outcome.loops += usize::from(chunk.looped);
        if chunk.len == 0 {
            channel.exhausted = true;
            break;
        }
        let Some(buffer) = backend.unqueue(channel.voice) else {
            break;
        };
        backend.upload(buffer, format, &scratch[..chunk.len]);
        backend.queue(channel.voice, &[buffer]);
        outcome.filled += 1;
    }
    outcome
}
