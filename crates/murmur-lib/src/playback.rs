//! Blocking WAV playback through the default output device.
//!
//! The device is opened per call and closed on return. The file is read one
//! chunk of frames at a time and appended to the sink as it drains, then the
//! calling thread polls the sink until everything has been played out.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use murmur_core::wav::{FRAMES_PER_CHUNK, WavHeader, frames_to_i16, parse_wav_header};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tracing::debug;

use crate::error::{Error, Result};

/// How often the sink's busy status is checked.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chunks held by the sink at once, the playing one included.
const MAX_QUEUED_CHUNKS: usize = 2;

/// Back-off while the sink is full. Shorter than one chunk at any rate Piper
/// produces.
const FEED_INTERVAL: Duration = Duration::from_millis(10);

const HEADER_BLOCK: usize = 4096;
const MAX_HEADER_BYTES: usize = 1 << 20;

/// Something that can play a rendered WAV file to completion.
pub trait Player {
    /// Returns only after the audio has finished playing.
    fn play(&self, path: &Path) -> Result<()>;
}

/// Plays through the system's default output device via rodio.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevicePlayer;

impl Player for DevicePlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .map_err(|e| Error::Playback(format!("cannot read {}: {e}", path.display())))?;
        let mut wav = WavStream::open(file)
            .map_err(|e| Error::Playback(format!("{}: {e}", path.display())))?;
        debug!(
            "playback: {} ch, {} bit, {} Hz",
            wav.header.channels, wav.header.bits_per_sample, wav.header.sample_rate
        );

        // rodio's OutputStream is !Send; it lives and dies on this thread.
        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| Error::Playback(format!("failed to open audio output: {e}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| Error::Playback(format!("failed to create sink: {e}")))?;

        feed(&sink, &mut wav)
            .map_err(|e| Error::Playback(format!("reading {}: {e}", path.display())))?;

        wait_until_drained(&sink);
        debug!("playback: done");
        Ok(())
    }
}

/// A WAV file read incrementally: the header up front, then sample data in
/// chunks of [`FRAMES_PER_CHUNK`] frames.
struct WavStream<R> {
    reader: R,
    header: WavHeader,
    /// Data bytes already read past the header.
    pending: Vec<u8>,
    /// Data bytes left in the file; `None` reads to EOF.
    remaining: Option<u64>,
}

impl<R: Read> WavStream<R> {
    /// Read until the header parses. Chunks ahead of `data` are skipped.
    fn open(mut reader: R) -> io::Result<Self> {
        let mut buf = Vec::new();
        let mut block = [0u8; HEADER_BLOCK];
        loop {
            let n = reader.read(&mut block)?;
            buf.extend_from_slice(&block[..n]);
            match parse_wav_header(&buf) {
                Ok(header) => {
                    let pending = header.data(&buf).to_vec();
                    let remaining = header
                        .data_len
                        .map(|len| len.saturating_sub(pending.len()) as u64);
                    return Ok(Self {
                        reader,
                        header,
                        pending,
                        remaining,
                    });
                }
                Err(e) if n == 0 || buf.len() >= MAX_HEADER_BYTES => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                }
                Err(_) => {}
            }
        }
    }

    /// The next chunk of frames, or `None` once the data is exhausted. A
    /// trailing partial frame is dropped.
    fn next_chunk(&mut self) -> io::Result<Option<SamplesBuffer<i16>>> {
        let want = FRAMES_PER_CHUNK * self.header.block_align().max(1);
        let mut raw = std::mem::take(&mut self.pending);

        if raw.len() < want {
            let mut limit = (want - raw.len()) as u64;
            if let Some(left) = self.remaining {
                limit = limit.min(left);
            }
            let n = (&mut self.reader).take(limit).read_to_end(&mut raw)? as u64;
            if let Some(left) = self.remaining.as_mut() {
                *left -= n;
            }
        } else {
            self.pending = raw.split_off(want);
        }

        let samples = frames_to_i16(&raw, &self.header);
        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(SamplesBuffer::new(
            self.header.channels,
            self.header.sample_rate,
            samples,
        )))
    }
}

/// Append chunks as the sink drains, never holding more than
/// [`MAX_QUEUED_CHUNKS`] in it.
fn feed<R: Read>(sink: &Sink, wav: &mut WavStream<R>) -> io::Result<()> {
    while let Some(chunk) = wav.next_chunk()? {
        while sink.len() >= MAX_QUEUED_CHUNKS {
            thread::sleep(FEED_INTERVAL);
        }
        sink.append(chunk);
    }
    Ok(())
}

fn wait_until_drained(sink: &Sink) {
    while !sink.empty() {
        thread::sleep(POLL_INTERVAL);
    }
    // The sink reports empty once the mixer has taken the last sample; give
    // the device buffer one more interval to play it out.
    thread::sleep(POLL_INTERVAL);
}
