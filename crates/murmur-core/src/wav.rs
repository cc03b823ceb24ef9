//! WAV header parsing and PCM sample conversion.
//!
//! Pure functions. No I/O, no audio device.

/// Frames pushed to the output device per chunk during playback.
pub const FRAMES_PER_CHUNK: usize = 1024;

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Parsed WAV header fields needed for streaming playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// IEEE float samples rather than integer PCM.
    pub float: bool,
    /// Byte offset in the buffer where raw sample data begins.
    pub data_offset: usize,
    /// Declared size of the data chunk; `None` for the `0xFFFFFFFF`
    /// streaming sentinel.
    pub data_len: Option<usize>,
}

impl WavHeader {
    /// Bytes per sample of a single channel.
    pub fn sample_width(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Bytes per interleaved frame.
    pub fn block_align(&self) -> usize {
        self.sample_width() * self.channels as usize
    }

    /// The sample data region of `buf`, clamped to what was actually written.
    pub fn data<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        let start = self.data_offset.min(buf.len());
        let end = match self.data_len {
            Some(len) => start.saturating_add(len).min(buf.len()),
            None => buf.len(),
        };
        &buf[start..end]
    }
}

fn u16_at(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

fn u32_at(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

/// Parse a WAV header from a byte buffer.
///
/// Accepts integer PCM (8/16/24/32-bit) and 32-bit float, including the
/// `WAVE_FORMAT_EXTENSIBLE` wrapper. Unknown chunks (`LIST`, `fact`, …) are
/// skipped.
pub fn parse_wav_header(buf: &[u8]) -> Result<WavHeader, &'static str> {
    if buf.len() < 12 {
        return Err("too short for RIFF header");
    }
    if &buf[0..4] != b"RIFF" {
        return Err("missing RIFF tag");
    }
    if &buf[8..12] != b"WAVE" {
        return Err("missing WAVE tag");
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u32, u16, bool)> = None;

    while pos + 8 <= buf.len() {
        let chunk_id = &buf[pos..pos + 4];
        let chunk_size = u32_at(buf, pos + 4);

        if chunk_id == b"fmt " {
            if pos + 24 > buf.len() {
                return Err("fmt chunk truncated");
            }
            let mut audio_format = u16_at(buf, pos + 8);
            if audio_format == FORMAT_EXTENSIBLE {
                // Sub-format GUID starts 24 bytes into the fmt payload.
                if pos + 8 + 26 > buf.len() {
                    return Err("extensible fmt chunk truncated");
                }
                audio_format = u16_at(buf, pos + 8 + 24);
            }
            let float = match audio_format {
                FORMAT_PCM => false,
                FORMAT_FLOAT => true,
                _ => return Err("unsupported sample encoding"),
            };
            let channels = u16_at(buf, pos + 10);
            let sample_rate = u32_at(buf, pos + 12);
            let bits = u16_at(buf, pos + 22);
            if channels == 0 || sample_rate == 0 {
                return Err("zero channels or sample rate");
            }
            match (float, bits) {
                (false, 8 | 16 | 24 | 32) | (true, 32) => {}
                _ => return Err("unsupported sample width"),
            }
            fmt = Some((channels, sample_rate, bits, float));

            let skip = if chunk_size == 0xFFFFFFFF {
                16
            } else {
                chunk_size as usize + (chunk_size as usize & 1)
            };
            pos += 8 + skip;
            continue;
        }

        if chunk_id == b"data" {
            let (channels, sample_rate, bits_per_sample, float) =
                fmt.ok_or("data chunk before fmt chunk")?;
            return Ok(WavHeader {
                channels,
                sample_rate,
                bits_per_sample,
                float,
                data_offset: pos + 8,
                data_len: (chunk_size != 0xFFFFFFFF).then_some(chunk_size as usize),
            });
        }

        let skip = if chunk_size == 0xFFFFFFFF {
            0
        } else {
            chunk_size as usize + (chunk_size as usize & 1)
        };
        pos += 8 + skip;
    }

    Err("data chunk not found")
}

/// Convert a run of interleaved frames to 16-bit samples. A trailing partial
/// frame is dropped.
pub fn frames_to_i16(data: &[u8], header: &WavHeader) -> Vec<i16> {
    let width = header.sample_width();
    let whole = data.len() - data.len() % header.block_align().max(1);
    let data = &data[..whole];

    match (header.float, width) {
        (true, _) => data
            .chunks_exact(4)
            .map(|b| {
                let v = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            })
            .collect(),
        (false, 1) => data.iter().map(|&b| ((b as i16) - 128) << 8).collect(),
        (false, 2) => data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect(),
        (false, 3) => data
            .chunks_exact(3)
            .map(|b| i16::from_le_bytes([b[1], b[2]]))
            .collect(),
        (false, _) => data
            .chunks_exact(4)
            .map(|b| i16::from_le_bytes([b[2], b[3]]))
            .collect(),
    }
}

/// Write a minimal WAV file (16-bit PCM) from interleaved samples. Used to
/// build playback and engine fixtures.
pub fn write_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let file_len = 36 + data_len;
    let block_align = channels * 2;
    let mut buf = Vec::with_capacity(44 + data_len as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_len.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes()); // byte rate
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}
