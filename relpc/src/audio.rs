use anyhow::{bail, Context, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio, downmixed to one channel
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// mono samples in [-1.0, 1.0]
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    /// channel count of the source before downmixing
    pub channels: usize,
}

impl DecodedAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Read an audio file and average its channels into mono `f64`
pub fn read_mono_file(path: &Path) -> Result<DecodedAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_mono_from_source(mss, path.extension().and_then(|e| e.to_str()))
}

/// Read audio from an in-memory file
pub fn read_mono_from_bytes(bytes: &[u8]) -> Result<DecodedAudio> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_mono_from_source(mss, None)
}

fn read_mono_from_source(mss: MediaSourceStream, extension: Option<&str>) -> Result<DecodedAudio> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channels = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        append_mono(&decoded, &mut samples);
    }

    log::debug!(
        "decoded {} mono samples at {} Hz from {} channel(s)",
        samples.len(),
        sample_rate,
        channels
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

fn append_mono(buffer: &AudioBufferRef, samples: &mut Vec<f64>) {
    let mut converted: AudioBuffer<f64> = buffer.make_equivalent();
    buffer.convert(&mut converted);

    let channels = converted.spec().channels.count();
    if channels == 0 {
        return;
    }
    let scale = 1.0 / channels as f64;

    samples.reserve(converted.frames());
    for frame in 0..converted.frames() {
        let sum: f64 = (0..channels).map(|ch| converted.chan(ch)[frame]).sum();
        samples.push(sum * scale);
    }
}

/// Write interleaved samples to a 16-bit PCM WAV file
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32, channels: usize) -> Result<()> {
    let bytes = write_wav_to_bytes(samples, sample_rate, channels)?;
    std::fs::write(path, bytes).context("Failed to write WAV file")
}

/// Encode interleaved samples as 16-bit PCM WAV in memory
pub fn write_wav_to_bytes(samples: &[f64], sample_rate: u32, channels: usize) -> Result<Vec<u8>> {
    let bytes_per_sample = 2;
    if channels == 0 || channels > (u16::MAX / bytes_per_sample) as usize {
        bail!("Invalid channel count: {}", channels);
    }
    if samples.len() % channels != 0 {
        bail!(
            "{} samples do not divide into {} channels",
            samples.len(),
            channels
        );
    }

    let block_align = channels as u16 * bytes_per_sample;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .with_context(|| format!("Byte rate overflows at {} Hz", sample_rate))?;
    let data_size = samples
        .len()
        .checked_mul(bytes_per_sample as usize)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .context("Too many samples for a WAV file")?;
    let mut buffer = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buffer.write_all(b"RIFF")?;
    buffer.write_all(&(36 + data_size).to_le_bytes())?;
    buffer.write_all(b"WAVE")?;

    // fmt chunk
    buffer.write_all(b"fmt ")?;
    buffer.write_all(&16u32.to_le_bytes())?;
    buffer.write_all(&1u16.to_le_bytes())?; // PCM
    buffer.write_all(&(channels as u16).to_le_bytes())?;
    buffer.write_all(&sample_rate.to_le_bytes())?;
    buffer.write_all(&byte_rate.to_le_bytes())?;
    buffer.write_all(&block_align.to_le_bytes())?;
    buffer.write_all(&16u16.to_le_bytes())?;

    // data chunk
    buffer.write_all(b"data")?;
    buffer.write_all(&data_size.to_le_bytes())?;
    for &sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        buffer.write_all(&quantized.to_le_bytes())?;
    }

    Ok(buffer)
}
