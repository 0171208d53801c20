// Sample loader - Decode WAV/FLAC blobs into interleaved f32 buffers
//
// Blobs come from the sample store as raw bytes, so the format is sniffed
// from the header instead of a file extension.

use claxon::FlacReader;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// Errors raised while decoding or storing sample data
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Unsupported audio format")]
    UnsupportedFormat,

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC error: {0}")]
    Flac(#[from] claxon::Error),

    #[error("Audio data is empty")]
    Empty,

    #[error("Sample '{0}' not found in store")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded audio, interleaved
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            samples,
        }
    }

    /// Number of sample frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Peak absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

/// Decode a WAV or FLAC blob
pub fn decode_audio(bytes: &[u8]) -> Result<AudioBuffer, SampleError> {
    let buffer = if bytes.starts_with(b"RIFF") {
        decode_wav(bytes)?
    } else if bytes.starts_with(b"fLaC") {
        decode_flac(bytes)?
    } else {
        return Err(SampleError::UnsupportedFormat);
    };

    if buffer.samples.is_empty() {
        return Err(SampleError::Empty);
    }
    Ok(buffer)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, SampleError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioBuffer::new(spec.sample_rate, spec.channels, samples))
}

fn decode_flac(bytes: &[u8]) -> Result<AudioBuffer, SampleError> {
    let mut reader = FlacReader::new(Cursor::new(bytes))?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample.max(1) - 1)) as f32;

    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<_, _>>()?;

    Ok(AudioBuffer::new(info.sample_rate, info.channels as u16, samples))
}

/// Encode a buffer as 16-bit PCM WAV
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, SampleError> {
    let spec = WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in &buffer.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
