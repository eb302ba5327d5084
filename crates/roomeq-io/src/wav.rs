//! Multi-channel WAV reading and writing.
//!
//! Channels are kept planar (`Vec<Vec<f32>>`, one vector per channel) since
//! measurements store each channel's impulse response separately. Files are
//! written as 32-bit float; integer PCM is accepted on read.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Read a WAV file into one sample vector per channel.
///
/// Returns the channels and the file's sample rate. Integer PCM is scaled
/// to `[-1, 1)`.
pub fn read_wav_channels<P: AsRef<Path>>(path: P) -> Result<(Vec<Vec<f32>>, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok((planar, spec.sample_rate))
}

/// Write planar channels to a 32-bit float WAV file.
///
/// Shorter channels are zero-padded to the longest one.
pub fn write_wav_channels<P: AsRef<Path>>(
    path: P,
    channels: &[Vec<f32>],
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: u16::try_from(channels.len().max(1)).unwrap_or(u16::MAX),
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;

    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
    for i in 0..frames {
        for channel in channels {
            writer.write_sample(channel.get(i).copied().unwrap_or(0.0))?;
        }
    }

    writer.finalize()?;
    tracing::debug!(channels = channels.len(), frames, sample_rate, "wrote WAV");
    Ok(())
}
