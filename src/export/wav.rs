//! WAV file export

use super::{apply_fade_out, mono_to_stereo, ExportConfig};
use crate::config::SampleFormat;
use crate::{ApuError, Result};
use std::path::Path;

/// Write mono 16-bit samples to a WAV file
///
/// # Examples
///
/// ```no_run
/// use nes_apu::export::write_wav;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let silence = vec![0i16; 44_100];
/// write_wav("silence.wav", &silence, 44_100)?;
/// # Ok(())
/// # }
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[i16], sample_rate: u32) -> Result<()> {
    write_wav_with_config(path, samples, &ExportConfig::with_sample_rate(sample_rate))
}

/// Write samples to a WAV file with custom configuration
pub fn write_wav_with_config<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    config: &ExportConfig,
) -> Result<()> {
    let mut samples = samples.to_vec();
    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, config.fade_out_duration, config.sample_rate);
    }
    let samples = if config.channels == 2 {
        mono_to_stereo(&samples)
    } else {
        samples
    };

    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: config.sample_format.bits() as u16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)
        .map_err(|e| ApuError::AudioFileError(format!("Failed to create WAV file: {e}")))?;

    for &sample in &samples {
        let written = match config.sample_format {
            // hound biases 8-bit samples to unsigned on disk
            SampleFormat::Unsigned8 => writer.write_sample((sample >> 8) as i8),
            SampleFormat::Signed16 => writer.write_sample(sample),
        };
        written.map_err(|e| ApuError::AudioFileError(format!("Failed to write sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| ApuError::AudioFileError(format!("Failed to finalize WAV file: {e}")))?;

    tracing::debug!(
        path = %path.as_ref().display(),
        samples = samples.len(),
        "WAV written"
    );
    Ok(())
}

/// Read a mono integer WAV file back as 16-bit samples
///
/// 8-bit files are widened by shifting into the high byte.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::open(path.as_ref())
        .map_err(|e| ApuError::AudioFileError(format!("Failed to open WAV file: {e}")))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.channels != 1 {
        return Err(ApuError::AudioFileError(format!(
            "expected mono integer PCM, got {} channel(s) of {:?}",
            spec.channels, spec.sample_format
        )));
    }

    match spec.bits_per_sample {
        16 => reader
            .samples::<i16>()
            .map(|s| s.map_err(|e| ApuError::AudioFileError(format!("Failed to read sample: {e}"))))
            .collect(),
        8 => reader
            .samples::<i8>()
            .map(|s| {
                s.map(|v| i16::from(v) << 8)
                    .map_err(|e| ApuError::AudioFileError(format!("Failed to read sample: {e}")))
            })
            .collect(),
        other => Err(ApuError::AudioFileError(format!(
            "unsupported bit depth {other}"
        ))),
    }
}
