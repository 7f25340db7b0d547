//! Audio export for rendered APU output
//!
//! # Examples
//!
//! ```no_run
//! use nes_apu::export::write_wav;
//! use nes_apu::{render_log, Apu, NullBus, RegisterLog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = RegisterLog::load("capture.json")?;
//! let mut apu = Apu::new(log.config)?;
//! let samples = render_log(&mut apu, &mut NullBus, &log, log.sample_count())?;
//!
//! write_wav("capture.wav", &samples, log.config.sample_rate)?;
//! # Ok(())
//! # }
//! ```

mod wav;
pub use wav::*;

use crate::config::{ApuConfig, SampleFormat, DEFAULT_SAMPLE_RATE};

/// Export configuration options
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Sample rate written to the header (default: 44100 Hz)
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono, 2 = duplicated stereo)
    pub channels: u16,
    /// Sample width on disk
    pub sample_format: SampleFormat,
    /// Fade out duration in seconds (0 = no fade)
    pub fade_out_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            sample_format: SampleFormat::Signed16,
            fade_out_duration: 0.0,
        }
    }
}

impl ExportConfig {
    /// Create config for stereo export
    pub fn stereo() -> Self {
        Self {
            channels: 2,
            ..Default::default()
        }
    }

    /// Create config with custom sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Sample rate and width of the APU that rendered the samples
    pub fn for_apu(config: &ApuConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            sample_format: config.sample_format,
            ..Default::default()
        }
    }

    /// Set the on-disk sample width
    pub fn sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds;
        self
    }
}

/// Linear fade to silence over the last `duration` seconds
fn apply_fade_out(samples: &mut [i16], duration: f32, sample_rate: u32) {
    let fade = ((duration.max(0.0) * sample_rate as f32) as usize).min(samples.len());
    if fade == 0 {
        return;
    }
    let start = samples.len() - fade;
    for (i, sample) in samples[start..].iter_mut().enumerate() {
        let gain = 1.0 - (i as f32 + 1.0) / fade as f32;
        *sample = (f32::from(*sample) * gain) as i16;
    }
}

/// Duplicate each sample into a left/right pair
fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        stereo.push(sample);
        stereo.push(sample);
    }
    stereo
}
