//! APU setup parameters
//!
//! Everything here is resolved once at construction (or on
//! [`Apu::reconfigure`](crate::Apu::reconfigure)); nothing in the per-sample
//! path reads the floating-point fields.

use serde::{Deserialize, Serialize};

use crate::apu::FilterType;
use crate::{ApuError, Result};

/// NTSC 2A03 CPU clock in Hz
pub const NTSC_CPU_CLOCK: f64 = 1_789_772.727_272_727_3;
/// PAL 2A07 CPU clock in Hz
pub const PAL_CPU_CLOCK: f64 = 1_662_607.031_25;

/// Default output sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Highest accepted output sample rate
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Output sample width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Unsigned 8-bit PCM (biased at 0x80)
    Unsigned8,
    /// Signed 16-bit PCM
    #[default]
    Signed16,
}

impl SampleFormat {
    /// Build from a bit width (8 or 16)
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(SampleFormat::Unsigned8),
            16 => Ok(SampleFormat::Signed16),
            other => Err(ApuError::ConfigError(format!(
                "unsupported sample width {other} (expected 8 or 16)"
            ))),
        }
    }

    /// Bits per sample
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::Unsigned8 => 8,
            SampleFormat::Signed16 => 16,
        }
    }
}

/// Pulse/noise synthesis strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Synthesis {
    /// Average every waveform step that falls inside one output sample
    #[default]
    Oversampled,
    /// Latch the waveform once per output sample (aliases at high pitches)
    SingleSample,
}

/// Noise bit source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseStrategy {
    /// Walk precomputed long/short bit tables
    #[default]
    Precomputed,
    /// Clock the shift register on every step
    Realtime,
}

/// APU configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApuConfig {
    /// CPU clock driving the channel timers, in Hz
    pub base_frequency: f64,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Video refresh rate in Hz; one length-table unit is one refresh
    pub refresh_rate: u32,
    /// Output sample width
    pub sample_format: SampleFormat,
    /// Pulse/noise synthesis strategy
    pub synthesis: Synthesis,
    /// Noise bit source
    pub noise: NoiseStrategy,
    /// Initial output filter
    pub filter: FilterType,
}

impl Default for ApuConfig {
    fn default() -> Self {
        Self::ntsc(DEFAULT_SAMPLE_RATE)
    }
}

impl ApuConfig {
    /// NTSC timing (1.79 MHz, 60 Hz) at the given sample rate
    pub fn ntsc(sample_rate: u32) -> Self {
        Self {
            base_frequency: NTSC_CPU_CLOCK,
            sample_rate,
            refresh_rate: 60,
            sample_format: SampleFormat::Signed16,
            synthesis: Synthesis::Oversampled,
            noise: NoiseStrategy::Precomputed,
            filter: FilterType::None,
        }
    }

    /// PAL timing (1.66 MHz, 50 Hz) at the given sample rate
    pub fn pal(sample_rate: u32) -> Self {
        Self {
            base_frequency: PAL_CPU_CLOCK,
            refresh_rate: 50,
            ..Self::ntsc(sample_rate)
        }
    }

    /// Builder-style setter for the sample width
    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    /// Builder-style setter for the synthesis strategy
    pub fn with_synthesis(mut self, synthesis: Synthesis) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// Builder-style setter for the noise strategy
    pub fn with_noise(mut self, noise: NoiseStrategy) -> Self {
        self.noise = noise;
        self
    }

    /// Builder-style setter for the initial filter
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Output samples per video frame (the length-counter time base)
    pub fn samples_per_frame(&self) -> i32 {
        (self.sample_rate / self.refresh_rate.max(1)) as i32
    }

    /// CPU cycles per output sample in 16.16 fixed point
    pub fn cycle_rate(&self) -> i32 {
        (self.base_frequency * 65536.0 / f64::from(self.sample_rate.max(1))) as i32
    }

    /// Whole CPU cycles per output sample
    pub fn cycles_per_sample(&self) -> i32 {
        self.cycle_rate() >> 16
    }

    /// Check the configuration before any table is built
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ApuError::ConfigError(format!(
                "sample rate {} out of range 1..={MAX_SAMPLE_RATE}",
                self.sample_rate
            )));
        }
        if self.refresh_rate == 0 || self.refresh_rate > self.sample_rate {
            return Err(ApuError::ConfigError(format!(
                "refresh rate {} must be between 1 and the sample rate",
                self.refresh_rate
            )));
        }
        if !self.base_frequency.is_finite() || self.base_frequency < f64::from(self.sample_rate) {
            return Err(ApuError::ConfigError(format!(
                "base frequency {} must be at least the sample rate",
                self.base_frequency
            )));
        }
        // 16.16 cycle rate has to fit the channel accumulators
        if self.base_frequency / f64::from(self.sample_rate) >= 32_768.0 {
            return Err(ApuError::ConfigError(format!(
                "base frequency {} too high for sample rate {}",
                self.base_frequency, self.sample_rate
            )));
        }
        Ok(())
    }
}
