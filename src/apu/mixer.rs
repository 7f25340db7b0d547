//! APU Output Mixer
//!
//! Sums the per-tick channel outputs, optionally smooths the composite and
//! clips it to the output sample width.
//!
//! Features:
//! - Per-channel mix mask (masked channels are not advanced either)
//! - Two-tap low-pass and 3:1 weighted filters
//! - Signed 16-bit and biased unsigned 8-bit output

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::SampleFormat;
use crate::ApuError;

bitflags! {
    /// Channel mix mask
    ///
    /// A cleared bit removes the channel from the mix and stops it from
    /// being ticked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u8 {
        /// Pulse 1
        const PULSE_A = 0x01;
        /// Pulse 2
        const PULSE_B = 0x02;
        /// Triangle
        const TRIANGLE = 0x04;
        /// Noise
        const NOISE = 0x08;
        /// Delta modulation
        const DMC = 0x10;
        /// Expansion audio
        const EXTENSION = 0x20;
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        ChannelMask::all()
    }
}

/// One of the mixable channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Pulse 1
    PulseA,
    /// Pulse 2
    PulseB,
    /// Triangle
    Triangle,
    /// Noise
    Noise,
    /// Delta modulation
    Dmc,
    /// Expansion audio
    Extension,
}

impl Channel {
    /// All channels in mask-bit order
    pub const ALL: [Channel; 6] = [
        Channel::PulseA,
        Channel::PulseB,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
        Channel::Extension,
    ];

    /// Mask bit for this channel
    pub fn mask(self) -> ChannelMask {
        match self {
            Channel::PulseA => ChannelMask::PULSE_A,
            Channel::PulseB => ChannelMask::PULSE_B,
            Channel::Triangle => ChannelMask::TRIANGLE,
            Channel::Noise => ChannelMask::NOISE,
            Channel::Dmc => ChannelMask::DMC,
            Channel::Extension => ChannelMask::EXTENSION,
        }
    }

    /// Channel for a mask-bit index (0-5)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::PulseA => "pulse A",
            Channel::PulseB => "pulse B",
            Channel::Triangle => "triangle",
            Channel::Noise => "noise",
            Channel::Dmc => "DMC",
            Channel::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// Output filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Raw composite
    #[default]
    None,
    /// Average with the previous composite
    LowPass,
    /// Three parts current to one part previous
    Weighted,
}

impl FromStr for FilterType {
    type Err = ApuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FilterType::None),
            "lowpass" | "low_pass" | "low-pass" => Ok(FilterType::LowPass),
            "weighted" => Ok(FilterType::Weighted),
            other => Err(ApuError::ConfigError(format!("unknown filter type '{other}'"))),
        }
    }
}

/// Destination for [`Apu::process`](crate::Apu::process)
///
/// The variant picks the storage: `Signed16` stores clipped samples,
/// `Unsigned8` stores the high byte biased by 0x80. With an 8-bit configured
/// sample width a `Signed16` buffer receives the same 8-bit resolution,
/// shifted back up to 16 bits.
#[derive(Debug)]
pub enum OutputBuffer<'a> {
    /// Signed 16-bit PCM
    Signed16(&'a mut [i16]),
    /// Unsigned 8-bit PCM
    Unsigned8(&'a mut [u8]),
}

impl OutputBuffer<'_> {
    /// Number of sample slots
    pub fn len(&self) -> usize {
        match self {
            OutputBuffer::Signed16(buf) => buf.len(),
            OutputBuffer::Unsigned8(buf) => buf.len(),
        }
    }

    /// True if there are no slots
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a clipped sample at `index`; out-of-range indices are skipped
    #[inline]
    pub fn store(&mut self, index: usize, sample: i16) {
        match self {
            OutputBuffer::Signed16(buf) => {
                if let Some(slot) = buf.get_mut(index) {
                    *slot = sample;
                }
            }
            OutputBuffer::Unsigned8(buf) => {
                if let Some(slot) = buf.get_mut(index) {
                    *slot = to_u8(sample);
                }
            }
        }
    }
}

/// 16-bit sample to biased 8-bit
#[inline]
pub fn to_u8(sample: i16) -> u8 {
    ((sample >> 8) as u8) ^ 0x80
}

/// Drop the low bits a sample width cannot carry
#[inline]
pub fn quantize(sample: i16, format: SampleFormat) -> i16 {
    match format {
        SampleFormat::Unsigned8 => sample & !0xFF,
        SampleFormat::Signed16 => sample,
    }
}

/// Composite filter and clipper
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    filter: FilterType,
    prev: i32,
}

impl Mixer {
    /// Create a mixer with the given filter
    pub fn new(filter: FilterType) -> Self {
        Self { filter, prev: 0 }
    }

    /// Current filter
    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Change the filter; filter history is kept
    pub fn set_filter(&mut self, filter: FilterType) {
        self.filter = filter;
    }

    /// Forget the previous composite
    pub fn reset(&mut self) {
        self.prev = 0;
    }

    /// Filter, double and clip one composite sample
    #[inline]
    pub fn mix(&mut self, composite: i32) -> i16 {
        let filtered = match self.filter {
            FilterType::None => composite,
            FilterType::LowPass => (composite + self.prev) >> 1,
            FilterType::Weighted => (composite * 3 + self.prev) >> 2,
        };
        self.prev = composite;

        (filtered << 1).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }
}
