//! 2A03 APU Register Definitions
//!
//! The APU answers the `$4000-$4015` window. `$4009`, `$400D` and `$4014`
//! (sprite DMA) are not APU registers; writes there are ignored.

use std::fmt;

/// Lowest APU register address
pub const APU_BASE: u16 = 0x4000;
/// Status / channel enable register
pub const STATUS_ADDR: u16 = 0x4015;

/// APU register address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Register {
    /// Pulse 1 duty, loop, constant volume, volume - $4000
    PulseACtrl = 0x4000,
    /// Pulse 1 sweep - $4001
    PulseASweep = 0x4001,
    /// Pulse 1 timer low - $4002
    PulseAFreqLo = 0x4002,
    /// Pulse 1 length index, timer high - $4003
    PulseAFreqHi = 0x4003,
    /// Pulse 2 duty, loop, constant volume, volume - $4004
    PulseBCtrl = 0x4004,
    /// Pulse 2 sweep - $4005
    PulseBSweep = 0x4005,
    /// Pulse 2 timer low - $4006
    PulseBFreqLo = 0x4006,
    /// Pulse 2 length index, timer high - $4007
    PulseBFreqHi = 0x4007,
    /// Triangle hold, linear counter reload - $4008
    TriangleCtrl = 0x4008,
    /// Triangle timer low - $400A
    TriangleFreqLo = 0x400A,
    /// Triangle length index, timer high - $400B
    TriangleFreqHi = 0x400B,
    /// Noise loop, constant volume, volume - $400C
    NoiseCtrl = 0x400C,
    /// Noise mode, period index - $400E
    NoiseFreq = 0x400E,
    /// Noise length index - $400F
    NoiseLength = 0x400F,
    /// DMC IRQ enable, loop, rate index - $4010
    DmcCtrl = 0x4010,
    /// DMC direct DAC load - $4011
    DmcDac = 0x4011,
    /// DMC sample address - $4012
    DmcAddress = 0x4012,
    /// DMC sample length - $4013
    DmcLength = 0x4013,
    /// Channel enable (write) / status (read) - $4015
    Status = 0x4015,
}

impl Register {
    /// Decode a CPU address; `None` for anything the APU does not answer
    pub fn from_addr(addr: u16) -> Option<Self> {
        match addr {
            0x4000 => Some(Register::PulseACtrl),
            0x4001 => Some(Register::PulseASweep),
            0x4002 => Some(Register::PulseAFreqLo),
            0x4003 => Some(Register::PulseAFreqHi),
            0x4004 => Some(Register::PulseBCtrl),
            0x4005 => Some(Register::PulseBSweep),
            0x4006 => Some(Register::PulseBFreqLo),
            0x4007 => Some(Register::PulseBFreqHi),
            0x4008 => Some(Register::TriangleCtrl),
            0x400A => Some(Register::TriangleFreqLo),
            0x400B => Some(Register::TriangleFreqHi),
            0x400C => Some(Register::NoiseCtrl),
            0x400E => Some(Register::NoiseFreq),
            0x400F => Some(Register::NoiseLength),
            0x4010 => Some(Register::DmcCtrl),
            0x4011 => Some(Register::DmcDac),
            0x4012 => Some(Register::DmcAddress),
            0x4013 => Some(Register::DmcLength),
            0x4015 => Some(Register::Status),
            _ => None,
        }
    }

    /// CPU address of the register
    pub fn addr(&self) -> u16 {
        *self as u16
    }

    /// Offset within the owning channel's register group
    pub fn offset(&self) -> usize {
        match self {
            Register::PulseACtrl | Register::PulseBCtrl => 0,
            Register::PulseASweep | Register::PulseBSweep => 1,
            Register::PulseAFreqLo | Register::PulseBFreqLo => 2,
            Register::PulseAFreqHi | Register::PulseBFreqHi => 3,
            Register::TriangleCtrl | Register::NoiseCtrl => 0,
            Register::TriangleFreqLo | Register::NoiseFreq => 1,
            Register::TriangleFreqHi | Register::NoiseLength => 2,
            Register::DmcCtrl
            | Register::DmcDac
            | Register::DmcAddress
            | Register::DmcLength
            | Register::Status => (self.addr() - 0x4010) as usize,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::PulseACtrl => "Pulse A Control",
            Register::PulseASweep => "Pulse A Sweep",
            Register::PulseAFreqLo => "Pulse A Frequency Low",
            Register::PulseAFreqHi => "Pulse A Frequency High",
            Register::PulseBCtrl => "Pulse B Control",
            Register::PulseBSweep => "Pulse B Sweep",
            Register::PulseBFreqLo => "Pulse B Frequency Low",
            Register::PulseBFreqHi => "Pulse B Frequency High",
            Register::TriangleCtrl => "Triangle Control",
            Register::TriangleFreqLo => "Triangle Frequency Low",
            Register::TriangleFreqHi => "Triangle Frequency High",
            Register::NoiseCtrl => "Noise Control",
            Register::NoiseFreq => "Noise Frequency",
            Register::NoiseLength => "Noise Length",
            Register::DmcCtrl => "DMC Control",
            Register::DmcDac => "DMC DAC",
            Register::DmcAddress => "DMC Address",
            Register::DmcLength => "DMC Length",
            Register::Status => "Status",
        };
        write!(f, "${:04X} ({name})", self.addr())
    }
}
