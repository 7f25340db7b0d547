//! Fixed hardware tables and the sample-rate dependent lookup tables
//! derived from them.

/// Note lengths in video frames, indexed by the top 5 bits of the length register
pub const LENGTH_TABLE: [u8; 32] = [
    5, 127, 10, 1, 19, 2, 40, 3, 80, 4, 30, 5, 7, 6, 13, 7, 6, 8, 12, 9, 24, 10, 48, 11, 96, 12, 36,
    13, 8, 14, 16, 15,
];

/// Pulse frequency ceilings, indexed by the sweep shift count
pub const FREQ_LIMIT: [i32; 8] = [0x3FF, 0x555, 0x666, 0x71C, 0x787, 0x7C1, 0x7E0, 0x7F0];

/// Duty adder flip points (12.5%, 25%, 50%, 75% of a 16-step cycle)
pub const DUTY_FLIP: [u8; 4] = [2, 4, 8, 12];

/// Noise timer periods in CPU cycles
pub const NOISE_PERIODS: [i32; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// DMC bit periods in CPU cycles
pub const DMC_PERIODS: [i32; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 85, 72, 54,
];

/// Long noise sequence length
pub const NOISE_LONG_LEN: usize = 0x7FFF;
/// Short noise sequence length
pub const NOISE_SHORT_LEN: usize = 93;

/// Pulse frequencies below this are inaudible and mute the channel
pub const PULSE_FREQ_FLOOR: i32 = 8;
/// Triangle timer periods below this are inaudible
pub const TRIANGLE_PERIOD_FLOOR: i32 = 4;

/// CPU cycles between a `$400B` write and the linear counter starting
pub const TRIANGLE_WRITE_LATENCY_CYCLES: i32 = 228;

/// Convert an integer to 16.16 fixed point
#[inline]
pub const fn to_fixed(value: i32) -> i32 {
    value << 16
}

/// Noise shift register mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseMode {
    /// 32767-step sequence (feedback from bit 1)
    #[default]
    Long,
    /// 93-step sequence (feedback from bit 6)
    Short,
}

impl NoiseMode {
    /// Mode selected by `$400E` bit 7
    pub fn from_register(value: u8) -> Self {
        if value & 0x80 != 0 {
            NoiseMode::Short
        } else {
            NoiseMode::Long
        }
    }

    #[inline]
    fn tap_mask(self) -> u16 {
        match self {
            NoiseMode::Long => 0x02,
            NoiseMode::Short => 0x40,
        }
    }
}

/// 15-bit linear feedback shift register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lfsr {
    state: u16,
}

impl Lfsr {
    /// Power-on value of the shift register
    pub const SEED: u16 = 0x4000;

    /// Create a register at the power-on seed
    pub fn new() -> Self {
        Self { state: Self::SEED }
    }

    /// Current register contents
    pub fn state(&self) -> u16 {
        self.state
    }

    /// Shift once and return the output bit (inverted bit 0 before the shift)
    #[inline]
    pub fn clock(&mut self, mode: NoiseMode) -> bool {
        let bit0 = self.state & 1;
        let tap = u16::from(self.state & mode.tap_mask() != 0);
        self.state = (self.state >> 1) | ((bit0 ^ tap) << 14);
        bit0 == 0
    }

    /// Fill `buf` with consecutive output bits
    pub fn fill(&mut self, buf: &mut [bool], mode: NoiseMode) {
        for bit in buf.iter_mut() {
            *bit = self.clock(mode);
        }
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup tables scaled to the output sample rate
///
/// All timing tables are in output-sample ticks: one frame equals
/// `samples_per_frame` ticks.
#[derive(Clone)]
pub struct ApuTables {
    /// Ticks per frame the tables were built for
    pub samples_per_frame: i32,
    /// Envelope/sweep reload periods
    pub decay: [i32; 16],
    /// Note lengths
    pub length: [i32; 32],
    /// Triangle linear lengths (quarter frames)
    pub linear: [i32; 128],
    /// Long noise sequence
    pub noise_long: Box<[bool]>,
    /// Short noise sequence as generated at build time
    pub noise_short: [bool; NOISE_SHORT_LEN],
    /// Shift register state after both sequences were generated
    pub lfsr: Lfsr,
}

impl ApuTables {
    /// Build every table for the given frame length
    pub fn build(samples_per_frame: i32) -> Self {
        let mut decay = [0; 16];
        for (i, entry) in decay.iter_mut().enumerate() {
            *entry = samples_per_frame * (i as i32 + 1);
        }

        let mut length = [0; 32];
        for (entry, &frames) in length.iter_mut().zip(LENGTH_TABLE.iter()) {
            *entry = i32::from(frames) * samples_per_frame;
        }

        let mut linear = [0; 128];
        for (i, entry) in linear.iter_mut().enumerate() {
            *entry = (i as i32 * samples_per_frame) / 4;
        }

        let mut lfsr = Lfsr::new();
        let mut noise_long = vec![false; NOISE_LONG_LEN].into_boxed_slice();
        lfsr.fill(&mut noise_long, NoiseMode::Long);
        let mut noise_short = [false; NOISE_SHORT_LEN];
        lfsr.fill(&mut noise_short, NoiseMode::Short);

        Self {
            samples_per_frame,
            decay,
            length,
            linear,
            noise_long,
            noise_short,
            lfsr,
        }
    }

    /// Note length for a length/frequency-high register value
    #[inline]
    pub fn note_length(&self, register: u8) -> i32 {
        self.length[(register >> 3) as usize]
    }
}

impl std::fmt::Debug for ApuTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApuTables")
            .field("samples_per_frame", &self.samples_per_frame)
            .field("decay", &self.decay)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_scale_with_frame_length() {
        let tables = ApuTables::build(735);
        assert_eq!(tables.decay[0], 735);
        assert_eq!(tables.decay[15], 735 * 16);
        assert_eq!(tables.length[1], 127 * 735);
        assert_eq!(tables.linear[4], 735);
        assert_eq!(tables.linear[127], 127 * 735 / 4);
    }

    #[test]
    fn test_note_length_uses_top_five_bits() {
        let tables = ApuTables::build(100);
        assert_eq!(tables.note_length(0x08), 127 * 100);
        assert_eq!(tables.note_length(0x0F), 127 * 100); // low bits are frequency
        assert_eq!(tables.note_length(0xF8), 15 * 100);
    }

    #[test]
    fn test_lfsr_long_period() {
        let mut lfsr = Lfsr::new();
        let start = lfsr.state();
        let mut period = 0;
        loop {
            lfsr.clock(NoiseMode::Long);
            period += 1;
            if lfsr.state() == start {
                break;
            }
        }
        assert_eq!(period, NOISE_LONG_LEN);
    }

    #[test]
    fn test_short_sequence_repeats_every_93_steps() {
        let mut lfsr = Lfsr::new();
        // Settle onto the short cycle first
        for _ in 0..200 {
            lfsr.clock(NoiseMode::Short);
        }
        let mut first = [false; NOISE_SHORT_LEN];
        let mut second = [false; NOISE_SHORT_LEN];
        lfsr.fill(&mut first, NoiseMode::Short);
        lfsr.fill(&mut second, NoiseMode::Short);
        assert_eq!(first, second);
    }

    #[test]
    fn test_table_build_is_deterministic() {
        let a = ApuTables::build(735);
        let b = ApuTables::build(735);
        assert_eq!(a.noise_long, b.noise_long);
        assert_eq!(a.noise_short, b.noise_short);
        assert_eq!(a.lfsr, b.lfsr);
    }

    #[test]
    fn test_lfsr_first_bits() {
        // 0x4000: bit 0 is clear, so the first outputs are 1s until the seed bit arrives
        let mut lfsr = Lfsr::new();
        assert!(lfsr.clock(NoiseMode::Long));
        assert_eq!(lfsr.state(), 0x2000);
    }
}
