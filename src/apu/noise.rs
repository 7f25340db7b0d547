//! Noise channel
//!
//! Envelope, length counter and decay behave exactly as on the pulse
//! channels. The waveform comes from the 15-bit LFSR, either clocked on
//! every step or read back from tables generated up front.

use super::envelope::{decay, Envelope, LengthCounter};
use super::tables::{to_fixed, ApuTables, Lfsr, NoiseMode, NOISE_PERIODS, NOISE_SHORT_LEN};
use crate::config::{NoiseStrategy, Synthesis};

/// Noise channel state
#[derive(Debug, Clone)]
pub struct NoiseChannel {
    regs: [u8; 3],
    pub(crate) enabled: bool,
    envelope: Envelope,
    pub(crate) length: LengthCounter,
    /// Timer period in 16.16 fixed point
    freq: i32,
    accum: i32,
    mode: NoiseMode,
    strategy: NoiseStrategy,
    lfsr: Lfsr,
    short_table: [bool; NOISE_SHORT_LEN],
    cursor: usize,
    output: i32,
}

impl NoiseChannel {
    /// Create a silent, disabled channel seeded from the built tables
    pub fn new(tables: &ApuTables, strategy: NoiseStrategy) -> Self {
        Self {
            regs: [0; 3],
            enabled: false,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            freq: to_fixed(NOISE_PERIODS[0]),
            accum: 0,
            mode: NoiseMode::Long,
            strategy,
            lfsr: tables.lfsr,
            short_table: tables.noise_short,
            cursor: 0,
            output: 0,
        }
    }

    /// Register write; `reg` 0 is `$400C`, 1 is `$400E`, 2 is `$400F`
    pub fn write(&mut self, reg: usize, value: u8, tables: &ApuTables) {
        match reg {
            0 => {
                self.regs[0] = value;
                self.envelope.write_control(value, tables);
            }
            1 => {
                self.regs[1] = value;
                self.freq = to_fixed(NOISE_PERIODS[(value & 0x0F) as usize]);
                let mode = NoiseMode::from_register(value);
                if mode == NoiseMode::Short
                    && self.mode == NoiseMode::Long
                    && self.strategy == NoiseStrategy::Precomputed
                {
                    self.lfsr.fill(&mut self.short_table, NoiseMode::Short);
                    self.cursor = 0;
                }
                self.mode = mode;
            }
            _ => {
                self.regs[2] = value;
                self.length.load(value, tables);
                self.envelope.restart();
            }
        }
    }

    /// `$4015` enable bit
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.clear();
        }
    }

    /// Enabled with a running length counter
    pub fn is_playing(&self) -> bool {
        self.enabled && self.length.is_active()
    }

    /// Timer period in CPU cycles
    pub fn frequency(&self) -> i32 {
        self.freq >> 16
    }

    /// Current shift register mode
    pub fn mode(&self) -> NoiseMode {
        self.mode
    }

    /// Last output level
    pub fn output(&self) -> i32 {
        self.output
    }

    #[inline]
    fn next_bit(&mut self, long_table: &[bool]) -> bool {
        match self.strategy {
            NoiseStrategy::Realtime => self.lfsr.clock(self.mode),
            NoiseStrategy::Precomputed => {
                let table: &[bool] = match self.mode {
                    NoiseMode::Long => long_table,
                    NoiseMode::Short => &self.short_table,
                };
                if table.is_empty() {
                    return false;
                }
                if self.cursor >= table.len() {
                    self.cursor = 0;
                }
                let bit = table[self.cursor];
                self.cursor += 1;
                bit
            }
        }
    }

    /// Advance one output tick and return the channel's contribution
    pub fn tick(&mut self, cycle_rate: i32, synthesis: Synthesis, long_table: &[bool]) -> i32 {
        self.output = decay(self.output);

        if !self.enabled || !self.length.is_active() {
            return self.output;
        }

        self.length.clock(self.envelope.hold);
        self.envelope.clock();

        self.accum -= cycle_rate;
        if self.accum >= 0 {
            return self.output;
        }

        let amplitude = self.envelope.amplitude();
        let mut total = 0;
        let mut steps = 0;
        let mut last = false;
        while self.accum < 0 {
            self.accum += self.freq;
            last = self.next_bit(long_table);
            if last {
                total += amplitude;
            } else {
                total -= amplitude;
            }
            steps += 1;
        }

        self.output = match synthesis {
            Synthesis::Oversampled => total / steps,
            Synthesis::SingleSample if last => amplitude,
            Synthesis::SingleSample => -amplitude,
        };

        self.output
    }
}
