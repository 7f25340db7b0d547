//! Triangle channel
//!
//! No envelope: the amplitude comes from the 32-step ramp itself. The linear
//! counter only starts after a short latency following a `$400B` write, so a
//! driver that writes the frequency registers before `$4008` in the same
//! frame does not start the counter early.

use super::envelope::{decay, LengthCounter};
use super::tables::{to_fixed, ApuTables, TRIANGLE_PERIOD_FLOOR};

/// Level change per ramp step
const RAMP_STEP: i32 = 2 << 8;

/// Triangle channel state
#[derive(Debug, Clone)]
pub struct TriangleChannel {
    regs: [u8; 3],
    pub(crate) enabled: bool,
    hold: bool,
    pub(crate) length: LengthCounter,
    pub(crate) linear_length: i32,
    pub(crate) counter_started: bool,
    pub(crate) write_latency: i32,
    /// Timer period in 16.16 fixed point
    freq: i32,
    accum: i32,
    adder: u8,
    output: i32,
}

impl TriangleChannel {
    /// Create a silent, disabled channel
    pub fn new() -> Self {
        Self {
            regs: [0; 3],
            enabled: false,
            hold: false,
            length: LengthCounter::default(),
            linear_length: 0,
            counter_started: false,
            write_latency: 0,
            freq: 0,
            accum: 0,
            adder: 0,
            output: 0,
        }
    }

    /// Register write; `reg` 0 is `$4008`, 1 is `$400A`, 2 is `$400B`
    pub fn write(&mut self, reg: usize, value: u8, tables: &ApuTables, latency_ticks: i32) {
        match reg {
            0 => {
                self.regs[0] = value;
                self.hold = value & 0x80 != 0;
                if !self.counter_started && self.length.is_active() {
                    self.linear_length = tables.linear[(value & 0x7F) as usize];
                }
            }
            1 => {
                self.regs[1] = value;
                self.freq = to_fixed(self.period(self.regs[2], value));
            }
            _ => {
                self.regs[2] = value;
                self.write_latency = latency_ticks;
                self.freq = to_fixed(self.period(value, self.regs[1]));
                self.length.load(value, tables);
                self.counter_started = false;
                self.linear_length = tables.linear[(self.regs[0] & 0x7F) as usize];
            }
        }
    }

    #[inline]
    fn period(&self, high: u8, low: u8) -> i32 {
        ((i32::from(high & 0x07) << 8) | i32::from(low)) + 1
    }

    /// `$4015` enable bit
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.clear();
            self.linear_length = 0;
            self.counter_started = false;
            self.write_latency = 0;
        }
    }

    /// Enabled with a running length counter
    pub fn is_playing(&self) -> bool {
        self.enabled && self.length.is_active()
    }

    /// Raw 11-bit timer value
    pub fn frequency(&self) -> i32 {
        (self.freq >> 16) - 1
    }

    /// Mixed contribution: raw level plus a quarter
    #[inline]
    pub fn output(&self) -> i32 {
        self.output + (self.output >> 2)
    }

    /// Advance one output tick and return the channel's contribution
    pub fn tick(&mut self, cycle_rate: i32) -> i32 {
        self.output = decay(self.output);

        if !self.enabled || !self.length.is_active() {
            return self.output();
        }

        if self.counter_started {
            if self.linear_length > 0 {
                self.linear_length -= 1;
            }
            self.length.clock(self.hold);
        } else if !self.hold && self.write_latency > 0 {
            self.write_latency -= 1;
            if self.write_latency == 0 {
                self.counter_started = true;
            }
        }

        if self.linear_length == 0 || self.freq < to_fixed(TRIANGLE_PERIOD_FLOOR) {
            return self.output();
        }

        self.accum -= cycle_rate;
        while self.accum < 0 {
            self.accum += self.freq;
            self.adder = (self.adder + 1) & 0x1F;
            if self.adder & 0x10 != 0 {
                self.output -= RAMP_STEP;
            } else {
                self.output += RAMP_STEP;
            }
        }

        self.output()
    }
}

impl Default for TriangleChannel {
    fn default() -> Self {
        Self::new()
    }
}
