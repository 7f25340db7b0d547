//! Pulse (rectangle) channels
//!
//! Both pulse channels share this implementation. The only behavioural
//! difference is the ramp-up sweep arithmetic, carried by [`PulseUnit`].

use super::envelope::{decay, Envelope, LengthCounter};
use super::tables::{to_fixed, ApuTables, DUTY_FLIP, FREQ_LIMIT, PULSE_FREQ_FLOOR};
use crate::config::Synthesis;

/// Sweep clocks per frame (120 Hz sweep / 60 Hz frame)
const SWEEP_STEP: i32 = 2;

/// Which of the two pulse channels this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseUnit {
    /// Pulse 1 (`$4000-$4003`): ramp-up adds the one's complement of the delta
    A,
    /// Pulse 2 (`$4004-$4007`): ramp-up subtracts the delta
    B,
}

impl PulseUnit {
    /// Apply one ramp-up sweep step.
    ///
    /// Pulse 1 negates with one's complement and so lands one lower than
    /// pulse 2 for the same delta. Hardware does the same.
    #[inline]
    fn ramp_up(self, freq: i32, delta: i32) -> i32 {
        match self {
            PulseUnit::A => freq + !delta,
            PulseUnit::B => freq - delta,
        }
    }
}

/// Pulse channel state
#[derive(Debug, Clone)]
pub struct PulseChannel {
    unit: PulseUnit,
    regs: [u8; 4],
    pub(crate) enabled: bool,
    envelope: Envelope,
    pub(crate) length: LengthCounter,
    duty_flip: u8,
    freq: i32,
    accum: i32,
    adder: u8,

    sweep_on: bool,
    sweep_shifts: u8,
    sweep_delay: i32,
    sweep_phase: i32,
    sweep_inc: bool,
    freq_limit: i32,

    output: i32,
}

impl PulseChannel {
    /// Create a silent, disabled channel
    pub fn new(unit: PulseUnit) -> Self {
        Self {
            unit,
            regs: [0; 4],
            enabled: false,
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            duty_flip: DUTY_FLIP[0],
            freq: 0,
            accum: 0,
            adder: 0,
            sweep_on: false,
            sweep_shifts: 0,
            sweep_delay: 0,
            sweep_phase: 0,
            sweep_inc: false,
            freq_limit: FREQ_LIMIT[0],
            output: 0,
        }
    }

    /// Which pulse channel this is
    pub fn unit(&self) -> PulseUnit {
        self.unit
    }

    /// Register write; `reg` is the offset within the channel (0-3)
    pub fn write(&mut self, reg: usize, value: u8, tables: &ApuTables) {
        self.regs[reg & 3] = value;
        match reg & 3 {
            0 => {
                self.envelope.write_control(value, tables);
                self.duty_flip = DUTY_FLIP[(value >> 6) as usize];
            }
            1 => {
                self.sweep_on = value & 0x80 != 0;
                self.sweep_shifts = value & 0x07;
                self.sweep_delay = tables.decay[((value >> 4) & 0x07) as usize];
                self.sweep_inc = value & 0x08 != 0;
                self.freq_limit = FREQ_LIMIT[(value & 0x07) as usize];
            }
            2 => {
                self.freq = (self.freq & !0xFF) | i32::from(value);
            }
            _ => {
                self.length.load(value, tables);
                self.envelope.restart();
                self.freq = (i32::from(value & 0x07) << 8) | (self.freq & 0xFF);
                self.adder = 0;
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

    /// Current 11-bit (plus sweep overflow) frequency
    pub fn frequency(&self) -> i32 {
        self.freq
    }

    /// Last output level
    pub fn output(&self) -> i32 {
        self.output
    }

    /// Advance one output tick and return the channel's contribution
    pub fn tick(&mut self, cycle_rate: i32, synthesis: Synthesis) -> i32 {
        self.output = decay(self.output);

        if !self.enabled || !self.length.is_active() {
            return self.output;
        }

        self.length.clock(self.envelope.hold);
        self.envelope.clock();

        if self.freq < PULSE_FREQ_FLOOR || (!self.sweep_inc && self.freq > self.freq_limit) {
            return self.output;
        }

        if self.sweep_on && self.sweep_shifts != 0 && self.sweep_delay > 0 {
            self.sweep_phase -= SWEEP_STEP;
            while self.sweep_phase < 0 {
                self.sweep_phase += self.sweep_delay;
                let delta = self.freq >> self.sweep_shifts;
                self.freq = if self.sweep_inc {
                    self.unit.ramp_up(self.freq, delta)
                } else {
                    self.freq + delta
                };
            }
        }

        self.accum -= cycle_rate;
        if self.accum >= 0 {
            return self.output;
        }

        let amplitude = self.envelope.amplitude();
        let mut total = 0;
        let mut steps = 0;
        // A ramp-up sweep may have pushed the period under the floor; the
        // clamp keeps the loop finite until the next tick mutes the channel.
        let period = to_fixed(self.freq.max(0) + 1);
        while self.accum < 0 {
            self.accum += period;
            self.adder = (self.adder + 1) & 0x0F;
            if self.adder < self.duty_flip {
                total += amplitude;
            } else {
                total -= amplitude;
            }
            steps += 1;
        }

        match synthesis {
            Synthesis::Oversampled => self.output = total / steps,
            Synthesis::SingleSample => {
                if self.adder == 0 {
                    self.output = amplitude;
                } else if self.adder == self.duty_flip {
                    self.output = -amplitude;
                }
            }
        }

        self.output
    }
}
