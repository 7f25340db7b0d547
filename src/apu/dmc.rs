//! Delta-modulation channel
//!
//! Plays 1-bit delta samples fetched from CPU memory. Every eighth bit costs
//! one bus read and one stolen CPU cycle; a finished non-looping sample can
//! raise an IRQ. There is no envelope and no decay: the DAC level holds
//! until something moves it.

use super::tables::{to_fixed, DMC_PERIODS};
use crate::bus::{ApuEvents, HostBus};

/// DAC change per delta bit
const DAC_STEP: u8 = 2;
/// Highest level a set bit can reach
const DAC_CEILING: u8 = 0x7D;
/// Lowest level a clear bit can reach
const DAC_FLOOR: u8 = 1;
/// Sample addresses wrap from `$FFFF` back here
const SAMPLE_WRAP: u16 = 0x8000;

/// Read-only view of the DMC for hosts and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmcSnapshot {
    /// `$4015` bit 4 latch
    pub enabled: bool,
    /// `$4010` bit 7
    pub irq_enabled: bool,
    /// IRQ pending
    pub irq_occurred: bool,
    /// `$4010` bit 6
    pub looping: bool,
    /// Next fetch address
    pub address: u16,
    /// Delta bits left in the current sample
    pub bits_remaining: u32,
    /// 7-bit DAC level
    pub dac_level: u8,
    /// Running output accumulator
    pub output: i32,
    /// Bit period in CPU cycles
    pub period: i32,
}

/// DMC state
#[derive(Debug, Clone)]
pub struct DmcChannel {
    regs: [u8; 4],
    pub(crate) enabled: bool,
    looping: bool,
    irq_gen: bool,
    pub(crate) irq_occurred: bool,

    freq: i32,
    accum: i32,

    address: u16,
    dma_length: u32,
    cached_address: u16,
    cached_length: u32,
    cur_byte: u8,

    level: u8,
    output: i32,
}

impl DmcChannel {
    /// Create an idle channel
    pub fn new() -> Self {
        Self {
            regs: [0; 4],
            enabled: false,
            looping: false,
            irq_gen: false,
            irq_occurred: false,
            freq: to_fixed(DMC_PERIODS[0]),
            accum: 0,
            address: 0xC000,
            dma_length: 0,
            cached_address: 0xC000,
            cached_length: 8,
            cur_byte: 0,
            level: 0,
            output: 0,
        }
    }

    /// Register write; `reg` is the offset from `$4010` (0-3).
    ///
    /// Returns true when the write acknowledged a pending IRQ.
    pub fn write(&mut self, reg: usize, value: u8) -> bool {
        self.regs[reg & 3] = value;
        match reg & 3 {
            0 => {
                self.freq = to_fixed(DMC_PERIODS[(value & 0x0F) as usize]);
                self.looping = value & 0x40 != 0;
                if value & 0x80 != 0 {
                    self.irq_gen = true;
                    false
                } else {
                    self.irq_gen = false;
                    std::mem::take(&mut self.irq_occurred)
                }
            }
            1 => {
                let value = value & 0x7F;
                self.output += (i32::from(value) - i32::from(self.level)) << 8;
                self.level = value;
                false
            }
            2 => {
                self.cached_address = 0xC000 + (u16::from(value) << 6);
                false
            }
            _ => {
                self.cached_length = ((u32::from(value) << 4) + 1) << 3;
                false
            }
        }
    }

    /// `$4015` bit 4: start (if idle) or stop the sample
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            if self.dma_length == 0 {
                self.reload();
            }
        } else {
            self.dma_length = 0;
        }
    }

    /// Drop a pending IRQ; true if one was pending
    pub fn acknowledge_irq(&mut self) -> bool {
        std::mem::take(&mut self.irq_occurred)
    }

    /// Whether DMA is still running
    pub fn is_playing(&self) -> bool {
        self.dma_length > 0
    }

    /// Bytes left to fetch, rounded up
    pub fn bytes_remaining(&self) -> u32 {
        self.dma_length.div_ceil(8)
    }

    /// Running output level
    pub fn output(&self) -> i32 {
        self.output
    }

    /// Read-only view of the channel
    pub fn snapshot(&self) -> DmcSnapshot {
        DmcSnapshot {
            enabled: self.enabled,
            irq_enabled: self.irq_gen,
            irq_occurred: self.irq_occurred,
            looping: self.looping,
            address: self.address,
            bits_remaining: self.dma_length,
            dac_level: self.level,
            output: self.output,
            period: self.freq >> 16,
        }
    }

    #[inline]
    fn reload(&mut self) {
        self.address = self.cached_address;
        self.dma_length = self.cached_length;
        self.irq_occurred = false;
    }

    /// Advance one output tick, fetching sample bytes through `bus`
    pub fn tick<B: HostBus + ?Sized>(
        &mut self,
        cycle_rate: i32,
        bus: &mut B,
        events: &mut ApuEvents,
    ) -> i32 {
        if self.dma_length == 0 {
            return self.output;
        }

        self.accum -= cycle_rate;
        while self.accum < 0 {
            self.accum += self.freq;

            let delta_bit = (self.dma_length & 7) ^ 7;
            if delta_bit == 7 {
                self.cur_byte = bus.read_memory(self.address);
                bus.steal_cycles(1);
                self.address = if self.address == 0xFFFF {
                    SAMPLE_WRAP
                } else {
                    self.address + 1
                };
            }

            self.dma_length -= 1;
            if self.dma_length == 0 {
                if self.looping {
                    self.reload();
                } else {
                    if self.irq_gen {
                        self.irq_occurred = true;
                        tracing::trace!(address = self.address, "DMC IRQ raised");
                        bus.raise_irq();
                        *events |= ApuEvents::IRQ_RAISED;
                    }
                    self.enabled = false;
                    *events |= ApuEvents::DMC_FINISHED;
                    break;
                }
            }

            let level = if self.cur_byte & (1 << delta_bit) != 0 {
                if self.level < DAC_CEILING {
                    (self.level + DAC_STEP).min(DAC_CEILING)
                } else {
                    self.level
                }
            } else if self.level > DAC_FLOOR {
                self.level.saturating_sub(DAC_STEP).max(DAC_FLOOR)
            } else {
                self.level
            };
            self.output += (i32::from(level) - i32::from(self.level)) << 8;
            self.level = level;
        }

        self.output
    }
}

impl Default for DmcChannel {
    fn default() -> Self {
        Self::new()
    }
}
