//! 2A03 APU device context
//!
//! Owns the five channels, the lookup tables they were configured with, the
//! mixer and the pending write queue. One [`Apu`] per emulated console; there
//! is no global state.

use tracing::{debug, trace};

use super::dmc::{DmcChannel, DmcSnapshot};
use super::mixer::{quantize, Channel, ChannelMask, FilterType, Mixer, OutputBuffer};
use super::noise::NoiseChannel;
use super::pulse::{PulseChannel, PulseUnit};
use super::registers::{Register, APU_BASE, STATUS_ADDR};
use super::tables::{ApuTables, TRIANGLE_WRITE_LATENCY_CYCLES};
use super::triangle::TriangleChannel;
use crate::bus::{ApuEvents, HostBus, NullBus};
use crate::config::ApuConfig;
use crate::extension::ApuExtension;
use crate::replayer::{CycleCounter, RegisterWrite, WriteQueue};
use crate::Result;

/// Last register cleared by [`Apu::reset`] before the status register
const LAST_CHANNEL_REGISTER: u16 = 0x4013;

/// Read-only view of one channel for hosts and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSnapshot {
    /// `$4015` enable bit (DMC: enabled latch; extension: mix mask bit)
    pub enabled: bool,
    /// Enabled and still counting (DMC: DMA running)
    pub playing: bool,
    /// Note length left in ticks (DMC: sample bytes left)
    pub length: i32,
    /// Triangle linear counter in ticks, 0 for the other channels
    pub linear_length: i32,
    /// Raw timer value (noise and DMC: period in CPU cycles)
    pub frequency: i32,
    /// Last output level
    pub output: i32,
}

/// 2A03 APU emulator
///
/// Create with [`Apu::new`], drive with [`write`](Apu::write) /
/// [`read`](Apu::read) from the CPU side and pull audio with
/// [`process`](Apu::process).
pub struct Apu {
    config: ApuConfig,
    tables: ApuTables,
    cycle_rate: i32,
    triangle_latency: i32,

    pulse_a: PulseChannel,
    pulse_b: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,

    mask: ChannelMask,
    mixer: Mixer,
    extension: Option<Box<dyn ApuExtension>>,

    queue: WriteQueue,
    clock: CycleCounter,
}

impl Apu {
    /// Validate `config`, build the tables and return a reset APU
    pub fn new(config: ApuConfig) -> Result<Self> {
        config.validate()?;
        let tables = ApuTables::build(config.samples_per_frame());
        let noise = NoiseChannel::new(&tables, config.noise);

        let mut apu = Self {
            config,
            cycle_rate: config.cycle_rate(),
            triangle_latency: Self::triangle_latency(&config),
            tables,
            pulse_a: PulseChannel::new(PulseUnit::A),
            pulse_b: PulseChannel::new(PulseUnit::B),
            triangle: TriangleChannel::new(),
            noise,
            dmc: DmcChannel::new(),
            mask: ChannelMask::default(),
            mixer: Mixer::new(config.filter),
            extension: None,
            queue: WriteQueue::new(),
            clock: CycleCounter::new(),
        };
        apu.reset();

        debug!(
            sample_rate = config.sample_rate,
            refresh_rate = config.refresh_rate,
            samples_per_frame = apu.tables.samples_per_frame,
            cycle_rate = apu.cycle_rate,
            "APU created"
        );
        Ok(apu)
    }

    /// Ticks between a `$400B` write and the linear counter starting; at
    /// least one, or low sample rates would never start it
    fn triangle_latency(config: &ApuConfig) -> i32 {
        (TRIANGLE_WRITE_LATENCY_CYCLES / config.cycles_per_sample().max(1)).max(1)
    }

    /// Switch to a new configuration: rebuild the tables and reset.
    ///
    /// On error the APU keeps its previous configuration.
    pub fn reconfigure(&mut self, config: ApuConfig) -> Result<()> {
        config.validate()?;
        if config.samples_per_frame() != self.tables.samples_per_frame {
            self.tables = ApuTables::build(config.samples_per_frame());
        }
        self.config = config;
        self.cycle_rate = config.cycle_rate();
        self.triangle_latency = Self::triangle_latency(&config);
        self.mixer.set_filter(config.filter);
        if let Some(ext) = self.extension.as_mut() {
            ext.params_changed(&config);
        }
        self.reset();

        debug!(
            sample_rate = config.sample_rate,
            refresh_rate = config.refresh_rate,
            samples_per_frame = self.tables.samples_per_frame,
            cycle_rate = self.cycle_rate,
            "APU reconfigured"
        );
        Ok(())
    }

    /// Power-on state: queue emptied, every register zeroed, all channels
    /// disabled
    pub fn reset(&mut self) {
        self.queue.clear();
        self.clock.reset();

        self.pulse_a = PulseChannel::new(PulseUnit::A);
        self.pulse_b = PulseChannel::new(PulseUnit::B);
        self.triangle = TriangleChannel::new();
        self.noise = NoiseChannel::new(&self.tables, self.config.noise);
        self.dmc = DmcChannel::new();

        let mut bus = NullBus;
        for addr in APU_BASE..=LAST_CHANNEL_REGISTER {
            self.write_register(&mut bus, addr, 0);
        }
        self.write_register(&mut bus, STATUS_ADDR, 0);

        self.mixer.reset();
        if let Some(ext) = self.extension.as_mut() {
            ext.reset();
        }
        debug!(lfsr = self.tables.lfsr.state(), "APU reset");
    }

    /// Active configuration
    pub fn config(&self) -> &ApuConfig {
        &self.config
    }

    /// CPU cycles per output sample, 16.16 fixed point
    pub fn cycle_rate(&self) -> i32 {
        self.cycle_rate
    }

    /// Output samples per video frame
    pub fn samples_per_frame(&self) -> i32 {
        self.tables.samples_per_frame
    }

    /// CPU register write.
    ///
    /// Addresses claimed by an installed extension go to the extension.
    /// Unmapped addresses are ignored.
    pub fn write<B: HostBus + ?Sized>(
        &mut self,
        bus: &mut B,
        address: u16,
        value: u8,
    ) -> ApuEvents {
        if let Some(ext) = self.extension.as_mut() {
            if ext.claims(address) {
                ext.write(address, value);
                return ApuEvents::empty();
            }
        }
        self.write_register(bus, address, value)
    }

    fn write_register<B: HostBus + ?Sized>(
        &mut self,
        bus: &mut B,
        address: u16,
        value: u8,
    ) -> ApuEvents {
        let mut events = ApuEvents::empty();
        let Some(reg) = Register::from_addr(address) else {
            return events;
        };
        trace!(register = %reg, value, "APU write");

        let offset = reg.offset();
        match reg {
            Register::PulseACtrl
            | Register::PulseASweep
            | Register::PulseAFreqLo
            | Register::PulseAFreqHi => self.pulse_a.write(offset, value, &self.tables),
            Register::PulseBCtrl
            | Register::PulseBSweep
            | Register::PulseBFreqLo
            | Register::PulseBFreqHi => self.pulse_b.write(offset, value, &self.tables),
            Register::TriangleCtrl | Register::TriangleFreqLo | Register::TriangleFreqHi => {
                self.triangle.write(offset, value, &self.tables, self.triangle_latency)
            }
            Register::NoiseCtrl | Register::NoiseFreq | Register::NoiseLength => {
                self.noise.write(offset, value, &self.tables)
            }
            Register::DmcCtrl | Register::DmcDac | Register::DmcAddress | Register::DmcLength => {
                if self.dmc.write(offset, value) {
                    bus.clear_irq();
                    events |= ApuEvents::IRQ_CLEARED;
                }
            }
            Register::Status => {
                if self.dmc.acknowledge_irq() {
                    bus.clear_irq();
                    events |= ApuEvents::IRQ_CLEARED;
                }
                self.pulse_a.set_enabled(value & 0x01 != 0);
                self.pulse_b.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }
        }
        events
    }

    /// CPU register read.
    ///
    /// Only `$4015` is readable; anything else returns the high byte of the
    /// address (open bus), unless an extension claims it.
    pub fn read<B: HostBus + ?Sized>(&mut self, bus: &B, address: u16) -> u8 {
        if let Some(ext) = self.extension.as_mut() {
            if ext.claims(address) {
                return ext.read(address);
            }
        }
        if address != STATUS_ADDR {
            return (address >> 8) as u8;
        }

        let mut status = 0u8;
        if self.pulse_a.is_playing() {
            status |= 0x01;
        }
        if self.pulse_b.is_playing() {
            status |= 0x02;
        }
        if self.triangle.is_playing() {
            status |= 0x04;
        }
        if self.noise.is_playing() {
            status |= 0x08;
        }
        if self.dmc.enabled {
            status |= 0x10;
        }
        if self.dmc.irq_occurred {
            status |= 0x80;
        }
        status | bus.irq_status()
    }

    /// Include or exclude a channel from the mix; returns the previous state.
    ///
    /// Excluded channels are not advanced either.
    pub fn set_channel_enabled(&mut self, channel: Channel, enabled: bool) -> bool {
        let bit = channel.mask();
        let previous = self.mask.contains(bit);
        self.mask.set(bit, enabled);
        previous
    }

    /// Current mix mask
    pub fn channel_mask(&self) -> ChannelMask {
        self.mask
    }

    /// Replace the whole mix mask
    pub fn set_channel_mask(&mut self, mask: ChannelMask) {
        self.mask = mask;
    }

    /// Select the output filter
    pub fn set_filter(&mut self, filter: FilterType) {
        self.mixer.set_filter(filter);
    }

    /// Current output filter
    pub fn filter(&self) -> FilterType {
        self.mixer.filter()
    }

    /// Install (or remove, with `None`) an expansion chip; returns the one
    /// it replaces
    pub fn set_extension(
        &mut self,
        extension: Option<Box<dyn ApuExtension>>,
    ) -> Option<Box<dyn ApuExtension>> {
        let mut extension = extension;
        if let Some(ext) = extension.as_mut() {
            ext.params_changed(&self.config);
        }
        std::mem::replace(&mut self.extension, extension)
    }

    /// Whether an expansion chip is installed
    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Queue a write to be applied once `timestamp` CPU cycles have elapsed
    pub fn queue_write(&mut self, timestamp: u64, address: u16, value: u8) {
        self.queue.push(RegisterWrite {
            timestamp,
            address,
            value,
        });
    }

    /// Queued writes not yet applied
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    /// Whole CPU cycles covered by the samples produced since the last reset
    pub fn elapsed_cycles(&self) -> u64 {
        self.clock.cycles()
    }

    /// Produce `count` samples.
    ///
    /// With `None` nothing is stored but every channel advances exactly as
    /// it would with a buffer. Samples past the end of a short buffer are
    /// computed and dropped.
    pub fn process<B: HostBus + ?Sized>(
        &mut self,
        bus: &mut B,
        buffer: Option<OutputBuffer<'_>>,
        count: usize,
    ) -> ApuEvents {
        let mut buffer = buffer;
        let mut events = ApuEvents::empty();
        let rate = self.cycle_rate;
        let synthesis = self.config.synthesis;

        for i in 0..count {
            while let Some(write) = self.queue.pop_due(self.clock.cycles()) {
                events |= self.write(bus, write.address, write.value);
            }

            let mut composite = 0;
            if self.mask.contains(ChannelMask::PULSE_A) {
                composite += self.pulse_a.tick(rate, synthesis);
            }
            if self.mask.contains(ChannelMask::PULSE_B) {
                composite += self.pulse_b.tick(rate, synthesis);
            }
            if self.mask.contains(ChannelMask::TRIANGLE) {
                composite += self.triangle.tick(rate);
            }
            if self.mask.contains(ChannelMask::NOISE) {
                composite += self.noise.tick(rate, synthesis, &self.tables.noise_long);
            }
            if self.mask.contains(ChannelMask::DMC) {
                composite += self.dmc.tick(rate, bus, &mut events);
            }
            if self.mask.contains(ChannelMask::EXTENSION) {
                if let Some(ext) = self.extension.as_mut() {
                    composite += ext.process();
                }
            }

            let sample = quantize(self.mixer.mix(composite), self.config.sample_format);
            if let Some(out) = buffer.as_mut() {
                out.store(i, sample);
            }
            self.clock.advance(rate);
        }

        events
    }

    /// Read-only view of one channel
    pub fn channel_state(&self, channel: Channel) -> ChannelSnapshot {
        match channel {
            Channel::PulseA | Channel::PulseB => {
                let ch = if channel == Channel::PulseA {
                    &self.pulse_a
                } else {
                    &self.pulse_b
                };
                ChannelSnapshot {
                    enabled: ch.enabled,
                    playing: ch.is_playing(),
                    length: ch.length.remaining(),
                    linear_length: 0,
                    frequency: ch.frequency(),
                    output: ch.output(),
                }
            }
            Channel::Triangle => ChannelSnapshot {
                enabled: self.triangle.enabled,
                playing: self.triangle.is_playing(),
                length: self.triangle.length.remaining(),
                linear_length: self.triangle.linear_length,
                frequency: self.triangle.frequency(),
                output: self.triangle.output(),
            },
            Channel::Noise => ChannelSnapshot {
                enabled: self.noise.enabled,
                playing: self.noise.is_playing(),
                length: self.noise.length.remaining(),
                linear_length: 0,
                frequency: self.noise.frequency(),
                output: self.noise.output(),
            },
            Channel::Dmc => {
                let dmc = self.dmc.snapshot();
                ChannelSnapshot {
                    enabled: dmc.enabled,
                    playing: self.dmc.is_playing(),
                    length: self.dmc.bytes_remaining() as i32,
                    linear_length: 0,
                    frequency: dmc.period,
                    output: dmc.output,
                }
            }
            Channel::Extension => ChannelSnapshot {
                enabled: self.extension.is_some() && self.mask.contains(ChannelMask::EXTENSION),
                playing: self.extension.is_some(),
                ..ChannelSnapshot::default()
            },
        }
    }

    /// Read-only view of the DMC
    pub fn dmc_state(&self) -> DmcSnapshot {
        self.dmc.snapshot()
    }
}

impl std::fmt::Debug for Apu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apu")
            .field("config", &self.config)
            .field("cycle_rate", &self.cycle_rate)
            .field("mask", &self.mask)
            .field("filter", &self.mixer.filter())
            .field("extension", &self.extension.is_some())
            .field("pending_writes", &self.queue.len())
            .field("elapsed_cycles", &self.clock.cycles())
            .finish()
    }
}
