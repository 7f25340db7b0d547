//! Host collaborator interface
//!
//! The APU never owns a reference to the CPU. Everything it needs from the
//! host (DMC sample fetches, cycle stealing, interrupt signalling) goes
//! through a [`HostBus`] borrowed for the duration of a single
//! [`Apu::process`](crate::Apu::process) or [`Apu::write`](crate::Apu::write)
//! call.

use bitflags::bitflags;

/// Interface the host CPU emulator exposes to the APU
///
/// Only [`read_memory`](HostBus::read_memory) is required. The other hooks
/// default to no-ops for hosts that poll [`ApuEvents`] instead.
///
/// # Example
///
/// ```
/// use nes_apu::HostBus;
///
/// struct Cpu {
///     prg: Vec<u8>,
///     stall: u32,
///     irq_line: bool,
/// }
///
/// impl HostBus for Cpu {
///     fn read_memory(&mut self, address: u16) -> u8 {
///         self.prg[(address as usize) & (self.prg.len() - 1)]
///     }
///
///     fn steal_cycles(&mut self, cycles: u32) {
///         self.stall += cycles;
///     }
///
///     fn raise_irq(&mut self) {
///         self.irq_line = true;
///     }
/// }
/// ```
pub trait HostBus {
    /// Fetch one DMC sample byte from CPU address space.
    fn read_memory(&mut self, address: u16) -> u8;

    /// Stall the CPU for `cycles` cycles (DMA bus contention).
    fn steal_cycles(&mut self, _cycles: u32) {}

    /// The DMC finished a non-looping sample with IRQ generation enabled.
    fn raise_irq(&mut self) {}

    /// A register write acknowledged a pending DMC IRQ.
    fn clear_irq(&mut self) {}

    /// Extra bits OR'd into every `$4015` read.
    ///
    /// Hosts that keep the frame-counter IRQ outside the APU report it here.
    fn irq_status(&self) -> u8 {
        0
    }
}

/// Bus with no memory behind it
///
/// DMC fetches read as zero and interrupts go nowhere. Useful for rendering
/// register logs and for hosts without DMC sample data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl HostBus for NullBus {
    fn read_memory(&mut self, _address: u16) -> u8 {
        0
    }
}

bitflags! {
    /// Interrupt edges produced during a `process` or `write` call
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ApuEvents: u8 {
        /// The DMC raised its IRQ
        const IRQ_RAISED = 0x01;
        /// A pending DMC IRQ was acknowledged by a register write
        const IRQ_CLEARED = 0x02;
        /// A non-looping DMC sample ran out
        const DMC_FINISHED = 0x04;
    }
}
