//! Expansion audio hook
//!
//! Cartridges such as the VRC6 or the FDS add their own sound hardware,
//! mixed in alongside the 2A03 channels. An [`ApuExtension`] is ticked once
//! per output sample and can claim register addresses of its own.

use crate::config::ApuConfig;

/// Expansion sound chip attached to the APU
///
/// Only [`process`](ApuExtension::process) is required.
pub trait ApuExtension: Send {
    /// Return to power-on state. Called from [`Apu::reset`](crate::Apu::reset).
    fn reset(&mut self) {}

    /// Sample rate or timing changed
    fn params_changed(&mut self, _config: &ApuConfig) {}

    /// Advance one output sample and return the contribution, on the same
    /// scale as the built-in channels (about `15 << 8` full scale).
    fn process(&mut self) -> i32;

    /// Whether `address` belongs to this chip rather than the APU
    fn claims(&self, _address: u16) -> bool {
        false
    }

    /// Register write to a claimed address
    fn write(&mut self, _address: u16, _value: u8) {}

    /// Register read from a claimed address (defaults to open bus)
    fn read(&mut self, address: u16) -> u8 {
        (address >> 8) as u8
    }
}
