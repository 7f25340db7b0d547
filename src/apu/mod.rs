//! 2A03 APU emulation
//!
//! Channel state machines, their lookup tables, the register decoder and the
//! output mixer. [`Apu`] ties them together.

pub mod chip;
pub mod dmc;
pub mod envelope;
pub mod mixer;
pub mod noise;
pub mod pulse;
pub mod registers;
pub mod tables;
pub mod triangle;

pub use chip::{Apu, ChannelSnapshot};
pub use dmc::{DmcChannel, DmcSnapshot};
pub use mixer::{quantize, Channel, ChannelMask, FilterType, Mixer, OutputBuffer};
pub use noise::NoiseChannel;
pub use pulse::{PulseChannel, PulseUnit};
pub use registers::Register;
pub use tables::{ApuTables, Lfsr, NoiseMode};
pub use triangle::TriangleChannel;
