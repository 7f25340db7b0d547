//! NES 2A03 APU Emulator
//!
//! A sample-accurate emulator of the audio processing unit found in the
//! Ricoh 2A03: two pulse channels, a triangle channel, a noise channel and the
//! delta-modulation channel (DMC). The host CPU emulator drives it through
//! memory-mapped register writes in the `$4000-$4015` window and asks for
//! mixed PCM output once per buffer fill.
//!
//! # Features
//! - Oversampled pulse and noise synthesis (or single-sample, selectable)
//! - Realtime or precomputed 15-bit LFSR noise
//! - DMC DMA fetches with CPU cycle stealing and IRQ generation
//! - Optional 2-tap / 3:1 output filtering, 8-bit or 16-bit output
//! - Timestamped register-write queue for hosts that run the CPU ahead of audio
//! - Extension channel hook for cartridge expansion audio
//!
//! # Crate feature flags
//! - `export-wav` (default): WAV export of rendered buffers (`export`)
//! - `cli` (opt-in): the `nes-apu-render` binary
//!
//! # Quick start
//! ```no_run
//! use nes_apu::{Apu, ApuConfig, NullBus, OutputBuffer};
//!
//! let mut apu = Apu::new(ApuConfig::default()).unwrap();
//! let mut bus = NullBus;
//! apu.write(&mut bus, 0x4015, 0x01); // enable pulse A
//! apu.write(&mut bus, 0x4000, 0x9F); // 50% duty, constant volume 15
//! apu.write(&mut bus, 0x4002, 0xFD); // A4 period low
//! apu.write(&mut bus, 0x4003, 0x08); // period high, length index 1
//!
//! let mut buffer = vec![0i16; 735];
//! apu.process(&mut bus, Some(OutputBuffer::Signed16(&mut buffer)), 735);
//! ```
//!
//! The DMC channel talks to the host through [`HostBus`]; IRQ edges are also
//! returned as [`ApuEvents`] so the host can poll instead of reacting inside
//! the callback.

#![warn(missing_docs)]

pub mod apu; // 2A03 APU emulation (core)
pub mod bus; // Host collaborator seam (DMA, IRQ)
pub mod config; // Setup-time configuration
#[cfg(feature = "export-wav")]
pub mod export; // WAV export
pub mod extension; // Expansion audio hook
pub mod replayer; // Timestamped write queue and register logs

/// Error types for APU setup and file-level operations
///
/// Nothing in the per-sample path can fail; these only come out of
/// construction, reconfiguration and the export/log helpers.
#[derive(thiserror::Error, Debug)]
pub enum ApuError {
    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Error writing or reading an audio file
    #[error("Audio file error: {0}")]
    AudioFileError(String),

    /// Malformed register log
    #[error("Register log error: {0}")]
    LogError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ApuError {
    /// Converts a String into `ApuError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `AudioFileError`,
    /// `LogError`) where the failure category is known.
    fn from(msg: String) -> Self {
        ApuError::Other(msg)
    }
}

impl From<&str> for ApuError {
    fn from(msg: &str) -> Self {
        ApuError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for ApuError {
    fn from(err: serde_json::Error) -> Self {
        ApuError::LogError(err.to_string())
    }
}

/// Result type for APU operations
pub type Result<T> = std::result::Result<T, ApuError>;

// Public API exports
pub use apu::{Apu, Channel, ChannelMask, ChannelSnapshot, DmcSnapshot, FilterType, OutputBuffer};
pub use bus::{ApuEvents, HostBus, NullBus};
pub use config::{ApuConfig, NoiseStrategy, SampleFormat, Synthesis};
pub use extension::ApuExtension;
pub use replayer::{render_log, RegisterLog, RegisterWrite};
