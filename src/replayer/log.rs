//! Register-write logs
//!
//! A log is the configuration the writes were captured under plus the
//! timestamped writes themselves, stored as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::apu::{Apu, OutputBuffer};
use crate::bus::HostBus;
use crate::config::ApuConfig;
use crate::Result;

/// One register write at a CPU cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWrite {
    /// CPU cycle the write happened on, counted from the last reset
    pub timestamp: u64,
    /// CPU address (`$4000-$4015`, or an extension address)
    pub address: u16,
    /// Value written
    pub value: u8,
}

/// A recorded register-write stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterLog {
    /// Configuration the stream was recorded with
    #[serde(default)]
    pub config: ApuConfig,
    /// Writes in timestamp order
    #[serde(default)]
    pub writes: Vec<RegisterWrite>,
    /// Suggested render length in video frames (0: until the last write)
    #[serde(default)]
    pub frames: u32,
}

impl RegisterLog {
    /// Empty log for the given configuration
    pub fn new(config: ApuConfig) -> Self {
        Self {
            config,
            writes: Vec::new(),
            frames: 0,
        }
    }

    /// Append a write
    pub fn record(&mut self, timestamp: u64, address: u16, value: u8) {
        self.writes.push(RegisterWrite {
            timestamp,
            address,
            value,
        });
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let log: Self = serde_json::from_str(json)?;
        log.config.validate()?;
        Ok(log)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a JSON log from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Samples covering the whole log at its configured rate
    ///
    /// Uses `frames` when set, otherwise runs one frame past the last write.
    pub fn sample_count(&self) -> usize {
        let spf = self.config.samples_per_frame().max(1) as u64;
        if self.frames > 0 {
            return (u64::from(self.frames) * spf) as usize;
        }
        let last = self.writes.iter().map(|w| w.timestamp).max().unwrap_or(0);
        let cycles_per_frame = ((self.config.cycle_rate() as u64 * spf) >> 16).max(1);
        ((last / cycles_per_frame + 2) * spf) as usize
    }
}

/// Reset `apu`, replay `log` through the write queue and return
/// `sample_count` signed 16-bit samples.
///
/// The APU is reconfigured first if its configuration differs from the
/// log's. Writes are queued one frame ahead of rendering so the queue stays
/// short.
pub fn render_log<B: HostBus + ?Sized>(
    apu: &mut Apu,
    bus: &mut B,
    log: &RegisterLog,
    sample_count: usize,
) -> Result<Vec<i16>> {
    if *apu.config() != log.config {
        apu.reconfigure(log.config)?;
    } else {
        apu.reset();
    }

    let chunk = log.config.samples_per_frame().max(1) as usize;
    let rate = log.config.cycle_rate().max(0) as u64;
    let mut out = vec![0i16; sample_count];
    let mut writes = log.writes.iter().peekable();
    let mut pos = 0;

    while pos < sample_count {
        let n = chunk.min(sample_count - pos);
        let horizon = apu.elapsed_cycles() + ((rate * n as u64) >> 16) + 1;
        while let Some(write) = writes.next_if(|w| w.timestamp <= horizon) {
            apu.queue_write(write.timestamp, write.address, write.value);
        }
        apu.process(
            bus,
            Some(OutputBuffer::Signed16(&mut out[pos..pos + n])),
            n,
        );
        pos += n;
    }

    tracing::debug!(
        samples = sample_count,
        writes = log.writes.len(),
        pending = apu.pending_writes(),
        "register log rendered"
    );
    Ok(out)
}
