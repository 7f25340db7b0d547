//! CPU cycle clock for the write queue
//!
//! Counts CPU cycles in 16.16 fixed point so the fractional cycles per output
//! sample (about 40.58 at 44.1 kHz NTSC) do not drift.

/// Elapsed CPU cycles since the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounter {
    /// 16.16 fixed point
    fixed: u64,
}

impl CycleCounter {
    /// Create a counter at zero
    pub fn new() -> Self {
        CycleCounter { fixed: 0 }
    }

    /// Advance by one output sample's worth of cycles (16.16)
    #[inline]
    pub fn advance(&mut self, cycle_rate: i32) {
        self.fixed += u64::from(cycle_rate.max(0) as u32);
    }

    /// Whole CPU cycles elapsed
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.fixed >> 16
    }

    /// Raw 16.16 value
    pub fn fixed(&self) -> u64 {
        self.fixed
    }

    /// Back to zero
    pub fn reset(&mut self) {
        self.fixed = 0;
    }
}
